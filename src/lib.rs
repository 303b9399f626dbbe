//! Student progress dashboard core: access-code resolution over loosely
//! labelled store records, and progress metrics over measurement series.

pub mod aliases;
pub mod config;
pub mod mapping;
pub mod metrics;
pub mod models;
pub mod portal;
pub mod report;
pub mod resolver;
pub mod store;
