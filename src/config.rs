use std::time::Duration;

use crate::store::airtable::{AirtableConfig, DEFAULT_API_URL};

pub const DEFAULT_STUDENTS_TABLE_ID: &str = "tbll5MlIcTSqCOLEJ";
pub const DEFAULT_STUDENTS_TABLE_NAME: &str = "Élèves";
pub const DEFAULT_MEASUREMENTS_TABLE: &str = "Mesures";
pub const DEFAULT_GOALS_TABLE: &str = "Objectifs";

/// Where each kind of record lives in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    /// Students are looked up by table id first, then by name.
    pub students_id: String,
    pub students_name: String,
    pub measurements: String,
    pub goals: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            students_id: DEFAULT_STUDENTS_TABLE_ID.to_string(),
            students_name: DEFAULT_STUDENTS_TABLE_NAME.to_string(),
            measurements: DEFAULT_MEASUREMENTS_TABLE.to_string(),
            goals: DEFAULT_GOALS_TABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum BackendConfig {
    Airtable(AirtableConfig),
    Postgres { database_url: String },
    Unconfigured,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub tables: Tables,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Airtable wins when both its key and base are set, then Postgres;
    /// otherwise the backend is unconfigured.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match (var("AIRTABLE_API_KEY"), var("AIRTABLE_BASE_ID")) {
            (Some(api_key), Some(base_id)) => BackendConfig::Airtable(AirtableConfig {
                api_url: var("AIRTABLE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                base_id,
                api_key,
                timeout: Duration::from_secs(30),
            }),
            _ => match var("DATABASE_URL") {
                Some(database_url) => BackendConfig::Postgres { database_url },
                None => BackendConfig::Unconfigured,
            },
        };

        let defaults = Tables::default();
        let tables = Tables {
            students_id: var("STUDENTS_TABLE_ID").unwrap_or(defaults.students_id),
            students_name: var("STUDENTS_TABLE_NAME").unwrap_or(defaults.students_name),
            measurements: var("MEASUREMENTS_TABLE").unwrap_or(defaults.measurements),
            goals: var("GOALS_TABLE").unwrap_or(defaults.goals),
        };

        Self { backend, tables }
    }
}
