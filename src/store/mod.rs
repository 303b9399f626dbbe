//! Read access to the external tabular store.

use async_trait::async_trait;

use crate::models::RawRecord;

pub mod airtable;
pub mod memory;
pub mod postgres;

pub use airtable::AirtableStore;
pub use memory::MemoryStore;
pub use postgres::PgRecordStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Transport(String),
    #[error("unexpected store response: {0}")]
    Decode(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for diagnostics.
    fn kind(&self) -> &'static str;

    /// Every record of `table`, in store order. An empty or inaccessible
    /// table yields an empty list; only transport failures are errors.
    async fn fetch_all_records(&self, table: &str) -> Result<Vec<RawRecord>, StoreError>;
}
