use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{RecordStore, StoreError};
use crate::models::RawRecord;

/// Records mirrored into Postgres, one JSONB document per row.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init_db(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(())
    }

    /// Loads a CSV export into `table`. Returns how many rows were new.
    pub async fn import_csv(&self, table: &str, csv_path: &Path) -> Result<usize, StoreError> {
        let records = read_csv_records(csv_path)?;
        let mut inserted = 0usize;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO coaching_progress.records (id, table_name, fields)
                VALUES ($1, $2, $3)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&record.id)
            .bind(table)
            .bind(Value::Object(record.fields))
            .execute(&self.pool)
            .await?;

            if result.rows_affected() > 0 {
                inserted += 1;
            }
        }

        Ok(inserted)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    async fn fetch_all_records(&self, table: &str) -> Result<Vec<RawRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, fields FROM coaching_progress.records \
             WHERE table_name = $1 \
             ORDER BY position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let fields = match row.try_get::<Value, _>("fields")? {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            records.push(RawRecord {
                id: row.try_get("id")?,
                fields,
            });
        }

        Ok(records)
    }
}

/// Reads a CSV export where headers are field labels. An `id` column, when
/// present and filled, becomes the record id; otherwise one is generated.
/// Blank cells are left out of the record.
pub fn read_csv_records(csv_path: &Path) -> Result<Vec<RawRecord>, StoreError> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let mut id = None;
        let mut fields = Map::new();

        for (label, cell) in headers.iter().zip(row.iter()) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            if label == "id" {
                id = Some(cell.to_string());
            } else {
                fields.insert(label.to_string(), Value::String(cell.to_string()));
            }
        }

        records.push(RawRecord {
            id: id.unwrap_or_else(|| format!("rec{}", Uuid::new_v4().simple())),
            fields,
        });
    }

    Ok(records)
}
