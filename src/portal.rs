//! Binds a configured backend to the resolver and metric derivation.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{BackendConfig, Tables};
use crate::mapping;
use crate::metrics::{self, DerivedSeries, RemainingWeight, WEIGHT_GOAL_ID};
use crate::models::{Goal, MeasurementSnapshot, RawRecord, StudentProfile};
use crate::resolver::{self, Resolution};
use crate::store::{AirtableStore, PgRecordStore, RecordStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub enum Backend {
    Unconfigured,
    Connected(Arc<dyn RecordStore>),
}

impl Backend {
    pub async fn from_config(config: &BackendConfig) -> Result<Self, StoreError> {
        let backend = match config {
            BackendConfig::Airtable(airtable) => {
                Self::Connected(Arc::new(AirtableStore::new(airtable.clone())?))
            }
            BackendConfig::Postgres { database_url } => {
                Self::Connected(Arc::new(PgRecordStore::connect(database_url).await?))
            }
            BackendConfig::Unconfigured => Self::Unconfigured,
        };
        Ok(backend)
    }
}

/// Everything the progress views show for one student.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub profile: StudentProfile,
    pub series: DerivedSeries,
    pub goals: Vec<Goal>,
    pub goal_progress: f64,
    pub weight_progress: Option<f64>,
    pub remaining_weight: RemainingWeight,
}

pub struct Portal {
    backend: Backend,
    tables: Tables,
}

impl Portal {
    pub fn new(backend: Backend, tables: Tables) -> Self {
        Self { backend, tables }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.backend, Backend::Connected(_))
    }

    pub async fn verify_access(&self, access_code: &str) -> Result<Resolution, PortalError> {
        let Backend::Connected(store) = &self.backend else {
            tracing::info!("no backend configured, skipping lookup");
            return Ok(Resolution::Unconfigured);
        };

        let records = self.student_records(store.as_ref()).await?;
        tracing::debug!(store = store.kind(), records = records.len(), "student records fetched");

        let resolution = resolver::resolve(&records, access_code);
        match &resolution {
            Resolution::Found(profile) => {
                tracing::info!(student_id = %profile.id, status = profile.status.label(), "access granted");
            }
            Resolution::NotFound(reason) => {
                tracing::info!(?reason, "access refused");
            }
            Resolution::Unconfigured => {}
        }
        Ok(resolution)
    }

    async fn student_records(&self, store: &dyn RecordStore) -> Result<Vec<RawRecord>, StoreError> {
        let records = store.fetch_all_records(&self.tables.students_id).await?;
        if !records.is_empty() {
            return Ok(records);
        }

        tracing::debug!(table = %self.tables.students_name, "student table empty by id, retrying by name");
        match store.fetch_all_records(&self.tables.students_name).await {
            Ok(records) => Ok(records),
            Err(err) => {
                tracing::warn!(error = %err, table = %self.tables.students_name, "student table lookup by name failed");
                Ok(Vec::new())
            }
        }
    }

    pub async fn measurements(&self, student_id: &str) -> Result<Vec<MeasurementSnapshot>, PortalError> {
        let Backend::Connected(store) = &self.backend else {
            return Ok(Vec::new());
        };

        let records = store.fetch_all_records(&self.tables.measurements).await?;
        let mapped = mapping::measurements_for(&records, student_id);
        if mapped.skipped > 0 {
            tracing::warn!(student_id, skipped = mapped.skipped, "measurements without date or weight ignored");
        }
        Ok(mapped.items)
    }

    pub async fn goals(&self, student_id: &str) -> Result<Vec<Goal>, PortalError> {
        let Backend::Connected(store) = &self.backend else {
            return Ok(Vec::new());
        };

        let records = store.fetch_all_records(&self.tables.goals).await?;
        let mapped = mapping::goals_for(&records, student_id);
        if mapped.skipped > 0 {
            tracing::warn!(student_id, skipped = mapped.skipped, "goals without description ignored");
        }
        Ok(mapped.items)
    }

    /// Fetches measurements and goals for a verified profile and derives the
    /// progress figures.
    pub async fn dashboard(&self, profile: StudentProfile) -> Result<Dashboard, PortalError> {
        let (measurements, mut goals) =
            tokio::try_join!(self.measurements(&profile.id), self.goals(&profile.id))?;

        let series = metrics::derive(&measurements);
        if !goals.iter().any(|goal| goal.id == WEIGHT_GOAL_ID) {
            if let Some(goal) = series
                .latest()
                .and_then(|latest| metrics::weight_goal(latest, Some(&profile)))
            {
                goals.insert(0, goal);
            }
        }

        // Snapshot reference weights win; the weight goal covers profiles
        // that only record them once.
        let weight_goal = goals.iter().find(|goal| goal.id == WEIGHT_GOAL_ID);
        let weight_progress = series
            .weight_progress()
            .or_else(|| weight_goal.and_then(|goal| goal.progress_percentage));
        let remaining_weight = match series.remaining_weight() {
            RemainingWeight::Unavailable => weight_goal
                .map(RemainingWeight::from_goal)
                .unwrap_or(RemainingWeight::Unavailable),
            known => known,
        };

        Ok(Dashboard {
            goal_progress: metrics::goals_progress(&goals),
            weight_progress,
            remaining_weight,
            profile,
            series,
            goals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalStatus, StudentStatus};
    use crate::resolver::NotFoundReason;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn tables() -> Tables {
        Tables::default()
    }

    fn students() -> Vec<RawRecord> {
        vec![
            RawRecord::new("recA")
                .with_field("code", "CODE-A")
                .with_field("Statut", "Actif")
                .with_field("Nom", "Camille Durand")
                .with_field("Poids Initial", 90)
                .with_field("Poids Cible", 70),
            RawRecord::new("recB")
                .with_field("code", "CODE-B")
                .with_field("Statut", "En attente"),
        ]
    }

    fn portal(store: MemoryStore) -> Portal {
        Portal::new(Backend::Connected(Arc::new(store)), tables())
    }

    #[tokio::test]
    async fn unconfigured_backend_never_resolves() {
        let portal = Portal::new(Backend::Unconfigured, tables());
        assert!(!portal.is_configured());
        assert_eq!(portal.verify_access("CODE-A").await.unwrap(), Resolution::Unconfigured);
        assert!(portal.measurements("recA").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolves_from_the_student_table() {
        let portal = portal(MemoryStore::new().with_table(DEFAULT_ID, students()));
        let resolution = portal.verify_access("CODE-A").await.unwrap();
        assert_eq!(resolution.found().map(|p| p.status), Some(StudentStatus::Active));

        assert_eq!(
            portal.verify_access("CODE-B").await.unwrap(),
            Resolution::NotFound(NotFoundReason::StatusNotAllowed)
        );
    }

    const DEFAULT_ID: &str = crate::config::DEFAULT_STUDENTS_TABLE_ID;

    #[tokio::test]
    async fn falls_back_to_table_name_when_id_is_empty() {
        let store = MemoryStore::new().with_table(crate::config::DEFAULT_STUDENTS_TABLE_NAME, students());
        let resolution = portal(store).verify_access("CODE-A").await.unwrap();
        assert!(resolution.found().is_some());

        let empty = portal(MemoryStore::new()).verify_access("CODE-A").await.unwrap();
        assert_eq!(empty, Resolution::NotFound(NotFoundReason::EmptyTable));
    }

    #[tokio::test]
    async fn transport_failure_is_not_reported_as_not_found() {
        let portal = portal(MemoryStore::unreachable("connection refused"));
        let err = portal.verify_access("CODE-A").await.unwrap_err();
        assert!(matches!(err, PortalError::Store(StoreError::Transport(_))));
    }

    #[tokio::test]
    async fn dashboard_derives_progress_for_the_student() {
        let measurements = vec![
            RawRecord::new("m2")
                .with_field("Élève", json!(["recA"]))
                .with_field("Date", "2025-03-01")
                .with_field("Poids", 80),
            RawRecord::new("m1")
                .with_field("Élève", json!(["recA"]))
                .with_field("Date", "2025-02-01")
                .with_field("Poids", 84.5),
            RawRecord::new("other")
                .with_field("Élève", json!(["recB"]))
                .with_field("Date", "2025-03-02")
                .with_field("Poids", 60),
        ];
        let goals = vec![RawRecord::new("g1")
            .with_field("Élève", json!(["recA"]))
            .with_field("Description", "Courir 10 km")
            .with_field("Statut", "Atteint")];
        let store = MemoryStore::new()
            .with_table(DEFAULT_ID, students())
            .with_table("Mesures", measurements)
            .with_table("Objectifs", goals);
        let portal = portal(store);

        let profile = portal
            .verify_access("CODE-A")
            .await
            .unwrap()
            .into_profile()
            .expect("profile");
        let dashboard = portal.dashboard(profile).await.unwrap();

        assert_eq!(dashboard.series.len(), 2);
        assert_eq!(dashboard.series.latest().map(|m| m.id.as_str()), Some("m2"));
        assert_eq!(dashboard.goals.len(), 2);
        assert_eq!(dashboard.goals[0].id, WEIGHT_GOAL_ID);
        assert_eq!(dashboard.goals[0].status, GoalStatus::InProgress);
        assert_eq!(dashboard.goals[0].progress_percentage, Some(50.0));
        assert_eq!(dashboard.goal_progress, 50.0);
        // Reference weights come from the profile when snapshots lack them.
        assert_eq!(dashboard.weight_progress, Some(50.0));
        assert_eq!(dashboard.remaining_weight, RemainingWeight::Remaining(10.0));
    }
}
