use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record as returned by the tabular store: an opaque id plus labelled,
/// untyped field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, label: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(label.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StudentStatus {
    Active,
    Paused,
}

impl StudentStatus {
    /// Parses the exact status literals the store uses. Anything else is not
    /// an allowed status.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Active" | "Actif" => Some(Self::Active),
            "Paused" | "Pause" => Some(Self::Paused),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Paused => "Paused",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProfile {
    pub id: String,
    pub access_code: String,
    pub name: String,
    pub status: StudentStatus,
    pub email: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub initial_weight: Option<f64>,
    pub target_weight: Option<f64>,
    pub height: Option<f64>,
    pub profession: Option<String>,
    pub medical_history: Option<String>,
    pub activity_level: Option<String>,
    pub motivation: Option<String>,
    pub diet: Option<String>,
    pub eating_habits: Option<String>,
    pub meal_frequency: Option<String>,
    pub objectives: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub student_code: Option<String>,
}

impl StudentProfile {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementSnapshot {
    pub id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub weight: f64,
    pub height: Option<f64>,
    pub body_fat: Option<f64>,
    pub muscle_percentage: Option<f64>,
    pub water: Option<f64>,
    pub visceral_fat: Option<f64>,
    pub thigh_left: Option<f64>,
    pub thigh_right: Option<f64>,
    pub hip: Option<f64>,
    pub waist: Option<f64>,
    pub chest: Option<f64>,
    pub arm_left: Option<f64>,
    pub arm_right: Option<f64>,
    pub weight_lost: Option<f64>,
    pub weight_remaining: Option<f64>,
    pub initial_weight: Option<f64>,
    pub target_weight: Option<f64>,
}

impl MeasurementSnapshot {
    /// A snapshot carrying only the required readings.
    pub fn new(id: impl Into<String>, student_id: impl Into<String>, date: NaiveDate, weight: f64) -> Self {
        Self {
            id: id.into(),
            student_id: student_id.into(),
            date,
            weight,
            height: None,
            body_fat: None,
            muscle_percentage: None,
            water: None,
            visceral_fat: None,
            thigh_left: None,
            thigh_right: None,
            hip: None,
            waist: None,
            chest: None,
            arm_left: None,
            arm_right: None,
            weight_lost: None,
            weight_remaining: None,
            initial_weight: None,
            target_weight: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GoalStatus {
    Pending,
    InProgress,
    Achieved,
}

impl GoalStatus {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "pending" | "en attente" => Some(Self::Pending),
            "in-progress" | "in progress" | "en cours" => Some(Self::InProgress),
            "achieved" | "atteint" => Some(Self::Achieved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Goal {
    pub id: String,
    pub student_id: String,
    pub description: String,
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
    pub initial_weight: Option<f64>,
    pub target_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub weight_remaining: Option<f64>,
    pub progress_percentage: Option<f64>,
}
