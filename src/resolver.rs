use serde_json::Value;

use crate::aliases::{as_number, StudentField, STUDENT_FIELDS};
use crate::models::{RawRecord, StudentProfile, StudentStatus};

pub const PLACEHOLDER_NAME: &str = "Student";

/// Outcome of an access-code lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(StudentProfile),
    NotFound(NotFoundReason),
    /// No backend is configured; nothing was looked up.
    Unconfigured,
}

/// Why no profile was produced. Carries no field data from the matched
/// record, so a rejected account leaks nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    EmptyTable,
    NoMatch,
    StatusNotAllowed,
}

impl Resolution {
    pub fn found(&self) -> Option<&StudentProfile> {
        match self {
            Self::Found(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn into_profile(self) -> Option<StudentProfile> {
        match self {
            Self::Found(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Locates the record for `access_code` and normalizes it into a profile.
pub fn resolve(records: &[RawRecord], access_code: &str) -> Resolution {
    if records.is_empty() {
        return Resolution::NotFound(NotFoundReason::EmptyTable);
    }

    let Some(record) = records.iter().find(|record| matches_code(record, access_code)) else {
        return Resolution::NotFound(NotFoundReason::NoMatch);
    };

    // The gate compares the raw string: no trimming, no list unwrapping.
    let status = match STUDENT_FIELDS.probe(record, StudentField::Status) {
        Some(Value::String(label)) => StudentStatus::from_label(label),
        _ => None,
    };
    let Some(status) = status else {
        return Resolution::NotFound(NotFoundReason::StatusNotAllowed);
    };

    Resolution::Found(build_profile(record, access_code, status))
}

/// Access codes are credentials: a stored code must equal the supplied one
/// exactly. Numeric codes compare by their textual form.
pub fn matches_code(record: &RawRecord, access_code: &str) -> bool {
    record.id == access_code
        || STUDENT_FIELDS
            .values(record, StudentField::Code)
            .any(|value| match value {
                Value::String(code) => code == access_code,
                Value::Number(code) => code.to_string() == access_code,
                _ => false,
            })
}

fn build_profile(record: &RawRecord, access_code: &str, status: StudentStatus) -> StudentProfile {
    let text = |field| STUDENT_FIELDS.text(record, field);
    let number = |field| STUDENT_FIELDS.number(record, field);

    StudentProfile {
        id: record.id.clone(),
        access_code: access_code.to_string(),
        name: text(StudentField::Name).unwrap_or_else(|| PLACEHOLDER_NAME.to_string()),
        status,
        email: text(StudentField::Email),
        age: STUDENT_FIELDS.probe(record, StudentField::Age).and_then(as_age),
        gender: text(StudentField::Gender),
        initial_weight: number(StudentField::InitialWeight),
        target_weight: number(StudentField::TargetWeight),
        height: number(StudentField::Height),
        profession: text(StudentField::Profession),
        medical_history: text(StudentField::MedicalHistory),
        activity_level: text(StudentField::ActivityLevel),
        motivation: text(StudentField::Motivation),
        diet: text(StudentField::Diet),
        eating_habits: text(StudentField::EatingHabits),
        meal_frequency: text(StudentField::MealFrequency),
        objectives: text(StudentField::Objectives),
        birth_date: STUDENT_FIELDS.date(record, StudentField::BirthDate),
        student_code: text(StudentField::StudentCode),
    }
}

fn as_age(value: &Value) -> Option<u32> {
    let years = as_number(value)?;
    (0.0..=150.0).contains(&years).then(|| years.round() as u32)
}
