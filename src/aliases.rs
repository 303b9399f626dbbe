//! Declarative field-alias tables.
//!
//! Each canonical field maps to the labels it may appear under in the store,
//! human label first and internal field id second. Adding a spelling is a
//! change to the table, never to the lookup code.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::models::RawRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentField {
    Code,
    Status,
    Name,
    Email,
    Age,
    Gender,
    InitialWeight,
    TargetWeight,
    Height,
    Profession,
    MedicalHistory,
    ActivityLevel,
    Motivation,
    Diet,
    EatingHabits,
    MealFrequency,
    Objectives,
    BirthDate,
    StudentCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementColumn {
    Student,
    Date,
    Weight,
    Height,
    BodyFat,
    Muscle,
    Water,
    VisceralFat,
    ThighLeft,
    ThighRight,
    Hip,
    Waist,
    Chest,
    ArmLeft,
    ArmRight,
    WeightLost,
    WeightRemaining,
    InitialWeight,
    TargetWeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalColumn {
    Student,
    Description,
    TargetDate,
    Status,
    InitialWeight,
    TargetWeight,
    CurrentWeight,
    WeightRemaining,
    Progress,
}

type Entries<F> = &'static [(F, &'static [&'static str])];

pub struct AliasTable<F: 'static> {
    entries: Entries<F>,
}

pub const STUDENT_FIELDS: AliasTable<StudentField> = AliasTable::new(&[
    (StudentField::Code, &["code", "fld2B3uc2SCCu3bhT"]),
    (StudentField::Status, &["Statut", "fldIOn1hHf5zB762X"]),
    (StudentField::Name, &["Nom", "fldqgtzUUGEbyuvQF", "Name", "name"]),
    (StudentField::Email, &["E-mail", "fldiswtPGMq9yr6E3", "Email", "email"]),
    (StudentField::Age, &["Âge", "fld8Vw1HWTKEw4jn8"]),
    (StudentField::Gender, &["Sexe", "fld7XAznXJH1WtyMN"]),
    (StudentField::InitialWeight, &["Poids Initial", "fld82XocJlHxb7iIx"]),
    (StudentField::TargetWeight, &["Poids Cible", "fldTqxmxv8wPQnhTR"]),
    (StudentField::Height, &["Taille (cm)", "fldIqFArOG8ZQlSfU"]),
    (StudentField::Profession, &["Profession", "fldzKnvfv3YDkFzvg"]),
    (
        StudentField::MedicalHistory,
        &["Antécédents Médicaux & Sportifs", "fldJKFzBeLsOkelOn"],
    ),
    (StudentField::ActivityLevel, &["Niveau d'Activité", "fldzCNDy4Nl8T19lP"]),
    (StudentField::Motivation, &["Motivation", "fldKov8E7oDliEiCi"]),
    (StudentField::Diet, &["Régime Alimentaire", "fldo508yN3Ny9YIwm"]),
    (
        StudentField::EatingHabits,
        &["Habitudes Alimentaires Spécifiques", "fld8KahK2SURAbaer"],
    ),
    (StudentField::MealFrequency, &["Fréquence de Repas", "fldo8qtXMMY5RW5TC"]),
    (StudentField::Objectives, &["Objectifs", "fld2rLbZsXv1ryqBZ"]),
    (StudentField::BirthDate, &["Date de naissance", "fldNFRFGZkFfZo712"]),
    (StudentField::StudentCode, &["IDU Eleve", "fldcbSf4aqCxWXLCD"]),
]);

pub const MEASUREMENT_FIELDS: AliasTable<MeasurementColumn> = AliasTable::new(&[
    (MeasurementColumn::Student, &["Élève", "studentId"]),
    (MeasurementColumn::Date, &["Date", "date"]),
    (MeasurementColumn::Weight, &["Poids", "weight"]),
    (MeasurementColumn::Height, &["Taille", "height"]),
    (MeasurementColumn::BodyFat, &["Masse Grasse", "bodyFat"]),
    (MeasurementColumn::Muscle, &["Masse Musculaire", "musclePercentage"]),
    (MeasurementColumn::Water, &["Eau", "water"]),
    (MeasurementColumn::VisceralFat, &["Graisse Viscérale", "visceralFat"]),
    (MeasurementColumn::ThighLeft, &["Tour de Cuisse Gauche", "thighCircumferenceLeft"]),
    (MeasurementColumn::ThighRight, &["Tour de Cuisse Droite", "thighCircumferenceRight"]),
    (MeasurementColumn::Hip, &["Tour de Hanches", "hipCircumference"]),
    (MeasurementColumn::Waist, &["Tour de Taille", "waistCircumference"]),
    (MeasurementColumn::Chest, &["Tour de Poitrine", "chestCircumference"]),
    (MeasurementColumn::ArmLeft, &["Tour de Bras Gauche", "armCircumferenceLeft"]),
    (MeasurementColumn::ArmRight, &["Tour de Bras Droit", "armCircumferenceRight"]),
    (MeasurementColumn::WeightLost, &["Poids Perdu", "weightLost"]),
    (MeasurementColumn::WeightRemaining, &["Poids Restant", "weightRemaining"]),
    (MeasurementColumn::InitialWeight, &["Poids Initial", "initialWeight"]),
    (MeasurementColumn::TargetWeight, &["Poids Cible", "targetWeight"]),
]);

pub const GOAL_FIELDS: AliasTable<GoalColumn> = AliasTable::new(&[
    (GoalColumn::Student, &["Élève", "studentId"]),
    (GoalColumn::Description, &["Description", "description"]),
    (GoalColumn::TargetDate, &["Date Cible", "targetDate"]),
    (GoalColumn::Status, &["Statut", "status"]),
    (GoalColumn::InitialWeight, &["Poids Initial", "initialWeight"]),
    (GoalColumn::TargetWeight, &["Poids Cible", "targetWeight"]),
    (GoalColumn::CurrentWeight, &["Poids Actuel", "currentWeight"]),
    (GoalColumn::WeightRemaining, &["Poids Restant", "weightRemaining"]),
    (GoalColumn::Progress, &["Progression (%)", "progressPercentage"]),
]);

impl<F: Copy + PartialEq + 'static> AliasTable<F> {
    pub const fn new(entries: Entries<F>) -> Self {
        Self { entries }
    }

    pub fn labels(&self, field: F) -> &'static [&'static str] {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, labels)| *labels)
            .unwrap_or(&[])
    }

    /// First present value across the field's labels, in declared order.
    pub fn probe<'r>(&self, record: &'r RawRecord, field: F) -> Option<&'r Value> {
        self.labels(field)
            .iter()
            .filter_map(|label| record.fields.get(*label))
            .find(|value| is_present(value))
    }

    /// Every present value across the field's labels, in declared order.
    pub fn values<'r>(&self, record: &'r RawRecord, field: F) -> impl Iterator<Item = &'r Value> + 'r {
        self.labels(field)
            .iter()
            .filter_map(move |label| record.fields.get(*label))
            .filter(|value| is_present(value))
    }

    pub fn text(&self, record: &RawRecord, field: F) -> Option<String> {
        self.probe(record, field).and_then(as_text)
    }

    pub fn number(&self, record: &RawRecord, field: F) -> Option<f64> {
        self.probe(record, field).and_then(as_number)
    }

    pub fn date(&self, record: &RawRecord, field: F) -> Option<NaiveDate> {
        self.probe(record, field).and_then(as_date)
    }

    /// Whether the field holds `id`, either directly or inside a list of
    /// linked record ids.
    pub fn links_to(&self, record: &RawRecord, field: F, id: &str) -> bool {
        self.values(record, field).any(|value| match value {
            Value::Array(items) => items.iter().any(|item| as_text(item).as_deref() == Some(id)),
            other => as_text(other).as_deref() == Some(id),
        })
    }
}

pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

// Lookup and rollup columns arrive as one-element lists.
fn single(value: &Value) -> &Value {
    match value {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    }
}

pub fn as_text(value: &Value) -> Option<String> {
    match single(value) {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub fn as_number(value: &Value) -> Option<f64> {
    let number = match single(value) {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

pub fn as_date(value: &Value) -> Option<NaiveDate> {
    let Value::String(text) = single(value) else {
        return None;
    };
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(text, "%d/%m/%Y").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn human_label_wins_over_internal_alias() {
        let record = RawRecord::new("rec1")
            .with_field("Poids Cible", 68)
            .with_field("fldTqxmxv8wPQnhTR", 75);
        assert_eq!(STUDENT_FIELDS.number(&record, StudentField::TargetWeight), Some(68.0));
    }

    #[test]
    fn empty_values_fall_through_to_next_label() {
        let record = RawRecord::new("rec1")
            .with_field("Nom", "  ")
            .with_field("fldqgtzUUGEbyuvQF", Value::Null)
            .with_field("Name", "Camille Durand");
        assert_eq!(
            STUDENT_FIELDS.text(&record, StudentField::Name).as_deref(),
            Some("Camille Durand")
        );
    }

    #[test]
    fn zero_is_a_present_value() {
        let record = RawRecord::new("rec1").with_field("Poids Restant", 0);
        assert_eq!(
            MEASUREMENT_FIELDS.number(&record, MeasurementColumn::WeightRemaining),
            Some(0.0)
        );
    }

    #[test]
    fn missing_field_is_absent() {
        let record = RawRecord::new("rec1");
        assert_eq!(STUDENT_FIELDS.number(&record, StudentField::Age), None);
        assert!(STUDENT_FIELDS.probe(&record, StudentField::Age).is_none());
    }

    #[test]
    fn coerces_strings_and_single_element_lists() {
        assert_eq!(as_number(&json!("72,5")), Some(72.5));
        assert_eq!(as_number(&json!([81.4])), Some(81.4));
        assert_eq!(as_number(&json!("n/a")), None);
        assert_eq!(as_text(&json!(["Pause"])).as_deref(), Some("Pause"));
    }

    #[test]
    fn parses_common_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14);
        assert_eq!(as_date(&json!("2025-03-14")), expected);
        assert_eq!(as_date(&json!("2025-03-14T08:30:00.000Z")), expected);
        assert_eq!(as_date(&json!("14/03/2025")), expected);
        assert_eq!(as_date(&json!(20250314)), None);
    }

    #[test]
    fn links_to_matches_linked_record_lists() {
        let record = RawRecord::new("mes1").with_field("Élève", json!(["recA", "recB"]));
        assert!(MEASUREMENT_FIELDS.links_to(&record, MeasurementColumn::Student, "recB"));
        assert!(!MEASUREMENT_FIELDS.links_to(&record, MeasurementColumn::Student, "recC"));
    }
}
