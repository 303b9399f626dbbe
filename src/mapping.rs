use crate::aliases::{GoalColumn, MeasurementColumn, GOAL_FIELDS, MEASUREMENT_FIELDS};
use crate::models::{Goal, GoalStatus, MeasurementSnapshot, RawRecord};

/// Typed rows extracted from a table, plus how many linked rows could not be
/// typed.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapped<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

pub fn measurements_for(records: &[RawRecord], student_id: &str) -> Mapped<MeasurementSnapshot> {
    map_linked(records, |record| {
        MEASUREMENT_FIELDS
            .links_to(record, MeasurementColumn::Student, student_id)
            .then(|| measurement_from_record(record, student_id))
    })
}

pub fn goals_for(records: &[RawRecord], student_id: &str) -> Mapped<Goal> {
    map_linked(records, |record| {
        GOAL_FIELDS
            .links_to(record, GoalColumn::Student, student_id)
            .then(|| goal_from_record(record, student_id))
    })
}

fn map_linked<T>(records: &[RawRecord], map: impl Fn(&RawRecord) -> Option<Option<T>>) -> Mapped<T> {
    let mut items = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        match map(record) {
            Some(Some(item)) => items.push(item),
            Some(None) => skipped += 1,
            None => {}
        }
    }

    Mapped { items, skipped }
}

/// Date and weight are required; every other reading is optional.
pub fn measurement_from_record(record: &RawRecord, student_id: &str) -> Option<MeasurementSnapshot> {
    use MeasurementColumn as C;
    let number = |column| MEASUREMENT_FIELDS.number(record, column);

    let date = MEASUREMENT_FIELDS.date(record, C::Date)?;
    let weight = number(C::Weight)?;

    Some(MeasurementSnapshot {
        height: number(C::Height),
        body_fat: number(C::BodyFat),
        muscle_percentage: number(C::Muscle),
        water: number(C::Water),
        visceral_fat: number(C::VisceralFat),
        thigh_left: number(C::ThighLeft),
        thigh_right: number(C::ThighRight),
        hip: number(C::Hip),
        waist: number(C::Waist),
        chest: number(C::Chest),
        arm_left: number(C::ArmLeft),
        arm_right: number(C::ArmRight),
        weight_lost: number(C::WeightLost),
        weight_remaining: number(C::WeightRemaining),
        initial_weight: number(C::InitialWeight),
        target_weight: number(C::TargetWeight),
        ..MeasurementSnapshot::new(record.id.clone(), student_id, date, weight)
    })
}

pub fn goal_from_record(record: &RawRecord, student_id: &str) -> Option<Goal> {
    use GoalColumn as C;
    let number = |column| GOAL_FIELDS.number(record, column);

    let description = GOAL_FIELDS.text(record, C::Description)?;
    let status = GOAL_FIELDS
        .text(record, C::Status)
        .and_then(|label| GoalStatus::from_label(&label))
        .unwrap_or(GoalStatus::Pending);

    Some(Goal {
        id: record.id.clone(),
        student_id: student_id.to_string(),
        description,
        target_date: GOAL_FIELDS.date(record, C::TargetDate),
        status,
        initial_weight: number(C::InitialWeight),
        target_weight: number(C::TargetWeight),
        current_weight: number(C::CurrentWeight),
        weight_remaining: number(C::WeightRemaining),
        progress_percentage: number(C::Progress),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn keeps_only_rows_linked_to_the_student() {
        let records = vec![
            RawRecord::new("m1")
                .with_field("Élève", json!(["recA"]))
                .with_field("Date", "2025-01-10")
                .with_field("Poids", 81.2)
                .with_field("Tour de Taille", 92),
            RawRecord::new("m2")
                .with_field("Élève", json!(["recB"]))
                .with_field("Date", "2025-01-11")
                .with_field("Poids", 64.0),
            RawRecord::new("m3")
                .with_field("studentId", "recA")
                .with_field("date", "2025-02-10")
                .with_field("weight", "80,4"),
        ];

        let mapped = measurements_for(&records, "recA");
        assert_eq!(mapped.skipped, 0);
        let ids: Vec<&str> = mapped.items.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
        assert_eq!(mapped.items[0].waist, Some(92.0));
        assert_eq!(mapped.items[0].body_fat, None);
        assert_eq!(mapped.items[1].weight, 80.4);
        assert_eq!(mapped.items[1].date, NaiveDate::from_ymd_opt(2025, 2, 10).unwrap());
    }

    #[test]
    fn rows_without_date_or_weight_are_skipped() {
        let records = vec![
            RawRecord::new("m1").with_field("Élève", "recA").with_field("Poids", 80),
            RawRecord::new("m2").with_field("Élève", "recA").with_field("Date", "2025-01-01"),
        ];
        let mapped = measurements_for(&records, "recA");
        assert!(mapped.items.is_empty());
        assert_eq!(mapped.skipped, 2);
    }

    #[test]
    fn maps_goal_status_labels() {
        let records = vec![
            RawRecord::new("g1")
                .with_field("Élève", json!(["recA"]))
                .with_field("Description", "Courir 10 km")
                .with_field("Statut", "Atteint"),
            RawRecord::new("g2")
                .with_field("Élève", json!(["recA"]))
                .with_field("Description", "Dormir 8h")
                .with_field("Statut", "in-progress"),
            RawRecord::new("g3")
                .with_field("Élève", json!(["recA"]))
                .with_field("Description", "Boire 2L"),
        ];
        let goals = goals_for(&records, "recA").items;
        let statuses: Vec<GoalStatus> = goals.iter().map(|g| g.status).collect();
        assert_eq!(
            statuses,
            vec![GoalStatus::Achieved, GoalStatus::InProgress, GoalStatus::Pending]
        );
    }
}
