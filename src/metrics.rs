use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Goal, GoalStatus, MeasurementSnapshot, StudentProfile};

pub const WEIGHT_GOAL_ID: &str = "weight-goal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MeasurementField {
    Weight,
    BodyFat,
    Muscle,
    Water,
    VisceralFat,
    Waist,
    Hip,
    Chest,
    ThighLeft,
    ThighRight,
    ArmLeft,
    ArmRight,
}

impl MeasurementField {
    pub const ALL: [Self; 12] = [
        Self::Weight,
        Self::BodyFat,
        Self::Muscle,
        Self::Water,
        Self::VisceralFat,
        Self::Waist,
        Self::Hip,
        Self::Chest,
        Self::ThighLeft,
        Self::ThighRight,
        Self::ArmLeft,
        Self::ArmRight,
    ];

    pub fn read(self, snapshot: &MeasurementSnapshot) -> Option<f64> {
        match self {
            Self::Weight => Some(snapshot.weight),
            Self::BodyFat => snapshot.body_fat,
            Self::Muscle => snapshot.muscle_percentage,
            Self::Water => snapshot.water,
            Self::VisceralFat => snapshot.visceral_fat,
            Self::Waist => snapshot.waist,
            Self::Hip => snapshot.hip,
            Self::Chest => snapshot.chest,
            Self::ThighLeft => snapshot.thigh_left,
            Self::ThighRight => snapshot.thigh_right,
            Self::ArmLeft => snapshot.arm_left,
            Self::ArmRight => snapshot.arm_right,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Weight => "Weight",
            Self::BodyFat => "Body fat",
            Self::Muscle => "Muscle",
            Self::Water => "Water",
            Self::VisceralFat => "Visceral fat",
            Self::Waist => "Waist",
            Self::Hip => "Hip",
            Self::Chest => "Chest",
            Self::ThighLeft => "Left thigh",
            Self::ThighRight => "Right thigh",
            Self::ArmLeft => "Left arm",
            Self::ArmRight => "Right arm",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Weight => "kg",
            Self::BodyFat | Self::Muscle | Self::Water => "%",
            Self::VisceralFat => "",
            _ => "cm",
        }
    }

    /// The direction of change that counts as progress, if any.
    pub fn favorable_direction(self) -> Option<Direction> {
        match self {
            Self::Weight | Self::BodyFat => Some(Direction::Decreased),
            Self::Muscle => Some(Direction::Increased),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Increased,
    Decreased,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Delta {
    Unavailable,
    Change { magnitude: f64, direction: Direction },
}

impl Delta {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// `None` when the delta is unavailable, unchanged, or the field has no
    /// preferred direction.
    pub fn is_favorable(&self, field: MeasurementField) -> Option<bool> {
        match self {
            Self::Change { direction, .. } if *direction != Direction::Unchanged => {
                field.favorable_direction().map(|wanted| wanted == *direction)
            }
            _ => None,
        }
    }
}

/// Absolute change rounded to one decimal, with its direction.
pub fn delta(current: Option<f64>, previous: Option<f64>) -> Delta {
    let (Some(current), Some(previous)) = (current, previous) else {
        return Delta::Unavailable;
    };

    let diff = current - previous;
    let magnitude = round1(diff.abs());
    let direction = if magnitude == 0.0 {
        Direction::Unchanged
    } else if diff > 0.0 {
        Direction::Increased
    } else {
        Direction::Decreased
    };

    Delta::Change {
        magnitude,
        direction,
    }
}

pub fn field_delta(
    current: &MeasurementSnapshot,
    previous: Option<&MeasurementSnapshot>,
    field: MeasurementField,
) -> Delta {
    delta(field.read(current), previous.and_then(|snapshot| field.read(snapshot)))
}

/// `clamp((initial - current) / (initial - target) * 100, 0, 100)`, or 0 when
/// no loss is required.
pub fn weight_progress(initial: f64, target: f64, current: f64) -> f64 {
    let total_loss_needed = initial - target;
    if total_loss_needed <= 0.0 {
        return 0.0;
    }
    ((initial - current) / total_loss_needed * 100.0).clamp(0.0, 100.0)
}

pub fn goal_progress(achieved: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    achieved as f64 / total as f64 * 100.0
}

pub fn goals_progress(goals: &[Goal]) -> f64 {
    let achieved = goals
        .iter()
        .filter(|goal| goal.status == GoalStatus::Achieved)
        .count();
    goal_progress(achieved, goals.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressTier {
    Early,
    Midway,
    Advanced,
    Complete,
}

impl ProgressTier {
    pub fn from_percent(percent: f64) -> Self {
        match percent {
            p if p >= 90.0 => Self::Complete,
            p if p >= 60.0 => Self::Advanced,
            p if p >= 30.0 => Self::Midway,
            _ => Self::Early,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RemainingWeight {
    Reached,
    Remaining(f64),
    Unavailable,
}

impl RemainingWeight {
    pub fn from_goal(goal: &Goal) -> Self {
        match goal.weight_remaining {
            Some(kg) if kg <= 0.0 => Self::Reached,
            Some(kg) => Self::Remaining(round1(kg.abs())),
            None => Self::Unavailable,
        }
    }
}

pub fn remaining_weight(snapshot: &MeasurementSnapshot) -> RemainingWeight {
    remaining_from(snapshot.weight_remaining, snapshot.weight, snapshot.target_weight)
}

fn remaining_from(stored: Option<f64>, weight: f64, target: Option<f64>) -> RemainingWeight {
    let remaining = match (stored, target) {
        (Some(stored), _) => stored,
        (None, Some(target)) => (weight - target).max(0.0),
        (None, None) => return RemainingWeight::Unavailable,
    };

    if remaining <= 0.0 {
        RemainingWeight::Reached
    } else {
        RemainingWeight::Remaining(round1(remaining.abs()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightPoint {
    pub date: NaiveDate,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionPoint {
    pub date: NaiveDate,
    pub body_fat: Option<f64>,
    pub muscle: Option<f64>,
    pub water: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircumferencePoint {
    pub date: NaiveDate,
    pub waist: Option<f64>,
    pub hip: Option<f64>,
    pub chest: Option<f64>,
}

/// Two date-ordered copies of one measurement series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSeries {
    pub latest_first: Vec<MeasurementSnapshot>,
    pub chronological: Vec<MeasurementSnapshot>,
}

/// Sorts copies of `series`; ties keep fetch order in both views.
pub fn derive(series: &[MeasurementSnapshot]) -> DerivedSeries {
    let mut latest_first = series.to_vec();
    latest_first.sort_by(|a, b| b.date.cmp(&a.date));

    let mut chronological = series.to_vec();
    chronological.sort_by(|a, b| a.date.cmp(&b.date));

    DerivedSeries {
        latest_first,
        chronological,
    }
}

impl DerivedSeries {
    pub fn is_empty(&self) -> bool {
        self.latest_first.is_empty()
    }

    pub fn len(&self) -> usize {
        self.latest_first.len()
    }

    pub fn latest(&self) -> Option<&MeasurementSnapshot> {
        self.latest_first.first()
    }

    pub fn previous(&self) -> Option<&MeasurementSnapshot> {
        self.latest_first.get(1)
    }

    pub fn field_delta(&self, field: MeasurementField) -> Delta {
        match self.latest() {
            Some(latest) => field_delta(latest, self.previous(), field),
            None => Delta::Unavailable,
        }
    }

    /// Progress of the latest snapshot, if it carries both reference weights.
    pub fn weight_progress(&self) -> Option<f64> {
        let latest = self.latest()?;
        Some(weight_progress(
            latest.initial_weight?,
            latest.target_weight?,
            latest.weight,
        ))
    }

    pub fn remaining_weight(&self) -> RemainingWeight {
        self.latest()
            .map(remaining_weight)
            .unwrap_or(RemainingWeight::Unavailable)
    }

    pub fn weight_points(&self) -> Vec<WeightPoint> {
        self.chronological
            .iter()
            .map(|snapshot| WeightPoint {
                date: snapshot.date,
                weight: snapshot.weight,
            })
            .collect()
    }

    pub fn body_composition_points(&self) -> Vec<CompositionPoint> {
        self.chronological
            .iter()
            .filter(|s| positive(s.body_fat) || positive(s.muscle_percentage))
            .map(|s| CompositionPoint {
                date: s.date,
                body_fat: s.body_fat,
                muscle: s.muscle_percentage,
                water: s.water,
            })
            .collect()
    }

    pub fn circumference_points(&self) -> Vec<CircumferencePoint> {
        self.chronological
            .iter()
            .filter(|s| positive(s.waist) || positive(s.hip) || positive(s.chest))
            .map(|s| CircumferencePoint {
                date: s.date,
                waist: s.waist,
                hip: s.hip,
                chest: s.chest,
            })
            .collect()
    }
}

/// Builds the synthetic weight goal from the latest snapshot, falling back to
/// the profile's reference weights.
pub fn weight_goal(latest: &MeasurementSnapshot, profile: Option<&StudentProfile>) -> Option<Goal> {
    let initial = latest
        .initial_weight
        .or_else(|| profile.and_then(|p| p.initial_weight))?;
    let target = latest
        .target_weight
        .or_else(|| profile.and_then(|p| p.target_weight))?;

    let progress = weight_progress(initial, target, latest.weight);
    let remaining = remaining_from(latest.weight_remaining, latest.weight, Some(target));
    let status = match remaining {
        RemainingWeight::Reached => GoalStatus::Achieved,
        _ if progress > 0.0 => GoalStatus::InProgress,
        _ => GoalStatus::Pending,
    };

    Some(Goal {
        id: WEIGHT_GOAL_ID.to_string(),
        student_id: latest.student_id.clone(),
        description: format!("Reach {target:.1} kg"),
        target_date: None,
        status,
        initial_weight: Some(initial),
        target_weight: Some(target),
        current_weight: Some(latest.weight),
        weight_remaining: match remaining {
            RemainingWeight::Remaining(kg) => Some(kg),
            RemainingWeight::Reached => Some(0.0),
            RemainingWeight::Unavailable => None,
        },
        progress_percentage: Some(progress),
    })
}

fn positive(value: Option<f64>) -> bool {
    value.is_some_and(|v| v > 0.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
