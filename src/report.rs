use std::fmt::Write;

use crate::metrics::{Delta, Direction, MeasurementField, ProgressTier, RemainingWeight};
use crate::models::GoalStatus;
use crate::portal::Dashboard;

const DELTA_FIELDS: [MeasurementField; 6] = [
    MeasurementField::Weight,
    MeasurementField::BodyFat,
    MeasurementField::Muscle,
    MeasurementField::Water,
    MeasurementField::Waist,
    MeasurementField::Hip,
];

fn describe_delta(delta: Delta, field: MeasurementField) -> String {
    match delta {
        Delta::Unavailable => "-".to_string(),
        Delta::Change {
            direction: Direction::Unchanged,
            ..
        } => "unchanged".to_string(),
        Delta::Change {
            magnitude,
            direction,
        } => {
            let arrow = if direction == Direction::Increased { "+" } else { "-" };
            let verdict = match delta.is_favorable(field) {
                Some(true) => " (good)",
                Some(false) => " (watch)",
                None => "",
            };
            format!("{arrow}{magnitude:.1} {}{verdict}", field.unit())
        }
    }
}

fn goal_marker(status: GoalStatus) -> &'static str {
    match status {
        GoalStatus::Achieved => "[x]",
        GoalStatus::InProgress => "[~]",
        GoalStatus::Pending => "[ ]",
    }
}

pub fn build_report(dashboard: &Dashboard) -> String {
    let profile = &dashboard.profile;
    let series = &dashboard.series;
    let mut output = String::new();

    let _ = writeln!(output, "# Progress Report: {}", profile.name);
    let _ = writeln!(output, "Status: {}", profile.status.label());
    if let Some(objectives) = &profile.objectives {
        let _ = writeln!(output, "Objectives: {objectives}");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Weight Progress");

    match (series.latest(), dashboard.weight_progress) {
        (Some(latest), Some(percent)) => {
            let _ = writeln!(
                output,
                "- Current weight {:.1} kg on {}: {:.0}% of the way ({:?})",
                latest.weight,
                latest.date,
                percent,
                ProgressTier::from_percent(percent)
            );
            match dashboard.remaining_weight {
                RemainingWeight::Reached => {
                    let _ = writeln!(output, "- Target reached");
                }
                RemainingWeight::Remaining(kg) => {
                    let _ = writeln!(output, "- {kg:.1} kg to go");
                }
                RemainingWeight::Unavailable => {}
            }
        }
        (Some(latest), None) => {
            let _ = writeln!(
                output,
                "- Current weight {:.1} kg on {} (no target recorded)",
                latest.weight, latest.date
            );
        }
        (None, _) => {
            let _ = writeln!(output, "No measurements recorded yet.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Since Previous Measurement");

    if series.previous().is_none() {
        let _ = writeln!(output, "Not enough measurements to compare.");
    } else {
        for field in DELTA_FIELDS {
            let delta = series.field_delta(field);
            if delta.is_unavailable() {
                continue;
            }
            let _ = writeln!(output, "- {}: {}", field.label(), describe_delta(delta, field));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Goals ({:.0}% achieved)", dashboard.goal_progress);

    if dashboard.goals.is_empty() {
        let _ = writeln!(output, "No goals set.");
    } else {
        for goal in &dashboard.goals {
            let _ = write!(output, "- {} {}", goal_marker(goal.status), goal.description);
            if let Some(target_date) = goal.target_date {
                let _ = write!(output, " by {target_date}");
            }
            let _ = writeln!(output);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Measurements");

    if series.is_empty() {
        let _ = writeln!(output, "No measurements recorded yet.");
    } else {
        for snapshot in series.latest_first.iter().take(5) {
            let _ = write!(output, "- {}: {:.1} kg", snapshot.date, snapshot.weight);
            if let Some(body_fat) = snapshot.body_fat {
                let _ = write!(output, ", body fat {body_fat:.1}%");
            }
            if let Some(waist) = snapshot.waist {
                let _ = write!(output, ", waist {waist:.1} cm");
            }
            let _ = writeln!(output);
        }
    }

    output
}
