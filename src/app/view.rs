//! Workout list view - display model for list entries

use crate::workout::{Workout, WorkoutId, WorkoutKind, WorkoutType};

/// Where workouts are listed and the user is told about problems
pub trait WorkoutView {
    /// Entries arrive in creation order
    fn render_entry(&mut self, entry: ListEntry);

    fn notify(&mut self, message: &str);
}

/// One icon/value/unit cell
#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    pub icon: &'static str,
    pub value: String,
    pub unit: &'static str,
}

impl Detail {
    fn new(icon: &'static str, value: String, unit: &'static str) -> Self {
        Self { icon, value, unit }
    }
}

/// A rendered list item, keyed back to its workout by `id`
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub id: WorkoutId,
    pub kind: WorkoutType,
    pub title: String,
    pub details: Vec<Detail>,
}

impl From<&Workout> for ListEntry {
    fn from(w: &Workout) -> Self {
        let kind = w.workout_type();
        let mut details = vec![
            Detail::new(kind.icon(), w.distance().to_string(), "km"),
            Detail::new("⏱", w.duration().to_string(), "min"),
        ];
        match *w.kind() {
            WorkoutKind::Running { cadence, pace } => {
                details.push(Detail::new("⚡️", format!("{:.1}", pace), "min/km"));
                details.push(Detail::new("🦶🏼", cadence.to_string(), "spm"));
            }
            WorkoutKind::Cycling { elevation_gain, speed } => {
                details.push(Detail::new("⚡️", format!("{:.1}", speed), "km/h"));
                details.push(Detail::new("⛰", elevation_gain.to_string(), "m"));
            }
        }

        Self {
            id: w.id().clone(),
            kind,
            title: w.description().to_string(),
            details,
        }
    }
}
