//! Entry form - raw field values and their validation

use crate::error::WorkoutError;
use crate::workout::{Activity, WorkoutType, non_negative, positive, whole_positive};

/// Input surface for a new workout
pub trait EntryForm {
    /// Current field contents
    fn values(&self) -> FormValues;

    fn clear(&mut self);

    fn show(&mut self);

    fn hide(&mut self);

    fn is_visible(&self) -> bool;
}

/// Field contents exactly as typed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    pub kind: WorkoutType,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

/// Validated form input, everything except the location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Submission {
    pub distance: f64,
    pub duration: f64,
    pub activity: Activity,
}

impl Submission {
    /// Only the field matching `values.kind` is read of cadence/elevation
    pub fn parse(values: &FormValues) -> Result<Self, WorkoutError> {
        let distance = positive("distance", number("distance", &values.distance)?)?;
        let duration = positive("duration", number("duration", &values.duration)?)?;
        let activity = match values.kind {
            WorkoutType::Running => Activity::Running {
                cadence: whole_positive("cadence", number("cadence", &values.cadence)?)?,
            },
            WorkoutType::Cycling => Activity::Cycling {
                elevation_gain: non_negative(
                    "elevation gain",
                    number("elevation gain", &values.elevation)?,
                )?,
            },
        };
        Ok(Self { distance, duration, activity })
    }
}

fn number(field: &'static str, raw: &str) -> Result<f64, WorkoutError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| WorkoutError::NotANumber { field })
}
