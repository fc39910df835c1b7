//! Workout model - running and cycling sessions with derived metrics

use std::fmt;

use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};

use crate::error::WorkoutError;

/// Month names used in workout descriptions
const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Geographic position, stored as `[lat, lng]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Reject non-finite or out-of-range coordinates
    pub fn validate(self) -> Result<Self, WorkoutError> {
        let in_range = self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng);
        if in_range {
            Ok(self)
        } else {
            Err(WorkoutError::InvalidCoords { lat: self.lat, lng: self.lng })
        }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// Opaque workout identifier, the only key the UI uses to find a workout
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    /// Creation time in hex millis plus 32 random bits
    pub fn generate(at: DateTime<Local>) -> Self {
        let salt: u32 = rand::random();
        Self(format!("{:x}-{:08x}", at.timestamp_millis(), salt))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkoutId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminant of the two workout variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkoutType {
    #[default]
    Running,
    Cycling,
}

impl WorkoutType {
    pub fn all() -> &'static [WorkoutType] {
        &[WorkoutType::Running, WorkoutType::Cycling]
    }

    /// Tag used in storage and popup classes
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Running => "running",
            WorkoutType::Cycling => "cycling",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkoutType::Running => "Running",
            WorkoutType::Cycling => "Cycling",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WorkoutType::Running => "🏃‍♂️",
            WorkoutType::Cycling => "🚴‍♀️",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            WorkoutType::Running => WorkoutType::Cycling,
            WorkoutType::Cycling => WorkoutType::Running,
        }
    }
}

/// Variant-specific input for a new workout
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activity {
    Running { cadence: u32 },
    Cycling { elevation_gain: f64 },
}

/// Variant-specific fields, including the derived metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutKind {
    /// `pace` in min/km
    Running { cadence: u32, pace: f64 },
    /// `speed` in km/h
    Cycling { elevation_gain: f64, speed: f64 },
}

impl WorkoutKind {
    pub fn workout_type(&self) -> WorkoutType {
        match self {
            WorkoutKind::Running { .. } => WorkoutType::Running,
            WorkoutKind::Cycling { .. } => WorkoutType::Cycling,
        }
    }
}

/// One logged exercise session.
///
/// Fields are private and there are no setters: derived values are computed
/// once in [`Workout::new`] and stay in sync with the inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: WorkoutId,
    date: DateTime<Local>,
    coords: Coords,
    distance: f64,
    duration: f64,
    description: String,
    kind: WorkoutKind,
}

impl Workout {
    /// Validate inputs and compute pace/speed and the description.
    ///
    /// `distance` is in km, `duration` in minutes.
    pub fn new(
        id: WorkoutId,
        date: DateTime<Local>,
        coords: Coords,
        distance: f64,
        duration: f64,
        activity: Activity,
    ) -> Result<Self, WorkoutError> {
        let coords = coords.validate()?;
        let distance = positive("distance", distance)?;
        let duration = positive("duration", duration)?;

        let kind = match activity {
            Activity::Running { cadence } => {
                if cadence == 0 {
                    return Err(WorkoutError::NotPositive { field: "cadence" });
                }
                WorkoutKind::Running { cadence, pace: duration / distance }
            }
            Activity::Cycling { elevation_gain } => {
                let elevation_gain = non_negative("elevation gain", elevation_gain)?;
                WorkoutKind::Cycling { elevation_gain, speed: distance / (duration / 60.0) }
            }
        };

        Ok(Self {
            description: describe(kind.workout_type(), &date),
            id,
            date,
            coords,
            distance,
            duration,
            kind,
        })
    }

    pub fn running(
        id: WorkoutId,
        date: DateTime<Local>,
        coords: Coords,
        distance: f64,
        duration: f64,
        cadence: u32,
    ) -> Result<Self, WorkoutError> {
        Self::new(id, date, coords, distance, duration, Activity::Running { cadence })
    }

    pub fn cycling(
        id: WorkoutId,
        date: DateTime<Local>,
        coords: Coords,
        distance: f64,
        duration: f64,
        elevation_gain: f64,
    ) -> Result<Self, WorkoutError> {
        Self::new(id, date, coords, distance, duration, Activity::Cycling { elevation_gain })
    }

    pub fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub fn date(&self) -> DateTime<Local> {
        self.date
    }

    pub fn coords(&self) -> Coords {
        self.coords
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> &WorkoutKind {
        &self.kind
    }

    pub fn workout_type(&self) -> WorkoutType {
        self.kind.workout_type()
    }

    /// Minutes per km, running only
    pub fn pace(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Running { pace, .. } => Some(pace),
            WorkoutKind::Cycling { .. } => None,
        }
    }

    /// km/h, cycling only
    pub fn speed(&self) -> Option<f64> {
        match self.kind {
            WorkoutKind::Cycling { speed, .. } => Some(speed),
            WorkoutKind::Running { .. } => None,
        }
    }
}

/// "<Type> on <Month> <Day>"
pub fn describe(kind: WorkoutType, date: &DateTime<Local>) -> String {
    format!("{} on {} {}", kind.label(), MONTHS[date.month0() as usize], date.day())
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<f64, WorkoutError> {
    if !value.is_finite() {
        return Err(WorkoutError::NotANumber { field });
    }
    if value <= 0.0 {
        return Err(WorkoutError::NotPositive { field });
    }
    Ok(value)
}

pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<f64, WorkoutError> {
    if !value.is_finite() {
        return Err(WorkoutError::NotANumber { field });
    }
    if value < 0.0 {
        return Err(WorkoutError::Negative { field });
    }
    Ok(value)
}

/// Positive integer stored in an f64 (form input, JSON numbers)
pub(crate) fn whole_positive(field: &'static str, value: f64) -> Result<u32, WorkoutError> {
    let value = positive(field, value)?;
    if value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(WorkoutError::NotWhole { field });
    }
    Ok(value as u32)
}
