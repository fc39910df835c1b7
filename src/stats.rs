//! Workout statistics - totals and averages per workout type

use crate::workout::{Workout, WorkoutType};

/// Aggregates for one workout type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSummary {
    pub kind: WorkoutType,
    pub count: usize,
    /// km
    pub total_distance: f64,
    /// minutes
    pub total_duration: f64,
    /// Overall min/km for running, km/h for cycling
    pub average_rate: Option<f64>,
}

/// Workout analytics
pub struct Analytics<'a> {
    workouts: &'a [Workout],
}

impl<'a> Analytics<'a> {
    pub fn new(workouts: &'a [Workout]) -> Self {
        Self { workouts }
    }

    /// Totals for `kind`. The average rate is distance-weighted
    /// (total time over total distance), not a mean of per-workout rates.
    pub fn summary(&self, kind: WorkoutType) -> TypeSummary {
        let matching = self.workouts.iter().filter(|w| w.workout_type() == kind);
        let (count, total_distance, total_duration) = matching.fold((0, 0.0, 0.0), |(n, d, t), w| {
            (n + 1, d + w.distance(), t + w.duration())
        });

        let average_rate = (count > 0).then(|| match kind {
            WorkoutType::Running => total_duration / total_distance,
            WorkoutType::Cycling => total_distance / (total_duration / 60.0),
        });

        TypeSummary {
            kind,
            count,
            total_distance,
            total_duration,
            average_rate,
        }
    }

    pub fn summaries(&self) -> Vec<TypeSummary> {
        WorkoutType::all().iter().map(|k| self.summary(*k)).collect()
    }

    /// Get workout frequency (sessions per week)
    pub fn weekly_frequency(&self) -> f64 {
        let dates: Vec<_> = self.workouts.iter().map(|w| w.date().date_naive()).collect();
        let (Some(first), Some(last)) = (dates.iter().min(), dates.iter().max()) else {
            return 0.0;
        };
        if dates.len() < 2 {
            return 0.0;
        }

        let days = (*last - *first).num_days() as f64;
        if days == 0.0 {
            return self.workouts.len() as f64;
        }

        (self.workouts.len() as f64 / days) * 7.0
    }
}
