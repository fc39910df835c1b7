//! Workout persistence - the whole collection as one versioned JSON value
//!
//! Records carry an explicit `type` tag and are rebuilt through
//! [`Workout::new`] on load, so pace, speed and description are always
//! recomputed rather than trusted from storage.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::BlobStore;
use crate::error::{StoreError, WorkoutError};
use crate::workout::{Activity, Coords, Workout, WorkoutId, WorkoutKind, whole_positive};

/// Key the collection is stored under
pub const STORAGE_KEY: &str = "workouts";

/// Current layout version, written into every snapshot
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    workouts: Vec<T>,
}

/// Either the current envelope or the old bare array of records
#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Versioned(Envelope<serde_json::Value>),
    Legacy(Vec<serde_json::Value>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkoutRecord {
    id: WorkoutId,
    date: DateTime<Local>,
    coords: Coords,
    distance: f64,
    duration: f64,
    #[serde(default, alias = "des", skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(flatten)]
    kind: KindRecord,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KindRecord {
    Running {
        cadence: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pace: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Cycling {
        elevation_gain: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed: Option<f64>,
    },
}

impl WorkoutRecord {
    fn from_workout(workout: &Workout) -> Self {
        let kind = match *workout.kind() {
            WorkoutKind::Running { cadence, pace } => KindRecord::Running {
                cadence: f64::from(cadence),
                pace: Some(pace),
            },
            WorkoutKind::Cycling { elevation_gain, speed } => KindRecord::Cycling {
                elevation_gain,
                speed: Some(speed),
            },
        };
        Self {
            id: workout.id().clone(),
            date: workout.date(),
            coords: workout.coords(),
            distance: workout.distance(),
            duration: workout.duration(),
            description: Some(workout.description().to_string()),
            kind,
        }
    }

    /// Rebuild the variant; stored derived values are ignored
    fn into_workout(self) -> Result<Workout, WorkoutError> {
        let activity = match self.kind {
            KindRecord::Running { cadence, .. } => Activity::Running {
                cadence: whole_positive("cadence", cadence)?,
            },
            KindRecord::Cycling { elevation_gain, .. } => Activity::Cycling { elevation_gain },
        };
        Workout::new(self.id, self.date, self.coords, self.distance, self.duration, activity)
    }
}

/// Saves and loads the workout collection through a [`BlobStore`]
pub struct WorkoutStore<S: BlobStore> {
    backend: S,
}

impl<S: BlobStore> WorkoutStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Overwrite the stored collection with `workouts`, in order
    pub fn save(&mut self, workouts: &[Workout]) -> Result<(), StoreError> {
        let envelope = Envelope {
            version: FORMAT_VERSION,
            workouts: workouts.iter().map(WorkoutRecord::from_workout).collect(),
        };
        let json = serde_json::to_string(&envelope)?;
        self.backend.set_item(STORAGE_KEY, &json)?;
        debug!(count = workouts.len(), bytes = json.len(), "Saved workouts");
        Ok(())
    }

    /// Read the stored collection. Never fails: missing or unreadable data
    /// yields an empty list, bad records are skipped.
    pub fn load(&self) -> Vec<Workout> {
        let raw = match self.backend.get_item(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Could not read stored workouts, starting empty");
                return Vec::new();
            }
        };
        let workouts = decode(&raw);
        info!(count = workouts.len(), "Loaded workouts");
        workouts
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }
}

fn decode(raw: &str) -> Vec<Workout> {
    let records = match serde_json::from_str::<Stored>(raw) {
        Ok(Stored::Versioned(envelope)) if envelope.version <= FORMAT_VERSION => envelope.workouts,
        Ok(Stored::Versioned(envelope)) => {
            warn!(version = envelope.version, "Stored workouts use a newer format, ignoring them");
            return Vec::new();
        }
        Ok(Stored::Legacy(records)) => {
            info!("Reading unversioned workout data");
            records
        }
        Err(e) => {
            warn!(error = %e, "Stored workouts are malformed, starting empty");
            return Vec::new();
        }
    };

    let mut workouts: Vec<Workout> = Vec::with_capacity(records.len());
    for (index, value) in records.into_iter().enumerate() {
        let restored = match serde_json::from_value::<WorkoutRecord>(value) {
            Ok(record) => record.into_workout(),
            Err(e) => {
                warn!(index, error = %e, "Skipping undecodable workout record");
                continue;
            }
        };
        match restored {
            Ok(w) if workouts.iter().any(|known| known.id() == w.id()) => {
                warn!(index, id = %w.id(), "Skipping workout with duplicate id");
            }
            Ok(w) => workouts.push(w),
            Err(e) => warn!(index, error = %e, "Skipping invalid workout record"),
        }
    }
    workouts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, MemoryStore};
    use chrono::TimeZone;

    fn date() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 14, 7, 15, 0).single().unwrap()
    }

    fn sample() -> Vec<Workout> {
        let here = Coords::new(40.7, -74.0);
        vec![
            Workout::running("r1".into(), date(), here, 5.0, 25.0, 180).unwrap(),
            Workout::cycling("c1".into(), date(), here, 20.0, 60.0, 150.0).unwrap(),
            Workout::running("r2".into(), date(), Coords::new(51.5, -0.12), 10.5, 52.0, 172).unwrap(),
        ]
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        let store = WorkoutStore::new(MemoryStore::default());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load_restores_variants() {
        let mut store = WorkoutStore::new(MemoryStore::default());
        let workouts = sample();
        store.save(&workouts).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, workouts);
        assert_eq!(loaded[0].pace(), Some(5.0));
        assert_eq!(loaded[1].speed(), Some(20.0));
        assert_eq!(loaded[1].description(), "Cycling on June 14");
    }

    #[test]
    fn test_save_is_idempotent() {
        let mut store = WorkoutStore::new(MemoryStore::default());
        store.save(&sample()).unwrap();
        let first = store.backend().get_item(STORAGE_KEY).unwrap();

        let loaded = store.load();
        store.save(&loaded).unwrap();
        let second = store.backend().get_item(STORAGE_KEY).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_snapshot_layout() {
        let mut store = WorkoutStore::new(MemoryStore::default());
        store.save(&sample()[..2]).unwrap();
        let raw = store.backend().get_item(STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["version"], 1);
        let run = &value["workouts"][0];
        assert_eq!(run["type"], "running");
        assert_eq!(run["cadence"], 180.0);
        assert_eq!(run["description"], "Running on June 14");
        assert_eq!(run["coords"], serde_json::json!([40.7, -74.0]));
        let ride = &value["workouts"][1];
        assert_eq!(ride["type"], "cycling");
        assert_eq!(ride["elevationGain"], 150.0);
    }

    #[test]
    fn test_derived_values_are_recomputed() {
        let raw = r#"{"version":1,"workouts":[
            {"type":"running","id":"x","date":"2024-06-14T07:15:00Z","coords":[1.0,2.0],
             "distance":4,"duration":20,"cadence":160,"pace":99.0,"description":"bogus"}
        ]}"#;
        let loaded = decode(raw);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].pace(), Some(5.0));
        assert!(loaded[0].description().starts_with("Running on June"));
    }

    #[test]
    fn test_legacy_array_is_accepted() {
        let raw = r#"[
            {"date":"2024-03-05T09:30:00.000Z","id":"1709631000","coords":[38.7,-9.1],
             "distance":5,"duration":25,"type":"running","cadence":180,"pace":5,"des":"Running on March 5"},
            {"date":"2024-03-06T09:30:00.000Z","id":"1709717400","coords":[38.7,-9.1],
             "distance":20,"duration":60,"type":"cycling","elevationGain":150,"speed":0.0055,"des":"Cycling on March 6"}
        ]"#;
        let loaded = decode(raw);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id().as_str(), "1709631000");
        assert_eq!(loaded[1].speed(), Some(20.0));
    }

    #[test]
    fn test_malformed_value_loads_empty() {
        let mut db = Database::open(":memory:").unwrap();
        db.set_item(STORAGE_KEY, "{not json").unwrap();
        let store = WorkoutStore::new(db);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_newer_version_loads_empty() {
        let raw = r#"{"version":7,"workouts":[]}"#;
        assert!(decode(raw).is_empty());
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let raw = r#"{"version":1,"workouts":[
            {"type":"running","id":"ok","date":"2024-06-14T07:15:00Z","coords":[1,2],"distance":4,"duration":20,"cadence":160},
            {"type":"swimming","id":"s","date":"2024-06-14T07:15:00Z","coords":[1,2],"distance":1,"duration":30},
            {"type":"running","id":"zero","date":"2024-06-14T07:15:00Z","coords":[1,2],"distance":0,"duration":20,"cadence":160},
            {"type":"cycling","id":"ok","date":"2024-06-14T07:15:00Z","coords":[1,2],"distance":4,"duration":20,"elevationGain":0}
        ]}"#;
        let loaded = decode(raw);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id().as_str(), "ok");
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut store = WorkoutStore::new(MemoryStore::with_limit(16));
        let err = store.save(&sample()).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
    }

    #[test]
    fn test_sqlite_round_trip() {
        let mut store = WorkoutStore::new(Database::open(":memory:").unwrap());
        store.save(&sample()).unwrap();
        assert_eq!(store.load(), sample());
    }
}
