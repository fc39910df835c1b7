//! stridelog - log runs and rides on a map
//!
//! Workouts are created from a map click plus a small form, listed,
//! marked on the map and kept in a local SQLite file.

pub mod app;
pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod map;
pub mod position;
pub mod stats;
pub mod store;
pub mod tui;
pub mod workout;

pub use db::Database;
pub use workout::{Coords, Workout, WorkoutId, WorkoutType};
