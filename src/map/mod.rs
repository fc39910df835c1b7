//! Map module - marker bookkeeping on top of an external map surface

use std::collections::HashMap;

use tracing::debug;

use crate::workout::{Coords, Workout, WorkoutId};

/// Zoom used when centering on the user and when panning to a workout
pub const DEFAULT_ZOOM: f64 = 13.0;

/// Popup attached to a workout marker
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub content: String,
    /// Style hook, `"<type>-popup"`
    pub class_name: String,
    pub max_width: u16,
    pub min_width: u16,
    pub auto_close: bool,
    pub close_on_click: bool,
}

impl Popup {
    pub fn for_workout(workout: &Workout) -> Self {
        let kind = workout.workout_type();
        Self {
            content: format!("{} {}", kind.icon(), workout.description()),
            class_name: format!("{}-popup", kind.as_str()),
            max_width: 250,
            min_width: 100,
            auto_close: false,
            close_on_click: false,
        }
    }
}

/// Interactive map the tracker draws on.
///
/// Clicks are not part of the trait: the front end turns them into
/// [`crate::app::AppEvent::MapClicked`].
pub trait MapSurface {
    type Marker;

    fn center_view(&mut self, coords: Coords, zoom: f64);

    fn add_marker(&mut self, coords: Coords, popup: &Popup) -> Self::Marker;

    fn pan_to(&mut self, coords: Coords, zoom: f64);
}

/// Wraps a [`MapSurface`]; tracks readiness and one marker per workout id
pub struct MapController<M: MapSurface> {
    surface: M,
    zoom: f64,
    ready: bool,
    markers: HashMap<WorkoutId, M::Marker>,
}

impl<M: MapSurface> MapController<M> {
    pub fn new(surface: M, zoom: f64) -> Self {
        Self {
            surface,
            zoom,
            ready: false,
            markers: HashMap::new(),
        }
    }

    /// Center on `coords`; the map counts as ready from here on
    pub fn center(&mut self, coords: Coords) {
        self.surface.center_view(coords, self.zoom);
        self.ready = true;
    }

    /// Place the workout's marker. Returns false if the map is not ready
    /// or the workout already has one.
    pub fn render_marker(&mut self, workout: &Workout) -> bool {
        if !self.ready || self.markers.contains_key(workout.id()) {
            return false;
        }
        let marker = self.surface.add_marker(workout.coords(), &Popup::for_workout(workout));
        self.markers.insert(workout.id().clone(), marker);
        debug!(id = %workout.id(), "Marker placed");
        true
    }

    pub fn pan_to(&mut self, coords: Coords) {
        if self.ready {
            self.surface.pan_to(coords, self.zoom);
        }
    }

    #[cfg(test)]
    fn marker(&self, id: &WorkoutId) -> Option<&M::Marker> {
        self.markers.get(id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut M {
        &mut self.surface
    }
}
