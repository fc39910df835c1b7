//! Headless front end - drives the controller from command-line values

use crate::app::{EntryForm, FormValues, ListEntry, WorkoutView};
use crate::map::{MapSurface, Popup};
use crate::workout::Coords;

/// Form whose values were given up front
pub struct PresetForm {
    values: FormValues,
    visible: bool,
}

impl PresetForm {
    pub fn new(values: FormValues) -> Self {
        Self { values, visible: false }
    }
}

impl EntryForm for PresetForm {
    fn values(&self) -> FormValues {
        self.values.clone()
    }

    fn clear(&mut self) {
        self.values = FormValues { kind: self.values.kind, ..FormValues::default() };
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Map with nothing to draw on; keeps the popups it was given
#[derive(Default)]
pub struct DetachedMap {
    pub popups: Vec<Popup>,
}

impl MapSurface for DetachedMap {
    type Marker = usize;

    fn center_view(&mut self, _coords: Coords, _zoom: f64) {}

    fn add_marker(&mut self, _coords: Coords, popup: &Popup) -> usize {
        self.popups.push(popup.clone());
        self.popups.len() - 1
    }

    fn pan_to(&mut self, _coords: Coords, _zoom: f64) {}
}

/// Collects rendered entries and notices for printing
#[derive(Default)]
pub struct ConsoleView {
    pub entries: Vec<ListEntry>,
    pub notices: Vec<String>,
}

impl WorkoutView for ConsoleView {
    fn render_entry(&mut self, entry: ListEntry) {
        self.entries.push(entry);
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

/// `"🏃‍♂️ 5 km | ⏱ 25 min | ..."`
pub fn format_entry(entry: &ListEntry) -> String {
    entry
        .details
        .iter()
        .map(|d| format!("{} {} {}", d.icon, d.value, d.unit))
        .collect::<Vec<_>>()
        .join(" | ")
}
