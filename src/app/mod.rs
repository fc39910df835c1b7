//! Application controller - owns the workouts and drives map, form, list and storage
//!
//! Lifecycle:
//! 1. [`AppController::start`] loads stored workouts and lists them (no markers yet)
//! 2. the position answer centers the map and replays markers, or leaves the app map-less
//! 3. a map click picks the location and opens the form
//! 4. a submit validates, creates, renders and persists the workout

pub mod form;
pub mod view;

use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use crate::db::BlobStore;
use crate::error::{GeolocationError, SubmitError};
use crate::map::{MapController, MapSurface};
use crate::store::WorkoutStore;
use crate::workout::{Coords, Workout, WorkoutId};

pub use form::{EntryForm, FormValues, Submission};
pub use view::{Detail, ListEntry, WorkoutView};

pub const POSITION_FAILED_MESSAGE: &str = "Could not get your position.";
pub const SAVE_FAILED_MESSAGE: &str = "Could not save your workouts.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    /// Waiting for the one-shot position answer
    AwaitingPosition,
    /// Position lookup failed; no map, no new workouts
    MapUnavailable,
    MapReady,
    /// Form open for a workout at `pending`
    AwaitingInput { pending: Coords },
}

impl AppState {
    pub fn map_ready(&self) -> bool {
        matches!(self, AppState::MapReady | AppState::AwaitingInput { .. })
    }
}

/// Everything the front end can report to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Position(Result<Coords, GeolocationError>),
    MapClicked(Coords),
    FormSubmitted,
    /// `None` when the click landed outside any list item
    ListItemActivated(Option<WorkoutId>),
}

pub struct AppController<M, F, V, S>
where
    M: MapSurface,
    F: EntryForm,
    V: WorkoutView,
    S: BlobStore,
{
    workouts: Vec<Workout>,
    state: AppState,
    map: MapController<M>,
    form: F,
    view: V,
    store: WorkoutStore<S>,
}

impl<M, F, V, S> AppController<M, F, V, S>
where
    M: MapSurface,
    F: EntryForm,
    V: WorkoutView,
    S: BlobStore,
{
    pub fn new(map: MapController<M>, form: F, view: V, store: WorkoutStore<S>) -> Self {
        Self {
            workouts: Vec::new(),
            state: AppState::AwaitingPosition,
            map,
            form,
            view,
            store,
        }
    }

    /// Load stored workouts and render their list entries.
    /// Markers follow once the map is ready.
    pub fn start(&mut self) {
        self.workouts = self.store.load();
        for workout in &self.workouts {
            self.view.render_entry(ListEntry::from(workout));
        }
        info!(count = self.workouts.len(), "Workouts restored");
    }

    pub fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::Position(result) => self.on_position(result),
            AppEvent::MapClicked(coords) => self.on_map_click(coords),
            AppEvent::FormSubmitted => {
                if let Err(e) = self.submit() {
                    debug!(error = %e, "Submit did not complete");
                }
            }
            AppEvent::ListItemActivated(id) => self.on_list_activate(id.as_ref()),
        }
    }

    /// Apply the one-shot position answer; later answers are ignored
    pub fn on_position(&mut self, result: Result<Coords, GeolocationError>) {
        if self.state != AppState::AwaitingPosition {
            debug!(?result, "Ignoring repeated position answer");
            return;
        }

        match result {
            Ok(coords) => {
                self.map.center(coords);
                for workout in &self.workouts {
                    self.map.render_marker(workout);
                }
                self.state = AppState::MapReady;
                info!(%coords, markers = self.map.marker_count(), "Map ready");
            }
            Err(e) => {
                warn!(error = %e, "Position unavailable, running without map");
                self.state = AppState::MapUnavailable;
                self.view.notify(POSITION_FAILED_MESSAGE);
            }
        }
    }

    /// Remember the clicked location and open the form
    pub fn on_map_click(&mut self, coords: Coords) {
        if !self.state.map_ready() {
            debug!(%coords, state = ?self.state, "Map click ignored");
            return;
        }
        if let Err(e) = coords.validate() {
            debug!(%coords, "Map click outside valid coordinates");
            self.view.notify(&e.to_string());
            return;
        }
        self.state = AppState::AwaitingInput { pending: coords };
        self.form.show();
    }

    /// Validate the form and create the workout at the pending location.
    ///
    /// On invalid input nothing changes and the form stays open. A failed
    /// save keeps the new workout in memory and is returned as
    /// [`SubmitError::Persist`].
    pub fn submit(&mut self) -> Result<WorkoutId, SubmitError> {
        let AppState::AwaitingInput { pending } = self.state else {
            return Err(SubmitError::NoPendingLocation);
        };

        let workout = Submission::parse(&self.form.values()).and_then(|input| {
            let now = Local::now();
            Workout::new(
                self.next_id(now),
                now,
                pending,
                input.distance,
                input.duration,
                input.activity,
            )
        });
        let workout = match workout {
            Ok(workout) => workout,
            Err(e) => {
                self.view.notify(&e.to_string());
                return Err(e.into());
            }
        };

        let id = workout.id().clone();
        info!(%id, kind = workout.workout_type().as_str(), "Workout created");
        self.map.render_marker(&workout);
        self.view.render_entry(ListEntry::from(&workout));
        self.workouts.push(workout);

        self.form.clear();
        self.form.hide();
        self.state = AppState::MapReady;

        if let Err(e) = self.store.save(&self.workouts) {
            error!(error = %e, "Saving workouts failed");
            self.view.notify(SAVE_FAILED_MESSAGE);
            return Err(SubmitError::Persist(e));
        }
        Ok(id)
    }

    /// Pan the map to the workout behind a list item
    pub fn on_list_activate(&mut self, id: Option<&WorkoutId>) {
        let Some(id) = id else {
            return;
        };
        match self.workouts.iter().find(|w| w.id() == id) {
            Some(workout) => self.map.pan_to(workout.coords()),
            None => debug!(%id, "No workout for list item"),
        }
    }

    /// Fresh id, unique within the collection
    fn next_id(&self, now: DateTime<Local>) -> WorkoutId {
        loop {
            let id = WorkoutId::generate(now);
            if !self.workouts.iter().any(|w| w.id() == &id) {
                return id;
            }
        }
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn map(&self) -> &MapController<M> {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapController<M> {
        &mut self.map
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn store(&self) -> &WorkoutStore<S> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::map::{DEFAULT_ZOOM, Popup};
    use crate::store::STORAGE_KEY;
    use crate::workout::WorkoutType;

    #[derive(Debug, Clone, PartialEq)]
    enum MapCall {
        Center(Coords, f64),
        Marker(Coords, String),
        Pan(Coords, f64),
    }

    #[derive(Default)]
    struct RecordingMap {
        calls: Vec<MapCall>,
    }

    impl MapSurface for RecordingMap {
        type Marker = ();

        fn center_view(&mut self, coords: Coords, zoom: f64) {
            self.calls.push(MapCall::Center(coords, zoom));
        }

        fn add_marker(&mut self, coords: Coords, popup: &Popup) {
            self.calls.push(MapCall::Marker(coords, popup.content.clone()));
        }

        fn pan_to(&mut self, coords: Coords, zoom: f64) {
            self.calls.push(MapCall::Pan(coords, zoom));
        }
    }

    #[derive(Default)]
    struct FakeForm {
        values: FormValues,
        visible: bool,
        clears: usize,
    }

    impl EntryForm for FakeForm {
        fn values(&self) -> FormValues {
            self.values.clone()
        }

        fn clear(&mut self) {
            self.clears += 1;
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

    #[derive(Default)]
    struct FakeList {
        entries: Vec<ListEntry>,
        notices: Vec<String>,
    }

    impl WorkoutView for FakeList {
        fn render_entry(&mut self, entry: ListEntry) {
            self.entries.push(entry);
        }

        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    type TestApp = AppController<RecordingMap, FakeForm, FakeList, MemoryStore>;

    const HOME: Coords = Coords { lat: 40.7, lng: -74.0 };

    fn app_with(store: MemoryStore) -> TestApp {
        let mut app = AppController::new(
            MapController::new(RecordingMap::default(), DEFAULT_ZOOM),
            FakeForm::default(),
            FakeList::default(),
            WorkoutStore::new(store),
        );
        app.start();
        app
    }

    fn ready_app() -> TestApp {
        let mut app = app_with(MemoryStore::default());
        app.on_position(Ok(HOME));
        app
    }

    fn fill(app: &mut TestApp, kind: WorkoutType, distance: &str, duration: &str, extra: &str) {
        let values = &mut app.form_mut().values;
        values.kind = kind;
        values.distance = distance.into();
        values.duration = duration.into();
        match kind {
            WorkoutType::Running => values.cadence = extra.into(),
            WorkoutType::Cycling => values.elevation = extra.into(),
        }
    }

    fn log(app: &mut TestApp, at: Coords, kind: WorkoutType, distance: &str, duration: &str, extra: &str) -> Result<WorkoutId, SubmitError> {
        app.handle(AppEvent::MapClicked(at));
        fill(app, kind, distance, duration, extra);
        app.submit()
    }

    /// Moves the store out of a finished controller for a fresh one
    fn reopen(app: TestApp) -> TestApp {
        let raw = app.store().backend().get_item(STORAGE_KEY).unwrap().unwrap();
        let mut store = MemoryStore::default();
        store.set_item(STORAGE_KEY, &raw).unwrap();
        app_with(store)
    }

    #[test]
    fn test_starts_awaiting_position() {
        let app = app_with(MemoryStore::default());
        assert_eq!(app.state(), AppState::AwaitingPosition);
        assert!(!app.form().is_visible());
    }

    #[test]
    fn test_position_centers_map() {
        let app = ready_app();
        assert_eq!(app.state(), AppState::MapReady);
        assert_eq!(app.map().surface().calls, vec![MapCall::Center(HOME, DEFAULT_ZOOM)]);
    }

    #[test]
    fn test_position_failure_leaves_map_unavailable() {
        let mut app = app_with(MemoryStore::default());
        app.on_position(Err(GeolocationError::Unavailable));
        assert_eq!(app.state(), AppState::MapUnavailable);
        assert_eq!(app.view().notices, vec![POSITION_FAILED_MESSAGE.to_string()]);

        app.handle(AppEvent::MapClicked(HOME));
        assert!(!app.form().is_visible());
        assert!(matches!(app.submit(), Err(SubmitError::NoPendingLocation)));
        assert!(app.workouts().is_empty());
    }

    #[test]
    fn test_second_position_answer_ignored() {
        let mut app = ready_app();
        app.on_position(Ok(Coords::new(1.0, 1.0)));
        assert_eq!(app.map().surface().calls.len(), 1);
    }

    #[test]
    fn test_map_click_opens_form() {
        let mut app = ready_app();
        let spot = Coords::new(40.71, -74.01);
        app.handle(AppEvent::MapClicked(spot));
        assert_eq!(app.state(), AppState::AwaitingInput { pending: spot });
        assert!(app.form().is_visible());

        let moved = Coords::new(40.72, -74.02);
        app.handle(AppEvent::MapClicked(moved));
        assert_eq!(app.state(), AppState::AwaitingInput { pending: moved });
    }

    #[test]
    fn test_click_beyond_pole_keeps_form_closed() {
        let mut app = ready_app();
        app.handle(AppEvent::MapClicked(Coords::new(109.5, 0.0)));
        assert_eq!(app.state(), AppState::MapReady);
        assert!(!app.form().is_visible());
        assert_eq!(app.view().notices.len(), 1);

        let spot = Coords::new(40.71, -74.01);
        app.handle(AppEvent::MapClicked(spot));
        app.handle(AppEvent::MapClicked(Coords::new(-95.0, 10.0)));
        assert_eq!(app.state(), AppState::AwaitingInput { pending: spot });
    }

    #[test]
    fn test_submit_without_click_is_rejected() {
        let mut app = ready_app();
        fill(&mut app, WorkoutType::Running, "5", "25", "180");
        assert!(matches!(app.submit(), Err(SubmitError::NoPendingLocation)));
        assert!(app.workouts().is_empty());
    }

    #[test]
    fn test_create_running() {
        let mut app = ready_app();
        let id = log(&mut app, HOME, WorkoutType::Running, "5", "25", "180").unwrap();

        let w = &app.workouts()[0];
        assert_eq!(w.id(), &id);
        assert_eq!(w.pace(), Some(5.0));
        assert_eq!(w.coords(), HOME);
        assert_eq!(w.description(), crate::workout::describe(WorkoutType::Running, &w.date()));

        let calls = &app.map().surface().calls;
        assert_eq!(calls[1], MapCall::Marker(HOME, format!("🏃‍♂️ {}", w.description())));
        assert_eq!(app.view().entries.len(), 1);
        assert_eq!(app.view().entries[0].id, id);

        assert!(!app.form().is_visible());
        assert_eq!(app.form().clears, 1);
        assert_eq!(app.state(), AppState::MapReady);
        assert_eq!(app.store().backend().writes, 1);
    }

    #[test]
    fn test_create_cycling() {
        let mut app = ready_app();
        log(&mut app, HOME, WorkoutType::Cycling, "20", "60", "150").unwrap();
        assert_eq!(app.workouts()[0].speed(), Some(20.0));
    }

    #[test]
    fn test_invalid_input_changes_nothing() {
        let mut app = ready_app();
        for distance in ["0", "-2", "five", ""] {
            let err = log(&mut app, HOME, WorkoutType::Running, distance, "25", "180").unwrap_err();
            assert!(matches!(err, SubmitError::Invalid(_)));
        }

        assert!(app.workouts().is_empty());
        assert!(app.view().entries.is_empty());
        assert_eq!(app.map().surface().calls.len(), 1);
        assert_eq!(app.view().notices.len(), 4);
        assert!(app.form().is_visible());
        assert_eq!(app.state(), AppState::AwaitingInput { pending: HOME });
        assert_eq!(app.store().backend().writes, 0);
    }

    #[test]
    fn test_save_failure_is_surfaced() {
        let mut app = app_with(MemoryStore::with_limit(10));
        app.on_position(Ok(HOME));
        let err = log(&mut app, HOME, WorkoutType::Running, "5", "25", "180").unwrap_err();

        assert!(matches!(err, SubmitError::Persist(_)));
        assert_eq!(app.workouts().len(), 1);
        assert_eq!(app.view().notices, vec![SAVE_FAILED_MESSAGE.to_string()]);
    }

    #[test]
    fn test_reload_lists_in_insertion_order_without_markers() {
        let mut app = ready_app();
        let ids: Vec<_> = [("3", "18", "170"), ("10", "55", "175"), ("7", "40", "168")]
            .into_iter()
            .map(|(d, t, c)| log(&mut app, HOME, WorkoutType::Running, d, t, c).unwrap())
            .collect();
        log(&mut app, HOME, WorkoutType::Cycling, "30", "75", "300").unwrap();

        let fresh = reopen(app);
        assert_eq!(fresh.view().entries.len(), 4);
        let listed: Vec<_> = fresh.view().entries.iter().map(|e| e.id.clone()).collect();
        assert_eq!(&listed[..3], &ids[..]);
        assert_eq!(fresh.view().entries[3].kind, WorkoutType::Cycling);
        assert!(fresh.map().surface().calls.is_empty());
    }

    #[test]
    fn test_markers_replayed_when_map_ready() {
        let mut app = ready_app();
        log(&mut app, HOME, WorkoutType::Running, "5", "25", "180").unwrap();
        log(&mut app, Coords::new(40.8, -73.9), WorkoutType::Cycling, "20", "60", "150").unwrap();

        let mut fresh = reopen(app);
        fresh.on_position(Ok(HOME));
        let markers = fresh
            .map()
            .surface()
            .calls
            .iter()
            .filter(|c| matches!(c, MapCall::Marker(..)))
            .count();
        assert_eq!(markers, 2);
        assert_eq!(fresh.workouts().len(), 2);
        assert_eq!(fresh.view().entries.len(), 2);
    }

    #[test]
    fn test_list_click_pans_to_workout() {
        let mut app = ready_app();
        let far = Coords::new(48.85, 2.35);
        log(&mut app, HOME, WorkoutType::Running, "5", "25", "180").unwrap();
        let id = log(&mut app, far, WorkoutType::Cycling, "20", "60", "150").unwrap();

        app.handle(AppEvent::ListItemActivated(Some(id)));
        assert_eq!(app.map().surface().calls.last(), Some(&MapCall::Pan(far, DEFAULT_ZOOM)));
    }

    #[test]
    fn test_list_click_misses_are_ignored() {
        let mut app = ready_app();
        log(&mut app, HOME, WorkoutType::Running, "5", "25", "180").unwrap();
        let before = app.map().surface().calls.len();

        app.handle(AppEvent::ListItemActivated(None));
        app.handle(AppEvent::ListItemActivated(Some("nope".into())));
        assert_eq!(app.map().surface().calls.len(), before);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut app = ready_app();
        for _ in 0..20 {
            log(&mut app, HOME, WorkoutType::Running, "5", "25", "180").unwrap();
        }
        let mut ids: Vec<_> = app.workouts().iter().map(|w| w.id().clone()).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }
}
