//! Position source - one-shot device location lookup

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::GeolocationError;
use crate::workout::Coords;

pub type PositionResult = Result<Coords, GeolocationError>;

/// Single-shot position request. The receiver resolves exactly once,
/// there is no retry and no cancellation.
pub trait Geolocation {
    fn request_once(&mut self) -> oneshot::Receiver<PositionResult>;
}

/// Reports a configured home position, or fails when none is set
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition {
    coords: Option<Coords>,
}

impl FixedPosition {
    pub fn new(coords: Option<Coords>) -> Self {
        Self { coords }
    }
}

impl Geolocation for FixedPosition {
    fn request_once(&mut self) -> oneshot::Receiver<PositionResult> {
        let (tx, rx) = oneshot::channel();
        let result = self.coords.ok_or(GeolocationError::Unavailable);
        debug!(?result, "Position requested");
        // Receiver is returned below, it cannot be gone yet
        let _ = tx.send(result);
        rx
    }
}

/// Non-blocking check of a pending request, for event loops.
///
/// `None` while the answer is outstanding; a dropped sender counts as failure.
pub fn poll_position(rx: &mut oneshot::Receiver<PositionResult>) -> Option<PositionResult> {
    match rx.try_recv() {
        Ok(result) => Some(result),
        Err(oneshot::error::TryRecvError::Empty) => None,
        Err(oneshot::error::TryRecvError::Closed) => Some(Err(GeolocationError::Dropped)),
    }
}
