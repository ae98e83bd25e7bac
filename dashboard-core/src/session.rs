use parking_lot::RwLock;

use crate::{geolocation::GeolocationError, model::Position};

#[derive(Debug, Default)]
struct Inner {
    position: Option<Position>,
    position_error: Option<GeolocationError>,
    location_name: Option<String>,
}

/// In-memory state of one dashboard session.
///
/// Shared by reference between the geolocation provider and whoever renders
/// it; there is exactly one current position at a time.
#[derive(Debug, Default)]
pub struct SessionState {
    inner: RwLock<Inner>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<Position> {
        self.inner.read().position.clone()
    }

    /// Replaces the current position and clears any previous error.
    pub fn set_position(&self, position: Position) {
        let mut inner = self.inner.write();
        inner.position = Some(position);
        inner.position_error = None;
    }

    pub fn position_error(&self) -> Option<GeolocationError> {
        self.inner.read().position_error.clone()
    }

    pub fn set_position_error(&self, error: GeolocationError) {
        self.inner.write().position_error = Some(error);
    }

    pub fn location_name(&self) -> Option<String> {
        self.inner.read().location_name.clone()
    }

    pub fn set_location_name(&self, name: impl Into<String>) {
        self.inner.write().location_name = Some(name.into());
    }
}
