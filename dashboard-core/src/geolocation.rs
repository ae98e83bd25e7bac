//! Device geolocation.
//!
//! [`Geolocation`] owns the "where am I" half of the session: it asks a
//! [`PositionSource`] for a fix and records either the position or the error
//! in the shared [`SessionState`].

use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::watch;

use crate::{
    model::Position,
    permission::{Capability, PermissionObserver, PermissionState},
    session::SessionState,
};

pub const IP_API_URL: &str = "http://ip-api.com/json";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Position unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Backend able to produce a position fix.
#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    async fn acquire(&self) -> Result<Position, GeolocationError>;
}

/// Always reports the same configured position.
#[derive(Debug, Clone)]
pub struct FixedPositionSource {
    position: Option<Position>,
}

impl FixedPositionSource {
    pub fn new(position: Option<Position>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn acquire(&self) -> Result<Position, GeolocationError> {
        self.position
            .as_ref()
            .map(|p| Position::new(p.latitude, p.longitude))
            .ok_or(GeolocationError::PositionUnavailable)
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position of the public IP address (ip-api.com schema).
#[derive(Debug, Clone)]
pub struct IpPositionSource {
    url: String,
    http: Client,
}

impl IpPositionSource {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_url(IP_API_URL)
    }

    pub fn with_url(url: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { url: url.into(), http })
    }
}

#[async_trait]
impl PositionSource for IpPositionSource {
    async fn acquire(&self) -> Result<Position, GeolocationError> {
        let res = self.http.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                GeolocationError::Timeout
            } else {
                GeolocationError::Other(e.to_string())
            }
        })?;

        if !res.status().is_success() {
            tracing::debug!(status = %res.status(), "IP location lookup failed");
            return Err(GeolocationError::PositionUnavailable);
        }

        let body: IpApiResponse =
            res.json().await.map_err(|e| GeolocationError::Other(e.to_string()))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Position::new(lat, lon)),
            _ => {
                tracing::debug!(message = ?body.message, "IP location lookup returned no fix");
                Err(GeolocationError::PositionUnavailable)
            }
        }
    }
}

/// Geolocation provider backed by a [`PositionSource`].
#[derive(Debug)]
pub struct Geolocation {
    source: Arc<dyn PositionSource>,
    session: Arc<SessionState>,
    permission: Option<watch::Receiver<PermissionState>>,
}

impl Geolocation {
    pub fn new(source: Arc<dyn PositionSource>, session: Arc<SessionState>) -> Self {
        Self { source, session, permission: None }
    }

    /// Refuse to locate while the geolocation permission is denied.
    pub fn with_permissions(mut self, observer: &dyn PermissionObserver) -> Self {
        self.permission = Some(observer.state(Capability::Geolocation));
        self
    }

    pub fn position(&self) -> Option<Position> {
        self.session.position()
    }

    pub fn set_position(&self, latitude: f64, longitude: f64) {
        self.session.set_position(Position::new(latitude, longitude));
    }

    pub fn position_error(&self) -> Option<GeolocationError> {
        self.session.position_error()
    }

    pub fn location_name(&self) -> Option<String> {
        self.session.location_name()
    }

    pub fn set_location_name(&self, name: impl Into<String>) {
        self.session.set_location_name(name);
    }

    /// Acquire a fresh position. On failure the error is kept as the last
    /// position error and the previous position is left untouched.
    pub async fn locate(&self) -> bool {
        let denied = self
            .permission
            .as_ref()
            .is_some_and(|rx| *rx.borrow() == PermissionState::Denied);
        if denied {
            tracing::warn!("Geolocation permission denied, not locating");
            self.session.set_position_error(GeolocationError::PermissionDenied);
            return false;
        }

        match self.source.acquire().await {
            Ok(position) => {
                tracing::info!(%position, "Acquired position");
                self.session.set_position(position);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to acquire position");
                self.session.set_position_error(e);
                false
            }
        }
    }
}
