//! Dashboard coordinator.
//!
//! Resolves the current position and fans weather, air-quality and
//! place-name lookups out to the weather client. Position and permission
//! changes are published on broadcast channels; sending with no subscribers
//! is fine.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    geolocation::{Geolocation, GeolocationError},
    model::{AirPollutionResponse, OneCallResponse, Position, ReverseGeocoderResponse, Units},
    permission::{Capability, PermissionObserver, PermissionState},
    provider::WeatherApi,
};

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct Dashboard {
    weather: Arc<dyn WeatherApi>,
    geolocation: Arc<Geolocation>,
    permission_status: Arc<RwLock<Option<PermissionState>>>,
    status_tx: broadcast::Sender<PermissionState>,
    position_tx: broadcast::Sender<Position>,
}

impl Dashboard {
    pub fn new(weather: Arc<dyn WeatherApi>, geolocation: Arc<Geolocation>) -> Self {
        let (status_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (position_tx, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            weather,
            geolocation,
            permission_status: Arc::new(RwLock::new(None)),
            status_tx,
            position_tx,
        }
    }

    /// Follow the geolocation permission of `observer`. The current state is
    /// recorded and re-published immediately, then every change after it.
    pub fn track_permissions(&self, observer: &dyn PermissionObserver) -> JoinHandle<()> {
        let mut rx = observer.state(Capability::Geolocation);
        let status = Arc::clone(&self.permission_status);
        let tx = self.status_tx.clone();

        tokio::spawn(async move {
            loop {
                let state = *rx.borrow_and_update();
                tracing::debug!(%state, "Geolocation permission status");
                *status.write() = Some(state);
                let _ = tx.send(state);

                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    pub fn subscribe_permission_status(&self) -> broadcast::Receiver<PermissionState> {
        self.status_tx.subscribe()
    }

    pub fn subscribe_position(&self) -> broadcast::Receiver<Position> {
        self.position_tx.subscribe()
    }

    /// Last observed permission state, `None` until one has been observed.
    pub fn geolocation_status(&self) -> Option<PermissionState> {
        *self.permission_status.read()
    }

    pub fn position(&self) -> Option<Position> {
        self.geolocation.position()
    }

    pub fn position_error(&self) -> Option<GeolocationError> {
        self.geolocation.position_error()
    }

    pub fn location_name(&self) -> Option<String> {
        self.geolocation.location_name()
    }

    pub fn set_location_name(&self, name: impl Into<String>) {
        self.geolocation.set_location_name(name);
    }

    pub async fn current_weather(&self, units: Option<Units>) -> Result<Option<OneCallResponse>> {
        let Some(position) = self.position() else {
            tracing::debug!("No position, skipping weather lookup");
            return Ok(None);
        };

        self.weather
            .current_and_forecast(position.latitude, position.longitude, units)
            .await
            .map(Some)
    }

    pub async fn air_pollution(&self) -> Result<Option<AirPollutionResponse>> {
        let Some(position) = self.position() else {
            tracing::debug!("No position, skipping air pollution lookup");
            return Ok(None);
        };

        self.weather
            .air_pollution(position.latitude, position.longitude)
            .await
            .map(Some)
    }

    /// Reverse-geocoded names for the current position.
    pub async fn location_names(&self) -> Result<Option<Vec<ReverseGeocoderResponse>>> {
        let Some(position) = self.position() else {
            tracing::debug!("No position, skipping reverse geocoding");
            return Ok(None);
        };

        self.weather
            .reverse_geocode(position.latitude, position.longitude)
            .await
            .map(Some)
    }

    /// Name the current position after its best reverse-geocoding match and
    /// return that name.
    pub async fn refresh_location_name(&self) -> Result<Option<String>> {
        let name = self
            .location_names()
            .await?
            .and_then(|names| names.first().map(ReverseGeocoderResponse::display_name));

        if let Some(name) = &name {
            self.set_location_name(name.clone());
        }
        Ok(name)
    }

    /// Ask the geolocation provider for a fresh fix.
    pub async fn set_geolocation_position(&self) -> bool {
        self.geolocation.locate().await
    }

    /// Make (`lat`, `lng`) the current position and notify subscribers once.
    pub fn update_geolocation_position(&self, lat: f64, lng: f64) {
        self.geolocation.set_position(lat, lng);

        if let Some(position) = self.geolocation.position() {
            tracing::info!(%position, "Position updated");
            let _ = self.position_tx.send(position);
        }
    }
}
