//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Clients for the weather and place-search services
//! - Session state, geolocation and permission observation
//! - The dashboard coordinator and the debounced place search controller
//!
//! It is used by `dashboard-cli`, but can also be driven by any other front end.

pub mod config;
pub mod dashboard;
pub mod geolocation;
pub mod model;
pub mod notify;
pub mod permission;
pub mod places;
pub mod provider;
pub mod search;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::{Config, GeolocationConfig, PositionSourceKind, ProviderConfig};
pub use dashboard::Dashboard;
pub use geolocation::{Geolocation, GeolocationError, PositionSource};
pub use model::{PlaceDetails, Position, Prediction, Units};
pub use notify::Notifier;
pub use permission::{Capability, PermissionObserver, PermissionRegistry, PermissionState};
pub use places::{PlacesApi, PlacesError};
pub use provider::{ProviderId, WeatherApi};
pub use search::{SearchController, SearchHandle, SearchState, SearchView};
pub use session::SessionState;
