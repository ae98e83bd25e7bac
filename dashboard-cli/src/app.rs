//! Wires the core components together for one CLI session.

use std::sync::Arc;

use anyhow::{Result, bail};
use dashboard_core::{
    Capability, Config, Dashboard, Geolocation, Notifier, PermissionRegistry, PermissionState,
    PositionSource, PositionSourceKind, SessionState,
    geolocation::{FixedPositionSource, IpPositionSource},
    provider::weather_client_from_config,
};
use tokio::{sync::mpsc, task::JoinHandle};

pub struct App {
    pub config: Config,
    pub dashboard: Arc<Dashboard>,
    pub permissions: Arc<PermissionRegistry>,
    _permission_task: JoinHandle<()>,
}

impl App {
    pub async fn start(config: Config) -> Result<Self> {
        let weather = weather_client_from_config(&config)?;

        let permissions = Arc::new(PermissionRegistry::with_state(
            Capability::Geolocation,
            config.geolocation.permission,
        ));

        let source: Arc<dyn PositionSource> = match config.geolocation.source {
            PositionSourceKind::Fixed => Arc::new(FixedPositionSource::new(config.fixed_position())),
            PositionSourceKind::Ip => Arc::new(IpPositionSource::new()?),
        };

        let geolocation = Arc::new(
            Geolocation::new(source, Arc::new(SessionState::new()))
                .with_permissions(permissions.as_ref()),
        );
        let dashboard = Arc::new(Dashboard::new(weather, geolocation));

        // Wait for the first permission state so `geolocation_status` is set.
        let mut status = dashboard.subscribe_permission_status();
        let permission_task = dashboard.track_permissions(permissions.as_ref());
        let initial = status.recv().await?;
        tracing::debug!(%initial, "Geolocation permission");

        Ok(Self { config, dashboard, permissions, _permission_task: permission_task })
    }

    /// Make sure there is a current position: explicit coordinates win,
    /// otherwise ask geolocation (prompting for permission if needed).
    pub async fn resolve_position(&self, at: Option<(f64, f64)>) -> Result<()> {
        if let Some((lat, lng)) = at {
            self.dashboard.update_geolocation_position(lat, lng);
            return Ok(());
        }

        // The registry is read directly; the dashboard's copy is updated by a task.
        if self.permissions.get(Capability::Geolocation) == PermissionState::Prompt {
            let allowed = inquire::Confirm::new("Allow weather-dashboard to use your location?")
                .with_default(true)
                .prompt()?;
            let state = if allowed { PermissionState::Granted } else { PermissionState::Denied };
            self.permissions.set(Capability::Geolocation, state);
        }

        if !self.dashboard.set_geolocation_position().await {
            let reason = self
                .dashboard
                .position_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            bail!(
                "Could not determine your position: {reason}.\n\
                 Hint: pass --lat/--lng, or use `weather-dashboard search`."
            );
        }

        Ok(())
    }
}

/// Forwards dialog messages to the interactive loop that is waiting on them.
#[derive(Debug)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn error(&self, message: &str) {
        tracing::debug!(message, "Notifying user");
        let _ = self.tx.send(message.to_string());
    }
}
