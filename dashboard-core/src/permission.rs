//! Permission state for device capabilities.
//!
//! Observers hand out `watch` receivers so a subscriber always sees the
//! latest state and every subsequent change.

use std::{collections::HashMap, fmt, str::FromStr};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Capabilities whose permission can be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Geolocation,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Geolocation => "geolocation",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    Prompt,
}

impl PermissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Prompt => "prompt",
        }
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionState {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "granted" => Ok(PermissionState::Granted),
            "denied" => Ok(PermissionState::Denied),
            "prompt" => Ok(PermissionState::Prompt),
            _ => Err(anyhow::anyhow!(
                "Unknown permission state '{value}'. Expected granted, denied or prompt."
            )),
        }
    }
}

/// Source of permission states for a capability.
pub trait PermissionObserver: Send + Sync {
    /// Current state plus every later change.
    fn state(&self, capability: Capability) -> watch::Receiver<PermissionState>;
}

/// In-process permission table. States are seeded up front and changed with
/// [`PermissionRegistry::set`].
#[derive(Debug, Default)]
pub struct PermissionRegistry {
    channels: Mutex<HashMap<Capability, watch::Sender<PermissionState>>>,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(capability: Capability, state: PermissionState) -> Self {
        let registry = Self::new();
        registry.set(capability, state);
        registry
    }

    /// Publishes `state`; observers are only woken when it differs.
    pub fn set(&self, capability: Capability, state: PermissionState) {
        let mut channels = self.channels.lock();
        let tx = channels
            .entry(capability)
            .or_insert_with(|| watch::channel(state).0);

        let changed = tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });

        if changed {
            tracing::info!(%capability, %state, "Permission state changed");
        }
    }

    pub fn get(&self, capability: Capability) -> PermissionState {
        self.channels
            .lock()
            .get(&capability)
            .map(|tx| *tx.borrow())
            .unwrap_or_default()
    }
}

impl PermissionObserver for PermissionRegistry {
    fn state(&self, capability: Capability) -> watch::Receiver<PermissionState> {
        self.channels
            .lock()
            .entry(capability)
            .or_insert_with(|| watch::channel(PermissionState::default()).0)
            .subscribe()
    }
}
