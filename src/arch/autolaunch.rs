use std::fmt;

use tauri::AppHandle;
use tauri_plugin_autostart::ManagerExt;

#[derive(Debug)]
pub enum AutoLaunchError {
    Backend(String),
}

impl fmt::Display for AutoLaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoLaunchError::Backend(msg) => write!(f, "auto-launch backend error: {msg}"),
        }
    }
}

impl std::error::Error for AutoLaunchError {}

/// Backing mechanism for "start on login".
///
/// Native login items on some platforms, a helper registration on others; the
/// shell only ever sees one boolean of state through [`AutoLaunch`].
pub trait AutoLaunchProvider: Send + Sync {
    fn is_enabled(&self) -> Result<bool, AutoLaunchError>;
    fn enable(&self) -> Result<(), AutoLaunchError>;
    fn disable(&self) -> Result<(), AutoLaunchError>;
}

/// Provider backed by the autostart plugin (login items / launch agents).
pub struct AutostartPlugin {
    app: AppHandle,
}

impl AutostartPlugin {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl AutoLaunchProvider for AutostartPlugin {
    fn is_enabled(&self) -> Result<bool, AutoLaunchError> {
        self.app
            .autolaunch()
            .is_enabled()
            .map_err(|e| AutoLaunchError::Backend(e.to_string()))
    }

    fn enable(&self) -> Result<(), AutoLaunchError> {
        self.app
            .autolaunch()
            .enable()
            .map_err(|e| AutoLaunchError::Backend(e.to_string()))
    }

    fn disable(&self) -> Result<(), AutoLaunchError> {
        self.app
            .autolaunch()
            .disable()
            .map_err(|e| AutoLaunchError::Backend(e.to_string()))
    }
}

/// One boolean of state over whatever the platform offers.
///
/// Auto-launch is a convenience, never load-bearing: an unusable backing
/// mechanism reads as disabled and writes become logged no-ops instead of
/// surfacing errors to the hosted content.
pub struct AutoLaunch {
    provider: Box<dyn AutoLaunchProvider>,
}

impl AutoLaunch {
    pub fn new(provider: Box<dyn AutoLaunchProvider>) -> Self {
        Self { provider }
    }

    pub fn get(&self) -> bool {
        match self.provider.is_enabled() {
            Ok(enabled) => enabled,
            Err(e) => {
                log::warn!("auto-launch state unavailable, reporting disabled: {e}");
                false
            }
        }
    }

    /// Idempotent: setting an already-matching state is a no-op.
    pub fn set(&self, enabled: bool) {
        match self.provider.is_enabled() {
            Ok(current) if current == enabled => return,
            Ok(_) => {}
            Err(e) => {
                log::warn!("auto-launch state unavailable before write: {e}");
            }
        }

        let result = if enabled {
            self.provider.enable()
        } else {
            self.provider.disable()
        };

        if let Err(e) = result {
            log::warn!("failed to set auto-launch to {enabled}: {e}");
        }
    }
}
