//! Collaborators the UI talks to: the `quadcastrgb` utility, the USB bus and
//! the settings file. Each sits behind a trait so the core can be driven by
//! in-memory fakes in tests.

pub mod device;
pub mod installer;
pub mod settings;

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

/// Name of the command-line utility that drives the microphone LEDs.
pub const TOOL_NAME: &str = "quadcastrgb";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("device not connected")]
    NotConnected,
    #[error("{0}")]
    ToolMissing(String),
    #[error("{0}")]
    DeviceNotFound(String),
    #[error("{0}")]
    Unsupported(String),
    #[error("{program}: {message}")]
    Command { program: String, message: String },
    #[error("settings: {0}")]
    Settings(String),
    #[error("{0}")]
    Install(String),
}

impl BackendError {
    pub(crate) fn command(program: &str, message: impl ToString) -> Self {
        Self::Command {
            program: program.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result of a dependency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    pub installed: bool,
    pub message: String,
}

/// Persisted user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Bare `rrggbb`; empty means nothing saved.
    #[serde(default)]
    pub last_color: String,
    #[serde(default)]
    pub auto_apply: bool,
    #[serde(default)]
    pub launch_at_login: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_color: "ff0000".to_string(),
            auto_apply: false,
            launch_at_login: false,
        }
    }
}

pub trait Dependencies: Send + Sync {
    fn check(&self) -> BoxFuture<'static, Result<DependencyStatus, BackendError>>;
    fn install(&self) -> BoxFuture<'static, Result<(), BackendError>>;
}

pub trait Device: Send + Sync {
    fn connect(&self) -> BoxFuture<'static, Result<(), BackendError>>;
    fn set_color(&self, r: u8, g: u8, b: u8) -> BoxFuture<'static, Result<(), BackendError>>;
    fn off(&self) -> BoxFuture<'static, Result<(), BackendError>>;
    /// Raw USB bus listing for the debug view.
    fn usb_devices(&self) -> BoxFuture<'static, Result<String, BackendError>>;
}

pub trait SettingsStore: Send + Sync {
    fn load(&self) -> BoxFuture<'static, Result<Settings, BackendError>>;
    fn save_color(&self, hex: String) -> BoxFuture<'static, Result<(), BackendError>>;
}

/// Handles to every collaborator, cheap to clone into tasks.
#[derive(Clone)]
pub struct Backend {
    pub dependencies: Arc<dyn Dependencies>,
    pub device: Arc<dyn Device>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Backend {
    /// The real thing: shell out to `quadcastrgb` and keep settings in a JSON file.
    pub fn system(config: &AppConfig) -> Self {
        let locator = installer::ToolLocator::new(config.tool_override.clone());
        Self {
            dependencies: Arc::new(installer::Installer::new(locator.clone())),
            device: Arc::new(device::QuadcastDevice::new(locator)),
            settings: Arc::new(settings::JsonSettings::new(config.settings_path.clone())),
        }
    }
}
