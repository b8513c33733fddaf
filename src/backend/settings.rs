use std::io::ErrorKind;
use std::path::PathBuf;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use super::{BackendError, Settings, SettingsStore};

/// Settings kept as pretty-printed JSON in a single file.
pub struct JsonSettings {
    path: PathBuf,
}

impl JsonSettings {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Parse the settings file. Missing keys take their defaults.
pub fn parse_settings(content: &str) -> Result<Settings, BackendError> {
    serde_json::from_str(content).map_err(|e| BackendError::Settings(e.to_string()))
}

pub fn render_settings(settings: &Settings) -> Result<String, BackendError> {
    serde_json::to_string_pretty(settings).map_err(|e| BackendError::Settings(e.to_string()))
}

async fn read(path: PathBuf) -> Result<Settings, BackendError> {
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => parse_settings(&content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("no settings at {}, using defaults", path.display());
            Ok(Settings::default())
        }
        Err(e) => Err(BackendError::Settings(format!(
            "reading {}: {e}",
            path.display()
        ))),
    }
}

impl SettingsStore for JsonSettings {
    fn load(&self) -> BoxFuture<'static, Result<Settings, BackendError>> {
        read(self.path.clone()).boxed()
    }

    fn save_color(&self, hex: String) -> BoxFuture<'static, Result<(), BackendError>> {
        let path = self.path.clone();
        async move {
            let mut settings = read(path.clone()).await.unwrap_or_else(|e| {
                warn!("overwriting unreadable settings: {e}");
                Settings::default()
            });
            settings.last_color = hex;
            let content = render_settings(&settings)?;
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| BackendError::Settings(e.to_string()))?;
            }
            tokio::fs::write(&path, content)
                .await
                .map_err(|e| BackendError::Settings(format!("writing {}: {e}", path.display())))
        }
        .boxed()
    }
}
