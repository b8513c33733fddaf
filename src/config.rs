use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::pipeline::DEFAULT_SAVE_DELAY;

pub const DEFAULT_WHEEL_SIZE: u32 = 200;
const WHEEL_SIZE_RANGE: (u32, u32) = (96, 480);
const DEBOUNCE_RANGE_MS: (u64, u64) = (50, 5000);
const SETTINGS_FILE: &str = ".quadcast-ui-settings.json";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub settings_path: PathBuf,
    /// Explicit location of the `quadcastrgb` binary, skipping the search.
    pub tool_override: Option<PathBuf>,
    pub save_delay: Duration,
    pub wheel_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            tool_override: None,
            save_delay: DEFAULT_SAVE_DELAY,
            wheel_size: DEFAULT_WHEEL_SIZE,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source. Bad values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(path) = get("QUADCAST_RGB_SETTINGS") {
            config.settings_path = expand_home(&path);
        }
        if let Some(path) = get("QUADCAST_RGB_TOOL") {
            config.tool_override = Some(expand_home(&path));
        }
        if let Some(raw) = get("QUADCAST_RGB_SAVE_DEBOUNCE_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => {
                    let clamped = ms.clamp(DEBOUNCE_RANGE_MS.0, DEBOUNCE_RANGE_MS.1);
                    if clamped != ms {
                        warn!("QUADCAST_RGB_SAVE_DEBOUNCE_MS={ms} out of range, using {clamped}");
                    }
                    config.save_delay = Duration::from_millis(clamped);
                }
                Err(_) => warn!("ignoring QUADCAST_RGB_SAVE_DEBOUNCE_MS={raw:?}: not a number"),
            }
        }
        if let Some(raw) = get("QUADCAST_RGB_WHEEL_SIZE") {
            match raw.parse::<u32>() {
                Ok(size) => {
                    let clamped = size.clamp(WHEEL_SIZE_RANGE.0, WHEEL_SIZE_RANGE.1);
                    if clamped != size {
                        warn!("QUADCAST_RGB_WHEEL_SIZE={size} out of range, using {clamped}");
                    }
                    config.wheel_size = clamped;
                }
                Err(_) => warn!("ignoring QUADCAST_RGB_WHEEL_SIZE={raw:?}: not a number"),
            }
        }
        config
    }
}

/// `~/.quadcast-ui-settings.json`
pub fn default_settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(SETTINGS_FILE)
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(rest),
        None => PathBuf::from(path),
    }
}
