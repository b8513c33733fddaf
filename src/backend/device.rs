use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::process::Command;
use tracing::{debug, info};

use super::installer::ToolLocator;
use super::{BackendError, Device, TOOL_NAME};
use crate::color::Rgb;

/// HyperX/Kingston and HP vendor ids.
pub const VENDOR_IDS: &[&str] = &["0951", "03f0"];

/// QuadCast, QuadCast S and DuoCast product ids across both vendors.
pub const PRODUCT_IDS: &[&str] = &[
    "171f", "16d8", "16c1", "0f8b", "028c", "048c", "068c", "098c",
];

pub const TOOL_MISSING: &str = "quadcastrgb utility not found. Install it via Homebrew:\n\
    brew install quadcastrgb\n\n\
    Or download from: https://github.com/Ors1mer/QuadcastRGB";

const DEVICE_MISSING: &str = "QuadCast device not found. Connect the microphone to the computer \
    and make sure it's turned on";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    Other(&'static str),
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            "windows" => Platform::Windows,
            other => Platform::Other(other),
        }
    }
}

/// Does a bus listing show a supported microphone?
///
/// macOS listings carry product names and ids; `lsusb` is only checked for
/// the vendor ids.
pub fn listing_has_device(listing: &str, platform: Platform) -> bool {
    let listing = listing.to_lowercase();
    let vendor = VENDOR_IDS.iter().any(|id| listing.contains(id));
    match platform {
        Platform::Linux => vendor,
        _ => {
            let named = listing.contains("hyperx")
                && (listing.contains("quadcast") || listing.contains("duocast"));
            named || (vendor && PRODUCT_IDS.iter().any(|id| listing.contains(id)))
        }
    }
}

async fn capture(program: &str, args: &[&str]) -> Result<String, BackendError> {
    let output = Command::new(program)
        .args(args)
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|e| BackendError::command(program, e))?;
    if !output.status.success() {
        return Err(BackendError::command(program, output.status));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `ioreg` first, `system_profiler` when it fails.
async fn mac_listing(detailed: bool) -> Result<String, BackendError> {
    match capture("ioreg", &["-p", "IOUSB", "-w0", "-l"]).await {
        Ok(listing) => Ok(listing),
        Err(err) => {
            debug!("ioreg failed ({err}), trying system_profiler");
            let args: &[&str] = if detailed {
                &["SPUSBDataType", "-detailLevel", "full"]
            } else {
                &["SPUSBDataType"]
            };
            capture("system_profiler", args).await
        }
    }
}

async fn probe(platform: Platform) -> Result<(), BackendError> {
    let listing = match platform {
        Platform::MacOs => mac_listing(true).await,
        Platform::Linux => capture("lsusb", &[]).await,
        Platform::Windows => {
            return Err(BackendError::Unsupported("Windows is not yet supported".into()));
        }
        Platform::Other(name) => {
            return Err(BackendError::Unsupported(format!("platform {name} is not supported")));
        }
    }
    .map_err(|e| BackendError::command("usb", format!("failed to check USB devices: {e}")))?;

    if listing_has_device(&listing, platform) {
        return Ok(());
    }
    let message = match platform {
        Platform::MacOs => DEVICE_MISSING,
        _ => "QuadCast device not found",
    };
    Err(BackendError::DeviceNotFound(message.to_string()))
}

/// Stop whatever `quadcastrgb` is holding the LEDs. Not running is fine.
async fn stop_tool() {
    let result = Command::new("killall")
        .arg(TOOL_NAME)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(err) = result {
        debug!("killall {TOOL_NAME}: {err}");
    }
}

/// The microphone as driven through the `quadcastrgb` utility.
pub struct QuadcastDevice {
    locator: ToolLocator,
    /// Tool path once `connect` has succeeded.
    tool: Arc<Mutex<Option<PathBuf>>>,
}

impl QuadcastDevice {
    pub fn new(locator: ToolLocator) -> Self {
        Self {
            locator,
            tool: Arc::new(Mutex::new(None)),
        }
    }

    fn connected_tool(&self) -> Option<PathBuf> {
        self.tool.lock().ok().and_then(|guard| guard.clone())
    }
}

impl Device for QuadcastDevice {
    fn connect(&self) -> BoxFuture<'static, Result<(), BackendError>> {
        let locator = self.locator.clone();
        let slot = Arc::clone(&self.tool);
        async move {
            let tool = locator
                .tool()
                .ok_or_else(|| BackendError::ToolMissing(TOOL_MISSING.to_string()))?;
            probe(Platform::current()).await?;
            info!("microphone found, driving it with {}", tool.display());
            if let Ok(mut guard) = slot.lock() {
                *guard = Some(tool);
            }
            Ok(())
        }
        .boxed()
    }

    fn set_color(&self, r: u8, g: u8, b: u8) -> BoxFuture<'static, Result<(), BackendError>> {
        let tool = self.connected_tool();
        async move {
            let tool = tool.ok_or(BackendError::NotConnected)?;
            stop_tool().await;
            let hex = Rgb::new(r, g, b).to_bare_hex();
            let program = tool.display().to_string();
            // the utility detaches after taking the device, so this returns promptly
            let status = Command::new(&tool)
                .args(["solid", hex.as_str()])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map_err(|e| BackendError::command(&program, format!("error setting color: {e}")))?;
            if !status.success() {
                return Err(BackendError::command(
                    &program,
                    format!("error setting color: {status}"),
                ));
            }
            Ok(())
        }
        .boxed()
    }

    fn off(&self) -> BoxFuture<'static, Result<(), BackendError>> {
        let connected = self.connected_tool().is_some();
        async move {
            if !connected {
                return Err(BackendError::NotConnected);
            }
            stop_tool().await;
            Ok(())
        }
        .boxed()
    }

    fn usb_devices(&self) -> BoxFuture<'static, Result<String, BackendError>> {
        async move {
            let listing = match Platform::current() {
                Platform::MacOs => mac_listing(false).await,
                Platform::Linux => capture("lsusb", &["-v"]).await,
                _ => return Err(BackendError::Unsupported("Unsupported platform".into())),
            };
            listing.map_err(|e| {
                BackendError::command("usb", format!("Error getting USB device list: {e}"))
            })
        }
        .boxed()
    }
}
