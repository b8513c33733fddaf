use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::process::Command;
use tracing::{debug, info};

use super::{BackendError, Dependencies, DependencyStatus, TOOL_NAME};

/// Homebrew prefixes (Apple Silicon, Intel) and MacPorts.
const TOOL_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin", "/opt/local/bin"];
const BREW_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin"];

pub const HOMEBREW_REQUIRED: &str = "Homebrew installation required:\n\
    curl -fsSL https://brew.sh | bash\n\n\
    Then install quadcastrgb:\n\
    brew install quadcastrgb";
pub const TOOL_REQUIRED: &str = "quadcastrgb installation required:\nbrew install quadcastrgb";

/// Finds the `quadcastrgb` and `brew` executables.
#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    tool_override: Option<PathBuf>,
}

impl ToolLocator {
    pub fn new(tool_override: Option<PathBuf>) -> Self {
        Self { tool_override }
    }

    pub fn tool(&self) -> Option<PathBuf> {
        if let Some(path) = &self.tool_override {
            return path.is_file().then(|| path.clone());
        }
        search(TOOL_NAME, std::env::var_os("PATH"), TOOL_DIRS, |p| p.is_file())
    }

    pub fn brew(&self) -> Option<PathBuf> {
        search("brew", std::env::var_os("PATH"), BREW_DIRS, |p| p.is_file())
    }
}

/// Look `name` up on `PATH` first, then in each of `fallback_dirs`.
pub fn search(
    name: &str,
    path_var: Option<OsString>,
    fallback_dirs: &[&str],
    exists: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    let on_path = path_var
        .iter()
        .flat_map(|dirs| std::env::split_paths(dirs))
        .map(|dir| dir.join(name));
    let fallback = fallback_dirs.iter().map(|dir| Path::new(dir).join(name));
    on_path.chain(fallback).find(|candidate| exists(candidate))
}

/// Message for a machine without the tool.
pub fn missing_message(has_brew: bool) -> &'static str {
    if has_brew { TOOL_REQUIRED } else { HOMEBREW_REQUIRED }
}

pub struct Installer {
    locator: ToolLocator,
}

impl Installer {
    pub fn new(locator: ToolLocator) -> Self {
        Self { locator }
    }
}

async fn status(locator: ToolLocator) -> Result<DependencyStatus, BackendError> {
    let Some(tool) = locator.tool() else {
        return Ok(DependencyStatus {
            installed: false,
            message: missing_message(locator.brew().is_some()).to_string(),
        });
    };
    let output = Command::new(&tool)
        .arg("--version")
        .stderr(Stdio::null())
        .output()
        .await;
    let message = match output {
        Ok(out) if out.status.success() => {
            format!("{TOOL_NAME} {}", String::from_utf8_lossy(&out.stdout).trim())
        }
        _ => format!("{TOOL_NAME} installed at {}", tool.display()),
    };
    Ok(DependencyStatus {
        installed: true,
        message,
    })
}

async fn install(locator: ToolLocator) -> Result<(), BackendError> {
    if let Some(tool) = locator.tool() {
        debug!("{TOOL_NAME} already at {}", tool.display());
        return Ok(());
    }
    if !cfg!(target_os = "macos") {
        return Err(BackendError::Install(
            "automatic installation is only supported on macOS".to_string(),
        ));
    }
    let brew = locator.brew().ok_or_else(|| {
        BackendError::Install("Homebrew is not installed. Install it from https://brew.sh".to_string())
    })?;

    info!("running {} install {TOOL_NAME}", brew.display());
    let status = Command::new(&brew)
        .args(["install", TOOL_NAME])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| BackendError::Install(format!("error installing {TOOL_NAME}: {e}")))?;
    if !status.success() {
        return Err(BackendError::Install(format!(
            "error installing {TOOL_NAME}: {status}"
        )));
    }
    if locator.tool().is_none() {
        return Err(BackendError::Install(format!(
            "{TOOL_NAME} not found after installation"
        )));
    }
    Ok(())
}

impl Dependencies for Installer {
    fn check(&self) -> BoxFuture<'static, Result<DependencyStatus, BackendError>> {
        status(self.locator.clone()).boxed()
    }

    fn install(&self) -> BoxFuture<'static, Result<(), BackendError>> {
        install(self.locator.clone()).boxed()
    }
}
