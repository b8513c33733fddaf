use std::fmt;

use tracing::{info, warn};

use crate::backend::DependencyStatus;

/// Token in a dependency message that means the user has to install things by hand.
pub const MANUAL_INSTALL_MARKER: &str = "Homebrew";

/// Token identifying the command-line tool the device is driven through.
pub const TOOL_TOKEN: &str = "quadcastrgb";

/// Connection-failure text that unlocks the USB diagnostic dump.
pub const NOT_FOUND_MARKER: &str = "not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Checking,
    NeedsInstall,
    NeedsManualInstall,
    Connecting,
    Connected,
    Error,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Checking => "Checking...",
            SessionState::Connecting => "Connecting...",
            SessionState::Connected => "Connected",
            SessionState::Error => "Error",
            SessionState::NeedsInstall | SessionState::NeedsManualInstall => "Setup Required",
        }
    }

    /// Checking and Connecting show a spinner and pulse the status dot.
    pub fn is_busy(self) -> bool {
        matches!(self, SessionState::Checking | SessionState::Connecting)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Identifies one invocation of a collaborator. Results tagged with an older
/// attempt than the current one are stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt(u64);

/// A collaborator call the controller wants issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CheckDependencies,
    InstallDependencies,
    Connect,
    /// Fetch settings and apply the stored color without re-saving it.
    LoadPersistedColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub attempt: Attempt,
    pub operation: Operation,
}

/// How a failed connect is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectFailure {
    pub next: SessionState,
    pub diagnostic: bool,
}

impl ConnectFailure {
    /// The one place connection error text is interpreted.
    ///
    /// A message naming the tool means the environment needs setting up, so it
    /// routes to manual install; anything else is a hardware/transport error.
    /// The diagnostic dump is offered exactly when the text says "not found",
    /// regardless of routing.
    pub fn classify(message: &str) -> Self {
        let next = if message.contains(TOOL_TOKEN) {
            SessionState::NeedsManualInstall
        } else {
            SessionState::Error
        };
        Self {
            next,
            diagnostic: message.contains(NOT_FOUND_MARKER),
        }
    }
}

/// Readiness/connection state machine.
///
/// Only one state-altering call is in flight at a time: every new call bumps
/// the attempt counter and results for any other attempt are ignored.
pub struct SessionController {
    state: SessionState,
    attempt: u64,
    diagnostic_available: bool,
    /// Last message from the dependency check or a failing call, shown on setup screens.
    message: Option<String>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: SessionState::Checking,
            attempt: 0,
            diagnostic_available: false,
            message: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Color and power controls are live only while connected.
    pub fn controls_active(&self) -> bool {
        self.state == SessionState::Connected
    }

    pub fn diagnostic_available(&self) -> bool {
        self.diagnostic_available
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The attempt the in-flight call was issued with.
    pub fn attempt(&self) -> Attempt {
        Attempt(self.attempt)
    }

    /// (init) -> Checking.
    pub fn start(&mut self) -> Call {
        self.restart()
    }

    /// Error -> Checking. Full restart.
    pub fn retry(&mut self) -> Option<Call> {
        if self.state != SessionState::Error {
            return None;
        }
        Some(self.restart())
    }

    /// NeedsManualInstall -> Checking. Same reload semantics as a retry.
    pub fn confirm_manual_install(&mut self) -> Option<Call> {
        if self.state != SessionState::NeedsManualInstall {
            return None;
        }
        Some(self.restart())
    }

    /// NeedsInstall -> Checking, with the installer running.
    pub fn request_install(&mut self) -> Option<Call> {
        if self.state != SessionState::NeedsInstall {
            return None;
        }
        self.transition(SessionState::Checking);
        Some(self.issue(Operation::InstallDependencies))
    }

    pub fn on_dependencies_checked(
        &mut self,
        attempt: Attempt,
        result: Result<DependencyStatus, String>,
    ) -> Option<Call> {
        if !self.is_current(attempt, SessionState::Checking) {
            return None;
        }
        match result {
            Ok(status) if status.installed => {
                info!("dependencies ready: {}", status.message);
                self.message = Some(status.message);
                self.transition(SessionState::Connecting);
                Some(self.issue(Operation::Connect))
            }
            Ok(status) => {
                let next = if status.message.contains(MANUAL_INSTALL_MARKER) {
                    SessionState::NeedsManualInstall
                } else {
                    SessionState::NeedsInstall
                };
                self.message = Some(status.message);
                self.transition(next);
                None
            }
            Err(err) => {
                warn!("dependency check failed: {err}");
                self.message = Some(err);
                self.transition(SessionState::Error);
                None
            }
        }
    }

    pub fn on_install_finished(
        &mut self,
        attempt: Attempt,
        result: Result<(), String>,
    ) -> Option<Call> {
        if !self.is_current(attempt, SessionState::Checking) {
            return None;
        }
        match result {
            Ok(()) => {
                info!("dependencies installed, checking again");
                Some(self.issue(Operation::CheckDependencies))
            }
            Err(err) => {
                warn!("dependency install failed: {err}");
                self.message = Some(err);
                self.transition(SessionState::Error);
                None
            }
        }
    }

    pub fn on_connect_finished(
        &mut self,
        attempt: Attempt,
        result: Result<(), String>,
    ) -> Option<Call> {
        if !self.is_current(attempt, SessionState::Connecting) {
            return None;
        }
        match result {
            Ok(()) => {
                self.transition(SessionState::Connected);
                Some(self.issue(Operation::LoadPersistedColor))
            }
            Err(err) => {
                let failure = ConnectFailure::classify(&err);
                warn!("connect failed: {err}");
                self.diagnostic_available = failure.diagnostic;
                self.message = Some(err);
                self.transition(failure.next);
                None
            }
        }
    }

    /// Whether a settings result still belongs to the live connection.
    pub fn on_settings_loaded(&self, attempt: Attempt) -> bool {
        self.is_current(attempt, SessionState::Connected)
    }

    fn restart(&mut self) -> Call {
        self.diagnostic_available = false;
        self.message = None;
        self.transition(SessionState::Checking);
        self.issue(Operation::CheckDependencies)
    }

    fn issue(&mut self, operation: Operation) -> Call {
        self.attempt += 1;
        Call {
            attempt: Attempt(self.attempt),
            operation,
        }
    }

    fn is_current(&self, attempt: Attempt, expected: SessionState) -> bool {
        if attempt.0 != self.attempt || self.state != expected {
            warn!(
                "dropping stale result for attempt {} (current {}, state {})",
                attempt.0, self.attempt, self.state
            );
            return false;
        }
        true
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            info!("session {} -> {}", self.state, next);
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(installed: bool, message: &str) -> DependencyStatus {
        DependencyStatus {
            installed,
            message: message.to_string(),
        }
    }

    fn connected() -> SessionController {
        let mut session = SessionController::new();
        let check = session.start();
        let connect = session
            .on_dependencies_checked(check.attempt, Ok(status(true, "quadcastrgb 1.0")))
            .unwrap();
        session.on_connect_finished(connect.attempt, Ok(())).unwrap();
        session
    }

    #[test]
    fn installed_leads_to_connecting_then_connected() {
        let mut session = SessionController::new();
        let check = session.start();
        assert_eq!(check.operation, Operation::CheckDependencies);
        assert_eq!(session.state(), SessionState::Checking);

        let connect = session
            .on_dependencies_checked(check.attempt, Ok(status(true, "quadcastrgb 1.0")))
            .unwrap();
        assert_eq!(connect.operation, Operation::Connect);
        assert_eq!(session.state(), SessionState::Connecting);
        assert!(!session.controls_active());

        let load = session.on_connect_finished(connect.attempt, Ok(())).unwrap();
        assert_eq!(load.operation, Operation::LoadPersistedColor);
        assert_eq!(session.state(), SessionState::Connected);
        assert!(session.controls_active());
    }

    #[test]
    fn manual_install_marker_routes_to_manual_install() {
        let mut session = SessionController::new();
        let check = session.start();
        let next = session.on_dependencies_checked(
            check.attempt,
            Ok(status(false, "Homebrew installation required:\nbrew install quadcastrgb")),
        );
        assert_eq!(next, None);
        assert_eq!(session.state(), SessionState::NeedsManualInstall);
        assert!(session.message().unwrap().contains("Homebrew"));
    }

    #[test]
    fn missing_without_marker_needs_install() {
        let mut session = SessionController::new();
        let check = session.start();
        session.on_dependencies_checked(
            check.attempt,
            Ok(status(false, "quadcastrgb installation required")),
        );
        assert_eq!(session.state(), SessionState::NeedsInstall);
    }

    #[test]
    fn check_failure_is_an_error() {
        let mut session = SessionController::new();
        let check = session.start();
        session.on_dependencies_checked(check.attempt, Err("transport".into()));
        assert_eq!(session.state(), SessionState::Error);
        assert!(!session.diagnostic_available());
    }

    #[test]
    fn install_rechecks_on_success_and_errors_on_failure() {
        let mut session = SessionController::new();
        let check = session.start();
        session.on_dependencies_checked(check.attempt, Ok(status(false, "brew install it")));

        let install = session.request_install().unwrap();
        assert_eq!(install.operation, Operation::InstallDependencies);
        assert_eq!(session.state(), SessionState::Checking);
        let recheck = session.on_install_finished(install.attempt, Ok(())).unwrap();
        assert_eq!(recheck.operation, Operation::CheckDependencies);

        session.on_dependencies_checked(recheck.attempt, Ok(status(false, "brew install it")));
        let install = session.request_install().unwrap();
        assert_eq!(session.on_install_finished(install.attempt, Err("brew exploded".into())), None);
        assert_eq!(session.state(), SessionState::Error);
    }

    #[test]
    fn install_only_from_needs_install() {
        let mut session = SessionController::new();
        session.start();
        assert_eq!(session.request_install(), None);
        assert_eq!(session.confirm_manual_install(), None);
        assert_eq!(session.retry(), None);
        assert_eq!(session.state(), SessionState::Checking);
    }

    #[test]
    fn diagnostic_only_when_not_found() {
        for (message, diagnostic) in [
            ("QuadCast device not found", true),
            ("device busy", false),
            ("platform plan9 is not supported", false),
            ("Not Found", false),
        ] {
            let mut session = SessionController::new();
            let check = session.start();
            let connect = session
                .on_dependencies_checked(check.attempt, Ok(status(true, "ok")))
                .unwrap();
            session.on_connect_finished(connect.attempt, Err(message.to_string()));
            assert_eq!(session.state(), SessionState::Error, "{message}");
            assert_eq!(session.diagnostic_available(), diagnostic, "{message}");
        }
    }

    #[test]
    fn tool_errors_route_to_manual_install() {
        let failure = ConnectFailure::classify("quadcastrgb utility not found. Install it");
        assert_eq!(failure.next, SessionState::NeedsManualInstall);
        assert!(failure.diagnostic);

        let failure = ConnectFailure::classify("quadcastrgb crashed");
        assert_eq!(failure.next, SessionState::NeedsManualInstall);
        assert!(!failure.diagnostic);

        let failure = ConnectFailure::classify("QuadCast device not found");
        assert_eq!(failure.next, SessionState::Error);
        assert!(failure.diagnostic);
    }

    #[test]
    fn retry_restarts_and_clears_the_diagnostic() {
        let mut session = SessionController::new();
        let check = session.start();
        let connect = session
            .on_dependencies_checked(check.attempt, Ok(status(true, "ok")))
            .unwrap();
        session.on_connect_finished(connect.attempt, Err("device not found".into()));
        assert!(session.diagnostic_available());

        let call = session.retry().unwrap();
        assert_eq!(call.operation, Operation::CheckDependencies);
        assert_eq!(session.state(), SessionState::Checking);
        assert!(!session.diagnostic_available());
        assert_eq!(session.message(), None);
    }

    #[test]
    fn confirm_manual_install_restarts() {
        let mut session = SessionController::new();
        let check = session.start();
        session.on_dependencies_checked(check.attempt, Ok(status(false, "Homebrew missing")));
        let call = session.confirm_manual_install().unwrap();
        assert_eq!(call.operation, Operation::CheckDependencies);
        assert_eq!(session.state(), SessionState::Checking);
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut session = SessionController::new();
        let first = session.start();
        session.on_dependencies_checked(first.attempt, Err("boom".into()));
        let second = session.retry().unwrap();

        // the superseded check finishing late changes nothing
        assert_eq!(
            session.on_dependencies_checked(first.attempt, Ok(status(true, "late"))),
            None
        );
        assert_eq!(session.state(), SessionState::Checking);

        let connect = session
            .on_dependencies_checked(second.attempt, Ok(status(true, "ok")))
            .unwrap();
        // a check result can't be applied while connecting
        assert_eq!(
            session.on_dependencies_checked(connect.attempt, Ok(status(true, "ok"))),
            None
        );
        assert_eq!(session.state(), SessionState::Connecting);
    }

    #[test]
    fn settings_are_accepted_only_for_the_load_call() {
        let mut session = SessionController::new();
        let check = session.start();
        let connect = session
            .on_dependencies_checked(check.attempt, Ok(status(true, "ok")))
            .unwrap();
        // connect's own attempt is not the load
        assert!(!session.on_settings_loaded(connect.attempt));
        let load = session.on_connect_finished(connect.attempt, Ok(())).unwrap();
        assert_eq!(session.attempt(), load.attempt);
        assert!(session.on_settings_loaded(load.attempt));

        let mut failed = SessionController::new();
        let check = failed.start();
        failed.on_dependencies_checked(check.attempt, Err("boom".into()));
        assert!(!failed.on_settings_loaded(failed.attempt()));
    }

    #[test]
    fn connected_is_stable() {
        let mut session = connected();
        assert_eq!(session.retry(), None);
        assert_eq!(session.request_install(), None);
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn exactly_one_state_and_labels() {
        let session = SessionController::new();
        assert_eq!(session.state(), SessionState::Checking);
        assert!(SessionState::Checking.is_busy());
        assert!(!SessionState::Connected.is_busy());
        assert_eq!(SessionState::NeedsManualInstall.label(), "Setup Required");
    }
}
