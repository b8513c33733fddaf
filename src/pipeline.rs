use std::time::Duration;

use futures::future::{self, Either};
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::color::{DEFAULT_COLOR, Rgb};

pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(300);

/// Whether the LEDs are lit. Independent of the chosen color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPower {
    On,
    Off,
}

/// Identifies one scheduled persistence write. Only the newest is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket(u64);

/// External calls one color change turns into, in initiation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Bare `rrggbb` to persist, if anything needs writing.
    pub save: Option<String>,
    pub color: Rgb,
}

/// Turns chosen colors into device writes and settings writes.
///
/// Holds no I/O itself: callers run the returned [`Dispatch`] with [`execute`]
/// and own the timer behind a [`SaveTicket`].
#[derive(Debug)]
pub struct Propagation {
    color: Rgb,
    led: LedPower,
    last_saved: Option<String>,
    pending: Option<Rgb>,
    ticket: u64,
    scheduled: Option<SaveTicket>,
    delay: Duration,
}

impl Propagation {
    pub fn new(delay: Duration) -> Self {
        Self {
            color: DEFAULT_COLOR,
            led: LedPower::On,
            last_saved: None,
            pending: None,
            ticket: 0,
            scheduled: None,
            delay,
        }
    }

    /// The authoritative color: the last one sent to the device.
    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn led(&self) -> LedPower {
        self.led
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn has_scheduled_save(&self) -> bool {
        self.scheduled.is_some()
    }

    /// Direct path: save right away (when asked to and the value changed),
    /// then apply.
    pub fn apply(&mut self, color: Rgb, persist: bool) -> Dispatch {
        self.led = LedPower::On;
        self.color = color;
        let save = if persist {
            // a direct save supersedes whatever the drag path was going to write
            self.pending = None;
            self.scheduled = None;
            self.mark_saved(color)
        } else {
            None
        };
        Dispatch { save, color }
    }

    /// Drag path: apply right away, push the save out by the debounce delay.
    ///
    /// Every call replaces the previous ticket, so only the last one fires.
    pub fn apply_debounced(&mut self, color: Rgb) -> (Dispatch, SaveTicket) {
        self.led = LedPower::On;
        self.color = color;
        self.pending = Some(color);
        self.ticket += 1;
        let ticket = SaveTicket(self.ticket);
        self.scheduled = Some(ticket);
        (Dispatch { save: None, color }, ticket)
    }

    /// A debounce timer elapsed. Returns the value to write, read at fire
    /// time, or `None` when the ticket was superseded or nothing changed.
    pub fn fire(&mut self, ticket: SaveTicket) -> Option<String> {
        if self.scheduled != Some(ticket) {
            debug!("save ticket {} superseded", ticket.0);
            return None;
        }
        self.scheduled = None;
        let color = self.pending.take()?;
        self.mark_saved(color)
    }

    /// Record that the device acknowledged an off request.
    pub fn led_off(&mut self) {
        self.led = LedPower::Off;
    }

    fn mark_saved(&mut self, color: Rgb) -> Option<String> {
        let hex = color.to_bare_hex();
        if self.last_saved.as_deref() == Some(hex.as_str()) {
            return None;
        }
        self.last_saved = Some(hex.clone());
        Some(hex)
    }
}

/// Run a dispatch against the collaborators.
///
/// The save future is polled first, so it is always initiated before the
/// device write; neither waits on the other and failures are only logged.
pub async fn execute(backend: Backend, dispatch: Dispatch) {
    let Dispatch { save, color } = dispatch;
    let save = match save {
        Some(hex) => Either::Left(save_color(backend.clone(), hex)),
        None => Either::Right(future::ready(())),
    };
    let (r, g, b) = color.channels();
    let apply = async move {
        if let Err(err) = backend.device.set_color(r, g, b).await {
            warn!("failed to set color {color}: {err}");
        }
    };
    future::join(save, apply).await;
}

pub async fn save_color(backend: Backend, hex: String) {
    if let Err(err) = backend.settings.save_color(hex.clone()).await {
        warn!("failed to save color {hex}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::backend::fake::{Call, Fake};
    use crate::backend::{BackendError, Settings};
    use crate::session::{Operation, SessionController, SessionState};

    fn red() -> Rgb {
        Rgb::new(255, 0, 0)
    }

    #[test]
    fn direct_apply_saves_then_applies() {
        let fake = Fake::new();
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        let dispatch = pipeline.apply(Rgb::new(0, 0x66, 0xff), true);
        assert_eq!(dispatch.save.as_deref(), Some("0066ff"));

        block_on(execute(fake.backend(), dispatch));
        assert_eq!(
            fake.calls(),
            vec![Call::Save("0066ff".into()), Call::SetColor(0, 0x66, 0xff)]
        );
    }

    #[test]
    fn unchanged_color_is_not_saved_twice() {
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        assert!(pipeline.apply(red(), true).save.is_some());
        let again = pipeline.apply(red(), true);
        assert_eq!(again.save, None);
        assert_eq!(again.color, red());
    }

    #[test]
    fn suppressed_apply_never_saves() {
        let fake = Fake::new();
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        let dispatch = pipeline.apply(Rgb::new(0, 255, 0), false);
        assert_eq!(dispatch.save, None);
        block_on(execute(fake.backend(), dispatch));
        assert_eq!(fake.calls(), vec![Call::SetColor(0, 255, 0)]);
    }

    #[test]
    fn failures_do_not_stop_the_other_call() {
        let mut fake = Fake::new();
        fake.fail_saves = true;
        fake.fail_colors = true;
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        let dispatch = pipeline.apply(Rgb::new(1, 2, 3), true);
        block_on(execute(fake.backend(), dispatch));
        assert_eq!(fake.calls().len(), 2);
        // optimistic: the chosen color stands even though the device refused it
        assert_eq!(pipeline.color(), Rgb::new(1, 2, 3));
    }

    #[test]
    fn rapid_events_coalesce_into_one_write_of_the_last_color() {
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        let colors = [
            Rgb::new(10, 0, 0),
            Rgb::new(20, 0, 0),
            Rgb::new(30, 0, 0),
            Rgb::new(40, 0, 0),
            Rgb::new(50, 0, 0),
            Rgb::new(60, 0, 0),
        ];
        let tickets: Vec<_> = colors
            .iter()
            .map(|c| {
                let (dispatch, ticket) = pipeline.apply_debounced(*c);
                assert_eq!(dispatch.save, None);
                ticket
            })
            .collect();

        // even if superseded timers were to fire, only the newest one writes
        let writes: Vec<_> = tickets.into_iter().filter_map(|t| pipeline.fire(t)).collect();
        assert_eq!(writes, vec!["3c0000".to_string()]);
        assert!(!pipeline.has_scheduled_save());
    }

    #[test]
    fn write_reads_the_pending_color_at_fire_time() {
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        let (_, first) = pipeline.apply_debounced(Rgb::new(1, 1, 1));
        let (_, second) = pipeline.apply_debounced(Rgb::new(2, 2, 2));
        assert_eq!(pipeline.fire(first), None);
        assert_eq!(pipeline.fire(second).as_deref(), Some("020202"));
        assert_eq!(pipeline.fire(second), None);
    }

    #[test]
    fn direct_save_cancels_a_pending_drag_save() {
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        let (_, ticket) = pipeline.apply_debounced(Rgb::new(9, 9, 9));
        let preset = pipeline.apply(Rgb::new(0, 255, 255), true);
        assert_eq!(preset.save.as_deref(), Some("00ffff"));
        assert_eq!(pipeline.fire(ticket), None);
    }

    #[test]
    fn debounced_write_skips_the_value_already_saved() {
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        pipeline.apply(red(), true);
        let (_, ticket) = pipeline.apply_debounced(red());
        assert_eq!(pipeline.fire(ticket), None);
    }

    #[test]
    fn any_apply_turns_the_led_back_on() {
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        pipeline.led_off();
        assert_eq!(pipeline.led(), LedPower::Off);
        assert_eq!(pipeline.color(), DEFAULT_COLOR);
        pipeline.apply(pipeline.color(), true);
        assert_eq!(pipeline.led(), LedPower::On);
        pipeline.led_off();
        pipeline.apply_debounced(red());
        assert_eq!(pipeline.led(), LedPower::On);
    }

    /// Drives the session and the pipeline against fakes the way the app does,
    /// resolving each call synchronously.
    fn boot(fake: &Fake, pipeline: &mut Propagation) -> SessionController {
        let backend = fake.backend();
        let mut session = SessionController::new();
        let mut call = Some(session.start());
        while let Some(next) = call.take() {
            call = match next.operation {
                Operation::CheckDependencies => {
                    let result = block_on(backend.dependencies.check()).map_err(|e| e.to_string());
                    session.on_dependencies_checked(next.attempt, result)
                }
                Operation::InstallDependencies => {
                    let result = block_on(backend.dependencies.install()).map_err(|e| e.to_string());
                    session.on_install_finished(next.attempt, result)
                }
                Operation::Connect => {
                    let result = block_on(backend.device.connect()).map_err(|e| e.to_string());
                    session.on_connect_finished(next.attempt, result)
                }
                Operation::LoadPersistedColor => {
                    if let Ok(settings) = block_on(backend.settings.load())
                        && let Ok(color) = Rgb::parse_hex(&settings.last_color)
                    {
                        let dispatch = pipeline.apply(color, false);
                        block_on(execute(backend.clone(), dispatch));
                    }
                    None
                }
            };
        }
        session
    }

    #[test]
    fn startup_applies_the_stored_color_without_saving_it() {
        let mut fake = Fake::new();
        fake.settings = Ok(Settings {
            last_color: "00ff00".into(),
            ..Settings::default()
        });
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        let session = boot(&fake, &mut pipeline);

        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(
            fake.calls(),
            vec![Call::Check, Call::Connect, Call::Load, Call::SetColor(0, 255, 0)]
        );
        assert!(fake.saves().is_empty());
        assert_eq!(pipeline.color(), Rgb::new(0, 255, 0));
    }

    #[test]
    fn settings_failure_leaves_the_session_connected() {
        let mut fake = Fake::new();
        fake.settings = Err(BackendError::Settings("unreadable".into()));
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        let session = boot(&fake, &mut pipeline);
        assert_eq!(session.state(), SessionState::Connected);
        assert!(fake.colors().is_empty());
    }

    #[test]
    fn drag_across_five_colors_applies_five_and_saves_one() {
        let fake = Fake::new();
        let backend = fake.backend();
        let mut pipeline = Propagation::new(DEFAULT_SAVE_DELAY);
        let session = boot(&fake, &mut pipeline);
        assert!(session.controls_active());
        let before = fake.calls().len();

        let drag = [
            Rgb::new(255, 0, 0),
            Rgb::new(255, 128, 0),
            Rgb::new(255, 255, 0),
            Rgb::new(0, 255, 0),
            Rgb::new(0, 0, 255),
        ];
        let mut last = None;
        for color in drag {
            let (dispatch, ticket) = pipeline.apply_debounced(color);
            block_on(execute(backend.clone(), dispatch));
            last = Some(ticket);
        }
        if let Some(hex) = last.and_then(|t| pipeline.fire(t)) {
            block_on(save_color(backend.clone(), hex));
        }

        let calls = &fake.calls()[before..];
        let applied: Vec<_> = calls
            .iter()
            .filter(|c| matches!(c, Call::SetColor(..)))
            .collect();
        assert_eq!(applied.len(), 5);
        assert_eq!(fake.saves(), vec!["0000ff".to_string()]);
    }
}
