use std::time::Duration;

use iced::widget::image::Handle;
use iced::{Color, Element, Event, Point, Size, Subscription, Task, event, mouse, touch};
use tracing::{debug, info, warn};

use crate::backend::{Backend, DependencyStatus, Settings};
use crate::color::{DEFAULT_COLOR, Rgb};
use crate::config::AppConfig;
use crate::pipeline::{self, Dispatch, LedPower, Propagation, SaveTicket};
use crate::session::{Attempt, Call, Operation, SessionController};
use crate::theme::ThemeColors;
use crate::wheel::ColorWheel;

const TICK_MS: u64 = 120;
const WINDOW_SIZE: Size = Size::new(420.0, 640.0);

pub(crate) struct QuadcastApp {
    pub(crate) config: AppConfig,
    pub(crate) backend: Backend,
    pub(crate) colors: ThemeColors,
    pub(crate) session: SessionController,
    pub(crate) wheel: ColorWheel,
    /// Raster currently shown for the wheel; swapped when it is enabled or disabled.
    pub(crate) wheel_image: Handle,
    pub(crate) pipeline: Propagation,
    /// Pending debounced save. Replacing or dropping it aborts the timer.
    save_timer: Option<iced::task::Handle>,
    /// Open debug modal; `None` content while the listing is loading.
    pub(crate) debug: Option<Option<String>>,
    pub(crate) spinner_frame: usize,
}

#[derive(Debug, Clone)]
pub(crate) enum Message {
    DependenciesChecked(Attempt, Result<DependencyStatus, String>),
    InstallRequested,
    InstallFinished(Attempt, Result<(), String>),
    ConnectFinished(Attempt, Result<(), String>),
    SettingsLoaded(Attempt, Result<Settings, String>),
    Retry,
    ManualInstallConfirmed,
    /// Press on the wheel, in wheel-local coordinates.
    WheelPressed(Point),
    WheelMoved(Point),
    PointerReleased,
    PresetSelected(Rgb),
    PowerToggled,
    LedOffFinished(Result<(), String>),
    SaveDue(SaveTicket),
    Dispatched,
    OpenDebug,
    DebugLoaded(String),
    CloseDebug,
    Tick,
}

pub(crate) fn run(config: AppConfig, backend: Backend) -> iced::Result {
    info!(
        "quadcast-rgb v{} ({}) starting",
        env!("QUADCAST_RGB_VERSION"),
        env!("QUADCAST_RGB_COMMIT")
    );

    iced::application(
        move || QuadcastApp::new(config.clone(), backend.clone()),
        QuadcastApp::update,
        QuadcastApp::view,
    )
    .title("QuadCast RGB")
    .window_size(WINDOW_SIZE)
    .resizable(false)
    .style(QuadcastApp::style)
    .subscription(QuadcastApp::subscription)
    .run()
}

impl QuadcastApp {
    pub(crate) fn new(config: AppConfig, backend: Backend) -> (Self, Task<Message>) {
        let wheel = ColorWheel::new(config.wheel_size, DEFAULT_COLOR);
        let wheel_image = wheel.image_handle();
        let mut app = Self {
            pipeline: Propagation::new(config.save_delay),
            config,
            backend,
            colors: ThemeColors::dark(),
            session: SessionController::new(),
            wheel,
            wheel_image,
            save_timer: None,
            debug: None,
            spinner_frame: 0,
        };
        let call = app.session.start();
        let task = app.run_call(call);
        (app, task)
    }

    pub(crate) fn led_on(&self) -> bool {
        self.pipeline.led() == LedPower::On
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            Message::DependenciesChecked(attempt, result) => {
                let call = self.session.on_dependencies_checked(attempt, result);
                self.run_calls(call)
            }
            Message::InstallRequested => {
                let call = self.session.request_install();
                self.run_calls(call)
            }
            Message::InstallFinished(attempt, result) => {
                let call = self.session.on_install_finished(attempt, result);
                self.run_calls(call)
            }
            Message::ConnectFinished(attempt, result) => {
                let call = self.session.on_connect_finished(attempt, result);
                self.run_calls(call)
            }
            Message::SettingsLoaded(attempt, result) => self.apply_loaded(attempt, result),
            Message::Retry => {
                let call = self.session.retry();
                if call.is_some() {
                    self.reset();
                }
                self.run_calls(call)
            }
            Message::ManualInstallConfirmed => {
                let call = self.session.confirm_manual_install();
                if call.is_some() {
                    self.reset();
                }
                self.run_calls(call)
            }
            Message::WheelPressed(position) => {
                if !self.session.controls_active() {
                    return Task::none();
                }
                match self.wheel.press(position) {
                    Some(color) => self.propagate_drag(color),
                    None => Task::none(),
                }
            }
            Message::WheelMoved(position) => {
                if !self.session.controls_active() {
                    return Task::none();
                }
                match self.wheel.pointer_moved(position) {
                    Some(color) => self.propagate_drag(color),
                    None => Task::none(),
                }
            }
            Message::PointerReleased => {
                self.wheel.release();
                Task::none()
            }
            Message::PresetSelected(color) => {
                if !self.session.controls_active() || !self.led_on() {
                    return Task::none();
                }
                self.apply_now(color, true)
            }
            Message::PowerToggled => {
                if !self.session.controls_active() {
                    return Task::none();
                }
                if self.led_on() {
                    Task::perform(self.backend.device.off(), |result| {
                        Message::LedOffFinished(result.map_err(|e| e.to_string()))
                    })
                } else {
                    self.apply_now(self.pipeline.color(), true)
                }
            }
            Message::LedOffFinished(result) => {
                match result {
                    Ok(()) => {
                        info!("led off");
                        self.pipeline.led_off();
                    }
                    Err(err) => warn!("failed to turn the led off: {err}"),
                }
                Task::none()
            }
            Message::SaveDue(ticket) => {
                match self.pipeline.fire(ticket) {
                    Some(hex) => {
                        debug!("debounced save of {hex}");
                        Task::perform(pipeline::save_color(self.backend.clone(), hex), |()| {
                            Message::Dispatched
                        })
                    }
                    None => Task::none(),
                }
            }
            Message::Dispatched => Task::none(),
            Message::OpenDebug => {
                if !self.session.diagnostic_available() {
                    return Task::none();
                }
                self.debug = Some(None);
                Task::perform(self.backend.device.usb_devices(), |result| {
                    Message::DebugLoaded(result.unwrap_or_else(|e| e.to_string()))
                })
            }
            Message::DebugLoaded(listing) => {
                // dismissed before the listing arrived
                if self.debug.is_some() {
                    self.debug = Some(Some(listing));
                }
                Task::none()
            }
            Message::CloseDebug => {
                self.debug = None;
                Task::none()
            }
            Message::Tick => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                Task::none()
            }
        };
        self.sync_wheel();
        task
    }

    fn run_calls(&mut self, call: Option<Call>) -> Task<Message> {
        match call {
            Some(call) => self.run_call(call),
            None => Task::none(),
        }
    }

    fn run_call(&mut self, call: Call) -> Task<Message> {
        let attempt = call.attempt;
        let backend = &self.backend;
        match call.operation {
            Operation::CheckDependencies => {
                Task::perform(backend.dependencies.check(), move |result| {
                    Message::DependenciesChecked(attempt, result.map_err(|e| e.to_string()))
                })
            }
            Operation::InstallDependencies => {
                Task::perform(backend.dependencies.install(), move |result| {
                    Message::InstallFinished(attempt, result.map_err(|e| e.to_string()))
                })
            }
            Operation::Connect => Task::perform(backend.device.connect(), move |result| {
                Message::ConnectFinished(attempt, result.map_err(|e| e.to_string()))
            }),
            Operation::LoadPersistedColor => {
                Task::perform(backend.settings.load(), move |result| {
                    Message::SettingsLoaded(attempt, result.map_err(|e| e.to_string()))
                })
            }
        }
    }

    /// Apply the stored color without writing it back.
    fn apply_loaded(&mut self, attempt: Attempt, result: Result<Settings, String>) -> Task<Message> {
        if !self.session.on_settings_loaded(attempt) {
            return Task::none();
        }
        let settings = match result {
            Ok(settings) => settings,
            Err(err) => {
                warn!("failed to load settings: {err}");
                return Task::none();
            }
        };
        if settings.last_color.is_empty() {
            return Task::none();
        }
        match Rgb::parse_hex(&settings.last_color) {
            Ok(color) => {
                info!("restoring saved color {color}");
                self.apply_now(color, false)
            }
            Err(err) => {
                warn!("ignoring saved color: {err}");
                Task::none()
            }
        }
    }

    fn apply_now(&mut self, color: Rgb, persist: bool) -> Task<Message> {
        let dispatch = self.pipeline.apply(color, persist);
        if persist {
            self.save_timer = None;
        }
        self.dispatch(dispatch)
    }

    fn propagate_drag(&mut self, color: Rgb) -> Task<Message> {
        let (dispatch, ticket) = self.pipeline.apply_debounced(color);
        let delay = self.pipeline.delay();
        let (timer, handle) = Task::future(async move {
            tokio::time::sleep(delay).await;
            Message::SaveDue(ticket)
        })
        .abortable();
        self.save_timer = Some(handle.abort_on_drop());
        Task::batch([self.dispatch(dispatch), timer])
    }

    fn dispatch(&self, dispatch: Dispatch) -> Task<Message> {
        Task::perform(pipeline::execute(self.backend.clone(), dispatch), |()| {
            Message::Dispatched
        })
    }

    /// Keep the wheel's preview and enabled state in line with the pipeline.
    fn sync_wheel(&mut self) {
        let disabled = !self.led_on();
        if disabled != self.wheel.is_disabled() {
            self.wheel.set_disabled(disabled);
            self.wheel_image = self.wheel.image_handle();
        }
        self.wheel.sync(self.pipeline.color());
    }

    /// Back to a freshly started window.
    fn reset(&mut self) {
        info!("restarting");
        self.pipeline = Propagation::new(self.config.save_delay);
        self.save_timer = None;
        self.debug = None;
        self.wheel.release();
    }

    fn view(&self) -> Element<'_, Message> {
        self.view_window()
    }

    fn subscription(state: &Self) -> Subscription<Message> {
        let mut subs = Vec::new();

        if state.session.state().is_busy() {
            subs.push(iced::time::every(Duration::from_millis(TICK_MS)).map(|_| Message::Tick));
        }

        // a drag ends wherever the pointer is released or when it leaves the window
        if state.wheel.mode() == crate::wheel::InteractionMode::Dragging {
            subs.push(event::listen_with(release_events));
        }

        Subscription::batch(subs)
    }

    fn style(&self, _theme: &iced::Theme) -> iced::theme::Style {
        iced::theme::Style {
            background_color: self.colors.window_bg,
            text_color: self.colors.text,
        }
    }
}

fn release_events(
    event: Event,
    _status: event::Status,
    _window: iced::window::Id,
) -> Option<Message> {
    match event {
        Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
        | Event::Mouse(mouse::Event::CursorLeft)
        | Event::Touch(touch::Event::FingerLifted { .. })
        | Event::Touch(touch::Event::FingerLost { .. }) => Some(Message::PointerReleased),
        _ => None,
    }
}

/// Blend used for the pulsing status dot while busy.
pub(crate) fn pulse(color: Color, frame: usize) -> Color {
    const STEPS: [f32; 6] = [1.0, 0.8, 0.55, 0.4, 0.55, 0.8];
    Color {
        a: STEPS[frame % STEPS.len()],
        ..color
    }
}
