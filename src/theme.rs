use iced::widget::{button, container};
use iced::{Background, Border, Color};

use crate::session::SessionState;

/// All colors and font sizes used by the window.
pub struct ThemeColors {
    // Text
    pub text: Color,
    pub muted: Color,
    pub error: Color,
    // Backgrounds
    pub window_bg: Color,
    pub panel_bg: Color,
    pub button_bg: Color,
    pub button_hover: Color,
    pub primary: Color,
    pub primary_hover: Color,
    pub modal_backdrop: Color,
    // Status indicator
    pub busy: Color,
    pub connected: Color,
    pub setup: Color,
    // Font sizes (logical pixels)
    pub title_text: f32,
    pub body_text: f32,
    pub label_text: f32,
    /// Version line and debug dump
    pub info_text: f32,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            text: Color::from_rgb(0.93, 0.93, 0.95),
            muted: Color {
                r: 1.0,
                g: 1.0,
                b: 1.0,
                a: 0.5,
            },
            error: Color::from_rgb(0.94, 0.27, 0.27),
            window_bg: Color::from_rgb(0.07, 0.07, 0.09),
            panel_bg: Color::from_rgb(0.11, 0.11, 0.14),
            button_bg: Color::from_rgb(0.17, 0.17, 0.21),
            button_hover: Color::from_rgb(0.23, 0.23, 0.28),
            primary: Color::from_rgb(0.23, 0.51, 0.96),
            primary_hover: Color::from_rgb(0.15, 0.39, 0.92),
            modal_backdrop: Color {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: 0.7,
            },
            busy: Color::from_rgb(0.23, 0.51, 0.96),
            connected: Color::from_rgb(0.13, 0.77, 0.37),
            setup: Color::from_rgb(0.96, 0.62, 0.04),
            title_text: 16.0,
            body_text: 14.0,
            label_text: 12.0,
            info_text: 10.0,
        }
    }

    /// Dot color next to the status label.
    pub fn status_color(&self, state: SessionState) -> Color {
        match state {
            SessionState::Checking | SessionState::Connecting => self.busy,
            SessionState::Connected => self.connected,
            SessionState::Error => self.error,
            SessionState::NeedsInstall | SessionState::NeedsManualInstall => self.setup,
        }
    }

    pub fn window_style(&self) -> impl Fn(&iced::Theme) -> container::Style {
        let color = self.window_bg;
        move |_theme: &iced::Theme| container::Style {
            background: Some(Background::Color(color)),
            ..Default::default()
        }
    }

    pub fn panel_style(&self) -> impl Fn(&iced::Theme) -> container::Style {
        let color = self.panel_bg;
        move |_theme: &iced::Theme| container::Style {
            background: Some(Background::Color(color)),
            border: Border {
                radius: 10.0.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn backdrop_style(&self) -> impl Fn(&iced::Theme) -> container::Style {
        let color = self.modal_backdrop;
        move |_theme: &iced::Theme| container::Style {
            background: Some(Background::Color(color)),
            ..Default::default()
        }
    }

    /// Round swatch: the center preview and the status dot.
    pub fn dot_style(
        &self,
        fill: Color,
        diameter: f32,
    ) -> impl Fn(&iced::Theme) -> container::Style {
        let ring = self.muted;
        move |_theme: &iced::Theme| container::Style {
            background: Some(Background::Color(fill)),
            border: Border {
                radius: (diameter / 2.0).into(),
                width: if diameter > 20.0 { 3.0 } else { 0.0 },
                color: ring,
            },
            ..Default::default()
        }
    }

    /// Preset swatch, ringed when it is the active color, faded when disabled.
    pub fn swatch_style(
        &self,
        fill: Color,
        active: bool,
    ) -> impl Fn(&iced::Theme, button::Status) -> button::Style {
        let ring = self.text;
        move |_theme: &iced::Theme, status: button::Status| {
            let alpha = match status {
                button::Status::Disabled => 0.3,
                _ => 1.0,
            };
            let width = match (active, status) {
                (true, _) => 3.0,
                (false, button::Status::Hovered) => 1.0,
                _ => 0.0,
            };
            button::Style {
                background: Some(Background::Color(Color { a: alpha, ..fill })),
                border: Border {
                    radius: 6.0.into(),
                    width,
                    color: ring,
                },
                ..Default::default()
            }
        }
    }

    pub fn button_style(
        &self,
        primary: bool,
    ) -> impl Fn(&iced::Theme, button::Status) -> button::Style {
        let (base, hover) = if primary {
            (self.primary, self.primary_hover)
        } else {
            (self.button_bg, self.button_hover)
        };
        let text = self.text;
        move |_theme: &iced::Theme, status: button::Status| {
            let background = match status {
                button::Status::Hovered | button::Status::Pressed => hover,
                button::Status::Disabled => Color { a: 0.4, ..base },
                button::Status::Active => base,
            };
            button::Style {
                background: Some(Background::Color(background)),
                text_color: text,
                border: Border {
                    radius: 8.0.into(),
                    ..Default::default()
                },
                ..Default::default()
            }
        }
    }
}
