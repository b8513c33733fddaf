use iced::widget::{button, column, container, row, space, text};
use iced::{Alignment, Element, Length};

use crate::app::{self, Message, QuadcastApp};
use crate::session::SessionState;

const SPINNER: &[&str] = &["◐", "◓", "◑", "◒"];

impl QuadcastApp {
    pub(crate) fn view_title_bar(&self) -> Element<'_, Message> {
        let colors = &self.colors;
        let state = self.session.state();

        let mut dot_color = colors.status_color(state);
        if state.is_busy() {
            dot_color = app::pulse(dot_color, self.spinner_frame);
        }
        let dot = container(space::horizontal())
            .width(10)
            .height(10)
            .style(colors.dot_style(dot_color, 10.0));

        let title = text("QuadCast RGB").size(colors.title_text).color(colors.text);
        let status = text(state.label()).size(colors.label_text).color(colors.muted);

        row![title, space::horizontal(), dot, status]
            .spacing(8)
            .align_y(Alignment::Center)
            .into()
    }

    pub(crate) fn view_busy(&self) -> Element<'_, Message> {
        let colors = &self.colors;
        let frame = SPINNER[self.spinner_frame % SPINNER.len()];
        let label = match self.session.state() {
            SessionState::Connecting => "Connecting to the microphone...",
            _ => "Checking dependencies...",
        };
        centered(
            column![
                text(frame).size(colors.title_text * 2.0).color(colors.busy),
                text(label).size(colors.body_text).color(colors.muted),
            ]
            .spacing(12)
            .align_x(Alignment::Center),
        )
    }

    pub(crate) fn view_setup(&self) -> Element<'_, Message> {
        let colors = &self.colors;
        let manual = self.session.state() == SessionState::NeedsManualInstall;

        let heading = text("Setup Required").size(colors.title_text).color(colors.setup);
        let mut content = column![heading].spacing(12).align_x(Alignment::Center);

        if let Some(message) = self.session.message() {
            content = content.push(
                container(text(message).size(colors.label_text).color(colors.text))
                    .padding(12)
                    .width(Length::Fill)
                    .style(colors.panel_style()),
            );
        }

        let action = if manual {
            button(text("I've Installed Dependencies").size(colors.body_text))
                .on_press(Message::ManualInstallConfirmed)
        } else {
            button(text("Install Dependencies").size(colors.body_text))
                .on_press(Message::InstallRequested)
        };
        content = content.push(action.padding([8, 16]).style(colors.button_style(true)));

        if self.diagnostic_button_visible() {
            content = content.push(self.debug_button());
        }

        centered(content)
    }

    pub(crate) fn view_error(&self) -> Element<'_, Message> {
        let colors = &self.colors;

        let heading = text("Device Not Found").size(colors.title_text).color(colors.error);
        let explanation = text(
            "Make sure your QuadCast is plugged in over USB and turned on, then try again.",
        )
        .size(colors.body_text)
        .color(colors.muted)
        .center();

        let mut content = column![heading, explanation]
            .spacing(12)
            .align_x(Alignment::Center);

        if let Some(message) = self.session.message() {
            content = content.push(text(message).size(colors.label_text).color(colors.muted));
        }

        let retry = button(text("Retry").size(colors.body_text))
            .on_press(Message::Retry)
            .padding([8, 16])
            .style(colors.button_style(true));
        let mut actions = row![retry].spacing(8);
        if self.diagnostic_button_visible() {
            actions = actions.push(self.debug_button());
        }

        centered(content.push(actions))
    }

    fn diagnostic_button_visible(&self) -> bool {
        self.session.diagnostic_available()
    }

    fn debug_button(&self) -> Element<'_, Message> {
        button(text("Debug").size(self.colors.body_text))
            .on_press(Message::OpenDebug)
            .padding([8, 16])
            .style(self.colors.button_style(false))
            .into()
    }
}

fn centered<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
