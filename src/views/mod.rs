mod controls;
mod debug;
mod status;

use iced::widget::{column, container, opaque, stack};
use iced::{Element, Length};

use crate::app::{Message, QuadcastApp};
use crate::session::SessionState;

impl QuadcastApp {
    pub(crate) fn view_window(&self) -> Element<'_, Message> {
        let body = match self.session.state() {
            SessionState::Checking | SessionState::Connecting => self.view_busy(),
            SessionState::NeedsInstall | SessionState::NeedsManualInstall => self.view_setup(),
            SessionState::Error => self.view_error(),
            SessionState::Connected => self.view_controls(),
        };

        let window = container(
            column![self.view_title_bar(), body]
                .spacing(12)
                .height(Length::Fill),
        )
        .padding(16)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(self.colors.window_style());

        match &self.debug {
            Some(listing) => stack![window, opaque(self.view_debug_modal(listing.as_deref()))].into(),
            None => window.into(),
        }
    }
}
