use iced::widget::{button, column, container, row, scrollable, space, text};
use iced::{Element, Font, Length};

use crate::app::{Message, QuadcastApp};

impl QuadcastApp {
    /// USB listing over a dimmed backdrop. `None` while it is still loading.
    pub(crate) fn view_debug_modal<'a>(&'a self, listing: Option<&'a str>) -> Element<'a, Message> {
        let colors = &self.colors;

        let title = text("USB Devices").size(colors.title_text).color(colors.text);
        let close = button(text("Close").size(colors.label_text))
            .on_press(Message::CloseDebug)
            .style(colors.button_style(false));

        let body: Element<'_, Message> = match listing {
            Some(listing) => scrollable(
                text(listing)
                    .size(colors.info_text)
                    .font(Font::MONOSPACE)
                    .color(colors.text),
            )
            .height(Length::Fill)
            .into(),
            None => text("Loading...").size(colors.body_text).color(colors.muted).into(),
        };

        let panel = container(
            column![row![title, space::horizontal(), close], body]
                .spacing(12)
                .height(Length::Fill),
        )
        .padding(16)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(colors.panel_style());

        container(panel)
            .padding(24)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(colors.backdrop_style())
            .into()
    }
}
