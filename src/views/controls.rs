use iced::widget::{button, canvas, column, container, image as iced_image, row, space, stack, text};
use iced::{Alignment, Element, Event, Length, Point, Rectangle, Renderer, Theme, mouse, touch};

use crate::app::{Message, QuadcastApp};
use crate::color::{PRESETS, preset_name};

const PREVIEW_SIZE: f32 = 56.0;
const SWATCH_SIZE: f32 = 32.0;

impl QuadcastApp {
    pub(crate) fn view_controls(&self) -> Element<'_, Message> {
        let colors = &self.colors;
        let led_on = self.led_on();
        let display = self.wheel.display_color();

        let size = self.wheel.size() as f32;
        let preview = container(space::horizontal())
            .width(PREVIEW_SIZE)
            .height(PREVIEW_SIZE)
            .style(colors.dot_style(display.to_iced(), PREVIEW_SIZE));
        let wheel = stack![
            iced_image(self.wheel_image.clone()).width(size).height(size),
            container(preview).center(size),
            canvas(WheelInput { enabled: led_on }).width(size).height(size),
        ];

        let label = preset_name(display)
            .map(|name| format!("{name} {display}"))
            .unwrap_or_else(|| display.to_string());
        let readout = text(label).size(colors.label_text).color(colors.muted);

        let active = self.pipeline.color();
        let swatches = PRESETS.iter().fold(row![].spacing(6), |swatches, (_, color)| {
            let swatch = button(space::horizontal())
                .width(SWATCH_SIZE)
                .height(SWATCH_SIZE)
                .on_press_maybe(led_on.then_some(Message::PresetSelected(*color)))
                .style(colors.swatch_style(color.to_iced(), *color == active));
            swatches.push(swatch)
        });

        let power_label = if led_on { "Turn Off LED" } else { "Turn On LED" };
        let power = button(text(power_label).size(colors.body_text).center())
            .on_press(Message::PowerToggled)
            .width(Length::Fill)
            .padding([10, 16])
            .style(colors.button_style(!led_on));

        let footer = text(format!(
            "v{} ({})",
            env!("QUADCAST_RGB_VERSION"),
            env!("QUADCAST_RGB_COMMIT")
        ))
        .size(colors.info_text)
        .color(colors.muted);

        let picker = container(
            column![wheel, readout, swatches]
                .spacing(14)
                .align_x(Alignment::Center),
        )
        .padding(16)
        .center_x(Length::Fill)
        .style(colors.panel_style());

        column![picker, power, space::vertical(), footer]
            .spacing(12)
            .align_x(Alignment::Center)
            .height(Length::Fill)
            .into()
    }
}

/// Transparent layer over the wheel that reports where a press lands.
struct WheelInput {
    enabled: bool,
}

/// Whether a press that started on the wheel is still held.
#[derive(Debug, Default)]
pub(crate) struct Gesture {
    held: bool,
}

impl canvas::Program<Message> for WheelInput {
    type State = Gesture;

    fn update(
        &self,
        state: &mut Gesture,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        wheel_gesture(state, self.enabled, event, bounds, cursor)
            .map(|message| canvas::Action::publish(message).and_capture())
    }

    fn draw(
        &self,
        _state: &Gesture,
        _renderer: &Renderer,
        _theme: &Theme,
        _bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        Vec::new()
    }

    fn mouse_interaction(
        &self,
        _state: &Gesture,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if !cursor.is_over(bounds) {
            mouse::Interaction::default()
        } else if self.enabled {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::NotAllowed
        }
    }
}

/// Map a raw event to a wheel message, in wheel-local coordinates.
///
/// Presses only count inside `bounds`. Once held, moves and the matching
/// release are reported wherever they happen, and the pointer leaving the
/// window ends the gesture.
pub(crate) fn wheel_gesture(
    state: &mut Gesture,
    enabled: bool,
    event: &Event,
    bounds: Rectangle,
    cursor: mouse::Cursor,
) -> Option<Message> {
    let local = |p: Point| Point::new(p.x - bounds.x, p.y - bounds.y);
    match event {
        Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) if enabled => {
            let position = cursor.position_in(bounds)?;
            state.held = true;
            Some(Message::WheelPressed(position))
        }
        Event::Touch(touch::Event::FingerPressed { position, .. })
            if enabled && bounds.contains(*position) =>
        {
            state.held = true;
            Some(Message::WheelPressed(local(*position)))
        }
        Event::Mouse(mouse::Event::CursorMoved { position })
        | Event::Touch(touch::Event::FingerMoved { position, .. })
            if state.held =>
        {
            Some(Message::WheelMoved(local(*position)))
        }
        Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
        | Event::Mouse(mouse::Event::CursorLeft)
        | Event::Touch(touch::Event::FingerLifted { .. })
        | Event::Touch(touch::Event::FingerLost { .. })
            if state.held =>
        {
            state.held = false;
            Some(Message::PointerReleased)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use iced::Size;

    use super::*;

    fn bounds() -> Rectangle {
        Rectangle::new(Point::new(110.0, 40.0), Size::new(200.0, 200.0))
    }

    fn finger_down(x: f32, y: f32) -> Event {
        Event::Touch(touch::Event::FingerPressed {
            id: touch::Finger(1),
            position: Point::new(x, y),
        })
    }

    #[test]
    fn press_carries_the_local_position() {
        let mut state = Gesture::default();
        let cursor = mouse::Cursor::Available(Point::new(256.0, 140.0));
        let pressed = Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left));
        let message = wheel_gesture(&mut state, true, &pressed, bounds(), cursor);
        assert!(matches!(message, Some(Message::WheelPressed(p)) if p == Point::new(146.0, 100.0)));
    }

    #[test]
    fn touch_start_samples_its_own_position() {
        let mut state = Gesture::default();
        // the cursor still sits where the last gesture ended
        let stale = mouse::Cursor::Available(Point::new(256.0, 140.0));
        let message = wheel_gesture(&mut state, true, &finger_down(187.0, 100.0), bounds(), stale);
        assert!(matches!(message, Some(Message::WheelPressed(p)) if p == Point::new(77.0, 60.0)));
    }

    #[test]
    fn presses_outside_or_while_disabled_are_ignored() {
        let mut state = Gesture::default();
        let outside = mouse::Cursor::Available(Point::new(20.0, 20.0));
        let pressed = Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left));
        assert!(wheel_gesture(&mut state, true, &pressed, bounds(), outside).is_none());
        assert!(wheel_gesture(&mut state, true, &finger_down(5.0, 5.0), bounds(), outside).is_none());
        assert!(wheel_gesture(&mut state, false, &finger_down(200.0, 100.0), bounds(), outside).is_none());

        let moved = Event::Mouse(mouse::Event::CursorMoved {
            position: Point::new(200.0, 100.0),
        });
        assert!(wheel_gesture(&mut state, true, &moved, bounds(), outside).is_none());
    }

    #[test]
    fn held_gesture_follows_the_pointer_until_it_leaves_the_window() {
        let mut state = Gesture::default();
        let cursor = mouse::Cursor::Available(Point::new(200.0, 100.0));
        let pressed = Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left));
        wheel_gesture(&mut state, true, &pressed, bounds(), cursor);

        let moved = Event::Mouse(mouse::Event::CursorMoved {
            position: Point::new(400.0, 10.0),
        });
        let message = wheel_gesture(&mut state, true, &moved, bounds(), cursor);
        assert!(matches!(message, Some(Message::WheelMoved(p)) if p == Point::new(290.0, -30.0)));

        let left = Event::Mouse(mouse::Event::CursorLeft);
        let message = wheel_gesture(&mut state, true, &left, bounds(), mouse::Cursor::Unavailable);
        assert!(matches!(message, Some(Message::PointerReleased)));
        assert!(wheel_gesture(&mut state, true, &moved, bounds(), cursor).is_none());
    }
}
