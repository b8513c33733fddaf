pub mod field;

use iced::Point;
use iced::widget::image::Handle;

use crate::color::Rgb;
use field::{FieldRaster, WheelField};

/// Whether a press-drag gesture is in progress on the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Idle,
    Dragging,
}

/// The disk-shaped color picker: raster, gesture state and the color it shows.
///
/// `display` is what the center preview renders. It follows the samples while
/// a drag is in progress and otherwise tracks the authoritative color passed
/// to [`ColorWheel::sync`].
pub struct ColorWheel<F: FieldRaster = WheelField> {
    field: F,
    mode: InteractionMode,
    display: Rgb,
    disabled: bool,
}

impl ColorWheel<WheelField> {
    pub fn new(size: u32, initial: Rgb) -> Self {
        Self::with_field(WheelField::render(size), initial)
    }

    pub fn image_handle(&self) -> Handle {
        let raster = if self.disabled {
            self.field.dimmed()
        } else {
            self.field.raster().clone()
        };
        let (width, height) = raster.dimensions();
        Handle::from_rgba(width, height, raster.into_raw())
    }
}

impl<F: FieldRaster> ColorWheel<F> {
    pub fn with_field(field: F, initial: Rgb) -> Self {
        Self {
            field,
            mode: InteractionMode::Idle,
            display: initial,
            disabled: false,
        }
    }

    pub fn size(&self) -> u32 {
        self.field.size()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn display_color(&self) -> Rgb {
        self.display
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Disabling drops any gesture in progress.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.mode = InteractionMode::Idle;
        }
    }

    /// Keep the preview on the authoritative color unless the user is dragging.
    pub fn sync(&mut self, authoritative: Rgb) {
        if self.mode == InteractionMode::Idle {
            self.display = authoritative;
        }
    }

    /// Pointer-down / touch-start at `position` (surface-local). Starts a drag
    /// and samples under the press itself.
    pub fn press(&mut self, position: Point) -> Option<Rgb> {
        if self.disabled {
            return None;
        }
        self.mode = InteractionMode::Dragging;
        self.accept(position)
    }

    /// Pointer or finger movement. Re-samples only while dragging.
    pub fn pointer_moved(&mut self, position: Point) -> Option<Rgb> {
        if self.disabled || self.mode != InteractionMode::Dragging {
            return None;
        }
        self.accept(position)
    }

    /// Pointer-up / touch-end anywhere in the window.
    pub fn release(&mut self) {
        self.mode = InteractionMode::Idle;
    }

    /// Read the color under `position` without touching any state.
    ///
    /// Rejects points outside the usable radius, outside the raster, and pixels
    /// that read back fully transparent or pure black (anti-aliased rim).
    pub fn sample(&self, position: Point) -> Option<Rgb> {
        let size = self.field.size() as f32;
        if position.x < 0.0 || position.y < 0.0 || position.x >= size || position.y >= size {
            return None;
        }
        let center = self.field.center();
        let distance = (position.x - center).hypot(position.y - center);
        if distance > self.field.radius() {
            return None;
        }
        let [r, g, b, a] = self
            .field
            .pixel(position.x.floor() as u32, position.y.floor() as u32)?;
        let color = Rgb::new(r, g, b);
        if a == 0 || color == Rgb::BLACK {
            return None;
        }
        Some(color)
    }

    fn accept(&mut self, position: Point) -> Option<Rgb> {
        let color = self.sample(position)?;
        self.display = color;
        Some(color)
    }
}
