use image::{Rgba, RgbaImage};

use crate::color::{Rgb, hsl_to_unit_rgb};

/// Gap between the square surface edge and the usable disk.
pub const WHEEL_INSET: f32 = 8.0;

/// Lightness of the outer stop; the middle stop is the pure hue at 50%.
const RIM_LIGHTNESS: f32 = 0.3;

/// Opacity of the wheel while the LED is off.
const DIMMED_ALPHA: f32 = 0.3;

/// Something the wheel can read colors back from.
///
/// The interaction layer never recomputes colors analytically; it reads the
/// exact pixel the renderer produced so what the user sees is what gets sent.
pub trait FieldRaster {
    /// Edge length of the square raster in pixels.
    fn size(&self) -> u32;

    /// RGBA at an integer pixel, `None` outside the raster.
    fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]>;

    fn center(&self) -> f32 {
        self.size() as f32 / 2.0
    }

    /// Radius of the usable disk.
    fn radius(&self) -> f32 {
        (self.center() - WHEEL_INSET).max(0.0)
    }
}

/// The rendered hue/lightness disk.
pub struct WheelField {
    raster: RgbaImage,
}

impl WheelField {
    pub fn render(size: u32) -> Self {
        let center = size as f32 / 2.0;
        let radius = (center - WHEEL_INSET).max(0.0);
        let raster = RgbaImage::from_fn(size, size, |x, y| {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let distance = dx.hypot(dy);
            if radius <= 0.0 || distance > radius {
                return Rgba([0, 0, 0, 0]);
            }
            // 1-degree hue wedges, angle measured clockwise from +x in screen space
            let hue = dy.atan2(dx).to_degrees().rem_euclid(360.0).floor();
            let color = field_color(hue, distance / radius);
            Rgba([color.r, color.g, color.b, 255])
        });
        Self { raster }
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// Desaturated, translucent copy shown while input is disabled.
    pub fn dimmed(&self) -> RgbaImage {
        let mut out = self.raster.clone();
        for pixel in out.pixels_mut() {
            let [r, g, b, a] = pixel.0;
            let gray = Rgb::new(r, g, b).desaturate(1.0);
            let alpha = (f32::from(a) * DIMMED_ALPHA).round() as u8;
            *pixel = Rgba([gray.r, gray.g, gray.b, alpha]);
        }
        out
    }
}

impl FieldRaster for WheelField {
    fn size(&self) -> u32 {
        self.raster.width()
    }

    fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.raster.get_pixel_checked(x, y).map(|p| p.0)
    }
}

/// Three-stop radial blend along one hue ray: white at the center, the pure
/// hue halfway out, and a darkened hue at the rim. `t` is distance over radius.
pub fn field_color(hue: f32, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let white = [1.0, 1.0, 1.0];
    let pure = hsl_to_unit_rgb(hue, 1.0, 0.5);
    let rim = hsl_to_unit_rgb(hue, 1.0, RIM_LIGHTNESS);
    let (from, to, local) = if t <= 0.5 {
        (white, pure, t / 0.5)
    } else {
        (pure, rim, (t - 0.5) / 0.5)
    };
    let lerp = |i: usize| from[i] + (to[i] - from[i]) * local;
    Rgb::from_unit([lerp(0), lerp(1), lerp(2)])
}
