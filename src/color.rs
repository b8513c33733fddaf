use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// An 8-bit-per-channel color as sent to the microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    #[error("expected 6 hex digits, got {0:?}")]
    Length(String),
    #[error("invalid hex digits in {0:?}")]
    Digits(String),
}

/// Color the UI starts from before anything was loaded.
pub const DEFAULT_COLOR: Rgb = Rgb::new(0xff, 0x00, 0x00);

/// Quick-color presets shown under the wheel.
pub const PRESETS: &[(&str, Rgb)] = &[
    ("Red", Rgb::new(0xff, 0x00, 0x00)),
    ("Orange", Rgb::new(0xff, 0x6b, 0x00)),
    ("Yellow", Rgb::new(0xff, 0xd0, 0x00)),
    ("Green", Rgb::new(0x00, 0xff, 0x00)),
    ("Cyan", Rgb::new(0x00, 0xff, 0xff)),
    ("Blue", Rgb::new(0x00, 0x66, 0xff)),
    ("Purple", Rgb::new(0x8b, 0x00, 0xff)),
    ("Magenta", Rgb::new(0xff, 0x00, 0xff)),
    ("White", Rgb::new(0xff, 0xff, 0xff)),
];

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse either the display form (`#rrggbb`) or the bare persisted form (`rrggbb`).
    pub fn parse_hex(input: &str) -> Result<Self, ParseColorError> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ParseColorError::Length(input.to_string()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError::Digits(input.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ParseColorError::Digits(input.to_string()))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Canonical display form, `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{}", self.to_bare_hex())
    }

    /// Persisted form, `rrggbb` without the marker.
    pub fn to_bare_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn channels(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Build a color from 0.0..=1.0 components, rounding to the nearest step.
    pub fn from_unit(components: [f32; 3]) -> Self {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(
            quantize(components[0]),
            quantize(components[1]),
            quantize(components[2]),
        )
    }

    pub fn to_unit(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }

    pub fn to_iced(self) -> iced::Color {
        iced::Color::from_rgb8(self.r, self.g, self.b)
    }

    /// Same color with every channel pulled toward its luma; `amount` 1.0 is full gray.
    pub fn desaturate(self, amount: f32) -> Self {
        let [r, g, b] = self.to_unit();
        let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        let amount = amount.clamp(0.0, 1.0);
        let mix = |c: f32| c * (1.0 - amount) + luma * amount;
        Self::from_unit([mix(r), mix(g), mix(b)])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

/// CSS `hsl()` to unit RGB. `hue` in degrees, `saturation` and `lightness` in 0.0..=1.0.
pub fn hsl_to_unit_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let m = lightness - chroma / 2.0;
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    [r + m, g + m, b + m]
}

/// Look up the preset name for a color, if it is one of the quick colors.
pub fn preset_name(color: Rgb) -> Option<&'static str> {
    PRESETS
        .iter()
        .find(|(_, preset)| *preset == color)
        .map(|(name, _)| *name)
}
