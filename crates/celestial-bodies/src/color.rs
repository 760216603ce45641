//! Star color ramps: linear RGB values and the four-stop [`ColorProfile`].

use std::str::FromStr;

use thiserror::Error;

/// Errors produced when parsing color strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid hex color '{0}': expected #rgb or #rrggbb")]
    InvalidHex(String),
}

/// An RGB color with `f32` channels, nominally in `[0, 1]`.
///
/// Channels are not clamped: over-bright or negative values pass straight
/// through to the shading stage.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or the short `#rgb` form. The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let invalid = || ColorError::InvalidHex(hex.to_string());
        let trimmed = hex.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let (r, g, b) = match digits.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
                (
                    channel(0).map_err(|_| invalid())?,
                    channel(2).map_err(|_| invalid())?,
                    channel(4).map_err(|_| invalid())?,
                )
            }
            3 => {
                // #abc expands to #aabbcc
                let channel = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).map(|v| v * 17);
                (
                    channel(0).map_err(|_| invalid())?,
                    channel(1).map_err(|_| invalid())?,
                    channel(2).map_err(|_| invalid())?,
                )
            }
            _ => return Err(invalid()),
        };

        Ok(Self::from_u8(r, g, b))
    }

    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Format as `#rrggbb`, clamping each channel into the byte range.
    pub fn to_hex(&self) -> String {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::from_hex(s)
    }
}

impl From<[f32; 3]> for Rgb {
    fn from(c: [f32; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl From<Rgb> for glam::Vec3 {
    fn from(c: Rgb) -> Self {
        glam::Vec3::new(c.r, c.g, c.b)
    }
}

/// The color ramp of a star, from the outer corona down to the border bands,
/// plus an intensity in `[0, 1]` that becomes the first ramp breakpoint.
///
/// Immutable once built; the live values the shaders read are copied into the
/// star's [`ParameterSet`](crate::ParameterSet) at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorProfile {
    corona: Rgb,
    core: Rgb,
    inner_border: Rgb,
    outer_border: Rgb,
    intensity: f32,
}

impl ColorProfile {
    pub fn new(corona: Rgb, core: Rgb, inner_border: Rgb, outer_border: Rgb, intensity: f32) -> Self {
        Self {
            corona,
            core,
            inner_border,
            outer_border,
            intensity,
        }
    }

    /// Build a profile from four hex strings.
    pub fn from_hex(
        corona: &str,
        core: &str,
        inner_border: &str,
        outer_border: &str,
        intensity: f32,
    ) -> Result<Self, ColorError> {
        Ok(Self::new(
            Rgb::from_hex(corona)?,
            Rgb::from_hex(core)?,
            Rgb::from_hex(inner_border)?,
            Rgb::from_hex(outer_border)?,
            intensity,
        ))
    }

    pub fn corona(&self) -> Rgb {
        self.corona
    }

    pub fn core(&self) -> Rgb {
        self.core
    }

    pub fn inner_border(&self) -> Rgb {
        self.inner_border
    }

    pub fn outer_border(&self) -> Rgb {
        self.outer_border
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// The ramp in shader order: `color_step_1` through `color_step_4`.
    pub fn steps(&self) -> [Rgb; 4] {
        [self.corona, self.core, self.inner_border, self.outer_border]
    }
}

impl Default for ColorProfile {
    /// A yellow, Sol-like ramp.
    fn default() -> Self {
        Self::new(
            Rgb::new(1.0, 0.6, 0.0),
            Rgb::new(1.0, 0.95, 0.8),
            Rgb::WHITE,
            Rgb::new(0.1, 0.0, 0.0),
            0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_hex() {
        let c = Rgb::from_hex("#ffaa00").unwrap();
        assert_eq!(c, Rgb::from_u8(255, 170, 0));
        assert!((c.g - 170.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_short_hex_expands() {
        assert_eq!(Rgb::from_hex("#fa0").unwrap(), Rgb::from_hex("#ffaa00").unwrap());
    }

    #[test]
    fn test_parse_without_hash() {
        assert_eq!(Rgb::from_hex("000011").unwrap(), Rgb::from_u8(0, 0, 17));
    }

    #[test]
    fn test_invalid_hex_is_rejected() {
        for bad in ["", "#", "#ff00", "#gg0000", "#ff00000", "#+f0", "##ff0000", "##f00"] {
            assert!(
                matches!(Rgb::from_hex(bad), Err(ColorError::InvalidHex(_))),
                "'{bad}' should not parse"
            );
        }
    }

    #[test]
    fn test_to_hex_clamps() {
        assert_eq!(Rgb::new(2.0, -1.0, 0.5).to_hex(), "#ff0080");
        assert_eq!("#12abef".parse::<Rgb>().unwrap().to_hex(), "#12abef");
    }

    #[test]
    fn test_profile_steps_order() {
        let profile = ColorProfile::from_hex("#ff0000", "#ffaa00", "#ffffff", "#000011", 0.5).unwrap();
        let steps = profile.steps();
        assert_eq!(steps[0], Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(steps[2], Rgb::WHITE);
        assert_eq!(steps[3], profile.outer_border());
        assert_eq!(profile.intensity(), 0.5);
    }

    #[test]
    fn test_profile_rejects_any_bad_stop() {
        let result = ColorProfile::from_hex("#ff0000", "nope", "#ffffff", "#000011", 0.5);
        assert_eq!(result, Err(ColorError::InvalidHex("nope".to_string())));
    }
}
