/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::ops;

use gdbind_ffi as sys;
use glam::Vec4;

use crate::builtin::macros::impl_builtin_pod;

/// Color built-in type, in floating-point RGBA format.
///
/// Channel values are _typically_ in the range of 0 to 1, but this is not a requirement, and
/// values outside this range are explicitly allowed for e.g. High Dynamic Range (HDR).
#[repr(C)]
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct Color {
    /// The color's red component.
    pub r: f32,

    /// The color's green component.
    pub g: f32,

    /// The color's blue component.
    pub b: f32,

    /// The color's alpha component. A value of 0 means that the color is fully transparent.
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::from_rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::from_rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT_BLACK: Color = Color::from_rgba(0.0, 0.0, 0.0, 0.0);

    /// Constructs a new `Color` with the given components.
    pub const fn from_rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Constructs a new `Color` with the given color components, and the alpha channel set to 1.
    pub const fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self::from_rgba(r, g, b, 1.0)
    }

    /// Constructs a new `Color` with the given components as bytes. 0 is mapped to 0.0, 255 is
    /// mapped to 1.0.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_rgba(from_u8(r), from_u8(g), from_u8(b), from_u8(a))
    }

    /// Parses a hexadecimal color: `RGB`, `RGBA`, `RRGGBB` or `RRGGBBAA`, with optional leading `#`.
    ///
    /// Returns `None` for malformed input.
    pub fn from_html(html: &str) -> Option<Self> {
        let hex = html.strip_prefix('#').unwrap_or(html);
        if !hex.is_ascii() {
            return None;
        }

        let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

        let [r, g, b, a] = match hex.len() {
            3 => [digit(0)?, digit(1)?, digit(2)?, 255],
            4 => [digit(0)?, digit(1)?, digit(2)?, digit(3)?],
            6 => [byte(0)?, byte(2)?, byte(4)?, 255],
            8 => [byte(0)?, byte(2)?, byte(4)?, byte(6)?],
            _ => return None,
        };

        Some(Self::from_rgba8(r, g, b, a))
    }

    /// Returns the color with its alpha channel replaced.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Linear interpolation towards `to`.
    pub fn lerp(self, to: Self, weight: f32) -> Self {
        Self::from_glam(self.to_glam().lerp(to.to_glam(), weight))
    }

    /// Hex representation `RRGGBBAA`, without `#`.
    pub fn to_html(self) -> String {
        let [r, g, b, a] = [self.r, self.g, self.b, self.a].map(to_u8);
        format!("{r:02x}{g:02x}{b:02x}{a:02x}")
    }

    pub fn is_equal_approx(self, other: Self) -> bool {
        self.to_glam().abs_diff_eq(other.to_glam(), 1e-5)
    }

    fn from_glam(v: Vec4) -> Self {
        Self::from_rgba(v.x, v.y, v.z, v.w)
    }

    fn to_glam(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

/// Constructs a default `Color` which is opaque black.
impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl ops::Mul<f32> for Color {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::from_glam(self.to_glam() * rhs)
    }
}

impl ops::Add for Color {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_glam(self.to_glam() + rhs.to_glam())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl_builtin_pod!(Color);

fn from_u8(byte: u8) -> f32 {
    byte as f32 / 255.0
}

fn to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_parsing() {
        assert_eq!(Color::from_html("#ffffff"), Some(Color::WHITE));
        assert_eq!(Color::from_html("000"), Some(Color::BLACK));
        assert_eq!(Color::from_html("#0000"), Some(Color::TRANSPARENT_BLACK));
        assert_eq!(
            Color::from_html("ff000080"),
            Some(Color::from_rgba8(255, 0, 0, 128))
        );

        assert_eq!(Color::from_html("#12345"), None);
        assert_eq!(Color::from_html("zzzzzz"), None);
        assert_eq!(Color::from_html("ä0"), None);
    }

    #[test]
    fn html_roundtrip() {
        let color = Color::from_rgba8(0x12, 0xab, 0xef, 0x40);
        assert_eq!(color.to_html(), "12abef40");
        assert_eq!(Color::from_html(&color.to_html()), Some(color));
    }

    #[test]
    fn lerp_between_colors() {
        let mid = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert!(mid.is_equal_approx(Color::from_rgb(0.5, 0.5, 0.5)));
    }

    #[test]
    fn default_is_opaque_black() {
        assert_eq!(Color::default(), Color::BLACK);
        assert_eq!(Color::default().a, 1.0);
    }
}
