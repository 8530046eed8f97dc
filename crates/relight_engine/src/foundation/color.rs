//! Display-space and linear-space colors
//!
//! Authored light colors are stored the way artists pick them (sRGB encoded),
//! while everything the bake engine and the recombination shader consume must
//! be linear. Keeping the two as distinct types makes an accidental mix a type
//! error instead of a silent brightness shift.

use approx::{AbsDiffEq, RelativeEq};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Display-space (sRGB encoded) RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel (0.0 to 1.0)
    pub r: f32,
    /// Green channel (0.0 to 1.0)
    pub g: f32,
    /// Blue channel (0.0 to 1.0)
    pub b: f32,
    /// Alpha channel (0.0 to 1.0)
    pub a: f32,
}

impl Color {
    /// Opaque white, the canonical bake reference color
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque red
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);

    /// Create an opaque color from sRGB channels
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from sRGB channels and alpha
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to linear space. Alpha is not gamma encoded and is kept as is.
    pub fn to_linear(self) -> LinearColor {
        LinearColor {
            r: srgb_to_linear(self.r),
            g: srgb_to_linear(self.g),
            b: srgb_to_linear(self.b),
            a: self.a,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Linear-space RGBA color, laid out for direct upload to the GPU
///
/// Channels may exceed 1.0 (HDR emission, intensity-scaled lights).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct LinearColor {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel, used as a per-slot weight by the recombination shader
    pub a: f32,
}

impl LinearColor {
    /// Opaque white
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black, the value of a source that is off
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// Create an opaque linear color
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a linear color with alpha
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// True when the color carries no energy
    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }

    /// Convert to display space
    pub fn to_srgb(self) -> Color {
        Color {
            r: linear_to_srgb(self.r),
            g: linear_to_srgb(self.g),
            b: linear_to_srgb(self.b),
            a: self.a,
        }
    }

    /// Channels as an array, in RGBA order
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Scales the color channels. Alpha is a weight, not energy, and is left alone.
impl Mul<f32> for LinearColor {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self {
            r: self.r * rhs,
            g: self.g * rhs,
            b: self.b * rhs,
            a: self.a,
        }
    }
}

impl AbsDiffEq for LinearColor {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl RelativeEq for LinearColor {
    fn default_max_relative() -> f32 {
        f32::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f32, max_relative: f32) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_primaries_are_unchanged_by_linearization() {
        assert_relative_eq!(Color::WHITE.to_linear(), LinearColor::WHITE);
        assert_relative_eq!(Color::RED.to_linear(), LinearColor::rgb(1.0, 0.0, 0.0));
        assert_relative_eq!(Color::BLACK.to_linear(), LinearColor::BLACK);
    }

    #[test]
    fn test_mid_gray_linearization() {
        // sRGB 0.5 is roughly 21.4% linear reflectance
        let linear = Color::rgb(0.5, 0.5, 0.5).to_linear();
        assert_relative_eq!(linear.r, 0.214_041, epsilon = 1e-5);
        assert_relative_eq!(linear.to_srgb().r, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_scaling_keeps_alpha() {
        let scaled = LinearColor::rgba(0.5, 0.25, 1.0, 0.75) * 2.0;
        assert_relative_eq!(scaled, LinearColor::rgba(1.0, 0.5, 2.0, 0.75));
    }

    #[test]
    fn test_pod_layout() {
        let colors = [LinearColor::rgb(1.0, 2.0, 3.0), LinearColor::BLACK];
        let floats: &[f32] = bytemuck::cast_slice(&colors);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }
}
