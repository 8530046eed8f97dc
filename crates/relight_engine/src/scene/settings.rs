//! Scene-wide render and lightmap settings
//!
//! These are plain values owned by the [`Scene`](super::Scene). The bake
//! controller reads and writes them explicitly; nothing reaches them through
//! global state.

use crate::foundation::color::Color;
use serde::{Deserialize, Serialize};

/// Ambient lighting settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Ambient (sky) color, display space
    pub ambient_color: Color,
    /// Ambient intensity multiplier
    pub ambient_intensity: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            ambient_color: Color::rgb(0.212, 0.227, 0.259),
            ambient_intensity: 1.0,
        }
    }
}

/// Lightmap encoding mode used by the bake engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightmapsMode {
    /// Irradiance only
    NonDirectional,
    /// Irradiance plus a dominant direction texture
    #[default]
    CombinedDirectional,
}

impl LightmapsMode {
    /// Mode for the given directional flag
    pub const fn from_directional(directional: bool) -> Self {
        if directional {
            Self::CombinedDirectional
        } else {
            Self::NonDirectional
        }
    }
}

/// Lightmap settings consumed by the bake engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightmapSettings {
    /// Lightmap encoding mode
    pub mode: LightmapsMode,
}
