//! Scene objects: lights, renderers and materials

use crate::foundation::color::{Color, LinearColor};
use crate::foundation::math::{self, Vec3};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

slotmap::new_key_type! {
    /// Stable identity of a light in a scene
    pub struct LightId;
    /// Stable identity of a renderer in a scene
    pub struct RendererId;
    /// Stable identity of a material in a scene
    pub struct MaterialId;
}

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightType {
    /// Directional light (like sunlight)
    Directional,
    /// Point light (like a lightbulb)
    #[default]
    Point,
    /// Spot light (like a flashlight)
    Spot,
}

/// How the bake engine treats a light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightBakeType {
    /// Never baked, lit at runtime only
    Realtime,
    /// Baked indirect, realtime direct
    Mixed,
    /// Fully baked
    #[default]
    Baked,
}

/// Secondary representation of a light read by an external baker
///
/// Some bakers keep their own copy of a light's parameters next to the
/// engine light. Both must be driven together or the bake sees stale values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProxyLight {
    /// Proxy color, display space
    pub color: Color,
    /// Proxy intensity
    pub intensity: f32,
    /// Whether the baker considers the proxy
    pub enabled: bool,
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Debug name
    pub name: String,
    /// Light type
    pub light_type: LightType,
    /// Light position (for point/spot lights)
    pub position: Vec3,
    /// Light direction (for directional/spot lights)
    pub direction: Vec3,
    /// Light color, display space
    pub color: Color,
    /// Light intensity
    pub intensity: f32,
    /// Whether the light is enabled
    pub enabled: bool,
    /// Bake participation
    pub bake_type: LightBakeType,
    /// Coupled baker-side representation, if any
    pub proxy: Option<ProxyLight>,
}

impl Light {
    /// Create a point light
    pub fn point(name: impl Into<String>, position: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            name: name.into(),
            light_type: LightType::Point,
            position,
            direction: math::down(),
            color,
            intensity,
            enabled: true,
            bake_type: LightBakeType::Baked,
            proxy: None,
        }
    }

    /// Create a directional light
    pub fn directional(name: impl Into<String>, direction: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            name: name.into(),
            light_type: LightType::Directional,
            position: Vec3::zeros(),
            direction: math::normalize_or_down(direction),
            color,
            intensity,
            enabled: true,
            bake_type: LightBakeType::Baked,
            proxy: None,
        }
    }

    /// Set the bake type
    pub fn with_bake_type(mut self, bake_type: LightBakeType) -> Self {
        self.bake_type = bake_type;
        self
    }

    /// Attach a baker proxy mirroring the light's current parameters
    pub fn with_proxy(mut self) -> Self {
        self.proxy = Some(ProxyLight {
            color: self.color,
            intensity: self.intensity,
            enabled: self.enabled,
        });
        self
    }

    /// Set the enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

bitflags! {
    /// Static-object flags that decide which systems treat a renderer as static
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct StaticFlags: u32 {
        /// Renderer takes part in global illumination baking
        const CONTRIBUTE_GI = 1;
        /// Renderer occludes for visibility baking
        const OCCLUDER_STATIC = 1 << 1;
        /// Renderer may be statically batched
        const BATCHING_STATIC = 1 << 2;
    }
}

/// Renderable object with an ordered list of material slots
#[derive(Debug, Clone, PartialEq)]
pub struct Renderer {
    /// Debug name
    pub name: String,
    /// Whether the renderer is drawn (and seen by the baker)
    pub enabled: bool,
    /// Static flags
    pub static_flags: StaticFlags,
    /// Material slots. Empty slots are allowed.
    pub shared_materials: Vec<Option<MaterialId>>,
}

impl Renderer {
    /// Create an enabled renderer with the given material slots
    pub fn new(name: impl Into<String>, materials: impl IntoIterator<Item = MaterialId>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            static_flags: StaticFlags::empty(),
            shared_materials: materials.into_iter().map(Some).collect(),
        }
    }

    /// Set the static flags
    pub fn with_static_flags(mut self, flags: StaticFlags) -> Self {
        self.static_flags = flags;
        self
    }

    /// Whether the renderer contributes to baked GI
    pub fn contributes_gi(&self) -> bool {
        self.static_flags.contains(StaticFlags::CONTRIBUTE_GI)
    }
}

/// Surface material, reduced to the emission parameters lighting cares about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Debug name
    pub name: String,
    /// Emission keyword; a material without it never emits
    pub emission_enabled: bool,
    /// HDR linear emission color
    pub emission_color: LinearColor,
}

impl Material {
    /// Non-emissive material
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emission_enabled: false,
            emission_color: LinearColor::BLACK,
        }
    }

    /// Emissive material with the given HDR linear color
    pub fn emissive(name: impl Into<String>, emission_color: LinearColor) -> Self {
        Self {
            name: name.into(),
            emission_enabled: true,
            emission_color,
        }
    }

    /// Inert material used to mask interfering emitters during a bake
    pub fn placeholder() -> Self {
        Self::opaque("bake_placeholder")
    }

    /// Whether the emission keyword is enabled
    pub const fn is_emissive(&self) -> bool {
        self.emission_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_mirrors_light() {
        let light = Light::point("lamp", Vec3::zeros(), Color::RED, 2.0).with_proxy();
        let proxy = light.proxy.unwrap();
        assert_eq!(proxy.color, Color::RED);
        assert_eq!(proxy.intensity, 2.0);
        assert!(proxy.enabled);
    }

    #[test]
    fn test_static_flags() {
        let renderer = Renderer::new("wall", []).with_static_flags(StaticFlags::CONTRIBUTE_GI | StaticFlags::BATCHING_STATIC);
        assert!(renderer.contributes_gi());
        assert!(!Renderer::new("prop", []).contributes_gi());
    }

    #[test]
    fn test_placeholder_is_inert() {
        let placeholder = Material::placeholder();
        assert!(!placeholder.is_emissive());
        assert!(placeholder.emission_color.is_black());
    }
}
