//! File-loadable scene definitions
//!
//! A [`SceneDefinition`] names objects instead of holding arena keys, so it can
//! be written by hand in RON or TOML. [`SceneDefinition::instantiate`] builds
//! the live [`Scene`] and resolves catalog names into a [`SceneDescriptor`].

use super::descriptor::{PanelArraySetup, SceneDescriptor};
use super::objects::{
    Light, LightBakeType, LightId, LightType, Material, MaterialId, ProxyLight, Renderer, RendererId, StaticFlags,
};
use super::settings::{LightmapSettings, RenderSettings};
use super::Scene;
use crate::config::Config;
use crate::foundation::color::Color;
use crate::foundation::math::{self, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while building a scene from a definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// A name does not refer to any defined object
    #[error("unknown {kind} '{name}'")]
    UnknownObject {
        /// Object kind
        kind: &'static str,
        /// Name that failed to resolve
        name: String,
    },

    /// Two objects of the same kind share a name
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName {
        /// Object kind
        kind: &'static str,
        /// Duplicated name
        name: String,
    },
}

const fn default_true() -> bool {
    true
}

/// Light entry of a scene definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightDefinition {
    /// Unique light name
    pub name: String,
    /// Light type
    #[serde(default)]
    pub light_type: LightType,
    /// Position
    #[serde(default)]
    pub position: [f32; 3],
    /// Direction
    #[serde(default = "default_direction")]
    pub direction: [f32; 3],
    /// Color, display space
    #[serde(default)]
    pub color: Color,
    /// Intensity
    pub intensity: f32,
    /// Enabled flag
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bake type
    #[serde(default)]
    pub bake_type: LightBakeType,
    /// Whether the light carries a baker proxy
    #[serde(default)]
    pub proxy: bool,
}

fn default_direction() -> [f32; 3] {
    math::down().into()
}

/// Renderer entry of a scene definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererDefinition {
    /// Unique renderer name
    pub name: String,
    /// Enabled flag
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Static flags
    #[serde(default)]
    pub static_flags: StaticFlags,
    /// Material names per slot; `None` leaves the slot empty
    #[serde(default)]
    pub materials: Vec<Option<String>>,
}

/// Panel array entry of a catalog definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelArrayDefinition {
    /// Screen renderer name
    pub screen: String,
    /// Cell renderer names, row-major
    pub cells: Vec<String>,
}

/// Catalog membership by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDefinition {
    /// Emitter names
    pub lights: Vec<String>,
    /// Emissive surface renderer names
    pub emissive_renderers: Vec<String>,
    /// Panel arrays
    pub panel_arrays: Vec<PanelArrayDefinition>,
    /// Whether ambient is a bake target
    pub ambient: bool,
}

/// Name-based description of a scene and its bake catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDefinition {
    /// Ambient lighting
    pub render_settings: RenderSettings,
    /// Lightmap settings
    pub lightmap_settings: LightmapSettings,
    /// Materials
    pub materials: Vec<Material>,
    /// Lights
    pub lights: Vec<LightDefinition>,
    /// Renderers
    pub renderers: Vec<RendererDefinition>,
    /// Catalog membership
    pub catalog: CatalogDefinition,
}

impl Config for SceneDefinition {}

impl SceneDefinition {
    /// Build the scene and resolve the catalog
    pub fn instantiate(&self) -> Result<(Scene, SceneDescriptor), SceneError> {
        let mut scene = Scene::new();
        scene.render_settings = self.render_settings;
        scene.lightmap_settings = self.lightmap_settings;

        let mut materials: HashMap<&str, MaterialId> = HashMap::new();
        for material in &self.materials {
            let id = scene.add_material(material.clone());
            insert_unique(&mut materials, "material", &material.name, id)?;
        }

        let mut lights: HashMap<&str, LightId> = HashMap::new();
        for def in &self.lights {
            let light = Light {
                name: def.name.clone(),
                light_type: def.light_type,
                position: Vec3::from(def.position),
                direction: math::normalize_or_down(Vec3::from(def.direction)),
                color: def.color,
                intensity: def.intensity,
                enabled: def.enabled,
                bake_type: def.bake_type,
                proxy: def.proxy.then_some(ProxyLight {
                    color: def.color,
                    intensity: def.intensity,
                    enabled: def.enabled,
                }),
            };
            let id = scene.add_light(light);
            insert_unique(&mut lights, "light", &def.name, id)?;
        }

        let mut renderers: HashMap<&str, RendererId> = HashMap::new();
        for def in &self.renderers {
            let shared_materials = def
                .materials
                .iter()
                .map(|slot| slot.as_deref().map(|name| resolve(&materials, "material", name)).transpose())
                .collect::<Result<Vec<_>, _>>()?;
            let id = scene.add_renderer(Renderer {
                name: def.name.clone(),
                enabled: def.enabled,
                static_flags: def.static_flags,
                shared_materials,
            });
            insert_unique(&mut renderers, "renderer", &def.name, id)?;
        }

        let catalog = &self.catalog;
        let descriptor = SceneDescriptor {
            lights: catalog
                .lights
                .iter()
                .map(|name| resolve(&lights, "light", name))
                .collect::<Result<_, _>>()?,
            emissive_renderers: catalog
                .emissive_renderers
                .iter()
                .map(|name| resolve(&renderers, "renderer", name))
                .collect::<Result<_, _>>()?,
            panel_arrays: catalog
                .panel_arrays
                .iter()
                .map(|panel| -> Result<PanelArraySetup, SceneError> {
                    let screen = resolve(&renderers, "renderer", &panel.screen)?;
                    let cells = panel
                        .cells
                        .iter()
                        .map(|name| resolve(&renderers, "renderer", name))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(PanelArraySetup::new(screen, cells))
                })
                .collect::<Result<_, _>>()?,
            ambient_enabled: catalog.ambient,
        };

        log::debug!(
            "Instantiated scene: {} materials, {} lights, {} renderers",
            materials.len(),
            lights.len(),
            renderers.len()
        );

        Ok((scene, descriptor))
    }
}

fn insert_unique<'a, K: Copy>(
    map: &mut HashMap<&'a str, K>,
    kind: &'static str,
    name: &'a str,
    id: K,
) -> Result<(), SceneError> {
    if map.insert(name, id).is_some() {
        return Err(SceneError::DuplicateName { kind, name: name.to_string() });
    }
    Ok(())
}

fn resolve<K: Copy>(map: &HashMap<&str, K>, kind: &'static str, name: &str) -> Result<K, SceneError> {
    map.get(name)
        .copied()
        .ok_or_else(|| SceneError::UnknownObject { kind, name: name.to_string() })
}
