//! In-memory scene the bake controller isolates and the color collector samples
//!
//! Lights, renderers and materials live in generational arenas. Their keys are
//! the stable object identity used for catalog matching and for restoring
//! masked material arrays.

pub mod definition;
pub mod descriptor;
pub mod objects;
pub mod settings;

pub use definition::{SceneDefinition, SceneError};
pub use descriptor::{PanelArraySetup, SceneDescriptor};
pub use objects::{
    Light, LightBakeType, LightId, LightType, Material, MaterialId, ProxyLight, Renderer, RendererId, StaticFlags,
};
pub use settings::{LightmapSettings, LightmapsMode, RenderSettings};

use slotmap::SlotMap;

/// Scene containing every light, renderer and material
#[derive(Debug, Default)]
pub struct Scene {
    lights: SlotMap<LightId, Light>,
    renderers: SlotMap<RendererId, Renderer>,
    materials: SlotMap<MaterialId, Material>,
    /// Ambient lighting
    pub render_settings: RenderSettings,
    /// Lightmap encoding
    pub lightmap_settings: LightmapSettings,
}

impl Scene {
    /// Create an empty scene with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a light
    pub fn add_light(&mut self, light: Light) -> LightId {
        self.lights.insert(light)
    }

    /// Get a light
    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(id)
    }

    /// Get a mutable light
    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.get_mut(id)
    }

    /// Remove a light
    pub fn remove_light(&mut self, id: LightId) -> Option<Light> {
        self.lights.remove(id)
    }

    /// Every light, in arena order
    pub fn find_lights(&self) -> impl Iterator<Item = (LightId, &Light)> {
        self.lights.iter()
    }

    /// Add a renderer
    pub fn add_renderer(&mut self, renderer: Renderer) -> RendererId {
        self.renderers.insert(renderer)
    }

    /// Get a renderer
    pub fn renderer(&self, id: RendererId) -> Option<&Renderer> {
        self.renderers.get(id)
    }

    /// Get a mutable renderer
    pub fn renderer_mut(&mut self, id: RendererId) -> Option<&mut Renderer> {
        self.renderers.get_mut(id)
    }

    /// Remove a renderer
    pub fn remove_renderer(&mut self, id: RendererId) -> Option<Renderer> {
        self.renderers.remove(id)
    }

    /// Every renderer, in arena order
    pub fn find_renderers(&self) -> impl Iterator<Item = (RendererId, &Renderer)> {
        self.renderers.iter()
    }

    /// Add a material
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.insert(material)
    }

    /// Get a material
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Get a mutable material
    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// Remove a material. Slots still referencing it resolve to nothing.
    pub fn remove_material(&mut self, id: MaterialId) -> Option<Material> {
        self.materials.remove(id)
    }

    /// Every material, in arena order
    pub fn find_materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter()
    }

    /// Whether the material is still alive
    pub fn contains_material(&self, id: MaterialId) -> bool {
        self.materials.contains_key(id)
    }

    /// Resolved material for one slot of a renderer
    pub fn slot_material(&self, renderer: RendererId, slot: usize) -> Option<&Material> {
        let id = (*self.renderers.get(renderer)?.shared_materials.get(slot)?)?;
        self.materials.get(id)
    }

    /// Whether any material on the renderer has emission enabled
    pub fn has_emissive_material(&self, renderer: &Renderer) -> bool {
        renderer
            .shared_materials
            .iter()
            .flatten()
            .filter_map(|id| self.materials.get(*id))
            .any(Material::is_emissive)
    }

    /// Slot indices of the renderer whose material has emission enabled
    pub fn emissive_slots(&self, renderer: RendererId) -> Vec<usize> {
        let Some(renderer) = self.renderers.get(renderer) else {
            return Vec::new();
        };
        renderer
            .shared_materials
            .iter()
            .enumerate()
            .filter(|(_, id)| id.and_then(|id| self.materials.get(id)).is_some_and(Material::is_emissive))
            .map(|(slot, _)| slot)
            .collect()
    }
}
