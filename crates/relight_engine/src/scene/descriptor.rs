//! Catalog membership for one bake

use super::objects::{LightId, RendererId};

/// Grid panel array ("monitor"): a live screen plus the grid of cell
/// renderers that stand in for it during baking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelArraySetup {
    /// Renderer showing the live content at runtime
    pub screen: RendererId,
    /// One renderer per grid cell, in row-major order
    pub cells: Vec<RendererId>,
}

impl PanelArraySetup {
    /// Create a panel array setup
    pub fn new(screen: RendererId, cells: impl IntoIterator<Item = RendererId>) -> Self {
        Self {
            screen,
            cells: cells.into_iter().collect(),
        }
    }

    /// Whether the renderer belongs to this setup
    pub fn contains(&self, renderer: RendererId) -> bool {
        self.screen == renderer || self.cells.contains(&renderer)
    }
}

/// Which scene objects take part in the bake, and in which order
///
/// The order of every list here is the catalog order. It must not change
/// between baking and any later consumer of the baked results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneDescriptor {
    /// Emitters
    pub lights: Vec<LightId>,
    /// Emissive surfaces
    pub emissive_renderers: Vec<RendererId>,
    /// Panel arrays
    pub panel_arrays: Vec<PanelArraySetup>,
    /// Whether ambient light is a bake target of its own
    pub ambient_enabled: bool,
}

impl SceneDescriptor {
    /// Create an empty descriptor
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an emitter
    pub fn with_light(mut self, light: LightId) -> Self {
        self.lights.push(light);
        self
    }

    /// Add an emissive surface
    pub fn with_emissive_renderer(mut self, renderer: RendererId) -> Self {
        self.emissive_renderers.push(renderer);
        self
    }

    /// Add a panel array
    pub fn with_panel_array(mut self, setup: PanelArraySetup) -> Self {
        self.panel_arrays.push(setup);
        self
    }

    /// Treat ambient light as a bake target
    pub fn with_ambient(mut self, enabled: bool) -> Self {
        self.ambient_enabled = enabled;
        self
    }

    /// Whether the renderer belongs to any panel array setup
    pub fn panel_arrays_contain(&self, renderer: RendererId) -> bool {
        self.panel_arrays.iter().any(|setup| setup.contains(renderer))
    }
}
