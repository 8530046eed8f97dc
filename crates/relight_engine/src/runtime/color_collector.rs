//! Runtime color collector
//!
//! Samples the live color of every catalog source once per frame into a
//! dense vector of linear colors. Slot `i` always holds the live weight of the
//! `i`-th address of [`CatalogLayout::addresses`], which is what lets the
//! downstream renderer compute `sum(baked_i * colors[i])`.
//!
//! Sampling must happen before anything reads the vector in the same frame;
//! the host calls [`ColorCollector::on_pre_cull`] ahead of its main pass.

use super::panel::PanelColorSampler;
use crate::bake::CatalogLayout;
use crate::foundation::color::LinearColor;
use crate::scene::{LightId, RendererId, Scene};

/// Upper bound of the global intensity multiplier
pub const MAX_INTENSITY: f32 = 20.0;

/// What the collector samples, in catalog order per kind
#[derive(Default)]
pub struct CollectorSources {
    /// Sample ambient light as slot zero
    pub ambient: bool,
    /// Emitters
    pub lights: Vec<LightId>,
    /// Panel array live samplers
    pub panels: Vec<Box<dyn PanelColorSampler>>,
    /// Emissive surfaces
    pub surfaces: Vec<RendererId>,
}

impl std::fmt::Debug for CollectorSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorSources")
            .field("ambient", &self.ambient)
            .field("lights", &self.lights)
            .field("panels", &self.panels.len())
            .field("surfaces", &self.surfaces)
            .finish()
    }
}

/// Counts and flags fixed at first use
#[derive(Debug, Clone, PartialEq, Eq)]
struct SamplingPlan {
    panel_cell_counts: Vec<usize>,
    /// Per surface, per material slot: emissive at initialization
    surface_emissive_flags: Vec<Vec<bool>>,
    size: usize,
}

/// Per-frame sampler producing the runtime color vector
#[derive(Debug)]
pub struct ColorCollector {
    sources: CollectorSources,
    intensity: f32,
    plan: Option<SamplingPlan>,
    colors: Vec<LinearColor>,
    last_frame: Option<u64>,
}

impl ColorCollector {
    /// Create a collector with a global multiplier of 1.0
    pub fn new(sources: CollectorSources) -> Self {
        Self {
            sources,
            intensity: 1.0,
            plan: None,
            colors: Vec::new(),
            last_frame: None,
        }
    }

    /// Global intensity multiplier
    pub const fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Set the global multiplier, clamped to `0..=MAX_INTENSITY`
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, MAX_INTENSITY);
    }

    /// Whether the vector has been sized
    pub const fn is_initialized(&self) -> bool {
        self.plan.is_some()
    }

    /// Size the vector from a one-time scan. Later calls do nothing.
    ///
    /// Emissive flags are captured here; surfaces gaining or losing emissive
    /// slots afterwards are not picked up. A flagged slot keeps reporting its
    /// emission color even if its keyword is switched off later.
    pub fn initialize_once(&mut self, scene: &Scene) {
        if self.plan.is_some() {
            return;
        }

        let panel_cell_counts: Vec<usize> = self.sources.panels.iter().map(|panel| panel.colors().len()).collect();
        let surface_emissive_flags: Vec<Vec<bool>> = self
            .sources
            .surfaces
            .iter()
            .map(|&id| {
                let slots = scene.renderer(id).map_or(0, |r| r.shared_materials.len());
                (0..slots)
                    .map(|slot| scene.slot_material(id, slot).is_some_and(|m| m.is_emissive()))
                    .collect()
            })
            .collect();

        let size = usize::from(self.sources.ambient)
            + self.sources.lights.len()
            + panel_cell_counts.iter().sum::<usize>()
            + surface_emissive_flags
                .iter()
                .map(|flags| flags.iter().filter(|&&f| f).count())
                .sum::<usize>();

        log::debug!("Color collector sized to {size} slots");
        self.colors = vec![LinearColor::BLACK; size];
        self.plan = Some(SamplingPlan { panel_cell_counts, surface_emissive_flags, size });
    }

    /// Catalog shape the vector is laid out for, once initialized
    pub fn layout(&self) -> Option<CatalogLayout> {
        let plan = self.plan.as_ref()?;
        Some(CatalogLayout {
            ambient: self.sources.ambient,
            emitter_count: self.sources.lights.len(),
            panel_cell_counts: plan.panel_cell_counts.clone(),
            surface_emissive_slots: plan
                .surface_emissive_flags
                .iter()
                .map(|flags| flags.iter().enumerate().filter(|(_, &f)| f).map(|(slot, _)| slot).collect())
                .collect(),
        })
    }

    /// The color vector, initializing it first if needed
    pub fn colors(&mut self, scene: &Scene) -> &[LinearColor] {
        self.initialize_once(scene);
        &self.colors
    }

    /// The color vector as tightly packed RGBA floats, for GPU upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Frame hook: sample once per frame number
    ///
    /// Returns false when the frame was already sampled.
    pub fn on_pre_cull(&mut self, scene: &Scene, frame: u64) -> bool {
        if self.last_frame.is_some_and(|last| frame <= last) {
            return false;
        }
        self.last_frame = Some(frame);
        self.sample(scene);
        true
    }

    /// Write the live color of every slot
    pub fn sample(&mut self, scene: &Scene) {
        self.initialize_once(scene);
        let Some(plan) = &self.plan else { return };
        let multiplier = self.intensity;
        let colors = &mut self.colors;
        let mut index = 0;

        if self.sources.ambient {
            let ambient = &scene.render_settings;
            colors[index] = ambient.ambient_color.to_linear() * (ambient.ambient_intensity * multiplier);
            index += 1;
        }

        for &id in &self.sources.lights {
            colors[index] = match scene.light(id) {
                Some(light) if light.enabled => light.color.to_linear() * (light.intensity * multiplier),
                _ => LinearColor::BLACK,
            };
            index += 1;
        }

        for (panel, &count) in self.sources.panels.iter().zip(&plan.panel_cell_counts) {
            let live = panel.colors();
            for cell in 0..count {
                colors[index] = live.get(cell).map_or(LinearColor::BLACK, |&c| c * multiplier);
                index += 1;
            }
        }

        for (&id, flags) in self.sources.surfaces.iter().zip(&plan.surface_emissive_flags) {
            for (slot, _) in flags.iter().enumerate().filter(|(_, &emissive)| emissive) {
                colors[index] = scene
                    .slot_material(id, slot)
                    .map_or(LinearColor::BLACK, |material| material.emission_color * multiplier);
                index += 1;
            }
        }

        debug_assert_eq!(index, plan.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::color::Color;
    use crate::foundation::math::Vec3;
    use crate::runtime::PanelColorGrid;
    use crate::scene::{Light, Material, Renderer};
    use approx::assert_relative_eq;

    #[test]
    fn test_sampling_order_and_values() {
        let mut scene = Scene::new();
        scene.render_settings.ambient_color = Color::WHITE;
        scene.render_settings.ambient_intensity = 0.5;
        let light = scene.add_light(Light::point("lamp", Vec3::zeros(), Color::RED, 2.0));
        let glow = scene.add_material(Material::emissive("glow", LinearColor::rgb(0.0, 3.0, 0.0)));
        let plain = scene.add_material(Material::opaque("plain"));
        let sign = scene.add_renderer(Renderer::new("sign", [plain, glow]));

        let mut grid = PanelColorGrid::new(2, 1);
        grid.set_cell(1, LinearColor::rgb(0.0, 0.0, 1.0));

        let mut collector = ColorCollector::new(CollectorSources {
            ambient: true,
            lights: vec![light],
            panels: vec![Box::new(grid)],
            surfaces: vec![sign],
        });
        collector.set_intensity(2.0);
        assert!(collector.on_pre_cull(&scene, 1));

        let colors = collector.colors(&scene);
        assert_eq!(colors.len(), 5);
        assert_relative_eq!(colors[0], LinearColor::rgb(1.0, 1.0, 1.0));
        assert_relative_eq!(colors[1], LinearColor::rgb(4.0, 0.0, 0.0));
        assert_relative_eq!(colors[2], LinearColor::BLACK);
        assert_relative_eq!(colors[3], LinearColor::rgb(0.0, 0.0, 2.0));
        assert_relative_eq!(colors[4], LinearColor::rgb(0.0, 6.0, 0.0));
    }

    #[test]
    fn test_frame_guard() {
        let mut scene = Scene::new();
        let light = scene.add_light(Light::point("lamp", Vec3::zeros(), Color::WHITE, 1.0));
        let mut collector = ColorCollector::new(CollectorSources { lights: vec![light], ..CollectorSources::default() });

        assert!(collector.on_pre_cull(&scene, 7));
        scene.light_mut(light).unwrap().intensity = 5.0;
        assert!(!collector.on_pre_cull(&scene, 7));
        assert_relative_eq!(collector.colors(&scene)[0], LinearColor::WHITE);

        assert!(collector.on_pre_cull(&scene, 8));
        assert_relative_eq!(collector.colors(&scene)[0], LinearColor::rgb(5.0, 5.0, 5.0));
    }

    #[test]
    fn test_size_is_fixed_at_first_use() {
        let mut scene = Scene::new();
        let glow = scene.add_material(Material::emissive("glow", LinearColor::WHITE));
        let plain = scene.add_material(Material::opaque("plain"));
        let sign = scene.add_renderer(Renderer::new("sign", [glow, plain]));

        let mut collector = ColorCollector::new(CollectorSources { surfaces: vec![sign], ..CollectorSources::default() });
        assert_eq!(collector.colors(&scene).len(), 1);

        // A slot that becomes emissive later does not grow the vector
        scene.material_mut(plain).unwrap().emission_enabled = true;
        collector.sample(&scene);
        assert_eq!(collector.colors(&scene).len(), 1);
        assert_eq!(collector.layout().unwrap().surface_emissive_slots, vec![vec![0]]);
    }

    #[test]
    fn test_flagged_slot_ignores_later_keyword_changes() {
        let mut scene = Scene::new();
        let glow = scene.add_material(Material::emissive("glow", LinearColor::rgb(0.0, 0.0, 3.0)));
        let sign = scene.add_renderer(Renderer::new("sign", [glow]));
        let mut collector = ColorCollector::new(CollectorSources { surfaces: vec![sign], ..CollectorSources::default() });
        collector.initialize_once(&scene);

        scene.material_mut(glow).unwrap().emission_enabled = false;
        assert!(collector.on_pre_cull(&scene, 0));
        assert_relative_eq!(collector.colors(&scene)[0], LinearColor::rgb(0.0, 0.0, 3.0));

        scene.remove_material(glow);
        assert!(collector.on_pre_cull(&scene, 1));
        assert!(collector.colors(&scene)[0].is_black());
    }

    #[test]
    fn test_intensity_clamped() {
        let mut collector = ColorCollector::new(CollectorSources::default());
        collector.set_intensity(100.0);
        assert_eq!(collector.intensity(), MAX_INTENSITY);
        collector.set_intensity(-1.0);
        assert_eq!(collector.intensity(), 0.0);
    }

    #[test]
    fn test_bytes_are_packed_rgba() {
        let mut scene = Scene::new();
        let light = scene.add_light(Light::point("lamp", Vec3::zeros(), Color::WHITE, 1.0));
        let mut collector = ColorCollector::new(CollectorSources { lights: vec![light], ..CollectorSources::default() });
        collector.sample(&scene);
        assert_eq!(collector.as_bytes().len(), 16);
    }
}
