//! Light source abstraction
//!
//! Every catalog entry, whatever its kind, can record its state, be forced to
//! the canonical bake reference state, be switched off, and be put back.
//! The set of kinds is closed: [`LightSource`] is an enum over the three
//! concrete sources, all sharing [`LightSourceControl`].
//!
//! Sources mutate the scene directly. The only state they keep is the single
//! record captured by [`LightSourceControl::capture_state`].

use super::address::BakeTargetKind;
use crate::foundation::color::{Color, LinearColor};
use crate::scene::{LightId, MaterialId, PanelArraySetup, ProxyLight, RendererId, Scene};

/// Scene object identity, as seen by interference scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneObject {
    /// A light
    Light(LightId),
    /// A renderer
    Renderer(RendererId),
}

/// Shared capability interface of every light source kind
pub trait LightSourceControl {
    /// Record the current state. Must run before any other mutation.
    fn capture_state(&mut self, scene: &mut Scene);

    /// Force every channel to the canonical reference state
    fn isolate(&self, scene: &mut Scene);

    /// Force one channel to the reference state and every other channel off.
    /// Sources without channels ignore `channel` and isolate as a whole.
    fn isolate_channel(&self, scene: &mut Scene, channel: usize);

    /// Switch the source fully off
    fn disable(&self, scene: &mut Scene);

    /// Reapply the captured state
    ///
    /// # Panics
    ///
    /// Panics if [`capture_state`](Self::capture_state) was never called.
    fn restore(&self, scene: &mut Scene);

    /// Whether `candidate` is (part of) this source
    fn matches(&self, candidate: SceneObject) -> bool;

    /// Addressable channel indices, ascending
    fn channels(&self) -> Vec<usize>;
}

/// Reference intensity of an isolated source
pub const REFERENCE_INTENSITY: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct EmitterState {
    color: Color,
    intensity: f32,
    enabled: bool,
    proxy: Option<ProxyLight>,
}

/// Single light, plus its baker proxy if it has one
#[derive(Debug, Clone)]
pub struct EmitterSource {
    light: LightId,
    captured: Option<EmitterState>,
}

impl EmitterSource {
    /// Wrap a light
    pub const fn new(light: LightId) -> Self {
        Self { light, captured: None }
    }

    /// Wrapped light
    pub const fn light(&self) -> LightId {
        self.light
    }
}

impl LightSourceControl for EmitterSource {
    fn capture_state(&mut self, scene: &mut Scene) {
        let Some(light) = scene.light(self.light) else {
            log::warn!("Emitter {:?} missing from scene, nothing captured", self.light);
            return;
        };
        self.captured = Some(EmitterState {
            color: light.color,
            intensity: light.intensity,
            enabled: light.enabled,
            proxy: light.proxy,
        });
    }

    fn isolate(&self, scene: &mut Scene) {
        let Some(light) = scene.light_mut(self.light) else { return };
        if let Some(proxy) = light.proxy.as_mut() {
            proxy.enabled = true;
            proxy.color = Color::WHITE;
            proxy.intensity = REFERENCE_INTENSITY;
        }
        light.color = Color::WHITE;
        light.intensity = REFERENCE_INTENSITY;
        light.enabled = true;
        log::trace!("Isolated emitter '{}'", light.name);
    }

    fn isolate_channel(&self, scene: &mut Scene, _channel: usize) {
        self.isolate(scene);
    }

    fn disable(&self, scene: &mut Scene) {
        let Some(light) = scene.light_mut(self.light) else { return };
        light.enabled = false;
        if let Some(proxy) = light.proxy.as_mut() {
            proxy.enabled = false;
        }
    }

    fn restore(&self, scene: &mut Scene) {
        let Some(state) = self.captured else {
            panic!("restore called on emitter {:?} before capture_state", self.light);
        };
        let Some(light) = scene.light_mut(self.light) else { return };
        light.color = state.color;
        light.intensity = state.intensity;
        light.enabled = state.enabled;
        light.proxy = state.proxy;
    }

    fn matches(&self, candidate: SceneObject) -> bool {
        candidate == SceneObject::Light(self.light)
    }

    fn channels(&self) -> Vec<usize> {
        Vec::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SurfaceState {
    shared_materials: Vec<Option<MaterialId>>,
    /// Per-renderer copies of the emissive slot materials, by slot
    instances: Vec<(usize, MaterialId)>,
}

/// Renderer whose emissive material slots are individually addressable
///
/// Materials are shared between renderers, so capturing swaps every emissive
/// slot to a private copy. Isolation edits only the copies; restoring puts the
/// original array back and drops them.
#[derive(Debug, Clone)]
pub struct EmissiveSurfaceSource {
    renderer: RendererId,
    emissive_slots: Vec<usize>,
    captured: Option<SurfaceState>,
}

impl EmissiveSurfaceSource {
    /// Wrap a renderer, recording which slots are emissive right now
    pub fn new(scene: &Scene, renderer: RendererId) -> Self {
        Self {
            renderer,
            emissive_slots: scene.emissive_slots(renderer),
            captured: None,
        }
    }

    /// Wrapped renderer
    pub const fn renderer(&self) -> RendererId {
        self.renderer
    }

    fn set_slot(scene: &mut Scene, material: MaterialId, lit: bool) {
        if let Some(material) = scene.material_mut(material) {
            material.emission_enabled = lit;
            material.emission_color = if lit { LinearColor::WHITE } else { LinearColor::BLACK };
        }
    }

    fn instances(&self) -> &[(usize, MaterialId)] {
        match &self.captured {
            Some(state) => &state.instances,
            None => &[],
        }
    }
}

impl LightSourceControl for EmissiveSurfaceSource {
    fn capture_state(&mut self, scene: &mut Scene) {
        let Some(renderer) = scene.renderer(self.renderer) else {
            log::warn!("Emissive surface {:?} missing from scene, nothing captured", self.renderer);
            return;
        };
        let shared_materials = renderer.shared_materials.clone();

        let mut instances = Vec::with_capacity(self.emissive_slots.len());
        let mut instanced_materials = shared_materials.clone();
        for &slot in &self.emissive_slots {
            let Some(original) = scene.slot_material(self.renderer, slot).cloned() else { continue };
            let Some(entry) = instanced_materials.get_mut(slot) else { continue };
            let copy = scene.add_material(original);
            *entry = Some(copy);
            instances.push((slot, copy));
        }

        if let Some(renderer) = scene.renderer_mut(self.renderer) {
            renderer.shared_materials = instanced_materials;
        }
        self.captured = Some(SurfaceState { shared_materials, instances });
    }

    fn isolate(&self, scene: &mut Scene) {
        for &(_, material) in self.instances() {
            Self::set_slot(scene, material, true);
        }
    }

    fn isolate_channel(&self, scene: &mut Scene, channel: usize) {
        for &(slot, material) in self.instances() {
            Self::set_slot(scene, material, slot == channel);
        }
    }

    fn disable(&self, scene: &mut Scene) {
        for &(_, material) in self.instances() {
            Self::set_slot(scene, material, false);
        }
    }

    fn restore(&self, scene: &mut Scene) {
        let Some(state) = &self.captured else {
            panic!("restore called on emissive surface {:?} before capture_state", self.renderer);
        };
        if let Some(renderer) = scene.renderer_mut(self.renderer) {
            renderer.shared_materials.clone_from(&state.shared_materials);
        }
        for &(_, material) in &state.instances {
            scene.remove_material(material);
        }
    }

    fn matches(&self, candidate: SceneObject) -> bool {
        candidate == SceneObject::Renderer(self.renderer)
    }

    fn channels(&self) -> Vec<usize> {
        self.emissive_slots.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PanelState {
    screen_enabled: bool,
    cells_enabled: Vec<bool>,
}

/// Grid panel array: the live screen is hidden during baking and each cell
/// renderer stands in for one grid cell
#[derive(Debug, Clone)]
pub struct PanelArraySource {
    setup: PanelArraySetup,
    captured: Option<PanelState>,
}

impl PanelArraySource {
    /// Wrap a panel array setup
    pub const fn new(setup: PanelArraySetup) -> Self {
        Self { setup, captured: None }
    }

    /// Wrapped setup
    pub const fn setup(&self) -> &PanelArraySetup {
        &self.setup
    }

    fn set_enabled(scene: &mut Scene, renderer: RendererId, enabled: bool) {
        if let Some(renderer) = scene.renderer_mut(renderer) {
            renderer.enabled = enabled;
        }
    }

    fn show_cells(&self, scene: &mut Scene, lit: impl Fn(usize) -> bool) {
        Self::set_enabled(scene, self.setup.screen, false);
        for (index, &cell) in self.setup.cells.iter().enumerate() {
            Self::set_enabled(scene, cell, lit(index));
        }
    }
}

impl LightSourceControl for PanelArraySource {
    fn capture_state(&mut self, scene: &mut Scene) {
        let enabled = |id| scene.renderer(id).is_some_and(|r| r.enabled);
        self.captured = Some(PanelState {
            screen_enabled: enabled(self.setup.screen),
            cells_enabled: self.setup.cells.iter().map(|&cell| enabled(cell)).collect(),
        });
    }

    fn isolate(&self, scene: &mut Scene) {
        self.show_cells(scene, |_| true);
    }

    fn isolate_channel(&self, scene: &mut Scene, channel: usize) {
        self.show_cells(scene, |cell| cell == channel);
    }

    fn disable(&self, scene: &mut Scene) {
        self.show_cells(scene, |_| false);
    }

    fn restore(&self, scene: &mut Scene) {
        let Some(state) = &self.captured else {
            panic!("restore called on panel array {:?} before capture_state", self.setup.screen);
        };
        Self::set_enabled(scene, self.setup.screen, state.screen_enabled);
        for (&cell, &enabled) in self.setup.cells.iter().zip(&state.cells_enabled) {
            Self::set_enabled(scene, cell, enabled);
        }
    }

    fn matches(&self, candidate: SceneObject) -> bool {
        matches!(candidate, SceneObject::Renderer(id) if self.setup.contains(id))
    }

    fn channels(&self) -> Vec<usize> {
        (0..self.setup.cells.len()).collect()
    }
}

/// Catalog entry
#[derive(Debug, Clone)]
pub enum LightSource {
    /// Single light
    Emitter(EmitterSource),
    /// Grid panel array
    PanelArray(PanelArraySource),
    /// Renderer with emissive slots
    EmissiveSurface(EmissiveSurfaceSource),
}

impl LightSource {
    /// Address kind of this entry
    pub const fn kind(&self) -> BakeTargetKind {
        match self {
            Self::Emitter(_) => BakeTargetKind::Emitter,
            Self::PanelArray(_) => BakeTargetKind::PanelArray,
            Self::EmissiveSurface(_) => BakeTargetKind::EmissiveSurface,
        }
    }

    fn control(&self) -> &dyn LightSourceControl {
        match self {
            Self::Emitter(source) => source,
            Self::PanelArray(source) => source,
            Self::EmissiveSurface(source) => source,
        }
    }

    fn control_mut(&mut self) -> &mut dyn LightSourceControl {
        match self {
            Self::Emitter(source) => source,
            Self::PanelArray(source) => source,
            Self::EmissiveSurface(source) => source,
        }
    }
}

impl LightSourceControl for LightSource {
    fn capture_state(&mut self, scene: &mut Scene) {
        self.control_mut().capture_state(scene);
    }

    fn isolate(&self, scene: &mut Scene) {
        self.control().isolate(scene);
    }

    fn isolate_channel(&self, scene: &mut Scene, channel: usize) {
        self.control().isolate_channel(scene, channel);
    }

    fn disable(&self, scene: &mut Scene) {
        self.control().disable(scene);
    }

    fn restore(&self, scene: &mut Scene) {
        self.control().restore(scene);
    }

    fn matches(&self, candidate: SceneObject) -> bool {
        self.control().matches(candidate)
    }

    fn channels(&self) -> Vec<usize> {
        self.control().channels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::{Light, Material, Renderer};

    #[test]
    fn test_emitter_drives_proxy_in_lock_step() {
        let mut scene = Scene::new();
        let id = scene.add_light(Light::point("lamp", Vec3::zeros(), Color::RED, 3.0).with_proxy());
        let mut source = EmitterSource::new(id);
        source.capture_state(&mut scene);

        source.isolate(&mut scene);
        let light = scene.light(id).unwrap();
        assert_eq!((light.color, light.intensity, light.enabled), (Color::WHITE, 1.0, true));
        assert_eq!(light.proxy, Some(ProxyLight { color: Color::WHITE, intensity: 1.0, enabled: true }));

        source.disable(&mut scene);
        let light = scene.light(id).unwrap();
        assert!(!light.enabled);
        assert!(!light.proxy.unwrap().enabled);

        source.restore(&mut scene);
        let light = scene.light(id).unwrap();
        assert_eq!((light.color, light.intensity, light.enabled), (Color::RED, 3.0, true));
        assert_eq!(light.proxy, Some(ProxyLight { color: Color::RED, intensity: 3.0, enabled: true }));
    }

    #[test]
    #[should_panic(expected = "before capture_state")]
    fn test_restore_without_capture_panics() {
        let mut scene = Scene::new();
        let id = scene.add_light(Light::point("lamp", Vec3::zeros(), Color::WHITE, 1.0));
        EmitterSource::new(id).restore(&mut scene);
    }

    #[test]
    fn test_surface_isolates_one_slot_on_private_copies() {
        let mut scene = Scene::new();
        let shared_glow = scene.add_material(Material::emissive("glow", LinearColor::rgb(4.0, 2.0, 0.0)));
        let plain = scene.add_material(Material::opaque("plain"));
        let surface = scene.add_renderer(Renderer::new("sign", [shared_glow, plain, shared_glow]));
        let bystander = scene.add_renderer(Renderer::new("other", [shared_glow]));

        let mut source = EmissiveSurfaceSource::new(&scene, surface);
        assert_eq!(source.channels(), vec![0, 2]);
        source.capture_state(&mut scene);

        source.isolate_channel(&mut scene, 2);
        let slot0 = scene.slot_material(surface, 0).unwrap();
        let slot2 = scene.slot_material(surface, 2).unwrap();
        assert!(!slot0.emission_enabled);
        assert_eq!(slot2.emission_color, LinearColor::WHITE);
        assert_eq!(scene.slot_material(surface, 1).unwrap().name, "plain");

        // The shared material, and any other renderer using it, is untouched
        assert_eq!(scene.material(shared_glow).unwrap().emission_color, LinearColor::rgb(4.0, 2.0, 0.0));
        assert_eq!(scene.renderer(bystander).unwrap().shared_materials, vec![Some(shared_glow)]);

        source.restore(&mut scene);
        assert_eq!(
            scene.renderer(surface).unwrap().shared_materials,
            vec![Some(shared_glow), Some(plain), Some(shared_glow)]
        );
        assert_eq!(scene.find_renderers().count(), 2);
    }

    #[test]
    fn test_panel_array_shows_one_cell() {
        let mut scene = Scene::new();
        let glow = scene.add_material(Material::emissive("cell", LinearColor::WHITE));
        let screen = scene.add_renderer(Renderer::new("screen", []));
        let cells: Vec<_> = (0..4)
            .map(|i| {
                let mut cell = Renderer::new(format!("cell{i}"), [glow]);
                cell.enabled = false;
                scene.add_renderer(cell)
            })
            .collect();

        let mut source = PanelArraySource::new(PanelArraySetup::new(screen, cells.clone()));
        source.capture_state(&mut scene);
        source.isolate_channel(&mut scene, 1);

        let enabled: Vec<bool> = cells.iter().map(|&c| scene.renderer(c).unwrap().enabled).collect();
        assert_eq!(enabled, vec![false, true, false, false]);
        assert!(!scene.renderer(screen).unwrap().enabled);
        assert!(source.matches(SceneObject::Renderer(cells[3])));
        assert!(source.matches(SceneObject::Renderer(screen)));

        source.restore(&mut scene);
        assert!(scene.renderer(screen).unwrap().enabled);
        assert!(cells.iter().all(|&c| !scene.renderer(c).unwrap().enabled));
    }
}
