//! Scene snapshot and isolation controller
//!
//! The controller owns one bake session's worth of scene state:
//!
//! 1. [`initialize`](BakeSceneController::initialize) builds the catalog,
//!    captures every catalog entry, suppresses non-catalog interference and
//!    snapshots the scene-wide settings.
//! 2. [`begin_pass`](BakeSceneController::begin_pass) switches everything off
//!    and lights exactly one address. Each pass starts from "everything off",
//!    never from the previous pass.
//! 3. [`rollback`](BakeSceneController::rollback) puts the whole scene back,
//!    including objects the catalog does not manage.
//!
//! Prefer [`BakeSession`](super::BakeSession), which guarantees the rollback.

use super::address::{BakeTargetAddress, BakeTargetKind, CatalogLayout};
use super::error::SessionError;
use super::light_source::{
    EmissiveSurfaceSource, EmitterSource, LightSource, LightSourceControl, PanelArraySource, SceneObject,
};
use crate::scene::{LightBakeType, LightId, LightmapsMode, MaterialId, Material, RendererId, Scene, SceneDescriptor};
use std::collections::{HashMap, HashSet};

/// Ambient intensity used while baking the ambient target
pub const AMBIENT_BAKE_INTENSITY: f32 = 1.0;

/// Lifecycle of a [`BakeSceneController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Nothing captured yet
    Idle,
    /// Scene captured, no pass running
    Initialized,
    /// One address isolated
    IsolatingPass(BakeTargetAddress),
    /// Scene restored
    RolledBack,
}

/// Scene-wide values captured before the first pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSnapshot {
    /// Ambient intensity
    pub ambient_intensity: f32,
    /// Lightmap encoding mode
    pub lightmaps_mode: LightmapsMode,
}

/// Ordered catalog of light sources for one session
///
/// Entries are stored partitioned by kind in enumeration order: emitters,
/// then panel arrays, then emissive surfaces.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    ambient: bool,
    entries: Vec<LightSource>,
}

impl Catalog {
    /// Whether ambient is a bake target
    pub const fn ambient(&self) -> bool {
        self.ambient
    }

    /// Every entry, in enumeration order
    pub fn entries(&self) -> &[LightSource] {
        &self.entries
    }

    /// Entry `object_index` of the given kind
    pub fn entry(&self, kind: BakeTargetKind, object_index: usize) -> Option<&LightSource> {
        self.entries.iter().filter(|entry| entry.kind() == kind).nth(object_index)
    }

    /// Number of entries of the given kind
    pub fn count(&self, kind: BakeTargetKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind() == kind).count()
    }

    /// Whether any entry is, or owns, the candidate object
    pub fn matches(&self, candidate: SceneObject) -> bool {
        self.entries.iter().any(|entry| entry.matches(candidate))
    }

    /// Catalog shape used for addressing
    pub fn layout(&self) -> CatalogLayout {
        let channels_of = |kind: BakeTargetKind| {
            self.entries
                .iter()
                .filter(move |entry| entry.kind() == kind)
                .map(LightSourceControl::channels)
        };
        CatalogLayout {
            ambient: self.ambient,
            emitter_count: self.count(BakeTargetKind::Emitter),
            panel_cell_counts: channels_of(BakeTargetKind::PanelArray).map(|c| c.len()).collect(),
            surface_emissive_slots: channels_of(BakeTargetKind::EmissiveSurface).collect(),
        }
    }
}

/// Drives scene isolation for a sequence of single-source bakes
#[derive(Debug)]
pub struct BakeSceneController {
    descriptor: SceneDescriptor,
    state: ControllerState,
    catalog: Catalog,
    non_catalog_lights: Vec<LightId>,
    non_catalog_material_maps: HashMap<RendererId, Vec<Option<MaterialId>>>,
    snapshot: Option<SceneSnapshot>,
    placeholder: Option<MaterialId>,
}

impl BakeSceneController {
    /// Create an idle controller for the given catalog membership
    pub fn new(descriptor: SceneDescriptor) -> Self {
        Self {
            descriptor,
            state: ControllerState::Idle,
            catalog: Catalog::default(),
            non_catalog_lights: Vec::new(),
            non_catalog_material_maps: HashMap::new(),
            snapshot: None,
            placeholder: None,
        }
    }

    /// Current lifecycle state
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// Catalog membership
    pub const fn descriptor(&self) -> &SceneDescriptor {
        &self.descriptor
    }

    /// Catalog built by [`initialize`](Self::initialize)
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Scene-wide values captured by [`initialize`](Self::initialize)
    pub const fn snapshot(&self) -> Option<&SceneSnapshot> {
        self.snapshot.as_ref()
    }

    /// Whether ambient is owned by the catalog rather than by the snapshot
    pub const fn is_ambient_enabled(&self) -> bool {
        self.descriptor.ambient_enabled
    }

    /// Non-catalog lights suppressed for this session
    pub fn suppressed_lights(&self) -> &[LightId] {
        &self.non_catalog_lights
    }

    /// Non-catalog renderers whose materials are masked, with their original arrays
    pub const fn masked_renderers(&self) -> &HashMap<RendererId, Vec<Option<MaterialId>>> {
        &self.non_catalog_material_maps
    }

    /// Inert material used for masking, once allocated
    pub const fn placeholder_material(&self) -> Option<MaterialId> {
        self.placeholder
    }

    /// Every valid address, in enumeration order
    pub fn addresses(&self) -> Vec<BakeTargetAddress> {
        self.catalog.layout().addresses()
    }

    /// Capture the scene and suppress non-catalog interference
    ///
    /// Fails without touching the scene if the descriptor references objects
    /// the scene does not contain, or lists the same object twice.
    pub fn initialize(&mut self, scene: &mut Scene) -> Result<(), SessionError> {
        if self.state != ControllerState::Idle {
            return Err(SessionError::InvalidState { operation: "initialize", state: self.state });
        }
        self.check_descriptor(scene)?;

        log::info!(
            "Initializing bake scene: {} lights, {} panel arrays, {} emissive renderers, ambient {}",
            self.descriptor.lights.len(),
            self.descriptor.panel_arrays.len(),
            self.descriptor.emissive_renderers.len(),
            if self.descriptor.ambient_enabled { "baked" } else { "suppressed" },
        );
        self.state = ControllerState::Initialized;

        self.catalog.ambient = self.descriptor.ambient_enabled;
        for &light in &self.descriptor.lights {
            let mut source = LightSource::Emitter(EmitterSource::new(light));
            source.capture_state(scene);
            self.catalog.entries.push(source);
        }
        for setup in &self.descriptor.panel_arrays {
            let mut source = LightSource::PanelArray(PanelArraySource::new(setup.clone()));
            source.capture_state(scene);
            self.catalog.entries.push(source);
        }
        for &renderer in &self.descriptor.emissive_renderers {
            let mut source = LightSource::EmissiveSurface(EmissiveSurfaceSource::new(scene, renderer));
            source.capture_state(scene);
            self.catalog.entries.push(source);
        }

        self.suppress_non_catalog_lights(scene);
        self.mask_non_catalog_renderers(scene);

        self.snapshot = Some(SceneSnapshot {
            ambient_intensity: scene.render_settings.ambient_intensity,
            lightmaps_mode: scene.lightmap_settings.mode,
        });

        log::debug!(
            "Suppressed {} non-catalog lights, masked {} non-catalog renderers",
            self.non_catalog_lights.len(),
            self.non_catalog_material_maps.len()
        );
        Ok(())
    }

    fn check_descriptor(&self, scene: &Scene) -> Result<(), SessionError> {
        if let Some(index) = self.descriptor.lights.iter().position(|&id| scene.light(id).is_none()) {
            return Err(SessionError::MissingObject { kind: "light", index });
        }
        if let Some(index) = self
            .descriptor
            .emissive_renderers
            .iter()
            .position(|&id| scene.renderer(id).is_none())
        {
            return Err(SessionError::MissingObject { kind: "emissive renderer", index });
        }
        if let Some(index) = self.descriptor.panel_arrays.iter().position(|setup| {
            std::iter::once(&setup.screen)
                .chain(&setup.cells)
                .any(|&id| scene.renderer(id).is_none())
        }) {
            return Err(SessionError::MissingObject { kind: "panel array", index });
        }
        Self::check_unique(&self.descriptor)
    }

    /// Every light and renderer may appear in the catalog only once
    fn check_unique(descriptor: &SceneDescriptor) -> Result<(), SessionError> {
        let mut lights = HashSet::new();
        if let Some(index) = descriptor.lights.iter().position(|&id| !lights.insert(id)) {
            return Err(SessionError::DuplicateObject { kind: "light", index });
        }

        let mut renderers = HashSet::new();
        if let Some(index) = descriptor
            .emissive_renderers
            .iter()
            .position(|&id| !renderers.insert(id))
        {
            return Err(SessionError::DuplicateObject { kind: "emissive renderer", index });
        }
        if let Some(index) = descriptor.panel_arrays.iter().position(|setup| {
            std::iter::once(&setup.screen)
                .chain(&setup.cells)
                .any(|&id| !renderers.insert(id))
        }) {
            return Err(SessionError::DuplicateObject { kind: "panel array", index });
        }
        Ok(())
    }

    fn suppress_non_catalog_lights(&mut self, scene: &mut Scene) {
        let interfering: Vec<LightId> = scene
            .find_lights()
            .filter(|(id, light)| {
                light.enabled
                    && light.bake_type != LightBakeType::Realtime
                    && !self.catalog.matches(SceneObject::Light(*id))
            })
            .map(|(id, _)| id)
            .collect();

        for &id in &interfering {
            if let Some(light) = scene.light_mut(id) {
                log::trace!("Suppressing non-catalog light '{}'", light.name);
                light.enabled = false;
            }
        }
        self.non_catalog_lights = interfering;
    }

    fn mask_non_catalog_renderers(&mut self, scene: &mut Scene) {
        let placeholder = *self
            .placeholder
            .get_or_insert_with(|| scene.add_material(Material::placeholder()));

        let interfering: Vec<RendererId> = scene
            .find_renderers()
            .filter(|(id, renderer)| {
                !self.catalog.matches(SceneObject::Renderer(*id))
                    && !self.descriptor.panel_arrays_contain(*id)
                    && renderer.contributes_gi()
                    && scene.has_emissive_material(renderer)
            })
            .map(|(id, _)| id)
            .collect();

        for id in interfering {
            let Some(renderer) = scene.renderer_mut(id) else { continue };
            log::trace!("Masking materials of non-catalog renderer '{}'", renderer.name);
            let masked = vec![Some(placeholder); renderer.shared_materials.len()];
            let original = std::mem::replace(&mut renderer.shared_materials, masked);
            self.non_catalog_material_maps.insert(id, original);
        }
    }

    /// Switch off ambient, suppressed lights and every catalog entry
    pub fn turn_off(&self, scene: &mut Scene) {
        Self::turn_off_ambient(scene);
        for &id in &self.non_catalog_lights {
            if let Some(light) = scene.light_mut(id) {
                light.enabled = false;
            }
        }
        for entry in &self.catalog.entries {
            entry.disable(scene);
        }
    }

    /// Ambient at its bake reference intensity
    pub fn on_ambient_bake(scene: &mut Scene) {
        scene.render_settings.ambient_intensity = AMBIENT_BAKE_INTENSITY;
    }

    /// Ambient off
    pub fn turn_off_ambient(scene: &mut Scene) {
        scene.render_settings.ambient_intensity = 0.0;
    }

    /// Select directional or non-directional lightmaps for the session
    pub fn set_lightmap_mode(scene: &mut Scene, directional: bool) {
        scene.lightmap_settings.mode = LightmapsMode::from_directional(directional);
    }

    /// Whether the address resolves against the current catalog
    pub fn validate_address(&self, address: &BakeTargetAddress) -> bool {
        address.validate(&self.catalog.layout())
    }

    /// Isolate exactly one address for the next bake
    pub fn begin_pass(&mut self, scene: &mut Scene, address: BakeTargetAddress) -> Result<(), SessionError> {
        match self.state {
            ControllerState::Initialized | ControllerState::IsolatingPass(_) => {}
            state => return Err(SessionError::InvalidState { operation: "begin a pass", state }),
        }
        if !self.validate_address(&address) {
            return Err(SessionError::InvalidAddress(address));
        }

        self.turn_off(scene);
        match address.kind {
            BakeTargetKind::Ambient => Self::on_ambient_bake(scene),
            kind => {
                let entry = self
                    .catalog
                    .entry(kind, address.object_index)
                    .ok_or(SessionError::InvalidAddress(address))?;
                entry.isolate_channel(scene, address.sub_index);
            }
        }

        log::debug!("Isolated bake target {address}");
        self.state = ControllerState::IsolatingPass(address);
        Ok(())
    }

    /// Mark the running pass as finished. The scene is left as is; the next
    /// pass starts from "everything off" and rollback runs once at the end.
    pub fn end_pass(&mut self) {
        if let ControllerState::IsolatingPass(address) = self.state {
            log::trace!("Finished bake target {address}");
            self.state = ControllerState::Initialized;
        }
    }

    /// Restore everything captured, in order: non-catalog state, catalog
    /// entries, lightmap settings
    ///
    /// Operates only on what was actually captured, so it is safe after a
    /// failed or partial initialize and idempotent when called twice.
    pub fn rollback(&mut self, scene: &mut Scene) {
        self.rollback_non_catalog(scene);
        self.rollback_catalog(scene);
        self.rollback_lightmap_settings(scene);
        if self.state != ControllerState::Idle {
            log::info!("Bake scene rolled back");
            self.state = ControllerState::RolledBack;
        }
    }

    /// Restore suppressed lights, masked materials and, unless the catalog
    /// owns it, ambient intensity
    pub fn rollback_non_catalog(&mut self, scene: &mut Scene) {
        if !self.is_ambient_enabled() {
            if let Some(snapshot) = &self.snapshot {
                scene.render_settings.ambient_intensity = snapshot.ambient_intensity;
            }
        }
        for id in self.non_catalog_lights.drain(..) {
            if let Some(light) = scene.light_mut(id) {
                light.enabled = true;
            }
        }
        for (id, materials) in self.non_catalog_material_maps.drain() {
            match scene.renderer_mut(id) {
                Some(renderer) => renderer.shared_materials = materials,
                None => log::warn!("Masked renderer {id:?} vanished before rollback"),
            }
        }
    }

    /// Restore every catalog entry, last captured first, and, if the catalog
    /// owns it, ambient intensity
    pub fn rollback_catalog(&mut self, scene: &mut Scene) {
        if self.is_ambient_enabled() {
            if let Some(snapshot) = &self.snapshot {
                scene.render_settings.ambient_intensity = snapshot.ambient_intensity;
            }
        }
        for entry in self.catalog.entries.iter().rev() {
            entry.restore(scene);
        }
    }

    /// Restore the lightmap encoding mode
    pub fn rollback_lightmap_settings(&self, scene: &mut Scene) {
        if let Some(snapshot) = &self.snapshot {
            scene.lightmap_settings.mode = snapshot.lightmaps_mode;
        }
    }

    /// Release the placeholder material. Independent of rollback.
    pub fn dispose(&mut self, scene: &mut Scene) {
        if matches!(self.state, ControllerState::Initialized | ControllerState::IsolatingPass(_)) {
            log::warn!("Bake controller disposed without rollback; scene lighting may be left isolated");
        }
        if let Some(placeholder) = self.placeholder.take() {
            scene.remove_material(placeholder);
        }
    }
}

impl Drop for BakeSceneController {
    fn drop(&mut self) {
        if self.placeholder.is_some() {
            log::warn!("Bake controller dropped without dispose; placeholder material left in scene");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::color::{Color, LinearColor};
    use crate::foundation::math::Vec3;
    use crate::scene::{Light, PanelArraySetup, Renderer, StaticFlags};

    #[test]
    fn test_initialize_twice_is_rejected() {
        let mut scene = Scene::new();
        let mut controller = BakeSceneController::new(SceneDescriptor::new());
        controller.initialize(&mut scene).unwrap();
        assert!(matches!(
            controller.initialize(&mut scene),
            Err(SessionError::InvalidState { operation: "initialize", state: ControllerState::Initialized })
        ));
        controller.rollback(&mut scene);
        controller.dispose(&mut scene);
    }

    #[test]
    fn test_missing_descriptor_object_leaves_scene_untouched() {
        let mut scene = Scene::new();
        let light = scene.add_light(Light::point("gone", Vec3::zeros(), Color::WHITE, 1.0));
        scene.remove_light(light);
        let bystander = scene.add_light(Light::point("bystander", Vec3::zeros(), Color::WHITE, 1.0));

        let mut controller = BakeSceneController::new(SceneDescriptor::new().with_light(light));
        assert_eq!(
            controller.initialize(&mut scene),
            Err(SessionError::MissingObject { kind: "light", index: 0 })
        );
        assert_eq!(controller.state(), ControllerState::Idle);
        assert!(scene.light(bystander).unwrap().enabled);
        assert!(controller.placeholder_material().is_none());

        controller.rollback(&mut scene);
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn test_duplicate_catalog_members_are_rejected() {
        let mut scene = Scene::new();
        let light = scene.add_light(Light::point("key", Vec3::zeros(), Color::WHITE, 1.0));
        let glow = scene.add_material(Material::emissive("glow", LinearColor::WHITE));
        let sign = scene.add_renderer(Renderer::new("sign", [glow]));
        let screen = scene.add_renderer(Renderer::new("screen", [glow]));

        let twice_lit = SceneDescriptor::new().with_light(light).with_light(light);
        assert_eq!(
            BakeSceneController::new(twice_lit).initialize(&mut scene),
            Err(SessionError::DuplicateObject { kind: "light", index: 1 })
        );

        let shared_cell = SceneDescriptor::new()
            .with_emissive_renderer(sign)
            .with_panel_array(PanelArraySetup::new(screen, [sign]));
        let mut controller = BakeSceneController::new(shared_cell);
        assert_eq!(
            controller.initialize(&mut scene),
            Err(SessionError::DuplicateObject { kind: "panel array", index: 0 })
        );
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(scene.renderer(sign).unwrap().shared_materials, vec![Some(glow)]);
        assert!(scene.light(light).unwrap().enabled);
    }

    #[test]
    fn test_begin_pass_requires_initialize() {
        let mut scene = Scene::new();
        let mut controller = BakeSceneController::new(SceneDescriptor::new().with_ambient(true));
        assert!(matches!(
            controller.begin_pass(&mut scene, BakeTargetAddress::ambient()),
            Err(SessionError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_interference_rules() {
        let mut scene = Scene::new();
        let baked = scene.add_light(Light::point("baked", Vec3::zeros(), Color::WHITE, 1.0));
        let realtime = scene.add_light(
            Light::point("realtime", Vec3::zeros(), Color::WHITE, 1.0).with_bake_type(LightBakeType::Realtime),
        );
        let off = scene.add_light(Light::point("off", Vec3::zeros(), Color::WHITE, 1.0).with_enabled(false));

        let glow = scene.add_material(Material::emissive("glow", LinearColor::WHITE));
        let gi_glow = scene.add_renderer(Renderer::new("gi_glow", [glow]).with_static_flags(StaticFlags::CONTRIBUTE_GI));
        let dynamic_glow = scene.add_renderer(Renderer::new("dynamic_glow", [glow]));

        let mut controller = BakeSceneController::new(SceneDescriptor::new());
        controller.initialize(&mut scene).unwrap();

        assert_eq!(controller.suppressed_lights(), &[baked]);
        assert!(!scene.light(baked).unwrap().enabled);
        assert!(scene.light(realtime).unwrap().enabled);
        assert!(!scene.light(off).unwrap().enabled);

        assert!(controller.masked_renderers().contains_key(&gi_glow));
        assert!(!controller.masked_renderers().contains_key(&dynamic_glow));

        controller.rollback(&mut scene);
        assert!(scene.light(baked).unwrap().enabled);
        assert!(!scene.light(off).unwrap().enabled);
        controller.dispose(&mut scene);
    }

    #[test]
    fn test_lightmap_mode_restored() {
        let mut scene = Scene::new();
        scene.lightmap_settings.mode = LightmapsMode::NonDirectional;

        let mut controller = BakeSceneController::new(SceneDescriptor::new());
        controller.initialize(&mut scene).unwrap();
        BakeSceneController::set_lightmap_mode(&mut scene, true);
        assert_eq!(scene.lightmap_settings.mode, LightmapsMode::CombinedDirectional);

        controller.rollback(&mut scene);
        assert_eq!(scene.lightmap_settings.mode, LightmapsMode::NonDirectional);
        controller.dispose(&mut scene);
    }

    #[test]
    fn test_dispose_releases_placeholder_without_rollback() {
        let mut scene = Scene::new();
        let mut controller = BakeSceneController::new(SceneDescriptor::new());
        controller.initialize(&mut scene).unwrap();
        let placeholder = controller.placeholder_material().unwrap();
        assert!(scene.contains_material(placeholder));

        controller.dispose(&mut scene);
        assert!(!scene.contains_material(placeholder));
        assert!(controller.placeholder_material().is_none());
    }
}
