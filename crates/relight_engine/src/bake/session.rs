//! Scoped bake sessions and the full bake loop
//!
//! [`BakeSession`] borrows the scene for the whole session and rolls it back
//! when dropped, so an error or a panic anywhere in the bake loop still leaves
//! the scene as it was found.

use super::address::{BakeTargetAddress, CatalogLayout};
use super::controller::BakeSceneController;
use super::error::{BakeError, SessionError};
use super::output::result_path;
use super::settings::BakeSettings;
use crate::scene::{LightmapsMode, Scene, SceneDescriptor};
use std::path::PathBuf;

/// One bake invocation handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakeRequest {
    /// Address being baked
    pub address: BakeTargetAddress,
    /// Where the engine must store its result
    pub output_path: PathBuf,
    /// Zero-based pass number
    pub pass_index: usize,
    /// Total passes in this run
    pub pass_count: usize,
    /// Lightmap encoding for this run
    pub mode: LightmapsMode,
}

/// External bake engine
///
/// Called once per pass with the scene isolated to a single source. The
/// engine must produce one static irradiance result at `request.output_path`.
pub trait BakeEngine {
    /// Engine failure, returned unchanged to the caller of [`bake_all`]
    type Error: std::error::Error + 'static;

    /// Bake the currently isolated source
    fn bake(&mut self, scene: &Scene, request: &BakeRequest) -> Result<(), Self::Error>;
}

/// One stored result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakedResult {
    /// Address of the result
    pub address: BakeTargetAddress,
    /// Storage path
    pub path: PathBuf,
}

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeReport {
    /// Catalog shape the results are addressed against
    pub layout: CatalogLayout,
    /// Results, in pass order
    pub results: Vec<BakedResult>,
}

/// Scene captured for baking; restored on drop
pub struct BakeSession<'a> {
    scene: &'a mut Scene,
    controller: BakeSceneController,
    released: bool,
}

impl<'a> BakeSession<'a> {
    /// Initialize a controller over the scene
    ///
    /// If initialization fails, whatever was captured is rolled back before
    /// the error is returned.
    pub fn begin(scene: &'a mut Scene, descriptor: SceneDescriptor) -> Result<Self, SessionError> {
        let mut controller = BakeSceneController::new(descriptor);
        let initialized = controller.initialize(scene);
        let session = Self { scene, controller, released: false };
        initialized?;
        Ok(session)
    }

    /// The scene, in whatever isolation state the last pass left it
    pub fn scene(&self) -> &Scene {
        self.scene
    }

    /// The underlying controller
    pub const fn controller(&self) -> &BakeSceneController {
        &self.controller
    }

    /// Catalog shape of this session
    pub fn layout(&self) -> CatalogLayout {
        self.controller.catalog().layout()
    }

    /// Every valid address, in enumeration order
    pub fn addresses(&self) -> Vec<BakeTargetAddress> {
        self.controller.addresses()
    }

    /// Select directional or non-directional lightmaps
    pub fn set_lightmap_mode(&mut self, directional: bool) {
        BakeSceneController::set_lightmap_mode(self.scene, directional);
    }

    /// Isolate one address
    pub fn begin_pass(&mut self, address: BakeTargetAddress) -> Result<(), SessionError> {
        self.controller.begin_pass(self.scene, address)
    }

    /// Finish the running pass
    pub fn end_pass(&mut self) {
        self.controller.end_pass();
    }

    /// Roll back and release now instead of at drop
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.controller.rollback(self.scene);
        self.controller.dispose(self.scene);
    }
}

impl Drop for BakeSession<'_> {
    fn drop(&mut self) {
        if !self.released {
            log::debug!("Bake session dropped early, rolling back");
        }
        self.release();
    }
}

/// Bake every address of the catalog, one sequential pass each
///
/// The scene is rolled back before this returns, on success and on failure.
pub fn bake_all<E: BakeEngine>(
    scene: &mut Scene,
    descriptor: SceneDescriptor,
    settings: &BakeSettings,
    engine: &mut E,
) -> Result<BakeReport, BakeError<E::Error>> {
    let mut session = BakeSession::begin(scene, descriptor)?;
    session.set_lightmap_mode(settings.directional);
    let mode = LightmapsMode::from_directional(settings.directional);

    let layout = session.layout();
    let addresses = select_addresses(&layout, &settings.only)?;
    log::info!("Baking {} of {} targets", addresses.len(), layout.channel_count());

    let mut results = Vec::with_capacity(addresses.len());
    for (pass_index, address) in addresses.iter().enumerate() {
        session.begin_pass(*address)?;
        let request = BakeRequest {
            address: *address,
            output_path: result_path(&settings.output_root, address, &settings.extension),
            pass_index,
            pass_count: addresses.len(),
            mode,
        };
        log::info!("[{}/{}] Baking {}", pass_index + 1, addresses.len(), address);
        engine.bake(session.scene(), &request).map_err(BakeError::Engine)?;
        session.end_pass();
        results.push(BakedResult { address: request.address, path: request.output_path });
    }

    session.finish();
    Ok(BakeReport { layout, results })
}

fn select_addresses(layout: &CatalogLayout, only: &[String]) -> Result<Vec<BakeTargetAddress>, SessionError> {
    if only.is_empty() {
        return Ok(layout.addresses());
    }
    let mut selected = Vec::with_capacity(only.len());
    for path in only {
        let address: BakeTargetAddress = path.parse()?;
        if !address.validate(layout) {
            return Err(SessionError::InvalidAddress(address));
        }
        selected.push(address);
    }
    // Passes always run in enumeration order
    let order = layout.addresses();
    selected.sort_by_key(|address| order.iter().position(|a| a == address));
    selected.dedup();
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::color::Color;
    use crate::foundation::math::Vec3;
    use crate::scene::Light;

    #[derive(Debug, thiserror::Error, PartialEq, Eq)]
    #[error("bake engine crashed on pass {0}")]
    struct Crash(usize);

    /// Records which lights were on for each pass; fails on a chosen pass
    #[derive(Default)]
    struct RecordingEngine {
        fail_on: Option<usize>,
        lit: Vec<Vec<String>>,
    }

    impl BakeEngine for RecordingEngine {
        type Error = Crash;

        fn bake(&mut self, scene: &Scene, request: &BakeRequest) -> Result<(), Crash> {
            if self.fail_on == Some(request.pass_index) {
                return Err(Crash(request.pass_index));
            }
            self.lit.push(
                scene
                    .find_lights()
                    .filter(|(_, light)| light.enabled)
                    .map(|(_, light)| light.name.clone())
                    .collect(),
            );
            Ok(())
        }
    }

    fn three_lights() -> (Scene, SceneDescriptor) {
        let mut scene = Scene::new();
        let mut descriptor = SceneDescriptor::new();
        for name in ["a", "b", "c"] {
            let id = scene.add_light(Light::point(name, Vec3::zeros(), Color::RED, 2.0));
            descriptor = descriptor.with_light(id);
        }
        (scene, descriptor)
    }

    #[test]
    fn test_bake_all_isolates_each_light() {
        let (mut scene, descriptor) = three_lights();
        let mut engine = RecordingEngine::default();
        let report = bake_all(&mut scene, descriptor, &BakeSettings::default(), &mut engine).unwrap();

        assert_eq!(engine.lit, vec![vec!["a"], vec!["b"], vec!["c"]]);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[2].path, PathBuf::from("baked/emitter/2.png"));
        assert!(scene.find_lights().all(|(_, l)| l.enabled && l.color == Color::RED && l.intensity == 2.0));
    }

    #[test]
    fn test_engine_failure_passes_through_after_rollback() {
        let (mut scene, descriptor) = three_lights();
        let mut engine = RecordingEngine { fail_on: Some(1), ..RecordingEngine::default() };
        let error = bake_all(&mut scene, descriptor, &BakeSettings::default(), &mut engine).unwrap_err();

        assert!(matches!(error, BakeError::Engine(Crash(1))));
        assert_eq!(error.to_string(), "bake engine crashed on pass 1");
        assert!(scene.find_lights().all(|(_, l)| l.enabled && l.color == Color::RED));
        assert_eq!(scene.find_renderers().count(), 0);
    }

    #[test]
    fn test_only_filter_runs_in_enumeration_order() {
        let (mut scene, descriptor) = three_lights();
        let settings = BakeSettings {
            only: vec!["emitter/2".into(), "emitter/0".into(), "emitter/2".into()],
            ..BakeSettings::default()
        };
        let mut engine = RecordingEngine::default();
        bake_all(&mut scene, descriptor, &settings, &mut engine).unwrap();
        assert_eq!(engine.lit, vec![vec!["a"], vec!["c"]]);
    }

    #[test]
    fn test_only_filter_rejects_unknown_targets() {
        let (mut scene, descriptor) = three_lights();
        let settings = BakeSettings { only: vec!["emitter/3".into()], ..BakeSettings::default() };
        let error = bake_all(&mut scene, descriptor, &settings, &mut RecordingEngine::default()).unwrap_err();
        assert!(matches!(
            error,
            BakeError::Session(SessionError::InvalidAddress(address)) if address == BakeTargetAddress::emitter(3)
        ));
    }

    #[test]
    fn test_session_drop_rolls_back_after_panic() {
        let (mut scene, descriptor) = three_lights();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut session = BakeSession::begin(&mut scene, descriptor).unwrap();
            session.begin_pass(BakeTargetAddress::emitter(0)).unwrap();
            panic!("bake loop aborted");
        }));
        assert!(outcome.is_err());
        assert!(scene.find_lights().all(|(_, l)| l.enabled && l.intensity == 2.0));
    }
}
