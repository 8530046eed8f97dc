//! Relight bake tool
//!
//! Bakes every catalog source of a scene definition into its own result file,
//! checks the result directory against the catalog, then runs a few frames of
//! the runtime color collector over the restored scene.
//!
//! Usage: `relight_bake [scene.ron|scene.toml] [bake.toml]`

mod swatch;

use relight_engine::bake::{bake_all, BakeOutputIndex, BakeSettings};
use relight_engine::config::Config;
use relight_engine::foundation::color::LinearColor;
use relight_engine::foundation::logging;
use relight_engine::runtime::{CollectorSources, ColorCollector, PanelColorGrid, PanelColorSampler};
use relight_engine::scene::{SceneDefinition, SceneDescriptor};
use swatch::SwatchEngine;

const DEFAULT_SCENE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/scenes/atrium.ron");
const PREVIEW_FRAMES: u64 = 3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("info");

    let mut args = std::env::args().skip(1);
    let scene_path = args.next().unwrap_or_else(|| DEFAULT_SCENE.to_string());
    let settings = match args.next() {
        Some(path) => BakeSettings::load_from_file(path)?,
        None => BakeSettings::default(),
    };

    log::info!("Loading scene from {scene_path}");
    let definition = SceneDefinition::load_from_file(&scene_path)?;
    let (mut scene, descriptor) = definition.instantiate()?;

    // Size the collector against the untouched scene
    let mut collector = ColorCollector::new(collector_sources(&descriptor));
    collector.initialize_once(&scene);

    let mut engine = SwatchEngine::default();
    let report = match bake_all(&mut scene, descriptor.clone(), &settings, &mut engine) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Bake failed: {e}");
            return Err(e.into());
        }
    };
    log::info!(
        "Baked {} targets into {} ({} swatches written)",
        report.results.len(),
        settings.output_root.display(),
        engine.written()
    );

    let index = BakeOutputIndex::scan(&settings.output_root, &settings.extension, &report.layout)?;
    for address in index.missing(&report.layout) {
        log::warn!("No stored result for {address}");
    }
    if !index.stale.is_empty() {
        log::warn!("{} stale results can be deleted", index.stale.len());
    }

    if collector.layout().as_ref() != Some(&report.layout) {
        log::warn!("Runtime color vector does not line up with the bake catalog");
    }

    let addresses = report.layout.addresses();
    let base_intensity = descriptor.lights.first().and_then(|&id| scene.light(id)).map(|l| l.intensity);
    for frame in 0..PREVIEW_FRAMES {
        if let (Some(&id), Some(base)) = (descriptor.lights.first(), base_intensity) {
            if let Some(light) = scene.light_mut(id) {
                #[allow(clippy::cast_precision_loss)]
                let pulse = 1.0 + frame as f32 * 0.5;
                light.intensity = base * pulse;
            }
        }
        collector.on_pre_cull(&scene, frame);
        for (address, color) in addresses.iter().zip(collector.colors(&scene)) {
            log::info!("frame {frame} {address}: {:?}", color.to_array());
        }
    }
    log::info!("Color vector upload size: {} bytes", collector.as_bytes().len());

    Ok(())
}

/// Collector sources in catalog order; each panel array gets a single-row
/// grid seeded with a horizontal gradient
fn collector_sources(descriptor: &SceneDescriptor) -> CollectorSources {
    let panels = descriptor
        .panel_arrays
        .iter()
        .map(|setup| {
            let columns = setup.cells.len();
            let mut grid = PanelColorGrid::new(columns, 1);
            for cell in 0..columns {
                #[allow(clippy::cast_precision_loss)]
                let t = (cell + 1) as f32 / columns as f32;
                grid.set_cell(cell, LinearColor::rgb(t, 0.2, 1.0 - t));
            }
            Box::new(grid) as Box<dyn PanelColorSampler>
        })
        .collect();

    CollectorSources {
        ambient: descriptor.ambient_enabled,
        lights: descriptor.lights.clone(),
        panels,
        surfaces: descriptor.emissive_renderers.clone(),
    }
}
