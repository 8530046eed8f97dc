//! Reference bake engine writing one flat swatch per pass
//!
//! Stands in for a real lightmapper: each result is a small image filled with
//! the total irradiance the isolated scene would contribute, tone mapped to
//! display range. Good enough to check catalog coverage and file layout.

use image::{Rgba, RgbaImage};
use relight_engine::bake::{BakeEngine, BakeRequest};
use relight_engine::foundation::color::LinearColor;
use relight_engine::scene::{LightBakeType, Scene};
use std::path::PathBuf;
use thiserror::Error;

/// Swatch edge length in pixels
const SWATCH_SIZE: u32 = 8;

/// Swatch engine failures
#[derive(Error, Debug)]
pub enum SwatchError {
    /// Output directory could not be created
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        /// Directory
        path: PathBuf,
        /// Cause
        source: std::io::Error,
    },

    /// Image encoding or writing failed
    #[error("failed to write swatch {path}: {source}")]
    Write {
        /// Target file
        path: PathBuf,
        /// Cause
        source: image::ImageError,
    },
}

/// Bake engine writing flat irradiance swatches
#[derive(Debug, Default)]
pub struct SwatchEngine {
    written: usize,
}

impl SwatchEngine {
    /// Swatches written so far
    pub const fn written(&self) -> usize {
        self.written
    }
}

impl BakeEngine for SwatchEngine {
    type Error = SwatchError;

    fn bake(&mut self, scene: &Scene, request: &BakeRequest) -> Result<(), SwatchError> {
        let path = &request.output_path;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| SwatchError::CreateDir { path: dir.to_path_buf(), source })?;
        }

        let total = irradiance(scene);
        log::debug!("{} irradiance {:?} ({:?})", request.address, total.to_array(), request.mode);

        let image = RgbaImage::from_pixel(SWATCH_SIZE, SWATCH_SIZE, to_pixel(total));
        image
            .save(path)
            .map_err(|source| SwatchError::Write { path: path.clone(), source })?;
        self.written += 1;
        Ok(())
    }
}

/// Sum of everything the baker would see: ambient, baked lights (through
/// their proxy when present) and emissive slots of GI renderers
fn irradiance(scene: &Scene) -> LinearColor {
    let mut sum = [0.0f32; 3];
    let mut add = |color: LinearColor| {
        for (acc, channel) in sum.iter_mut().zip([color.r, color.g, color.b]) {
            *acc += channel;
        }
    };

    let ambient = &scene.render_settings;
    add(ambient.ambient_color.to_linear() * ambient.ambient_intensity);

    for (_, light) in scene.find_lights() {
        if light.bake_type == LightBakeType::Realtime {
            continue;
        }
        match light.proxy {
            Some(proxy) if proxy.enabled => add(proxy.color.to_linear() * proxy.intensity),
            Some(_) => {}
            None if light.enabled => add(light.color.to_linear() * light.intensity),
            None => {}
        }
    }

    for (id, renderer) in scene.find_renderers() {
        if !renderer.enabled || !renderer.contributes_gi() {
            continue;
        }
        for slot in 0..renderer.shared_materials.len() {
            if let Some(material) = scene.slot_material(id, slot).filter(|m| m.is_emissive()) {
                add(material.emission_color);
            }
        }
    }

    LinearColor::rgb(sum[0], sum[1], sum[2])
}

/// Reinhard tone map, then sRGB encode
fn to_pixel(color: LinearColor) -> Rgba<u8> {
    let mapped = LinearColor::rgb(color.r / (1.0 + color.r), color.g / (1.0 + color.g), color.b / (1.0 + color.b));
    let srgb = mapped.to_srgb();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([byte(srgb.r), byte(srgb.g), byte(srgb.b), 255])
}

#[cfg(test)]
mod tests {
    use super::*;
    use relight_engine::foundation::color::Color;
    use relight_engine::foundation::math::Vec3;
    use relight_engine::scene::Light;

    #[test]
    fn test_irradiance_ignores_realtime_and_disabled_proxy() {
        let mut scene = Scene::new();
        scene.render_settings.ambient_intensity = 0.0;
        scene.add_light(Light::point("key", Vec3::zeros(), Color::WHITE, 2.0));
        scene.add_light(Light::point("torch", Vec3::zeros(), Color::WHITE, 5.0).with_bake_type(LightBakeType::Realtime));
        let proxied = scene.add_light(Light::point("proxied", Vec3::zeros(), Color::WHITE, 3.0).with_proxy());
        if let Some(proxy) = scene.light_mut(proxied).unwrap().proxy.as_mut() {
            proxy.enabled = false;
        }

        let total = irradiance(&scene);
        assert!((total.r - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_black_maps_to_black_pixel() {
        assert_eq!(to_pixel(LinearColor::BLACK), Rgba([0, 0, 0, 255]));
    }
}
