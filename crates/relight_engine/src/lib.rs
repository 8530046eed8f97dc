//! # Relight Engine
//!
//! Per-source lightmap baking and runtime relighting.
//!
//! Static lighting is baked once per light source instead of once for the
//! whole scene. At runtime every stored result is weighted by the live color
//! of its source, which lets baked lighting change color and intensity without
//! re-baking.
//!
//! ## Features
//!
//! - **Bake orchestration**: scene snapshot, single-source isolation and guaranteed rollback
//! - **Bake addressing**: stable `kind/object[/sub]` paths for stored results
//! - **Runtime collector**: per-frame color vector aligned with the bake catalog
//! - **Scene files**: RON and TOML scene definitions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relight_engine::prelude::*;
//!
//! struct NullEngine;
//!
//! impl BakeEngine for NullEngine {
//!     type Error = std::io::Error;
//!
//!     fn bake(&mut self, _scene: &Scene, _request: &BakeRequest) -> Result<(), Self::Error> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let definition = SceneDefinition::load_from_file("scene.ron")?;
//!     let (mut scene, descriptor) = definition.instantiate()?;
//!     let report = bake_all(&mut scene, descriptor, &BakeSettings::default(), &mut NullEngine)?;
//!     println!("baked {} targets", report.results.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod bake;
pub mod config;
pub mod foundation;
pub mod runtime;
pub mod scene;

#[cfg(test)]
mod tests;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        bake::{
            bake_all, BakeEngine, BakeError, BakeOutputIndex, BakeReport, BakeRequest, BakeSceneController,
            BakeSession, BakeSettings, BakeTargetAddress, BakeTargetKind, CatalogLayout, SessionError,
        },
        config::{Config, ConfigError},
        foundation::{
            color::{Color, LinearColor},
            math::Vec3,
        },
        runtime::{CollectorSources, ColorCollector, PanelColorGrid, PanelColorSampler},
        scene::{
            Light, LightId, Material, MaterialId, PanelArraySetup, Renderer, RendererId, Scene, SceneDefinition,
            SceneDescriptor, StaticFlags,
        },
    };
}
