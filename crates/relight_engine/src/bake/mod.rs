//! Bake orchestration
//!
//! Decomposes a static lighting bake into one single-source bake per catalog
//! channel. The catalog enumeration in [`address`] fixes which stored result
//! belongs to which slot of the runtime color vector.

pub mod address;
pub mod controller;
pub mod error;
pub mod light_source;
pub mod output;
pub mod session;
pub mod settings;

pub use address::{AddressError, BakeTargetAddress, BakeTargetKind, CatalogLayout};
pub use controller::{BakeSceneController, Catalog, ControllerState, SceneSnapshot};
pub use error::{BakeError, SessionError};
pub use light_source::{
    EmissiveSurfaceSource, EmitterSource, LightSource, LightSourceControl, PanelArraySource, SceneObject,
};
pub use output::{result_path, BakeOutputIndex};
pub use session::{bake_all, BakeEngine, BakeReport, BakeRequest, BakeSession, BakedResult};
pub use settings::BakeSettings;
