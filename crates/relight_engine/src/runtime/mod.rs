//! Runtime side of the bake: live source colors, one slot per stored result

pub mod color_collector;
pub mod panel;

pub use color_collector::{CollectorSources, ColorCollector, MAX_INTENSITY};
pub use panel::{PanelColorGrid, PanelColorSampler, PanelError};
