//! Bake target addressing
//!
//! A [`BakeTargetAddress`] names one baked result: one catalog entry and, for
//! multi-channel entries, one channel of it. [`CatalogLayout::addresses`] is
//! the canonical enumeration. Stored result paths and the runtime color vector
//! both follow it, so slot `i` of the vector always pairs with the `i`-th
//! address.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of bake target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BakeTargetKind {
    /// Scene ambient light
    Ambient,
    /// Single light
    Emitter,
    /// Grid panel array; the sub index selects a cell
    PanelArray,
    /// Renderer with emissive materials; the sub index selects a material slot
    EmissiveSurface,
}

impl BakeTargetKind {
    /// Every kind, in enumeration order
    pub const ALL: [Self; 4] = [Self::Ambient, Self::Emitter, Self::PanelArray, Self::EmissiveSurface];

    /// Path segment naming the kind
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Ambient => "ambient",
            Self::Emitter => "emitter",
            Self::PanelArray => "panel",
            Self::EmissiveSurface => "surface",
        }
    }

    /// Kind for a path segment
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.path_segment() == segment)
    }

    /// Whether addresses of this kind carry a sub index
    pub const fn has_sub_index(self) -> bool {
        matches!(self, Self::PanelArray | Self::EmissiveSurface)
    }
}

impl fmt::Display for BakeTargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Address of one baked result
///
/// Only meaningful relative to the catalog it was enumerated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BakeTargetAddress {
    /// Target kind
    pub kind: BakeTargetKind,
    /// Entry index within its kind
    pub object_index: usize,
    /// Panel cell or material slot index; zero for kinds without channels
    pub sub_index: usize,
}

impl BakeTargetAddress {
    /// Encode an address
    pub const fn new(kind: BakeTargetKind, object_index: usize, sub_index: usize) -> Self {
        Self { kind, object_index, sub_index }
    }

    /// The ambient address
    pub const fn ambient() -> Self {
        Self::new(BakeTargetKind::Ambient, 0, 0)
    }

    /// Address of an emitter
    pub const fn emitter(object_index: usize) -> Self {
        Self::new(BakeTargetKind::Emitter, object_index, 0)
    }

    /// Address of one panel array cell
    pub const fn panel_cell(object_index: usize, cell: usize) -> Self {
        Self::new(BakeTargetKind::PanelArray, object_index, cell)
    }

    /// Address of one emissive material slot
    pub const fn surface_slot(object_index: usize, slot: usize) -> Self {
        Self::new(BakeTargetKind::EmissiveSurface, object_index, slot)
    }

    /// Whether the address resolves against the layout
    pub fn validate(&self, layout: &CatalogLayout) -> bool {
        match self.kind {
            BakeTargetKind::Ambient => layout.ambient,
            BakeTargetKind::Emitter => self.object_index < layout.emitter_count,
            BakeTargetKind::PanelArray => layout
                .panel_cell_counts
                .get(self.object_index)
                .is_some_and(|&cells| self.sub_index < cells),
            BakeTargetKind::EmissiveSurface => layout
                .surface_emissive_slots
                .get(self.object_index)
                .is_some_and(|slots| slots.contains(&self.sub_index)),
        }
    }

    /// Relative storage path, `{kind}/{object}[/{sub}]`
    pub fn to_path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BakeTargetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.object_index)?;
        if self.kind.has_sub_index() {
            write!(f, "/{}", self.sub_index)?;
        }
        Ok(())
    }
}

/// Errors decoding an address path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Empty path
    #[error("empty bake target path")]
    Empty,

    /// First segment is not a known kind
    #[error("unknown bake target kind '{0}'")]
    UnknownKind(String),

    /// Index segment is not a number
    #[error("invalid index '{0}' in bake target path")]
    InvalidIndex(String),

    /// Segment count does not fit the kind
    #[error("bake target path '{0}' has the wrong number of segments")]
    WrongSegmentCount(String),
}

impl FromStr for BakeTargetAddress {
    type Err = AddressError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (&kind, rest) = segments.split_first().ok_or(AddressError::Empty)?;
        let kind = BakeTargetKind::from_path_segment(kind).ok_or_else(|| AddressError::UnknownKind(kind.to_string()))?;

        let expected = if kind.has_sub_index() { 2 } else { 1 };
        if rest.len() != expected {
            return Err(AddressError::WrongSegmentCount(path.to_string()));
        }

        let parse = |s: &str| s.parse::<usize>().map_err(|_| AddressError::InvalidIndex(s.to_string()));
        let object_index = parse(rest[0])?;
        let sub_index = match rest.get(1) {
            Some(sub) => parse(sub)?,
            None => 0,
        };

        Ok(Self::new(kind, object_index, sub_index))
    }
}

/// Shape of a catalog: everything addressing and sampling need to agree on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogLayout {
    /// Whether ambient is a bake target
    pub ambient: bool,
    /// Number of emitters
    pub emitter_count: usize,
    /// Cell count of each panel array
    pub panel_cell_counts: Vec<usize>,
    /// Emissive material slot indices of each surface, ascending
    pub surface_emissive_slots: Vec<Vec<usize>>,
}

impl CatalogLayout {
    /// Canonical enumeration: ambient, emitters, panel cells, surface slots
    pub fn addresses(&self) -> Vec<BakeTargetAddress> {
        let mut addresses = Vec::with_capacity(self.channel_count());
        if self.ambient {
            addresses.push(BakeTargetAddress::ambient());
        }
        addresses.extend((0..self.emitter_count).map(BakeTargetAddress::emitter));
        for (object, &cells) in self.panel_cell_counts.iter().enumerate() {
            addresses.extend((0..cells).map(|cell| BakeTargetAddress::panel_cell(object, cell)));
        }
        for (object, slots) in self.surface_emissive_slots.iter().enumerate() {
            addresses.extend(slots.iter().map(|&slot| BakeTargetAddress::surface_slot(object, slot)));
        }
        addresses
    }

    /// Number of addressable channels, which is also the color vector length
    pub fn channel_count(&self) -> usize {
        usize::from(self.ambient)
            + self.emitter_count
            + self.panel_cell_counts.iter().sum::<usize>()
            + self.surface_emissive_slots.iter().map(Vec::len).sum::<usize>()
    }

    /// Color vector slot of an address, if it is valid
    pub fn slot_of(&self, address: &BakeTargetAddress) -> Option<usize> {
        if !address.validate(self) {
            return None;
        }
        self.addresses().iter().position(|a| a == address)
    }
}
