//! Bake session errors

use super::address::{AddressError, BakeTargetAddress};
use super::controller::ControllerState;
use thiserror::Error;

/// Misuse of a bake session, or a catalog that does not match the scene
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Address does not resolve against the current catalog
    #[error("bake target {0} is not part of the current catalog")]
    InvalidAddress(BakeTargetAddress),

    /// Address path could not be decoded
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Descriptor names an object the scene does not contain
    #[error("scene descriptor references missing {kind} at catalog index {index}")]
    MissingObject {
        /// Object kind
        kind: &'static str,
        /// Index in the descriptor list
        index: usize,
    },

    /// Descriptor lists an object that is already part of the catalog
    #[error("scene descriptor lists {kind} at catalog index {index} more than once")]
    DuplicateObject {
        /// Object kind
        kind: &'static str,
        /// Index of the repeated entry in the descriptor list
        index: usize,
    },

    /// Operation not allowed in the controller's current state
    #[error("cannot {operation} while the bake controller is {state:?}")]
    InvalidState {
        /// Attempted operation
        operation: &'static str,
        /// State at the time of the call
        state: ControllerState,
    },
}

/// Failure of a complete bake run
///
/// Engine errors pass through untouched; the scene has already been rolled
/// back by the time the caller sees either variant.
#[derive(Error, Debug)]
pub enum BakeError<E> {
    /// Session setup or addressing failed
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The bake engine failed
    #[error(transparent)]
    Engine(E),
}
