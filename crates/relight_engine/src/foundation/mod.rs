//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types for light geometry
//! - Display-space and linear-space colors
//! - Logging utilities

pub mod color;
pub mod logging;
pub mod math;
