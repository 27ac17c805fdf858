//! # did-core
//!
//! Core types for document image degradation.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - [`Raster`] - Dense single-channel `f32` buffer with edge-clamped reads
//! - [`Image`] - Three-channel image built from rasters, with a per-row
//!   [`ColorSpace`] tag
//! - [`Error`] / [`Result`] - Unified error handling
//!
//! ## Crate Structure
//!
//! This crate has no internal dependencies. The other crates build on it:
//!
//! ```text
//! did-core (this crate)
//!    ^
//!    |
//!    +-- did-compute (gradient fields, relaxation solver, strategies)
//!    +-- did-ops (degradation drivers)
//!    +-- did-cli (benchmark binary)
//! ```
//!
//! ## Coordinates
//!
//! All types address pixels as `(x, y)` with `x` growing to the right and
//! `y` growing downwards. Storage is row-major: `index = y * width + x`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod colorspace;
pub mod error;
pub mod image;
pub mod raster;

// Re-exports for convenience
pub use colorspace::ColorSpace;
pub use error::{Error, Result};
pub use image::{CHANNELS, Image};
pub use raster::Raster;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use did_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::colorspace::ColorSpace;
    pub use crate::error::{Error, Result};
    pub use crate::image::{CHANNELS, Image};
    pub use crate::raster::Raster;
}
