//! Error types for did-core operations.
//!
//! # Overview
//!
//! The [`Error`] enum covers the failure modes of the data model and of the
//! operations built on top of it:
//! - Raster and image construction (dimension checks)
//! - Operations combining two rasters or images of different sizes
//! - Driver invocations with missing or invalid parameters
//!
//! # Usage
//!
//! ```rust
//! use did_core::{Error, Result};
//!
//! fn check_same_size(a: (u32, u32), b: (u32, u32)) -> Result<()> {
//!     if a != b {
//!         return Err(Error::dimension_mismatch(a, b));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_same_size((5, 5), (6, 5)).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or combining rasters and images.
///
/// # Categories
///
/// - **Dimension errors**: [`DimensionMismatch`](Error::DimensionMismatch), [`InvalidDimensions`](Error::InvalidDimensions)
/// - **Channel errors**: [`ChannelOutOfRange`](Error::ChannelOutOfRange)
/// - **Parameter errors**: [`MissingParameter`](Error::MissingParameter), [`InvalidParameter`](Error::InvalidParameter)
#[derive(Debug, Error)]
pub enum Error {
    /// Two operands of an operation have different sizes.
    ///
    /// Operations that fail with this error never write partial results.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First operand width
        a_width: u32,
        /// First operand height
        a_height: u32,
        /// Second operand width
        b_width: u32,
        /// Second operand height
        b_height: u32,
    },

    /// Invalid raster dimensions.
    ///
    /// Returned when width or height is zero, or when a data buffer does
    /// not hold exactly `width * height` samples.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Channel index is not valid for the image.
    #[error("channel {channel} out of range for image with {channels} channels")]
    ChannelOutOfRange {
        /// Requested channel
        channel: usize,
        /// Channel count of the image
        channels: usize,
    },

    /// A required driver parameter was not provided.
    #[error("{command}: requires parameter '{name}'")]
    MissingParameter {
        /// Command or driver name
        command: String,
        /// Parameter name
        name: String,
    },

    /// A driver parameter has an unusable value.
    #[error("{command}: invalid parameter '{name}' ({reason})")]
    InvalidParameter {
        /// Command or driver name
        command: String,
        /// Parameter name
        name: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::MissingParameter`] error.
    #[inline]
    pub fn missing_parameter(command: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingParameter {
            command: command.into(),
            name: name.into(),
        }
    }

    /// Creates an [`Error::InvalidParameter`] error.
    #[inline]
    pub fn invalid_parameter(
        command: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            command: command.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a size-related error.
    #[inline]
    pub fn is_dimension_error(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. } | Self::InvalidDimensions { .. }
        )
    }

    /// Returns `true` if this is a parameter error.
    #[inline]
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. } | Self::InvalidParameter { .. }
        )
    }
}
