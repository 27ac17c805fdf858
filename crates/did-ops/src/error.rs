//! Error types for degradation drivers.

use did_compute::ComputeError;
use thiserror::Error;

/// Error type for degradation drivers.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Data model error, including missing or invalid parameters.
    #[error(transparent)]
    Core(#[from] did_core::Error),

    /// Gradient editing or reconstruction failed.
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

impl OpsError {
    /// Returns `true` for [`did_core::Error::MissingParameter`] and
    /// [`did_core::Error::InvalidParameter`], wherever they were raised.
    pub fn is_parameter_error(&self) -> bool {
        match self {
            Self::Core(e) | Self::Compute(ComputeError::Core(e)) => e.is_parameter_error(),
            Self::Compute(_) => false,
        }
    }

    /// Returns `true` if two operands had different sizes.
    pub fn is_dimension_error(&self) -> bool {
        match self {
            Self::Core(e) | Self::Compute(ComputeError::Core(e)) => e.is_dimension_error(),
            Self::Compute(_) => false,
        }
    }
}

/// Result type for degradation drivers.
pub type OpsResult<T> = Result<T, OpsError>;
