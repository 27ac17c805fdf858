//! # did-ops
//!
//! Gradient degradation drivers for document images.
//!
//! Every driver edits the gradient fields of an image; reconstruction and
//! pasting the result back is shared and handled by [`apply_degradation`].
//!
//! # Drivers
//!
//! - [`NoiseGradients`] - random noise patches, max-magnitude compositing
//! - [`FadeGradients`] - random mask patches attenuating gradients
//! - [`ManualGradientModification`] - patches at explicit positions
//!
//! [`compare_orientations`] measures how far two images' gradient
//! orientations diverge.
//!
//! # Example
//!
//! ```rust
//! use did_compute::Strategy;
//! use did_core::Image;
//! use did_ops::{NoiseGradients, ReconstructionConfig, apply_degradation};
//! use rand::SeedableRng;
//!
//! let mut page = Image::from_fn(64, 64, |_, _| [0.9; 3]).unwrap();
//! let stain = Image::from_fn(24, 24, |x, y| [((x * y) % 5) as f32 * 0.2; 3]).unwrap();
//!
//! let driver = NoiseGradients::new(2.0, 1.5, vec![stain]);
//! let config = ReconstructionConfig::default()
//!     .with_iterations(50)
//!     .with_strategy(Strategy::Sequential);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let report = apply_degradation(&driver, &mut page, &config, &mut rng).unwrap();
//! assert_eq!(report.runs.len(), 3);
//! ```

mod compare;
mod config;
mod degradation;
mod error;
mod fade;
mod manual;
mod noise;
pub mod patches;

pub use compare::compare_orientations;
pub use config::{DEFAULT_ITERATIONS, ReconstructionConfig};
pub use degradation::{DegradationReport, GradientDegradation, ModifyReport, apply_degradation};
pub use error::{OpsError, OpsResult};
pub use fade::FadeGradients;
pub use manual::{ManualDegradation, ManualGradientModification};
pub use noise::NoiseGradients;
