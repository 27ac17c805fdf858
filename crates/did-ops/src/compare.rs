//! Gradient orientation comparison between two images.

use did_compute::GradientField;
use did_core::{CHANNELS, Error, Image};

use crate::OpsResult;

/// Mean over the three channels of the weighted orientation difference
/// between the gradients of `a` and `b`.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] if the images differ in size; checked
/// before any gradient is computed.
pub fn compare_orientations(a: &Image, b: &Image) -> OpsResult<f32> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::dimension_mismatch(a.dimensions(), b.dimensions()).into());
    }
    let mut sum = 0.0f32;
    for channel in 0..CHANNELS {
        let ga = GradientField::from_image(a, channel)?;
        let gb = GradientField::from_image(b, channel)?;
        sum += ga.weighted_orientation_difference(&gb)?;
    }
    Ok(sum / CHANNELS as f32)
}
