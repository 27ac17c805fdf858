//! Random patch noise: composites patch gradients at random positions.

use did_compute::GradientField;
use did_core::{Error, Image};
use rand::{Rng, RngCore};
use tracing::{debug, info};

use crate::OpsResult;
use crate::degradation::{GradientDegradation, ModifyReport, check_fields};
use crate::patches::{coverage, placement_probability};

/// Pastes randomly placed, randomly repeated noise patches.
///
/// Each patch is drawn while a uniform sample is below the placement
/// probability, at most once per patch in the set. Every repeat is rotated
/// a quarter turn. Patches may hang over any edge of the image by up to
/// their own size.
#[derive(Debug, Clone, Default)]
pub struct NoiseGradients {
    /// Expected patch area per image pixel.
    pub density: Option<f32>,
    /// Gradient boost applied to the patches.
    pub strength: Option<f32>,
    /// Noise patches.
    pub source: Option<Vec<Image>>,
}

impl NoiseGradients {
    pub const NAME: &'static str = "noise-gradients";

    pub fn new(density: f32, strength: f32, source: Vec<Image>) -> Self {
        Self {
            density: Some(density),
            strength: Some(strength),
            source: Some(source),
        }
    }
}

/// Required parameters of a random patch driver.
pub(crate) struct PatchParams<'a> {
    pub density: f32,
    pub strength: f32,
    pub patches: &'a [Image],
}

pub(crate) fn patch_params<'a>(
    command: &str,
    density: Option<f32>,
    strength: Option<f32>,
    source: Option<&'a [Image]>,
) -> OpsResult<PatchParams<'a>> {
    let density = density.ok_or_else(|| Error::missing_parameter(command, "density"))?;
    let strength = strength.ok_or_else(|| Error::missing_parameter(command, "strength"))?;
    let patches = source.ok_or_else(|| Error::missing_parameter(command, "source"))?;
    if !density.is_finite() || density < 0.0 {
        return Err(Error::invalid_parameter(command, "density", "must be a non-negative number").into());
    }
    if patches.is_empty() {
        return Err(Error::invalid_parameter(command, "source", "no patches").into());
    }
    Ok(PatchParams {
        density,
        strength,
        patches,
    })
}

impl GradientDegradation for NoiseGradients {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self) -> OpsResult<()> {
        patch_params(Self::NAME, self.density, self.strength, self.source.as_deref()).map(|_| ())
    }

    fn modify(
        &self,
        fields: &mut [GradientField],
        image: &Image,
        rng: &mut dyn RngCore,
    ) -> OpsResult<ModifyReport> {
        let params = patch_params(Self::NAME, self.density, self.strength, self.source.as_deref())?;
        check_fields(Self::NAME, fields, image)?;

        let n = params.patches.len();
        let proba = placement_probability(params.density, params.patches, image);
        debug!(patches = n, proba, "noise placement probability");

        let (w, h) = (image.width() as i64, image.height() as i64);
        let mut count = 0;
        for source in params.patches {
            let mut patch = source.clone();
            let mut i = 0;
            while rng.gen_range(0.0f32..1.0) < proba && i < n {
                if i > 0 {
                    patch.turn_left();
                }
                let (pw, ph) = (patch.width() as i64, patch.height() as i64);
                let px = rng.gen_range(-pw..w + pw);
                let py = rng.gen_range(-ph..h + ph);
                for (channel, field) in fields.iter_mut().enumerate() {
                    GradientField::from_image(&patch, channel)?
                        .paste_gradient(image, field, px, py, params.strength)?;
                }
                count += 1;
                i += 1;
            }
        }

        let coverage = coverage(count, params.patches, image);
        info!(patches = count, coverage, "noise patches pasted");
        Ok(ModifyReport {
            patches: count,
            coverage,
        })
    }
}
