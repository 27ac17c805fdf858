//! Fading: attenuates gradients under randomly placed mask patches.

use did_compute::GradientField;
use did_core::Image;
use rand::{Rng, RngCore};
use tracing::{debug, info};

use crate::OpsResult;
use crate::degradation::{GradientDegradation, ModifyReport, check_fields};
use crate::noise::patch_params;
use crate::patches::{coverage, placement_probability};

/// Fades the image under randomly placed mask patches.
///
/// Same placement model as [`crate::NoiseGradients`], but patches stay
/// inside the image and dark mask pixels attenuate the gradients instead
/// of replacing them.
#[derive(Debug, Clone, Default)]
pub struct FadeGradients {
    /// Expected patch area per image pixel.
    pub density: Option<f32>,
    /// Attenuation of fully dark mask pixels, `0` (none) to `1` (full).
    pub strength: Option<f32>,
    /// Mask patches.
    pub source: Option<Vec<Image>>,
}

impl FadeGradients {
    pub const NAME: &'static str = "fade-gradients";

    pub fn new(density: f32, strength: f32, source: Vec<Image>) -> Self {
        Self {
            density: Some(density),
            strength: Some(strength),
            source: Some(source),
        }
    }
}

impl GradientDegradation for FadeGradients {
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
        debug!(patches = n, proba, "fade placement probability");

        let (w, h) = (image.width() as i64, image.height() as i64);
        let mut count = 0;
        for source in params.patches {
            let mut mask = source.clone();
            let mut i = 0;
            while rng.gen_range(0.0f32..1.0) < proba && i < n {
                if i > 0 {
                    mask.turn_left();
                }
                let (pw, ph) = (mask.width() as i64, mask.height() as i64);
                let px = if w > pw { rng.gen_range(0..w - pw) } else { 0 };
                let py = if h > ph { rng.gen_range(0..h - ph) } else { 0 };
                for (channel, field) in fields.iter_mut().enumerate() {
                    GradientField::from_image(&mask, channel)?
                        .multiply_gradient(image, field, px, py, params.strength)?;
                }
                count += 1;
                i += 1;
            }
        }

        let coverage = coverage(count, params.patches, image);
        info!(patches = count, coverage, "fade patches applied");
        Ok(ModifyReport {
            patches: count,
            coverage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use did_core::CHANNELS;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn stripes(w: u32, h: u32) -> Image {
        Image::from_fn(w, h, |x, _| if x % 2 == 0 { [0.4; 3] } else { [0.9; 3] }).unwrap()
    }

    fn magnitude(fields: &[GradientField]) -> f32 {
        fields
            .iter()
            .flat_map(|f| f.gx().iter().zip(f.gy()))
            .map(|(x, y)| x.abs() + y.abs())
            .sum()
    }

    #[test]
    fn test_fade_only_attenuates() {
        let image = stripes(60, 60);
        let mut fields: Vec<_> = (0..CHANNELS)
            .map(|c| GradientField::from_image(&image, c).unwrap())
            .collect();
        let before = magnitude(&fields);
        let black = Image::new(25, 25).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let report = FadeGradients::new(100.0, 0.8, vec![black; 3])
            .modify(&mut fields, &image, &mut rng)
            .unwrap();
        assert!(report.patches > 0);
        assert!(magnitude(&fields) < before);
    }

    #[test]
    fn test_white_mask_is_noop() {
        let image = stripes(40, 40);
        let mut fields: Vec<_> = (0..CHANNELS)
            .map(|c| GradientField::from_image(&image, c).unwrap())
            .collect();
        let before = fields.clone();
        let white = Image::from_fn(22, 22, |_, _| [1.0; 3]).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        FadeGradients::new(100.0, 1.0, vec![white])
            .modify(&mut fields, &image, &mut rng)
            .unwrap();
        assert_eq!(fields, before);
    }

    #[test]
    fn test_missing_strength() {
        let driver = FadeGradients {
            strength: None,
            ..FadeGradients::new(1.0, 1.0, vec![Image::new(4, 4).unwrap()])
        };
        let err = driver.validate().unwrap_err();
        assert!(err.to_string().contains("fade-gradients: requires parameter 'strength'"));
    }
}
