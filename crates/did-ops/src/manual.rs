//! Manual gradient modification: pastes given patches at given positions.

use did_compute::GradientField;
use did_core::{Error, Image};
use rand::RngCore;
use tracing::debug;

use crate::OpsResult;
use crate::degradation::{GradientDegradation, ModifyReport, check_fields};

/// One explicitly placed patch.
#[derive(Debug, Clone, Default)]
pub struct ManualDegradation {
    pub patch: Option<Image>,
    /// Left edge in image pixels, may be negative.
    pub x: Option<i64>,
    /// Top edge in image pixels, may be negative.
    pub y: Option<i64>,
    /// Gradient boost.
    pub strength: Option<f32>,
}

impl ManualDegradation {
    pub fn new(patch: Image, x: i64, y: i64, strength: f32) -> Self {
        Self {
            patch: Some(patch),
            x: Some(x),
            y: Some(y),
            strength: Some(strength),
        }
    }
}

/// Pastes a list of patches at fixed positions.
#[derive(Debug, Clone, Default)]
pub struct ManualGradientModification {
    pub degradations: Vec<ManualDegradation>,
}

impl ManualGradientModification {
    pub const NAME: &'static str = "manual-gradient-modification";

    pub fn new(degradations: Vec<ManualDegradation>) -> Self {
        Self { degradations }
    }
}

fn require<T: Copy>(value: Option<T>, name: &str) -> OpsResult<T> {
    value.ok_or_else(|| Error::missing_parameter(ManualGradientModification::NAME, name).into())
}

impl GradientDegradation for ManualGradientModification {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self) -> OpsResult<()> {
        for d in &self.degradations {
            require(d.strength, "strength")?;
            require(d.x, "x")?;
            require(d.y, "y")?;
            if d.patch.is_none() {
                return Err(Error::missing_parameter(Self::NAME, "file").into());
            }
        }
        Ok(())
    }

    fn modify(
        &self,
        fields: &mut [GradientField],
        image: &Image,
        _rng: &mut dyn RngCore,
    ) -> OpsResult<ModifyReport> {
        self.validate()?;
        check_fields(Self::NAME, fields, image)?;

        let mut surface = 0.0f64;
        for d in &self.degradations {
            let (Some(patch), Some(x), Some(y), Some(strength)) = (&d.patch, d.x, d.y, d.strength)
            else {
                continue;
            };
            debug!(x, y, strength, width = patch.width(), height = patch.height(), "manual patch");
            for (channel, field) in fields.iter_mut().enumerate() {
                GradientField::from_image(patch, channel)?.paste_gradient(image, field, x, y, strength)?;
            }
            surface += patch.width() as f64 * patch.height() as f64;
        }

        let area = image.width() as f64 * image.height() as f64;
        Ok(ModifyReport {
            patches: self.degradations.len(),
            coverage: (surface / area) as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use did_core::CHANNELS;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_pastes_at_position() {
        let image = Image::from_fn(20, 20, |_, _| [0.8; 3]).unwrap();
        let mut fields: Vec<_> = (0..CHANNELS)
            .map(|c| GradientField::from_image(&image, c).unwrap())
            .collect();
        let patch = Image::from_fn(4, 4, |x, _| [x as f32 * 0.25; 3]).unwrap();
        let driver = ManualGradientModification::new(vec![ManualDegradation::new(patch, 6, 9, 2.0)]);
        let mut rng = StdRng::seed_from_u64(0);
        let report = driver.modify(&mut fields, &image, &mut rng).unwrap();
        assert_eq!(report.patches, 1);
        for f in &fields {
            assert_eq!(f.gradient(6, 9), (0.5, 0.0));
            assert_eq!(f.gradient(8, 11), (0.5, 0.0));
            assert_eq!(f.gradient(5, 9), (0.0, 0.0));
        }
    }

    #[test]
    fn test_missing_coordinate() {
        let driver = ManualGradientModification::new(vec![ManualDegradation {
            y: None,
            ..ManualDegradation::new(Image::new(3, 3).unwrap(), 0, 0, 1.0)
        }]);
        let err = driver.validate().unwrap_err();
        assert!(err.is_parameter_error());
        assert!(err.to_string().contains("'y'"));
    }
}
