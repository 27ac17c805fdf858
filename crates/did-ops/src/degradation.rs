//! Gradient degradation pipeline.
//!
//! ```text
//! image ──> 3 x GradientField ──> driver.modify() ──> reconstruct ──> paste back
//! ```
//!
//! A driver only edits gradients. Building the fields, reconstructing them
//! and writing the values back into the image is shared by all drivers and
//! done by [`apply_degradation`].

use did_compute::{GradientField, RunStats, reconstruct};
use did_core::{CHANNELS, Error, Image};
use rand::RngCore;
use tracing::{debug, info};

use crate::{OpsResult, ReconstructionConfig};

/// Outcome of a driver's gradient edit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModifyReport {
    /// Patches composited into the fields.
    pub patches: usize,
    /// Patch area per image pixel, `patches * mean_surface / image_area`.
    pub coverage: f32,
}

/// Outcome of [`apply_degradation`].
#[derive(Debug, Clone)]
pub struct DegradationReport {
    /// Driver name.
    pub driver: String,
    pub modify: ModifyReport,
    /// One run per channel.
    pub runs: Vec<RunStats>,
    /// Summed absolute change written into each channel.
    pub paste_diff: [f32; CHANNELS],
}

/// A driver that edits the gradient fields of an image.
pub trait GradientDegradation {
    /// Command name used in logs and parameter errors.
    fn name(&self) -> &str;

    /// Checks required parameters. Called before any field is built.
    fn validate(&self) -> OpsResult<()>;

    /// Edits `fields` (one per channel of `image`). `image` is the guard
    /// for near-black pixels.
    fn modify(
        &self,
        fields: &mut [GradientField],
        image: &Image,
        rng: &mut dyn RngCore,
    ) -> OpsResult<ModifyReport>;
}

/// Checks that a driver received one field per channel of `image`.
pub(crate) fn check_fields(command: &str, fields: &[GradientField], image: &Image) -> OpsResult<()> {
    if fields.len() != CHANNELS {
        return Err(Error::invalid_parameter(
            command,
            "fields",
            format!("expected {CHANNELS} fields, got {}", fields.len()),
        )
        .into());
    }
    if let Some(f) = fields.iter().find(|f| f.dimensions() != image.dimensions()) {
        return Err(Error::dimension_mismatch(f.dimensions(), image.dimensions()).into());
    }
    Ok(())
}

/// Runs `driver` on `image`: edit gradients, reconstruct every channel,
/// paste the values back.
///
/// Parameter errors are reported before the image is touched. On a
/// reconstruction error the image is left unchanged.
pub fn apply_degradation(
    driver: &dyn GradientDegradation,
    image: &mut Image,
    config: &ReconstructionConfig,
    rng: &mut dyn RngCore,
) -> OpsResult<DegradationReport> {
    driver.validate()?;
    debug!(driver = driver.name(), width = image.width(), height = image.height(), "building gradient fields");

    let mut fields = (0..CHANNELS)
        .map(|c| GradientField::from_image(image, c))
        .collect::<Result<Vec<_>, _>>()?;

    let modify = driver.modify(&mut fields, image, rng)?;
    info!(
        driver = driver.name(),
        patches = modify.patches,
        coverage = modify.coverage,
        "gradients modified"
    );

    let mut runs = Vec::with_capacity(CHANNELS);
    for (channel, field) in fields.iter_mut().enumerate() {
        debug!(channel, steps = config.iterations, strategy = config.strategy.name(), "reconstructing");
        runs.push(reconstruct(field, config.iterations, &config.strategy)?);
    }

    let mut paste_diff = [0.0; CHANNELS];
    for (channel, field) in fields.iter().enumerate() {
        paste_diff[channel] = field.paste_values(image, channel)?;
    }

    Ok(DegradationReport {
        driver: driver.name().to_string(),
        modify,
        runs,
        paste_diff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OpsError;
    use did_compute::Strategy;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Adds a constant to every x gradient of the first channel.
    struct Tilt(Option<f32>);

    impl GradientDegradation for Tilt {
        fn name(&self) -> &str {
            "tilt"
        }

        fn validate(&self) -> OpsResult<()> {
            self.0.map(|_| ()).ok_or_else(|| Error::missing_parameter("tilt", "amount").into())
        }

        fn modify(
            &self,
            fields: &mut [GradientField],
            image: &Image,
            _rng: &mut dyn RngCore,
        ) -> OpsResult<ModifyReport> {
            check_fields(self.name(), fields, image)?;
            let amount = self.0.unwrap_or_default();
            for g in fields[0].gx_mut() {
                *g += amount;
            }
            Ok(ModifyReport { patches: 1, coverage: 1.0 })
        }
    }

    fn gray(w: u32, h: u32) -> Image {
        Image::from_fn(w, h, |_, _| [0.5; 3]).unwrap()
    }

    #[test]
    fn test_missing_parameter_leaves_image() {
        let mut image = gray(10, 10);
        let before = image.clone();
        let mut rng = StdRng::seed_from_u64(1);
        let err = apply_degradation(&Tilt(None), &mut image, &ReconstructionConfig::default(), &mut rng)
            .unwrap_err();
        assert!(err.is_parameter_error());
        assert!(matches!(err, OpsError::Core(Error::MissingParameter { .. })));
        assert_eq!(image, before);
    }

    #[test]
    fn test_only_edited_channel_changes() {
        let mut image = gray(16, 16);
        let mut rng = StdRng::seed_from_u64(1);
        let config = ReconstructionConfig::default()
            .with_iterations(40)
            .with_strategy(Strategy::Sequential);
        let report = apply_degradation(&Tilt(Some(0.05)), &mut image, &config, &mut rng).unwrap();

        assert_eq!(report.driver, "tilt");
        assert_eq!(report.runs.len(), 3);
        assert!(report.paste_diff[0] > 0.0);
        assert_eq!(report.paste_diff[1], 0.0);
        assert_eq!(report.paste_diff[2], 0.0);
        // interior of channel 0 is now a rising ramp along x
        assert!(image.get(0, 12, 8) > image.get(0, 3, 8));
        assert_eq!(image.get(1, 12, 8), 0.5);
    }

    #[test]
    fn test_check_fields_counts_channels() {
        let image = gray(4, 4);
        let fields = vec![GradientField::from_image(&image, 0).unwrap()];
        assert!(check_fields("x", &fields, &image).unwrap_err().is_parameter_error());
    }
}
