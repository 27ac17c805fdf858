//! Gradient editing operations.
//!
//! Degradations are injected by compositing a patch's gradients into a
//! target field before reconstruction:
//!
//! - [`GradientField::paste_gradient`] - max-magnitude compositing
//! - [`GradientField::multiply_gradient`] - attenuation (fading)
//! - [`GradientField::weighted_orientation_difference`] - comparison metric
//!
//! Patch operations address the target with the patch's top-left corner at
//! `(x, y)`; offsets may be negative or run past the target, such pixels
//! are skipped. A guard image of the target's size is sampled at each
//! destination pixel: where all its channels are below
//! [`EDIT_BLACK_LEVEL`] the pixel counts as ink and is left alone.

use did_core::{Error, Image};

use crate::{ComputeResult, GradientField};

/// Per-channel threshold below which a guard pixel is treated as ink by
/// the editing operations.
pub const EDIT_BLACK_LEVEL: f32 = 0.025;

/// Per-channel threshold below which a target pixel is protected from
/// [`GradientField::paste_values`].
pub const PASTE_BLACK_LEVEL: f32 = EDIT_BLACK_LEVEL;

impl GradientField {
    /// Composites this patch's gradients, scaled by `boost`, into `target`.
    ///
    /// A destination pixel is overwritten only where the boosted patch
    /// gradient has a strictly larger squared magnitude than the gradient
    /// already there, so existing degradations are never weakened.
    /// Destination pixels outside `[0, w - 1) x [0, h - 1)` are skipped.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if `guard` and `target` differ in size.
    /// The target is untouched in that case.
    pub fn paste_gradient(
        &self,
        guard: &Image,
        target: &mut GradientField,
        x: i64,
        y: i64,
        boost: f32,
    ) -> ComputeResult<()> {
        check_guard(guard, target)?;
        let (tw, th) = (target.width() as i64, target.height() as i64);

        for dy in 0..self.height() {
            let py = y + dy as i64;
            if py < 0 || py >= th - 1 {
                continue;
            }
            for dx in 0..self.width() {
                let px = x + dx as i64;
                if px < 0 || px >= tw - 1 {
                    continue;
                }
                if guard.is_near_black(px, py, EDIT_BLACK_LEVEL) {
                    continue;
                }
                let (sx, sy) = self.gradient(dx, dy);
                let (sx, sy) = (sx * boost, sy * boost);
                let t = target.index(px as u32, py as u32);
                let existing = target.gx()[t] * target.gx()[t] + target.gy()[t] * target.gy()[t];
                if sx * sx + sy * sy > existing {
                    target.gx_mut()[t] = sx;
                    target.gy_mut()[t] = sy;
                }
            }
        }
        Ok(())
    }

    /// Attenuates `target`'s gradients using this patch's values as a mask.
    ///
    /// Each touched gradient is scaled by `1 - (1 - v) * boost` where `v`
    /// is the patch value: bright patch pixels (`v ~ 1`) leave the target
    /// unchanged, dark ones fade it proportionally to `boost`. Destination
    /// pixels outside `[1, w - 2) x [1, h - 2)` are skipped.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if `guard` and `target` differ in size.
    pub fn multiply_gradient(
        &self,
        guard: &Image,
        target: &mut GradientField,
        x: i64,
        y: i64,
        boost: f32,
    ) -> ComputeResult<()> {
        check_guard(guard, target)?;
        let (tw, th) = (target.width() as i64, target.height() as i64);

        for dy in 0..self.height() {
            let py = y + dy as i64;
            if py < 1 || py >= th - 2 {
                continue;
            }
            for dx in 0..self.width() {
                let px = x + dx as i64;
                if px < 1 || px >= tw - 2 {
                    continue;
                }
                if guard.is_near_black(px, py, EDIT_BLACK_LEVEL) {
                    continue;
                }
                let factor = 1.0 - (1.0 - self.value(dx, dy)) * boost;
                let t = target.index(px as u32, py as u32);
                target.gx_mut()[t] *= factor;
                target.gy_mut()[t] *= factor;
            }
        }
        Ok(())
    }

    /// Mean over all pixels of `(gx * o.gy - gy * o.gx)^2 / 2`.
    ///
    /// Zero where the two gradient fields are parallel everywhere, zero
    /// vectors included; grows with the sine of the angle between them
    /// weighted by both magnitudes.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if the fields differ in size.
    pub fn weighted_orientation_difference(&self, other: &GradientField) -> ComputeResult<f32> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::dimension_mismatch(self.dimensions(), other.dimensions()).into());
        }
        let sum: f64 = self
            .gx()
            .iter()
            .zip(self.gy())
            .zip(other.gx().iter().zip(other.gy()))
            .map(|((&ax, &ay), (&bx, &by))| {
                let d = (ax * by - ay * bx) as f64;
                d * d / 2.0
            })
            .sum();
        let pixels = self.width() as f64 * self.height() as f64;
        Ok((sum / pixels) as f32)
    }
}

fn check_guard(guard: &Image, target: &GradientField) -> ComputeResult<()> {
    if guard.dimensions() != target.dimensions() {
        return Err(Error::dimension_mismatch(target.dimensions(), guard.dimensions()).into());
    }
    Ok(())
}
