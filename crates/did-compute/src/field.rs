//! Gradient field: a value raster with its forward-difference gradients.
//!
//! For a field of size `w x h`, stored row-major like [`Raster`]:
//!
//! ```text
//! gx[x, y] = val[x + 1, y] - val[x, y]     for x < w - 1, y < h - 1
//! gy[x, y] = val[x, y + 1] - val[x, y]     for x < w - 1, y < h - 1
//! ```
//!
//! The last row and column of `gx`/`gy` are zero and never read by the
//! solver. Right after construction the gradients match the values
//! exactly. Editing operations (see [`crate::edit`]) rewrite `gx`/`gy`
//! without touching `val`, which leaves an over-determined field that the
//! relaxation solver reconciles.

use rayon::prelude::*;

use did_core::{CHANNELS, Error, Image, Raster};

use crate::edit::PASTE_BLACK_LEVEL;
use crate::{ComputeError, ComputeResult};

/// One image channel with its x/y gradient rasters.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientField {
    width: u32,
    height: u32,
    val: Vec<f32>,
    gx: Vec<f32>,
    gy: Vec<f32>,
}

impl GradientField {
    /// Builds a field from a copy of the raster's samples.
    pub fn from_raster(raster: &Raster) -> Self {
        let (width, height) = raster.dimensions();
        let val = raster.as_slice().to_vec();
        let (gx, gy) = forward_differences(width as usize, height as usize, &val);
        Self { width, height, val, gx, gy }
    }

    /// Builds a field from one channel of an image.
    pub fn from_image(image: &Image, channel: usize) -> ComputeResult<Self> {
        Ok(Self::from_raster(image.channel(channel)?))
    }

    /// Assembles a field from explicit buffers.
    ///
    /// The gradients are taken as given; they need not match `val`.
    pub fn from_parts(
        width: u32,
        height: u32,
        val: Vec<f32>,
        gx: Vec<f32>,
        gy: Vec<f32>,
    ) -> ComputeResult<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_dimensions(width, height, "zero-sized field").into());
        }
        let expected = width as usize * height as usize;
        for buf in [&val, &gx, &gy] {
            if buf.len() != expected {
                return Err(ComputeError::BufferSizeMismatch {
                    expected,
                    actual: buf.len(),
                });
            }
        }
        Ok(Self { width, height, val, gx, gy })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Row-major values.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.val
    }

    /// Mutable row-major values.
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.val
    }

    /// Row-major x gradients.
    #[inline]
    pub fn gx(&self) -> &[f32] {
        &self.gx
    }

    /// Row-major y gradients.
    #[inline]
    pub fn gy(&self) -> &[f32] {
        &self.gy
    }

    /// Mutable x gradients.
    #[inline]
    pub fn gx_mut(&mut self) -> &mut [f32] {
        &mut self.gx
    }

    /// Mutable y gradients.
    #[inline]
    pub fn gy_mut(&mut self) -> &mut [f32] {
        &mut self.gy
    }

    /// Borrows values and both gradients at once, values mutably.
    #[inline]
    pub fn split_mut(&mut self) -> (&mut [f32], &[f32], &[f32]) {
        (&mut self.val, &self.gx, &self.gy)
    }

    #[inline]
    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the field.
    #[inline]
    pub fn value(&self, x: u32, y: u32) -> f32 {
        self.val[self.index(x, y)]
    }

    /// `(gx, gy)` at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the field.
    #[inline]
    pub fn gradient(&self, x: u32, y: u32) -> (f32, f32) {
        let i = self.index(x, y);
        (self.gx[i], self.gy[i])
    }

    /// Replaces all values, e.g. after a device read-back.
    pub fn set_values(&mut self, data: &[f32]) -> ComputeResult<()> {
        if data.len() != self.val.len() {
            return Err(ComputeError::BufferSizeMismatch {
                expected: self.val.len(),
                actual: data.len(),
            });
        }
        self.val.copy_from_slice(data);
        Ok(())
    }

    /// Sum of absolute differences between the stored gradients and the
    /// finite differences of the current values.
    ///
    /// Diagnostic only; the solver never uses it as a stopping criterion.
    pub fn error(&self) -> f32 {
        let (w, h) = (self.width as usize, self.height as usize);
        if w < 2 || h < 2 {
            return 0.0;
        }
        let err: f64 = (0..h - 1)
            .into_par_iter()
            .map(|y| {
                let mut row = 0.0f64;
                for x in 0..w - 1 {
                    let i = y * w + x;
                    row += (self.gx[i] - (self.val[i + 1] - self.val[i])).abs() as f64;
                    row += (self.gy[i] - (self.val[i + w] - self.val[i])).abs() as f64;
                }
                row
            })
            .sum();
        err as f32
    }

    /// Writes the values into `channel` of `target`.
    ///
    /// Pixels where the target is near-black in every channel are skipped.
    /// Returns the summed absolute difference between the previous content
    /// and the pasted values.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if the image size differs from the
    /// field, [`Error::ChannelOutOfRange`] for an invalid channel. Nothing
    /// is written in either case.
    pub fn paste_values(&self, target: &mut Image, channel: usize) -> ComputeResult<f32> {
        if target.dimensions() != self.dimensions() {
            return Err(Error::dimension_mismatch(self.dimensions(), target.dimensions()).into());
        }
        if channel >= CHANNELS {
            return Err(Error::ChannelOutOfRange {
                channel,
                channels: CHANNELS,
            }
            .into());
        }
        let mut diff = 0.0f64;
        for y in 0..self.height {
            for x in 0..self.width {
                if target.is_near_black(x as i64, y as i64, PASTE_BLACK_LEVEL) {
                    continue;
                }
                let v = self.value(x, y);
                diff += (target.get(channel, x as i64, y as i64) - v).abs() as f64;
                target.set(channel, x, y, v);
            }
        }
        Ok(diff as f32)
    }
}

fn forward_differences(w: usize, h: usize, val: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let mut gx = vec![0.0; w * h];
    let mut gy = vec![0.0; w * h];
    if w < 2 || h < 2 {
        return (gx, gy);
    }
    gx.par_chunks_mut(w)
        .zip(gy.par_chunks_mut(w))
        .enumerate()
        .take(h - 1)
        .for_each(|(y, (gx_row, gy_row))| {
            let row = &val[y * w..(y + 1) * w];
            let below = &val[(y + 1) * w..(y + 2) * w];
            for x in 0..w - 1 {
                gx_row[x] = row[x + 1] - row[x];
                gy_row[x] = below[x] - row[x];
            }
        });
    (gx, gy)
}
