//! Dense single-channel sample buffer.
//!
//! A [`Raster`] holds one `f32` sample per pixel in **row-major** order:
//!
//! ```text
//! index = y * width + x
//! ```
//!
//! Reads through [`Raster::get`] are clamped to the nearest edge, so code
//! sampling around a pixel never needs its own boundary branches:
//!
//! ```rust
//! use did_core::Raster;
//!
//! let r = Raster::from_fn(3, 2, |x, y| (x + 10 * y) as f32).unwrap();
//! assert_eq!(r.get(-5, 0), 0.0);
//! assert_eq!(r.get(7, 9), 12.0);
//! ```

use crate::{Error, Result};

/// Single-channel image plane of `f32` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Raster {
    /// Creates a raster filled with zeros.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        })
    }

    /// Creates a raster from row-major samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if a dimension is zero or the
    /// buffer length differs from `width * height`.
    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} samples, got {}", expected, data.len()),
            ));
        }
        Ok(Self { width, height, data })
    }

    /// Creates a raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Result<Self> {
        check_dimensions(width, height)?;
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Ok(Self { width, height, data })
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

    /// Reads a sample, clamping the coordinates to the raster.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> f32 {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.data[cy * self.width as usize + cx]
    }

    /// Writes a sample. Coordinates outside the raster are ignored.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        if x < self.width && y < self.height {
            self.data[y as usize * self.width as usize + x as usize] = value;
        }
    }

    /// Row-major samples.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns a copy rotated 90 degrees counter-clockwise.
    ///
    /// Pixel `(x, y)` moves to `(y, width - 1 - x)`.
    pub fn rotated_left(&self) -> Self {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut data = vec![0.0; w * h];
        // new width is h
        for y in 0..h {
            for x in 0..w {
                let (tx, ty) = (y, w - 1 - x);
                data[ty * h + tx] = self.data[y * w + x];
            }
        }
        Self {
            width: self.height,
            height: self.width,
            data,
        }
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_dimensions(width, height, "zero-sized raster"));
    }
    Ok(())
}
