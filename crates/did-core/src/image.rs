//! Three-channel images.
//!
//! An [`Image`] is a stack of [`CHANNELS`] equally sized [`Raster`]s plus a
//! [`ColorSpace`] tag per row. Samples are nominally in `[0, 1]`, with
//! `0` meaning black.
//!
//! # Usage
//!
//! ```rust
//! use did_core::Image;
//!
//! let mut img = Image::new(4, 4).unwrap();
//! img.set(1, 2, 3, 0.75);
//! assert_eq!(img.get(1, 2, 3), 0.75);
//! // out-of-range channel and coordinates are clamped
//! assert_eq!(img.get(9, 2, 9), img.get(2, 2, 3));
//! ```

use crate::{ColorSpace, Error, Raster, Result};

/// Number of channels of an [`Image`].
pub const CHANNELS: usize = 3;

/// Owned three-channel image with per-row color-space tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    channels: [Raster; CHANNELS],
    row_spaces: Vec<ColorSpace>,
}

impl Image {
    /// Creates a black RGB image.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let plane = Raster::new(width, height)?;
        Ok(Self {
            channels: [plane.clone(), plane.clone(), plane],
            row_spaces: vec![ColorSpace::Rgb; height as usize],
        })
    }

    /// Builds an RGB image from three planes of identical size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the planes differ in size.
    pub fn from_channels(channels: [Raster; CHANNELS]) -> Result<Self> {
        let dims = channels[0].dimensions();
        for plane in &channels[1..] {
            if plane.dimensions() != dims {
                return Err(Error::dimension_mismatch(dims, plane.dimensions()));
            }
        }
        Ok(Self {
            row_spaces: vec![ColorSpace::Rgb; dims.1 as usize],
            channels,
        })
    }

    /// Creates an RGB image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> [f32; CHANNELS],
    ) -> Result<Self> {
        let mut img = Self::new(width, height)?;
        for y in 0..height {
            for x in 0..width {
                let px = f(x, y);
                for (c, v) in px.into_iter().enumerate() {
                    img.channels[c].set(x, y, v);
                }
            }
        }
        Ok(img)
    }

    /// Creates a gray image where all three channels are equal.
    pub fn gray(raster: Raster) -> Self {
        let height = raster.height() as usize;
        Self {
            channels: [raster.clone(), raster.clone(), raster],
            row_spaces: vec![ColorSpace::Rgb; height],
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.channels[0].width()
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.channels[0].height()
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.channels[0].dimensions()
    }

    /// Reads a sample. Channel and coordinates are clamped.
    #[inline]
    pub fn get(&self, channel: usize, x: i64, y: i64) -> f32 {
        self.channels[channel.min(CHANNELS - 1)].get(x, y)
    }

    /// Writes a sample. Out-of-range channels or coordinates are ignored.
    #[inline]
    pub fn set(&mut self, channel: usize, x: u32, y: u32, value: f32) {
        if let Some(plane) = self.channels.get_mut(channel) {
            plane.set(x, y, value);
        }
    }

    /// All channels of a pixel, clamped to the image.
    #[inline]
    pub fn pixel(&self, x: i64, y: i64) -> [f32; CHANNELS] {
        [self.get(0, x, y), self.get(1, x, y), self.get(2, x, y)]
    }

    /// Returns `true` if every channel of the pixel is below `threshold`.
    ///
    /// Drivers use this as a visibility guard: near-black pixels are ink
    /// and are left untouched.
    #[inline]
    pub fn is_near_black(&self, x: i64, y: i64, threshold: f32) -> bool {
        self.pixel(x, y).iter().all(|&v| v < threshold)
    }

    /// Borrows one channel.
    pub fn channel(&self, channel: usize) -> Result<&Raster> {
        self.channels.get(channel).ok_or(Error::ChannelOutOfRange {
            channel,
            channels: CHANNELS,
        })
    }

    /// Mutably borrows one channel.
    pub fn channel_mut(&mut self, channel: usize) -> Result<&mut Raster> {
        self.channels.get_mut(channel).ok_or(Error::ChannelOutOfRange {
            channel,
            channels: CHANNELS,
        })
    }

    /// Rotates the image 90 degrees counter-clockwise in place.
    ///
    /// Row tags are reset to the tag of the first row, since rows become
    /// columns.
    pub fn turn_left(&mut self) {
        let space = self.row_spaces.first().copied().unwrap_or_default();
        for plane in &mut self.channels {
            *plane = plane.rotated_left();
        }
        self.row_spaces = vec![space; self.height() as usize];
    }

    /// Color space of row `y`, clamped to the image.
    pub fn color_space(&self, y: u32) -> ColorSpace {
        let row = (y as usize).min(self.row_spaces.len() - 1);
        self.row_spaces[row]
    }

    /// Tags row `y` with `space`. Out-of-range rows are ignored.
    pub fn set_color_space(&mut self, y: u32, space: ColorSpace) {
        if let Some(tag) = self.row_spaces.get_mut(y as usize) {
            *tag = space;
        }
    }

    /// Returns `true` if every row carries the same tag.
    pub fn has_uniform_color_space(&self) -> bool {
        self.row_spaces.windows(2).all(|w| w[0] == w[1])
    }
}
