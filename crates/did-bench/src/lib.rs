//! Fixtures shared by the did benchmarks.

use did_compute::GradientField;
use did_core::{Image, Raster};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Noisy page channel with a band of edited x gradients across the middle.
pub fn edited_field(width: u32, height: u32, seed: u64) -> GradientField {
    let mut rng = StdRng::seed_from_u64(seed);
    let raster = Raster::from_fn(width, height, |_, _| 0.8 + rng.gen_range(-0.05f32..0.05))
        .unwrap_or_else(|e| panic!("bench fixture: {e}"));
    let mut field = GradientField::from_raster(&raster);
    let (w, h) = (width as usize, height as usize);
    for y in h / 3..2 * h / 3 {
        for x in w / 3..2 * w / 3 {
            field.gx_mut()[y * w + x] += 0.01;
        }
    }
    field
}

/// Uniform light page of the given size.
pub fn blank_page(width: u32, height: u32) -> Image {
    Image::from_fn(width, height, |_, _| [0.9; 3]).unwrap_or_else(|e| panic!("bench fixture: {e}"))
}

/// `count` radial stain patches of side `size`.
pub fn stains(size: u32, count: usize) -> Vec<Image> {
    let c = size as f32 / 2.0;
    let stain = Image::from_fn(size, size, |x, y| {
        let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt() / c;
        [d.min(1.0); 3]
    })
    .unwrap_or_else(|e| panic!("bench fixture: {e}"));
    vec![stain; count]
}
