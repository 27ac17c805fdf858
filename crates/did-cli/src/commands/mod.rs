//! CLI command implementations

pub mod bench;
pub mod devices;

use anyhow::{Context, Result};
use did_core::Image;
use rand::Rng;

/// Light page with random dark text strokes.
pub fn synthetic_page(width: u32, height: u32, rng: &mut impl Rng) -> Result<Image> {
    let paper = 0.85 + rng.gen_range(0.0f32..0.1);
    let mut image = Image::from_fn(width, height, |_, _| [paper, paper * 0.97, paper * 0.9])
        .with_context(|| format!("Invalid page size: {width}x{height}"))?;

    let line_height = 24u32;
    let mut y = line_height;
    while y + 6 < height {
        let mut x = 16u32;
        while x + 12 < width {
            let word = rng.gen_range(3u32..10) * 6;
            for dx in 0..word.min(width - x - 12) {
                for dy in 0..rng.gen_range(3u32..6) {
                    for channel in 0..did_core::CHANNELS {
                        image.set(channel, x + dx, y + dy, 0.0);
                    }
                }
            }
            x += word + rng.gen_range(6u32..14);
        }
        y += line_height;
    }
    Ok(image)
}

/// Roughly circular stain with a noisy rim.
pub fn synthetic_stain(size: u32, rng: &mut impl Rng) -> Result<Image> {
    let c = size as f32 / 2.0;
    let rim: Vec<f32> = (0..size * size).map(|_| rng.gen_range(0.0f32..0.15)).collect();
    Image::from_fn(size, size, |x, y| {
        let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt() / c;
        let v = (0.3 + 0.7 * d + rim[(y * size + x) as usize]).min(1.0);
        [v, v * 0.9, v * 0.7]
    })
    .context("Invalid stain size")
}
