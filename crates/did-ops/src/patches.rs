//! Patch placement model shared by the random drivers.

use did_core::Image;

/// Margin in pixels not counted in a patch's effective surface.
pub const PATCH_MARGIN: i64 = 20;

/// Mean effective surface of `patches`: `mean(max(0, w - 20) * max(0, h - 20))`.
pub fn mean_patch_surface(patches: &[Image]) -> f64 {
    if patches.is_empty() {
        return 0.0;
    }
    let total: i64 = patches
        .iter()
        .map(|p| {
            let (w, h) = (p.width() as i64, p.height() as i64);
            (w - PATCH_MARGIN).max(0) * (h - PATCH_MARGIN).max(0)
        })
        .sum();
    total as f64 / patches.len() as f64
}

/// Probability of placing one more copy of a patch.
///
/// With `N` patches of mean surface `s` on an image of area `A`,
/// `b = s / A` and `p = 1 - 1 / (density / (N * b) + 1)`. Patches with no
/// effective surface give `p = 1` for any positive density.
pub fn placement_probability(density: f32, patches: &[Image], image: &Image) -> f32 {
    let n = patches.len() as f64;
    let area = image.width() as f64 * image.height() as f64;
    let b = mean_patch_surface(patches) / area;
    if n == 0.0 || density <= 0.0 {
        return 0.0;
    }
    if b <= 0.0 {
        return 1.0;
    }
    (1.0 - 1.0 / (density as f64 / (n * b) + 1.0)) as f32
}

/// Patch area per image pixel after placing `count` patches.
pub fn coverage(count: usize, patches: &[Image], image: &Image) -> f32 {
    let area = image.width() as f64 * image.height() as f64;
    (count as f64 * mean_patch_surface(patches) / area) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn blank(w: u32, h: u32) -> Image {
        Image::new(w, h).unwrap()
    }

    #[test]
    fn test_mean_surface_ignores_margin() {
        let patches = [blank(30, 40), blank(10, 50)];
        // (10 * 20 + 0) / 2
        assert_eq!(mean_patch_surface(&patches), 100.0);
    }

    #[test]
    fn test_probability_formula() {
        let patches = [blank(30, 30), blank(30, 30)];
        let image = blank(100, 100);
        // b = 100 / 10000, N * b = 0.02, density 0.02 -> 1 - 1/2
        assert_relative_eq!(placement_probability(0.02, &patches, &image), 0.5, epsilon = 1e-6);
        assert!(placement_probability(10.0, &patches, &image) > 0.99);
        assert_eq!(placement_probability(0.0, &patches, &image), 0.0);
    }

    #[test]
    fn test_degenerate_patches() {
        let image = blank(100, 100);
        assert_eq!(mean_patch_surface(&[blank(5, 5)]), 0.0);
        assert_eq!(placement_probability(1.0, &[blank(5, 5)], &image), 1.0);
        assert_eq!(placement_probability(1.0, &[blank(12, 8), blank(5, 60)], &image), 1.0);
        assert_eq!(placement_probability(1.0, &[], &image), 0.0);
    }

    #[test]
    fn test_coverage() {
        let patches = [blank(30, 30)];
        assert_relative_eq!(coverage(4, &patches, &blank(20, 20)), 1.0);
    }
}
