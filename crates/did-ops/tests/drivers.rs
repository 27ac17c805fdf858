//! Driver pipeline tests for did-ops.

use did_compute::{GradientField, PoolConfig, Strategy, enumerate_devices};
use did_core::{CHANNELS, Image};
use did_ops::{
    FadeGradients, GradientDegradation, ManualDegradation, ManualGradientModification, NoiseGradients,
    ReconstructionConfig, apply_degradation, compare_orientations,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Light page with a dark text line.
fn page() -> Image {
    Image::from_fn(48, 48, |x, y| {
        if (20..23).contains(&y) && (8..40).contains(&x) { [0.0; 3] } else { [0.85; 3] }
    })
    .unwrap()
}

fn blob(size: u32) -> Image {
    let c = size as f32 / 2.0;
    Image::from_fn(size, size, |x, y| {
        let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt() / c;
        [d.min(1.0); 3]
    })
    .unwrap()
}

fn config(strategy: Strategy) -> ReconstructionConfig {
    ReconstructionConfig::default()
        .with_iterations(60)
        .with_strategy(strategy)
}

#[test]
fn test_manual_patch_changes_page_but_not_ink() {
    let mut image = page();
    let original = image.clone();
    let driver = ManualGradientModification::new(vec![ManualDegradation::new(blob(16), 10, 4, 1.5)]);
    let mut rng = StdRng::seed_from_u64(0);
    let report = apply_degradation(&driver, &mut image, &config(Strategy::Sequential), &mut rng).unwrap();

    assert_eq!(report.modify.patches, 1);
    assert!(report.paste_diff.iter().all(|d| *d > 0.0));
    for x in 8..40 {
        for y in 20..23 {
            assert_eq!(image.pixel(x, y), [0.0; 3]);
        }
    }
    assert_ne!(image, original);
    assert_eq!(compare_orientations(&original, &original).unwrap(), 0.0);
    assert!(compare_orientations(&original, &image).unwrap() >= 0.0);
}

#[test]
fn test_strategies_give_same_degradation() {
    let driver = NoiseGradients::new(3.0, 1.2, vec![blob(24), blob(22)]);
    let host = enumerate_devices().len() - 1;
    let strategies = [
        Strategy::Sequential,
        Strategy::ThreadPool(PoolConfig::default().with_workers(4)),
        Strategy::Accelerator { device: host },
    ];

    let results: Vec<Image> = strategies
        .into_iter()
        .map(|s| {
            let mut image = page();
            let mut rng = StdRng::seed_from_u64(99);
            apply_degradation(&driver, &mut image, &config(s), &mut rng).unwrap();
            image
        })
        .collect();

    for other in &results[1..] {
        for c in 0..CHANNELS {
            let a = results[0].channel(c).unwrap().as_slice();
            let b = other.channel(c).unwrap().as_slice();
            for (x, y) in a.iter().zip(b) {
                assert!((x - y).abs() < 1e-5);
            }
        }
    }
}

#[test]
fn test_fade_runs_on_default_pool() {
    let mut image = page();
    let driver = FadeGradients::new(50.0, 0.9, vec![Image::new(30, 30).unwrap(); 2]);
    let mut rng = StdRng::seed_from_u64(4);
    let report = apply_degradation(&driver, &mut image, &config(Strategy::default()), &mut rng).unwrap();
    assert!(report.modify.patches > 0);
    assert_eq!(report.runs[0].strategy, "multi-cpu");
}

#[test]
fn test_fade_attenuates_text_edges() {
    let image = page();
    let mut fields: Vec<_> = (0..CHANNELS)
        .map(|c| GradientField::from_image(&image, c).unwrap())
        .collect();
    // row 19 sits right above the ink line, its gy holds the text edge
    let edge = |fields: &[GradientField]| -> f32 { (8..40).map(|x| fields[0].gradient(x, 19).1.abs()).sum() };
    let before = edge(&fields);

    let driver = FadeGradients::new(50.0, 0.9, vec![Image::new(30, 30).unwrap(); 2]);
    let mut rng = StdRng::seed_from_u64(4);
    let report = driver.modify(&mut fields, &image, &mut rng).unwrap();
    assert!(report.patches > 0);
    assert!(edge(&fields) < before);
}

#[test]
fn test_missing_density_fails_before_work() {
    let mut image = page();
    let before = image.clone();
    let driver = NoiseGradients {
        density: None,
        ..NoiseGradients::new(1.0, 1.0, vec![blob(20)])
    };
    let mut rng = StdRng::seed_from_u64(1);
    let err = apply_degradation(&driver, &mut image, &config(Strategy::Sequential), &mut rng).unwrap_err();
    assert!(err.is_parameter_error());
    assert_eq!(image, before);
}
