//! Single-threaded reconstruction.

use std::time::Instant;

use tracing::trace;

use super::{Reconstructor, RunStats};
use crate::solver::{Sweep, sweep_all};
use crate::{ComputeResult, GradientField};

/// Applies the sweeps one after another on the calling thread.
///
/// This is the reference the other strategies are checked against.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialSolver;

impl SequentialSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Reconstructor for SequentialSolver {
    fn name(&self) -> &str {
        "single-core"
    }

    fn reconstruct(&self, field: &mut GradientField, steps: usize) -> ComputeResult<RunStats> {
        let start = Instant::now();
        let (w, h) = (field.width() as usize, field.height() as usize);
        trace!(width = w, height = h, steps, "sequential::reconstruct");

        let (val, gx, gy) = field.split_mut();
        for step in 0..steps {
            sweep_all(Sweep::for_step(step), w, h, gx, gy, val);
        }

        let stats = RunStats::new(self.name(), field, steps, Default::default(), start.elapsed());
        stats.log();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use did_core::Raster;

    #[test]
    fn test_zero_steps_is_identity() {
        let r = Raster::from_fn(8, 8, |x, y| (x * y) as f32).unwrap();
        let mut f = GradientField::from_raster(&r);
        f.gx_mut()[20] = 3.0;
        let stats = SequentialSolver::new().reconstruct(&mut f, 0).unwrap();
        assert_eq!(f.values(), r.as_slice());
        assert_eq!(stats.ops, 0);
    }

    #[test]
    fn test_converges_toward_consistent_solution() {
        // target B is consistent with the gradients; start from B plus an interior bump
        let b = Raster::from_fn(24, 24, |x, y| ((x + 2 * y) as f32 * 0.05).sin()).unwrap();
        let target = GradientField::from_raster(&b);
        let mut start = b.as_slice().to_vec();
        for y in 6..18 {
            for x in 6..18 {
                start[y * 24 + x] += 0.5;
            }
        }
        let mut f = GradientField::from_parts(
            24,
            24,
            start,
            target.gx().to_vec(),
            target.gy().to_vec(),
        )
        .unwrap();
        let distance = |f: &GradientField| -> f32 {
            f.values().iter().zip(b.as_slice()).map(|(a, b)| (a - b).abs()).sum()
        };
        let before = distance(&f);
        SequentialSolver::new().reconstruct(&mut f, 400).unwrap();
        let after = distance(&f);
        assert!(after < before * 0.5, "{after} !< {before} / 2");
        assert!(f.error() < 12.0 * 12.0 * 0.5);
    }

    #[test]
    fn test_stats() {
        let r = Raster::new(10, 6).unwrap();
        let mut f = GradientField::from_raster(&r);
        let stats = SequentialSolver::new().reconstruct(&mut f, 7).unwrap();
        assert_eq!(stats.work_mem, 240);
        assert_eq!(stats.task_mem, 32);
        assert_eq!(stats.ops, 70);
        assert!(stats.report_line().starts_with("result;single-core;240;32;70;"));
    }
}
