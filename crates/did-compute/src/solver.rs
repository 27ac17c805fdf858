//! Relaxation solver kernels.
//!
//! Reconstruction applies four directional sweeps in round-robin order,
//! `step % 4` selecting the sweep:
//!
//! ```text
//! 0  LR  val[x,y] = (val[x,y] + val[x-1,y] + gx[x-1,y]) / 2
//! 1  TB  val[x,y] = (val[x,y] + val[x,y-1] + gy[x,y-1]) / 2
//! 2  RL  val[x,y] = (val[x,y] + val[x+1,y] - gx[x,y])   / 2
//! 3  BT  val[x,y] = (val[x,y] + val[x,y+1] - gy[x,y])   / 2
//! ```
//!
//! Each sweep only touches indices `BORDER..dim - BORDER` on both axes.
//! Within a row (LR/RL) or column (TB/BT) the update is a sequential
//! recurrence; different rows (or columns) are independent, which is what
//! the parallel strategies exploit.
//!
//! The functions here are the only implementation of the update rule;
//! every strategy goes through [`sweep_line`].

use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

/// Width of the unprocessed frame on every side.
pub const BORDER: usize = 2;

/// Forward update: relax `val` toward `prev + grad`.
#[inline(always)]
pub fn relax_forward(val: f32, prev: f32, grad: f32) -> f32 {
    (val + prev + grad) / 2.0
}

/// Backward update: relax `val` toward `next - grad`.
#[inline(always)]
pub fn relax_backward(val: f32, next: f32, grad: f32) -> f32 {
    (val + next - grad) / 2.0
}

/// One directional pass over the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sweep {
    /// Left to right along each row.
    LeftRight,
    /// Top to bottom along each column.
    TopBottom,
    /// Right to left along each row.
    RightLeft,
    /// Bottom to top along each column.
    BottomTop,
}

impl Sweep {
    /// Round-robin order of the sweeps.
    pub const ORDER: [Sweep; 4] = [
        Sweep::LeftRight,
        Sweep::TopBottom,
        Sweep::RightLeft,
        Sweep::BottomTop,
    ];

    /// Sweep executed at `step`.
    #[inline]
    pub fn for_step(step: usize) -> Self {
        Self::ORDER[step % 4]
    }

    /// Code of the sweep as used by the device kernel (`step % 4`).
    #[inline]
    pub fn code(&self) -> u32 {
        match self {
            Self::LeftRight => 0,
            Self::TopBottom => 1,
            Self::RightLeft => 2,
            Self::BottomTop => 3,
        }
    }

    /// `true` for sweeps that run along rows.
    #[inline]
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }

    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LeftRight => "LR",
            Self::TopBottom => "TB",
            Self::RightLeft => "RL",
            Self::BottomTop => "BT",
        }
    }

    /// Lines processed by this sweep: interior rows for horizontal sweeps,
    /// interior columns for vertical ones. Empty for rasters too small to
    /// have an interior.
    #[inline]
    pub fn lines(&self, width: usize, height: usize) -> Range<usize> {
        let dim = if self.is_horizontal() { height } else { width };
        interior(dim)
    }

    /// Number of lines, i.e. the work size of one device dispatch.
    #[inline]
    pub fn line_count(&self, width: usize, height: usize) -> usize {
        self.lines(width, height).len()
    }
}

#[inline]
fn interior(dim: usize) -> Range<usize> {
    BORDER..dim.saturating_sub(BORDER).max(BORDER)
}

/// Storage the sweep kernels read and write values through.
pub trait Cells {
    /// Reads the value at linear index `i`.
    fn load(&self, i: usize) -> f32;
    /// Writes the value at linear index `i`.
    fn store(&mut self, i: usize, v: f32);
}

impl Cells for [f32] {
    #[inline(always)]
    fn load(&self, i: usize) -> f32 {
        self[i]
    }

    #[inline(always)]
    fn store(&mut self, i: usize, v: f32) {
        self[i] = v;
    }
}

impl Cells for &SharedCells {
    #[inline(always)]
    fn load(&self, i: usize) -> f32 {
        SharedCells::load(self, i)
    }

    #[inline(always)]
    fn store(&mut self, i: usize, v: f32) {
        SharedCells::store(self, i, v)
    }
}

/// Value raster that several threads may update concurrently.
///
/// Cells are `f32` bit patterns in relaxed atomics. Writers must own
/// disjoint lines during a step; visibility across steps comes from the
/// synchronization between steps (the step barrier, or the end of a rayon
/// dispatch), not from the atomics themselves.
pub struct SharedCells {
    cells: Box<[AtomicU32]>,
}

impl SharedCells {
    /// Copies `data` into shared cells.
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            cells: data.iter().map(|v| AtomicU32::new(v.to_bits())).collect(),
        }
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// `true` if there are no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reads cell `i`.
    #[inline(always)]
    pub fn load(&self, i: usize) -> f32 {
        f32::from_bits(self.cells[i].load(Ordering::Relaxed))
    }

    /// Writes cell `i`.
    #[inline(always)]
    pub fn store(&self, i: usize, v: f32) {
        self.cells[i].store(v.to_bits(), Ordering::Relaxed)
    }

    /// Copies the cells into `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` has a different length.
    pub fn copy_to(&self, out: &mut [f32]) {
        assert_eq!(out.len(), self.cells.len(), "SharedCells::copy_to length");
        for (dst, cell) in out.iter_mut().zip(self.cells.iter()) {
            *dst = f32::from_bits(cell.load(Ordering::Relaxed));
        }
    }

    /// Copies the cells into a new vector.
    pub fn to_vec(&self) -> Vec<f32> {
        self.cells
            .iter()
            .map(|c| f32::from_bits(c.load(Ordering::Relaxed)))
            .collect()
    }
}

impl std::fmt::Debug for SharedCells {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCells").field("len", &self.cells.len()).finish()
    }
}

/// Runs `sweep` over one row (horizontal sweeps) or column (vertical
/// sweeps) of a `width x height` raster.
///
/// `gx`/`gy` are row-major gradient rasters, `val` the values being
/// relaxed. `line` must come from [`Sweep::lines`].
#[inline]
pub fn sweep_line<C: Cells + ?Sized>(
    sweep: Sweep,
    line: usize,
    width: usize,
    height: usize,
    gx: &[f32],
    gy: &[f32],
    val: &mut C,
) {
    match sweep {
        Sweep::LeftRight => {
            let row = line * width;
            for x in interior(width) {
                let i = row + x;
                let v = relax_forward(val.load(i), val.load(i - 1), gx[i - 1]);
                val.store(i, v);
            }
        }
        Sweep::RightLeft => {
            let row = line * width;
            for x in interior(width).rev() {
                let i = row + x;
                let v = relax_backward(val.load(i), val.load(i + 1), gx[i]);
                val.store(i, v);
            }
        }
        Sweep::TopBottom => {
            for y in interior(height) {
                let i = y * width + line;
                let v = relax_forward(val.load(i), val.load(i - width), gy[i - width]);
                val.store(i, v);
            }
        }
        Sweep::BottomTop => {
            for y in interior(height).rev() {
                let i = y * width + line;
                let v = relax_backward(val.load(i), val.load(i + width), gy[i]);
                val.store(i, v);
            }
        }
    }
}

/// Runs one full step (all lines of `sweep`) on a plain value slice.
pub fn sweep_all(sweep: Sweep, width: usize, height: usize, gx: &[f32], gy: &[f32], val: &mut [f32]) {
    for line in sweep.lines(width, height) {
        sweep_line(sweep, line, width, height, gx, gy, val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GradientField;
    use did_core::Raster;

    #[test]
    fn test_round_robin_order() {
        let names: Vec<_> = (0..6).map(|s| Sweep::for_step(s).name()).collect();
        assert_eq!(names, ["LR", "TB", "RL", "BT", "LR", "TB"]);
        for step in 0..8 {
            assert_eq!(Sweep::for_step(step).code() as usize, step % 4);
        }
    }

    #[test]
    fn test_interior_lines() {
        assert_eq!(Sweep::LeftRight.lines(7, 10), 2..8);
        assert_eq!(Sweep::TopBottom.lines(7, 10), 2..5);
        assert!(Sweep::LeftRight.lines(7, 4).is_empty());
        assert!(Sweep::TopBottom.lines(1, 7).is_empty());
        assert_eq!(Sweep::BottomTop.line_count(7, 7), 3);
    }

    #[test]
    fn test_ramp_lr_update() {
        let raster = Raster::from_fn(10, 10, |x, y| (x + y) as f32).unwrap();
        let mut field = GradientField::from_raster(&raster);
        let (w, h) = (10, 10);
        let (val, gx, gy) = field.split_mut();
        // first update of row 2: (4 + 3 + 1) / 2
        let i = 2 * w + 2;
        assert_eq!(relax_forward(val[i], val[i - 1], gx[i - 1]), 4.0);
        sweep_line(Sweep::LeftRight, 2, w, h, gx, gy, val);
        assert_eq!(field.value(2, 2), 4.0);
        // a consistent field is a fixed point of every sweep
        assert_eq!(field.values(), raster.as_slice());
    }

    #[test]
    fn test_sweeps_leave_border() {
        let raster = Raster::from_fn(9, 8, |x, y| ((x * 5 + y * 3) % 7) as f32).unwrap();
        let mut field = GradientField::from_raster(&raster);
        for g in field.gx_mut() {
            *g += 0.3;
        }
        for g in field.gy_mut() {
            *g -= 0.2;
        }
        let (w, h) = (9usize, 8usize);
        for step in 0..12 {
            let (val, gx, gy) = field.split_mut();
            sweep_all(Sweep::for_step(step), w, h, gx, gy, val);
        }
        for y in 0..h {
            for x in 0..w {
                let border = x < BORDER || x >= w - BORDER || y < BORDER || y >= h - BORDER;
                if border {
                    assert_eq!(field.value(x as u32, y as u32), raster.get(x as i64, y as i64));
                }
            }
        }
    }

    #[test]
    fn test_shared_cells_match_slice() {
        let raster = Raster::from_fn(8, 8, |x, y| ((x * 3 + y) % 5) as f32).unwrap();
        let mut field = GradientField::from_raster(&raster);
        field.gx_mut()[3 * 8 + 3] = 2.0;
        let shared = SharedCells::from_slice(field.values());
        let (w, h) = (8, 8);
        for step in 0..4 {
            let sweep = Sweep::for_step(step);
            for line in sweep.lines(w, h) {
                let mut cells = &shared;
                sweep_line(sweep, line, w, h, field.gx(), field.gy(), &mut cells);
            }
            let (val, gx, gy) = field.split_mut();
            sweep_all(sweep, w, h, gx, gy, val);
        }
        assert_eq!(shared.to_vec(), field.values());
    }
}
