//! WGSL source of the relaxation kernel.
//!
//! The wgpu device compiles it; the host device only resolves the entry
//! point and runs the equivalent Rust sweep.

/// Entry point of [`RECONSTRUCT`].
pub const RECONSTRUCT_ENTRY: &str = "reconstruct";

/// One relaxation step. Lane `i` processes row (even steps) or column
/// (odd steps) `i + 2`.
pub const RECONSTRUCT: &str = r#"
struct Params {
    width: u32,
    height: u32,
    step: u32,
    _pad: u32,
}

@group(0) @binding(0) var<storage, read> gx: array<f32>;
@group(0) @binding(1) var<storage, read> gy: array<f32>;
@group(0) @binding(2) var<storage, read_write> val: array<f32>;
@group(0) @binding(3) var<uniform> params: Params;

@compute @workgroup_size(64)
fn reconstruct(@builtin(global_invocation_id) id: vec3<u32>) {
    let w = i32(params.width);
    let h = i32(params.height);
    let line = i32(id.x) + 2;
    let mode = params.step % 4u;
    let horizontal = mode == 0u || mode == 2u;

    if horizontal && line >= h - 2 { return; }
    if !horizontal && line >= w - 2 { return; }

    switch mode {
        case 0u: {
            for (var x = 2; x < w - 2; x = x + 1) {
                let i = line * w + x;
                val[i] = (val[i] + val[i - 1] + gx[i - 1]) / 2.0;
            }
        }
        case 1u: {
            for (var y = 2; y < h - 2; y = y + 1) {
                let i = y * w + line;
                val[i] = (val[i] + val[i - w] + gy[i - w]) / 2.0;
            }
        }
        case 2u: {
            for (var x = w - 3; x >= 2; x = x - 1) {
                let i = line * w + x;
                val[i] = (val[i] + val[i + 1] - gx[i]) / 2.0;
            }
        }
        default: {
            for (var y = h - 3; y >= 2; y = y - 1) {
                let i = y * w + line;
                val[i] = (val[i] + val[i + w] - gy[i]) / 2.0;
            }
        }
    }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_point_declared() {
        assert!(RECONSTRUCT.contains(&format!("fn {RECONSTRUCT_ENTRY}(")));
        assert!(RECONSTRUCT.contains("@workgroup_size(64)"));
    }

    #[test]
    fn test_bindings() {
        for binding in 0..4 {
            assert!(RECONSTRUCT.contains(&format!("@binding({binding})")));
        }
        assert!(RECONSTRUCT.contains("var<storage, read_write> val"));
    }
}
