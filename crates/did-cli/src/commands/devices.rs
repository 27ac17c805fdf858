//! Device listing command

use anyhow::Result;
use did_compute::{DeviceKind, enumerate_devices};

pub fn run(verbose: bool) -> Result<()> {
    let devices = enumerate_devices();
    println!("{} compute device(s):", devices.len());
    for info in &devices {
        println!("  [{}] {:<4} {}", info.index, info.kind, info.name);
    }
    if verbose && !devices.iter().any(|d| d.kind == DeviceKind::Gpu) {
        println!("No hardware adapter found; build with --features wgpu to enable GPU devices.");
    }
    Ok(())
}
