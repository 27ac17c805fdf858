//! Reconstruction benchmark on a synthetic page

use std::time::Duration;

use anyhow::{Context, Result, bail};
use did_compute::{GradientField, PoolConfig, Strategy, enumerate_devices, reconstruct};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::warn;

use crate::{BenchArgs, StrategyArg};

fn strategies(args: &BenchArgs) -> Vec<Strategy> {
    let pool = Strategy::ThreadPool(
        PoolConfig::default()
            .with_workers(args.workers)
            .with_ack_timeout(Duration::from_secs(args.ack_timeout)),
    );
    match args.strategy {
        StrategyArg::SingleCore => vec![Strategy::Sequential],
        StrategyArg::MultiCpu => vec![pool],
        StrategyArg::Accelerator => vec![Strategy::Accelerator { device: args.device }],
        StrategyArg::All => {
            let mut all = vec![Strategy::Sequential, pool];
            all.extend(
                enumerate_devices()
                    .into_iter()
                    .map(|d| Strategy::Accelerator { device: d.index }),
            );
            all
        }
    }
}

pub fn run(args: BenchArgs, verbose: bool) -> Result<()> {
    if args.width < 8 || args.height < 8 {
        bail!("Page must be at least 8x8, got {}x{}", args.width, args.height);
    }
    let mut rng = StdRng::seed_from_u64(args.seed);
    let page = super::synthetic_page(args.width, args.height, &mut rng)?;
    let stain = super::synthetic_stain(args.width.min(args.height) / 3, &mut rng)?;

    let mut field = GradientField::from_image(&page, 0)?;
    GradientField::from_image(&stain, 0)?
        .paste_gradient(&page, &mut field, (args.width / 4) as i64, (args.height / 4) as i64, 2.0)
        .context("Failed to inject stain")?;

    println!("Page {}x{}, {} steps", args.width, args.height, args.iterations);
    println!("  Residual before: {:.3}", field.error());

    for strategy in strategies(&args) {
        let mut f = field.clone();
        match reconstruct(&mut f, args.iterations, &strategy) {
            Ok(stats) => {
                println!("  {:<24} residual {:.3}", stats.strategy, f.error());
                if verbose {
                    println!(
                        "    init {:?}, compute {:?}",
                        stats.init_time, stats.compute_time
                    );
                }
                println!("{}", stats.report_line());
            }
            Err(e) if args.strategy == StrategyArg::All && e.is_device_error() => {
                warn!(strategy = strategy.name(), error = %e, "skipping strategy");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("{} reconstruction failed", strategy.name()));
            }
        }
    }
    Ok(())
}
