//! did - gradient-domain document degradation CLI
//!
//! Benchmarks the reconstruction strategies and lists compute devices.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "did")]
#[command(author, version, about = "Gradient-domain document degradation")]
#[command(long_about = "
Gradient-domain reconstruction for document image degradation.

Examples:
  did devices                              # List compute devices
  did bench                                # Multi-CPU run on a 512x512 page
  did bench -s all -n 200                  # Compare every strategy
  did bench -s accelerator --device 0      # Run on the first device
  RUST_LOG=did_compute=debug did bench     # Per-step progress
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of rayon threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct a synthetic degraded page and report timings
    #[command(visible_alias = "b")]
    Bench(BenchArgs),

    /// List compute devices usable by the accelerator strategy
    #[command(visible_alias = "d")]
    Devices,
}

/// Strategy selection on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    SingleCore,
    MultiCpu,
    Accelerator,
    All,
}

/// Arguments for the `bench` command.
#[derive(Args)]
struct BenchArgs {
    /// Page width
    #[arg(short = 'W', long, default_value = "512")]
    width: u32,

    /// Page height
    #[arg(short = 'H', long, default_value = "512")]
    height: u32,

    /// Relaxation steps
    #[arg(short = 'n', long, default_value_t = did_ops::DEFAULT_ITERATIONS)]
    iterations: usize,

    /// Execution strategy
    #[arg(short, long, value_enum, default_value = "multi-cpu")]
    strategy: StrategyArg,

    /// Device index for the accelerator strategy (see `did devices`)
    #[arg(long, default_value = "0")]
    device: usize,

    /// Pool workers for the multi-cpu strategy (0 = available parallelism)
    #[arg(long, default_value = "0")]
    workers: usize,

    /// Seconds the pool waits for one step before failing
    #[arg(long, default_value = "30")]
    ack_timeout: u64,

    /// Seed of the synthetic page
    #[arg(long, default_value = "1")]
    seed: u64,
}

fn init_logging(verbose: bool) {
    let base = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base));
    // a second init (e.g. in tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Bench(args) => commands::bench::run(args, cli.verbose),
        Commands::Devices => commands::devices::run(cli.verbose),
    }
}
