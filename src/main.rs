//! Command line entry point: minimize the energy of a set of point masses.
//!
//! ```sh
//! $> particle-minimize --particles 64 --iters 5000 --log_dir output/run64
//! $> RUST_LOG=debug particle-minimize --masses masses.txt --opt RMSprop
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use particle_minimize::constants::{
    DEFAULT_DIM, DEFAULT_ITERS, DEFAULT_LAMBDA, DEFAULT_LOG_DIR, DEFAULT_LR, DEFAULT_OPTIMIZER,
    DEFAULT_OUTPUT_ITER, DEFAULT_PARTICLES,
};
use particle_minimize::particles::{load_masses, uniform_masses};
use particle_minimize::{MinimizationConfig, Minimizer, OptimizerKind};

#[derive(Parser, Debug)]
#[command(about = "Gradient-based energy minimization of a particle system")]
struct Args {
    /// Dimensionality
    #[arg(long, default_value_t = DEFAULT_DIM)]
    dim: usize,

    /// Number of iters
    #[arg(long, default_value_t = DEFAULT_ITERS)]
    iters: usize,

    /// Number of particles, ignored when --masses is given
    #[arg(long, default_value_t = DEFAULT_PARTICLES)]
    particles: usize,

    /// Lambda, strength of the confinement term
    #[arg(long, default_value_t = DEFAULT_LAMBDA)]
    lam: f64,

    /// Output directory for log.txt and positions.txt, empty to disable
    #[arg(long = "log_dir", default_value = DEFAULT_LOG_DIR)]
    log_dir: String,

    /// Whitespace separated masses, one value per particle
    #[arg(long)]
    masses: Option<PathBuf>,

    /// Adam, Adamax, RMSprop or SGD
    #[arg(long, default_value = DEFAULT_OPTIMIZER)]
    opt: String,

    /// Initial learning rate
    #[arg(long, default_value_t = DEFAULT_LR)]
    lr: f64,

    /// Report every this many iterations
    #[arg(long = "output_iter", default_value_t = DEFAULT_OUTPUT_ITER)]
    output_iter: usize,

    /// Seed for the initial positions
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // resolve the optimizer before touching the filesystem
    let optimizer: OptimizerKind = args.opt.parse()?;

    let masses = match &args.masses {
        Some(path) => load_masses(path).with_context(|| format!("loading masses from {}", path.display()))?,
        None => uniform_masses(args.particles),
    };

    let config = MinimizationConfig {
        dim: args.dim,
        lambda: args.lam,
        num_iters: args.iters,
        learning_rate: args.lr,
        optimizer,
        output_iter: args.output_iter,
        log_dir: (!args.log_dir.is_empty()).then(|| PathBuf::from(&args.log_dir)),
        seed: args.seed,
    };

    let report = Minimizer::new(masses, config)?.run()?;
    log::info!("best energy {}", report.best_energy);

    Ok(())
}
