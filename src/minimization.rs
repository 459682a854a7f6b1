/*
Energy minimization driver

    [Initialize positions ~ N(0, 1)]

    for i in 0..num_iters
        decay learning rate
        clear gradient
        E, dE/dx at current positions
        if E < best: snapshot positions      -- the evaluated ones, before moving
        update positions (Adam / RMSProp)
        every output_iter: print, log.txt, positions.txt

The driver owns everything that changes during a run: positions, gradient
buffer, optimizer accumulators, the schedule, the best configuration and the
open log file.
 */

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DIM, DEFAULT_ITERS, DEFAULT_LAMBDA, DEFAULT_LR, DEFAULT_OUTPUT_ITER};
use crate::energy::EnergyFunctional;
use crate::error::{MinimizeError, Result};
use crate::learning_rate::StepDecay;
use crate::optimizers::{Optimizer, OptimizerKind, UpdateRule};
use crate::output::RunLog;
use crate::particles::random_positions;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MinimizationConfig {
    pub dim: usize,
    pub lambda: f64,
    pub num_iters: usize,
    pub learning_rate: f64,
    pub optimizer: OptimizerKind,
    pub output_iter: usize, // report every this many iterations
    pub log_dir: Option<PathBuf>, // None: console only
    pub seed: Option<u64>, // None: drawn from the thread rng and logged
}

impl Default for MinimizationConfig {
    fn default() -> Self {
        MinimizationConfig {
            dim: DEFAULT_DIM,
            lambda: DEFAULT_LAMBDA,
            num_iters: DEFAULT_ITERS,
            learning_rate: DEFAULT_LR,
            optimizer: OptimizerKind::Adam,
            output_iter: DEFAULT_OUTPUT_ITER,
            log_dir: None,
            seed: None,
        }
    }
}

impl MinimizationConfig {
    pub fn validate(&self, masses: &Array1<f64>) -> Result<()> {
        if self.dim == 0 {
            return Err(MinimizeError::InvalidConfig("dimension must be at least 1".to_string()));
        }
        if self.output_iter == 0 {
            return Err(MinimizeError::InvalidConfig("output interval must be at least 1".to_string()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(MinimizeError::InvalidConfig(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !self.lambda.is_finite() {
            return Err(MinimizeError::InvalidConfig(format!("lambda must be finite, got {}", self.lambda)));
        }
        if masses.is_empty() {
            return Err(MinimizeError::InvalidConfig("at least one particle is required".to_string()));
        }
        if let Some((i, m)) = masses.iter().enumerate().find(|(_, m)| !(m.is_finite() && **m >= 0.0)) {
            return Err(MinimizeError::InvalidConfig(format!("mass {} is {}, masses must be non-negative", i, m)));
        }
        Ok(())
    }
}

/// Lowest-energy configuration seen so far. `positions` is an owned copy.
#[derive(Clone, Debug)]
pub struct BestConfiguration {
    pub energy: f64,
    pub iteration: usize,
    pub positions: Array2<f64>,
}

/// What happened during one call to `Minimizer::step`.
#[derive(Clone, Copy, Debug)]
pub struct IterationRecord {
    pub iteration: usize,
    pub energy: f64, // energy of the positions evaluated this iteration
    pub best_energy: f64,
    pub learning_rate: f64,
    pub improved: bool,
    pub reported: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct MinimizationReport {
    pub num_particles: usize,
    pub dim: usize,
    pub iterations: usize,
    pub best_energy: f64,
    pub best_iteration: Option<usize>,
    pub final_learning_rate: f64,
    pub optimizer: OptimizerKind,
    pub update_rule: UpdateRule,
    pub seed: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip)]
    pub best_positions: Option<Array2<f64>>,
}

pub struct Minimizer {
    config: MinimizationConfig,
    functional: EnergyFunctional,
    positions: Array2<f64>,
    gradient: Array2<f64>,
    optimizer: Box<dyn Optimizer>,
    schedule: StepDecay,
    best: Option<BestConfiguration>,
    iteration: usize,
    seed: Option<u64>,
    run_log: Option<RunLog>,
    started_at: DateTime<Utc>,
}

impl Minimizer {
    /// Minimizer starting from standard normal positions.
    pub fn new(masses: Array1<f64>, config: MinimizationConfig) -> Result<Self> {
        config.validate(&masses)?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let positions = random_positions(masses.len(), config.dim, &mut rng);

        Self::build(masses, positions, config, Some(seed))
    }

    /// Minimizer starting from the given N x D positions.
    pub fn with_positions(masses: Array1<f64>, positions: Array2<f64>, config: MinimizationConfig) -> Result<Self> {
        config.validate(&masses)?;
        if positions.dim() != (masses.len(), config.dim) {
            return Err(MinimizeError::InvalidConfig(format!(
                "positions are {:?}, expected ({}, {})",
                positions.dim(),
                masses.len(),
                config.dim
            )));
        }
        Self::build(masses, positions, config, None)
    }

    fn build(masses: Array1<f64>, positions: Array2<f64>, config: MinimizationConfig, seed: Option<u64>) -> Result<Self> {
        let shape = positions.dim();

        // Only the ndarray CPU backend exists, decided once here.
        log::info!("Device: cpu");

        let optimizer = config.optimizer.build(shape);
        let run_log = match &config.log_dir {
            Some(dir) => Some(RunLog::create(dir)?),
            None => None,
        };

        log::info!(
            "{} particles in {} dimensions, lambda = {}, optimizer = {} ({:?}), lr = {}, seed = {:?}",
            shape.0,
            shape.1,
            config.lambda,
            config.optimizer,
            optimizer.rule(),
            config.learning_rate,
            seed
        );

        Ok(Minimizer {
            functional: EnergyFunctional::new(masses, config.lambda),
            gradient: Array2::zeros(shape),
            schedule: StepDecay::per_iteration(config.learning_rate),
            optimizer,
            positions,
            best: None,
            iteration: 0,
            seed,
            run_log,
            started_at: Utc::now(),
            config,
        })
    }

    pub fn config(&self) -> &MinimizationConfig {
        &self.config
    }

    pub fn functional(&self) -> &EnergyFunctional {
        &self.functional
    }

    pub fn masses(&self) -> &Array1<f64> {
        self.functional.masses()
    }

    pub fn positions(&self) -> &Array2<f64> {
        &self.positions
    }

    pub fn best(&self) -> Option<&BestConfiguration> {
        self.best.as_ref()
    }

    /// Best energy so far, +inf before anything finite has been evaluated.
    pub fn best_energy(&self) -> f64 {
        self.best.as_ref().map_or(f64::INFINITY, |b| b.energy)
    }

    pub fn learning_rate(&self) -> f64 {
        self.schedule.lr()
    }

    /// Number of iterations completed.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// One full iteration.
    pub fn step(&mut self) -> Result<IterationRecord> {
        let iteration = self.iteration;

        self.schedule.step();
        let lr = self.schedule.lr();

        self.gradient.fill(0.0);
        let energy = self.functional.energy_and_gradient(&self.positions, &mut self.gradient);

        // NaN never compares lower, so a degenerate configuration is never recorded
        let improved = energy < self.best_energy();
        if improved {
            self.best = Some(BestConfiguration {
                energy,
                iteration,
                positions: self.positions.clone(),
            });
        }

        self.optimizer.step(&mut self.positions, &self.gradient, lr);
        self.iteration += 1;

        let reported = iteration % self.config.output_iter == 0;
        if reported {
            self.report(iteration, lr)?;
        }

        Ok(IterationRecord {
            iteration,
            energy,
            best_energy: self.best_energy(),
            learning_rate: lr,
            improved,
            reported,
        })
    }

    fn report(&mut self, iteration: usize, lr: f64) -> Result<()> {
        let best_energy = self.best_energy();
        println!("{} {} {}", iteration, best_energy, lr);

        if let (Some(run_log), Some(best)) = (self.run_log.as_mut(), self.best.as_ref()) {
            run_log.record(iteration, best.energy, &best.positions)?;
        }
        Ok(())
    }

    /// Run the remaining iterations. Consumes the minimizer so the log file is
    /// closed when this returns, on success or error.
    pub fn run(mut self) -> Result<MinimizationReport> {
        log::info!(
            "minimizing for {} iterations, reporting every {}",
            self.config.num_iters,
            self.config.output_iter
        );

        while self.iteration < self.config.num_iters {
            self.step()?;
        }

        let report = self.summary();
        if let Some(run_log) = &self.run_log {
            run_log.write_summary(&report)?;
        }

        log::info!(
            "finished {} iterations, best energy {} at iteration {:?}",
            report.iterations,
            report.best_energy,
            report.best_iteration
        );
        Ok(report)
    }

    pub fn summary(&self) -> MinimizationReport {
        MinimizationReport {
            num_particles: self.functional.num_particles(),
            dim: self.positions.ncols(),
            iterations: self.iteration,
            best_energy: self.best_energy(),
            best_iteration: self.best.as_ref().map(|b| b.iteration),
            final_learning_rate: self.schedule.lr(),
            optimizer: self.config.optimizer,
            update_rule: self.optimizer.rule(),
            seed: self.seed,
            started_at: self.started_at,
            finished_at: Utc::now(),
            best_positions: self.best.as_ref().map(|b| b.positions.clone()),
        }
    }
}
