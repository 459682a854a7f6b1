/*

=========================================================
 Particle energy minimization (Rust)
=========================================================

Particle Model
--------------
- N point masses m_i >= 0, fixed for the run
- Positions: N x D matrix (ndarray), D = 3 by default

Energy
------
    V = sum_{i<j} 1 / (m_i m_j r_ij) + (lambda / 6) sum_i m_i |x_i|^2

- pairwise inverse-distance repulsion over the upper triangle
- harmonic confinement towards the origin
- closed-form gradient (see `energy`)

Minimization
------------
- standard normal start
- Adam or RMSProp steps, selected by name (see `optimizers`)
- learning rate decays by 0.9999 every iteration
- the lowest-energy configuration seen so far is kept as a snapshot
- every `output_iter` iterations: console line, log.txt, positions.txt

=========================================================

*/
pub mod constants;
pub mod energy;
pub mod error;
pub mod minimization;
pub mod optimizers;
pub mod output;
pub mod particles;

pub use energy::{pairwise_distances, upper_triangular_pairs, EnergyFunctional};
pub use error::{MinimizeError, Result};
pub use minimization::{BestConfiguration, IterationRecord, MinimizationConfig, MinimizationReport, Minimizer};
pub use optimizers::{Optimizer, OptimizerKind, UpdateRule};

pub mod learning_rate {

    use crate::constants::{LR_DECAY, LR_STEP_SIZE};

    /// Step decay: lr = lr_0 * gamma^(floor(steps / step_size)).
    #[derive(Clone, Debug)]
    pub struct StepDecay {
        initial: f64,
        gamma: f64,
        step_size: u64,
        steps: u64,
    }

    impl StepDecay {
        pub fn new(initial: f64, gamma: f64, step_size: u64) -> Self {
            StepDecay {
                initial,
                gamma,
                step_size: step_size.max(1),
                steps: 0,
            }
        }

        /// The schedule every run uses: multiply by 0.9999 once per iteration.
        pub fn per_iteration(initial: f64) -> Self {
            StepDecay::new(initial, LR_DECAY, LR_STEP_SIZE)
        }

        pub fn step(&mut self) {
            self.steps += 1;
        }

        pub fn steps(&self) -> u64 {
            self.steps
        }

        pub fn initial(&self) -> f64 {
            self.initial
        }

        pub fn lr(&self) -> f64 {
            let exponent = (self.steps / self.step_size) as i32;
            self.initial * self.gamma.powi(exponent)
        }
    }

}
