/*
Gradient update rules.

Four optimizer names are accepted on the command line but only two update
algorithms exist behind them:

    Adam    -> Adam
    Adamax  -> Adam      (alias, NOT the infinity-norm Adamax)
    RMSprop -> RMSProp
    SGD     -> RMSProp   (alias, NOT plain gradient descent)

The aliases are kept so that runs are reproducible under the old names; a
warning is logged whenever one of them is picked.
 */

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::constants::{ADAM_BETA1, ADAM_BETA2, ADAM_EPS, RMSPROP_ALPHA, RMSPROP_EPS};
use crate::error::MinimizeError;

/// The update algorithm that actually runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateRule {
    Adam,
    RmsProp,
}

/// Optimizer selector as named by the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizerKind {
    Adam,
    Adamax,
    #[serde(rename = "RMSprop")]
    RmsProp,
    #[serde(rename = "SGD")]
    Sgd,
}

impl OptimizerKind {
    pub fn update_rule(self) -> UpdateRule {
        match self {
            OptimizerKind::Adam | OptimizerKind::Adamax => UpdateRule::Adam,
            OptimizerKind::RmsProp | OptimizerKind::Sgd => UpdateRule::RmsProp,
        }
    }

    /// True when the selector name does not describe the rule it runs.
    pub fn is_alias(self) -> bool {
        matches!(self, OptimizerKind::Adamax | OptimizerKind::Sgd)
    }

    /// Fresh optimizer state sized for a `shape` parameter matrix.
    pub fn build(self, shape: (usize, usize)) -> Box<dyn Optimizer> {
        if self.is_alias() {
            log::warn!(
                "optimizer `{}` is an alias and runs the {:?} update rule",
                self,
                self.update_rule()
            );
        }
        match self.update_rule() {
            UpdateRule::Adam => Box::new(Adam::new(shape)),
            UpdateRule::RmsProp => Box::new(RmsProp::new(shape)),
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = MinimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Adam" => Ok(OptimizerKind::Adam),
            "Adamax" => Ok(OptimizerKind::Adamax),
            "RMSprop" => Ok(OptimizerKind::RmsProp),
            "SGD" => Ok(OptimizerKind::Sgd),
            other => Err(MinimizeError::UnknownOptimizer(other.to_string())),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptimizerKind::Adam => "Adam",
            OptimizerKind::Adamax => "Adamax",
            OptimizerKind::RmsProp => "RMSprop",
            OptimizerKind::Sgd => "SGD",
        };
        f.write_str(name)
    }
}

/// A stateful rule moving `params` against `grad` with step size `lr`.
pub trait Optimizer {
    fn step(&mut self, params: &mut Array2<f64>, grad: &Array2<f64>, lr: f64);

    fn rule(&self) -> UpdateRule;
}

// -- Adam

pub struct Adam {
    beta1: f64,
    beta2: f64,
    eps: f64,
    m: Array2<f64>, // first moment
    v: Array2<f64>, // second moment
    t: i32,
}

impl Adam {
    pub fn new(shape: (usize, usize)) -> Self {
        Adam {
            beta1: ADAM_BETA1,
            beta2: ADAM_BETA2,
            eps: ADAM_EPS,
            m: Array2::zeros(shape),
            v: Array2::zeros(shape),
            t: 0,
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut Array2<f64>, grad: &Array2<f64>, lr: f64) {
        self.t += 1;
        let bias_correction1 = 1.0 - self.beta1.powi(self.t);
        let bias_correction2_sqrt = (1.0 - self.beta2.powi(self.t)).sqrt();
        let step_size = lr / bias_correction1;
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.eps);

        Zip::from(params)
            .and(&mut self.m)
            .and(&mut self.v)
            .and(grad)
            .for_each(|x, m, v, &g| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let denom = v.sqrt() / bias_correction2_sqrt + eps;
                *x -= step_size * *m / denom;
            });
    }

    fn rule(&self) -> UpdateRule {
        UpdateRule::Adam
    }
}

// -- RMSProp

pub struct RmsProp {
    alpha: f64,
    eps: f64,
    square_avg: Array2<f64>,
}

impl RmsProp {
    pub fn new(shape: (usize, usize)) -> Self {
        RmsProp {
            alpha: RMSPROP_ALPHA,
            eps: RMSPROP_EPS,
            square_avg: Array2::zeros(shape),
        }
    }
}

impl Optimizer for RmsProp {
    fn step(&mut self, params: &mut Array2<f64>, grad: &Array2<f64>, lr: f64) {
        let (alpha, eps) = (self.alpha, self.eps);

        Zip::from(params)
            .and(&mut self.square_avg)
            .and(grad)
            .for_each(|x, s, &g| {
                *s = alpha * *s + (1.0 - alpha) * g * g;
                *x -= lr * g / (s.sqrt() + eps);
            });
    }

    fn rule(&self) -> UpdateRule {
        UpdateRule::RmsProp
    }
}
