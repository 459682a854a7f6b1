// -- learning rate schedule
pub const LR_DECAY: f64 = 0.9999; // multiplicative decay applied once per iteration
pub const LR_STEP_SIZE: u64 = 1; // iterations between decays

// -- Adam hyper-parameters
pub const ADAM_BETA1: f64 = 0.9;
pub const ADAM_BETA2: f64 = 0.999;
pub const ADAM_EPS: f64 = 1e-8;

// -- RMSProp hyper-parameters
pub const RMSPROP_ALPHA: f64 = 0.99; // smoothing constant of the squared-gradient average
pub const RMSPROP_EPS: f64 = 1e-8;

// -- run defaults, shared by the command line and MinimizationConfig::default
pub const DEFAULT_DIM: usize = 3;
pub const DEFAULT_ITERS: usize = 20000;
pub const DEFAULT_PARTICLES: usize = 256;
pub const DEFAULT_LAMBDA: f64 = 3.0;
pub const DEFAULT_LR: f64 = 0.1;
pub const DEFAULT_OUTPUT_ITER: usize = 100;
pub const DEFAULT_LOG_DIR: &str = "output/test";
pub const DEFAULT_OPTIMIZER: &str = "Adam";

// -- log directory layout
pub const LOG_FILE: &str = "log.txt";
pub const POSITIONS_FILE: &str = "positions.txt";
pub const SUMMARY_FILE: &str = "summary.json";
