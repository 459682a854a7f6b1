use std::fs;
use std::path::Path;
use std::process::Command;

use ndarray::{arr1, Array1};
use particle_minimize::output::read_positions;
use particle_minimize::particles::load_masses;
use particle_minimize::{MinimizationConfig, Minimizer, OptimizerKind};

/// Small seeded run writing into `log_dir`
pub fn logged_config(log_dir: &Path, num_iters: usize, output_iter: usize) -> MinimizationConfig {
    MinimizationConfig {
        num_iters,
        output_iter,
        log_dir: Some(log_dir.to_path_buf()),
        seed: Some(2024),
        ..MinimizationConfig::default()
    }
}

fn log_lines(log_dir: &Path) -> Vec<(usize, f64)> {
    fs::read_to_string(log_dir.join("log.txt"))
        .unwrap()
        .lines()
        .map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            assert_eq!(fields.len(), 2, "log line `{line}`");
            (fields[0].parse().unwrap(), fields[1].parse().unwrap())
        })
        .collect()
}

// ==================================================================================
// Log directory
// ==================================================================================

#[test]
fn log_directory_is_created_and_filled() {
    let tmp = tempfile::tempdir().unwrap();
    let log_dir = tmp.path().join("output").join("test");

    let report = Minimizer::new(Array1::ones(10), logged_config(&log_dir, 25, 10))
        .unwrap()
        .run()
        .unwrap();

    let lines = log_lines(&log_dir);
    let iterations: Vec<usize> = lines.iter().map(|(i, _)| *i).collect();
    assert_eq!(iterations, vec![0, 10, 20]);

    // the logged best energies never go up
    for pair in lines.windows(2) {
        assert!(pair[1].1 <= pair[0].1);
    }

    // positions.txt holds the best configuration of the last report
    let positions = read_positions(log_dir.join("positions.txt")).unwrap();
    assert_eq!(positions.dim(), (10, 3));

    assert!(log_dir.join("summary.json").exists());
    assert_eq!(report.iterations, 25);
}

#[test]
fn snapshot_round_trips_to_written_precision() {
    let tmp = tempfile::tempdir().unwrap();
    let log_dir = tmp.path().join("run");

    // a single report at iteration 0 whose best is the starting configuration
    let report = Minimizer::new(Array1::ones(6), logged_config(&log_dir, 1, 1))
        .unwrap()
        .run()
        .unwrap();

    let best = report.best_positions.unwrap();
    let written = read_positions(log_dir.join("positions.txt")).unwrap();

    assert_eq!(written.dim(), best.dim());
    for (a, b) in best.iter().zip(written.iter()) {
        assert!((a - b).abs() <= 5e-7 * a.abs(), "{a} vs {b}");
    }
}

#[test]
fn summary_describes_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let log_dir = tmp.path().join("run");
    let config = MinimizationConfig {
        optimizer: OptimizerKind::Sgd,
        ..logged_config(&log_dir, 30, 10)
    };

    Minimizer::new(Array1::ones(4), config).unwrap().run().unwrap();

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(log_dir.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["iterations"], 30);
    assert_eq!(summary["num_particles"], 4);
    assert_eq!(summary["optimizer"], "SGD");
    assert_eq!(summary["update_rule"], "RmsProp");
    assert_eq!(summary["seed"], 2024);
    assert!(summary["best_energy"].as_f64().unwrap().is_finite());
    assert!(summary.get("best_positions").is_none());
}

// ==================================================================================
// Mass files
// ==================================================================================

#[test]
fn single_mass_file_gives_one_particle_and_no_pairs() {
    let tmp = tempfile::tempdir().unwrap();
    let mass_file = tmp.path().join("masses.txt");
    fs::write(&mass_file, "5.0\n").unwrap();

    let masses = load_masses(&mass_file).unwrap();
    assert_eq!(masses, arr1(&[5.0]));

    let config = MinimizationConfig {
        num_iters: 10,
        seed: Some(3),
        ..MinimizationConfig::default()
    };
    let minimizer = Minimizer::new(masses, config).unwrap();
    assert!(minimizer.functional().pairs().is_empty());
    assert_eq!(minimizer.functional().repulsion(minimizer.positions()), 0.0);
}

// ==================================================================================
// Command line
// ==================================================================================

#[test]
fn cli_rejects_unknown_optimizer_before_writing_anything() {
    let tmp = tempfile::tempdir().unwrap();
    let log_dir = tmp.path().join("never");

    let output = Command::new(env!("CARGO_BIN_EXE_particle-minimize"))
        .args(["--opt", "bogus", "--iters", "10", "--particles", "4"])
        .arg("--log_dir")
        .arg(&log_dir)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("bogus"));
    // no iteration ran, so nothing was printed and no log directory exists
    assert!(output.stdout.is_empty());
    assert!(!log_dir.exists());
}

#[test]
fn cli_run_with_mass_file() {
    let tmp = tempfile::tempdir().unwrap();
    let log_dir = tmp.path().join("out");
    let mass_file = tmp.path().join("masses.txt");
    fs::write(&mass_file, "1.0 2.0\n0.5\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_particle-minimize"))
        .args(["--iters", "50", "--dim", "2", "--seed", "7", "--output_iter", "25", "--particles", "99"])
        .arg("--masses")
        .arg(&mass_file)
        .arg("--log_dir")
        .arg(&log_dir)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    // one console line per report: iteration, best energy, learning rate
    let stdout = String::from_utf8_lossy(&output.stdout);
    let console: Vec<&str> = stdout.lines().collect();
    assert_eq!(console.len(), 2);
    assert!(console[0].starts_with("0 "));
    assert!(console[1].starts_with("25 "));
    assert_eq!(console[1].split_whitespace().count(), 3);

    // the mass file wins over --particles
    let positions = read_positions(log_dir.join("positions.txt")).unwrap();
    assert_eq!(positions.dim(), (3, 2));
}

#[test]
fn cli_empty_log_dir_disables_logging() {
    let tmp = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_particle-minimize"))
        .current_dir(tmp.path())
        .args(["--iters", "5", "--particles", "3", "--seed", "1", "--log_dir", ""])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}
