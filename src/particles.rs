/*
Particle set-up: masses from a text file (or all ones) and random starting
positions.
 */

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::{MinimizeError, Result};

/// `n` unit masses, used when no mass file is given.
pub fn uniform_masses(n: usize) -> Array1<f64> {
    Array1::ones(n)
}

/// Read whitespace separated masses from `path`. Lines may hold any number of
/// values; blank lines and anything after a `#` are ignored.
pub fn load_masses(path: impl AsRef<Path>) -> Result<Array1<f64>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| MinimizeError::io(path, source))?;
    parse_masses(&text, &path.display().to_string())
}

pub fn parse_masses(text: &str, source_name: &str) -> Result<Array1<f64>> {
    let mut masses = Vec::new();
    for (line_idx, line) in text.lines().enumerate() {
        let content = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        for token in content.split_whitespace() {
            let mass = token
                .parse::<f64>()
                .map_err(|_| MinimizeError::InvalidMass {
                    path: source_name.to_string(),
                    line: line_idx + 1,
                    token: token.to_string(),
                })?;
            masses.push(mass);
        }
    }
    Ok(Array1::from(masses))
}

/// Independent standard normal draw for every coordinate.
pub fn random_positions<R: Rng + ?Sized>(n: usize, dim: usize, rng: &mut R) -> Array2<f64> {
    Array2::from_shape_fn((n, dim), |_| StandardNormal.sample(&mut *rng))
}
