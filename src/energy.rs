/*
Potential energy of a set of point masses

    V(x) = sum_{i<j} 1 / (m_i m_j |x_i - x_j|)  +  (lambda / 6) sum_i m_i |x_i|^2

The first term is a soft repulsion that diverges as two particles meet, the
second a harmonic confinement pulling everything towards the origin. The
gradient is derived by hand:

    dV/dx_i = - sum_{j != i} (x_i - x_j) / (m_i m_j |x_i - x_j|^3)  +  (lambda / 3) m_i x_i

Two particles sitting on exactly the same point make the repulsion infinite
and the gradient NaN. That is left alone; a standard normal start makes it a
probability zero event.
 */

use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView1};

/// Unique unordered pairs (i, j) with i < j, i.e. the strict upper triangle of an
/// n x n matrix in row-major order.
pub fn upper_triangular_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n).tuple_combinations().collect()
}

/// Full N x N matrix of Euclidean distances between the rows of `positions`.
/// The diagonal is zero.
pub fn pairwise_distances(positions: &Array2<f64>) -> Array2<f64> {
    let n = positions.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        distance(positions.row(i), positions.row(j))
    })
}

fn distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[derive(Clone, Debug)]
pub struct EnergyFunctional {
    masses: Array1<f64>,
    mass_matrix: Array2<f64>, // m_i * m_j
    pairs: Vec<(usize, usize)>,
    lambda: f64,
}

impl EnergyFunctional {
    pub fn new(masses: Array1<f64>, lambda: f64) -> Self {
        let n = masses.len();
        let mass_matrix = Array2::from_shape_fn((n, n), |(i, j)| masses[i] * masses[j]);
        EnergyFunctional {
            masses,
            mass_matrix,
            pairs: upper_triangular_pairs(n),
            lambda,
        }
    }

    pub fn num_particles(&self) -> usize {
        self.masses.len()
    }

    pub fn masses(&self) -> &Array1<f64> {
        &self.masses
    }

    pub fn mass_matrix(&self) -> &Array2<f64> {
        &self.mass_matrix
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Distances scaled element-wise by the mass products.
    pub fn weighted_distances(&self, positions: &Array2<f64>) -> Array2<f64> {
        pairwise_distances(positions) * &self.mass_matrix
    }

    pub fn repulsion(&self, positions: &Array2<f64>) -> f64 {
        let weighted = self.weighted_distances(positions);
        self.pairs
            .iter()
            .map(|&(i, j)| 1.0 / weighted[[i, j]])
            .sum()
    }

    pub fn confinement(&self, positions: &Array2<f64>) -> f64 {
        let weighted_norms: f64 = positions
            .outer_iter()
            .zip(self.masses.iter())
            .map(|(x, m)| m * x.dot(&x))
            .sum();
        self.lambda / 6.0 * weighted_norms
    }

    pub fn energy(&self, positions: &Array2<f64>) -> f64 {
        self.repulsion(positions) + self.confinement(positions)
    }

    /// Gradient of the energy with respect to every coordinate, in a fresh buffer.
    pub fn gradient(&self, positions: &Array2<f64>) -> Array2<f64> {
        let mut gradient = Array2::zeros(positions.raw_dim());
        self.energy_and_gradient(positions, &mut gradient);
        gradient
    }

    /// Returns the energy and ADDS its gradient into `gradient`, so the caller
    /// clears the buffer between evaluations.
    pub fn energy_and_gradient(&self, positions: &Array2<f64>, gradient: &mut Array2<f64>) -> f64 {
        debug_assert_eq!(positions.nrows(), self.num_particles());
        debug_assert_eq!(positions.dim(), gradient.dim());

        let dim = positions.ncols();

        // -- repulsion, one pass over the upper triangle
        let mut repulsion = 0.0;
        for &(i, j) in &self.pairs {
            let r2: f64 = (0..dim)
                .map(|k| {
                    let d = positions[[i, k]] - positions[[j, k]];
                    d * d
                })
                .sum();
            let r = r2.sqrt();
            let inv = 1.0 / (r * self.mass_matrix[[i, j]]);
            repulsion += inv;

            let coeff = inv / r2; // 1 / (m_i m_j r^3)
            for k in 0..dim {
                let d = positions[[i, k]] - positions[[j, k]];
                gradient[[i, k]] -= coeff * d;
                gradient[[j, k]] += coeff * d;
            }
        }

        // -- confinement
        let scale = self.lambda / 3.0;
        let mut weighted_norms = 0.0;
        for (i, (x, &m)) in positions.outer_iter().zip(self.masses.iter()).enumerate() {
            weighted_norms += m * x.dot(&x);
            gradient.row_mut(i).scaled_add(scale * m, &x);
        }

        repulsion + self.lambda / 6.0 * weighted_norms
    }
}
