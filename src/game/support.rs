//! Support enumeration for two-player bimatrix games.
//!
//! For every pair of equal-sized supports the solver asks: is there a mixed
//! strategy on the attacker's support that leaves the defender indifferent
//! across the defender's support, and vice versa? Candidates that come out
//! strictly positive on their support and admit no profitable deviation are
//! equilibria. This finds every equilibrium of a non-degenerate game.

use super::{Equilibrium, PayoffMatrix, StrategyVector};
use crate::error::{Result, SimError};
use tracing::debug;

/// Pivots smaller than this are treated as a singular system.
const PIVOT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct EquilibriumSolver {
    tolerance: f64,
}

impl EquilibriumSolver {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Enumerates mixed-strategy equilibria in lexicographic support order.
    ///
    /// Fails when the payoff shapes differ or when no support pair yields an
    /// equilibrium.
    pub fn solve(
        &self,
        defender_payoffs: &PayoffMatrix,
        attacker_payoffs: &PayoffMatrix,
    ) -> Result<Vec<Equilibrium>> {
        if defender_payoffs.shape() != attacker_payoffs.shape() {
            return Err(SimError::config(format!(
                "payoff matrices differ in shape: {:?} vs {:?}",
                defender_payoffs.shape(),
                attacker_payoffs.shape()
            )));
        }

        let (rows, cols) = defender_payoffs.shape();
        let mut equilibria = Vec::new();

        for size in 1..=rows.min(cols) {
            for row_support in combinations(rows, size) {
                for col_support in combinations(cols, size) {
                    if let Some(eq) = self.check_supports(
                        defender_payoffs,
                        attacker_payoffs,
                        &row_support,
                        &col_support,
                    ) {
                        debug!(
                            "Equilibrium on supports {:?}/{:?}: defender {}, attacker {}",
                            row_support, col_support, eq.defender, eq.attacker
                        );
                        equilibria.push(eq);
                    }
                }
            }
        }

        if equilibria.is_empty() {
            return Err(SimError::NoEquilibriumFound { rows, cols });
        }
        Ok(equilibria)
    }

    fn check_supports(
        &self,
        defender_payoffs: &PayoffMatrix,
        attacker_payoffs: &PayoffMatrix,
        row_support: &[usize],
        col_support: &[usize],
    ) -> Option<Equilibrium> {
        let (rows, cols) = defender_payoffs.shape();

        // Attacker mix that makes the defender indifferent over its support.
        let (attacker_on_support, defender_value) = indifference_mix(
            row_support,
            col_support,
            |i, j| defender_payoffs.get(i, j),
        )?;
        // Defender mix that makes the attacker indifferent over its support.
        let (defender_on_support, attacker_value) = indifference_mix(
            col_support,
            row_support,
            |j, i| attacker_payoffs.get(i, j),
        )?;

        if attacker_on_support.iter().any(|&p| p <= self.tolerance)
            || defender_on_support.iter().any(|&p| p <= self.tolerance)
        {
            return None;
        }

        let defender = scatter(rows, row_support, &defender_on_support);
        let attacker = scatter(cols, col_support, &attacker_on_support);

        let best_row = max_of(&defender_payoffs.row_payoffs(&attacker));
        let best_col = max_of(&attacker_payoffs.col_payoffs(&defender));
        if best_row > defender_value + self.tolerance || best_col > attacker_value + self.tolerance {
            return None;
        }

        Some(Equilibrium {
            defender: StrategyVector::new(defender).ok()?,
            attacker: StrategyVector::new(attacker).ok()?,
        })
    }
}

impl Default for EquilibriumSolver {
    fn default() -> Self {
        Self::new(1e-9)
    }
}

/// Solves for the weights `w` over `mix_support` and the common value `v` such that
/// every `own` action earns `v` against `w`, with `w` summing to one.
/// `payoff(own, other)` is the indifferent player's payoff.
fn indifference_mix(
    own_support: &[usize],
    mix_support: &[usize],
    payoff: impl Fn(usize, usize) -> f64,
) -> Option<(Vec<f64>, f64)> {
    let k = mix_support.len();
    let mut a = vec![vec![0.0; k + 1]; k + 1];
    let mut b = vec![0.0; k + 1];

    for (row, &own) in own_support.iter().enumerate() {
        for (col, &other) in mix_support.iter().enumerate() {
            a[row][col] = payoff(own, other);
        }
        a[row][k] = -1.0;
    }
    for col in 0..k {
        a[k][col] = 1.0;
    }
    b[k] = 1.0;

    let mut solution = solve_linear(a, b)?;
    let value = solution.pop()?;
    Some((solution, value))
}

/// Gaussian elimination with partial pivoting. `None` for singular systems.
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))?;
        if a[pivot][col].abs() < PIVOT_EPSILON {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

/// All `k`-element subsets of `0..n` in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }
    let mut current: Vec<usize> = (0..k).collect();
    loop {
        out.push(current.clone());

        let Some(pos) = (0..k).rev().find(|&i| current[i] != i + n - k) else {
            return out;
        };
        current[pos] += 1;
        for i in (pos + 1)..k {
            current[i] = current[i - 1] + 1;
        }
    }
}

fn scatter(len: usize, support: &[usize], values: &[f64]) -> Vec<f64> {
    let mut full = vec![0.0; len];
    for (&idx, &v) in support.iter().zip(values) {
        full[idx] = v;
    }
    full
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<Vec<f64>>) -> PayoffMatrix {
        PayoffMatrix::new(rows).unwrap()
    }

    #[test]
    fn test_combinations_order() {
        assert_eq!(
            combinations(4, 2),
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(combinations(3, 3), vec![vec![0, 1, 2]]);
        assert!(combinations(2, 3).is_empty());
    }

    #[test]
    fn test_solve_linear() {
        let x = solve_linear(vec![vec![2.0, 1.0], vec![1.0, 3.0]], vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
        assert!(solve_linear(vec![vec![1.0, 2.0], vec![2.0, 4.0]], vec![1.0, 2.0]).is_none());
    }

    #[test]
    fn test_matching_pennies() {
        let a = matrix(vec![vec![1.0, -1.0], vec![-1.0, 1.0]]);
        let b = matrix(vec![vec![-1.0, 1.0], vec![1.0, -1.0]]);
        let eqs = EquilibriumSolver::default().solve(&a, &b).unwrap();
        assert_eq!(eqs.len(), 1);
        for p in eqs[0].defender.probs().iter().chain(eqs[0].attacker.probs()) {
            assert!((p - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_access_control_game() {
        let a = matrix(vec![vec![4.1, -4.0], vec![-2.8, 4.2]]);
        let b = matrix(vec![vec![-0.8, 0.8], vec![2.1, -0.6]]);
        let eqs = EquilibriumSolver::default().solve(&a, &b).unwrap();
        assert_eq!(eqs.len(), 1);

        let eq = &eqs[0];
        assert!((eq.defender.get(0) - 2.7 / 4.3).abs() < 1e-9);
        assert!((eq.attacker.get(0) - 8.2 / 15.1).abs() < 1e-9);
    }

    #[test]
    fn test_coordination_game_has_three_equilibria() {
        let a = matrix(vec![vec![2.0, 0.0], vec![0.0, 1.0]]);
        let b = matrix(vec![vec![1.0, 0.0], vec![0.0, 2.0]]);
        let eqs = EquilibriumSolver::default().solve(&a, &b).unwrap();
        assert_eq!(eqs.len(), 3);

        // pure equilibria come first
        assert_eq!(eqs[0].defender.probs(), &[1.0, 0.0]);
        assert_eq!(eqs[1].defender.probs(), &[0.0, 1.0]);
        assert!((eqs[2].defender.get(0) - 2.0 / 3.0).abs() < 1e-9);
        assert!((eqs[2].attacker.get(0) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_dominated_row_is_never_played() {
        // Single defender action against two attacker actions.
        let a = matrix(vec![vec![-5.0, -3.0]]);
        let b = matrix(vec![vec![3.0, 2.0]]);
        let eqs = EquilibriumSolver::default().solve(&a, &b).unwrap();
        assert_eq!(eqs.len(), 1);
        assert_eq!(eqs[0].attacker.probs(), &[1.0, 0.0]);
    }

    #[test]
    fn test_shape_mismatch_is_config_error() {
        let a = matrix(vec![vec![1.0, 2.0]]);
        let b = matrix(vec![vec![1.0], vec![2.0]]);
        let err = EquilibriumSolver::default().solve(&a, &b).unwrap_err();
        assert!(matches!(err, SimError::Configuration { .. }));
    }

    #[test]
    fn test_rock_paper_scissors_is_uniform() {
        let a = matrix(vec![
            vec![0.0, -1.0, 1.0],
            vec![1.0, 0.0, -1.0],
            vec![-1.0, 1.0, 0.0],
        ]);
        let b = matrix(vec![
            vec![0.0, 1.0, -1.0],
            vec![-1.0, 0.0, 1.0],
            vec![1.0, -1.0, 0.0],
        ]);
        let eqs = EquilibriumSolver::default().solve(&a, &b).unwrap();
        assert_eq!(eqs.len(), 1);
        for p in eqs[0].defender.probs().iter().chain(eqs[0].attacker.probs()) {
            assert!((p - 1.0 / 3.0).abs() < 1e-9);
        }
    }
}
