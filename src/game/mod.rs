pub mod support;

pub use support::EquilibriumSolver;

use crate::error::{Result, SimError};
use crate::policy::PROBABILITY_EPSILON;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Real-valued payoffs for one player, rows = defender actions, columns = attacker actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct PayoffMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl PayoffMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        if n_rows == 0 || n_cols == 0 {
            return Err(SimError::config("payoff matrix must be non-empty"));
        }
        if rows.iter().any(|row| row.len() != n_cols) {
            return Err(SimError::config("payoff matrix must be rectangular"));
        }

        let data: Vec<f64> = rows.into_iter().flatten().collect();
        if data.iter().any(|v| !v.is_finite()) {
            return Err(SimError::config("payoff matrix entries must be finite"));
        }

        Ok(Self { rows: n_rows, cols: n_cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Expected payoff of each row against a mixed column strategy.
    pub fn row_payoffs(&self, col_strategy: &[f64]) -> Vec<f64> {
        (0..self.rows)
            .map(|i| (0..self.cols).map(|j| self.get(i, j) * col_strategy[j]).sum())
            .collect()
    }

    /// Expected payoff of each column against a mixed row strategy.
    pub fn col_payoffs(&self, row_strategy: &[f64]) -> Vec<f64> {
        (0..self.cols)
            .map(|j| (0..self.rows).map(|i| self.get(i, j) * row_strategy[i]).sum())
            .collect()
    }
}

impl TryFrom<Vec<Vec<f64>>> for PayoffMatrix {
    type Error = SimError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<PayoffMatrix> for Vec<Vec<f64>> {
    fn from(matrix: PayoffMatrix) -> Self {
        matrix.data.chunks(matrix.cols).map(<[f64]>::to_vec).collect()
    }
}

/// A mixed strategy: non-negative weights over a finite action set that sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct StrategyVector(Vec<f64>);

impl StrategyVector {
    pub fn new(probs: Vec<f64>) -> Result<Self> {
        if probs.is_empty() {
            return Err(SimError::config("strategy vector must not be empty"));
        }
        if probs.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0 + PROBABILITY_EPSILON) {
            return Err(SimError::config(format!(
                "strategy components must lie in [0, 1], got {probs:?}"
            )));
        }
        let sum: f64 = probs.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_EPSILON {
            return Err(SimError::config(format!(
                "strategy vector must sum to 1, got {sum} for {probs:?}"
            )));
        }
        Ok(Self(probs))
    }

    pub fn uniform(n: usize) -> Self {
        Self(vec![1.0 / n.max(1) as f64; n.max(1)])
    }

    /// All weight on a single action. Fails when `action` is not below `n`.
    pub fn pure(n: usize, action: usize) -> Result<Self> {
        if action >= n {
            return Err(SimError::config(format!(
                "pure strategy action {action} is out of range for {n} actions"
            )));
        }
        let mut probs = vec![0.0; n];
        probs[action] = 1.0;
        Ok(Self(probs))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn probs(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, action: usize) -> f64 {
        self.0.get(action).copied().unwrap_or(0.0)
    }

    pub fn support(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|&(_, p)| *p > PROBABILITY_EPSILON)
            .map(|(i, _)| i)
            .collect()
    }
}

impl TryFrom<Vec<f64>> for StrategyVector {
    type Error = SimError;

    fn try_from(probs: Vec<f64>) -> Result<Self> {
        Self::new(probs)
    }
}

impl From<StrategyVector> for Vec<f64> {
    fn from(strategy: StrategyVector) -> Self {
        strategy.0
    }
}

impl fmt::Display for StrategyVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p:.4}")?;
        }
        write!(f, "]")
    }
}

/// One mixed-strategy Nash equilibrium of the bimatrix game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equilibrium {
    pub defender: StrategyVector,
    pub attacker: StrategyVector,
}

/// Payoff pair for the defender/attacker game. Defender rows are (RBAC, ABAC),
/// attacker columns are (phishing, token theft).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub defender_payoffs: PayoffMatrix,
    pub attacker_payoffs: PayoffMatrix,
}

impl GameConfig {
    pub fn new(defender: Vec<Vec<f64>>, attacker: Vec<Vec<f64>>) -> Result<Self> {
        Ok(Self {
            defender_payoffs: PayoffMatrix::new(defender)?,
            attacker_payoffs: PayoffMatrix::new(attacker)?,
        })
    }

    pub fn solve(&self) -> Result<Vec<Equilibrium>> {
        EquilibriumSolver::default().solve(&self.defender_payoffs, &self.attacker_payoffs)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            defender_payoffs: PayoffMatrix {
                rows: 2,
                cols: 2,
                data: vec![4.1, -4.0, -2.8, 4.2],
            },
            attacker_payoffs: PayoffMatrix {
                rows: 2,
                cols: 2,
                data: vec![-0.8, 0.8, 2.1, -0.6],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_strategy_bounds() {
        let s = StrategyVector::pure(3, 2).unwrap();
        assert_eq!(s.probs(), &[0.0, 0.0, 1.0]);
        assert!(matches!(
            StrategyVector::pure(2, 2),
            Err(SimError::Configuration { .. })
        ));
        assert!(StrategyVector::pure(0, 0).is_err());
    }

    #[test]
    fn test_payoff_matrix_validation() {
        assert!(PayoffMatrix::new(vec![]).is_err());
        assert!(PayoffMatrix::new(vec![vec![]]).is_err());
        assert!(PayoffMatrix::new(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(PayoffMatrix::new(vec![vec![1.0, f64::INFINITY]]).is_err());

        let m = PayoffMatrix::new(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(1, 2), 6.0);
    }

    #[test]
    fn test_expected_payoffs() {
        let m = PayoffMatrix::new(vec![vec![1.0, 0.0], vec![0.0, 2.0]]).unwrap();
        assert_eq!(m.row_payoffs(&[0.5, 0.5]), vec![0.5, 1.0]);
        assert_eq!(m.col_payoffs(&[0.25, 0.75]), vec![0.25, 1.5]);
    }

    #[test]
    fn test_strategy_vector_validation() {
        assert!(StrategyVector::new(vec![]).is_err());
        assert!(StrategyVector::new(vec![0.7, 0.7]).is_err());
        assert!(StrategyVector::new(vec![1.5, -0.5]).is_err());
        let s = StrategyVector::new(vec![1.0, 0.0]).unwrap();
        assert_eq!(s.support(), vec![0]);
        assert_eq!(StrategyVector::uniform(4).get(3), 0.25);
    }

    #[test]
    fn test_default_game_round_trips_through_json() {
        let game = GameConfig::default();
        let json = serde_json::to_string(&game).unwrap();
        assert!(json.contains("[[4.1,-4.0],[-2.8,4.2]]"));
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, game);
    }
}
