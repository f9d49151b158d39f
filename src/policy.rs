use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used whenever a probability vector has to sum to one.
pub const PROBABILITY_EPSILON: f64 = 1e-6;

/// Share of access decisions evaluated under RBAC vs ABAC semantics.
///
/// `abac_weight` is always stored as `1.0 - rbac_weight`, so the pair sums to
/// one up to a single rounding step no matter how often it is updated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
pub struct PolicyMix {
    rbac_weight: f64,
    abac_weight: f64,
}

impl PolicyMix {
    pub const BALANCED: PolicyMix = PolicyMix { rbac_weight: 0.5, abac_weight: 0.5 };
    pub const PURE_RBAC: PolicyMix = PolicyMix { rbac_weight: 1.0, abac_weight: 0.0 };
    pub const PURE_ABAC: PolicyMix = PolicyMix { rbac_weight: 0.0, abac_weight: 1.0 };

    pub fn new(rbac_weight: f64, abac_weight: f64) -> Result<Self> {
        if !rbac_weight.is_finite() || !abac_weight.is_finite() {
            return Err(SimError::config("policy mix weights must be finite"));
        }
        if rbac_weight < 0.0 || abac_weight < 0.0 {
            return Err(SimError::config(format!(
                "policy mix weights must be non-negative, got ({rbac_weight}, {abac_weight})"
            )));
        }
        if (rbac_weight + abac_weight - 1.0).abs() > PROBABILITY_EPSILON {
            return Err(SimError::config(format!(
                "policy mix must sum to 1, got ({rbac_weight}, {abac_weight})"
            )));
        }
        Ok(Self::from_rbac(rbac_weight))
    }

    /// Builds a mix from the RBAC share alone, clamping silently into [0, 1].
    pub fn from_rbac(rbac_weight: f64) -> Self {
        let rbac_weight = if rbac_weight.is_nan() { 0.0 } else { rbac_weight.clamp(0.0, 1.0) };
        Self {
            rbac_weight,
            abac_weight: 1.0 - rbac_weight,
        }
    }

    pub fn rbac_weight(&self) -> f64 {
        self.rbac_weight
    }

    pub fn abac_weight(&self) -> f64 {
        self.abac_weight
    }
}

impl Default for PolicyMix {
    fn default() -> Self {
        Self::BALANCED
    }
}

impl TryFrom<(f64, f64)> for PolicyMix {
    type Error = SimError;

    fn try_from((rbac, abac): (f64, f64)) -> Result<Self> {
        Self::new(rbac, abac)
    }
}

impl From<PolicyMix> for (f64, f64) {
    fn from(mix: PolicyMix) -> Self {
        (mix.rbac_weight, mix.abac_weight)
    }
}

impl fmt::Display for PolicyMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(RBAC {:.3}, ABAC {:.3})", self.rbac_weight, self.abac_weight)
    }
}
