use crate::error::{Result, SimError};
use crate::game::StrategyVector;
use crate::policy::PolicyMix;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackCategory {
    Phishing,
    TokenTheft,
}

impl AttackCategory {
    pub const ALL: [AttackCategory; 2] = [AttackCategory::Phishing, AttackCategory::TokenTheft];

    /// Column of this category in the attacker's strategy vector.
    pub fn index(self) -> usize {
        match self {
            AttackCategory::Phishing => 0,
            AttackCategory::TokenTheft => 1,
        }
    }
}

impl fmt::Display for AttackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackCategory::Phishing => write!(f, "phishing"),
            AttackCategory::TokenTheft => write!(f, "token_theft"),
        }
    }
}

/// Success probability of one attack category under each enforcement style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseRates {
    pub rbac: f64,
    pub abac: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackerModelConfig {
    pub phishing: BaseRates,
    pub token_theft: BaseRates,
    /// Multiply the blended rate by the attacker's probability of the sampled category.
    #[serde(default)]
    pub scale_by_strategy_weight: bool,
}

impl Default for AttackerModelConfig {
    fn default() -> Self {
        Self {
            phishing: BaseRates { rbac: 0.16, abac: 0.42 },
            token_theft: BaseRates { rbac: 0.17, abac: 0.12 },
            scale_by_strategy_weight: false,
        }
    }
}

impl AttackerModelConfig {
    pub fn validate(&self) -> Result<()> {
        for (category, rates) in [("phishing", self.phishing), ("token_theft", self.token_theft)] {
            for rate in [rates.rbac, rates.abac] {
                if !(0.0..=1.0).contains(&rate) {
                    return Err(SimError::config(format!(
                        "{category} base rate {rate} is outside [0, 1]"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackOutcome {
    pub category: AttackCategory,
    pub breached: bool,
}

/// Aggregate success model for a single attack attempt.
#[derive(Debug, Clone)]
pub struct AttackerModel {
    config: AttackerModelConfig,
}

impl AttackerModel {
    pub fn new(config: AttackerModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AttackerModelConfig {
        &self.config
    }

    pub fn base_rates(&self, category: AttackCategory) -> BaseRates {
        match category {
            AttackCategory::Phishing => self.config.phishing,
            AttackCategory::TokenTheft => self.config.token_theft,
        }
    }

    /// Draws a category. `None` means the uniform 0.5/0.5 default.
    pub fn sample_category<R: Rng + ?Sized>(
        &self,
        strategy: Option<&StrategyVector>,
        rng: &mut R,
    ) -> AttackCategory {
        let phishing = strategy.map(|s| s.get(0)).unwrap_or(0.5);
        if rng.r#gen::<f64>() < phishing {
            AttackCategory::Phishing
        } else {
            AttackCategory::TokenTheft
        }
    }

    pub fn success_probability(
        &self,
        category: AttackCategory,
        mix: PolicyMix,
        strategy: Option<&StrategyVector>,
    ) -> f64 {
        let rates = self.base_rates(category);
        let blended = rates.rbac * mix.rbac_weight() + rates.abac * mix.abac_weight();

        if self.config.scale_by_strategy_weight {
            let weight = strategy.map(|s| s.get(category.index())).unwrap_or(0.5);
            blended * weight
        } else {
            blended
        }
    }

    /// Samples a category, then a breach outcome for it.
    pub fn sample_attack<R: Rng + ?Sized>(
        &self,
        mix: PolicyMix,
        strategy: Option<&StrategyVector>,
        rng: &mut R,
    ) -> AttackOutcome {
        let category = self.sample_category(strategy, rng);
        let p = self.success_probability(category, mix, strategy);
        AttackOutcome {
            category,
            breached: rng.r#gen::<f64>() < p,
        }
    }

    /// True when the attempt breaches. Counters are the caller's business.
    pub fn attempt<R: Rng + ?Sized>(
        &self,
        mix: PolicyMix,
        strategy: Option<&StrategyVector>,
        rng: &mut R,
    ) -> bool {
        self.sample_attack(mix, strategy, rng).breached
    }
}

impl Default for AttackerModel {
    fn default() -> Self {
        Self::new(AttackerModelConfig::default())
    }
}
