use crate::attack::AttackerModelConfig;
use crate::controllers::{ControllerConfig, ControllerRegistry};
use crate::error::{Result, SimError};
use crate::game::{GameConfig, StrategyVector};
use crate::policy::PolicyMix;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the initial policy mix and attacker strategy come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seeding {
    #[default]
    Manual,
    /// Use the first equilibrium of `game` for both.
    Equilibrium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationOrder {
    /// Attackers and employees shuffled, controller always last.
    #[default]
    ControllerLast,
    /// Controller shuffled in with everyone else. Attackers drawn after the
    /// controller attack under the mix it just set, so attacks no longer all
    /// precede the controller within a step.
    Shuffled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    pub controller_name: String,
    pub num_employees: u32,
    pub num_attackers: u32,
    pub steps: usize,
    pub moving_window: usize,
    pub initial_policy_mix: PolicyMix,
    pub attacker_strategy: Vec<f64>,
    pub seeding: Seeding,
    pub game: GameConfig,
    pub attacker_model: AttackerModelConfig,
    pub controller: ControllerConfig,
    pub employee_activity: f64,
    pub activation_order: ActivationOrder,
    pub seed: Option<u64>,
    pub show_progress: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "default_sim".to_string(),
            controller_name: "adaptive".to_string(),
            num_employees: 100,
            num_attackers: 50,
            steps: 100,
            moving_window: 10,
            initial_policy_mix: PolicyMix::BALANCED,
            attacker_strategy: vec![0.5, 0.5],
            seeding: Seeding::Manual,
            game: GameConfig::default(),
            attacker_model: AttackerModelConfig::default(),
            controller: ControllerConfig::default(),
            employee_activity: 0.2,
            activation_order: ActivationOrder::ControllerLast,
            seed: None,
            show_progress: false,
        }
    }
}

pub const PRESETS: [&str; 3] = ["hybrid", "pure-rbac", "pure-abac"];

impl SimConfig {
    /// Named scenarios: the adaptive hybrid seeded from the equilibrium, and
    /// two fixed single-model baselines.
    pub fn preset(name: &str) -> Option<Self> {
        let base = Self::default();
        let (canonical, config) = match name.to_lowercase().as_str() {
            "hybrid" => ("hybrid", base.with_controller("adaptive").with_equilibrium_seeding()),
            "pure-rbac" | "rbac" => (
                "pure-rbac",
                base.with_controller("static").with_policy_mix(PolicyMix::PURE_RBAC),
            ),
            "pure-abac" | "abac" => (
                "pure-abac",
                base.with_controller("static").with_policy_mix(PolicyMix::PURE_ABAC),
            ),
            _ => return None,
        };
        Some(config.with_name(canonical))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller_name = controller.into();
        self
    }

    pub fn with_policy_mix(mut self, mix: PolicyMix) -> Self {
        self.initial_policy_mix = mix;
        self.seeding = Seeding::Manual;
        self
    }

    pub fn with_attacker_strategy(mut self, strategy: Vec<f64>) -> Self {
        self.attacker_strategy = strategy;
        self
    }

    pub fn with_equilibrium_seeding(mut self) -> Self {
        self.seeding = Seeding::Equilibrium;
        self
    }

    pub fn with_attackers(mut self, attackers: u32) -> Self {
        self.num_attackers = attackers;
        self
    }

    pub fn with_employees(mut self, employees: u32) -> Self {
        self.num_employees = employees;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.moving_window = window;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(SimError::config("steps must be positive"));
        }
        if self.moving_window == 0 {
            return Err(SimError::config("moving_window must be positive"));
        }
        if !(0.0..=1.0).contains(&self.employee_activity) {
            return Err(SimError::config(format!(
                "employee_activity {} is outside [0, 1]",
                self.employee_activity
            )));
        }
        if !ControllerRegistry::global().contains(&self.controller_name) {
            return Err(SimError::config(format!(
                "unknown controller: {}",
                self.controller_name
            )));
        }
        self.attacker_strategy()?;
        self.attacker_model.validate()?;
        self.controller.validate()?;

        if self.seeding == Seeding::Equilibrium
            && (self.game.defender_payoffs.rows() != 2 || self.game.attacker_payoffs.cols() != 2)
        {
            return Err(SimError::config(
                "equilibrium seeding needs a 2x2 game: (RBAC, ABAC) x (phishing, token theft)",
            ));
        }
        Ok(())
    }

    pub fn attacker_strategy(&self) -> Result<StrategyVector> {
        let strategy = StrategyVector::new(self.attacker_strategy.clone())?;
        if strategy.len() != 2 {
            return Err(SimError::config(format!(
                "attacker strategy needs 2 entries (phishing, token theft), got {}",
                strategy.len()
            )));
        }
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
        for name in PRESETS {
            let config = SimConfig::preset(name).unwrap();
            assert!(config.validate().is_ok(), "{name}");
            assert_eq!(config.name, name);
        }
        assert!(SimConfig::preset("zero-trust").is_none());
    }

    #[test]
    fn test_aliases_use_canonical_name() {
        assert_eq!(SimConfig::preset("rbac").unwrap().name, "pure-rbac");
        assert_eq!(SimConfig::preset("ABAC").unwrap().name, "pure-abac");
        assert_eq!(SimConfig::preset("Hybrid").unwrap().name, "hybrid");
    }

    #[test]
    fn test_validation_failures() {
        assert!(SimConfig::default().with_steps(0).validate().is_err());
        assert!(SimConfig::default().with_window(0).validate().is_err());
        assert!(SimConfig::default().with_controller("pid").validate().is_err());
        assert!(SimConfig::default().with_attacker_strategy(vec![0.5, 0.6]).validate().is_err());
        assert!(SimConfig::default().with_attacker_strategy(vec![1.0]).validate().is_err());
        assert!(SimConfig::default().with_attacker_strategy(vec![0.2, 0.3, 0.5]).validate().is_err());

        let mut config = SimConfig::default();
        config.employee_activity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_equilibrium_seeding_needs_two_by_two() {
        let mut config = SimConfig::default().with_equilibrium_seeding();
        config.game = GameConfig::new(vec![vec![-5.0, -3.0]], vec![vec![3.0, 2.0]]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{"num_attackers": 5, "seed": 9, "controller": {"k_s": 0.3}}"#).unwrap();
        assert_eq!(config.num_attackers, 5);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.controller.k_s, 0.3);
        assert_eq!(config.controller.ramp_steps, 50);
        assert_eq!(config.moving_window, 10);
    }
}
