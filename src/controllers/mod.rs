pub mod adaptive;
pub mod static_controllers;

use crate::error::{Result, SimError};
use crate::policy::PolicyMix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Feedback law that turns the smoothed breach rate into the next policy mix.
pub trait Controller: Send + Sync + fmt::Debug {
    /// `step_index` is the number of breach-rate samples recorded so far.
    fn step(&mut self, mix: PolicyMix, breach_rate_ma: f64, step_index: usize) -> PolicyMix;
    fn name(&self) -> &str;
    fn reset(&mut self);
    fn clone_box(&self) -> Box<dyn Controller>;
}

impl Clone for Box<dyn Controller> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Gains and targets shared by the registered controllers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Gain on the security error (moving-average breach rate above target).
    pub k_s: f64,
    /// Gain on the usability error (ABAC share below target).
    pub k_u: f64,
    pub target_breach_rate: f64,
    pub target_abac_share: f64,
    pub damping_factor: f64,
    /// Steps over which damping decays to zero.
    pub ramp_steps: usize,
    /// Breach-rate samples needed before the controller acts.
    pub min_history: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            k_s: 0.15,
            k_u: 0.15,
            target_breach_rate: 0.0,
            target_abac_share: 0.5,
            damping_factor: 0.7,
            ramp_steps: 50,
            min_history: 3,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.damping_factor) {
            return Err(SimError::config(format!(
                "damping_factor {} is outside [0, 1]",
                self.damping_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.target_abac_share) {
            return Err(SimError::config(format!(
                "target_abac_share {} is outside [0, 1]",
                self.target_abac_share
            )));
        }
        if !(0.0..=1.0).contains(&self.target_breach_rate) {
            return Err(SimError::config(format!(
                "target_breach_rate {} is outside [0, 1]",
                self.target_breach_rate
            )));
        }
        if !self.k_s.is_finite() || !self.k_u.is_finite() {
            return Err(SimError::config("controller gains must be finite"));
        }
        if self.ramp_steps == 0 {
            return Err(SimError::config("ramp_steps must be positive"));
        }
        Ok(())
    }
}

type ControllerFactory = Box<dyn Fn(&ControllerConfig) -> Box<dyn Controller> + Send + Sync>;

pub struct ControllerRegistry {
    controllers: HashMap<String, ControllerFactory>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            controllers: HashMap::new(),
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register("adaptive", |cfg| Box::new(adaptive::AdaptiveController::new(cfg.clone())));
        self.register("damped", |cfg| Box::new(adaptive::AdaptiveController::new(cfg.clone())));
        self.register("static", |_| Box::new(static_controllers::StaticController::new()));
        self.register("fixed", |_| Box::new(static_controllers::StaticController::new()));
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ControllerConfig) -> Box<dyn Controller> + Send + Sync + 'static,
    {
        self.controllers.insert(name.to_lowercase(), Box::new(factory));
    }

    pub fn create(&self, name: &str, config: &ControllerConfig) -> Option<Box<dyn Controller>> {
        self.controllers
            .get(&name.to_lowercase())
            .map(|factory| factory(config))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.controllers.contains_key(&name.to_lowercase())
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.controllers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn global() -> &'static ControllerRegistry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<ControllerRegistry> = OnceLock::new();
        REGISTRY.get_or_init(ControllerRegistry::new)
    }
}

impl Default for ControllerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
