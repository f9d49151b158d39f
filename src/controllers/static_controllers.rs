// Baselines for pure RBAC / pure ABAC runs: the mix set at construction is held.

use super::Controller;
use crate::policy::PolicyMix;

#[derive(Debug, Clone, Default)]
pub struct StaticController;

impl StaticController {
    pub fn new() -> Self {
        Self
    }
}

impl Controller for StaticController {
    fn step(&mut self, mix: PolicyMix, _breach_rate_ma: f64, _step_index: usize) -> PolicyMix {
        mix
    }

    fn name(&self) -> &str {"Static"}

    fn reset(&mut self) {}

    fn clone_box(&self) -> Box<dyn Controller> {
        Box::new(self.clone())
    }
}
