use super::{Controller, ControllerConfig};
use crate::policy::PolicyMix;
use tracing::trace;

/// Proportional controller on two errors with damping that fades out over
/// `ramp_steps`, so early steps move the mix slowly.
#[derive(Debug, Clone)]
pub struct AdaptiveController {
    config: ControllerConfig,
}

impl AdaptiveController {
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Damping weight kept on the current mix at `step_index`.
    pub fn damping_at(&self, step_index: usize) -> f64 {
        let progress = (step_index as f64 / self.config.ramp_steps as f64).min(1.0);
        self.config.damping_factor * (1.0 - progress)
    }

    /// Raw RBAC correction before damping and clamping.
    pub fn delta(&self, mix: PolicyMix, breach_rate_ma: f64) -> f64 {
        let error_security = breach_rate_ma - self.config.target_breach_rate;
        let error_usability = self.config.target_abac_share - mix.abac_weight();
        self.config.k_s * error_security - self.config.k_u * error_usability
    }
}

impl Controller for AdaptiveController {
    fn step(&mut self, mix: PolicyMix, breach_rate_ma: f64, step_index: usize) -> PolicyMix {
        let delta = self.delta(mix, breach_rate_ma);
        let rbac = mix.rbac_weight();
        let raw = (rbac + delta).clamp(0.0, 1.0);

        let damping = self.damping_at(step_index);
        let next = PolicyMix::from_rbac(rbac * damping + raw * (1.0 - damping));

        trace!(
            "controller step {}: delta {:.5}, damping {:.3}, {} -> {}",
            step_index, delta, damping, mix, next
        );
        next
    }

    fn name(&self) -> &str {
        "Adaptive"
    }

    fn reset(&mut self) {}

    fn clone_box(&self) -> Box<dyn Controller> {
        Box::new(self.clone())
    }
}
