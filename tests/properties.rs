use policymix::controllers::adaptive::AdaptiveController;
use policymix::controllers::{Controller, ControllerConfig};
use policymix::{MetricsRecorder, PolicyMix};
use proptest::prelude::*;

proptest! {
    #[test]
    fn mix_stays_on_the_simplex(rbac in any::<f64>()) {
        let mix = PolicyMix::from_rbac(rbac);
        prop_assert!((0.0..=1.0).contains(&mix.rbac_weight()));
        prop_assert!((0.0..=1.0).contains(&mix.abac_weight()));
        prop_assert!((mix.rbac_weight() + mix.abac_weight() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn controller_output_is_bounded(
        rbac in 0.0f64..=1.0,
        breach_rate in 0.0f64..=1.0,
        step in 0usize..500,
        k_s in 0.0f64..5.0,
        k_u in 0.0f64..5.0,
    ) {
        let config = ControllerConfig { k_s, k_u, ..Default::default() };
        let mut controller = AdaptiveController::new(config);
        let next = controller.step(PolicyMix::from_rbac(rbac), breach_rate, step);
        prop_assert!((0.0..=1.0).contains(&next.rbac_weight()));
        prop_assert!((next.rbac_weight() + next.abac_weight() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn breaches_never_exceed_attempts(outcomes in prop::collection::vec(any::<bool>(), 0..500)) {
        let mut recorder = MetricsRecorder::new(10);
        for breached in &outcomes {
            recorder.record_attempt(*breached);
        }
        let counters = recorder.counters();
        prop_assert_eq!(counters.access_attempts, outcomes.len() as u64);
        prop_assert!(counters.breach_count <= counters.access_attempts);
        prop_assert!((0.0..=1.0).contains(&recorder.instantaneous_rate()));
    }

    #[test]
    fn breach_free_history_averages_to_zero(samples in 0usize..100, window in 1usize..50) {
        let mut recorder = MetricsRecorder::new(window);
        for _ in 0..samples {
            recorder.record_attempt(false);
            recorder.sample_rate();
        }
        prop_assert_eq!(recorder.moving_breach_rate(), 0.0);
    }
}
