use super::config::ActivationOrder;
use rand::Rng;
use rand::seq::SliceRandom;

/// Fresh random activation order over agent indices, rebuilt every step.
#[derive(Debug, Clone)]
pub struct RandomSequencer {
    order: Vec<usize>,
    controller: usize,
    mode: ActivationOrder,
}

impl RandomSequencer {
    /// `agent_count` includes the controller, which sits at index `controller`.
    pub fn new(agent_count: usize, controller: usize, mode: ActivationOrder) -> Self {
        Self {
            order: (0..agent_count).collect(),
            controller,
            mode,
        }
    }

    pub fn next_order<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &[usize] {
        self.order.shuffle(rng);
        if self.mode == ActivationOrder::ControllerLast {
            if let Some(pos) = self.order.iter().position(|&i| i == self.controller) {
                let last = self.order.len() - 1;
                self.order.swap(pos, last);
            }
        }
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_order_is_permutation() {
        let mut seq = RandomSequencer::new(20, 19, ActivationOrder::Shuffled);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut order = seq.next_order(&mut rng).to_vec();
        order.sort_unstable();
        assert_eq!(order, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_controller_last() {
        let mut seq = RandomSequencer::new(30, 29, ActivationOrder::ControllerLast);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            assert_eq!(*seq.next_order(&mut rng).last().unwrap(), 29);
        }
    }

    #[test]
    fn test_shuffled_moves_controller() {
        let mut seq = RandomSequencer::new(10, 9, ActivationOrder::Shuffled);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let positions: Vec<usize> = (0..100)
            .map(|_| seq.next_order(&mut rng).iter().position(|&i| i == 9).unwrap())
            .collect();
        assert!(positions.iter().any(|&p| p != 9));
    }

    #[test]
    fn test_orders_change_between_steps() {
        let mut seq = RandomSequencer::new(50, 49, ActivationOrder::ControllerLast);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let first = seq.next_order(&mut rng).to_vec();
        let second = seq.next_order(&mut rng).to_vec();
        assert_ne!(first, second);
    }
}
