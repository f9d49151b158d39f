// Agents only keep what belongs to them. The policy mix, counters and breach
// history live in the simulation and are handed in on activation.

use crate::attack::{AttackCategory, AttackOutcome};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

pub type AgentId = u32;

#[derive(Debug, Clone)]
pub enum Agent {
    Attacker(AttackerAgent),
    Employee(EmployeeAgent),
    Controller(ControllerAgent),
}

impl Agent {
    pub fn id(&self) -> AgentId {
        match self {
            Agent::Attacker(a) => a.id,
            Agent::Employee(e) => e.id,
            Agent::Controller(c) => c.id,
        }
    }

    pub fn is_controller(&self) -> bool {
        matches!(self, Agent::Controller(_))
    }
}

#[derive(Debug, Clone)]
pub struct AttackerAgent {
    pub id: AgentId,
    pub last_category: Option<AttackCategory>,
    pub attempts: u64,
    pub breaches: u64,
}

impl AttackerAgent {
    pub fn new(id: AgentId) -> Self {
        Self {
            id,
            last_category: None,
            attempts: 0,
            breaches: 0,
        }
    }

    pub fn record(&mut self, outcome: AttackOutcome) {
        self.last_category = Some(outcome.category);
        self.attempts += 1;
        if outcome.breached {
            self.breaches += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerAgent {
    pub id: AgentId,
    pub activations: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Department {
    RnD,
    Finance,
    Hr,
    It,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Clearance {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    Office,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub department: Department,
    pub clearance: Clearance,
    pub location: Location,
    pub business_hours: bool,
}

impl EmployeeProfile {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        const DEPARTMENTS: [Department; 4] =
            [Department::RnD, Department::Finance, Department::Hr, Department::It];
        const CLEARANCES: [Clearance; 3] = [Clearance::Low, Clearance::Medium, Clearance::High];
        const LOCATIONS: [Location; 2] = [Location::Office, Location::Remote];

        // 60/30/10 split over low/medium/high, constant weights so this cannot fail
        let clearance = WeightedIndex::new([6u32, 3, 1])
            .map(|dist| CLEARANCES[dist.sample(rng)])
            .unwrap_or(Clearance::Low);

        Self {
            department: *DEPARTMENTS.choose(rng).unwrap_or(&Department::RnD),
            clearance,
            location: *LOCATIONS.choose(rng).unwrap_or(&Location::Office),
            business_hours: true,
        }
    }

    /// Attribute rule for routine requests.
    pub fn is_granted(&self) -> bool {
        match (self.clearance, self.department) {
            (Clearance::High, _) => true,
            (Clearance::Medium, Department::It) => true,
            _ => {
                self.location == Location::Office
                    && self.business_hours
                    && matches!(self.department, Department::RnD | Department::It)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmployeeAgent {
    pub id: AgentId,
    pub profile: EmployeeProfile,
    pub requests: u64,
    pub granted: u64,
}

impl EmployeeAgent {
    pub fn new(id: AgentId, profile: EmployeeProfile) -> Self {
        Self {
            id,
            profile,
            requests: 0,
            granted: 0,
        }
    }

    /// Maybe issues one legitimate request. Returns the grant decision if it did.
    pub fn activate<R: Rng + ?Sized>(&mut self, activity: f64, rng: &mut R) -> Option<bool> {
        if rng.r#gen::<f64>() >= activity {
            return None;
        }
        let granted = self.profile.is_granted();
        self.requests += 1;
        if granted {
            self.granted += 1;
        }
        Some(granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn profile(department: Department, clearance: Clearance, location: Location) -> EmployeeProfile {
        EmployeeProfile {
            department,
            clearance,
            location,
            business_hours: true,
        }
    }

    #[test]
    fn test_attribute_rule() {
        assert!(profile(Department::Hr, Clearance::High, Location::Remote).is_granted());
        assert!(profile(Department::It, Clearance::Medium, Location::Remote).is_granted());
        assert!(!profile(Department::Finance, Clearance::Medium, Location::Office).is_granted());
        assert!(profile(Department::RnD, Clearance::Low, Location::Office).is_granted());
        assert!(!profile(Department::RnD, Clearance::Low, Location::Remote).is_granted());

        let mut after_hours = profile(Department::It, Clearance::Low, Location::Office);
        after_hours.business_hours = false;
        assert!(!after_hours.is_granted());
    }

    #[test]
    fn test_attacker_record() {
        let mut attacker = AttackerAgent::new(3);
        attacker.record(AttackOutcome { category: AttackCategory::TokenTheft, breached: true });
        attacker.record(AttackOutcome { category: AttackCategory::Phishing, breached: false });
        assert_eq!(attacker.attempts, 2);
        assert_eq!(attacker.breaches, 1);
        assert_eq!(attacker.last_category, Some(AttackCategory::Phishing));
    }

    #[test]
    fn test_employee_activity_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut idle = EmployeeAgent::new(0, EmployeeProfile::random(&mut rng));
        for _ in 0..100 {
            assert_eq!(idle.activate(0.0, &mut rng), None);
        }

        let mut busy = EmployeeAgent::new(1, EmployeeProfile::random(&mut rng));
        for _ in 0..100 {
            assert!(busy.activate(1.0, &mut rng).is_some());
        }
        assert_eq!(busy.requests, 100);
        assert!(busy.granted == 0 || busy.granted == 100);
    }

    #[test]
    fn test_clearance_distribution() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let n = 10_000;
        let high = (0..n)
            .filter(|_| EmployeeProfile::random(&mut rng).clearance == Clearance::High)
            .count();
        let share = high as f64 / n as f64;
        assert!((share - 0.1).abs() < 0.02, "high clearance share {share}");
    }
}
