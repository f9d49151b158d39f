pub mod config;
pub mod sequencer;

pub use config::{ActivationOrder, SimConfig, Seeding};
pub use sequencer::RandomSequencer;

use crate::agent::{Agent, AttackerAgent, ControllerAgent, EmployeeAgent, EmployeeProfile};
use crate::attack::AttackerModel;
use crate::controllers::{Controller, ControllerRegistry};
use crate::error::{Result, SimError};
use crate::game::{Equilibrium, StrategyVector};
use crate::metrics::analyzer::{self, AnalysisReport};
use crate::metrics::logger::MetricsLogger;
use crate::metrics::{Counters, MetricsRecorder, MetricsSnapshot, UsageCounters};
use crate::policy::PolicyMix;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    /// Built, no step taken yet.
    Configured,
    Running,
}

/// Everything a run produces, in a form the plotting and comparison tools can read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub name: String,
    pub seed: u64,
    pub initial_policy_mix: PolicyMix,
    pub attacker_strategy: StrategyVector,
    pub equilibria: Vec<Equilibrium>,
    pub counters: Counters,
    pub usage: UsageCounters,
    pub final_policy_mix: PolicyMix,
    pub time_series: Vec<MetricsSnapshot>,
}

pub struct Simulation {
    config: SimConfig,
    seed: u64,
    rng: ChaCha8Rng,
    initial_policy_mix: PolicyMix,
    policy_mix: PolicyMix,
    attacker_strategy: StrategyVector,
    equilibria: Vec<Equilibrium>,
    attacker_model: AttackerModel,
    controller: Box<dyn Controller>,
    agents: Vec<Agent>,
    sequencer: RandomSequencer,
    steps_run: usize,
    metrics: MetricsRecorder,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let (initial_policy_mix, attacker_strategy, equilibria) = match config.seeding {
            Seeding::Manual => (config.initial_policy_mix, config.attacker_strategy()?, Vec::new()),
            Seeding::Equilibrium => {
                let equilibria = config.game.solve()?;
                let first = &equilibria[0];
                let mix = PolicyMix::new(first.defender.get(0), first.defender.get(1))?;
                let attacker = first.attacker.clone();
                info!("Seeding from equilibrium: mix {}, attacker {}", mix, attacker);
                (mix, attacker, equilibria)
            }
        };

        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::thread_rng().r#gen();
                info!("No seed given, using {}", seed);
                seed
            }
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let controller = ControllerRegistry::global()
            .create(&config.controller_name, &config.controller)
            .ok_or_else(|| SimError::config(format!("unknown controller: {}", config.controller_name)))?;

        let employees = config.num_employees;
        let attackers = config.num_attackers;
        let mut agents = Vec::with_capacity((employees + attackers + 1) as usize);
        for id in 0..employees {
            agents.push(Agent::Employee(EmployeeAgent::new(id, EmployeeProfile::random(&mut rng))));
        }
        for i in 0..attackers {
            agents.push(Agent::Attacker(AttackerAgent::new(employees + i)));
        }
        agents.push(Agent::Controller(ControllerAgent {
            id: employees + attackers + 1,
            activations: 0,
        }));

        let sequencer = RandomSequencer::new(agents.len(), agents.len() - 1, config.activation_order);
        let metrics = MetricsRecorder::new(config.moving_window);

        Ok(Self {
            attacker_model: AttackerModel::new(config.attacker_model.clone()),
            config,
            seed,
            rng,
            initial_policy_mix,
            policy_mix: initial_policy_mix,
            attacker_strategy,
            equilibria,
            controller,
            agents,
            sequencer,
            steps_run: 0,
            metrics,
        })
    }

    /// Bare engine: attackers and the controller only, default constants.
    pub fn with_parameters(
        num_attackers: u32,
        initial_policy_mix: PolicyMix,
        attacker_strategy: StrategyVector,
        moving_window: usize,
    ) -> Result<Self> {
        let config = SimConfig::default()
            .with_employees(0)
            .with_attackers(num_attackers)
            .with_policy_mix(initial_policy_mix)
            .with_attacker_strategy(attacker_strategy.into())
            .with_window(moving_window);
        Self::new(config)
    }

    /// One tick: sample the breach rate, then activate every agent once in a fresh random order.
    pub fn step(&mut self) {
        self.metrics.sample_rate();
        // Fixed for the whole step; attacks below do not feed back until the next one.
        let breach_rate_ma = self.metrics.moving_breach_rate();
        let history_len = self.metrics.breach_history().len();

        let order = self.sequencer.next_order(&mut self.rng);
        for &idx in order {
            match &mut self.agents[idx] {
                Agent::Attacker(attacker) => {
                    let outcome = self.attacker_model.sample_attack(
                        self.policy_mix,
                        Some(&self.attacker_strategy),
                        &mut self.rng,
                    );
                    attacker.record(outcome);
                    self.metrics.record_attempt(outcome.breached);
                }
                Agent::Employee(employee) => {
                    if let Some(granted) = employee.activate(self.config.employee_activity, &mut self.rng) {
                        self.metrics.record_legit_request(granted);
                    }
                }
                Agent::Controller(agent) => {
                    if history_len >= self.config.controller.min_history {
                        self.policy_mix = self.controller.step(self.policy_mix, breach_rate_ma, history_len);
                        agent.activations += 1;
                    }
                }
            }
        }

        let step = self.steps_run;
        self.steps_run += 1;
        self.metrics.save_snapshot(step, self.policy_mix);

        if step % 10 == 0 {
            debug!(
                "Step {}: policy mix = {}, moving average breach = {:.4}",
                step, self.policy_mix, breach_rate_ma
            );
        }
    }

    pub fn run_for(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Runs the configured number of steps and returns the report.
    pub fn run(&mut self) -> SimulationReport {
        info!("Starting simulation: {}", self.config.name);
        info!("Controller: {}", self.controller.name());
        info!(
            "Employees: {}, Attackers: {}, Steps: {}",
            self.config.num_employees, self.config.num_attackers, self.config.steps
        );
        info!("Initial policy mix: {}", self.policy_mix);

        let pb = if self.config.show_progress {
            ProgressBar::new(self.config.steps as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );

        for _ in 0..self.config.steps {
            self.step();
            pb.inc(1);
            pb.set_message(format!(
                "RBAC {:.2} | Breach MA {:.4}",
                self.policy_mix.rbac_weight(),
                self.metrics.moving_breach_rate()
            ));
        }
        pb.finish_with_message("Simulation complete");

        let counters = self.metrics.counters();
        info!("Final policy mix: {}", self.policy_mix);
        info!(
            "Attempts: {}, Breaches: {}, Instant rate: {:.4}, Moving average: {:.4}",
            counters.access_attempts,
            counters.breach_count,
            self.metrics.instantaneous_rate(),
            self.metrics.moving_breach_rate()
        );

        self.report()
    }

    /// Rebuilds from the same config and seed, so the next run repeats this one.
    pub fn reset(&mut self) -> Result<()> {
        let mut config = self.config.clone();
        config.seed = Some(self.seed);
        *self = Simulation::new(config)?;
        Ok(())
    }

    pub fn state(&self) -> SimState {
        if self.steps_run == 0 {
            SimState::Configured
        } else {
            SimState::Running
        }
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            name: self.config.name.clone(),
            seed: self.seed,
            initial_policy_mix: self.initial_policy_mix,
            attacker_strategy: self.attacker_strategy.clone(),
            equilibria: self.equilibria.clone(),
            counters: self.metrics.counters(),
            usage: self.metrics.usage(),
            final_policy_mix: self.policy_mix,
            time_series: self.metrics.snapshots().to_vec(),
        }
    }

    pub fn analysis(&self) -> AnalysisReport {
        analyzer::analyze(
            self.metrics.snapshots(),
            self.metrics.counters(),
            self.metrics.usage(),
            self.policy_mix,
            &self.config.name,
        )
    }

    /// Writes the time series (CSV), the full report and its analysis (JSON) into `dir`.
    pub fn save_results(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let stem = format!("{}_{}", self.config.name, timestamp);

        let csv_path = dir.join(format!("{stem}.csv"));
        let mut logger = MetricsLogger::new(&csv_path)?;
        logger.log_batch(self.metrics.snapshots())?;
        info!("Results saved to: {}", csv_path.display());

        let report_path = dir.join(format!("{stem}_report.json"));
        std::fs::write(&report_path, serde_json::to_string_pretty(&self.report())?)?;
        info!("Report saved to: {}", report_path.display());

        let analysis_path = dir.join(format!("{stem}_analysis.json"));
        std::fs::write(&analysis_path, serde_json::to_string_pretty(&self.analysis())?)?;
        info!("Analysis saved to: {}", analysis_path.display());

        Ok(vec![csv_path, report_path, analysis_path])
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn policy_mix(&self) -> PolicyMix {
        self.policy_mix
    }

    pub fn attacker_strategy(&self) -> &StrategyVector {
        &self.attacker_strategy
    }

    pub fn equilibria(&self) -> &[Equilibrium] {
        &self.equilibria
    }

    pub fn counters(&self) -> Counters {
        self.metrics.counters()
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn moving_window(&self) -> usize {
        self.metrics.moving_window()
    }

    pub fn breach_history(&self) -> &[f64] {
        self.metrics.breach_history()
    }

    pub fn time_series(&self) -> &[MetricsSnapshot] {
        self.metrics.snapshots()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn steps_run(&self) -> usize {
        self.steps_run
    }
}
