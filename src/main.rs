// policymix: RBAC vs ABAC under attack. A game-theoretic starting point, then an
// agent-based run where a damped feedback controller keeps shifting the mix.

// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use policymix::controllers::ControllerRegistry;
use policymix::metrics::analyzer::{self, AnalysisReport};
use policymix::metrics::logger;
use policymix::simulation::config::PRESETS;
use policymix::simulation::{Seeding, SimConfig, Simulation};

use anyhow::Result;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        #[arg(short, long, default_value = "hybrid")]
        preset: String,
        /// JSON config file, flags below override it
        #[arg(short, long)]
        config: Option<String>,
        #[arg(short, long)]
        steps: Option<usize>,
        #[arg(short = 'n', long)]
        attackers: Option<u32>,
        #[arg(short, long)]
        employees: Option<u32>,
        #[arg(short, long)]
        window: Option<usize>,
        #[arg(long)]
        controller: Option<String>,
        /// Phishing and token theft probabilities, e.g. "0.5,0.5"
        #[arg(short, long)]
        attacker_strategy: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long, default_value = "results")]
        output: String,
        #[arg(long)]
        progress: bool,
    },

    Compare {
        #[arg(short, long, default_value = "hybrid,pure-rbac,pure-abac")]
        presets: String,
        #[arg(short, long, default_value_t = 100)]
        steps: usize,
        #[arg(short = 'n', long, default_value_t = 50)]
        attackers: u32,
        #[arg(short, long, default_value_t = 3)]
        repetitions: u32,
        #[arg(short, long)]
        attacker_strategy: Option<String>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(short, long, default_value = "results")]
        output: String,
    },

    Equilibria {
        #[arg(short, long)]
        config: Option<String>,
    },

    Analyze {
        #[arg(default_value = "results")]
        path: String,
    },

    List,
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            preset,
            config,
            steps,
            attackers,
            employees,
            window,
            controller,
            attacker_strategy,
            seed,
            output,
            progress,
        } => {
            let mut sim_config = match config {
                Some(path) => SimConfig::from_json_file(&path)?,
                None => SimConfig::preset(&preset)
                    .ok_or_else(|| anyhow::anyhow!("Unknown preset: {}", preset))?,
            };
            if let Some(steps) = steps {
                sim_config.steps = steps;
            }
            if let Some(attackers) = attackers {
                sim_config.num_attackers = attackers;
            }
            if let Some(employees) = employees {
                sim_config.num_employees = employees;
            }
            if let Some(window) = window {
                sim_config.moving_window = window;
            }
            if let Some(controller) = controller {
                sim_config.controller_name = controller;
            }
            if let Some(strategy) = attacker_strategy {
                if sim_config.seeding == Seeding::Equilibrium {
                    warn!("Attacker strategy is taken from the equilibrium, ignoring --attacker-strategy");
                } else {
                    sim_config.attacker_strategy = parse_probabilities(&strategy)?;
                }
            }
            if seed.is_some() {
                sim_config.seed = seed;
            }
            sim_config.show_progress = progress;

            run_single_simulation(sim_config, &output)?;
        }

        Commands::Compare {
            presets,
            steps,
            attackers,
            repetitions,
            attacker_strategy,
            seed,
            output,
        } => {
            let strategy = attacker_strategy
                .map(|s| parse_probabilities(&s))
                .transpose()?;
            compare_presets(
                &presets,
                steps,
                attackers,
                repetitions,
                strategy,
                seed,
                &output,
                program_start,
            )?;
        }

        Commands::Equilibria { config } => {
            let sim_config = match config {
                Some(path) => SimConfig::from_json_file(&path)?,
                None => SimConfig::default(),
            };
            print_equilibria(&sim_config)?;
        }

        Commands::Analyze { path } => {
            analyze_results(&path)?;
        }

        Commands::List => {
            println!("\nAvailable Controllers");
            for name in ControllerRegistry::global().list() {
                println!("  - {}", name);
            }

            println!("\nAvailable Presets");
            for name in PRESETS {
                println!("  - {}", name);
            }

            println!("\nUsage: cargo run -- run --preset <name>");
            println!("Example: cargo run -- compare --repetitions 5\n");
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

fn run_single_simulation(config: SimConfig, output: &str) -> Result<()> {
    info!("policymix: Single Run");

    let mut sim = Simulation::new(config)?;
    for (i, eq) in sim.equilibria().iter().enumerate() {
        info!("Equilibrium {}: defender {}, attacker {}", i + 1, eq.defender, eq.attacker);
    }

    sim.run();
    sim.save_results(output)?;

    let report = sim.analysis();
    info!("Final policy mix: RBAC={:.2}, ABAC={:.2}", report.final_rbac_weight, report.final_abac_weight);
    info!("Mean moving average breach: {:.4}", report.mean_moving_avg_breach_rate);
    info!("Legitimate grant rate: {:.2}%", report.legit_grant_rate * 100.0);

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn compare_presets(
    presets_str: &str,
    steps: usize,
    attackers: u32,
    repetitions: u32,
    attacker_strategy: Option<Vec<f64>>,
    base_seed: u64,
    output: &str,
    global_start: Instant,
) -> Result<()> {
    let preset_names: Vec<&str> = presets_str
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if preset_names.is_empty() {
        anyhow::bail!("No presets given");
    }
    if repetitions == 0 {
        anyhow::bail!("Repetitions must be at least 1");
    }

    info!("policymix: Comparison");
    info!("Presets: {}", preset_names.join(", "));
    info!("Repetitions: {}", repetitions);
    info!("Steps per run: {}", steps);

    let mut all_reports = Vec::new();
    let mut overlay = Vec::new();

    for preset in &preset_names {
        let elapsed = global_start.elapsed();
        info!("[{}] Testing: {}", format_time(elapsed), preset);

        let mut base = SimConfig::preset(preset)
            .ok_or_else(|| anyhow::anyhow!("Unknown preset: {}", preset))?
            .with_steps(steps)
            .with_attackers(attackers);
        if let Some(strategy) = &attacker_strategy {
            if base.seeding == Seeding::Manual {
                base = base.with_attacker_strategy(strategy.clone());
            }
        }

        let runs = (0..repetitions)
            .into_par_iter()
            .map(|rep| {
                let config = base
                    .clone()
                    .with_name(format!("{}_{}", preset, rep + 1))
                    .with_seed(base_seed + rep as u64);
                let mut sim = Simulation::new(config)?;
                let report = sim.run();
                let mut analysis = sim.analysis();
                analysis.label = preset.to_string();
                let series: Vec<f64> = report
                    .time_series
                    .iter()
                    .map(|row| row.moving_avg_breach_rate)
                    .collect();
                Ok((analysis, series))
            })
            .collect::<policymix::Result<Vec<(AnalysisReport, Vec<f64>)>>>()?;

        let (reports, series): (Vec<_>, Vec<_>) = runs.into_iter().unzip();
        if let Some(avg) = analyzer::average_reports(&reports) {
            all_reports.push(avg);
        }
        overlay.push(analyzer::mean_series(&series));
    }

    comparison_table(&all_reports);

    std::fs::create_dir_all(output)?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

    let comparison_path = Path::new(output).join(format!("comparison_{}.json", timestamp));
    std::fs::write(&comparison_path, serde_json::to_string_pretty(&all_reports)?)?;
    info!("Comparison saved to: {}", comparison_path.display());

    let overlay_path = Path::new(output).join(format!("comparison_{}_breach_rate.csv", timestamp));
    let labels: Vec<String> = preset_names.iter().map(|s| s.to_string()).collect();
    logger::write_overlay(&overlay_path, &labels, &overlay)?;
    info!("Breach rate overlay saved to: {}", overlay_path.display());

    Ok(())
}

fn print_equilibria(config: &SimConfig) -> Result<()> {
    let game = &config.game;
    let equilibria = game.solve()?;

    println!("\nNash Equilibria ({}x{} game)", game.defender_payoffs.rows(), game.defender_payoffs.cols());
    for (i, eq) in equilibria.iter().enumerate() {
        println!("Equilibrium {}:", i + 1);
        println!("  Defender (RBAC, ABAC):         {}", eq.defender);
        println!("  Attacker (phishing, token):    {}", eq.attacker);
    }

    println!("\nExpected Payoffs for Pure Profiles:");
    for i in 0..game.defender_payoffs.rows() {
        for j in 0..game.defender_payoffs.cols() {
            println!(
                "  ({}, {}): defender {:>6.2}, attacker {:>6.2}",
                i,
                j,
                game.defender_payoffs.get(i, j),
                game.attacker_payoffs.get(i, j)
            );
        }
    }
    println!();

    Ok(())
}

fn analyze_results(path: &str) -> Result<()> {
    use std::fs;

    info!("Analyzing results in: {}", path);

    let mut reports = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let path = entry.path();

        if path.extension().and_then(|s| s.to_str()) == Some("json")
            && path.to_string_lossy().contains("analysis") {
            let content = fs::read_to_string(&path)?;
            let report: AnalysisReport = serde_json::from_str(&content)?;
            reports.push(report);
        }
    }

    if reports.is_empty() {
        info!("No analysis files found.");
        return Ok(());
    }

    comparison_table(&reports);

    Ok(())
}

fn parse_probabilities(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|e| anyhow::anyhow!("Invalid probability '{}': {}", p.trim(), e))
        })
        .collect()
}

fn format_time(duration: Duration) -> String {
    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

fn comparison_table(reports: &[AnalysisReport]) {
    println!("\n╔═══════════════╦═══════════╦═══════════╦════════════╦════════════╦═════════════╗");
    println!("║ Scenario      ║ Final     ║ Final     ║ Mean MA    ║ Peak MA    ║ Legit grant ║");
    println!("║               ║ RBAC      ║ ABAC      ║ breach (%) ║ breach (%) ║ (%)         ║");
    println!("╠═══════════════╬═══════════╬═══════════╬════════════╬════════════╬═════════════╣");

    for report in reports {
        println!(
            "║ {:<13} ║ {:>9.3} ║ {:>9.3} ║ {:>9.2}% ║ {:>9.2}% ║ {:>10.2}% ║",
            report.label,
            report.final_rbac_weight,
            report.final_abac_weight,
            report.mean_moving_avg_breach_rate * 100.0,
            report.peak_moving_avg_breach_rate * 100.0,
            report.legit_grant_rate * 100.0,
        );
    }

    println!("╚═══════════════╩═══════════╩═══════════╩════════════╩════════════╩═════════════╝\n");

    if let Some(best) = reports.iter().min_by(|a, b| {
        a.mean_moving_avg_breach_rate.total_cmp(&b.mean_moving_avg_breach_rate)
    }) {
        println!("Lowest Breach Rate: {} ({:.2}%)",
            best.label, best.mean_moving_avg_breach_rate * 100.0);
    }

    if let Some(worst) = reports.iter().max_by(|a, b| {
        a.peak_moving_avg_breach_rate.total_cmp(&b.peak_moving_avg_breach_rate)
    }) {
        println!("Highest Peak: {} ({:.2}%)",
            worst.label, worst.peak_moving_avg_breach_rate * 100.0);
    }

    println!();
}
