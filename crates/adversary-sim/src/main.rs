//! CLI entry point for the adversary simulation driver.
//!
//! `generate` produces a complete scenario in one shot; `play` runs the
//! turn-based loop, one defensive choice per attacker move, either
//! interactively or scripted via `--auto`.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use adversary_core::config::AdversaryConfig;
use adversary_core::types::{AttackStep, ScenarioInput};
use adversary_gen::mitre::{MitreExplainer, MitreKind};
use adversary_gen::{GeneratorConfig, LlmClient, ScenarioGenerator};
use adversary_history::store::FileHistoryStore;
use adversary_history::{export, HistoryStore};
use adversary_sim::SimulationSession;

#[derive(Parser)]
#[command(name = "adversary-sim")]
#[command(about = "Turn-based Active Directory attack simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: adversary).
    #[arg(short, long, default_value = "adversary", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a complete scenario in one call.
    Generate {
        /// Environment description, inline.
        #[arg(long, conflicts_with = "environment_file")]
        environment: Option<String>,
        /// Read the environment description from a file.
        #[arg(long)]
        environment_file: Option<PathBuf>,
        /// Primary attack vector.
        #[arg(long, default_value = "Kerberoasting")]
        attack: String,
        /// Special instructions for the generation service.
        #[arg(long, default_value = "")]
        directives: String,
        /// Write the export file to this path (default: print JSON to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip archiving the scenario to history.
        #[arg(long)]
        no_history: bool,
    },
    /// Play a turn-based simulation.
    Play {
        #[arg(long, conflicts_with = "environment_file")]
        environment: Option<String>,
        #[arg(long)]
        environment_file: Option<PathBuf>,
        #[arg(long, default_value = "Kerberoasting")]
        attack: String,
        #[arg(long, default_value = "")]
        directives: String,
        /// Override the configured step cap.
        #[arg(long)]
        max_steps: Option<u32>,
        /// Drive non-interactively: pick the nth defensive option every
        /// turn, or "random".
        #[arg(long)]
        auto: Option<String>,
    },
    /// Manage the archived scenario history.
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
    /// Validate an export file and print a summary.
    Inspect {
        file: PathBuf,
    },
    /// Explain a MITRE ATT&CK tactic or technique.
    Explain {
        term: String,
        /// "tactic" or "technique".
        #[arg(long, default_value = "technique")]
        kind: String,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List archived scenarios, most recent first.
    List,
    /// Delete every archived entry.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = AdversaryConfig::load(&cli.config)?;

    match cli.command {
        Command::Generate {
            environment,
            environment_file,
            attack,
            directives,
            output,
            no_history,
        } => {
            let input = build_input(environment, environment_file, attack, directives)?;
            let mut session = build_session(&config)?;

            session.generate(input).await?;
            let entry = session
                .export_entry()
                .ok_or_else(|| anyhow::anyhow!("generation produced no scenario"))?;

            println!("Title:  {}", entry.title());
            println!(
                "Hosts:  {}   Steps: {}",
                entry.scenario_data.network_topology.nodes.len(),
                entry.scenario_data.steps.len()
            );
            match output {
                Some(path) => {
                    std::fs::write(&path, serde_json::to_vec_pretty(&entry)?)?;
                    println!("Export written to {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&entry)?),
            }

            if !no_history {
                let entries = session.clear()?;
                tracing::info!(history_entries = entries, "Scenario archived");
            }
        }
        Command::Play {
            environment,
            environment_file,
            attack,
            directives,
            max_steps,
            auto,
        } => {
            let input = build_input(environment, environment_file, attack, directives)?;
            let picker = auto.map(|value| parse_auto(&value)).transpose()?;
            let mut session = build_session(&config)?;
            play(
                &mut session,
                input,
                max_steps.unwrap_or(config.max_steps),
                picker,
            )
            .await?;
        }
        Command::History { command } => {
            let mut store = FileHistoryStore::new(&config.history_dir, config.history_limit)?;
            match command {
                HistoryCommand::List => {
                    let records = store.list()?;
                    if records.is_empty() {
                        println!("No archived scenarios.");
                    }
                    for (i, record) in records.iter().enumerate() {
                        let when = record
                            .entry
                            .timestamp
                            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                            .unwrap_or_else(|| "unknown".to_string());
                        println!(
                            "{:2}. {}  {}  ({} steps)",
                            i + 1,
                            when,
                            record.entry.title(),
                            record.entry.scenario_data.steps.len()
                        );
                    }
                }
                HistoryCommand::Clear => {
                    store.clear()?;
                    println!("History cleared.");
                }
            }
        }
        Command::Inspect { file } => {
            let entry = export::read_export(&file)?;
            let scenario = &entry.scenario_data;
            println!("Title:     {}", scenario.title);
            println!("Vector:    {}", entry.user_input.attack_type);
            println!(
                "Topology:  {} hosts, {} edges",
                scenario.network_topology.nodes.len(),
                scenario.network_topology.edges.len()
            );
            println!("Steps:     {}", scenario.steps.len());
            if let Some(last) = scenario.steps.last() {
                println!("Posture:   {:?} after step {}", last.security_posture, last.step);
            }
        }
        Command::Explain { term, kind } => {
            let kind = match kind.as_str() {
                "tactic" => MitreKind::Tactic,
                "technique" => MitreKind::Technique,
                other => anyhow::bail!("unknown kind {other:?}; use tactic or technique"),
            };
            let client = Arc::new(LlmClient::new(GeneratorConfig::from(&config))?);
            let explainer = MitreExplainer::new(client);
            println!("{}", explainer.explain(kind, &term).await?);
        }
    }

    Ok(())
}

/// How `--auto` picks among the defensive options each turn.
#[derive(Clone, Copy)]
enum AutoPicker {
    /// 1-based fixed index, clamped to the available options.
    Nth(usize),
    Random,
}

fn parse_auto(value: &str) -> anyhow::Result<AutoPicker> {
    if value.eq_ignore_ascii_case("random") {
        return Ok(AutoPicker::Random);
    }
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(AutoPicker::Nth(n)),
        _ => anyhow::bail!("--auto takes a 1-based option number or \"random\""),
    }
}

impl AutoPicker {
    fn pick(self, choices: &[String]) -> String {
        let index = match self {
            AutoPicker::Nth(n) => (n - 1).min(choices.len() - 1),
            AutoPicker::Random => {
                let nanos = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.subsec_nanos())
                    .unwrap_or(0);
                nanos as usize % choices.len()
            }
        };
        choices[index].clone()
    }
}

async fn play(
    session: &mut SimulationSession<FileHistoryStore>,
    input: ScenarioInput,
    max_steps: u32,
    picker: Option<AutoPicker>,
) -> anyhow::Result<()> {
    session.start(input).await?;

    loop {
        let step = session
            .current_step()
            .ok_or_else(|| anyhow::anyhow!("simulation has no current step"))?
            .clone();
        render_step(&step);

        if step.defensive_choices.is_empty() || step.step >= max_steps {
            println!("\n── Simulation complete ──");
            break;
        }

        let choice = match picker {
            Some(picker) => {
                let choice = picker.pick(&step.defensive_choices);
                println!("\nAuto response: {choice}");
                Some(choice)
            }
            None => prompt_choice(&step.defensive_choices)?,
        };
        let choice = match choice {
            Some(choice) => choice,
            None => break,
        };

        if let Err(e) = session.take_action(&choice).await {
            eprintln!("Continuation failed: {e}");
            session.dismiss_error();
            if picker.is_some() {
                // No retry policy; a scripted run stops at the first failure.
                break;
            }
            continue;
        }
    }

    let entries = session.clear()?;
    println!("Archived to history ({entries} entries).");
    Ok(())
}

fn render_step(step: &AttackStep) {
    println!("\n━━ Step {}: {} ━━", step.step, step.title);
    println!("{}", step.description);
    println!("\nTarget: {}", step.target_host_id);
    if !step.commands.is_empty() {
        println!("\nAttacker commands:");
        for command in &step.commands {
            println!("  [{:?}] {}", command.language, command.command);
        }
    }
    if !step.system_alerts.is_empty() {
        println!("\nSystem alerts:");
        for alert in &step.system_alerts {
            println!("  ! {alert}");
        }
    }
    println!(
        "\nCompromised: {}",
        step.compromised_host_ids
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Security posture: {:?}", step.security_posture);
}

/// Present the numbered choices and read one from stdin. `None` means the
/// user quit.
fn prompt_choice(choices: &[String]) -> anyhow::Result<Option<String>> {
    println!("\nDefensive options:");
    for (i, choice) in choices.iter().enumerate() {
        println!("  {}. {}", i + 1, choice);
    }
    print!("Choose an action (number, or q to quit): ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let line = line.trim();

    if line.eq_ignore_ascii_case("q") || line.is_empty() {
        return Ok(None);
    }
    match line.parse::<usize>() {
        Ok(n) if n >= 1 && n <= choices.len() => Ok(Some(choices[n - 1].clone())),
        _ => Ok(Some(line.to_string())),
    }
}

fn build_input(
    environment: Option<String>,
    environment_file: Option<PathBuf>,
    attack_type: String,
    directives: String,
) -> anyhow::Result<ScenarioInput> {
    let environment = match (environment, environment_file) {
        (Some(inline), _) => inline,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?,
        (None, None) => anyhow::bail!("provide --environment or --environment-file"),
    };
    Ok(ScenarioInput::new(environment, attack_type, directives))
}

fn build_session(config: &AdversaryConfig) -> anyhow::Result<SimulationSession<FileHistoryStore>> {
    let client = LlmClient::new(GeneratorConfig::from(config))?;
    let generator: Arc<dyn ScenarioGenerator> = Arc::new(client);
    let history = FileHistoryStore::new(&config.history_dir, config.history_limit)?;
    Ok(SimulationSession::new(generator, history))
}
