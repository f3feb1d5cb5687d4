//! Synheart Activity Sim CLI
//!
//! Interactive and scripted front ends for the activity simulation.

use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use synheart_activity_sim::{
    config::{Config, OutputFormat, SimulationConfig},
    display::{
        ConsoleRenderer, ConsoleSummary, JsonLinesRenderer, NullDisplay, Renderer, SummaryDisplay,
    },
    input::{InputEvent, TerminalCollector},
    stats::create_shared_log,
    Dashboard, SIMULATION_NOTICE, VERSION,
};
use tracing_subscriber::EnvFilter;

/// Longest the interactive loop waits before re-checking for Ctrl+C.
const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "synheart-activity")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Activity simulation for the health dashboard demo", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides shared by the commands that run a session.
#[derive(clap::Args, Debug, Clone)]
struct SimulationArgs {
    /// Seed for the sleep profile
    #[arg(long)]
    seed: Option<u64>,

    /// Steps added per activity
    #[arg(long)]
    steps: Option<u32>,

    /// BPM added per activity
    #[arg(long)]
    heart: Option<u32>,
}

impl SimulationArgs {
    fn apply(&self, simulation: &mut SimulationConfig) {
        if let Some(seed) = self.seed {
            simulation.seed = Some(seed);
        }
        if let Some(steps) = self.steps {
            simulation.step_increment = steps;
        }
        if let Some(heart) = self.heart {
            simulation.heart_increment = heart;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session (Arrow Up/Down or Space for activity)
    Run {
        #[command(flatten)]
        simulation: SimulationArgs,

        /// Output format (console or jsonl)
        #[arg(long)]
        format: Option<String>,
    },

    /// Run a scripted session on a virtual clock
    Simulate {
        #[command(flatten)]
        simulation: SimulationArgs,

        /// Comma-separated trigger times in milliseconds
        #[arg(long, default_value = "0")]
        triggers: String,

        /// Session time to run until, in milliseconds
        #[arg(long, default_value = "10000")]
        until: u64,

        /// Output format (console or jsonl)
        #[arg(long, default_value = "jsonl")]
        format: String,
    },

    /// Serve the dashboard over HTTP (requires server feature)
    Serve {
        #[command(flatten)]
        simulation: SimulationArgs,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },

    /// Display the simulation notice
    Notice,

    /// Show configuration
    Config {
        /// Write the default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { simulation, format } => {
            cmd_run(&simulation, format.as_deref());
        }
        Commands::Simulate {
            simulation,
            triggers,
            until,
            format,
        } => {
            cmd_simulate(&simulation, &triggers, until, &format);
        }
        Commands::Serve { simulation, port } => {
            cmd_serve(&simulation, port);
        }
        Commands::Notice => {
            cmd_notice();
        }
        Commands::Config { init } => {
            cmd_config(init);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config file and apply CLI overrides, exiting on invalid settings.
fn load_config(args: &SimulationArgs) -> Config {
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config ({e}); using defaults");
            Config::default()
        }
    };
    args.apply(&mut config.simulation);

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    config
}

fn parse_format(format: &str) -> OutputFormat {
    OutputFormat::parse(format).unwrap_or_else(|| {
        eprintln!("Error: Unknown format '{format}' (expected console or jsonl)");
        std::process::exit(1);
    })
}

fn outputs(format: OutputFormat) -> (Box<dyn Renderer>, Box<dyn SummaryDisplay>) {
    match format {
        OutputFormat::Console => (
            Box::new(ConsoleRenderer::new()),
            Box::new(ConsoleSummary::new()),
        ),
        OutputFormat::Jsonl => (
            Box::new(JsonLinesRenderer::new(std::io::stdout())),
            Box::new(NullDisplay),
        ),
    }
}

fn cmd_run(args: &SimulationArgs, format: Option<&str>) {
    let config = load_config(args);
    let format = format.map(parse_format).unwrap_or(config.output);

    println!("Synheart Activity Sim v{VERSION}");
    println!();
    println!("Arrow Up / Arrow Down / Space: activity    q / Esc: end session");
    println!();

    let log = create_shared_log();
    let (renderer, display) = outputs(format);
    let mut dashboard = Dashboard::new(config.simulation.clone(), renderer, display, log.clone());

    // Set up Ctrl+C handler (raw mode delivers Ctrl+C as a key, signals still arrive)
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let mut collector = TerminalCollector::new();
    if let Err(e) = collector.start() {
        eprintln!("Error starting input collector: {e}");
        std::process::exit(1);
    }

    if let Err(e) = dashboard.start() {
        collector.stop();
        eprintln!("Error starting session: {e}");
        std::process::exit(1);
    }

    let receiver = collector.receiver().clone();

    while running.load(Ordering::SeqCst) && dashboard.is_running() {
        let timeout = dashboard
            .next_deadline_instant()
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL);

        match receiver.recv_timeout(timeout) {
            Ok(InputEvent::EndSession) => break,
            Ok(event) => {
                // Input is handled before any timer due at the same instant
                let now = dashboard.elapsed().unwrap_or(0);
                if let Err(e) = dashboard.handle_input(event, now) {
                    tracing::warn!("Input ignored: {e}");
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::error!("Input collector disconnected unexpectedly");
                break;
            }
        }

        dashboard.advance_now();
    }

    collector.stop();

    let report = if dashboard.is_running() {
        dashboard.end().ok()
    } else {
        None
    };

    println!();
    if let Some(report) = report {
        println!(
            "Session {} ended: {} triggers, {} decay ticks",
            report.session_id, report.triggers, report.decay_ticks
        );
    }
    println!("{}", log.summary());
}

/// Parse "0, 500,2500" into sorted millisecond offsets.
fn parse_triggers(triggers: &str) -> Result<Vec<u64>, String> {
    let mut times = triggers
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map_err(|e| format!("invalid trigger time '{s}': {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    times.sort_unstable();
    Ok(times)
}

fn cmd_simulate(args: &SimulationArgs, triggers: &str, until: u64, format: &str) {
    let config = load_config(args);
    let format = parse_format(format);

    let triggers = match parse_triggers(triggers) {
        Ok(times) => times,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let log = create_shared_log();
    let (renderer, display) = outputs(format);
    let mut dashboard = Dashboard::new(config.simulation.clone(), renderer, display, log.clone());

    if let Err(e) = dashboard.start() {
        eprintln!("Error starting session: {e}");
        std::process::exit(1);
    }

    for at in triggers.into_iter().filter(|t| *t <= until) {
        if let Err(e) = dashboard.trigger_activity(at) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
    dashboard.advance_to(until);

    match dashboard.end() {
        Ok(report) => match serde_json::to_string(&report) {
            Ok(json) => eprintln!("{json}"),
            Err(e) => eprintln!("Error serializing report: {e}"),
        },
        Err(e) => eprintln!("Error ending session: {e}"),
    }
}

#[cfg(feature = "server")]
fn cmd_serve(args: &SimulationArgs, port: Option<u16>) {
    use synheart_activity_sim::server::{run, ServerConfig};

    let config = load_config(args);
    let port = port.unwrap_or(config.server_port);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error creating runtime: {e}");
            std::process::exit(1);
        }
    };

    let result: anyhow::Result<()> = runtime.block_on(async {
        let server = run(ServerConfig::new(port, config.simulation)).await?;
        println!("Listening on http://{}", server.addr);
        println!("Press Ctrl+C to stop");

        tokio::signal::ctrl_c().await?;
        server.shutdown().await;
        Ok(())
    });

    if let Err(e) = result {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "server"))]
fn cmd_serve(_args: &SimulationArgs, _port: Option<u16>) {
    eprintln!("Error: serve requires the server feature (cargo build --features server)");
    std::process::exit(1);
}

fn cmd_notice() {
    println!("{SIMULATION_NOTICE}");
}

fn cmd_config(init: bool) {
    let path = Config::config_path();
    let config = Config::load().unwrap_or_default();

    if init && !path.exists() {
        if let Err(e) = config.save() {
            eprintln!("Error saving config: {e}");
            std::process::exit(1);
        }
        println!("Wrote default configuration.");
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_triggers() {
        assert_eq!(parse_triggers("2500, 0,500").unwrap(), vec![0, 500, 2500]);
        assert_eq!(parse_triggers("").unwrap(), Vec::<u64>::new());
        assert!(parse_triggers("0,abc").is_err());
    }

    #[test]
    fn test_simulation_args_override() {
        let args = SimulationArgs {
            seed: Some(5),
            steps: None,
            heart: Some(10),
        };
        let mut simulation = SimulationConfig::default();
        args.apply(&mut simulation);
        assert_eq!(simulation.seed, Some(5));
        assert_eq!(simulation.step_increment, 50);
        assert_eq!(simulation.heart_increment, 10);
    }
}
