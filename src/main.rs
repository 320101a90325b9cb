use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fms_flightplan_rust::config::AppConfig;
use fms_flightplan_rust::navdata::{NavigationDatabase, StaticNavigationDatabase};
use fms_flightplan_rust::position::StaticPosition;
use fms_flightplan_rust::script::ScriptRunner;
use fms_flightplan_rust::service::FlightPlanService;

#[derive(Parser)]
#[command(name = "fms")]
#[command(about = "Airbus-style FMS flight plan engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Navigation data JSON
    #[arg(short, long)]
    navdata: Option<PathBuf>,

    /// Application config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Aircraft preset (a320, a380x)
    #[arg(short, long)]
    aircraft: Option<String>,

    /// Print the F-PLN as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a command script
    Run {
        #[command(flatten)]
        engine: EngineArgs,

        script: PathBuf,
    },

    /// Read commands from stdin
    Shell {
        #[command(flatten)]
        engine: EngineArgs,
    },

    /// List the airports in a navigation data file
    Airports {
        #[arg(short, long)]
        navdata: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { engine, script } => {
            let contents = fs::read_to_string(&script)
                .with_context(|| format!("Failed to read script: {:?}", script))?;
            let mut runner = build_runner(&engine)?;

            info!("[FMS] Running {:?}", script);
            for (number, line) in contents.lines().enumerate() {
                run_and_print(&mut runner, line, engine.json, number + 1)?;
            }
        }

        Commands::Shell { engine } => {
            let mut runner = build_runner(&engine)?;

            let stop = Arc::new(Notify::new());
            let stop_for_ctrlc = Arc::clone(&stop);
            ctrlc::set_handler(move || stop_for_ctrlc.notify_one()).context("Error setting Ctrl-C handler")?;

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut number = 0;
            loop {
                tokio::select! {
                    line = lines.next_line() => {
                        let Some(line) = line? else { break };
                        number += 1;
                        run_and_print(&mut runner, &line, engine.json, number)?;
                    }
                    _ = stop.notified() => {
                        info!("[FMS] Interrupted");
                        break;
                    }
                }
            }
        }

        Commands::Airports { navdata } => {
            let db = StaticNavigationDatabase::load(&navdata)?;
            for ident in db.airport_idents() {
                let airport = db.airport(ident)?;
                println!(
                    "{:<6} {:>2} RWY {:>2} SID {:>2} STAR {:>2} APPR",
                    airport.ident,
                    airport.runways.len(),
                    airport.departures.len(),
                    airport.arrivals.len(),
                    airport.approaches.len()
                );
            }
        }
    }

    Ok(())
}

fn build_runner(args: &EngineArgs) -> Result<ScriptRunner> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(aircraft) = &args.aircraft {
        config.aircraft = aircraft.clone();
        config.fpm = None;
    }
    if let Some(navdata) = &args.navdata {
        config.navdata = Some(navdata.clone());
    }

    let Some(navdata) = &config.navdata else {
        bail!("No navigation data given (use --navdata or set navdata in the config)");
    };
    let database: Arc<dyn NavigationDatabase> = Arc::new(StaticNavigationDatabase::load(navdata)?);
    let position = Arc::new(StaticPosition::new(
        config.initial_state.position,
        config.initial_state.true_track,
    ));

    let mut service = FlightPlanService::new(
        Arc::clone(&database),
        position.clone(),
        config.fpm_config()?,
        config.event_capacity,
    );
    service.create_flight_plans()?;
    info!("[FMS] Engine ready with {} preset", config.aircraft);

    Ok(ScriptRunner::new(service, database, position))
}

/// Runs a line and prints the F-PLN the pilot would now see. Command
/// failures are reported and skipped, like a scratchpad message.
fn run_and_print(runner: &mut ScriptRunner, line: &str, json: bool, number: usize) -> Result<()> {
    match runner.run_line(line) {
        Ok(false) => return Ok(()),
        Ok(true) => {}
        Err(e) => {
            warn!("[FMS] Line {}: {:#}", number, e);
            return Ok(());
        }
    }

    let plan = runner.service().active_or_temporary()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan.all_legs())?);
    } else {
        println!("{}", plan);
    }
    Ok(())
}
