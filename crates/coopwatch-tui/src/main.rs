//! Terminal dashboard for a poultry house.
//!
//! Wires the in-process store, the typed farm client, the background
//! simulator, and the ratatui event loop together. The terminal owns stdout,
//! so tracing output goes to a file when `--log-file` is given; only the
//! `--headless` mode logs to stdout.

mod app;
mod config;
mod ui;

use std::fs::File;
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::{FutureExt, StreamExt};
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

use coopwatch_core::farm::FarmClient;
use coopwatch_core::simulator::{Simulator, SimulatorOptions};
use coopwatch_core::store::Store;
use coopwatch_core::subscription::Subscription;
use coopwatch_types::{AlertEvent, EquipmentUnit, GasSample, SensorSample};

use crate::app::{App, Command};
use crate::config::Settings;

#[derive(Parser)]
#[command(name = "coopwatch")]
#[command(author, version, about = "Terminal dashboard for poultry-house monitoring", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Run the simulator without the dashboard, logging snapshots to stdout
    #[arg(long)]
    headless: bool,

    /// Simulator tick interval in seconds
    #[arg(long, default_value = "5")]
    tick: u64,

    /// Per-tick probability of a simulated alert
    #[arg(long, default_value = "0.1")]
    alert_probability: f64,

    /// RNG seed for a reproducible simulation
    #[arg(long)]
    seed: Option<u64>,

    /// Run without the background simulator
    #[arg(long)]
    no_simulator: bool,

    /// Settings file path (defaults to the platform config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write tracing output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing. The alternate screen owns stdout, so logs only go
    // to stdout in headless mode, and to a file otherwise.
    let filter = || {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        }
    };
    if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .init();
    } else if cli.headless {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }

    let settings_path = cli.settings.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&settings_path);

    let client = FarmClient::new(Store::new());
    client.seed_defaults().await?;

    let simulator = if cli.no_simulator {
        None
    } else {
        let mut options = SimulatorOptions::default()
            .with_tick_interval(Duration::from_secs(cli.tick))
            .with_alert_probability(cli.alert_probability);
        if let Some(seed) = cli.seed {
            options = options.with_seed(seed);
        }
        Some(Simulator::new(client.clone(), options)?.spawn())
    };

    if cli.headless {
        let result = run_headless(&client).await;
        if let Some(simulator) = &simulator {
            simulator.stop();
        }
        return result;
    }

    let streams = Streams {
        sensor: client.subscribe_sensor().await?,
        gas: client.subscribe_gas().await?,
        equipment: client.subscribe_equipment().await?,
        alerts: client.subscribe_alerts().await?,
    };

    let mut terminal = setup_terminal()?;
    let app = App::new(settings);

    // Run the app and ensure terminal is restored even on error
    let result = run(&mut terminal, app, &client, &settings_path, streams).await;

    restore_terminal()?;
    if let Some(simulator) = &simulator {
        simulator.stop();
    }

    result
}

/// Log snapshots to stdout until Ctrl-C, without a terminal UI.
async fn run_headless(client: &FarmClient) -> Result<()> {
    let mut sensor = client.subscribe_sensor().await?;
    let mut gas = client.subscribe_gas().await?;
    let mut alerts = client.subscribe_alerts().await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(sample) = sensor.next() => {
                tracing::info!(
                    temperature = sample.temperature,
                    humidity = sample.humidity,
                    air_quality = sample.air_quality,
                    "sensor sample"
                );
            }
            Some(sample) = gas.next() => {
                tracing::info!(
                    co = sample.co,
                    co2 = sample.co2,
                    nh3 = sample.nh3,
                    h2s = sample.h2s,
                    "gas sample"
                );
            }
            Some(snapshot) = alerts.next() => {
                tracing::info!(count = snapshot.len(), "alerts snapshot");
            }
        }
    }
    Ok(())
}

/// The four live store subscriptions the dashboard consumes.
struct Streams {
    sensor: Subscription<SensorSample>,
    gas: Subscription<GasSample>,
    equipment: Subscription<Vec<EquipmentUnit>>,
    alerts: Subscription<Vec<AlertEvent>>,
}

impl Streams {
    /// Apply every snapshot that is already in flight, without blocking.
    fn drain_into(&mut self, app: &mut App) {
        while let Some(sample) = self.sensor.next().now_or_never().flatten() {
            app.on_sensor(sample);
        }
        while let Some(sample) = self.gas.next().now_or_never().flatten() {
            app.on_gas(sample);
        }
        while let Some(units) = self.equipment.next().now_or_never().flatten() {
            app.on_equipment(units);
        }
        while let Some(alerts) = self.alerts.next().now_or_never().flatten() {
            app.on_alerts(alerts);
        }
    }
}

/// Main event loop
async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    client: &FarmClient,
    settings_path: &Path,
    mut streams: Streams,
) -> Result<()> {
    while !app.should_quit() {
        streams.drain_into(&mut app);
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for events with a timeout so snapshots keep flowing.
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(command) = app.handle_key(key.code)
        {
            dispatch(client, settings_path, command).await;
        }
    }

    Ok(())
}

/// Execute a store operation requested by a key press.
///
/// Failures are logged rather than tearing the dashboard down: a toggle on a
/// unit that was deleted mid-session is not fatal.
async fn dispatch(client: &FarmClient, settings_path: &Path, command: Command) {
    let outcome = match command {
        Command::Toggle(id) => client.toggle(&id).await.map(|_| ()),
        Command::SetAuto(id) => client.set_auto(&id).await,
        Command::DayMode => client.set_day_mode().await,
        Command::NightMode => client.set_night_mode().await,
        Command::DismissAlert(id) => client.remove_alert(&id).await,
        Command::SaveSettings(settings) => {
            if let Err(error) = settings.save(settings_path) {
                tracing::warn!(%error, "failed to save settings");
            }
            Ok(())
        }
    };
    if let Err(error) = outcome {
        tracing::warn!(%error, "store operation failed");
    }
}

/// Set up the terminal for TUI rendering
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state
fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
