use std::{path::PathBuf, sync::Arc, time::Duration};

use animation::{AnimationCommand, AnimationController, AnimationSnapshot, LocalZone};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use client_core::{
    build_forecast_chart, build_retrospective_chart, DataClient, ForecastDateBounds,
    ViewerSession,
};
use shared::domain::ReachId;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod console;

use config::{load_settings, Settings};
use console::{ConsoleLabel, ConsoleLayer};

#[derive(Parser, Debug)]
#[command(about = "River forecast viewer")]
struct Cli {
    #[arg(long, default_value = "viewer.toml")]
    config: PathBuf,
    #[arg(long)]
    api_endpoint: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Animate the stream layer's time window. Reads controls from stdin
    /// unless `--ticks` is given.
    Animate {
        #[arg(long)]
        local: bool,
        #[arg(long)]
        speed_ms: Option<u64>,
        #[arg(long)]
        ticks: Option<u32>,
    },
    /// Select a river and load its charts the way a map click would.
    Open {
        reach_id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Forecast {
        reach_id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Retrospective {
        reach_id: String,
    },
    Links {
        reach_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config);
    if let Some(endpoint) = cli.api_endpoint {
        settings.api_endpoint = endpoint;
    }

    match cli.command {
        Command::Animate {
            local,
            speed_ms,
            ticks,
        } => {
            if let Some(speed_ms) = speed_ms {
                settings.animate_speed_ms = speed_ms;
            }
            settings.use_local_time |= local;
            run_animation(&settings, ticks).await
        }
        Command::Open { reach_id, date } => open_reach(&settings, &reach_id, date).await,
        Command::Forecast { reach_id, date } => {
            let reach_id = parse_reach_id(&reach_id)?;
            let bounds = ForecastDateBounds::from_now(Utc::now());
            let date = bounds.check(date.unwrap_or_else(|| bounds.default_date()))?;
            let client = DataClient::new(&settings.api_endpoint)?;
            let response = client.forecast(reach_id, date).await?;
            print_json(&build_forecast_chart(reach_id, &response))
        }
        Command::Retrospective { reach_id } => {
            let reach_id = parse_reach_id(&reach_id)?;
            let client = DataClient::new(&settings.api_endpoint)?;
            let response = client.retrospective(reach_id).await?;
            print_json(&build_retrospective_chart(reach_id, &response)?)
        }
        Command::Links { reach_id } => {
            let reach_id = parse_reach_id(&reach_id)?;
            let client = DataClient::new(&settings.api_endpoint)?;
            print_json(&client.download_links(reach_id))
        }
    }
}

fn parse_reach_id(raw: &str) -> Result<ReachId> {
    raw.parse::<ReachId>()
        .with_context(|| format!("invalid river id '{raw}'"))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_controller(settings: &Settings) -> Result<AnimationController> {
    let controller = AnimationController::new(
        Utc::now(),
        settings.animation(),
        LocalZone::System,
        Arc::new(ConsoleLayer::new(settings.layer_url.clone())),
        Arc::new(ConsoleLabel),
    )
    .context("invalid animation settings")?;
    if settings.use_local_time {
        controller.set_display_mode(true);
    }
    Ok(controller)
}

async fn run_animation(settings: &Settings, ticks: Option<u32>) -> Result<()> {
    let controller = build_controller(settings)?;

    if let Some(ticks) = ticks {
        let snapshot =
            play_for_ticks(&controller, settings.animation().animate_speed, ticks).await;
        return print_json(&snapshot);
    }

    info!(
        slider = ?controller.slider_range(),
        "controls: play, stop, next, back, seek <n>, local on|off, status, quit"
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match handle_line(&controller, &line) {
            LineOutcome::Continue => {}
            LineOutcome::Status => print_json(&controller.snapshot())?,
            LineOutcome::Quit => break,
            LineOutcome::Invalid(message) => eprintln!("{message}"),
        }
    }
    controller.stop();
    Ok(())
}

async fn play_for_ticks(
    controller: &AnimationController,
    speed: Duration,
    ticks: u32,
) -> AnimationSnapshot {
    if ticks == 0 {
        return controller.snapshot();
    }
    controller.play();
    // `play` ticks once immediately; stop halfway through the last interval.
    tokio::time::sleep(speed * (ticks - 1) + speed / 2).await;
    controller.stop();
    controller.snapshot()
}

#[derive(Debug, PartialEq, Eq)]
enum LineOutcome {
    Continue,
    Status,
    Quit,
    Invalid(String),
}

fn handle_line(controller: &AnimationController, line: &str) -> LineOutcome {
    let trimmed = line.trim();
    match trimmed {
        "" => LineOutcome::Continue,
        "quit" | "exit" | "q" => LineOutcome::Quit,
        "status" => LineOutcome::Status,
        _ => match trimmed.parse::<AnimationCommand>() {
            Ok(command) => {
                controller.dispatch(command);
                LineOutcome::Continue
            }
            Err(error) => LineOutcome::Invalid(error.to_string()),
        },
    }
}

async fn open_reach(settings: &Settings, raw_reach_id: &str, date: Option<NaiveDate>) -> Result<()> {
    let client = DataClient::new(&settings.api_endpoint)?;
    let session = ViewerSession::new(client, settings.session(), Utc::now());
    if let Some(date) = date {
        session.set_forecast_date(date).await?;
    }

    let mut events = session.subscribe_events();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(error) => warn!(%error, "failed to encode viewer event"),
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "viewer events dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let entered = session.enter_reach_id(raw_reach_id).await?;
    if entered.is_none() {
        warn!("no river id given");
    }
    let status = session.status().await.render(session.reach_id().await);
    drop(session);
    // Closing the session closes the event channel and ends the printer.
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;
    info!(%status, "done");
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
