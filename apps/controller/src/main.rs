use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use client_core::{ControlEvent, ControlLoop, JsonLinesPerception, LoopExit, SessionState, Settings};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines},
    sync::{broadcast::error::RecvError, watch},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StartMode {
    /// Wait for "enter" (or "s") on stdin.
    Keyboard,
    /// Start the game as soon as the connection is up.
    Auto,
    /// Wait for the two-hand heart gesture.
    Gesture,
}

#[derive(Parser, Debug)]
#[command(about = "Drive a game server with hand gestures")]
struct Args {
    /// Settings file (TOML). Defaults to ./gesture-controller.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Perception frames, one JSON object per line.
    #[arg(long)]
    perception: Option<PathBuf>,
    /// Release recorded frames at most once per this many milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    frame_interval_ms: Option<u64>,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long, value_enum, default_value_t = StartMode::Keyboard)]
    start: StartMode,
    /// Print the effective settings and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        settings.session.endpoint = endpoint;
        settings.validate()?;
    }
    if args.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let path = args
        .perception
        .context("--perception <FILE> is required to run the controller")?;
    let mut perception = JsonLinesPerception::open(&path).await?;
    if let Some(ms) = args.frame_interval_ms {
        perception = perception.with_frame_interval(Duration::from_millis(ms));
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut control = ControlLoop::from_settings(&settings, perception, stop_rx);
    tokio::spawn(show_state(control.session().subscribe_state()));
    control.connect().await?;

    println!("Controls:");
    println!("  thumb out left/right, other fingers folded = LEFT/RIGHT");
    println!("  thumb and index tips together              = FIRE");
    println!("  both hands pinching, close together        = START");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    match args.start {
        StartMode::Keyboard => {
            println!("Type 'enter' to start the game, 'a' to quit.");
            match prompt_for_start(&mut stdin, tokio::io::stdout()).await {
                Ok(true) => {
                    control.session_mut().begin().await?;
                }
                Ok(false) => {
                    info!("controller: quit before start");
                    control.session_mut().close().await;
                    return Ok(());
                }
                Err(err) => {
                    control.session_mut().close().await;
                    return Err(err);
                }
            }
        }
        StartMode::Auto => {
            control.session_mut().begin().await?;
        }
        StartMode::Gesture => println!("Make the heart gesture to start."),
    }
    println!("Gesture control active. Type 'a' or press Ctrl-C to stop.");

    let quit_tx = stop_tx.clone();
    tokio::spawn(async move {
        while let Ok(Some(line)) = stdin.next_line().await {
            if matches!(line.trim(), "a" | "q") {
                let _ = quit_tx.send(true);
                break;
            }
        }
    });
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });
    tokio::spawn(show_events(control.subscribe_events()));

    match control.run().await? {
        LoopExit::Stopped => info!("controller: stopped"),
        LoopExit::SourceExhausted => info!("controller: perception source exhausted"),
    }
    Ok(())
}

/// Reads lines until the player asks to start (`true`) or to quit (`false`).
/// End of input counts as quitting.
async fn prompt_for_start<R, W>(lines: &mut Lines<R>, mut out: W) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        out.write_all(b"command: ").await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            return Ok(false);
        };
        match line.trim().to_lowercase().as_str() {
            "enter" | "s" => return Ok(true),
            "a" => return Ok(false),
            "" => {}
            other => warn!(input = other, "controller: type 'enter' to start or 'a' to quit"),
        }
    }
}

/// Stands in for the on-screen overlay: reports gesture changes and sends.
async fn show_events(mut events: tokio::sync::broadcast::Receiver<ControlEvent>) {
    let mut last_label = String::new();
    loop {
        match events.recv().await {
            Ok(ControlEvent::Recognized { label, .. }) => {
                if label != last_label {
                    info!(gesture = %label, "controller: gesture");
                    last_label = label;
                }
            }
            Ok(ControlEvent::Dispatched {
                command,
                acknowledgment,
            }) => info!(%command, ?acknowledgment, "controller: sent"),
            Ok(ControlEvent::Finished(_)) | Err(RecvError::Closed) => break,
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "controller: display fell behind"),
        }
    }
}

async fn show_state(mut state: watch::Receiver<SessionState>) {
    while state.changed().await.is_ok() {
        let current = *state.borrow_and_update();
        info!(state = ?current, "controller: session");
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
