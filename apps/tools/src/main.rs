use std::{
    net::SocketAddr,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::{Parser, Subcommand};
use client_core::{JsonLinesPerception, PerceptionSource, Settings};
use gesture::{observe_frame, CommandDebouncer, GestureClassifier};
use shared::protocol::{ack_reply, parse_wire_symbol};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Local game server that logs and acknowledges every command.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8765")]
        bind: SocketAddr,
        /// Never reply, to exercise acknowledgment timeouts.
        #[arg(long)]
        silent: bool,
    },
    /// Classify a perception recording offline and print one decision per frame.
    Classify {
        recording: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Assumed capture rate, used as the clock for cooldown debouncing.
        #[arg(long, default_value_t = 30.0)]
        fps: f64,
    },
}

#[derive(Clone, Copy)]
struct ServeState {
    silent: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, silent } => serve(bind, silent).await,
        Command::Classify {
            recording,
            config,
            fps,
        } => classify(recording, config, fps).await,
    }
}

async fn serve(bind: SocketAddr, silent: bool) -> Result<()> {
    let app = Router::new()
        .route("/", get(ws_handler))
        .with_state(ServeState { silent });
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, silent, "tools: game server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServeState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| game_connection(state, socket))
}

async fn game_connection(state: ServeState, mut socket: WebSocket) {
    info!("tools: controller connected");
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let command = match parse_wire_symbol(&text) {
            Ok(command) => command,
            Err(err) => {
                warn!(%err, "tools: ignoring frame");
                continue;
            }
        };
        info!(%command, symbol = %text, "tools: received");
        if state.silent {
            continue;
        }
        if socket.send(Message::Text(ack_reply(command))).await.is_err() {
            break;
        }
    }
    info!("tools: controller disconnected");
}

async fn classify(recording: PathBuf, config: Option<PathBuf>, fps: f64) -> Result<()> {
    anyhow::ensure!(fps.is_finite() && fps > 0.0, "--fps must be positive");
    let settings = Settings::load(config.as_deref())?;
    let classifier = GestureClassifier::new(settings.perception_mode, settings.classifier.clone());
    let mut debouncer = CommandDebouncer::new(settings.debounce.policy());
    let mut source = JsonLinesPerception::open(&recording).await?;

    let frame_period = Duration::from_secs_f64(1.0 / fps);
    let clock = Instant::now();
    let mut index: u32 = 0;
    while let Some(frame) = source.next_frame().await? {
        let observations = observe_frame(
            &frame,
            classifier.mode(),
            classifier.config().min_confidence,
        );
        let classification = classifier.classify(&observations);
        let emit = debouncer.decide(classification.command, clock + frame_period * index);
        index += 1;

        println!(
            "{}",
            serde_json::json!({
                "frame": index,
                "label": classification.label,
                "command": classification.command,
                "emit": emit,
            })
        );
    }
    Ok(())
}
