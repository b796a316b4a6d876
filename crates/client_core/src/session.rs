use std::time::Duration;

use futures::{FutureExt, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use shared::{domain::Command, protocol::wire_symbol};
use tokio::{
    net::TcpStream,
    sync::watch,
    time::{timeout, timeout_at, Instant},
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{protocol::CloseFrame, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::error::SessionError;

type GameSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLOSE_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connecting,
    AwaitingStart,
    Active,
    Closing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub endpoint: String,
    pub connect_timeout_ms: u64,
    pub handshake_timeout_ms: u64,
    pub ack_timeout_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8765".into(),
            connect_timeout_ms: 5_000,
            handshake_timeout_ms: 2_000,
            ack_timeout_ms: 1_000,
        }
    }
}

impl SessionSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

/// Outcome of the bounded wait after a command was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgment {
    Received(String),
    TimedOut { after: Duration },
}

impl Acknowledgment {
    pub fn is_received(&self) -> bool {
        matches!(self, Self::Received(_))
    }
}

/// Owns the game server socket for one session at a time.
///
/// Commands are strictly sequential: each send waits (bounded) for a reply
/// before the next one can go out.
pub struct SessionClient {
    settings: SessionSettings,
    socket: Option<GameSocket>,
    state: watch::Sender<SessionState>,
}

impl SessionClient {
    pub fn new(settings: SessionSettings) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            settings,
            socket: None,
            state,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(?previous, ?next, "session: state changed");
        }
    }

    fn expect_state(&self, expected: SessionState) -> Result<(), SessionError> {
        let actual = self.state();
        if actual != expected {
            return Err(SessionError::InvalidState { expected, actual });
        }
        Ok(())
    }

    /// Opens the socket. Failure is reported once; retrying is up to the caller.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Disconnected)?;
        self.set_state(SessionState::Connecting);

        let endpoint = self.settings.endpoint.clone();
        let connect_timeout = self.settings.connect_timeout();
        let reason = match timeout(connect_timeout, connect_async(endpoint.as_str())).await {
            Ok(Ok((socket, _response))) => {
                self.socket = Some(socket);
                self.set_state(SessionState::AwaitingStart);
                info!(%endpoint, "session: connected to game server");
                return Ok(());
            }
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!("no connection within {connect_timeout:?}"),
        };

        self.set_state(SessionState::Disconnected);
        warn!(%endpoint, %reason, "session: connect failed");
        Err(SessionError::Connection { endpoint, reason })
    }

    /// Sends START and waits for the handshake reply. A missing reply does not
    /// prevent the game from starting.
    pub async fn begin(&mut self) -> Result<Acknowledgment, SessionError> {
        self.expect_state(SessionState::AwaitingStart)?;
        let acknowledgment = self
            .exchange(Command::Start, self.settings.handshake_timeout())
            .await?;
        self.set_state(SessionState::Active);
        info!(?acknowledgment, "session: game started");
        Ok(acknowledgment)
    }

    pub async fn send_command(&mut self, command: Command) -> Result<Acknowledgment, SessionError> {
        self.expect_state(SessionState::Active)?;
        self.exchange(command, self.settings.ack_timeout()).await
    }

    async fn exchange(
        &mut self,
        command: Command,
        wait: Duration,
    ) -> Result<Acknowledgment, SessionError> {
        let symbol = wire_symbol(command);
        let Some(socket) = self.socket.as_mut() else {
            self.set_state(SessionState::Disconnected);
            return Err(SessionError::TransportClosed {
                reason: "socket already released".into(),
            });
        };

        let outcome = async {
            discard_late_replies(socket)?;
            socket
                .send(Message::Text(symbol.to_string()))
                .await
                .map_err(|err| format!("send failed: {err}"))?;
            debug!(symbol, "session: sent");
            await_reply(socket, wait).await
        }
        .await;

        match outcome {
            Ok(Acknowledgment::Received(reply)) => {
                debug!(symbol, %reply, "session: server replied");
                Ok(Acknowledgment::Received(reply))
            }
            Ok(timed_out) => {
                warn!(symbol, ?wait, "session: no reply from server");
                Ok(timed_out)
            }
            Err(reason) => {
                warn!(symbol, %reason, "session: transport closed");
                self.shutdown().await;
                Err(SessionError::TransportClosed { reason })
            }
        }
    }

    /// Closes the socket if one is open. Safe to call in any state.
    pub async fn close(&mut self) {
        if self.state() == SessionState::Disconnected && self.socket.is_none() {
            return;
        }
        self.shutdown().await;
        info!("session: closed");
    }

    async fn shutdown(&mut self) {
        self.set_state(SessionState::Closing);
        if let Some(mut socket) = self.socket.take() {
            // the peer may already be gone
            let _ = timeout(CLOSE_GRACE, socket.close(None)).await;
        }
        self.set_state(SessionState::Disconnected);
    }
}

/// Drops replies that arrived after their own wait ran out, so the next
/// acknowledgment belongs to the next command. Never blocks.
fn discard_late_replies(socket: &mut GameSocket) -> Result<(), String> {
    while let Some(next) = socket.next().now_or_never() {
        match next {
            None => return Err("connection ended".into()),
            Some(Err(err)) => return Err(err.to_string()),
            Some(Ok(Message::Close(frame))) => return Err(close_reason(frame)),
            Some(Ok(Message::Text(text))) => debug!(reply = %text, "session: discarding late reply"),
            Some(Ok(_)) => {}
        }
    }
    Ok(())
}

async fn await_reply(socket: &mut GameSocket, wait: Duration) -> Result<Acknowledgment, String> {
    let deadline = Instant::now() + wait;
    loop {
        let message = match timeout_at(deadline, socket.next()).await {
            Err(_) => return Ok(Acknowledgment::TimedOut { after: wait }),
            Ok(None) => return Err("connection ended".into()),
            Ok(Some(Err(err))) => return Err(err.to_string()),
            Ok(Some(Ok(message))) => message,
        };

        match message {
            Message::Text(text) => return Ok(Acknowledgment::Received(text)),
            Message::Binary(bytes) => {
                return Ok(Acknowledgment::Received(
                    String::from_utf8_lossy(&bytes).into_owned(),
                ))
            }
            Message::Close(frame) => return Err(close_reason(frame)),
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
        }
    }
}

fn close_reason(frame: Option<CloseFrame<'_>>) -> String {
    frame
        .map(|f| format!("closed by server: {}", f.reason))
        .unwrap_or_else(|| "closed by server".into())
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
