use std::time::{Duration, Instant};

use gesture::{observe_frame, CommandDebouncer, GestureClassifier};
use shared::domain::{Command, PerceptionFrame};
use tokio::{
    sync::{broadcast, watch},
    time::timeout,
};
use tracing::{debug, error, info};

use crate::{
    config::Settings,
    error::{ControlError, SessionError},
    perception::PerceptionSource,
    session::{Acknowledgment, SessionClient, SessionState},
};

/// What the rendering collaborator gets to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    Recognized {
        frame: u64,
        label: String,
        command: Option<Command>,
    },
    Dispatched {
        command: Command,
        acknowledgment: Acknowledgment,
    },
    Finished(Result<LoopExit, String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Stopped,
    SourceExhausted,
}

/// Drives perception → classification → debounce → dispatch, one frame at a
/// time, on a single task.
pub struct ControlLoop<P> {
    perception: P,
    classifier: GestureClassifier,
    debouncer: CommandDebouncer,
    session: SessionClient,
    frame_timeout: Duration,
    stop: watch::Receiver<bool>,
    events: broadcast::Sender<ControlEvent>,
}

impl<P: PerceptionSource> ControlLoop<P> {
    pub fn new(
        perception: P,
        classifier: GestureClassifier,
        debouncer: CommandDebouncer,
        session: SessionClient,
        stop: watch::Receiver<bool>,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            perception,
            classifier,
            debouncer,
            session,
            frame_timeout: Duration::from_millis(Settings::default().frame_timeout_ms),
            stop,
            events,
        }
    }

    pub fn from_settings(settings: &Settings, perception: P, stop: watch::Receiver<bool>) -> Self {
        Self::new(
            perception,
            GestureClassifier::new(settings.perception_mode, settings.classifier.clone()),
            CommandDebouncer::new(settings.debounce.policy()),
            SessionClient::new(settings.session.clone()),
            stop,
        )
        .with_frame_timeout(Duration::from_millis(settings.frame_timeout_ms))
    }

    pub fn with_frame_timeout(mut self, frame_timeout: Duration) -> Self {
        self.frame_timeout = frame_timeout;
        self
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControlEvent> {
        self.events.subscribe()
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionClient {
        &mut self.session
    }

    pub fn debouncer(&self) -> &CommandDebouncer {
        &self.debouncer
    }

    pub fn perception(&self) -> &P {
        &self.perception
    }

    /// Connects a fresh session and forgets debounce history.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        self.session.connect().await?;
        self.debouncer.reset();
        Ok(())
    }

    /// Runs until stopped, the source runs dry, or the session fails. The
    /// session is closed on every exit path.
    pub async fn run(&mut self) -> Result<LoopExit, ControlError> {
        let outcome = self.drive().await;
        match &outcome {
            Ok(exit) => info!(?exit, "control: loop finished"),
            Err(err) => error!(%err, "control: loop terminated"),
        }
        self.session.close().await;

        let _ = self.events.send(ControlEvent::Finished(
            outcome.as_ref().map(|exit| *exit).map_err(|err| err.to_string()),
        ));
        outcome
    }

    async fn drive(&mut self) -> Result<LoopExit, ControlError> {
        loop {
            if *self.stop.borrow() {
                return Ok(LoopExit::Stopped);
            }

            let state = self.session.state();
            if !matches!(state, SessionState::Active | SessionState::AwaitingStart) {
                return Err(SessionError::InvalidState {
                    expected: SessionState::Active,
                    actual: state,
                }
                .into());
            }

            let frame = match timeout(self.frame_timeout, self.perception.next_frame()).await {
                Err(_) => {
                    return Err(ControlError::PerceptionSource(format!(
                        "no frame within {:?}",
                        self.frame_timeout
                    )))
                }
                Ok(Err(err)) => return Err(ControlError::PerceptionSource(format!("{err:#}"))),
                Ok(Ok(None)) => return Ok(LoopExit::SourceExhausted),
                Ok(Ok(Some(frame))) => frame,
            };

            self.step(&frame).await?;
        }
    }

    /// Handles one frame and returns the command dispatched for it, if any.
    pub async fn step(&mut self, frame: &PerceptionFrame) -> Result<Option<Command>, ControlError> {
        let observations = observe_frame(
            frame,
            self.classifier.mode(),
            self.classifier.config().min_confidence,
        );
        let classification = self.classifier.classify(&observations);
        let frame_no = self.debouncer.frame_count() + 1;
        debug!(
            frame = frame_no,
            hands = frame.hands.len(),
            label = %classification.label,
            "control: classified"
        );
        let _ = self.events.send(ControlEvent::Recognized {
            frame: frame_no,
            label: classification.label.clone(),
            command: classification.command,
        });

        // START is only ever the handshake: before the game runs nothing else
        // may leave the client, and once it runs START is never sent again.
        let awaiting_start = self.session.state() == SessionState::AwaitingStart;
        let candidate = classification
            .command
            .filter(|command| awaiting_start == (*command == Command::Start));

        let emit = self.debouncer.decide(candidate, Instant::now());
        let Some(command) = candidate.filter(|_| emit) else {
            return Ok(None);
        };

        let acknowledgment = if awaiting_start {
            self.session.begin().await?
        } else {
            self.session.send_command(command).await?
        };
        info!(%command, received = acknowledgment.is_received(), "control: dispatched");
        let _ = self.events.send(ControlEvent::Dispatched {
            command,
            acknowledgment,
        });
        Ok(Some(command))
    }
}

#[cfg(test)]
#[path = "tests/control_tests.rs"]
mod tests;
