//! Gesture-driven game client: session protocol and the per-frame control loop.

pub mod config;
pub mod control;
pub mod error;
pub mod perception;
pub mod session;

pub use config::Settings;
pub use control::{ControlEvent, ControlLoop, LoopExit};
pub use error::{ControlError, SessionError};
pub use perception::{JsonLinesPerception, PerceptionSource, ScriptedPerception};
pub use session::{Acknowledgment, SessionClient, SessionSettings, SessionState};

#[cfg(test)]
#[path = "tests/test_server.rs"]
mod test_server;
