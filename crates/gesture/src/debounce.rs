use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use shared::domain::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebounceKind {
    #[default]
    ChangeOrPeriodic,
    Cooldown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub mode: DebounceKind,
    /// Frames after an emission before an unchanged command is re-affirmed.
    pub every_n_frames: u64,
    pub cooldown_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            mode: DebounceKind::ChangeOrPeriodic,
            every_n_frames: 30,
            cooldown_ms: 300,
        }
    }
}

impl DebounceConfig {
    pub fn policy(&self) -> DebouncePolicy {
        match self.mode {
            DebounceKind::ChangeOrPeriodic => DebouncePolicy::ChangeOrPeriodic {
                every_n_frames: self.every_n_frames.max(1),
            },
            DebounceKind::Cooldown => DebouncePolicy::Cooldown {
                cooldown: Duration::from_millis(self.cooldown_ms),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePolicy {
    /// Emit on every change, and re-emit an unchanged command once
    /// `every_n_frames` frames have passed since the last emission.
    ChangeOrPeriodic { every_n_frames: u64 },
    /// Emit whenever `cooldown` has elapsed since the last emission.
    Cooldown { cooldown: Duration },
}

/// Decides whether a classified command goes out now.
///
/// Call [`CommandDebouncer::decide`] once per frame, including frames without
/// a command, so the frame counter stays accurate.
#[derive(Debug, Clone)]
pub struct CommandDebouncer {
    policy: DebouncePolicy,
    last_emitted: Option<Command>,
    last_emit_at: Option<Instant>,
    frames_since_emit: u64,
    frame_count: u64,
}

impl CommandDebouncer {
    pub fn new(policy: DebouncePolicy) -> Self {
        Self {
            policy,
            last_emitted: None,
            last_emit_at: None,
            frames_since_emit: 0,
            frame_count: 0,
        }
    }

    pub fn policy(&self) -> DebouncePolicy {
        self.policy
    }

    pub fn last_emitted(&self) -> Option<Command> {
        self.last_emitted
    }

    pub fn last_emit_at(&self) -> Option<Instant> {
        self.last_emit_at
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns true when `command` should be dispatched now. State is updated
    /// in the same call whenever it returns true.
    pub fn decide(&mut self, command: Option<Command>, now: Instant) -> bool {
        self.frame_count += 1;
        self.frames_since_emit = self.frames_since_emit.saturating_add(1);

        let Some(command) = command else {
            return false;
        };

        let emit = match self.policy {
            DebouncePolicy::ChangeOrPeriodic { every_n_frames } => {
                self.last_emitted != Some(command) || self.frames_since_emit >= every_n_frames
            }
            DebouncePolicy::Cooldown { cooldown } => self
                .last_emit_at
                .map_or(true, |at| now.saturating_duration_since(at) >= cooldown),
        };

        if emit {
            self.last_emitted = Some(command);
            self.last_emit_at = Some(now);
            self.frames_since_emit = 0;
        }
        emit
    }

    /// Forgets all history; used when a new session starts.
    pub fn reset(&mut self) {
        *self = Self::new(self.policy);
    }
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
