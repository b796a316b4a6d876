use std::fmt;

use serde::{Deserialize, Serialize};

/// Game-control command recognized from a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    #[serde(alias = "LEFT")]
    MoveLeft,
    #[serde(alias = "RIGHT")]
    MoveRight,
    Fire,
    #[serde(alias = "ENTER")]
    Start,
}

impl Command {
    pub const ALL: [Command; 4] = [
        Command::MoveLeft,
        Command::MoveRight,
        Command::Fire,
        Command::Start,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoveLeft => "MOVE_LEFT",
            Self::MoveRight => "MOVE_RIGHT",
            Self::Fire => "FIRE",
            Self::Start => "START",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// One landmark as handed over by the perception collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawLandmark {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl RawLandmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHand {
    pub landmarks: Vec<RawLandmark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_label: String,
    pub confidence: f32,
}

/// Everything the perception collaborator produced for one captured frame.
///
/// When `size` is present, landmark coordinates are normalized to `[0, 1]`
/// and get scaled to pixels before classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerceptionFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<FrameSize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hands: Vec<RawHand>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detections: Vec<Detection>,
}

impl PerceptionFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_hands(hands: Vec<RawHand>) -> Self {
        Self {
            hands,
            ..Self::default()
        }
    }

    pub fn with_detections(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            ..Self::default()
        }
    }
}
