use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared::domain::Command;
use tracing::debug;

use crate::features::{HandPose, PerceptionMode, PoseObservation};

pub const HEART_LABEL: &str = "heart";
pub const PINCH_LABEL: &str = "pinch";
pub const THUMB_LEFT_LABEL: &str = "thumb left";
pub const THUMB_RIGHT_LABEL: &str = "thumb right";
pub const NO_GESTURE_LABEL: &str = "no gesture";

/// Which way a positive thumb displacement points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbPolarity {
    /// Thumb tip left of its base joint (negative dx) means MOVE_LEFT.
    #[default]
    Direct,
    /// Negative dx means MOVE_RIGHT, for unmirrored camera feeds.
    Mirrored,
}

impl ThumbPolarity {
    fn command_for(self, dx: f64) -> Command {
        match (self, dx < 0.0) {
            (Self::Direct, true) | (Self::Mirrored, false) => Command::MoveLeft,
            (Self::Direct, false) | (Self::Mirrored, true) => Command::MoveRight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Thumb-tip to index-tip distance under which a hand counts as pinching.
    pub pinch_threshold: f64,
    /// Maximum distance between both hand centroids for the heart gesture.
    pub heart_proximity_threshold: f64,
    /// Minimum horizontal thumb displacement for a direction command.
    pub thumb_direction_threshold: f64,
    pub polarity: ThumbPolarity,
    /// Detections below this confidence are ignored.
    pub min_confidence: f32,
    /// Detector class name to command. Names match case-insensitively.
    pub labels: BTreeMap<String, Command>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 40.0,
            heart_proximity_threshold: 100.0,
            thumb_direction_threshold: 50.0,
            polarity: ThumbPolarity::Direct,
            min_confidence: 0.5,
            labels: BTreeMap::from([
                ("LEFT".to_string(), Command::MoveLeft),
                ("RIGHT".to_string(), Command::MoveRight),
                ("FIRE".to_string(), Command::Fire),
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub command: Option<Command>,
    pub label: String,
}

impl Classification {
    pub fn command(command: Command, label: impl Into<String>) -> Self {
        Self {
            command: Some(command),
            label: label.into(),
        }
    }

    pub fn none() -> Self {
        Self {
            command: None,
            label: NO_GESTURE_LABEL.to_string(),
        }
    }
}

/// Maps one frame's observations to at most one command.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    mode: PerceptionMode,
    config: ClassifierConfig,
    labels: BTreeMap<String, Command>,
}

impl GestureClassifier {
    pub fn new(mode: PerceptionMode, config: ClassifierConfig) -> Self {
        let labels = config
            .labels
            .iter()
            .map(|(name, command)| (name.to_lowercase(), *command))
            .collect();
        Self {
            mode,
            config,
            labels,
        }
    }

    pub fn mode(&self) -> PerceptionMode {
        self.mode
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(&self, observations: &[PoseObservation]) -> Classification {
        match self.mode {
            PerceptionMode::Landmarks => {
                let hands: Vec<&HandPose> = observations
                    .iter()
                    .filter_map(|obs| match obs {
                        PoseObservation::Landmarks(pose) => Some(pose),
                        PoseObservation::Label(_) => None,
                    })
                    .collect();
                self.classify_hands(&hands)
            }
            PerceptionMode::DetectorLabels => self.classify_labels(observations),
        }
    }

    fn classify_hands(&self, hands: &[&HandPose]) -> Classification {
        match hands {
            [first, second] if self.is_heart(first, second) => {
                Classification::command(Command::Start, HEART_LABEL)
            }
            [hand] => self.classify_single_hand(hand),
            _ => Classification::none(),
        }
    }

    fn is_heart(&self, first: &HandPose, second: &HandPose) -> bool {
        let t1 = self.config.pinch_threshold;
        first.pinch_distance() < t1
            && second.pinch_distance() < t1
            && first.centroid().distance(&second.centroid()) < self.config.heart_proximity_threshold
    }

    fn classify_single_hand(&self, hand: &HandPose) -> Classification {
        let pinch = hand.pinch_distance();
        debug!(pinch, "classifier: thumb-index distance");
        if pinch < self.config.pinch_threshold {
            return Classification::command(Command::Fire, PINCH_LABEL);
        }

        if !hand.fingers_folded() {
            return Classification::none();
        }

        let dx = hand.thumb_dx();
        if dx.abs() <= self.config.thumb_direction_threshold {
            return Classification::none();
        }

        let command = self.config.polarity.command_for(dx);
        let label = match command {
            Command::MoveLeft => THUMB_LEFT_LABEL,
            _ => THUMB_RIGHT_LABEL,
        };
        Classification::command(command, label)
    }

    fn classify_labels(&self, observations: &[PoseObservation]) -> Classification {
        observations
            .iter()
            .find_map(|obs| match obs {
                PoseObservation::Label(label) => self
                    .labels
                    .get(&label.to_lowercase())
                    .map(|command| Classification::command(*command, label.clone())),
                PoseObservation::Landmarks(_) => None,
            })
            .unwrap_or_else(Classification::none)
    }
}

#[cfg(test)]
#[path = "tests/classifier_tests.rs"]
mod tests;
