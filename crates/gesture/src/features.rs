//! Pose Features: turns raw collaborator output into canonical observations.

use serde::{Deserialize, Serialize};
use shared::domain::{Detection, FrameSize, PerceptionFrame, RawHand};
use thiserror::Error;
use tracing::debug;

pub const HAND_LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_MCP: usize = 2;
pub const THUMB_TIP: usize = 4;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

/// (tip, middle joint) pairs of the four non-thumb fingers.
pub const FINGER_TIP_JOINTS: [(usize, usize); 4] = [
    (INDEX_TIP, INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
    (PINKY_TIP, PINKY_PIP),
];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Planar Euclidean distance; depth is ignored.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One hand's landmarks in the collaborator's anatomical index order.
#[derive(Debug, Clone, PartialEq)]
pub struct HandPose {
    points: [Point; HAND_LANDMARK_COUNT],
}

impl HandPose {
    pub fn new(points: [Point; HAND_LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn point(&self, index: usize) -> Point {
        self.points[index]
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn centroid(&self) -> Point {
        let n = self.points.len() as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / n, sy / n)
    }

    pub fn pinch_distance(&self) -> f64 {
        self.point(THUMB_TIP).distance(&self.point(INDEX_TIP))
    }

    /// True when every non-thumb fingertip sits below its middle joint in
    /// image space (y grows downward).
    pub fn fingers_folded(&self) -> bool {
        FINGER_TIP_JOINTS
            .iter()
            .all(|&(tip, joint)| self.point(tip).y > self.point(joint).y)
    }

    /// Horizontal displacement of the thumb tip from its base joint.
    pub fn thumb_dx(&self) -> f64 {
        self.point(THUMB_TIP).x - self.point(THUMB_MCP).x
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PoseObservation {
    Landmarks(HandPose),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedObservation {
    #[error("expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },
    #[error("landmark {index} has a non-finite coordinate")]
    NonFiniteLandmark { index: usize },
    #[error("detection has an empty class label")]
    EmptyLabel,
    #[error("detection confidence is not a number")]
    InvalidConfidence,
}

pub fn hand_pose(raw: &RawHand, size: Option<FrameSize>) -> Result<HandPose, MalformedObservation> {
    if raw.landmarks.len() < HAND_LANDMARK_COUNT {
        return Err(MalformedObservation::LandmarkCount {
            expected: HAND_LANDMARK_COUNT,
            actual: raw.landmarks.len(),
        });
    }

    let (sx, sy) = match size {
        Some(size) => (f64::from(size.width), f64::from(size.height)),
        None => (1.0, 1.0),
    };

    let mut points = [Point::default(); HAND_LANDMARK_COUNT];
    for (index, (slot, lm)) in points.iter_mut().zip(&raw.landmarks).enumerate() {
        if !lm.x.is_finite() || !lm.y.is_finite() {
            return Err(MalformedObservation::NonFiniteLandmark { index });
        }
        *slot = Point {
            x: lm.x * sx,
            y: lm.y * sy,
            z: lm.z.filter(|z| z.is_finite()),
        };
    }

    Ok(HandPose::new(points))
}

/// Returns `Ok(None)` for a well-formed detection under the confidence floor.
pub fn detection_label(
    detection: &Detection,
    min_confidence: f32,
) -> Result<Option<String>, MalformedObservation> {
    if detection.confidence.is_nan() {
        return Err(MalformedObservation::InvalidConfidence);
    }
    let label = detection.class_label.trim();
    if label.is_empty() {
        return Err(MalformedObservation::EmptyLabel);
    }
    if detection.confidence < min_confidence {
        return Ok(None);
    }
    Ok(Some(label.to_string()))
}

/// Source representation active for a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerceptionMode {
    #[default]
    Landmarks,
    DetectorLabels,
}

/// Observations for one frame, in collaborator order. Only the representation
/// selected by `mode` is read; the other is ignored.
///
/// A single malformed unit voids the whole frame, so a broken hand can never
/// turn a two-hand frame into a one-hand gesture.
pub fn observe_frame(
    frame: &PerceptionFrame,
    mode: PerceptionMode,
    min_confidence: f32,
) -> Vec<PoseObservation> {
    let observed = match mode {
        PerceptionMode::Landmarks => frame
            .hands
            .iter()
            .map(|hand| hand_pose(hand, frame.size).map(|pose| Some(PoseObservation::Landmarks(pose))))
            .collect::<Result<Vec<_>, _>>(),
        PerceptionMode::DetectorLabels => frame
            .detections
            .iter()
            .map(|detection| {
                detection_label(detection, min_confidence).map(|label| label.map(PoseObservation::Label))
            })
            .collect::<Result<Vec<_>, _>>(),
    };

    match observed {
        Ok(observations) => observations.into_iter().flatten().collect(),
        Err(err) => {
            debug!(%err, "features: dropping frame with malformed observation");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "tests/features_tests.rs"]
mod tests;
