//! Synthetic hands for tests, in pixel space with y growing downward.

use shared::domain::{RawHand, RawLandmark};

use crate::features::{
    hand_pose, HandPose, FINGER_TIP_JOINTS, HAND_LANDMARK_COUNT, INDEX_PIP, INDEX_TIP,
    MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP, RING_PIP, RING_TIP, THUMB_MCP, THUMB_TIP,
    WRIST,
};

#[derive(Debug, Clone)]
pub struct HandBuilder {
    cx: f64,
    cy: f64,
    points: [(f64, f64); HAND_LANDMARK_COUNT],
}

impl HandBuilder {
    /// Open palm centred on `(cx, cy)`: fingers extended upward, thumb
    /// slightly out to the left and well away from the index tip.
    pub fn open(cx: f64, cy: f64) -> Self {
        let mut points = [(cx, cy); HAND_LANDMARK_COUNT];
        points[WRIST] = (cx, cy + 100.0);
        points[THUMB_MCP] = (cx - 40.0, cy + 80.0);
        points[THUMB_TIP] = (cx - 60.0, cy + 60.0);
        points[INDEX_PIP] = (cx - 20.0, cy - 20.0);
        points[INDEX_TIP] = (cx - 20.0, cy - 80.0);
        points[MIDDLE_PIP] = (cx, cy - 20.0);
        points[MIDDLE_TIP] = (cx, cy - 90.0);
        points[RING_PIP] = (cx + 20.0, cy - 20.0);
        points[RING_TIP] = (cx + 20.0, cy - 80.0);
        points[PINKY_PIP] = (cx + 40.0, cy - 10.0);
        points[PINKY_TIP] = (cx + 40.0, cy - 60.0);
        Self { cx, cy, points }
    }

    /// Curls every non-thumb fingertip below its middle joint.
    pub fn folded(mut self) -> Self {
        for (tip, joint) in FINGER_TIP_JOINTS {
            let (jx, jy) = self.points[joint];
            self.points[tip] = (jx, jy + 30.0);
        }
        self
    }

    /// Places the thumb tip `dx` pixels from its base joint, level with it.
    pub fn thumb_dx(mut self, dx: f64) -> Self {
        let (bx, by) = self.points[THUMB_MCP];
        self.points[THUMB_TIP] = (bx + dx, by);
        self
    }

    /// Brings the thumb tip next to the index tip.
    pub fn pinching(mut self) -> Self {
        let (ix, iy) = self.points[INDEX_TIP];
        self.points[THUMB_TIP] = (ix + 10.0, iy);
        self
    }

    pub fn center(&self) -> (f64, f64) {
        (self.cx, self.cy)
    }

    pub fn build(&self) -> RawHand {
        RawHand {
            landmarks: self
                .points
                .iter()
                .map(|&(x, y)| RawLandmark::new(x, y))
                .collect(),
        }
    }

    pub fn pose(&self) -> HandPose {
        match hand_pose(&self.build(), None) {
            Ok(pose) => pose,
            Err(err) => panic!("fixture hand is malformed: {err}"),
        }
    }
}
