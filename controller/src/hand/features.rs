//! Feature extraction from a landmark frame.
//!
//! Turns 21 raw landmarks into the handful of scalars the control
//! mapping needs: palm position, steering angle, grip state and pinch
//! distance.  Everything here is a pure function of the frame.

use super::landmarks::{HandJoint, LandmarkFrame, Point2};

// ── Grip strategies ────────────────────────────────────────

/// Heuristic used to decide whether the hand is closed into a fist.
///
/// The two heuristics disagree at boundary poses (a hand tilted far from
/// vertical mostly), so the choice is left to configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripStrategy {
    /// Fingertip lower in the image than its PIP joint.  The thumb is
    /// counted too, using its horizontal distance from the wrist.
    /// Closed when at least 4 of 5 digits are folded.
    TipBelowPip,
    /// Fingertip closer to the wrist than its PIP joint.  Thumb ignored.
    /// Closed when at least 3 of 4 fingers are folded.
    TipNearWrist,
}

impl GripStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TipBelowPip => "tip-below-pip",
            Self::TipNearWrist => "tip-near-wrist",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tip-below-pip" => Some(Self::TipBelowPip),
            "tip-near-wrist" => Some(Self::TipNearWrist),
            _ => None,
        }
    }

    /// Folded digits required to call the hand closed.
    pub fn min_folded(&self) -> usize {
        match self {
            Self::TipBelowPip => 4,
            Self::TipNearWrist => 3,
        }
    }
}

// ── Config ─────────────────────────────────────────────────

/// Configuration for feature extraction.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Calibration offset added to the raw steering angle (degrees).
    pub steering_offset_deg: f32,
    /// Grip detection heuristic.
    pub grip: GripStrategy,
    /// Image width in pixels, used to scale the pinch distance.
    pub image_width: u32,
    /// Image height in pixels, used to scale the pinch distance.
    pub image_height: u32,
    /// Flip landmarks horizontally before extraction (selfie view).
    pub mirror: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            steering_offset_deg: 10.0,
            grip: GripStrategy::TipBelowPip,
            image_width: 640,
            image_height: 480,
            mirror: false,
        }
    }
}

// ── Features ───────────────────────────────────────────────

/// Scalar features derived from one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    /// Wrist→middle-MCP tilt in degrees: 0 is straight up, clockwise
    /// positive.  Includes the calibration offset.
    pub steering_angle_deg: f32,
    /// Mean of the wrist and the four MCP joints (normalized).
    pub palm_center: Point2,
    /// Normalized vertical palm position; smaller is higher in the image.
    pub palm_height: f32,
    /// Whether the hand is closed into a fist.
    pub grip_closed: bool,
    /// Thumb tip to index tip distance in pixels.
    pub pinch_distance_px: f32,
}

/// Derives [`Features`] from landmark frames.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    pub config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Extract all features.  The frame must have a hand present.
    pub fn extract(&self, frame: &LandmarkFrame) -> Features {
        let mirrored;
        let frame = if self.config.mirror {
            mirrored = frame.mirrored();
            &mirrored
        } else {
            frame
        };

        let palm_center = palm_center(frame);
        Features {
            steering_angle_deg: steering_angle(frame) + self.config.steering_offset_deg,
            palm_center,
            palm_height: palm_center.y,
            grip_closed: grip_closed(frame, self.config.grip),
            pinch_distance_px: pinch_distance(
                frame,
                self.config.image_width,
                self.config.image_height,
            ),
        }
    }
}

/// Arithmetic mean of the wrist and the four MCP joints.
pub fn palm_center(frame: &LandmarkFrame) -> Point2 {
    let joints = HandJoint::palm_joints();
    let (sx, sy) = joints.iter().fold((0.0, 0.0), |(sx, sy), j| {
        let p = frame.point(*j);
        (sx + p.x, sy + p.y)
    });
    let n = joints.len() as f32;
    Point2::new(sx / n, sy / n)
}

/// Raw steering angle in degrees, without calibration offset.
///
/// Uses `atan2(dx, -dy)` on the wrist→middle-MCP vector so that a hand
/// pointing straight up reads 0 and a clockwise tilt reads positive.
pub fn steering_angle(frame: &LandmarkFrame) -> f32 {
    let wrist = frame.point(HandJoint::Wrist);
    let middle = frame.point(HandJoint::MiddleMcp);
    let dx = middle.x - wrist.x;
    let dy = middle.y - wrist.y;
    dx.atan2(-dy).to_degrees()
}

/// Whether the hand is closed, per the selected strategy.
pub fn grip_closed(frame: &LandmarkFrame, strategy: GripStrategy) -> bool {
    folded_count(frame, strategy) >= strategy.min_folded()
}

/// Number of digits the strategy considers folded.
pub fn folded_count(frame: &LandmarkFrame, strategy: GripStrategy) -> usize {
    let wrist = frame.point(HandJoint::Wrist);
    let fingers = HandJoint::finger_tip_pip_pairs()
        .iter()
        .filter(|(tip, pip)| {
            let tip = frame.point(*tip);
            let pip = frame.point(*pip);
            match strategy {
                GripStrategy::TipBelowPip => tip.y > pip.y,
                GripStrategy::TipNearWrist => tip.distance(&wrist) < pip.distance(&wrist),
            }
        })
        .count();

    match strategy {
        GripStrategy::TipBelowPip => fingers + usize::from(thumb_folded(frame)),
        GripStrategy::TipNearWrist => fingers,
    }
}

/// Thumb folded across the palm: its tip sits horizontally nearer the
/// wrist than its IP joint does.
fn thumb_folded(frame: &LandmarkFrame) -> bool {
    let wrist = frame.point(HandJoint::Wrist);
    let tip = frame.point(HandJoint::ThumbTip);
    let ip = frame.point(HandJoint::ThumbIp);
    (tip.x - wrist.x).abs() < (ip.x - wrist.x).abs()
}

/// Thumb tip to index tip distance in whole pixels.
///
/// Coordinates are truncated to integer pixels before measuring, the way
/// the receiver-side calibration constants were taken.
pub fn pinch_distance(frame: &LandmarkFrame, width: u32, height: u32) -> f32 {
    let to_px = |p: Point2| {
        Point2::new(
            (p.x * width as f32).trunc(),
            (p.y * height as f32).trunc(),
        )
    };
    let thumb = to_px(frame.point(HandJoint::ThumbTip));
    let index = to_px(frame.point(HandJoint::IndexTip));
    thumb.distance(&index)
}
