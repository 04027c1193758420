//! Hand landmark data structures.
//!
//! Models the 21 landmarks per hand produced by a MediaPipe-style hand
//! detector.  Coordinates are normalized to the image: x grows to the
//! right, y grows downward, both in [0, 1].

// ── Joint definitions ──────────────────────────────────────

/// The 21 hand landmarks, in detector output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandJoint {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const JOINT_COUNT: usize = 21;

impl HandJoint {
    /// Convert joint enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }

    /// Wrist plus the four finger MCP joints: the rigid part of the palm.
    pub fn palm_joints() -> [HandJoint; 5] {
        [
            Self::Wrist,
            Self::IndexMcp,
            Self::MiddleMcp,
            Self::RingMcp,
            Self::PinkyMcp,
        ]
    }

    /// (tip, pip) pairs for the four non-thumb fingers.
    pub fn finger_tip_pip_pairs() -> [(HandJoint, HandJoint); 4] {
        [
            (Self::IndexTip, Self::IndexPip),
            (Self::MiddleTip, Self::MiddlePip),
            (Self::RingTip, Self::RingPip),
            (Self::PinkyTip, Self::PinkyPip),
        ]
    }
}

// ── Points ─────────────────────────────────────────────────

/// A normalized 2D image point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ── Frame ──────────────────────────────────────────────────

/// One detector result: the landmarks of at most one hand.
///
/// A frame without a hand still exists; it carries `is_present = false`
/// and drives the stop path downstream.
#[derive(Debug, Clone)]
pub struct LandmarkFrame {
    points: [Point2; JOINT_COUNT],
    is_present: bool,
}

impl LandmarkFrame {
    /// Frame with a detected hand.
    pub fn present(points: [Point2; JOINT_COUNT]) -> Self {
        Self {
            points,
            is_present: true,
        }
    }

    /// Frame in which no hand was detected.
    pub fn absent() -> Self {
        Self {
            points: [Point2::default(); JOINT_COUNT],
            is_present: false,
        }
    }

    pub fn is_present(&self) -> bool {
        self.is_present
    }

    /// Position of a single landmark.
    pub fn point(&self, joint: HandJoint) -> Point2 {
        self.points[joint.index()]
    }

    pub fn points(&self) -> &[Point2; JOINT_COUNT] {
        &self.points
    }

    /// Copy of this frame flipped horizontally (selfie view).
    pub fn mirrored(&self) -> Self {
        let mut points = self.points;
        for p in &mut points {
            p.x = 1.0 - p.x;
        }
        Self {
            points,
            is_present: self.is_present,
        }
    }
}

// ── Test helpers ───────────────────────────────────────────

/// Open hand, fingers pointing straight up, palm centered in the image.
#[cfg(test)]
pub(crate) fn open_hand() -> [Point2; JOINT_COUNT] {
    let mut p = [Point2::default(); JOINT_COUNT];
    p[HandJoint::Wrist.index()] = Point2::new(0.50, 0.80);
    p[HandJoint::ThumbCmc.index()] = Point2::new(0.44, 0.76);
    p[HandJoint::ThumbMcp.index()] = Point2::new(0.40, 0.72);
    p[HandJoint::ThumbIp.index()] = Point2::new(0.37, 0.68);
    p[HandJoint::ThumbTip.index()] = Point2::new(0.34, 0.64);
    for (finger, x) in [(0usize, 0.44f32), (1, 0.50), (2, 0.55), (3, 0.60)] {
        let mcp = 5 + finger * 4;
        p[mcp] = Point2::new(x, 0.60);
        p[mcp + 1] = Point2::new(x, 0.52);
        p[mcp + 2] = Point2::new(x, 0.46);
        p[mcp + 3] = Point2::new(x, 0.40);
    }
    p
}

/// Fist: fingertips curled back below their PIP joints, thumb tucked.
#[cfg(test)]
pub(crate) fn fist() -> [Point2; JOINT_COUNT] {
    let mut p = open_hand();
    for (tip, pip) in HandJoint::finger_tip_pip_pairs() {
        let pip_pos = p[pip.index()];
        p[tip.index()] = Point2::new(pip_pos.x, 0.62);
    }
    p[HandJoint::ThumbTip.index()] = Point2::new(0.47, 0.66);
    p
}

/// Translate every landmark by (dx, dy).
#[cfg(test)]
pub(crate) fn shifted(points: [Point2; JOINT_COUNT], dx: f32, dy: f32) -> [Point2; JOINT_COUNT] {
    let mut out = points;
    for p in &mut out {
        p.x += dx;
        p.y += dy;
    }
    out
}
