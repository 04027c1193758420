//! Feature → actuator mapping.
//!
//! Two control schemes are supported:
//! - differential: palm height sets speed, tilt steers, fist reverses;
//!   output is a pair of signed motor values
//! - discrete: pinch width sets speed, tilt picks one of five direction
//!   letters, fist stops; output is a (direction, speed) pair

use crate::hand::Features;

/// Largest motor magnitude on the wire.
pub const MOTOR_LIMIT: i32 = 255;

// ── Actuator values ────────────────────────────────────────

/// Signed speeds for the two drive motors, each in [-255, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorPair {
    pub a: i32,
    pub b: i32,
}

impl MotorPair {
    pub const STOP: MotorPair = MotorPair { a: 0, b: 0 };

    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    pub fn is_stopped(&self) -> bool {
        self.a == 0 && self.b == 0
    }
}

/// Direction classes of the discrete scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
    Stop,
}

impl Direction {
    /// Wire letter.
    pub fn letter(&self) -> char {
        match self {
            Self::Forward => 'F',
            Self::Back => 'B',
            Self::Left => 'L',
            Self::Right => 'R',
            Self::Stop => 'S',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'F' => Some(Self::Forward),
            'B' => Some(Self::Back),
            'L' => Some(Self::Left),
            'R' => Some(Self::Right),
            'S' => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
            Self::Stop => "stop",
        }
    }
}

/// A direction with an unsigned speed in [0, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveCommand {
    pub direction: Direction,
    pub speed: u8,
}

impl DriveCommand {
    pub const STOP: DriveCommand = DriveCommand {
        direction: Direction::Stop,
        speed: 0,
    };
}

/// Output of the value mapper for either scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    Differential(MotorPair),
    Discrete(DriveCommand),
}

// ── Config ─────────────────────────────────────────────────

/// Tuning for the differential (two-motor) scheme.
#[derive(Debug, Clone)]
pub struct DifferentialConfig {
    /// Speed with the hand at its lowest.
    pub min_speed: i32,
    /// Speed with the hand at its highest.
    pub max_speed: i32,
    /// Normalized palm y treated as "hand low" (maps to `min_speed`).
    pub palm_low: f32,
    /// Normalized palm y treated as "hand high" (maps to `max_speed`).
    pub palm_high: f32,
    /// Floor applied to the base speed while reversing.
    pub min_reverse_speed: i32,
    /// Magnitudes below this are snapped to zero.
    pub deadzone: i32,
    /// Tilt (degrees) that produces a full-lock turn.
    pub full_lock_deg: f32,
    /// Steering factor magnitude treated as straight ahead.
    pub straight_deadzone: f32,
    /// Fraction of base speed removed from the inside motor at full lock.
    pub turn_ratio: f32,
}

impl Default for DifferentialConfig {
    fn default() -> Self {
        Self {
            min_speed: 80,
            max_speed: 255,
            palm_low: 0.8,
            palm_high: 0.2,
            min_reverse_speed: 100,
            deadzone: 20,
            full_lock_deg: 45.0,
            straight_deadzone: 0.1,
            turn_ratio: 0.6,
        }
    }
}

/// Tuning for the discrete (direction letter) scheme.
#[derive(Debug, Clone)]
pub struct DiscreteConfig {
    /// Pinch distance (px) at or below which speed is 0.
    pub min_pinch_px: f32,
    /// Pinch distance (px) at or above which speed is `max_speed`.
    pub max_pinch_px: f32,
    pub max_speed: u8,
    /// Tilt magnitude (degrees) beyond which the hand means BACK.
    pub back_deg: f32,
    /// Tilt magnitude (degrees) beyond which the hand means LEFT/RIGHT.
    pub turn_deg: f32,
}

impl Default for DiscreteConfig {
    fn default() -> Self {
        Self {
            min_pinch_px: 30.0,
            max_pinch_px: 200.0,
            max_speed: 255,
            back_deg: 120.0,
            turn_deg: 25.0,
        }
    }
}

// ── Helpers ────────────────────────────────────────────────

/// Linear map of `value` from [in_min, in_max] to [out_min, out_max].
/// Does not clamp.
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Clamp a motor value to the wire range.
pub fn clamp_motor(v: i32) -> i32 {
    v.clamp(-MOTOR_LIMIT, MOTOR_LIMIT)
}

/// Snap values whose magnitude is below `deadzone` to zero.
pub fn apply_deadzone(v: i32, deadzone: i32) -> i32 {
    if v.abs() < deadzone {
        0
    } else {
        v
    }
}

// ── Mapper ─────────────────────────────────────────────────

/// Converts features into actuator values under one control scheme.
#[derive(Debug, Clone)]
pub enum ValueMapper {
    Differential(DifferentialConfig),
    Discrete(DiscreteConfig),
}

impl ValueMapper {
    pub fn map(&self, features: &Features) -> Actuation {
        match self {
            Self::Differential(cfg) => Actuation::Differential(differential(cfg, features)),
            Self::Discrete(cfg) => Actuation::Discrete(discrete(cfg, features)),
        }
    }

    /// Actuation sent when no hand is visible or on shutdown.
    pub fn stop(&self) -> Actuation {
        match self {
            Self::Differential(_) => Actuation::Differential(MotorPair::STOP),
            Self::Discrete(_) => Actuation::Discrete(DriveCommand::STOP),
        }
    }
}

/// Base speed from palm height, clamped to [min_speed, max_speed].
pub fn base_speed(cfg: &DifferentialConfig, palm_height: f32) -> i32 {
    let t = ((palm_height - cfg.palm_low) / (cfg.palm_high - cfg.palm_low)).clamp(0.0, 1.0);
    map_range(t, 0.0, 1.0, cfg.min_speed as f32, cfg.max_speed as f32) as i32
}

/// Two-motor mapping: height → speed, tilt → differential, fist → reverse.
pub fn differential(cfg: &DifferentialConfig, features: &Features) -> MotorPair {
    let mut base = base_speed(cfg, features.palm_height);
    if features.grip_closed && base < cfg.min_reverse_speed {
        base = cfg.min_reverse_speed;
    }
    steer(cfg, base, features.steering_angle_deg, features.grip_closed)
}

/// Split `base` across the two motors for the given tilt.
///
/// Motor A is the inside wheel on a left turn, motor B on a right turn.
/// The inside wheel loses the full difference, the outside gains half.
pub fn steer(cfg: &DifferentialConfig, base: i32, angle_deg: f32, reverse: bool) -> MotorPair {
    let factor = (angle_deg / cfg.full_lock_deg).clamp(-1.0, 1.0);

    let (mut a, mut b) = if factor.abs() < cfg.straight_deadzone {
        (base, base)
    } else {
        let diff = (base.abs() as f32 * factor.abs() * cfg.turn_ratio) as i32;
        if factor < 0.0 {
            (base - diff, base + diff / 2)
        } else {
            (base + diff / 2, base - diff)
        }
    };

    if reverse {
        a = -a.abs();
        b = -b.abs();
    }

    MotorPair {
        a: apply_deadzone(clamp_motor(a), cfg.deadzone),
        b: apply_deadzone(clamp_motor(b), cfg.deadzone),
    }
}

/// Pinch distance → speed in [0, max_speed], clamped at both ends.
pub fn pinch_speed(cfg: &DiscreteConfig, pinch_px: f32) -> u8 {
    if pinch_px <= cfg.min_pinch_px {
        return 0;
    }
    if pinch_px >= cfg.max_pinch_px {
        return cfg.max_speed;
    }
    let speed = map_range(
        pinch_px,
        cfg.min_pinch_px,
        cfg.max_pinch_px,
        0.0,
        cfg.max_speed as f32,
    );
    speed.clamp(0.0, cfg.max_speed as f32) as u8
}

/// Classify a tilt angle into a direction band.
///
/// Order matters: BACK is the wraparound region beyond ±back_deg and must
/// be tested before the one-sided LEFT/RIGHT thresholds.
pub fn classify_angle(cfg: &DiscreteConfig, angle_deg: f32) -> Direction {
    if angle_deg > cfg.back_deg || angle_deg < -cfg.back_deg {
        Direction::Back
    } else if angle_deg < -cfg.turn_deg {
        Direction::Left
    } else if angle_deg > cfg.turn_deg {
        Direction::Right
    } else {
        Direction::Forward
    }
}

/// Direction-letter mapping: fist stops, otherwise tilt picks the band.
pub fn discrete(cfg: &DiscreteConfig, features: &Features) -> DriveCommand {
    if features.grip_closed {
        return DriveCommand::STOP;
    }
    DriveCommand {
        direction: classify_angle(cfg, features.steering_angle_deg),
        speed: pinch_speed(cfg, features.pinch_distance_px),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::Point2;

    fn features(palm_height: f32, angle: f32, grip: bool, pinch: f32) -> Features {
        Features {
            steering_angle_deg: angle,
            palm_center: Point2::new(0.5, palm_height),
            palm_height,
            grip_closed: grip,
            pinch_distance_px: pinch,
        }
    }

    // ── differential ──

    #[test]
    fn test_base_speed_endpoints() {
        let cfg = DifferentialConfig::default();
        assert_eq!(base_speed(&cfg, 0.8), 80);
        assert_eq!(base_speed(&cfg, 0.2), 255);
        assert_eq!(base_speed(&cfg, 0.95), 80);
        assert_eq!(base_speed(&cfg, 0.05), 255);
        assert_eq!(base_speed(&cfg, 0.5), 167);
    }

    #[test]
    fn test_base_speed_monotonic_as_hand_rises() {
        let cfg = DifferentialConfig::default();
        let mut prev = i32::MIN;
        for i in 0..=100 {
            let palm_y = 1.0 - i as f32 / 100.0;
            let speed = base_speed(&cfg, palm_y);
            assert!(speed >= prev, "speed dropped at y={}", palm_y);
            assert!((cfg.min_speed..=cfg.max_speed).contains(&speed));
            prev = speed;
        }
    }

    #[test]
    fn test_straight_ahead_equal_motors() {
        let cfg = DifferentialConfig::default();
        let m = differential(&cfg, &features(0.5, 3.0, false, 0.0));
        assert_eq!(m, MotorPair::new(167, 167));
    }

    #[test]
    fn test_left_turn_slows_motor_a() {
        let cfg = DifferentialConfig::default();
        // factor -0.5 → diff = trunc(150 * 0.5 * 0.6) = 45
        let m = steer(&cfg, 150, -22.5, false);
        assert_eq!(m, MotorPair::new(105, 172));
    }

    #[test]
    fn test_right_turn_slows_motor_b() {
        let cfg = DifferentialConfig::default();
        let m = steer(&cfg, 150, 22.5, false);
        assert_eq!(m, MotorPair::new(172, 105));
    }

    #[test]
    fn test_full_lock_saturates() {
        let cfg = DifferentialConfig::default();
        // factor clamps to 1 → diff = 153
        let m = steer(&cfg, 255, 90.0, false);
        assert_eq!(m, MotorPair::new(255, 102));
    }

    #[test]
    fn test_grip_forces_reverse() {
        let cfg = DifferentialConfig::default();
        for angle in [-60.0, -20.0, 0.0, 20.0, 60.0] {
            let m = steer(&cfg, 150, angle, true);
            assert!(m.a < 0 && m.b < 0, "angle {} gave {:?}", angle, m);
        }
        assert_eq!(steer(&cfg, 150, 0.0, true), MotorPair::new(-150, -150));
    }

    #[test]
    fn test_grip_raises_reverse_floor() {
        let cfg = DifferentialConfig::default();
        // hand low → base 80, raised to 100 while reversing
        let m = differential(&cfg, &features(0.8, 0.0, true, 0.0));
        assert_eq!(m, MotorPair::new(-100, -100));
        // no floor when driving forward
        let m = differential(&cfg, &features(0.8, 0.0, false, 0.0));
        assert_eq!(m, MotorPair::new(80, 80));
    }

    #[test]
    fn test_deadzone_snaps_small_values() {
        let cfg = DifferentialConfig {
            min_speed: 0,
            ..DifferentialConfig::default()
        };
        assert_eq!(steer(&cfg, 19, 0.0, false), MotorPair::STOP);
        assert_eq!(steer(&cfg, 20, 0.0, false), MotorPair::new(20, 20));
        // inside motor drops under the deadzone while the outer one survives
        let m = steer(&cfg, 30, -45.0, false);
        assert_eq!(m, MotorPair::new(0, 39));
    }

    #[test]
    fn test_deadzone_property() {
        let dz = 20;
        for v in -300..=300 {
            let out = apply_deadzone(clamp_motor(v), dz);
            if clamp_motor(v).abs() < dz {
                assert_eq!(out, 0);
            } else {
                assert_eq!(out, clamp_motor(v));
            }
        }
    }

    #[test]
    fn test_clamp_idempotent() {
        for v in [-1000, -256, -255, 0, 255, 256, 1000] {
            assert_eq!(clamp_motor(clamp_motor(v)), clamp_motor(v));
        }
        let cfg = DiscreteConfig::default();
        for px in [-10.0, 0.0, 30.0, 115.0, 200.0, 500.0] {
            let s = pinch_speed(&cfg, px);
            assert!(s <= cfg.max_speed);
        }
    }

    // ── discrete ──

    #[test]
    fn test_angle_bands() {
        let cfg = DiscreteConfig::default();
        assert_eq!(classify_angle(&cfg, 150.0), Direction::Back);
        assert_eq!(classify_angle(&cfg, -150.0), Direction::Back);
        assert_eq!(classify_angle(&cfg, -30.0), Direction::Left);
        assert_eq!(classify_angle(&cfg, 30.0), Direction::Right);
        assert_eq!(classify_angle(&cfg, 0.0), Direction::Forward);
        assert_eq!(classify_angle(&cfg, 25.0), Direction::Forward);
        assert_eq!(classify_angle(&cfg, 25.1), Direction::Right);
        assert_eq!(classify_angle(&cfg, -25.0), Direction::Forward);
        assert_eq!(classify_angle(&cfg, 120.0), Direction::Right);
        assert_eq!(classify_angle(&cfg, 180.0), Direction::Back);
    }

    #[test]
    fn test_angle_bands_exhaustive() {
        let cfg = DiscreteConfig::default();
        let mut angle = -179.9f32;
        while angle <= 180.0 {
            // every angle lands in exactly one band, never STOP
            assert_ne!(classify_angle(&cfg, angle), Direction::Stop);
            angle += 0.1;
        }
    }

    #[test]
    fn test_pinch_speed_mapping() {
        let cfg = DiscreteConfig::default();
        assert_eq!(pinch_speed(&cfg, 10.0), 0);
        assert_eq!(pinch_speed(&cfg, 30.0), 0);
        assert_eq!(pinch_speed(&cfg, 115.0), 127);
        assert_eq!(pinch_speed(&cfg, 200.0), 255);
        assert_eq!(pinch_speed(&cfg, 400.0), 255);
    }

    #[test]
    fn test_grip_overrides_pinch() {
        let cfg = DiscreteConfig::default();
        let cmd = discrete(&cfg, &features(0.5, 0.0, true, 150.0));
        assert_eq!(cmd, DriveCommand::STOP);
    }

    #[test]
    fn test_discrete_open_hand() {
        let cfg = DiscreteConfig::default();
        let cmd = discrete(&cfg, &features(0.5, -40.0, false, 200.0));
        assert_eq!(cmd.direction, Direction::Left);
        assert_eq!(cmd.speed, 255);
    }

    #[test]
    fn test_mapper_stop() {
        let a = ValueMapper::Differential(DifferentialConfig::default());
        let b = ValueMapper::Discrete(DiscreteConfig::default());
        assert_eq!(a.stop(), Actuation::Differential(MotorPair::STOP));
        assert_eq!(b.stop(), Actuation::Discrete(DriveCommand::STOP));
    }

    #[test]
    fn test_direction_letters_roundtrip() {
        for d in [
            Direction::Forward,
            Direction::Back,
            Direction::Left,
            Direction::Right,
            Direction::Stop,
        ] {
            assert_eq!(Direction::from_letter(d.letter()), Some(d));
        }
        assert_eq!(Direction::from_letter('X'), None);
    }
}
