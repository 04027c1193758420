//! Controller configuration.
//!
//! Static for the life of a session.  Defaults are the values the
//! receiver firmware was tuned against.

use std::time::Duration;

use crate::control::{DifferentialConfig, DiscreteConfig, ValueMapper};
use crate::control::smoother::DEFAULT_WINDOW;
use crate::hand::{FeatureConfig, GripStrategy};
use crate::transport::{ChangeRule, DispatchConfig, DEFAULT_HOST, DEFAULT_PORT};

/// Which control scheme, and therefore which wire format, is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Two signed motor values: `"<a>,<b>"`.
    Differential,
    /// Direction letter plus speed: `"<L>:<speed>"`.
    Discrete,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Differential => "differential",
            Self::Discrete => "discrete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "differential" => Some(Self::Differential),
            "discrete" => Some(Self::Discrete),
            _ => None,
        }
    }

    /// Hand-rest bias observed with each scheme's camera setup (degrees).
    pub fn default_steering_offset(&self) -> f32 {
        match self {
            Self::Differential => 10.0,
            Self::Discrete => 12.0,
        }
    }

    /// The discrete setup was calibrated on a mirrored (selfie) view.
    pub fn default_mirror(&self) -> bool {
        matches!(self, Self::Discrete)
    }

    pub fn default_grip(&self) -> GripStrategy {
        match self {
            Self::Differential => GripStrategy::TipBelowPip,
            Self::Discrete => GripStrategy::TipNearWrist,
        }
    }

    pub fn default_change_rule(&self) -> ChangeRule {
        match self {
            Self::Differential => ChangeRule::Payload,
            Self::Discrete => ChangeRule::Class,
        }
    }
}

/// Invalid configuration, detected before the session starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("smoothing window must hold at least one sample")]
    EmptySmoothingWindow,

    #[error("speed range [{min}, {max}] must satisfy 0 <= min <= max <= 255")]
    SpeedRange { min: i32, max: i32 },

    #[error("palm low and high bounds must differ (both {0})")]
    PalmRange(f32),

    #[error("pinch range [{min}, {max}] is empty")]
    PinchRange { min: f32, max: f32 },

    #[error("deadzone {0} must be within [0, 255]")]
    Deadzone(i32),

    #[error("turn threshold {turn} must be below back threshold {back}")]
    AngleBands { turn: f32, back: f32 },

    #[error("full-lock angle must be positive, got {0}")]
    FullLock(f32),

    #[error("image size {width}x{height} must be non-zero")]
    ImageSize { width: u32, height: u32 },
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub scheme: Scheme,
    pub features: FeatureConfig,
    pub differential: DifferentialConfig,
    pub discrete: DiscreteConfig,
    pub dispatch: DispatchConfig,
    /// Samples averaged per motor channel (differential scheme only).
    pub smoothing_window: usize,
    /// Receiver host name or address.
    pub host: String,
    /// Receiver UDP port.
    pub port: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::for_scheme(Scheme::Differential)
    }
}

impl ControllerConfig {
    /// Defaults for `scheme`: steering calibration, mirroring, grip
    /// heuristic and change rule all come as one set.
    pub fn for_scheme(scheme: Scheme) -> Self {
        Self {
            scheme,
            features: FeatureConfig {
                steering_offset_deg: scheme.default_steering_offset(),
                grip: scheme.default_grip(),
                mirror: scheme.default_mirror(),
                ..FeatureConfig::default()
            },
            differential: DifferentialConfig::default(),
            discrete: DiscreteConfig::default(),
            dispatch: DispatchConfig {
                change_rule: scheme.default_change_rule(),
                ..DispatchConfig::default()
            },
            smoothing_window: DEFAULT_WINDOW,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }

    /// Mapper for the active scheme.
    pub fn mapper(&self) -> ValueMapper {
        match self.scheme {
            Scheme::Differential => ValueMapper::Differential(self.differential.clone()),
            Scheme::Discrete => ValueMapper::Discrete(self.discrete.clone()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.dispatch.cooldown
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smoothing_window == 0 {
            return Err(ConfigError::EmptySmoothingWindow);
        }

        let f = &self.features;
        if f.image_width == 0 || f.image_height == 0 {
            return Err(ConfigError::ImageSize {
                width: f.image_width,
                height: f.image_height,
            });
        }

        let d = &self.differential;
        if d.min_speed < 0 || d.min_speed > d.max_speed || d.max_speed > 255 {
            return Err(ConfigError::SpeedRange {
                min: d.min_speed,
                max: d.max_speed,
            });
        }
        if d.palm_low == d.palm_high {
            return Err(ConfigError::PalmRange(d.palm_low));
        }
        if !(0..=255).contains(&d.deadzone) {
            return Err(ConfigError::Deadzone(d.deadzone));
        }
        if d.full_lock_deg <= 0.0 {
            return Err(ConfigError::FullLock(d.full_lock_deg));
        }

        let s = &self.discrete;
        if s.min_pinch_px >= s.max_pinch_px {
            return Err(ConfigError::PinchRange {
                min: s.min_pinch_px,
                max: s.max_pinch_px,
            });
        }
        if s.turn_deg >= s.back_deg {
            return Err(ConfigError::AngleBands {
                turn: s.turn_deg,
                back: s.back_deg,
            });
        }

        Ok(())
    }

    /// Generate s-expression describing the active configuration.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:scheme {} :dest \"{}:{}\" :cooldown-ms {} :change-rule {} :smoothing {} :grip {} :steering-offset {:.1} :mirror {})",
            self.scheme.as_str(),
            self.host,
            self.port,
            self.dispatch.cooldown.as_millis(),
            self.dispatch.change_rule.as_str(),
            self.smoothing_window,
            self.features.grip.as_str(),
            self.features.steering_offset_deg,
            if self.features.mirror { "t" } else { "nil" },
        )
    }
}
