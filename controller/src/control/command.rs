//! Wire command encoding.
//!
//! Payloads are short ASCII strings, one per datagram:
//! - differential: `"<a>,<b>"`, both in [-255, 255]
//! - discrete: `"<letter>:<speed>"`, letter in F/B/L/R/S, speed in [0, 255]
//!
//! The parsers below are the exact inverse of the encoder and describe
//! what the receiver accepts.  Changing either side is a protocol change.

use std::fmt;

use super::mapper::{Actuation, Direction, DriveCommand, MotorPair, MOTOR_LIMIT};

/// Coarse category of a command, used for change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandClass {
    /// Differential command with both motors at zero.
    Halted,
    /// Differential command with at least one motor turning.
    Moving,
    /// Discrete command, classed by its direction letter.
    Direction(Direction),
}

impl CommandClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Halted => "halted",
            Self::Moving => "moving",
            Self::Direction(d) => d.as_str(),
        }
    }
}

/// A wire-ready payload with its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    payload: String,
    class: CommandClass,
}

impl Command {
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.payload.as_bytes()
    }

    pub fn class(&self) -> CommandClass {
        self.class
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload)
    }
}

/// Errors from parsing a wire payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("missing separator {0:?} in payload {1:?}")]
    MissingSeparator(char, String),

    #[error("invalid integer {0:?}")]
    InvalidNumber(String),

    #[error("value {0} outside [{1}, {2}]")]
    OutOfRange(i64, i64, i64),

    #[error("unknown direction {0:?}")]
    UnknownDirection(String),
}

// ── Encoding ───────────────────────────────────────────────

/// Encode a motor pair.  Always succeeds.
pub fn encode_motor_pair(m: MotorPair) -> Command {
    Command {
        payload: format!("{},{}", m.a, m.b),
        class: if m.is_stopped() {
            CommandClass::Halted
        } else {
            CommandClass::Moving
        },
    }
}

/// Encode a direction command.  Always succeeds.
pub fn encode_drive_command(c: DriveCommand) -> Command {
    Command {
        payload: format!("{}:{}", c.direction.letter(), c.speed),
        class: CommandClass::Direction(c.direction),
    }
}

/// Encode either scheme's actuation.
pub fn encode(actuation: Actuation) -> Command {
    match actuation {
        Actuation::Differential(m) => encode_motor_pair(m),
        Actuation::Discrete(c) => encode_drive_command(c),
    }
}

// ── Parsing ────────────────────────────────────────────────

fn parse_bounded(s: &str, min: i64, max: i64) -> Result<i64, ProtocolError> {
    let v: i64 = s
        .parse()
        .map_err(|_| ProtocolError::InvalidNumber(s.to_string()))?;
    if v < min || v > max {
        return Err(ProtocolError::OutOfRange(v, min, max));
    }
    Ok(v)
}

/// Parse a `"<a>,<b>"` payload.
pub fn parse_motor_pair(payload: &str) -> Result<MotorPair, ProtocolError> {
    let (a, b) = payload
        .split_once(',')
        .ok_or_else(|| ProtocolError::MissingSeparator(',', payload.to_string()))?;
    let limit = MOTOR_LIMIT as i64;
    Ok(MotorPair {
        a: parse_bounded(a, -limit, limit)? as i32,
        b: parse_bounded(b, -limit, limit)? as i32,
    })
}

/// Parse a `"<letter>:<speed>"` payload.
pub fn parse_drive_command(payload: &str) -> Result<DriveCommand, ProtocolError> {
    let (letter, speed) = payload
        .split_once(':')
        .ok_or_else(|| ProtocolError::MissingSeparator(':', payload.to_string()))?;
    let mut chars = letter.chars();
    let direction = match (chars.next(), chars.next()) {
        (Some(c), None) => Direction::from_letter(c),
        _ => None,
    }
    .ok_or_else(|| ProtocolError::UnknownDirection(letter.to_string()))?;
    Ok(DriveCommand {
        direction,
        speed: parse_bounded(speed, 0, u8::MAX as i64)? as u8,
    })
}
