//! Control subsystem: features to wire commands.
//!
//! Provides:
//! - `mapper`: differential and discrete value mapping
//! - `smoother`: per-channel moving average
//! - `command`: payload encoding and the matching parsers

pub mod command;
pub mod mapper;
pub mod smoother;

pub use command::{encode, Command, CommandClass, ProtocolError};
pub use mapper::{
    Actuation, DifferentialConfig, Direction, DiscreteConfig, DriveCommand, MotorPair,
    ValueMapper,
};
pub use smoother::{ChannelSmoother, MotorSmoother};
