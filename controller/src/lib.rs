//! Gesture controller: hand landmarks in, drive commands out over UDP.
//!
//! Each detector frame is reduced to a few scalar features (tilt, palm
//! height, grip, pinch), mapped to actuator values under one of two
//! control schemes, smoothed, encoded as a short ASCII payload and sent
//! to the receiver when it changed or its keep-alive is due.

pub mod config;
pub mod control;
pub mod hand;
pub mod pipeline;
pub mod session;
pub mod transport;
