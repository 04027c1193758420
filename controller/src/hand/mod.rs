//! Hand subsystem: landmark frames and the features derived from them.
//!
//! Provides:
//! - `landmarks`: the 21-point hand model and `LandmarkFrame`
//! - `features`: palm, steering, grip and pinch extraction
//! - `source`: adapters that produce frames from detector output

pub mod features;
pub mod landmarks;
pub mod source;

pub use features::{FeatureConfig, FeatureExtractor, Features, GripStrategy};
pub use landmarks::{HandJoint, LandmarkFrame, Point2, JOINT_COUNT};
pub use source::{JsonLinesSource, LandmarkSource, SourceError};
