#![warn(missing_docs)]

//! Anchored stroke drawing.
//!
//! A [`DrawingSession`] reads one [`FrameInput`] per tick, lets the
//! [`AnchoredController`] turn the pen pose into a surface hit, and hands
//! accepted hits to a [`StrokeSink`]. Nothing here depends on a host
//! engine: frames come from any [`FrameSource`].

pub mod controller;
pub mod error;
pub mod frame;
pub mod session;
pub mod settings;
pub mod stroke;

#[cfg(test)]
mod test_support;

pub use controller::{AnchoredController, InteractionMode, TickOutput};
pub use error::{ReplayError, SettingsError};
pub use frame::{ButtonState, ButtonTracker, FrameInput, FrameSource, Pose, ReplaySource};
pub use session::DrawingSession;
pub use settings::{DrawSettings, ProjectionMode};
pub use stroke::{Stroke, StrokeRecorder, StrokeSink};
