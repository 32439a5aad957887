//! Sink abstraction over the virtual pad device.

use super::frame::ControllerFrame;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    /// The virtual device could not be opened. Fatal to a mapping run.
    #[error("virtual pad unavailable: {0}")]
    Unavailable(String),

    /// A single report commit failed. Transient, the cycle is skipped.
    #[error("frame commit failed: {0}")]
    Commit(String),
}

/// Applies computed frames to a virtual controller device.
///
/// `apply` must commit the whole frame in a single device flush so observers
/// never see a half-updated report.
pub trait ControllerSink: Send {
    fn apply(&mut self, frame: &ControllerFrame) -> Result<(), SinkError>;

    /// Resets every control to rest and commits. Called on every exit path.
    fn neutral_and_flush(&mut self) -> Result<(), SinkError> {
        self.apply(&ControllerFrame::NEUTRAL)
    }
}

/// Factory producing a sink at mapper start, so device acquisition happens
/// inside the run lifecycle and the runtime never names a concrete device.
pub trait SinkConfig: Send + 'static {
    fn create_sink(&self) -> Result<Box<dyn ControllerSink>, SinkError>;
}
