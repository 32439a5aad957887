//! Error definitions for the mapping runtime.

use crate::input::HookError;
use crate::pad::SinkError;
use thiserror::Error;

/// Fatal startup failures of a mapping run.
///
/// Anything that goes wrong inside a running cycle is handled as a logged
/// transient instead, only these stop the run before it polls.
#[derive(Debug, Error)]
pub enum MapperError {
    /// The virtual pad device could not be acquired.
    #[error("virtual pad error: {0}")]
    Pad(#[from] SinkError),

    /// The keyboard listener could not be started.
    #[error("keyboard hook error: {0}")]
    Hook(#[from] HookError),
}
