//! Virtual pad device: report model, sink trait and the ViGEm target.

pub mod frame;
pub mod sink;
pub mod vigem;

pub use frame::{ButtonSet, ControllerFrame, PadButton, StickVector, STICK_MAX, TRIGGER_MAX};
pub use sink::{ControllerSink, SinkConfig, SinkError};
pub use vigem::{XPad, XPadConfig};
