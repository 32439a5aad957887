//! The mapping core: pure frame composition, exit combo detection and the
//! fixed-rate runtime that drives the virtual pad.

pub mod compose;
pub mod error;
pub mod exit;
pub mod runtime;

pub use compose::compose_frame;
pub use error::MapperError;
pub use exit::ExitDetector;
pub use runtime::{MapperHandle, MapperStatus};
