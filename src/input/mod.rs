//! Keyboard input: key identity, held-key state and the global listener.

pub mod hook;
pub mod keys;

pub use hook::{GlobalHook, HookControl, HookError};
pub use keys::{KeySnapshot, KeyState, PhysicalKey};
