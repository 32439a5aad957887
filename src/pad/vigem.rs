//! ViGEmBus-backed virtual Xbox 360 controller.
//!
//! ViGEmBus is the virtual gamepad bus driver the original tool drove as
//! well; `vigem-client` talks to it directly. The bus only exists on
//! Windows, other targets get a sink config that reports the device as
//! unavailable.

use super::frame::ControllerFrame;
use super::sink::{ControllerSink, SinkConfig, SinkError};
use tracing::info;

/// Virtual wired Xbox 360 pad plugged into the ViGEm bus.
#[cfg(windows)]
pub struct XPad {
    target: vigem_client::Xbox360Wired<vigem_client::Client>,
}

#[cfg(windows)]
impl XPad {
    /// Connects to the bus, plugs a pad in and waits until the driver
    /// reports it ready. Dropping the value unplugs the pad again.
    pub fn create() -> Result<Self, SinkError> {
        let client =
            vigem_client::Client::connect().map_err(|e| SinkError::Unavailable(e.to_string()))?;
        let mut target =
            vigem_client::Xbox360Wired::new(client, vigem_client::TargetId::XBOX360_WIRED);
        target
            .plugin()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        target
            .wait_ready()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        info!("virtual Xbox 360 pad plugged in");
        Ok(Self { target })
    }
}

#[cfg(windows)]
impl ControllerSink for XPad {
    fn apply(&mut self, frame: &ControllerFrame) -> Result<(), SinkError> {
        let report = vigem_client::XGamepad {
            buttons: vigem_client::XButtons {
                raw: frame.buttons.raw(),
            },
            left_trigger: frame.left_trigger,
            right_trigger: frame.right_trigger,
            thumb_lx: frame.left_stick.x,
            thumb_ly: frame.left_stick.y,
            thumb_rx: frame.right_stick.x,
            thumb_ry: frame.right_stick.y,
        };
        // One update call carries the whole report, the commit is atomic
        // from the consumer's side.
        self.target
            .update(&report)
            .map_err(|e| SinkError::Commit(e.to_string()))
    }
}

#[cfg(not(windows))]
pub struct XPad;

#[cfg(not(windows))]
impl XPad {
    pub fn create() -> Result<Self, SinkError> {
        info!("virtual pad requested on a platform without ViGEmBus");
        Err(SinkError::Unavailable(
            "ViGEmBus virtual pads are only available on Windows".to_string(),
        ))
    }
}

#[cfg(not(windows))]
impl ControllerSink for XPad {
    fn apply(&mut self, _frame: &ControllerFrame) -> Result<(), SinkError> {
        Err(SinkError::Unavailable(
            "ViGEmBus virtual pads are only available on Windows".to_string(),
        ))
    }
}

/// Default sink config: one ViGEm Xbox 360 pad.
pub struct XPadConfig;

impl SinkConfig for XPadConfig {
    fn create_sink(&self) -> Result<Box<dyn ControllerSink>, SinkError> {
        XPad::create().map(|pad| Box::new(pad) as Box<dyn ControllerSink>)
    }
}
