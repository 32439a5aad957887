//! Process-global keyboard listener.
//!
//! rdev supports exactly one listener per process, so the listener thread is
//! spawned once and lives for the lifetime of the application. What happens
//! with an event is decided by two slots:
//!
//! - an armed one-shot capture slot consumes the next key press (used by the
//!   configuration surface to bind a control),
//! - otherwise the event is routed into the active [`KeyState`], when the
//!   mapping loop has switched routing on.
//!
//! The capture slot is checked first, so capturing while the mapper runs
//! overrides routing for that single press and nothing else.

use super::keys::{KeyState, PhysicalKey};
use rdev::{Event, EventType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

#[derive(Debug, Error)]
pub enum HookError {
    #[error("keyboard listener failed: {0}")]
    ListenerFailed(String),
}

static LISTENER_SPAWNED: AtomicBool = AtomicBool::new(false);
static LISTENER_ERROR: Mutex<Option<String>> = Mutex::new(None);
static ROUTE: Mutex<Option<KeyState>> = Mutex::new(None);
static CAPTURE: Mutex<Option<oneshot::Sender<PhysicalKey>>> = Mutex::new(None);

fn slot<T>(slot: &'static Mutex<T>) -> MutexGuard<'static, T> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Spawns the global listener thread on first use.
///
/// rdev reports registration failure asynchronously from inside the listener
/// thread; once that happens every later activation fails fast here.
fn ensure_listener() -> Result<(), HookError> {
    if let Some(msg) = slot(&LISTENER_ERROR).clone() {
        return Err(HookError::ListenerFailed(msg));
    }
    if LISTENER_SPAWNED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
    {
        let spawned = std::thread::Builder::new()
            .name("padbridge-hook".to_string())
            .spawn(|| {
                if let Err(e) = rdev::listen(dispatch) {
                    error!("keyboard listener failed: {e:?}");
                    *slot(&LISTENER_ERROR) = Some(format!("{e:?}"));
                }
            });
        if let Err(e) = spawned {
            LISTENER_SPAWNED.store(false, Ordering::SeqCst);
            return Err(HookError::ListenerFailed(e.to_string()));
        }
        debug!("keyboard listener thread spawned");
    }
    Ok(())
}

fn dispatch(event: Event) {
    let (key, pressed) = match event.event_type {
        EventType::KeyPress(key) => (key, true),
        EventType::KeyRelease(key) => (key, false),
        _ => return,
    };
    route_key(PhysicalKey::from_key(key), pressed);
}

fn route_key(key: PhysicalKey, pressed: bool) {
    if pressed {
        if let Some(tx) = slot(&CAPTURE).take() {
            if tx.send(key).is_err() {
                debug!("captured key dropped, requester went away");
            }
            return;
        }
    }
    if let Some(keys) = slot(&ROUTE).as_ref() {
        if pressed {
            keys.record_down(key);
        } else {
            keys.record_up(&key);
        }
    }
}

/// Routes listener events into `keys` until [`deactivate`] is called.
pub fn activate(keys: KeyState) -> Result<(), HookError> {
    ensure_listener()?;
    *slot(&ROUTE) = Some(keys);
    Ok(())
}

/// Stops feeding the mapping loop. The listener thread stays alive but idle.
pub fn deactivate() {
    *slot(&ROUTE) = None;
}

/// Arms the one-shot capture slot and returns the receiving end.
///
/// Re-arming replaces a pending capture; the previous receiver observes a
/// closed channel.
pub fn capture_next_key() -> Result<oneshot::Receiver<PhysicalKey>, HookError> {
    ensure_listener()?;
    let (tx, rx) = oneshot::channel();
    if slot(&CAPTURE).replace(tx).is_some() {
        warn!("replacing pending key capture");
    }
    Ok(rx)
}

/// Disarms a pending capture, if any.
pub fn cancel_capture() {
    slot(&CAPTURE).take();
}

/// Seam between the mapping runtime and the global listener, so the runtime
/// can be driven in tests without touching the real hook.
pub trait HookControl: Send + 'static {
    fn activate(&self, keys: KeyState) -> Result<(), HookError>;
    fn deactivate(&self);
}

/// Production hook control backed by the process-global listener.
pub struct GlobalHook;

impl HookControl for GlobalHook {
    fn activate(&self, keys: KeyState) -> Result<(), HookError> {
        activate(keys)
    }

    fn deactivate(&self) {
        deactivate()
    }
}
