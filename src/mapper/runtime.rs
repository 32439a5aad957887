//! Mapping runtime with statum state machine for the run lifecycle.
//!
//! # State Machine
//!
//! ```text
//! Starting ──► Running ──► Stopping ──► Stopped
//! ```
//!
//! The machine lives inside one tokio task per run. A run ends on the exit
//! combo or an external stop request; both paths go through `Stopping`,
//! which tears down listener routing and leaves the virtual pad neutral.
//!
//! # Architecture
//!
//! ```text
//! KeyState ──┐
//!            ├─► compose_frame ──► ControllerSink
//! Profile  ──┘        │
//!  (portal)      ExitDetector ──► Stopping
//! ```
//!
//! Only device acquisition and listener registration are fatal; any error
//! inside a single cycle is logged and the cycle skipped.

use crate::input::{HookControl, KeyState};
use crate::mapper::compose::compose_frame;
use crate::mapper::error::MapperError;
use crate::mapper::exit::ExitDetector;
use crate::pad::{ControllerSink, SinkConfig};
use crate::profile::ProfilePortal;
use statum::{machine, state};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Current runtime status, published to the configuration surface through a
/// watch channel. One line of state, no event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum MapperStatus {
    Ready,
    Starting,
    Running,
    Stopping,
    Stopped,
    Error(String),
}

impl fmt::Display for MapperStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapperStatus::Ready => write!(f, "Ready"),
            MapperStatus::Starting => write!(f, "Starting"),
            MapperStatus::Running => write!(f, "Running"),
            MapperStatus::Stopping => write!(f, "Stopping"),
            MapperStatus::Stopped => write!(f, "Stopped"),
            MapperStatus::Error(detail) => write!(f, "Error: {detail}"),
        }
    }
}

/// States of one mapping run using statum.
#[state]
#[derive(Debug, Clone)]
pub enum MapperState {
    Starting, // Device and listener acquired, not polling yet
    Running,  // Fixed-rate mapping cycle
    Stopping, // Tearing down routing and neutralizing the pad
    Stopped,  // Terminal, task is about to end
}

/// One mapping run with compile-time state safety.
#[machine]
pub struct Mapper<S: MapperState> {
    keys: KeyState,
    portal: Arc<ProfilePortal>,
    sink: Box<dyn ControllerSink>,
    hook: Box<dyn HookControl>,
    status: watch::Sender<MapperStatus>,
    cycle: Duration,
    exit: ExitDetector,
}

impl Mapper<Starting> {
    pub fn create(
        keys: KeyState,
        portal: Arc<ProfilePortal>,
        sink: Box<dyn ControllerSink>,
        hook: Box<dyn HookControl>,
        status: watch::Sender<MapperStatus>,
        cycle: Duration,
    ) -> Self {
        Self::new(keys, portal, sink, hook, status, cycle, ExitDetector::new())
    }

    pub fn engage(self) -> Mapper<Running> {
        self.status.send_replace(MapperStatus::Running);
        info!("mapper running");
        self.transition()
    }
}

impl Mapper<Running> {
    /// Fixed-rate mapping loop. Runs until the exit combo is held long
    /// enough or the external stop signal arrives; the stop signal also
    /// interrupts the sleep between cycles.
    pub async fn run_until_stopped(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Mapper<Stopping> {
        loop {
            if self.cycle_once() {
                info!("exit combo held, stopping");
                break;
            }
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("external stop requested");
                    break;
                }
                _ = tokio::time::sleep(self.cycle) => {}
            }
        }
        self.transition()
    }

    /// One mapping cycle. Returns true when the exit combo fired.
    fn cycle_once(&mut self) -> bool {
        // Fresh snapshot every cycle so live edits apply within one cycle.
        let profile = match self.portal.snapshot() {
            Ok(profile) => profile,
            Err(e) => {
                warn!("skipping cycle, profile unavailable: {e}");
                return false;
            }
        };
        let keys = self.keys.snapshot();

        let combo_down = keys.is_down(profile.exit_key_1.key())
            && keys.is_down(profile.exit_key_2.key());
        if self
            .exit
            .poll(combo_down, hold_duration(profile.exit_hold_secs))
        {
            return true;
        }

        let frame = compose_frame(&keys, &profile);
        if let Err(e) = self.sink.apply(&frame) {
            warn!("skipping cycle, frame not applied: {e}");
        }
        false
    }
}

impl Mapper<Stopping> {
    /// Tears the run down: routing off, held keys dropped, pad neutral.
    pub fn shutdown(mut self) -> Mapper<Stopped> {
        self.status.send_replace(MapperStatus::Stopping);
        self.hook.deactivate();
        self.keys.clear();
        if let Err(e) = self.sink.neutral_and_flush() {
            warn!("could not neutralize virtual pad: {e}");
        }
        self.status.send_replace(MapperStatus::Stopped);
        info!("mapper stopped");
        self.transition()
    }
}

impl Mapper<Stopped> {}

fn hold_duration(secs: f32) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f32(secs)
    } else {
        Duration::ZERO
    }
}

/// Handle for driving mapping runs from the configuration surface.
///
/// `start` is idempotent while a run is live; `stop` is non-blocking and
/// callable from any thread, the actual teardown happens inside the run's
/// own task on its next wake.
pub struct MapperHandle {
    keys: KeyState,
    portal: Arc<ProfilePortal>,
    cycle: Duration,
    status_tx: watch::Sender<MapperStatus>,
    status_rx: watch::Receiver<MapperStatus>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MapperHandle {
    pub fn new(keys: KeyState, portal: Arc<ProfilePortal>, cycle: Duration) -> Self {
        let (status_tx, status_rx) = watch::channel(MapperStatus::Ready);
        Self {
            keys,
            portal,
            cycle,
            status_tx,
            status_rx,
            shutdown_tx: None,
            task: None,
        }
    }

    pub fn status(&self) -> MapperStatus {
        self.status_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MapperStatus> {
        self.status_rx.clone()
    }

    /// Whether a run task is currently live (any state before `Stopped`).
    pub fn is_active(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Spawns a mapping run. A no-op while a run is already live.
    ///
    /// Device acquisition happens inside the spawned task; a failure is
    /// reported through the status channel and the task ends without ever
    /// entering the polling cycle.
    pub fn start(&mut self, sink_config: Box<dyn SinkConfig>, hook: Box<dyn HookControl>) {
        if self.is_active() {
            debug!("mapper already active, start ignored");
            return;
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let keys = self.keys.clone();
        let portal = self.portal.clone();
        let status = self.status_tx.clone();
        let cycle = self.cycle;

        self.task = Some(tokio::spawn(async move {
            status.send_replace(MapperStatus::Starting);

            let mut sink = match sink_config.create_sink() {
                Ok(sink) => sink,
                Err(e) => return fail(&status, MapperError::Pad(e)),
            };
            if let Err(e) = hook.activate(keys.clone()) {
                // The pad exists already, leave it at rest before bailing.
                if let Err(flush) = sink.neutral_and_flush() {
                    warn!("could not neutralize virtual pad: {flush}");
                }
                return fail(&status, MapperError::Hook(e));
            }

            let mapper = Mapper::create(keys, portal, sink, hook, status, cycle);
            let _stopped = mapper.engage().run_until_stopped(shutdown_rx).await.shutdown();
        }));
    }

    /// Requests the live run to stop. Returns immediately.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                debug!("mapper task already finished");
            }
        }
    }
}

fn fail(status: &watch::Sender<MapperStatus>, err: MapperError) {
    error!("mapper failed to start: {err}");
    status.send_replace(MapperStatus::Error(err.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{HookError, PhysicalKey};
    use crate::pad::{ControllerFrame, PadButton, SinkError};
    use crate::profile::{KeySlot, Profile};
    use std::sync::Mutex;

    const CYCLE: Duration = Duration::from_millis(5);

    #[derive(Default)]
    struct RecordingSink {
        frames: Arc<Mutex<Vec<ControllerFrame>>>,
    }

    impl ControllerSink for RecordingSink {
        fn apply(&mut self, frame: &ControllerFrame) -> Result<(), SinkError> {
            self.frames.lock().unwrap().push(*frame);
            Ok(())
        }
    }

    struct RecordingSinkConfig {
        frames: Arc<Mutex<Vec<ControllerFrame>>>,
    }

    impl SinkConfig for RecordingSinkConfig {
        fn create_sink(&self) -> Result<Box<dyn ControllerSink>, SinkError> {
            Ok(Box::new(RecordingSink {
                frames: self.frames.clone(),
            }))
        }
    }

    struct FailingSinkConfig;

    impl SinkConfig for FailingSinkConfig {
        fn create_sink(&self) -> Result<Box<dyn ControllerSink>, SinkError> {
            Err(SinkError::Unavailable("bus driver missing".to_string()))
        }
    }

    struct NoopHook;

    impl HookControl for NoopHook {
        fn activate(&self, _keys: KeyState) -> Result<(), HookError> {
            Ok(())
        }

        fn deactivate(&self) {}
    }

    fn test_profile() -> Profile {
        let mut profile = Profile::default();
        profile.a = KeySlot::bound(PhysicalKey::Char('j'));
        profile.exit_hold_secs = 0.05;
        profile
    }

    async fn wait_for(
        rx: &mut watch::Receiver<MapperStatus>,
        pred: impl Fn(&MapperStatus) -> bool,
    ) {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if pred(&rx.borrow()) {
                    return;
                }
                rx.changed().await.expect("status channel closed");
            }
        })
        .await
        .expect("status never reached");
    }

    fn handle_with_recorder() -> (MapperHandle, KeyState, Arc<Mutex<Vec<ControllerFrame>>>) {
        let keys = KeyState::new();
        let portal = Arc::new(ProfilePortal::new(test_profile()));
        let handle = MapperHandle::new(keys.clone(), portal, CYCLE);
        (handle, keys, Arc::new(Mutex::new(Vec::new())))
    }

    #[tokio::test]
    async fn exit_combo_stops_the_run_and_leaves_the_pad_neutral() {
        let (mut handle, keys, frames) = handle_with_recorder();
        let mut status = handle.subscribe();

        handle.start(
            Box::new(RecordingSinkConfig { frames: frames.clone() }),
            Box::new(NoopHook),
        );
        wait_for(&mut status, |s| *s == MapperStatus::Running).await;

        keys.record_down(PhysicalKey::Char('j'));
        tokio::time::sleep(CYCLE * 4).await;

        keys.record_down(PhysicalKey::Named("Escape".to_string()));
        keys.record_down(PhysicalKey::Named("Backspace".to_string()));
        wait_for(&mut status, |s| *s == MapperStatus::Stopped).await;

        let frames = frames.lock().unwrap();
        assert!(
            frames.iter().any(|f| f.buttons.contains(PadButton::A)),
            "held key never reached the pad"
        );
        assert!(
            frames.last().unwrap().is_neutral(),
            "run must end with a neutral flush"
        );
    }

    #[tokio::test]
    async fn external_stop_is_honored_and_the_run_can_restart() {
        let (mut handle, _keys, frames) = handle_with_recorder();
        let mut status = handle.subscribe();

        handle.start(
            Box::new(RecordingSinkConfig { frames: frames.clone() }),
            Box::new(NoopHook),
        );
        wait_for(&mut status, |s| *s == MapperStatus::Running).await;

        // A second start while live is ignored; a failing sink config would
        // otherwise flip the status to Error.
        handle.start(Box::new(FailingSinkConfig), Box::new(NoopHook));
        assert_eq!(handle.status(), MapperStatus::Running);

        handle.stop();
        wait_for(&mut status, |s| *s == MapperStatus::Stopped).await;
        assert!(frames.lock().unwrap().last().unwrap().is_neutral());

        // Terminal state reached, the handle accepts a new run.
        handle.start(
            Box::new(RecordingSinkConfig { frames: frames.clone() }),
            Box::new(NoopHook),
        );
        wait_for(&mut status, |s| *s == MapperStatus::Running).await;
        handle.stop();
        wait_for(&mut status, |s| *s == MapperStatus::Stopped).await;
    }

    #[tokio::test]
    async fn device_init_failure_reports_error_and_never_polls() {
        let keys = KeyState::new();
        let portal = Arc::new(ProfilePortal::new(test_profile()));
        let mut handle = MapperHandle::new(keys, portal, CYCLE);
        let mut status = handle.subscribe();

        handle.start(Box::new(FailingSinkConfig), Box::new(NoopHook));
        wait_for(&mut status, |s| matches!(s, MapperStatus::Error(_))).await;

        match handle.status() {
            MapperStatus::Error(detail) => assert!(detail.contains("virtual pad")),
            other => panic!("expected error status, got {other}"),
        }
    }

    #[tokio::test]
    async fn live_profile_edits_apply_within_a_cycle() {
        let keys = KeyState::new();
        let portal = Arc::new(ProfilePortal::new(test_profile()));
        let frames = Arc::new(Mutex::new(Vec::new()));
        let mut handle = MapperHandle::new(keys.clone(), portal.clone(), CYCLE);
        let mut status = handle.subscribe();

        handle.start(
            Box::new(RecordingSinkConfig { frames: frames.clone() }),
            Box::new(NoopHook),
        );
        wait_for(&mut status, |s| *s == MapperStatus::Running).await;

        keys.record_down(PhysicalKey::Char('j'));
        tokio::time::sleep(CYCLE * 4).await;
        assert!(frames
            .lock()
            .unwrap()
            .iter()
            .any(|f| f.buttons.contains(PadButton::A)));

        // Unbind A while the run is live; new frames stop pressing it.
        let mut edited = test_profile();
        edited.a.clear();
        portal.replace(edited).unwrap();
        tokio::time::sleep(CYCLE * 4).await;

        let count = frames.lock().unwrap().len();
        tokio::time::sleep(CYCLE * 4).await;
        let recent: Vec<_> = frames.lock().unwrap()[count..].to_vec();
        assert!(!recent.is_empty());
        assert!(recent.iter().all(|f| !f.buttons.contains(PadButton::A)));

        handle.stop();
        wait_for(&mut status, |s| *s == MapperStatus::Stopped).await;
    }
}
