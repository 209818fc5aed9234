//! Mode and applied power state, and every operation that changes them.
//!
//! The poller thread and the tray thread share one [`Session`]. A single mutex
//! guards the state for the whole evaluate-apply-store sequence, so a tick and
//! a menu action never interleave their OS calls.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use config_model::KeepAwakeConfig;
use tracing::{debug, error, info};

use crate::platform::lock::LockProbe;
use crate::platform::power::PowerApplier;
use crate::schedule::{self, Clock};
use crate::status::{AppliedState, Mode, PowerState, TrayStatus};
use crate::tasks::shutdown::Shutdown;

/// Tray surface as seen from the session. Called with the state lock held, so
/// implementations must not block; the real one only posts events to the UI
/// thread.
pub trait TrayHandle: Send + Sync {
    /// Redraw glyph and title.
    fn show(&self, status: &TrayStatus);
    /// False once the icon has been lost, e.g. after a shell restart.
    fn is_alive(&self) -> bool;
    /// Tear down whatever is left of the icon and build a new one.
    fn recreate(&self, status: &TrayStatus);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub mode: Mode,
    pub applied: AppliedState,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            mode: Mode::Active,
            applied: AppliedState::Unset,
        }
    }
}

/// What a single poll tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Desired state already applied; no OS call made.
    Unchanged(PowerState),
    Applied(PowerState),
    /// The OS call failed; the applied state was kept.
    Failed(PowerState),
}

pub struct Session {
    config: KeepAwakeConfig,
    power: Arc<dyn PowerApplier>,
    lock: Arc<dyn LockProbe>,
    clock: Arc<dyn Clock>,
    tray: Arc<dyn TrayHandle>,
    shutdown: Shutdown,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(
        config: KeepAwakeConfig,
        power: Arc<dyn PowerApplier>,
        lock: Arc<dyn LockProbe>,
        clock: Arc<dyn Clock>,
        tray: Arc<dyn TrayHandle>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            config,
            power,
            lock,
            clock,
            tray,
            shutdown,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn config(&self) -> &KeepAwakeConfig {
        &self.config
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn state(&self) -> SessionState {
        *self.lock_state()
    }

    pub fn status(&self) -> TrayStatus {
        let state = self.lock_state();
        TrayStatus::new(state.mode, state.applied)
    }

    /// Evaluate the schedule and apply the result if it differs from what the
    /// OS was last told.
    pub fn tick(&self) -> TickOutcome {
        let mut state = self.lock_state();
        let desired = self.desired(state.mode);

        if state.applied.matches(desired) {
            debug!(
                mode = ?state.mode,
                state = desired.label(),
                "no state change"
            );
            return TickOutcome::Unchanged(desired);
        }

        let report = self.power.apply(desired);
        if !report.success {
            error!(
                desired = desired.label(),
                applied = ?state.applied,
                "no state change, power command was unsuccessful"
            );
            return TickOutcome::Failed(desired);
        }

        state.applied = desired.into();
        let status = self.publish(&state);
        info!(title = status.title, "schedule applied power state");
        TickOutcome::Applied(desired)
    }

    /// Rebuild the tray icon if it disappeared. Returns whether a rebuild was
    /// requested.
    pub fn ensure_tray(&self) -> bool {
        let state = self.lock_state();
        if self.tray.is_alive() {
            return false;
        }
        let status = TrayStatus::new(state.mode, state.applied);
        info!(title = status.title, "tray icon lost; restoring");
        self.tray.recreate(&status);
        true
    }

    /// Resume following the schedule and apply its current verdict.
    pub fn start(&self) -> TrayStatus {
        let mut state = self.lock_state();
        state.mode = Mode::Active;
        let desired = self.desired(Mode::Active);
        self.apply_now(&mut state, desired);
        info!("KeepAwake activated");
        self.publish(&state)
    }

    /// Keep the machine awake regardless of the schedule. Only honoured while
    /// the schedule is being followed.
    pub fn force(&self) -> TrayStatus {
        let mut state = self.lock_state();
        if state.mode != Mode::Active {
            info!(mode = ?state.mode, "force ignored outside active mode");
            return TrayStatus::new(state.mode, state.applied);
        }
        state.mode = Mode::Forced;
        self.apply_now(&mut state, PowerState::Awake);
        info!("KeepAwake force activated");
        self.publish(&state)
    }

    /// Stop intervening and restore normal standby.
    pub fn stop(&self) -> TrayStatus {
        let mut state = self.lock_state();
        state.mode = Mode::Stopped;
        self.apply_now(&mut state, PowerState::Normal);
        info!("KeepAwake deactivated");
        self.publish(&state)
    }

    /// Ask the poller to stop. The OS power setting is left as it is.
    pub fn exit(&self) -> TrayStatus {
        let state = self.lock_state();
        self.shutdown.trigger();
        let status = self.publish(&state);
        info!(title = status.title, "exiting KeepAwake");
        status
    }

    /// Push the status for `state` to the tray. Callers hold the state lock,
    /// so the tray sees updates in the order the state changed.
    fn publish(&self, state: &SessionState) -> TrayStatus {
        let status = TrayStatus::new(state.mode, state.applied);
        self.tray.show(&status);
        status
    }

    /// User actions always issue their OS call, even when the state looks
    /// current.
    fn apply_now(&self, state: &mut SessionState, desired: PowerState) {
        let report = self.power.apply(desired);
        if report.success {
            state.applied = desired.into();
        } else {
            error!(
                desired = desired.label(),
                applied = ?state.applied,
                "power command failed; keeping previous state"
            );
        }
    }

    fn desired(&self, mode: Mode) -> PowerState {
        let locked = self.config.lock_aware() && self.lock.is_locked();
        if locked {
            info!("workstation locked; allowing normal standby");
        }
        schedule::evaluate(
            self.clock.now(),
            self.config.work_hours(),
            mode,
            locked,
            self.config.lock_priority,
        )
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
