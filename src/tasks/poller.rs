//! Background thread that re-evaluates the schedule every check interval.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::session::Session;
use crate::tasks::shutdown::Shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerPhase {
    Running,
    /// Shutdown was requested but the current tick has not returned yet.
    Stopping,
    Stopped,
}

pub struct PollerHandle {
    phase: Arc<Mutex<PollerPhase>>,
    shutdown: Shutdown,
    thread: JoinHandle<()>,
}

impl PollerHandle {
    pub fn phase(&self) -> PollerPhase {
        let phase = *self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if phase == PollerPhase::Running && self.shutdown.is_triggered() {
            PollerPhase::Stopping
        } else {
            phase
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn join(self) -> Result<()> {
        self.thread
            .join()
            .map_err(|_| anyhow!("poller thread panicked"))
    }
}

pub fn spawn(session: Arc<Session>) -> Result<PollerHandle> {
    let phase = Arc::new(Mutex::new(PollerPhase::Running));
    let shutdown = session.shutdown().clone();
    let thread = thread::Builder::new()
        .name("keep-awake-poller".to_string())
        .spawn({
            let phase = Arc::clone(&phase);
            move || run(&session, &phase)
        })
        .context("failed to spawn poller thread")?;
    Ok(PollerHandle {
        phase,
        shutdown,
        thread,
    })
}

/// Tick until shutdown. Each iteration evaluates, applies on change, checks
/// the tray icon, then waits for the next interval or an exit signal.
pub fn run(session: &Session, phase: &Mutex<PollerPhase>) {
    let interval = session.config().check_interval();
    let shutdown = session.shutdown();
    info!(interval_secs = interval.as_secs(), "KeepAwake service started");

    while !shutdown.is_triggered() {
        let outcome = session.tick();
        debug!(?outcome, "tick complete");

        session.ensure_tray();

        debug!(secs = interval.as_secs(), "sleeping until next tick");
        if shutdown.wait(interval) {
            break;
        }
    }

    info!("poller stopped");
    *phase.lock().unwrap_or_else(PoisonError::into_inner) = PollerPhase::Stopped;
}
