use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::context::PortalContext;

use super::{SessionSignal, SessionStatus};

/// How often the session file is checked for writes from other processes
const SESSION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Keeps a [`SessionStatus`] current by re-resolving on every signal.
///
/// Each signal spawns an independent resolution. There is no cancellation
/// or sequencing: whichever answer arrives last is what subscribers see.
///
/// The session file is polled as well. When another process rewrites or
/// removes it, the new jar is adopted and `StorageChanged` goes out on the
/// bus.
pub struct SessionWatcher {
    status: watch::Receiver<SessionStatus>,
    task: JoinHandle<()>,
}

impl SessionWatcher {
    /// Start listening and run the initial (mount) resolution
    pub fn spawn(ctx: PortalContext) -> Self {
        let (tx, rx) = watch::channel(SessionStatus::GUEST);
        let tx = Arc::new(tx);
        let mut signals = ctx.bus.subscribe();

        spawn_resolution(&ctx, &tx, SessionSignal::Mount);

        let task = tokio::spawn(async move {
            let mut poll = tokio::time::interval(SESSION_POLL_INTERVAL);
            poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                let signal = tokio::select! {
                    received = signals.recv() => match received {
                        Ok(signal) => signal,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!("Session watcher skipped {} signal(s)", skipped);
                            SessionSignal::StorageChanged
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = poll.tick() => {
                        if ctx.sync_from_disk() {
                            tracing::info!("Session changed in another process");
                            // comes back around as a signal like any other
                            ctx.bus.publish(SessionSignal::StorageChanged);
                        }
                        continue;
                    }
                };
                if tx.is_closed() {
                    break;
                }
                spawn_resolution(&ctx, &tx, signal);
            }
            tracing::debug!("Session watcher stopped");
        });

        Self { status: rx, task }
    }

    /// Latest resolved status
    pub fn current(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Receiver notified whenever a resolution lands
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn spawn_resolution(
    ctx: &PortalContext,
    tx: &Arc<watch::Sender<SessionStatus>>,
    signal: SessionSignal,
) {
    let ctx = ctx.clone();
    let tx = Arc::clone(tx);
    tokio::spawn(async move {
        ctx.sync_from_disk();
        let status = ctx.resolver().resolve().await;
        tracing::debug!("Session resolved after {:?}: {:?}", signal, status);
        // Nobody left to show it to
        if tx.send(status).is_err() {
            tracing::trace!("Dropping session status, watcher is gone");
        }
    });
}
