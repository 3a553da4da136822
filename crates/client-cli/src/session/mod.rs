//! Session status resolution.
//!
//! Nothing here remembers whether the visitor is signed in. Status is
//! re-derived from the backend every time a [`SessionSignal`] is published:
//! the session cookie is valid if the token check succeeds, and the visitor
//! is an admin if an admin-only resource can be fetched.

mod resolver;
mod store;
mod watcher;

pub use resolver::SessionResolver;
pub use store::SessionFile;
pub use watcher::SessionWatcher;

use tokio::sync::broadcast;

/// Derived visitor status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub is_admin: bool,
}

impl SessionStatus {
    pub const GUEST: SessionStatus = SessionStatus {
        authenticated: false,
        is_admin: false,
    };
}

/// "Re-check the session" broadcast. Carries no payload on purpose:
/// receivers must ask the backend rather than trust the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// A view showing session-dependent chrome was mounted
    Mount,
    /// The terminal regained focus
    FocusGained,
    /// The persisted cookie jar changed (sign-out, or another process)
    StorageChanged,
    /// A login just succeeded in this process
    LoginSucceeded,
}

const BUS_CAPACITY: usize = 32;

/// Fan-out channel for [`SessionSignal`]s
#[derive(Clone)]
pub struct SessionBus {
    tx: broadcast::Sender<SessionSignal>,
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, signal: SessionSignal) {
        // No subscribers just means nobody is showing session state
        if self.tx.send(signal).is_err() {
            tracing::trace!("Session signal {:?} had no listeners", signal);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bus_fans_out_to_every_subscriber() {
        let bus = SessionBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(SessionSignal::LoginSucceeded);

        assert_eq!(a.recv().await.unwrap(), SessionSignal::LoginSucceeded);
        assert_eq!(b.recv().await.unwrap(), SessionSignal::LoginSucceeded);
    }

    #[test]
    fn test_publish_without_listeners_is_harmless() {
        let bus = SessionBus::new();
        bus.publish(SessionSignal::FocusGained);
        assert_eq!(SessionStatus::default(), SessionStatus::GUEST);
    }
}
