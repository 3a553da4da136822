use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::api::PortalClient;
use crate::session::{SessionBus, SessionFile, SessionResolver, SessionSignal};

/// What every view needs: the credentialed client, the on-disk cookie jar
/// and the session broadcast.
#[derive(Clone)]
pub struct PortalContext {
    pub client: PortalClient,
    pub bus: SessionBus,
    session_file: Option<SessionFile>,
    /// Modification time of the session file when this process last read or
    /// wrote it
    synced_at: Arc<Mutex<Option<SystemTime>>>,
}

impl PortalContext {
    pub fn new(client: PortalClient, session_file: Option<SessionFile>) -> Self {
        Self {
            client,
            bus: SessionBus::new(),
            session_file,
            synced_at: Arc::new(Mutex::new(None)),
        }
    }

    pub fn resolver(&self) -> SessionResolver {
        SessionResolver::new(self.client.clone())
    }

    fn file_mtime(&self) -> Option<SystemTime> {
        let file = self.session_file.as_ref()?;
        std::fs::metadata(file.path()).and_then(|m| m.modified()).ok()
    }

    fn set_synced(&self, at: Option<SystemTime>) {
        *self.synced_at.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    /// Adopt the persisted cookies if the file changed since we last saw it
    /// (another process logged in or out). Returns whether anything changed.
    pub fn sync_from_disk(&self) -> bool {
        let Some(file) = &self.session_file else {
            return false;
        };
        let mtime = self.file_mtime();
        let mut synced = self.synced_at.lock().unwrap_or_else(|e| e.into_inner());
        if *synced == mtime {
            return false;
        }
        let cookies = file.load(self.client.base_url().as_str());
        tracing::debug!("Session file changed, adopting {} cookie(s)", cookies.len());
        self.client.replace_session_cookies(&cookies);
        *synced = mtime;
        true
    }

    /// Write the current jar to disk
    pub fn persist_session(&self) {
        let Some(file) = &self.session_file else {
            return;
        };
        let cookies = self.client.session_cookies();
        if let Err(e) = file.save(self.client.base_url().as_str(), &cookies) {
            tracing::warn!("Failed to persist session: {}", e);
            return;
        }
        self.set_synced(self.file_mtime());
    }

    /// Drop the session locally and tell everyone to re-check
    pub fn forget_session(&self) {
        self.client.clear_session_cookies();
        if let Some(file) = &self.session_file {
            if let Err(e) = file.clear() {
                tracing::warn!("Failed to remove session file: {}", e);
            }
        }
        self.set_synced(None);
        self.bus.publish(SessionSignal::StorageChanged);
    }
}
