use crate::api::PortalClient;

use super::SessionStatus;

/// Asks the backend who the current visitor is.
///
/// Both checks swallow every failure: a transport error, a 401, a 403 or a
/// body of the wrong shape all read as "no".
#[derive(Clone)]
pub struct SessionResolver {
    client: PortalClient,
}

impl SessionResolver {
    pub fn new(client: PortalClient) -> Self {
        Self { client }
    }

    /// True only when GET /debug-token answers 2xx
    pub async fn resolve_authenticated(&self) -> bool {
        match self.client.get_raw(&["debug-token"]).await {
            Ok(resp) => {
                tracing::debug!("Token check answered {}", resp.status);
                resp.status.is_success()
            }
            Err(e) => {
                tracing::debug!("Token check failed: {}", e);
                false
            }
        }
    }

    /// True only when GET /admin/stats answers 2xx with a JSON object.
    /// Being able to read an admin resource is what "admin" means here.
    pub async fn resolve_admin(&self) -> bool {
        match self.client.get_raw(&["admin", "stats"]).await {
            Ok(resp) if resp.status.is_success() => {
                let is_object = serde_json::from_slice::<serde_json::Value>(&resp.body)
                    .map(|body| body.is_object())
                    .unwrap_or(false);
                if !is_object {
                    tracing::debug!("Admin check succeeded but body is not an object");
                }
                is_object
            }
            Ok(resp) => {
                tracing::debug!("Admin check answered {}", resp.status);
                false
            }
            Err(e) => {
                tracing::debug!("Admin check failed: {}", e);
                false
            }
        }
    }

    /// Full sequence; the admin check only runs for an authenticated visitor
    pub async fn resolve(&self) -> SessionStatus {
        if !self.resolve_authenticated().await {
            return SessionStatus::GUEST;
        }
        SessionStatus {
            authenticated: true,
            is_admin: self.resolve_admin().await,
        }
    }
}
