//! Credentialed HTTP client for the portal backend.
//!
//! Every request carries the session cookie the backend issued at login.
//! The client keeps no other notion of who is signed in.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use shared::{
    AccountInfo, AdminStats, AdminUser, CreatePlanRequest, ErrorBody, MessageResponse, Plan,
    PlansEnvelope, SignupRequest, SignupResponse, ToggleStatusResponse, UpdatePlanRequest,
    UsersEnvelope,
};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::PortalError;

/// Cookie jar that can be swapped wholesale, so a session persisted by
/// another process can replace what this one holds.
#[derive(Default)]
struct SessionJar {
    inner: RwLock<Jar>,
}

impl SessionJar {
    fn replace(&self, jar: Jar) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = jar;
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.cookies(url)
    }
}

/// Status and body of a GET, unchecked
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// HTTP client for the portal API
#[derive(Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    base_url: Url,
    jar: Arc<SessionJar>,
}

impl PortalClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PortalError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| PortalError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(PortalError::InvalidUrl(base_url.to_string()));
        }

        let jar = Arc::new(SessionJar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(timeout)
            .build()?;

        Ok(Self { http, base_url, jar })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Session cookies currently held for the backend, as `name=value` pairs
    pub fn session_cookies(&self) -> Vec<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
            .map(|header| {
                header
                    .split("; ")
                    .filter(|pair| !pair.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop every cookie and adopt `cookies` instead
    pub fn replace_session_cookies(&self, cookies: &[String]) {
        let jar = Jar::default();
        for cookie in cookies {
            jar.add_cookie_str(cookie, &self.base_url);
        }
        self.jar.replace(jar);
    }

    pub fn clear_session_cookies(&self) {
        self.jar.replace(Jar::default());
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, PortalError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| PortalError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// GET without interpreting the answer; used by the session checks
    pub async fn get_raw(&self, segments: &[&str]) -> Result<RawResponse, PortalError> {
        let url = self.endpoint(segments)?;
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// POST /login (form-encoded). The session cookie lands in the jar.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<MessageResponse, PortalError> {
        let resp = self
            .http
            .post(self.endpoint(&["login"])?)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let resp = check(resp).await?;
        Ok(json_or_default(resp).await)
    }

    pub async fn logout(&self) -> Result<(), PortalError> {
        let resp = self.http.post(self.endpoint(&["logout"])?).send().await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn signup(&self, req: &SignupRequest) -> Result<SignupResponse, PortalError> {
        let resp = self.http.post(self.endpoint(&["signup"])?).json(req).send().await?;
        let resp = check(resp).await?;
        json(resp).await
    }

    /// GET /account. A 200 carrying `error` (unknown user) is a failure too.
    pub async fn account(&self) -> Result<AccountInfo, PortalError> {
        let resp = self.http.get(self.endpoint(&["account"])?).send().await?;
        let resp = check(resp).await?;
        let status = resp.status();
        let value: serde_json::Value = json(resp).await?;
        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return Err(PortalError::Backend {
                status: status.as_u16(),
                message: Some(error.to_string()),
            });
        }
        serde_json::from_value(value).map_err(|e| PortalError::Decode(e.to_string()))
    }

    /// Public plan catalog
    pub async fn subscription_plans(&self) -> Result<Vec<Plan>, PortalError> {
        let resp = self.http.get(self.endpoint(&["subscription-plans"])?).send().await?;
        let resp = check(resp).await?;
        json(resp).await
    }

    // ------------------------------------------------------------------
    // Admin
    // ------------------------------------------------------------------

    pub async fn admin_users(&self) -> Result<Vec<AdminUser>, PortalError> {
        let resp = self.http.get(self.endpoint(&["admin", "users"])?).send().await?;
        let resp = check(resp).await?;
        let envelope: UsersEnvelope = json(resp).await?;
        Ok(envelope.users)
    }

    pub async fn admin_stats(&self) -> Result<AdminStats, PortalError> {
        let resp = self.http.get(self.endpoint(&["admin", "stats"])?).send().await?;
        let resp = check(resp).await?;
        json(resp).await
    }

    pub async fn admin_plans(&self) -> Result<Vec<Plan>, PortalError> {
        let resp = self.http.get(self.endpoint(&["admin", "plans"])?).send().await?;
        let resp = check(resp).await?;
        let envelope: PlansEnvelope = json(resp).await?;
        Ok(envelope.plans)
    }

    pub async fn create_plan(
        &self,
        req: &CreatePlanRequest,
    ) -> Result<MessageResponse, PortalError> {
        let resp = self
            .http
            .post(self.endpoint(&["admin", "plans"])?)
            .json(req)
            .send()
            .await?;
        let resp = check(resp).await?;
        Ok(json_or_default(resp).await)
    }

    pub async fn set_plan_active(
        &self,
        plan_id: &str,
        is_active: bool,
    ) -> Result<MessageResponse, PortalError> {
        let resp = self
            .http
            .put(self.endpoint(&["admin", "plans", plan_id])?)
            .json(&UpdatePlanRequest { is_active })
            .send()
            .await?;
        let resp = check(resp).await?;
        Ok(json_or_default(resp).await)
    }

    /// Soft delete; the backend keeps the plan but deactivates it
    pub async fn archive_plan(&self, plan_id: &str) -> Result<MessageResponse, PortalError> {
        let resp = self
            .http
            .delete(self.endpoint(&["admin", "plans", plan_id])?)
            .send()
            .await?;
        let resp = check(resp).await?;
        Ok(json_or_default(resp).await)
    }

    pub async fn toggle_user_status(
        &self,
        username: &str,
    ) -> Result<ToggleStatusResponse, PortalError> {
        let resp = self
            .http
            .post(self.endpoint(&["admin", "users", username, "toggle-status"])?)
            .send()
            .await?;
        let resp = check(resp).await?;
        json(resp).await
    }

    pub async fn delete_user(&self, username: &str) -> Result<(), PortalError> {
        let resp = self
            .http
            .delete(self.endpoint(&["admin", "users", username])?)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

/// Turn a non-success response into the matching error
async fn check(resp: Response) -> Result<Response, PortalError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message);
    tracing::debug!("Backend answered {}: {:?}", status, message);
    Err(PortalError::from_status(status, message))
}

async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, PortalError> {
    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| PortalError::Decode(e.to_string()))
}

/// Acknowledgements are informational; an empty or odd body is not an error
async fn json_or_default<T: DeserializeOwned + Default>(resp: Response) -> T {
    match resp.bytes().await {
        Ok(body) => serde_json::from_slice(&body).unwrap_or_default(),
        Err(e) => {
            tracing::debug!("Failed to read acknowledgement body: {}", e);
            T::default()
        }
    }
}
