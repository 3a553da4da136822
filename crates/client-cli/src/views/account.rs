use chrono::{DateTime, NaiveDate};
use shared::{AccountInfo, AccountStatus};

use crate::context::PortalContext;
use crate::error::PortalError;
use crate::nav::Route;

use super::{Navigation, Notice};

pub const FETCH_FAILED: &str = "Failed to fetch account";

/// Account dashboard. Always fetched fresh on mount; there is no
/// signed-out state, a failed fetch sends the user to the login page.
#[derive(Debug, Clone, Default)]
pub struct AccountView {
    pub account: Option<AccountInfo>,
    pub loading: bool,
    pub notice: Option<Notice>,
}

impl AccountView {
    pub fn new() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn apply_fetch(&mut self, result: Result<AccountInfo, PortalError>) -> Option<Navigation> {
        self.loading = false;
        match result {
            Ok(account) => {
                self.account = Some(account);
                self.notice = None;
                None
            }
            Err(e) => {
                tracing::warn!("Account fetch failed: {}", e);
                self.account = None;
                self.notice = Some(Notice::error(FETCH_FAILED));
                Some(Navigation::Route(Route::Login))
            }
        }
    }

    /// Hand-off to the payment provider's billing portal, if the backend
    /// offered one
    pub fn billing_portal(&self) -> Option<Navigation> {
        self.account
            .as_ref()
            .and_then(|a| a.billing_portal_url.clone())
            .map(Navigation::External)
    }

    /// Forget the view-model before the logout round-trip finishes
    pub fn begin_sign_out(&mut self) {
        self.account = None;
        self.loading = false;
    }
}

pub fn status_note(status: &AccountStatus) -> Option<&'static str> {
    match status {
        AccountStatus::Pending => Some("Payment required to activate your subscription"),
        AccountStatus::Active => Some("Your subscription is active"),
        AccountStatus::Inactive => Some("Your subscription is inactive"),
        AccountStatus::Other(_) => None,
    }
}

/// Renewal date for display: a calendar date when the backend sent one we
/// can read, the raw value otherwise, `N/A` when absent.
pub fn renewal_display(expiry: Option<&str>) -> String {
    let Some(raw) = expiry.map(str::trim).filter(|s| !s.is_empty()) else {
        return "N/A".to_string();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.date().to_string();
    }
    if let Some(date) = raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()) {
        return date.to_string();
    }
    raw.to_string()
}

pub async fn fetch_account(ctx: &PortalContext) -> Result<AccountInfo, PortalError> {
    ctx.client.account().await
}

/// End the session. A failed logout call is only logged: the local cookie
/// jar is dropped either way, which is what signs this client out.
pub async fn sign_out(ctx: &PortalContext) -> Navigation {
    if let Err(e) = ctx.client.logout().await {
        tracing::warn!("Logout request failed: {}", e);
    }
    ctx.forget_session();
    tracing::info!("Signed out");
    Navigation::Route(Route::Login)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(status: AccountStatus) -> AccountInfo {
        AccountInfo {
            username: "alice".to_string(),
            status,
            plan_name: Some("Basic".to_string()),
            expiry_date: Some("2026-11-01T00:00:00".to_string()),
            billing_portal_url: Some("https://billing.example.com/p/1".to_string()),
        }
    }

    #[test]
    fn test_fetch_failure_redirects_to_login() {
        let mut view = AccountView::new();
        let nav = view.apply_fetch(Err(PortalError::Unauthorized(None)));
        assert_eq!(nav, Some(Navigation::Route(Route::Login)));
        assert_eq!(view.notice, Some(Notice::error(FETCH_FAILED)));
        assert!(!view.loading);
    }

    #[test]
    fn test_fetch_success_and_billing_handoff() {
        let mut view = AccountView::new();
        assert!(view.billing_portal().is_none());
        assert!(view.apply_fetch(Ok(account(AccountStatus::Active))).is_none());
        assert_eq!(
            view.billing_portal(),
            Some(Navigation::External("https://billing.example.com/p/1".to_string()))
        );

        view.begin_sign_out();
        assert!(view.account.is_none());
    }

    #[test]
    fn test_status_notes() {
        assert_eq!(
            status_note(&AccountStatus::Pending),
            Some("Payment required to activate your subscription")
        );
        assert!(status_note(&AccountStatus::Other("trial".to_string())).is_none());
    }

    #[test]
    fn test_renewal_display() {
        assert_eq!(renewal_display(None), "N/A");
        assert_eq!(renewal_display(Some("")), "N/A");
        assert_eq!(renewal_display(Some("2026-11-01T00:00:00")), "2026-11-01");
        assert_eq!(renewal_display(Some("2026-11-01T12:30:00.123456")), "2026-11-01");
        assert_eq!(renewal_display(Some("2026-11-01T12:30:00+02:00")), "2026-11-01");
        assert_eq!(renewal_display(Some("2026-11-01")), "2026-11-01");
        assert_eq!(renewal_display(Some("soon")), "soon");
    }
}
