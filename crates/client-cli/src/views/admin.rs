//! Admin panel: user management, plan management, headline counters.
//!
//! The view keeps a provisional copy of the backend's lists. Mutations are
//! sent as commands and then folded in locally or followed by a refetch,
//! mirroring what the backend will report next.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use shared::{
    AdminStats, AdminUser, CreatePlanRequest, MessageResponse, Plan, PlanInterval,
    ToggleStatusResponse,
};

use crate::context::PortalContext;
use crate::error::PortalError;
use crate::validation::{Field, FieldErrors};

use super::Notice;

pub const CURRENCIES: [&str; 3] = ["usd", "eur", "gbp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    #[default]
    Users,
    Plans,
}

impl AdminTab {
    pub fn title(self) -> &'static str {
        match self {
            AdminTab::Users => "User Management",
            AdminTab::Plans => "Plan Management",
        }
    }
}

/// Whether the panel may be shown at all
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AdminAccess {
    #[default]
    Loading,
    Granted,
    Denied(String),
}

/// One load of the panel. Only the user list is mandatory.
#[derive(Debug, Clone, Default)]
pub struct AdminData {
    pub users: Vec<AdminUser>,
    pub stats: Option<AdminStats>,
    pub plans: Option<Vec<Plan>>,
}

/// A destructive action waiting for an explicit yes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    DeleteUser(String),
    ArchivePlan(String),
}

impl PendingAction {
    pub fn prompt(&self) -> String {
        match self {
            PendingAction::DeleteUser(username) => format!(
                "Are you sure you want to delete user \"{}\"? This action cannot be undone.",
                username
            ),
            PendingAction::ArchivePlan(_) => {
                "Are you sure you want to archive this plan? This will deactivate it.".to_string()
            }
        }
    }
}

/// Message for a failed panel load
pub fn denial_message(err: &PortalError) -> String {
    match err {
        PortalError::Unauthorized(_) => "Please log in to access the admin panel.".to_string(),
        PortalError::Forbidden(_) => "Admin access required. Please log in as an admin user.".to_string(),
        PortalError::Backend { status, .. } => format!("Failed to fetch users. Status: {}", status),
        _ => "Failed to load admin data. Please try again.".to_string(),
    }
}

fn mutation_error(err: &PortalError, fallback: &str) -> Notice {
    Notice::error(format!("Error: {}", err.user_message(fallback)))
}

#[derive(Debug, Clone, Default)]
pub struct AdminView {
    pub access: AdminAccess,
    pub tab: AdminTab,
    pub users: Vec<AdminUser>,
    pub stats: AdminStats,
    pub plans: Vec<Plan>,
    pub user_cursor: usize,
    pub plan_cursor: usize,
    pub loading: bool,
    pub notice: Option<Notice>,
    pub pending: Option<PendingAction>,
    /// Open plan editor, if any
    pub draft: Option<PlanDraft>,
}

impl AdminView {
    pub fn new() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn apply_data(&mut self, result: Result<AdminData, PortalError>) {
        self.loading = false;
        match result {
            Ok(data) => {
                self.access = AdminAccess::Granted;
                self.users = data.users;
                if let Some(stats) = data.stats {
                    self.stats = stats;
                }
                if let Some(plans) = data.plans {
                    self.plans = plans;
                }
                self.clamp_cursors();
            }
            Err(e) => {
                tracing::warn!("Admin data fetch failed: {}", e);
                let message = denial_message(&e);
                // A panel already on screen stays up through a transient failure
                let keep_panel = self.access == AdminAccess::Granted
                    && !matches!(e, PortalError::Unauthorized(_) | PortalError::Forbidden(_));
                if keep_panel {
                    self.notice = Some(Notice::error(message));
                } else {
                    self.access = AdminAccess::Denied(message);
                }
            }
        }
    }

    fn clamp_cursors(&mut self) {
        self.user_cursor = self.user_cursor.min(self.users.len().saturating_sub(1));
        self.plan_cursor = self.plan_cursor.min(self.plans.len().saturating_sub(1));
    }

    pub fn set_tab(&mut self, tab: AdminTab) {
        self.tab = tab;
        self.pending = None;
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let (cursor, len) = match self.tab {
            AdminTab::Users => (&mut self.user_cursor, self.users.len()),
            AdminTab::Plans => (&mut self.plan_cursor, self.plans.len()),
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = (*cursor as isize + delta).clamp(0, len as isize - 1) as usize;
    }

    pub fn selected_user(&self) -> Option<&AdminUser> {
        self.users.get(self.user_cursor)
    }

    /// Selected user if actions are allowed on it; admins are protected
    pub fn actionable_user(&self) -> Option<&AdminUser> {
        self.selected_user().filter(|u| !u.is_admin)
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        self.plans.get(self.plan_cursor)
    }

    pub fn request_delete_user(&mut self) {
        self.pending = self
            .actionable_user()
            .map(|u| PendingAction::DeleteUser(u.username.clone()));
    }

    pub fn request_archive_plan(&mut self) {
        self.pending = self
            .selected_plan()
            .map(|p| PendingAction::ArchivePlan(p.plan_id.clone()));
    }

    /// Resolve the pending confirmation. Only a yes hands the action back.
    pub fn confirm(&mut self, yes: bool) -> Option<PendingAction> {
        let pending = self.pending.take();
        if yes {
            pending
        } else {
            None
        }
    }

    /// Apply the backend's new `is_disabled` to that one user; no refetch
    pub fn apply_user_toggled(
        &mut self,
        username: &str,
        result: Result<ToggleStatusResponse, PortalError>,
    ) {
        match result {
            Ok(resp) => {
                if let Some(user) = self.users.iter_mut().find(|u| u.username == username) {
                    user.is_disabled = resp.is_disabled;
                }
                if let Some(message) = resp.message {
                    self.notice = Some(Notice::success(message));
                }
            }
            Err(e) => self.notice = Some(mutation_error(&e, "Failed to toggle user status")),
        }
    }

    /// Remove exactly that user locally. Returns true when a refetch
    /// should follow.
    pub fn apply_user_removed(&mut self, username: &str, result: Result<(), PortalError>) -> bool {
        match result {
            Ok(()) => {
                self.users.retain(|u| u.username != username);
                self.clamp_cursors();
                self.notice = Some(Notice::success(format!("User {} deleted", username)));
                true
            }
            Err(e) => {
                self.notice = Some(mutation_error(&e, "Failed to delete user"));
                false
            }
        }
    }

    /// Fold a plan mutation in. Returns true when a refetch should follow.
    pub fn apply_plan_change(
        &mut self,
        result: Result<MessageResponse, PortalError>,
        fallback: &str,
    ) -> bool {
        match result {
            Ok(resp) => {
                self.notice = (!resp.message.is_empty()).then(|| Notice::success(resp.message));
                true
            }
            Err(e) => {
                self.notice = Some(mutation_error(&e, fallback));
                false
            }
        }
    }

    /// Like `apply_plan_change`, also closing the editor on success
    pub fn apply_plan_created(&mut self, result: Result<MessageResponse, PortalError>) -> bool {
        let refresh = self.apply_plan_change(result, "Failed to create plan");
        if refresh {
            self.draft = None;
        }
        refresh
    }
}

/// Plan editor state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDraft {
    pub name: String,
    pub description: String,
    /// Major units as typed, e.g. `9.99`
    pub price: String,
    pub currency: String,
    pub interval: PlanInterval,
    pub errors: FieldErrors,
}

impl Default for PlanDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: String::new(),
            currency: CURRENCIES[0].to_string(),
            interval: PlanInterval::Month,
            errors: FieldErrors::new(),
        }
    }
}

impl PlanDraft {
    pub const FIELDS: [Field; 3] = [Field::Name, Field::Description, Field::Price];

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Description => &self.description,
            Field::Price => &self.price,
            _ => &self.name,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Description => self.description = value,
            Field::Price => self.price = value,
            _ => self.name = value,
        }
        self.errors.clear(field);
    }

    pub fn push_char(&mut self, field: Field, c: char) {
        let mut value = self.value(field).to_string();
        value.push(c);
        self.set(field, value);
    }

    pub fn pop_char(&mut self, field: Field) {
        let mut value = self.value(field).to_string();
        value.pop();
        self.set(field, value);
    }

    pub fn cycle_currency(&mut self) {
        let idx = CURRENCIES.iter().position(|c| *c == self.currency).unwrap_or(0);
        self.currency = CURRENCIES[(idx + 1) % CURRENCIES.len()].to_string();
    }

    pub fn cycle_interval(&mut self) {
        let selectable = PlanInterval::SELECTABLE;
        let idx = selectable.iter().position(|i| *i == self.interval).unwrap_or(0);
        self.interval = selectable[(idx + 1) % selectable.len()];
    }

    /// Build the request, recording field errors on failure
    pub fn to_request(&mut self) -> Result<CreatePlanRequest, PortalError> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.insert(Field::Name, "Plan name is required");
        }
        let price = match major_to_minor(&self.price) {
            Ok(price) => Some(price),
            Err(msg) => {
                errors.insert(Field::Price, msg);
                None
            }
        };
        let currency = self.currency.trim().to_ascii_lowercase();
        if !CURRENCIES.contains(&currency.as_str()) {
            errors.insert(Field::Currency, format!("Unsupported currency: {}", self.currency));
        }
        self.errors = errors.clone();

        match (errors.into_result(), price) {
            (Ok(()), Some(price)) => {
                let description = self.description.trim();
                Ok(CreatePlanRequest {
                    name: name.to_string(),
                    description: (!description.is_empty()).then(|| description.to_string()),
                    price,
                    currency,
                    interval: self.interval,
                })
            }
            (Err(errors), _) => Err(PortalError::Validation(errors)),
            (Ok(()), None) => Err(PortalError::Validation(self.errors.clone())),
        }
    }
}

/// Parse a major-unit amount (`"9.99"`, `"10"`, `"10.5"`) into minor units
/// without going through floating point.
pub fn major_to_minor(input: &str) -> Result<i64, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Price is required".to_string());
    }
    let invalid = || "Price must be a number with at most two decimal places".to_string();

    let (whole, frac) = match input.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (input, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !digits(whole) || !digits(frac) || frac.len() > 2 {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };
    let minor = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .ok_or_else(|| "Price is too large".to_string())?;
    if minor == 0 {
        return Err("Price must be greater than zero".to_string());
    }
    Ok(minor)
}

/// Last-activity column: `Never` when absent, the calendar date when it
/// parses, otherwise the raw value.
pub fn format_last_activity(value: Option<&str>) -> String {
    let raw = match value.map(str::trim) {
        None | Some("") | Some("Never") => return "Never".to_string(),
        Some(raw) => raw,
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.date().to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return dt.date().to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.to_string();
    }
    raw.to_string()
}

// ----------------------------------------------------------------------
// Commands
// ----------------------------------------------------------------------

/// Users first; a failure there denies the panel. Stats and plans are
/// optional and keep their previous values when they fail.
pub async fn fetch_admin_data(ctx: &PortalContext) -> Result<AdminData, PortalError> {
    let users = ctx.client.admin_users().await?;

    let stats = match ctx.client.admin_stats().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::debug!("Admin stats unavailable: {}", e);
            None
        }
    };
    let plans = match ctx.client.admin_plans().await {
        Ok(plans) => Some(plans),
        Err(e) => {
            tracing::debug!("Admin plans unavailable: {}", e);
            None
        }
    };

    Ok(AdminData { users, stats, plans })
}

pub async fn toggle_user(
    ctx: &PortalContext,
    username: &str,
) -> Result<ToggleStatusResponse, PortalError> {
    let resp = ctx.client.toggle_user_status(username).await?;
    let state = if resp.is_disabled { "disabled" } else { "enabled" };
    tracing::info!("User {} is now {}", username, state);
    Ok(resp)
}

pub async fn delete_user(ctx: &PortalContext, username: &str) -> Result<(), PortalError> {
    ctx.client.delete_user(username).await?;
    tracing::info!("Deleted user {}", username);
    Ok(())
}

pub async fn create_plan(
    ctx: &PortalContext,
    req: &CreatePlanRequest,
) -> Result<MessageResponse, PortalError> {
    let resp = ctx.client.create_plan(req).await?;
    tracing::info!("Created plan {}", req.name);
    Ok(resp)
}

/// Flip a plan's active flag: one PUT carrying the inverse of what the
/// view last saw.
pub async fn toggle_plan(
    ctx: &PortalContext,
    plan_id: &str,
    currently_active: bool,
) -> Result<MessageResponse, PortalError> {
    let resp = ctx.client.set_plan_active(plan_id, !currently_active).await?;
    tracing::info!("Plan {} active: {}", plan_id, !currently_active);
    Ok(resp)
}

pub async fn archive_plan(
    ctx: &PortalContext,
    plan_id: &str,
) -> Result<MessageResponse, PortalError> {
    let resp = ctx.client.archive_plan(plan_id).await?;
    tracing::info!("Archived plan {}", plan_id);
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::AccountStatus;

    fn user(name: &str, is_admin: bool) -> AdminUser {
        AdminUser {
            username: name.to_string(),
            is_admin,
            is_disabled: false,
            subscription_status: AccountStatus::Active,
            plan_name: None,
            email: None,
            created_via_management: false,
            last_activity: None,
        }
    }

    fn loaded(users: Vec<AdminUser>) -> AdminView {
        let mut view = AdminView::new();
        view.apply_data(Ok(AdminData {
            users,
            stats: None,
            plans: None,
        }));
        view
    }

    #[test]
    fn test_denial_messages() {
        let mut view = AdminView::new();
        view.apply_data(Err(PortalError::Unauthorized(None)));
        assert_eq!(
            view.access,
            AdminAccess::Denied("Please log in to access the admin panel.".to_string())
        );

        view.apply_data(Err(PortalError::Forbidden(Some("Admin access required".to_string()))));
        assert_eq!(
            view.access,
            AdminAccess::Denied("Admin access required. Please log in as an admin user.".to_string())
        );

        view.apply_data(Err(PortalError::Backend { status: 500, message: None }));
        assert_eq!(view.access, AdminAccess::Denied("Failed to fetch users. Status: 500".to_string()));
    }

    #[test]
    fn test_transient_failure_keeps_panel() {
        let mut view = loaded(vec![user("alice", false)]);
        view.apply_data(Err(PortalError::Decode("eof".to_string())));
        assert_eq!(view.access, AdminAccess::Granted);
        assert_eq!(view.users.len(), 1);
        assert_eq!(
            view.notice,
            Some(Notice::error("Failed to load admin data. Please try again."))
        );
    }

    #[test]
    fn test_optional_parts_keep_previous_values() {
        let mut view = AdminView::new();
        view.apply_data(Ok(AdminData {
            users: vec![user("alice", false)],
            stats: Some(AdminStats {
                total_emby_users: 7,
                ..Default::default()
            }),
            plans: Some(Vec::new()),
        }));
        view.apply_data(Ok(AdminData {
            users: vec![user("alice", false)],
            stats: None,
            plans: None,
        }));
        assert_eq!(view.stats.total_emby_users, 7);
    }

    #[test]
    fn test_delete_removes_exactly_that_user() {
        let mut view = loaded(vec![user("alice", false), user("bob", false), user("carol", false)]);
        view.user_cursor = 2;
        assert!(view.apply_user_removed("bob", Ok(())));
        let names: Vec<&str> = view.users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "carol"]);
        assert_eq!(view.user_cursor, 1);

        assert!(!view.apply_user_removed("alice", Err(PortalError::Backend { status: 404, message: None })));
        assert_eq!(view.users.len(), 2);
        assert_eq!(view.notice, Some(Notice::error("Error: Failed to delete user")));
    }

    #[test]
    fn test_toggle_applies_returned_flag() {
        let mut view = loaded(vec![user("alice", false), user("bob", false)]);
        view.apply_user_toggled(
            "bob",
            Ok(ToggleStatusResponse {
                is_disabled: true,
                message: Some("User bob disabled".to_string()),
            }),
        );
        assert!(!view.users[0].is_disabled);
        assert!(view.users[1].is_disabled);
    }

    #[test]
    fn test_admins_are_protected() {
        let mut view = loaded(vec![user("root", true), user("bob", false)]);
        assert!(view.actionable_user().is_none());
        view.request_delete_user();
        assert!(view.pending.is_none());

        view.move_cursor(1);
        view.request_delete_user();
        assert_eq!(view.pending, Some(PendingAction::DeleteUser("bob".to_string())));
    }

    #[test]
    fn test_confirmation_required() {
        let mut view = loaded(vec![user("bob", false)]);
        view.request_delete_user();
        assert!(view.pending.as_ref().unwrap().prompt().contains("\"bob\""));
        assert!(view.confirm(false).is_none());
        assert!(view.pending.is_none());

        view.request_delete_user();
        assert_eq!(view.confirm(true), Some(PendingAction::DeleteUser("bob".to_string())));
    }

    #[test]
    fn test_major_to_minor() {
        assert_eq!(major_to_minor("9.99"), Ok(999));
        assert_eq!(major_to_minor("10"), Ok(1000));
        assert_eq!(major_to_minor("10.5"), Ok(1050));
        assert_eq!(major_to_minor(" 0.07 "), Ok(7));
        assert_eq!(major_to_minor(".5"), Ok(50));
        assert_eq!(major_to_minor("19.90"), Ok(1990));

        assert!(major_to_minor("").unwrap_err().contains("required"));
        assert!(major_to_minor("0").unwrap_err().contains("greater than zero"));
        for bad in ["abc", "1.234", "-5", "1,50", "1.2.3", ".", "1e3"] {
            assert!(major_to_minor(bad).is_err(), "{} should be rejected", bad);
        }
        assert!(major_to_minor("99999999999999999").unwrap_err().contains("too large"));
    }

    #[test]
    fn test_plan_draft_request() {
        let mut draft = PlanDraft::default();
        assert!(matches!(draft.to_request(), Err(PortalError::Validation(_))));
        assert!(draft.errors.contains(Field::Name));
        assert!(draft.errors.contains(Field::Price));

        draft.set(Field::Name, " Premium ");
        draft.set(Field::Price, "14.99");
        draft.cycle_currency();
        draft.cycle_interval();
        let req = draft.to_request().unwrap();
        assert_eq!(req.name, "Premium");
        assert_eq!(req.price, 1499);
        assert_eq!(req.currency, "eur");
        assert_eq!(req.interval, PlanInterval::Year);
        assert!(req.description.is_none());
    }

    #[test]
    fn test_unsupported_currency_is_a_currency_error() {
        let mut draft = PlanDraft::default();
        draft.set(Field::Name, "Premium");
        draft.set(Field::Price, "14.99");
        draft.currency = "jpy".to_string();

        assert!(draft.to_request().is_err());
        assert_eq!(draft.errors.get(Field::Currency), Some("Unsupported currency: jpy"));
        assert!(!draft.errors.contains(Field::Plan));
        assert_eq!(draft.errors.len(), 1);
    }

    #[test]
    fn test_format_last_activity() {
        assert_eq!(format_last_activity(None), "Never");
        assert_eq!(format_last_activity(Some("Never")), "Never");
        assert_eq!(format_last_activity(Some("2026-03-04T05:06:07.0000000Z")), "2026-03-04");
        assert_eq!(format_last_activity(Some("2026-03-04T05:06:07")), "2026-03-04");
        assert_eq!(format_last_activity(Some("2026-03-04")), "2026-03-04");
        assert_eq!(format_last_activity(Some("yesterday")), "yesterday");
    }

    #[test]
    fn test_plan_change_notice() {
        let mut view = loaded(Vec::new());
        view.draft = Some(PlanDraft::default());
        assert!(view.apply_plan_created(Ok(MessageResponse {
            message: "Plan created".to_string()
        })));
        assert!(view.draft.is_none());
        assert_eq!(view.notice, Some(Notice::success("Plan created")));

        assert!(!view.apply_plan_change(
            Err(PortalError::Backend {
                status: 400,
                message: Some("Stripe error".to_string())
            }),
            "Failed to update plan"
        ));
        assert_eq!(view.notice, Some(Notice::error("Error: Stripe error")));
    }
}
