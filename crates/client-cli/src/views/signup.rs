use shared::{Plan, PlanInterval, SignupRequest, SignupResponse};

use crate::context::PortalContext;
use crate::error::PortalError;
use crate::nav::Route;
use crate::validation::{self, Field, FieldErrors};

use super::Navigation;

pub const SIGNUP_FAILED: &str = "Signup failed. Please try again.";

/// Signup form state
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    /// Active plans offered for selection
    pub plans: Vec<Plan>,
    pub selected: Option<usize>,
    pub errors: FieldErrors,
    pub general_error: Option<String>,
    pub submitting: bool,
    /// Shown once when the backend hands one out with the checkout link
    pub temporary_password: Option<String>,
}

fn interval_rank(interval: PlanInterval) -> u8 {
    match interval {
        PlanInterval::Month => 0,
        PlanInterval::Year => 1,
        PlanInterval::Week => 2,
        PlanInterval::Unknown => 3,
    }
}

impl SignupForm {
    pub const FIELDS: [Field; 3] = [Field::Username, Field::Email, Field::Plan];

    pub fn new() -> Self {
        Self::default()
    }

    /// Offer the active plans from `catalog`. `preferred` (a plan id handed
    /// over from the pricing view) wins, then the plan already selected;
    /// otherwise the cheapest monthly plan is preselected.
    pub fn set_plans(&mut self, catalog: Vec<Plan>, preferred: Option<&str>) {
        let previous = self.selected_plan().map(|p| p.plan_id.clone());
        let mut plans: Vec<Plan> = catalog.into_iter().filter(|p| p.is_active).collect();
        plans.sort_by_key(|p| (interval_rank(p.interval), p.price));
        self.plans = plans;

        let position = |id: &str| self.plans.iter().position(|p| p.plan_id == id);
        self.selected = preferred
            .and_then(position)
            .or_else(|| previous.as_deref().and_then(position))
            .or(if self.plans.is_empty() { None } else { Some(0) });
        self.errors.clear(Field::Plan);
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        self.selected.and_then(|i| self.plans.get(i))
    }

    pub fn select_next_plan(&mut self) {
        if self.plans.is_empty() {
            return;
        }
        self.selected = Some(self.selected.map_or(0, |i| (i + 1) % self.plans.len()));
        self.errors.clear(Field::Plan);
    }

    pub fn select_prev_plan(&mut self) {
        if self.plans.is_empty() {
            return;
        }
        let len = self.plans.len();
        self.selected = Some(self.selected.map_or(0, |i| (i + len - 1) % len));
        self.errors.clear(Field::Plan);
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            _ => &self.username,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Email => self.email = value,
            Field::Username => self.username = value,
            _ => return,
        }
        self.errors.clear(field);
        self.general_error = None;
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

    pub fn validate(&mut self) -> bool {
        let mut errors = FieldErrors::new();
        if let Err(msg) = validation::check_username(&self.username) {
            errors.insert(Field::Username, msg);
        }
        if let Err(msg) = validation::check_email(&self.email) {
            errors.insert(Field::Email, msg);
        }
        if !self.plans.is_empty() && self.selected_plan().is_none() {
            errors.insert(Field::Plan, "Please select a plan");
        }
        self.errors = errors;
        self.errors.is_empty()
    }

    /// Validate and mark busy. `None` means nothing may be sent.
    pub fn begin_submit(&mut self) -> Option<SignupRequest> {
        if self.submitting || !self.validate() {
            return None;
        }
        self.submitting = true;
        self.general_error = None;
        self.temporary_password = None;
        Some(SignupRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            plan_id: self.selected_plan().map(|p| p.plan_id.clone()),
        })
    }

    /// Branch on what the backend answered: a checkout link means payment
    /// is still due, a bare success means the account is ready.
    pub fn apply_result(
        &mut self,
        result: Result<SignupResponse, PortalError>,
    ) -> Option<Navigation> {
        self.submitting = false;
        match result {
            Ok(SignupResponse {
                checkout_url: Some(url),
                temporary_password,
                ..
            }) => {
                tracing::info!("Signup created, redirecting to checkout");
                self.temporary_password = temporary_password;
                Some(Navigation::External(url))
            }
            Ok(SignupResponse { error: Some(error), .. }) => {
                tracing::warn!("Signup rejected: {}", error);
                self.general_error = Some(error);
                None
            }
            Ok(_) => Some(Navigation::Route(Route::Account)),
            Err(e) => {
                tracing::warn!("Signup failed: {}", e);
                self.general_error = Some(e.user_message(SIGNUP_FAILED));
                None
            }
        }
    }

    pub async fn submit(&mut self, ctx: &PortalContext) -> Option<Navigation> {
        let req = self.begin_submit()?;
        let result = ctx.client.signup(&req).await;
        self.apply_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(id: &str, interval: PlanInterval, price: i64, active: bool) -> Plan {
        Plan {
            plan_id: id.to_string(),
            name: id.to_string(),
            description: None,
            price,
            currency: "usd".to_string(),
            interval,
            is_active: active,
            created: 0,
        }
    }

    fn catalog() -> Vec<Plan> {
        vec![
            plan("yearly", PlanInterval::Year, 9000, true),
            plan("premium", PlanInterval::Month, 1500, true),
            plan("basic", PlanInterval::Month, 1000, true),
            plan("retired", PlanInterval::Month, 500, false),
        ]
    }

    fn filled() -> SignupForm {
        let mut form = SignupForm::new();
        form.set(Field::Username, "alice");
        form.set(Field::Email, "alice@example.com");
        form
    }

    #[test]
    fn test_default_plan_is_cheapest_monthly() {
        let mut form = SignupForm::new();
        form.set_plans(catalog(), None);
        assert_eq!(form.plans.len(), 3);
        assert_eq!(form.selected_plan().unwrap().plan_id, "basic");
    }

    #[test]
    fn test_preferred_plan_is_preselected() {
        let mut form = SignupForm::new();
        form.set_plans(catalog(), Some("yearly"));
        assert_eq!(form.selected_plan().unwrap().plan_id, "yearly");

        // an inactive or unknown plan keeps the current choice
        form.set_plans(catalog(), Some("retired"));
        assert_eq!(form.selected_plan().unwrap().plan_id, "yearly");
        // and with nothing chosen yet, the default
        let mut fresh = SignupForm::new();
        fresh.set_plans(catalog(), Some("nope"));
        assert_eq!(fresh.selected_plan().unwrap().plan_id, "basic");
    }

    #[test]
    fn test_plan_cycling_wraps() {
        let mut form = SignupForm::new();
        form.set_plans(catalog(), None);
        form.select_prev_plan();
        assert_eq!(form.selected_plan().unwrap().plan_id, "yearly");
        form.select_next_plan();
        assert_eq!(form.selected_plan().unwrap().plan_id, "basic");
    }

    #[test]
    fn test_invalid_fields_block_submit() {
        let mut form = SignupForm::new();
        form.set(Field::Username, "no spaces allowed");
        form.set(Field::Email, "not-an-email");
        assert!(form.begin_submit().is_none());
        assert!(form.errors.contains(Field::Username));
        assert!(form.errors.contains(Field::Email));
        assert!(!form.submitting);
    }

    #[test]
    fn test_request_carries_selected_plan() {
        let mut form = filled();
        form.set_plans(catalog(), Some("premium"));
        let req = form.begin_submit().unwrap();
        assert_eq!(req.username, "alice");
        assert_eq!(req.plan_id.as_deref(), Some("premium"));
    }

    #[test]
    fn test_empty_catalog_still_submits() {
        let mut form = filled();
        form.set_plans(Vec::new(), None);
        let req = form.begin_submit().unwrap();
        assert!(req.plan_id.is_none());
    }

    #[test]
    fn test_checkout_url_redirects_externally() {
        let mut form = filled();
        form.begin_submit().unwrap();
        let nav = form.apply_result(Ok(SignupResponse {
            checkout_url: Some("https://checkout.example.com/s/1".to_string()),
            temporary_password: Some("tmp-pass".to_string()),
            ..Default::default()
        }));
        assert_eq!(nav, Some(Navigation::External("https://checkout.example.com/s/1".to_string())));
        assert_eq!(form.temporary_password.as_deref(), Some("tmp-pass"));
    }

    #[test]
    fn test_plain_success_goes_to_account() {
        let mut form = filled();
        let nav = form.apply_result(Ok(SignupResponse::default()));
        assert_eq!(nav, Some(Navigation::Route(Route::Account)));
    }

    #[test]
    fn test_backend_error_is_shown_verbatim() {
        let mut form = filled();
        let nav = form.apply_result(Ok(SignupResponse {
            error: Some("Failed to create Emby user".to_string()),
            ..Default::default()
        }));
        assert!(nav.is_none());
        assert_eq!(form.general_error.as_deref(), Some("Failed to create Emby user"));

        let nav = form.apply_result(Err(PortalError::Backend {
            status: 409,
            message: Some("Username already exists".to_string()),
        }));
        assert!(nav.is_none());
        assert_eq!(form.general_error.as_deref(), Some("Username already exists"));

        form.apply_result(Err(PortalError::Decode("eof".to_string())));
        assert_eq!(form.general_error.as_deref(), Some(SIGNUP_FAILED));
    }
}
