use crate::context::PortalContext;
use crate::error::PortalError;
use crate::nav::Route;
use crate::session::SessionSignal;
use crate::validation::{self, Field, FieldErrors};

use super::Navigation;

pub const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

/// Validated login input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Login form state
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub errors: FieldErrors,
    pub general_error: Option<String>,
    pub submitting: bool,
}

impl LoginForm {
    pub const FIELDS: [Field; 2] = [Field::Username, Field::Password];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Password => &self.password,
            _ => &self.username,
        }
    }

    /// Replace a field's value. Editing clears that field's error and the
    /// general error.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Password => self.password = value,
            _ => self.username = value,
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

    /// Record field errors; true when the form may be submitted
    pub fn validate(&mut self) -> bool {
        let mut errors = FieldErrors::new();
        if let Err(msg) = validation::check_username(&self.username) {
            errors.insert(Field::Username, msg);
        }
        if let Err(msg) = validation::check_password(&self.password) {
            errors.insert(Field::Password, msg);
        }
        self.errors = errors;
        self.errors.is_empty()
    }

    /// Validate and mark the form busy. `None` means nothing may be sent.
    pub fn begin_submit(&mut self) -> Option<Credentials> {
        if self.submitting || !self.validate() {
            return None;
        }
        self.submitting = true;
        self.general_error = None;
        Some(Credentials {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })
    }

    /// Fold the login result in. The password stays in the form on failure
    /// so the user sees why instead of an emptied field.
    pub fn apply_result(&mut self, result: Result<(), PortalError>) -> Option<Navigation> {
        self.submitting = false;
        match result {
            Ok(()) => Some(Navigation::Route(Route::Account)),
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                self.general_error = Some(e.user_message(LOGIN_FAILED));
                None
            }
        }
    }

    /// Validate, send, and apply in one go
    pub async fn submit(&mut self, ctx: &PortalContext) -> Option<Navigation> {
        let credentials = self.begin_submit()?;
        let result = login(ctx, &credentials).await;
        self.apply_result(result)
    }
}

/// Exchange credentials for a session cookie, persist it, and tell the rest
/// of the client a login just happened.
pub async fn login(ctx: &PortalContext, credentials: &Credentials) -> Result<(), PortalError> {
    ctx.client.login(&credentials.username, &credentials.password).await?;
    ctx.persist_session();
    ctx.bus.publish(SessionSignal::LoginSucceeded);
    tracing::info!("Logged in as {}", credentials.username);
    Ok(())
}
