use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Subscription plans
// ============================================================================

/// Billing cadence of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanInterval {
    Month,
    Week,
    Year,
    /// Any cadence the backend adds later
    #[serde(other)]
    Unknown,
}

impl PlanInterval {
    pub const SELECTABLE: [PlanInterval; 3] = [PlanInterval::Month, PlanInterval::Year, PlanInterval::Week];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanInterval::Month => "month",
            PlanInterval::Week => "week",
            PlanInterval::Year => "year",
            PlanInterval::Unknown => "unknown",
        }
    }

    /// Label used by the plan editor
    pub fn label(&self) -> &'static str {
        match self {
            PlanInterval::Month => "Monthly",
            PlanInterval::Week => "Weekly",
            PlanInterval::Year => "Yearly",
            PlanInterval::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PlanInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" | "monthly" => Ok(PlanInterval::Month),
            "week" | "weekly" => Ok(PlanInterval::Week),
            "year" | "yearly" => Ok(PlanInterval::Year),
            other => Err(format!("Unknown interval: {}. Valid intervals: month, year, week", other)),
        }
    }
}

/// A subscription plan as published by the backend catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in minor currency units (cents)
    pub price: i64,
    pub currency: String,
    pub interval: PlanInterval,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Creation time in epoch seconds
    #[serde(default)]
    pub created: i64,
}

impl Plan {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0)
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Accounts
// ============================================================================

/// Subscription state reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountStatus {
    Active,
    Pending,
    Inactive,
    /// Anything else, kept verbatim ("none", "canceled", ...)
    Other(String),
}

impl AccountStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Pending => "pending",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Other(s) => s,
        }
    }
}

impl From<String> for AccountStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "active" => AccountStatus::Active,
            "pending" => AccountStatus::Pending,
            "inactive" => AccountStatus::Inactive,
            _ => AccountStatus::Other(s),
        }
    }
}

impl From<AccountStatus> for String {
    fn from(status: AccountStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current user's subscription, from GET /account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub username: String,
    pub status: AccountStatus,
    #[serde(default)]
    pub plan_name: Option<String>,
    /// Renewal date, usually `YYYY-MM-DD`
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub billing_portal_url: Option<String>,
}

/// Body of POST /signup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
}

/// Response of POST /signup.
///
/// The backend answers either with a hosted checkout URL (payment still
/// required), a plain success, or a 200 carrying an `error` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub temporary_password: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Admin
// ============================================================================

/// A user row in the admin panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default = "default_subscription_status")]
    pub subscription_status: AccountStatus,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_via_management: bool,
    /// ISO timestamp, the literal "Never", or absent
    #[serde(default)]
    pub last_activity: Option<String>,
}

fn default_subscription_status() -> AccountStatus {
    AccountStatus::Other("none".to_string())
}

/// Counters from GET /admin/stats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_emby_users: u64,
    #[serde(default)]
    pub active_subscriptions: u64,
    #[serde(default)]
    pub pending_subscriptions: u64,
    #[serde(default)]
    pub created_via_management: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersEnvelope {
    #[serde(default)]
    pub users: Vec<AdminUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlansEnvelope {
    #[serde(default)]
    pub plans: Vec<Plan>,
}

/// Body of POST /admin/plans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePlanRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Minor currency units
    pub price: i64,
    pub currency: String,
    pub interval: PlanInterval,
}

/// Body of PUT /admin/plans/{id}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePlanRequest {
    pub is_active: bool,
}

/// Generic `{ message }` acknowledgement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Response of POST /admin/users/{username}/toggle-status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleStatusResponse {
    pub is_disabled: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Errors
// ============================================================================

/// Error payloads the backend emits. FastAPI uses `detail` (a string, or a
/// list of validation entries); hand-written handlers use `error`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message in the body, if any
    pub fn into_message(self) -> Option<String> {
        if let Some(detail) = self.detail {
            match detail {
                serde_json::Value::String(s) if !s.is_empty() => return Some(s),
                serde_json::Value::Array(items) => {
                    let msgs: Vec<String> = items
                        .iter()
                        .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                        .map(str::to_string)
                        .collect();
                    if !msgs.is_empty() {
                        return Some(msgs.join("; "));
                    }
                }
                serde_json::Value::Null => {}
                other => return Some(other.to_string()),
            }
        }
        self.error
            .filter(|e| !e.is_empty())
            .or(self.message.filter(|m| !m.is_empty()))
    }
}
