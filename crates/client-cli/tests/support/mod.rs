//! In-process stand-in for the portal backend.
//!
//! Every request is recorded so tests can assert on what was (or was not)
//! sent. A single fallback handler dispatches on method and path, which
//! keeps the recording in one place.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};

use emby_portal::session::SessionFile;
use emby_portal::{PortalClient, PortalContext};

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret1";
pub const SESSION_COOKIE: &str = "access_token=abc";
pub const CHECKOUT_URL: &str = "https://checkout.example.com/c/pay_123";

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

/// How GET /admin/stats answers a signed-in visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsMode {
    Object,
    Forbidden,
    NotObject,
}

/// How POST /signup answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupMode {
    Checkout,
    Ready,
    ErrorField,
    Conflict,
}

struct Backend {
    requests: Vec<Recorded>,
    stats: StatsMode,
    signup: SignupMode,
    users: Vec<Value>,
    plans: Vec<Value>,
}

type Shared = Arc<Mutex<Backend>>;

pub struct FakeBackend {
    pub url: String,
    state: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Backend {
            requests: Vec::new(),
            stats: StatsMode::Object,
            signup: SignupMode::Checkout,
            users: vec![
                json!({"username": "admin", "is_admin": true, "subscription_status": "active",
                       "last_activity": "Never"}),
                json!({"username": "bob", "is_disabled": false, "subscription_status": "active",
                       "plan_name": "Premium", "email": "bob@example.com", "created_via_management": true,
                       "last_activity": "2024-05-01T10:30:00Z"}),
                json!({"username": "carol", "subscription_status": "pending"}),
            ],
            plans: vec![
                plan("price_basic_m", "Basic", 999, "month", true),
                plan("price_premium_m", "Premium", 1499, "month", true),
                plan("price_premium_y", "Premium Yearly", 14999, "year", true),
                plan("price_old", "Legacy", 499, "month", false),
            ],
        }));

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn set_stats_mode(&self, mode: StatsMode) {
        self.state.lock().unwrap().stats = mode;
    }

    pub fn set_signup_mode(&self, mode: SignupMode) {
        self.state.lock().unwrap().signup = mode;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }

    pub fn client(&self) -> PortalClient {
        PortalClient::new(&self.url, Duration::from_secs(5)).unwrap()
    }

    /// Context with an optional on-disk session
    pub fn context(&self, session_path: Option<&Path>) -> PortalContext {
        PortalContext::new(self.client(), session_path.map(SessionFile::new))
    }

    /// Context that already holds a valid session cookie
    pub fn signed_in_context(&self) -> PortalContext {
        let ctx = self.context(None);
        ctx.client.replace_session_cookies(&[SESSION_COOKIE.to_string()]);
        ctx
    }
}

fn plan(id: &str, name: &str, price: i64, interval: &str, active: bool) -> Value {
    json!({
        "plan_id": id,
        "name": name,
        "description": null,
        "price": price,
        "currency": "usd",
        "interval": interval,
        "is_active": active,
        "created": 1_700_000_000,
    })
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.split("; ").any(|pair| pair == SESSION_COOKIE))
}

async fn handle(State(state): State<Shared>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path = uri.path().to_string();
    let body = String::from_utf8_lossy(&body).to_string();

    let mut backend = state.lock().unwrap();
    backend.requests.push(Recorded {
        method: method.clone(),
        path: path.clone(),
        body: body.clone(),
    });

    let signed_in = has_session(&headers);
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        (Method::POST, ["login"]) => {
            let expected = format!("username={}&password={}", USERNAME, PASSWORD);
            if body == expected {
                (
                    [(header::SET_COOKIE, format!("{}; Path=/; HttpOnly", SESSION_COOKIE))],
                    Json(json!({ "message": "Login successful" })),
                )
                    .into_response()
            } else {
                detail(StatusCode::UNAUTHORIZED, "Invalid credentials")
            }
        }
        (Method::POST, ["logout"]) => Json(json!({ "message": "Logged out" })).into_response(),
        (Method::GET, ["debug-token"]) if signed_in => Json(json!({ "valid": true })).into_response(),
        (Method::GET, ["debug-token"]) => detail(StatusCode::UNAUTHORIZED, "Not authenticated"),

        (Method::POST, ["signup"]) => match backend.signup {
            SignupMode::Checkout => Json(json!({
                "checkout_url": CHECKOUT_URL,
                "temporary_password": "tmp-pass-42",
            }))
            .into_response(),
            SignupMode::Ready => Json(json!({ "message": "Account created" })).into_response(),
            SignupMode::ErrorField => Json(json!({ "error": "Username already exists" })).into_response(),
            SignupMode::Conflict => detail(StatusCode::CONFLICT, "Email already registered"),
        },
        (Method::GET, ["subscription-plans"]) => {
            let active: Vec<Value> = backend
                .plans
                .iter()
                .filter(|p| p["is_active"] == json!(true))
                .cloned()
                .collect();
            Json(Value::Array(active)).into_response()
        }
        (Method::GET, ["account"]) if signed_in => Json(json!({
            "username": USERNAME,
            "status": "active",
            "plan_name": "Premium",
            "expiry_date": "2025-01-31",
            "billing_portal_url": "https://billing.example.com/session/1",
        }))
        .into_response(),
        (Method::GET, ["account"]) => detail(StatusCode::UNAUTHORIZED, "Not authenticated"),

        (_, ["admin", ..]) if !signed_in => detail(StatusCode::UNAUTHORIZED, "Not authenticated"),
        (_, ["admin", ..]) if backend.stats == StatsMode::Forbidden => {
            detail(StatusCode::FORBIDDEN, "Admin access required")
        }
        (Method::GET, ["admin", "stats"]) => match backend.stats {
            StatsMode::NotObject => Json(json!(["not", "stats"])).into_response(),
            _ => Json(json!({
                "total_emby_users": backend.users.len(),
                "active_subscriptions": 2,
                "pending_subscriptions": 1,
                "created_via_management": 1,
            }))
            .into_response(),
        },
        (Method::GET, ["admin", "users"]) => Json(json!({ "users": backend.users })).into_response(),
        (Method::POST, ["admin", "users", username, "toggle-status"]) => {
            let username = username.to_string();
            match backend.users.iter_mut().find(|u| u["username"] == json!(username)) {
                Some(user) => {
                    let disabled = !user["is_disabled"].as_bool().unwrap_or(false);
                    user["is_disabled"] = json!(disabled);
                    Json(json!({ "is_disabled": disabled, "message": format!("User {} updated", username) }))
                        .into_response()
                }
                None => detail(StatusCode::NOT_FOUND, "User not found"),
            }
        }
        (Method::DELETE, ["admin", "users", username]) => {
            let username = username.to_string();
            let before = backend.users.len();
            backend.users.retain(|u| u["username"] != json!(username));
            if backend.users.len() < before {
                Json(json!({ "message": "User deleted" })).into_response()
            } else {
                detail(StatusCode::NOT_FOUND, "User not found")
            }
        }
        (Method::GET, ["admin", "plans"]) => Json(json!({ "plans": backend.plans })).into_response(),
        (Method::POST, ["admin", "plans"]) => {
            let req: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let id = format!("price_new_{}", backend.plans.len());
            let mut created = plan(
                &id,
                req["name"].as_str().unwrap_or_default(),
                req["price"].as_i64().unwrap_or_default(),
                req["interval"].as_str().unwrap_or("month"),
                true,
            );
            created["currency"] = req["currency"].clone();
            backend.plans.push(created);
            Json(json!({ "message": "Plan created" })).into_response()
        }
        (Method::PUT, ["admin", "plans", plan_id]) => {
            let plan_id = plan_id.to_string();
            let req: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            match backend.plans.iter_mut().find(|p| p["plan_id"] == json!(plan_id)) {
                Some(plan) => {
                    plan["is_active"] = req["is_active"].clone();
                    Json(json!({ "message": "Plan updated" })).into_response()
                }
                None => detail(StatusCode::NOT_FOUND, "Plan not found"),
            }
        }
        (Method::DELETE, ["admin", "plans", plan_id]) => {
            let plan_id = plan_id.to_string();
            match backend.plans.iter_mut().find(|p| p["plan_id"] == json!(plan_id)) {
                Some(plan) => {
                    plan["is_active"] = json!(false);
                    Json(json!({ "message": "Plan archived" })).into_response()
                }
                None => detail(StatusCode::NOT_FOUND, "Plan not found"),
            }
        }
        _ => detail(StatusCode::NOT_FOUND, "Not Found"),
    }
}
