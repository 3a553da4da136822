//! Terminal client for the Emby subscription portal.
//!
//! The backend owns every piece of business state. This crate wraps its
//! HTTP API with a cookie-carrying client, derives the session status by
//! probing protected endpoints, and drives the portal's views either from
//! the command line or from a full-screen navigation shell.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod nav;
pub mod session;
pub mod tui;
pub mod validation;
pub mod views;

pub use api::PortalClient;
pub use context::PortalContext;
pub use error::PortalError;
pub use session::{SessionSignal, SessionStatus};
