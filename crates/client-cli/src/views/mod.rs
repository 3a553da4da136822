//! View controllers.
//!
//! Each view owns its local, provisional copy of backend data and exposes
//! two halves: free `async` commands that talk to the backend, and `apply_*`
//! methods that fold a command's result into the view. The terminal shell
//! runs the commands on spawned tasks; the command line simply awaits them.

pub mod account;
pub mod admin;
pub mod info;
pub mod login;
pub mod pricing;
pub mod signup;

use crate::nav::Route;

/// Where a view wants the user to go next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Client-side route change
    Route(Route),
    /// Hand-off to a page outside this client (hosted checkout, billing
    /// portal)
    External(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A one-line message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}
