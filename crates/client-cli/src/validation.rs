//! Client-side form checks.
//!
//! These only spare the user a round trip; the backend stays authoritative
//! and its own validation messages are always surfaced as-is.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PASSWORD_MIN_LEN: usize = 6;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("static username pattern"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"));

/// Form field an error message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Username,
    Email,
    Password,
    Plan,
    Name,
    Description,
    Price,
    Currency,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Email => "email",
            Field::Password => "password",
            Field::Plan => "plan",
            Field::Name => "name",
            Field::Description => "description",
            Field::Price => "price",
            Field::Currency => "currency",
        }
    }
}

/// Field-scoped validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.values().map(String::as_str).collect();
        f.write_str(&joined.join("; "))
    }
}

/// Checks a username (already trimmed by the caller or not, both work)
pub fn check_username(username: &str) -> Result<(), String> {
    let username = username.trim();
    let len = username.chars().count();
    if username.is_empty() {
        Err("Username is required".to_string())
    } else if len < USERNAME_MIN_LEN {
        Err(format!("Username must be at least {} characters long", USERNAME_MIN_LEN))
    } else if len > USERNAME_MAX_LEN {
        Err(format!("Username must be {} characters or fewer", USERNAME_MAX_LEN))
    } else if !USERNAME_RE.is_match(username) {
        Err("Username can only contain letters, numbers, underscores, and hyphens".to_string())
    } else {
        Ok(())
    }
}

pub fn check_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        Err("Email is required".to_string())
    } else if email.chars().count() > EMAIL_MAX_LEN {
        Err(format!("Email must be {} characters or fewer", EMAIL_MAX_LEN))
    } else if !EMAIL_RE.is_match(email) {
        Err("Please enter a valid email address".to_string())
    } else {
        Ok(())
    }
}

/// Passwords are not trimmed
pub fn check_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        Err("Password is required".to_string())
    } else if password.chars().count() < PASSWORD_MIN_LEN {
        Err(format!("Password must be at least {} characters long", PASSWORD_MIN_LEN))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(check_username("alice").is_ok());
        assert!(check_username("  a_b-9  ").is_ok());
        assert!(check_username(&"x".repeat(50)).is_ok());

        assert_eq!(check_username("").unwrap_err(), "Username is required");
        assert_eq!(check_username("   ").unwrap_err(), "Username is required");
        assert!(check_username("ab").unwrap_err().contains("at least 3"));
        assert!(check_username(&"x".repeat(51)).unwrap_err().contains("50"));
        for bad in ["bad name", "bob!", "ali.ce", "émile", "a@b"] {
            assert!(
                check_username(bad).unwrap_err().contains("letters, numbers"),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_email_rules() {
        assert!(check_email("alice@example.com").is_ok());
        assert!(check_email(" a@b.co ").is_ok());

        assert_eq!(check_email("").unwrap_err(), "Email is required");
        for bad in ["alice", "alice@", "alice@example", "@example.com", "al ice@example.com", "a@b@c.d"] {
            assert!(check_email(bad).is_err(), "{} should be rejected", bad);
        }

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(check_email(&long).unwrap_err().contains("254"));
    }

    #[test]
    fn test_password_rules() {
        assert!(check_password("secret").is_ok());
        assert_eq!(check_password("").unwrap_err(), "Password is required");
        assert!(check_password("12345").unwrap_err().contains("at least 6"));
        // whitespace counts
        assert!(check_password("      ").is_ok());
    }

    #[test]
    fn test_field_errors() {
        let mut errors = FieldErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.insert(Field::Email, "Email is required");
        errors.insert(Field::Username, "Username is required");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(Field::Email), Some("Email is required"));
        // ordered by field
        assert_eq!(errors.to_string(), "Username is required; Email is required");

        errors.clear(Field::Email);
        assert!(!errors.contains(Field::Email));
        assert!(errors.into_result().is_err());
    }
}
