//! Password and permission settings for a protected PDF export.
//!
//! Protection is a visible marker plus advisory permission flags in the
//! document info; the output is not encrypted. Callers should present it
//! to users as a label, not as access control.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum accepted length for either password, in characters.
pub const MIN_PASSWORD_LEN: usize = 4;

/// What a reader of the protected document is meant to be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permissions {
    pub printing: bool,
    pub modifying: bool,
    pub copying: bool,
    pub annotating: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            printing: true,
            modifying: false,
            copying: true,
            annotating: false,
        }
    }
}

/// Per-export protection request. Built fresh for each attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordConfig {
    pub enabled: bool,
    pub user_password: Option<String>,
    pub owner_password: Option<String>,
    pub permissions: Permissions,
}

impl PasswordConfig {
    pub fn protected(user: &str, owner: &str) -> Self {
        Self {
            enabled: true,
            user_password: Some(user.to_string()),
            owner_password: Some(owner.to_string()),
            permissions: Permissions::default(),
        }
    }
}

/// A violated password rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordViolation {
    UserTooShort,
    OwnerTooShort,
    Identical,
}

impl fmt::Display for PasswordViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordViolation::UserTooShort => write!(
                f,
                "User password must be at least {} characters long",
                MIN_PASSWORD_LEN
            ),
            PasswordViolation::OwnerTooShort => write!(
                f,
                "Owner password must be at least {} characters long",
                MIN_PASSWORD_LEN
            ),
            PasswordViolation::Identical => write!(f, "User and owner passwords must be different"),
        }
    }
}

fn long_enough(password: Option<&str>) -> bool {
    password.is_some_and(|p| p.chars().count() >= MIN_PASSWORD_LEN)
}

/// Check every rule and report all violations at once.
///
/// A disabled config always passes. A missing password counts as too short.
pub fn validate(config: &PasswordConfig) -> Result<(), Vec<PasswordViolation>> {
    if !config.enabled {
        return Ok(());
    }
    let user = config.user_password.as_deref();
    let owner = config.owner_password.as_deref();

    let mut violations = Vec::new();
    if !long_enough(user) {
        violations.push(PasswordViolation::UserTooShort);
    }
    if !long_enough(owner) {
        violations.push(PasswordViolation::OwnerTooShort);
    }
    if let (Some(u), Some(o)) = (user, owner) {
        if !u.is_empty() && u == o {
            violations.push(PasswordViolation::Identical);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
