//! Route gating for the back-office.
//!
//! This only decides what the client shows. Row-level policies on the
//! backend are what actually keep a customer out of the admin tables.

use crate::model::{CurrentUser, ProfileKind, Role, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Nobody is signed in
    RedirectToLogin,
    /// Signed in without any of the allowed roles
    RedirectHome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePolicy {
    /// Empty means any signed-in user
    allowed_roles: Vec<Role>,
}

impl RoutePolicy {
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn with_roles(roles: &[Role]) -> Self {
        Self {
            allowed_roles: roles.to_vec(),
        }
    }

    /// Admins and managers
    pub fn back_office() -> Self {
        Self::with_roles(&[Role::Admin, Role::Manager])
    }

    pub fn evaluate(&self, viewer: Option<&CurrentUser>) -> AccessDecision {
        let Some(viewer) = viewer else {
            return AccessDecision::RedirectToLogin;
        };
        if self.allowed_roles.is_empty()
            || self.allowed_roles.iter().any(|role| viewer.has_role(*role))
        {
            AccessDecision::Allow
        } else {
            AccessDecision::RedirectHome
        }
    }
}

/// The customer directory keys off the profile kind on the viewer's own
/// `usuarios` row rather than on `user_roles`.
pub fn customer_directory(profile: Option<&UserProfile>) -> AccessDecision {
    match profile {
        None => AccessDecision::RedirectToLogin,
        Some(profile) if profile.kind == ProfileKind::Admin => AccessDecision::Allow,
        Some(_) => AccessDecision::RedirectHome,
    }
}
