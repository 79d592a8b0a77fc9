//! Access Evaluation
//!
//! Decides whether a session may reach an application, or one of its actions,
//! by walking the action's requirement tokens in declaration order. The first
//! failing token decides the result.

use crate::common::{AppError, AppResult};
use crate::manifest::{Context, Manifest, ADMIN_PERMISSION};
use crate::session::{AdminScope, AuthorizationState};

/// Special requirement tokens
pub mod requirements {
    pub const CONNECTED: &str = "connected";
    pub const NOT_CONNECTED: &str = "not-connected";
    pub const ADMIN: &str = "admin";
}

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq)]
pub enum AccessDecision {
    Allow,
    Deny,
    Error(AppError),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }

    /// `Ok(true)` for allow, `Ok(false)` for deny, the note otherwise
    pub fn into_result(self) -> AppResult<bool> {
        match self {
            AccessDecision::Allow => Ok(true),
            AccessDecision::Deny => Ok(false),
            AccessDecision::Error(err) => Err(err),
        }
    }
}

/// Check access to `action` of `app`.
///
/// An empty `action` asks whether the caller may reach the application at all.
pub fn evaluate_access(
    manifest: &Manifest,
    app: &str,
    action: &str,
    context: Context,
    state: &AuthorizationState,
) -> AccessDecision {
    match context {
        Context::Admin => evaluate_admin(manifest, app, action, state),
        Context::Front => evaluate_front(manifest, app, action, state),
    }
}

fn evaluate_admin(
    manifest: &Manifest,
    app: &str,
    action: &str,
    state: &AuthorizationState,
) -> AccessDecision {
    if state.scope == AdminScope::None {
        return AccessDecision::Deny;
    }

    if action.is_empty() {
        return if state.scope == AdminScope::All || state.has_grant(app, ADMIN_PERMISSION) {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny
        };
    }

    // Undeclared actions are denied even for unrestricted sessions
    let Some(requires) = manifest.requirements(Context::Admin, action) else {
        return AccessDecision::Deny;
    };

    if state.scope == AdminScope::All {
        return AccessDecision::Allow;
    }

    if !state.has_grant(app, ADMIN_PERMISSION) {
        return AccessDecision::Deny;
    }

    for req in requires {
        match req.as_str() {
            requirements::CONNECTED | requirements::ADMIN => {}
            permission => {
                if !state.has_grant(app, permission) {
                    return AccessDecision::Error(AppError::insufficient_privilege(
                        action, app, permission,
                    ));
                }
            }
        }
    }

    AccessDecision::Allow
}

fn evaluate_front(
    manifest: &Manifest,
    app: &str,
    action: &str,
    state: &AuthorizationState,
) -> AccessDecision {
    if action.is_empty() {
        return AccessDecision::Allow;
    }

    let Some(requires) = manifest.requirements(Context::Front, action) else {
        return AccessDecision::Deny;
    };

    for req in requires {
        match req.as_str() {
            requirements::NOT_CONNECTED => {
                if state.authenticated {
                    return AccessDecision::Error(AppError::logout_required(action, app));
                }
            }
            requirements::CONNECTED => {
                if !state.authenticated {
                    return AccessDecision::Error(AppError::login_required(action, app));
                }
            }
            permission => {
                if !state.has_grant(app, permission) {
                    return AccessDecision::Error(AppError::insufficient_privilege(
                        action, app, permission,
                    ));
                }
            }
        }
    }

    AccessDecision::Allow
}
