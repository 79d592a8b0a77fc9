//! Session Authorization State
//!
//! What the session provider knows about the caller. The core only reads
//! this; login, logout and grant changes happen elsewhere.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Breadth of administrative authority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminScope {
    /// No administrative access
    #[default]
    None,
    /// Administrative access limited to explicit grants
    Scoped,
    /// Every administrative check passes
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationState {
    pub authenticated: bool,
    /// Application name → permission tokens held for it
    pub grants: HashMap<String, BTreeSet<String>>,
    pub scope: AdminScope,
}

impl AuthorizationState {
    /// Unauthenticated visitor
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated user without grants
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            ..Self::default()
        }
    }

    /// Authenticated user with every administrative right
    pub fn super_admin() -> Self {
        Self {
            authenticated: true,
            scope: AdminScope::All,
            ..Self::default()
        }
    }

    /// Add grants for `app`, switching a `None` scope to `Scoped`
    pub fn with_grants<I, S>(mut self, app: &str, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grants
            .entry(app.to_string())
            .or_default()
            .extend(permissions.into_iter().map(Into::into));
        if self.scope == AdminScope::None {
            self.scope = AdminScope::Scoped;
        }
        self
    }

    pub fn with_scope(mut self, scope: AdminScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn has_grant(&self, app: &str, permission: &str) -> bool {
        self.grants
            .get(app)
            .is_some_and(|granted| granted.contains(permission))
    }
}
