//! Manifest Types
//!
//! Normalized, strongly-typed form of an application descriptor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Prefix separating admin aliases from front aliases
pub const ADMIN_ALIAS_PREFIX: &str = "admin-";

/// Permission implied by the presence of admin actions
pub const ADMIN_PERMISSION: &str = "admin";

/// Surface an action is requested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    Front,
    Admin,
}

impl Context {
    pub fn as_str(&self) -> &'static str {
        match self {
            Context::Front => "front",
            Context::Admin => "admin",
        }
    }

    /// Key under which an alias for this context is stored
    pub fn alias_key(&self, alias: &str) -> String {
        match self {
            Context::Front => alias.to_string(),
            Context::Admin => format!("{}{}", ADMIN_ALIAS_PREFIX, alias),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub description: String,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminActionSpec {
    pub description: String,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default = "default_show_in_menu")]
    pub show_in_menu: bool,
}

fn default_show_in_menu() -> bool {
    true
}

/// Application manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub default_lang: String,
    #[serde(default)]
    pub front_actions: BTreeMap<String, ActionSpec>,
    #[serde(default)]
    pub admin_actions: BTreeMap<String, AdminActionSpec>,
    /// Alias → action key; admin entries carry [`ADMIN_ALIAS_PREFIX`]
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub default_front_action: Option<String>,
    #[serde(default)]
    pub default_admin_action: Option<String>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Modification time of the descriptor this value was built from
    #[serde(default)]
    pub source_version: Option<DateTime<Utc>>,
}

impl Manifest {
    /// Stamp the descriptor modification time this manifest was built from
    pub fn with_source_version(mut self, modified_at: DateTime<Utc>) -> Self {
        self.source_version = Some(modified_at);
        self
    }

    /// Whether `key` is a declared action in the given context
    pub fn has_action(&self, context: Context, key: &str) -> bool {
        match context {
            Context::Front => self.front_actions.contains_key(key),
            Context::Admin => self.admin_actions.contains_key(key),
        }
    }

    /// Requirement tokens of a declared action
    pub fn requirements(&self, context: Context, key: &str) -> Option<&[String]> {
        match context {
            Context::Front => self.front_actions.get(key).map(|a| a.requires.as_slice()),
            Context::Admin => self.admin_actions.get(key).map(|a| a.requires.as_slice()),
        }
    }

    /// Target of an alias declared for the given context
    pub fn alias_target(&self, context: Context, alias: &str) -> Option<&str> {
        // Prefixed keys are admin aliases and never match from the front
        if context == Context::Front && alias.starts_with(ADMIN_ALIAS_PREFIX) {
            return None;
        }
        self.aliases
            .get(&context.alias_key(alias))
            .map(String::as_str)
    }

    /// Default action of the given context
    pub fn default_action(&self, context: Context) -> Option<&str> {
        match context {
            Context::Front => self.default_front_action.as_deref(),
            Context::Admin => self.default_admin_action.as_deref(),
        }
    }

    /// Admin actions listed in the administration menu
    pub fn admin_menu(&self) -> impl Iterator<Item = (&str, &AdminActionSpec)> {
        self.admin_actions
            .iter()
            .filter(|(_, spec)| spec.show_in_menu)
            .map(|(key, spec)| (key.as_str(), spec))
    }
}
