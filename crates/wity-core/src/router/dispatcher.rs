//! Action Dispatcher
//!
//! Main entry point for request routing: resolve the action, check access,
//! then invoke the registered handler.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::handlers::HandlerRegistry;
use super::resolver::resolve_action;
use crate::access::{evaluate_access, AccessDecision};
use crate::common::AppError;
use crate::manifest::{Context, Manifest, ManifestCache};
use crate::session::AuthorizationState;

/// Result of dispatching a request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Handler ran and produced a model
    Completed { action: String, output: Value },
    /// Action is declared and allowed but no handler implements it
    Inert { action: String },
    /// Caller may not run the action
    Denied { app: String, action: String },
    /// Structured failure to show to the caller
    Failed(AppError),
}

impl DispatchOutcome {
    /// User-facing note for denied or failed outcomes
    pub fn note(&self) -> Option<AppError> {
        match self {
            DispatchOutcome::Denied { app, .. } => Some(AppError::no_access(app)),
            DispatchOutcome::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }
}

/// The action dispatcher
pub struct Dispatcher {
    cache: Arc<ManifestCache>,
    handlers: Arc<HandlerRegistry>,
}

impl Dispatcher {
    pub fn new(cache: Arc<ManifestCache>, handlers: Arc<HandlerRegistry>) -> Self {
        Self { cache, handlers }
    }

    pub fn cache(&self) -> &Arc<ManifestCache> {
        &self.cache
    }

    /// Load the manifest of `app` and dispatch `tokens` against it.
    ///
    /// An application whose manifest cannot be loaded denies every action.
    pub fn route(
        &self,
        app: &str,
        context: Context,
        tokens: &mut Vec<String>,
        state: &AuthorizationState,
    ) -> DispatchOutcome {
        match self.cache.load(app) {
            Ok(manifest) => self.dispatch(&manifest, app, context, tokens, state),
            Err(e) => {
                warn!("Manifest unavailable for {}: {}", app, e);
                DispatchOutcome::Denied {
                    app: app.to_string(),
                    action: tokens.first().cloned().unwrap_or_default(),
                }
            }
        }
    }

    /// Dispatch `tokens` against an already loaded manifest
    pub fn dispatch(
        &self,
        manifest: &Manifest,
        app: &str,
        context: Context,
        tokens: &mut Vec<String>,
        state: &AuthorizationState,
    ) -> DispatchOutcome {
        let action = resolve_action(manifest, context, tokens);
        if action.is_empty() {
            debug!("No suitable {} action in {}", context.as_str(), app);
            return DispatchOutcome::Failed(AppError::no_suitable_action(app));
        }

        match evaluate_access(manifest, app, &action, context, state) {
            AccessDecision::Allow => {}
            AccessDecision::Deny => {
                debug!("Access denied to {}/{}", app, action);
                return DispatchOutcome::Denied {
                    app: app.to_string(),
                    action,
                };
            }
            AccessDecision::Error(err) => {
                debug!("Access check failed for {}/{}: {}", app, action, err);
                return DispatchOutcome::Failed(err);
            }
        }

        match self.handlers.lookup(app, context, &action) {
            Some(handler) => {
                debug!("Dispatching {}/{} with {} params", app, action, tokens.len());
                let output = handler.handle(tokens);
                DispatchOutcome::Completed { action, output }
            }
            None => {
                debug!("No handler registered for {}/{}", app, action);
                DispatchOutcome::Inert { action }
            }
        }
    }

    /// Check access to an application, or one of its actions, by name.
    ///
    /// An application whose manifest cannot be loaded is denied.
    pub fn has_access(
        &self,
        app: &str,
        action: &str,
        context: Context,
        state: &AuthorizationState,
    ) -> AccessDecision {
        match self.cache.load(app) {
            Ok(manifest) => evaluate_access(&manifest, app, action, context, state),
            Err(e) => {
                debug!("Manifest unavailable for {}: {}", app, e);
                AccessDecision::Deny
            }
        }
    }
}
