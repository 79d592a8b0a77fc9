//! Handler Registry
//!
//! Applications register one handler per action at startup. The dispatcher
//! looks handlers up by application, context and action key.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::manifest::Context;

/// Implementation of one application action
pub trait ActionHandler: Send + Sync {
    /// Run the action with the tokens left after action resolution
    fn handle(&self, params: &[String]) -> Value;
}

impl<F> ActionHandler for F
where
    F: Fn(&[String]) -> Value + Send + Sync,
{
    fn handle(&self, params: &[String]) -> Value {
        self(params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HandlerKey {
    app: String,
    context: Context,
    action: String,
}

/// Registry of action handlers
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerKey, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `action`; a previous registration is replaced.
    pub fn register<H>(&mut self, app: &str, context: Context, action: &str, handler: H) -> &mut Self
    where
        H: ActionHandler + 'static,
    {
        debug!("Registering {} handler {}/{}", context.as_str(), app, action);
        self.handlers.insert(
            HandlerKey {
                app: app.to_string(),
                context,
                action: action.to_lowercase(),
            },
            Arc::new(handler),
        );
        self
    }

    pub fn lookup(&self, app: &str, context: Context, action: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers
            .get(&HandlerKey {
                app: app.to_string(),
                context,
                action: action.to_string(),
            })
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
