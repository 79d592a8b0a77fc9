//! Action Router
//!
//! Resolves request tokens to manifest actions and dispatches them to
//! registered handlers after an access check.

pub mod dispatcher;
pub mod handlers;
pub mod resolver;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use handlers::{ActionHandler, HandlerRegistry};
pub use resolver::resolve_action;
