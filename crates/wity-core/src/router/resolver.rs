//! Action Resolver
//!
//! Maps the leading request token onto a declared action key.

use crate::manifest::{Context, Manifest};

/// Determine the action to run for `tokens`.
///
/// When the first token names an action (directly, through an alias, or once
/// hyphens are read as underscores) it is removed from `tokens`. Otherwise
/// `tokens` is left untouched and the context's default action, if any, is
/// returned. An empty string means nothing matched.
pub fn resolve_action(manifest: &Manifest, context: Context, tokens: &mut Vec<String>) -> String {
    let candidate = tokens
        .first()
        .map(|token| match_token(manifest, context, token))
        .unwrap_or_default();

    if !candidate.is_empty() {
        tokens.remove(0);
        return candidate;
    }

    manifest
        .default_action(context)
        .map(str::to_string)
        .unwrap_or_default()
}

fn match_token(manifest: &Manifest, context: Context, token: &str) -> String {
    let candidate = token.trim().to_lowercase();
    if candidate.is_empty() || manifest.has_action(context, &candidate) {
        return candidate;
    }

    if let Some(target) = manifest.alias_target(context, &candidate) {
        return target.to_string();
    }

    let guessed = candidate.replace('-', "_");
    if manifest.has_action(context, &guessed) {
        guessed
    } else {
        String::new()
    }
}
