//! Manifest Parser
//!
//! Turns descriptor text (an XML document, optionally wrapped in `<?php ... ?>`
//! guard blocks) into a normalized [`Manifest`].

use roxmltree::{Document, Node, ParsingOptions};
use tracing::warn;

use super::types::{
    ActionSpec, AdminActionSpec, Context, Manifest, ADMIN_ALIAS_PREFIX, ADMIN_PERMISSION,
};

const GUARD_OPEN: &str = "<?php";
const GUARD_CLOSE: &str = "?>";

/// Descriptor text that does not yield a usable markup document, including
/// text holding nothing but guard blocks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed descriptor: {0}")]
    Malformed(String),
}

/// Parse descriptor text into a manifest.
///
/// `fallback_name` is used when the descriptor declares no `<name>`; callers
/// pass the name of the directory containing the descriptor.
pub fn parse_manifest(text: &str, fallback_name: &str) -> Result<Manifest, ParseError> {
    let markup = extract_markup(text)
        .ok_or_else(|| ParseError::Malformed("no markup document".to_string()))?;

    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(markup, options)
        .map_err(|e| ParseError::Malformed(e.to_string()))?;
    let root = doc.root_element();

    let mut manifest = Manifest {
        name: leaf_text(root, "name")
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| fallback_name.to_string()),
        version: leaf_text(root, "version").unwrap_or_default(),
        date: leaf_text(root, "date").unwrap_or_default(),
        icon: leaf_text(root, "icon")
            .or_else(|| leaf_text(root, "icone"))
            .unwrap_or_default(),
        default_lang: leaf_text(root, "default_lang").unwrap_or_default(),
        ..Manifest::default()
    };

    for node in child_elements(root, "action") {
        let Some(decl) = ActionDecl::read(node) else {
            continue;
        };

        manifest
            .front_actions
            .entry(decl.key.clone())
            .or_insert_with(|| ActionSpec {
                description: decl.description.clone(),
                requires: decl.requires.clone(),
            });

        if decl.is_default && manifest.default_front_action.is_none() {
            manifest.default_front_action = Some(decl.key.clone());
        }

        for alias in decl.aliases {
            // The prefix belongs to the admin namespace
            if alias.starts_with(ADMIN_ALIAS_PREFIX) {
                warn!("Ignoring front alias {:?} of action {}", alias, decl.key);
                continue;
            }
            manifest
                .aliases
                .insert(Context::Front.alias_key(&alias), decl.key.clone());
        }
    }

    if let Some(admin) = child_elements(root, "admin").next() {
        for node in child_elements(admin, "action") {
            let Some(decl) = ActionDecl::read(node) else {
                continue;
            };

            let show_in_menu = node.attribute("menu").map_or(true, |menu| menu == "true");

            manifest
                .admin_actions
                .entry(decl.key.clone())
                .or_insert_with(|| AdminActionSpec {
                    description: decl.description.clone(),
                    requires: decl.requires.clone(),
                    show_in_menu,
                });

            if decl.is_default && manifest.default_admin_action.is_none() {
                manifest.default_admin_action = Some(decl.key.clone());
            }

            for alias in decl.aliases {
                manifest
                    .aliases
                    .insert(Context::Admin.alias_key(&alias), decl.key.clone());
            }
        }
    }

    if !manifest.admin_actions.is_empty() {
        manifest.permissions.insert(ADMIN_PERMISSION.to_string());
    }
    for node in child_elements(root, "permission") {
        if let Some(name) = node.attribute("name").filter(|n| !n.is_empty()) {
            manifest.permissions.insert(name.to_string());
        }
    }

    Ok(manifest)
}

/// One `<action>` element, normalized
struct ActionDecl {
    key: String,
    description: String,
    requires: Vec<String>,
    is_default: bool,
    aliases: Vec<String>,
}

impl ActionDecl {
    /// Returns `None` for actions whose key is empty
    fn read(node: Node<'_, '_>) -> Option<Self> {
        let key = text_content(node).trim().to_lowercase();
        if key.is_empty() {
            return None;
        }

        let description = node
            .attribute("desc")
            .or_else(|| node.attribute("description"))
            .map(str::to_string)
            .unwrap_or_else(|| key.clone());

        let requires = node
            .attribute("requires")
            .map(|list| split_list(list).map(str::to_string).collect())
            .unwrap_or_default();

        let aliases = node
            .attribute("alias")
            .map(|list| split_list(list).map(str::to_lowercase).collect())
            .unwrap_or_default();

        Some(Self {
            key,
            description,
            requires,
            is_default: node.attribute("default").is_some(),
            aliases,
        })
    }
}

/// Drop every guard block and anything outside the outermost markup
fn extract_markup(text: &str) -> Option<&str> {
    let mut rest = text;
    loop {
        let trimmed = rest.trim_start();
        if !trimmed.starts_with(GUARD_OPEN) {
            rest = trimmed;
            break;
        }
        match trimmed.find(GUARD_CLOSE) {
            Some(end) => rest = &trimmed[end + GUARD_CLOSE.len()..],
            None => return None,
        }
    }

    // Trailing guard (epilogue)
    let mut markup = rest.trim_end();
    if let Some(start) = markup.rfind(GUARD_OPEN) {
        if markup.ends_with(GUARD_CLOSE) {
            markup = markup[..start].trim_end();
        }
    }

    let start = markup.find('<')?;
    let end = markup.rfind('>')?;
    if end < start {
        return None;
    }
    Some(&markup[start..=end])
}

fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == tag)
}

fn leaf_text(root: Node<'_, '_>, tag: &'static str) -> Option<String> {
    child_elements(root, tag)
        .next()
        .map(|node| text_content(node).trim().to_string())
}

/// Concatenated text of every descendant, comments and markup excluded
fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}
