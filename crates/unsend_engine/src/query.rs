//! Document query layer: ordered selector strategies over the live tree.
//!
//! Every strategy is a CSS selector applied to a scope. Lists are unions, not
//! priority picks: host markup variants overlap, so results are merged,
//! de-duplicated by node identity and returned in document order. New host
//! variants are supported by appending a strategy.

use std::collections::HashSet;

use crate::dom::Document;
use crate::types::Rect;

pub const CONVERSATION_ROOT_SELECTORS: &[&str] = &[
    "[role=\"main\"]",
    "[aria-label=\"Conversation\"]",
];

pub const MESSAGE_SELECTORS: &[&str] = &[
    "[role=\"row\"] div[dir=\"auto\"]",
    "[data-testid=\"message-container\"] [dir=\"auto\"]",
    "div[dir=\"auto\"]",
];

/// The draft composer; nothing inside it is ever a candidate.
pub const COMPOSER_SELECTORS: &[&str] = &[
    "[role=\"textbox\"]",
    "[contenteditable=\"true\"]",
    "[aria-label=\"Message\"]",
    "form",
];

pub const SCROLL_REGION_SELECTORS: &[&str] = &[
    "[role=\"log\"]",
    "[aria-label^=\"Messages in conversation\"]",
    "[role=\"grid\"]",
];

pub const MORE_CONTROL_SELECTORS: &[&str] = &[
    "[aria-label=\"More\"]",
    "[aria-label^=\"More actions\"]",
    "[role=\"button\"][aria-label*=\"More\"]",
];

pub const MENU_ITEM_SELECTORS: &[&str] = &[
    "[role=\"menuitem\"]",
    "[role=\"menu\"] [role=\"button\"]",
];

pub const DIALOG_SELECTORS: &[&str] = &["[role=\"dialog\"]", "[aria-modal=\"true\"]"];

pub const BUTTON_SELECTORS: &[&str] = &["[role=\"button\"]", "button"];

pub const RADIO_SELECTORS: &[&str] = &["[role=\"radio\"]", "input[type=\"radio\"]"];

/// Header links that carry the open thread's path.
pub const THREAD_LINK_SELECTORS: &[&str] = &[
    "[role=\"banner\"] a[href*=\"/t/\"]",
    "a[aria-current=\"page\"][href*=\"/t/\"]",
];

/// Union of all strategies under `scope`, de-duplicated by identity, in document order.
pub fn union_all<D: Document>(doc: &D, scope: D::Node, strategies: &[&str]) -> Vec<D::Node> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for selector in strategies {
        for node in doc.query_all(scope, selector) {
            if seen.insert(node) {
                out.push(node);
            }
        }
    }
    doc.sort_in_document_order(&mut out);
    out
}

/// Bounding box of a node that is actually rendered.
pub fn visible_rect<D: Document>(doc: &D, node: D::Node) -> Option<Rect> {
    doc.rect(node).filter(|rect| !rect.is_empty())
}

pub fn find_conversation_root<D: Document>(doc: &D) -> Option<D::Node> {
    let root = doc.document_root();
    union_all(doc, root, CONVERSATION_ROOT_SELECTORS)
        .into_iter()
        .find(|node| visible_rect(doc, *node).is_some())
}

/// Rendered, non-empty message elements under `root`, composer excluded.
pub fn find_message_elements<D: Document>(doc: &D, root: D::Node) -> Vec<D::Node> {
    let composers = union_all(doc, root, COMPOSER_SELECTORS);
    union_all(doc, root, MESSAGE_SELECTORS)
        .into_iter()
        .filter(|node| !composers.iter().any(|c| doc.contains(*c, *node)))
        .filter(|node| visible_rect(doc, *node).is_some())
        .filter(|node| !doc.text(*node).trim().is_empty())
        .collect()
}

/// The region holding the conversation history.
///
/// Preference: a strategy match that scrolls, then any strategy match, then
/// any scrollable descendant, then `root` itself.
pub fn find_scrollable_region<D: Document>(doc: &D, root: D::Node) -> D::Node {
    let matches = union_all(doc, root, SCROLL_REGION_SELECTORS);
    if let Some(node) = matches.iter().copied().find(|n| doc.is_scrollable(*n)) {
        return node;
    }
    if let Some(node) = matches.first().copied() {
        return node;
    }
    doc.query_all(root, "*")
        .into_iter()
        .find(|n| doc.is_scrollable(*n))
        .unwrap_or(root)
}

/// Scrollable ancestors of `region`, nearest first, ending with the document scroll root.
pub fn scrollable_ancestors<D: Document>(doc: &D, region: D::Node) -> Vec<D::Node> {
    let mut out = Vec::new();
    let mut current = doc.parent(region);
    while let Some(node) = current {
        if doc.is_scrollable(node) {
            out.push(node);
        }
        current = doc.parent(node);
    }
    let scrolling = doc.scrolling_element();
    if scrolling != region && !out.contains(&scrolling) {
        out.push(scrolling);
    }
    out
}

/// Nearest node at or above `node` satisfying `pred`.
pub fn closest<D, F>(doc: &D, node: D::Node, mut pred: F) -> Option<D::Node>
where
    D: Document,
    F: FnMut(D::Node) -> bool,
{
    let mut current = Some(node);
    while let Some(n) = current {
        if pred(n) {
            return Some(n);
        }
        current = doc.parent(n);
    }
    None
}

/// Visible text or, failing that, the accessible label.
pub fn label_of<D: Document>(doc: &D, node: D::Node) -> String {
    let text = doc.text(node);
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    doc.attr(node, "aria-label")
        .map(|label| label.trim().to_string())
        .unwrap_or_default()
}
