use crate::config::EngineConfig;
use crate::dom::Document;
use crate::query;
use crate::types::Rect;

/// Which rule produced the own-authored set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyMode {
    Geometric,
    AuthorLabel,
    /// Authorship unknown; every raw candidate is treated as own.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<N> {
    pub own: Vec<N>,
    pub mode: ClassifyMode,
}

impl<N> Classification<N> {
    pub fn is_fallback(&self) -> bool {
        self.mode == ClassifyMode::Fallback
    }
}

/// Picks own-authored messages out of `raw`, preserving order.
///
/// Right-aligned bubbles first; if none, bubbles whose semantic container is
/// labelled as sent by the user; if still none, all of `raw` in fallback mode.
pub fn classify<D: Document>(
    doc: &D,
    pane: Rect,
    raw: &[D::Node],
    config: &EngineConfig,
) -> Classification<D::Node> {
    let geometric: Vec<_> = raw
        .iter()
        .copied()
        .filter(|node| is_right_aligned(doc, *node, pane, config.own_side_threshold))
        .collect();
    if !geometric.is_empty() || raw.is_empty() {
        return Classification {
            own: geometric,
            mode: ClassifyMode::Geometric,
        };
    }

    let labelled: Vec<_> = raw
        .iter()
        .copied()
        .filter(|node| has_own_label(doc, *node, &config.own_label_phrases))
        .collect();
    if !labelled.is_empty() {
        return Classification {
            own: labelled,
            mode: ClassifyMode::AuthorLabel,
        };
    }

    Classification {
        own: raw.to_vec(),
        mode: ClassifyMode::Fallback,
    }
}

fn is_right_aligned<D: Document>(doc: &D, node: D::Node, pane: Rect, threshold: f64) -> bool {
    if pane.is_empty() {
        return false;
    }
    match query::visible_rect(doc, node) {
        Some(rect) => rect.center().x - pane.left() > pane.width * threshold,
        None => false,
    }
}

fn has_own_label<D: Document>(doc: &D, node: D::Node, phrases: &[String]) -> bool {
    let container = query::closest(doc, node, |n| doc.attr(n, "aria-label").is_some());
    let Some(label) = container.and_then(|c| doc.attr(c, "aria-label")) else {
        return false;
    };
    let label = label.to_lowercase();
    phrases
        .iter()
        .any(|phrase| label.contains(&phrase.to_lowercase()))
}
