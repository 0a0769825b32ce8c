//! Abstract document-tree interface the engine drives.
//!
//! The embedding environment implements [`Document`] over whatever live tree it
//! has (a browser page, a remote-debugging session, the [`crate::SimDocument`]
//! fixture host). Queries never fail: a missing or stale node yields an empty
//! result. Interactions return [`DomError`] when the host refuses them.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use thiserror::Error;

use crate::types::{Point, Rect};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("node is no longer attached to the document")]
    Detached,
    #[error("operation not supported by host: {0}")]
    Unsupported(&'static str),
    #[error("host error: {0}")]
    Host(String),
}

/// Callback fired by the host on a tree mutation or navigation.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle to an installed observer. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Single subscribe/cancel interface over the host's navigation hooks
/// (history pushes and replaces as well as back/forward).
pub trait NavigationObserver: Send + Sync {
    fn subscribe(&self, listener: Listener) -> Subscription;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Enter,
    Over,
    Move,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    Start,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

pub trait Document: Send + Sync {
    /// Reference identity of an element.
    type Node: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// The top-level element; scope for document-wide queries.
    fn document_root(&self) -> Self::Node;

    /// Elements under `scope` (excluding `scope`) matching a CSS selector, in document order.
    fn query_all(&self, scope: Self::Node, selector: &str) -> Vec<Self::Node>;

    /// Reorders `nodes` by their position in the document. Detached nodes sort last.
    fn sort_in_document_order(&self, nodes: &mut [Self::Node]);

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn is_connected(&self, node: Self::Node) -> bool;

    /// Bounding box in viewport coordinates; `None` once the node is detached.
    fn rect(&self, node: Self::Node) -> Option<Rect>;

    fn text(&self, node: Self::Node) -> String;

    fn attr(&self, node: Self::Node, name: &str) -> Option<String>;

    /// Topmost element painted at a viewport point.
    fn element_at(&self, point: Point) -> Option<Self::Node>;

    /// Path (or full URL) of the current location.
    fn location_path(&self) -> String;

    /// The document's own scroll root.
    fn scrolling_element(&self) -> Self::Node;

    fn scroll_top(&self, node: Self::Node) -> f64;

    fn scroll_height(&self, node: Self::Node) -> f64;

    fn client_height(&self, node: Self::Node) -> f64;

    fn is_scrollable(&self, node: Self::Node) -> bool {
        self.scroll_height(node) > self.client_height(node) + 1.0
    }

    fn set_scroll_top(&self, node: Self::Node, top: f64) -> Result<(), DomError>;

    fn scroll_by(&self, node: Self::Node, dy: f64, behavior: ScrollBehavior) -> Result<(), DomError>;

    /// Synthesized wheel event, for hosts that ignore direct scroll assignment.
    fn dispatch_wheel(&self, node: Self::Node, dy: f64) -> Result<(), DomError>;

    fn scroll_into_view(&self, node: Self::Node, align: ScrollAlign) -> Result<(), DomError>;

    fn dispatch_pointer(
        &self,
        node: Self::Node,
        kind: PointerKind,
        at: Point,
    ) -> Result<(), DomError>;

    fn click(&self, node: Self::Node) -> Result<(), DomError>;

    fn press_escape(&self) -> Result<(), DomError>;

    fn observe_mutations(&self, root: Self::Node, listener: Listener) -> Subscription;

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn contains(&self, ancestor: Self::Node, node: Self::Node) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }
}
