//! Scripted host for dry runs and tests.
//!
//! [`SimDocument`] parses an HTML fixture with `scraper` and mutates the
//! resulting `ego_tree` directly, imitating a chat client closely enough to
//! exercise the whole engine. Fixture conventions:
//!
//! - `data-rect="x,y,w,h"` gives geometry. Inside an element marked
//!   `data-scroll`, coordinates are relative to that container's content.
//! - `data-scroll` marks a scroll container; `data-scroll="frozen"` ignores
//!   programmatic scrolling.
//! - `data-location` on `<body>` is the initial location.
//! - `data-message` marks a bubble. Per bubble: `data-actions` (comma list of
//!   menu items, default `Unsend,Reply,Forward`), `data-confirm`
//!   (`button` | `dialog` | `none`) and `data-more` (`labelled` | `unlabelled` | `none`).
//! - `data-older="N"` hides a row until its container has been scrolled to the
//!   top N times.
//! - `data-sim` tags the overlay parts: `overlay`, `more`, `more-unlabelled`,
//!   `menu`, `menuitem`, `dialog`, `everyone`, `self`, `dialog-remove`, `confirm`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use ego_tree::NodeId;
use engine_logging::engine_trace;
use scraper::{ElementRef, Html, Selector};

use crate::dom::{
    Document, DomError, Listener, NavigationObserver, PointerKind, ScrollAlign, ScrollBehavior,
    Subscription,
};
use crate::types::{Point, Rect};

const DEFAULT_VIEWPORT: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 1200.0,
    height: 800.0,
};
const DEFAULT_ACTIONS: &[&str] = &["Unsend", "Reply", "Forward"];

/// What the simulated host did, for assertions and dry-run reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimJournal {
    /// Text of each message a pointer entered.
    pub hovered: Vec<String>,
    /// Text of each message whose action menu opened.
    pub menus_opened: Vec<String>,
    /// Text of each message retracted for everyone, in order.
    pub retracted: Vec<String>,
    /// Text of each message removed only for the user.
    pub removed_for_self: Vec<String>,
    pub escapes: usize,
    pub wheel_events: usize,
    pub navigations: Vec<String>,
}

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    mutation: Vec<(u64, Listener)>,
    navigation: Vec<(u64, Listener)>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Notify {
    mutation: bool,
    navigation: bool,
}

impl Notify {
    fn mutation() -> Self {
        Self {
            mutation: true,
            navigation: false,
        }
    }

    fn merge(self, other: Notify) -> Self {
        Self {
            mutation: self.mutation || other.mutation,
            navigation: self.navigation || other.navigation,
        }
    }
}

#[derive(Debug, Default)]
struct Overlay {
    layer: Option<NodeId>,
    more: Option<NodeId>,
    more_unlabelled: Option<NodeId>,
    menu: Option<NodeId>,
    items: Vec<NodeId>,
    dialog: Option<NodeId>,
    everyone: Option<NodeId>,
    only_self: Option<NodeId>,
    dialog_remove: Option<NodeId>,
    confirm: Option<NodeId>,
}

struct OlderBatch {
    container: Option<NodeId>,
    parent: NodeId,
    rows: Vec<NodeId>,
}

struct SimState {
    html: Html,
    selectors: HashMap<String, Option<Selector>>,
    base: HashMap<NodeId, Rect>,
    placed: HashMap<NodeId, Rect>,
    scroll_tops: HashMap<NodeId, f64>,
    attr_overrides: HashMap<(NodeId, String), String>,
    viewport: Rect,
    location: String,
    overlay: Overlay,
    hovered: Option<NodeId>,
    menu_for: Option<NodeId>,
    pending: Option<NodeId>,
    older: Vec<OlderBatch>,
    scripted_navigation: Option<(usize, String)>,
    journal: SimJournal,
}

pub struct SimDocument {
    state: Mutex<SimState>,
    listeners: Arc<Mutex<ListenerRegistry>>,
}

impl SimDocument {
    pub fn from_html(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut base = HashMap::new();
        let mut overlay = Overlay::default();
        let mut older: BTreeMap<u32, Vec<NodeId>> = BTreeMap::new();
        let mut location = "/".to_string();
        let mut viewport = DEFAULT_VIEWPORT;

        for node in html.root_element().descendants() {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            let value = element.value();
            if let Some(rect) = value.attr("data-rect").and_then(parse_rect) {
                base.insert(node.id(), rect);
            }
            if value.name() == "body" {
                if let Some(path) = value.attr("data-location") {
                    location = path.to_string();
                }
                if let Some(rect) = value.attr("data-rect").and_then(parse_rect) {
                    viewport = rect;
                }
            }
            if let Some(batch) = value.attr("data-older").and_then(|b| b.parse().ok()) {
                older.entry(batch).or_default().push(node.id());
            }
            match value.attr("data-sim") {
                Some("overlay") => overlay.layer = Some(node.id()),
                Some("more") => overlay.more = Some(node.id()),
                Some("more-unlabelled") => overlay.more_unlabelled = Some(node.id()),
                Some("menu") => overlay.menu = Some(node.id()),
                Some("menuitem") => overlay.items.push(node.id()),
                Some("dialog") => overlay.dialog = Some(node.id()),
                Some("everyone") => overlay.everyone = Some(node.id()),
                Some("self") => overlay.only_self = Some(node.id()),
                Some("dialog-remove") => overlay.dialog_remove = Some(node.id()),
                Some("confirm") => overlay.confirm = Some(node.id()),
                _ => {}
            }
        }

        let mut state = SimState {
            html,
            selectors: HashMap::new(),
            base,
            placed: HashMap::new(),
            scroll_tops: HashMap::new(),
            attr_overrides: HashMap::new(),
            viewport,
            location,
            overlay,
            hovered: None,
            menu_for: None,
            pending: None,
            older: Vec::new(),
            scripted_navigation: None,
            journal: SimJournal::default(),
        };

        for id in [
            state.overlay.more,
            state.overlay.more_unlabelled,
            state.overlay.menu,
            state.overlay.dialog,
            state.overlay.confirm,
        ]
        .into_iter()
        .flatten()
        {
            state.detach(id);
        }

        for (_, rows) in older {
            let Some(parent) = rows.first().and_then(|row| state.parent_element(*row)) else {
                continue;
            };
            let container = state.nearest_container(parent, true);
            for row in &rows {
                state.detach(*row);
            }
            state.older.push(OlderBatch {
                container,
                parent,
                rows,
            });
        }

        Self {
            state: Mutex::new(state),
            listeners: Arc::new(Mutex::new(ListenerRegistry::default())),
        }
    }

    /// Simulates a navigation (history push or back/forward) to `path`.
    pub fn navigate(&self, path: &str) {
        self.with_state(|state| {
            state.location = path.to_string();
            state.journal.navigations.push(path.to_string());
            Notify {
                mutation: true,
                navigation: true,
            }
        });
    }

    /// Navigates to `path` right after the `count`-th retraction.
    pub fn navigate_after_removals(&self, count: usize, path: &str) {
        self.read(|state| state.scripted_navigation = Some((count, path.to_string())));
    }

    pub fn journal(&self) -> SimJournal {
        self.read(|state| state.journal.clone())
    }

    /// Texts of the message bubbles currently in the tree, in document order.
    pub fn message_texts(&self) -> Vec<String> {
        self.read(|state| {
            state
                .messages()
                .into_iter()
                .map(|id| state.text_of(id))
                .collect()
        })
    }

    /// The bubble whose trimmed text equals `text`.
    pub fn message(&self, text: &str) -> Option<NodeId> {
        self.read(|state| {
            state
                .messages()
                .into_iter()
                .find(|id| state.text_of(*id).trim() == text)
        })
    }

    /// Number of installed (mutation, navigation) listeners.
    pub fn listener_counts(&self) -> (usize, usize) {
        let registry = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        (registry.mutation.len(), registry.navigation.len())
    }

    fn read<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Runs a mutation, then fires listeners with the state unlocked.
    fn with_state(&self, f: impl FnOnce(&mut SimState) -> Notify) {
        let notify = self.read(f);
        self.fire(notify);
    }

    fn try_with_state(
        &self,
        f: impl FnOnce(&mut SimState) -> Result<Notify, DomError>,
    ) -> Result<(), DomError> {
        let notify = self.read(f)?;
        self.fire(notify);
        Ok(())
    }

    fn fire(&self, notify: Notify) {
        let listeners: Vec<Listener> = {
            let registry = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            let mut out = Vec::new();
            if notify.mutation {
                out.extend(registry.mutation.iter().map(|(_, l)| l.clone()));
            }
            if notify.navigation {
                out.extend(registry.navigation.iter().map(|(_, l)| l.clone()));
            }
            out
        };
        for listener in listeners {
            listener();
        }
    }

    fn register(&self, navigation: bool, listener: Listener) -> Subscription {
        let id = {
            let mut registry = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            registry.next_id += 1;
            let id = registry.next_id;
            if navigation {
                registry.navigation.push((id, listener));
            } else {
                registry.mutation.push((id, listener));
            }
            id
        };
        let weak: Weak<Mutex<ListenerRegistry>> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
                registry.mutation.retain(|(i, _)| *i != id);
                registry.navigation.retain(|(i, _)| *i != id);
            }
        })
    }
}

impl SimState {
    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    fn raw_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.value().attr(name))
    }

    fn attr(&self, id: NodeId, name: &str) -> Option<String> {
        if let Some(value) = self.attr_overrides.get(&(id, name.to_string())) {
            return Some(value.clone());
        }
        self.raw_attr(id, name).map(str::to_string)
    }

    fn text_of(&self, id: NodeId) -> String {
        self.element(id)
            .map(|e| e.text().collect::<String>())
            .unwrap_or_default()
    }

    fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.html
            .tree
            .get(id)?
            .parent()
            .filter(|p| p.value().is_element())
            .map(|p| p.id())
    }

    fn is_connected(&self, id: NodeId) -> bool {
        let root = self.html.tree.root().id();
        match self.html.tree.get(id) {
            Some(node) => node.id() == root || node.ancestors().any(|a| a.id() == root),
            None => false,
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    fn attach(&mut self, parent: NodeId, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(parent) {
            node.append_id(id);
        }
    }

    fn show_overlay(&mut self, id: Option<NodeId>, rect: Rect) {
        let Some(id) = id else {
            return;
        };
        let layer = self
            .overlay
            .layer
            .unwrap_or_else(|| self.html.root_element().id());
        self.attach(layer, id);
        self.placed.insert(id, rect);
    }

    fn hide_overlay(&mut self, id: Option<NodeId>) {
        if let Some(id) = id {
            self.detach(id);
        }
    }

    fn is_container(&self, id: NodeId) -> bool {
        self.raw_attr(id, "data-scroll").is_some()
    }

    fn is_frozen(&self, id: NodeId) -> bool {
        self.raw_attr(id, "data-scroll") == Some("frozen")
    }

    /// Nearest scroll container at or above `id`.
    fn nearest_container(&self, id: NodeId, include_self: bool) -> Option<NodeId> {
        let mut current = if include_self {
            Some(id)
        } else {
            self.parent_element(id)
        };
        while let Some(node) = current {
            if self.is_container(node) {
                return Some(node);
            }
            current = self.parent_element(node);
        }
        None
    }

    /// (min top, max bottom) of the authored boxes laid out in `container`'s content.
    fn content_extent(&self, container: NodeId) -> Option<(f64, f64)> {
        let node = self.html.tree.get(container)?;
        let mut extent: Option<(f64, f64)> = None;
        for child in node.descendants().skip(1) {
            let Some(rect) = self.base.get(&child.id()) else {
                continue;
            };
            if self.nearest_container(child.id(), false) != Some(container) {
                continue;
            }
            extent = Some(match extent {
                Some((top, bottom)) => (top.min(rect.top()), bottom.max(rect.bottom())),
                None => (rect.top(), rect.bottom()),
            });
        }
        extent
    }

    fn client_height(&self, id: NodeId) -> f64 {
        if id == self.html.root_element().id() {
            return self.viewport.height;
        }
        self.base.get(&id).map(|r| r.height).unwrap_or(0.0)
    }

    fn scroll_height(&self, id: NodeId) -> f64 {
        let client = self.client_height(id);
        if !self.is_container(id) {
            return client;
        }
        match self.content_extent(id) {
            Some((top, bottom)) => (bottom - top).max(client),
            None => client,
        }
    }

    fn scroll_top(&self, id: NodeId) -> f64 {
        self.scroll_tops.get(&id).copied().unwrap_or(0.0)
    }

    fn rect(&self, id: NodeId) -> Option<Rect> {
        if !self.is_connected(id) {
            return None;
        }
        if let Some(rect) = self.placed.get(&id) {
            return Some(*rect);
        }
        if id == self.html.root_element().id() {
            return Some(self.viewport);
        }
        let mut rect = *self.base.get(&id)?;
        let mut current = self.parent_element(id);
        while let Some(node) = current {
            if self.is_container(node) {
                let content_top = self.content_extent(node).map(|e| e.0).unwrap_or(0.0);
                let origin = self.base.get(&node).map(|r| r.top()).unwrap_or(0.0);
                rect.y = rect.y - content_top - self.scroll_top(node) + origin;
            }
            current = self.parent_element(node);
        }
        Some(rect)
    }

    /// Whether `point` is inside the viewport and every scroll container around `id`.
    fn is_painted_at(&self, id: NodeId, point: Point) -> bool {
        if !self.viewport.contains(point) {
            return false;
        }
        let mut current = self.nearest_container(id, false);
        while let Some(container) = current {
            match self.rect(container) {
                Some(clip) if clip.contains(point) => {}
                _ => return false,
            }
            current = self.nearest_container(container, false);
        }
        true
    }

    fn element_at(&self, point: Point) -> Option<NodeId> {
        let mut hit = None;
        for node in self.html.root_element().descendants() {
            if !node.value().is_element() {
                continue;
            }
            let id = node.id();
            let inside = self
                .rect(id)
                .is_some_and(|r| !r.is_empty() && r.contains(point));
            if inside && self.is_painted_at(id, point) {
                hit = Some(id);
            }
        }
        hit
    }

    fn messages(&self) -> Vec<NodeId> {
        self.html
            .root_element()
            .descendants()
            .filter(|node| {
                ElementRef::wrap(*node).is_some_and(|e| e.value().attr("data-message").is_some())
            })
            .map(|node| node.id())
            .collect()
    }

    fn message_at(&self, point: Point) -> Option<NodeId> {
        self.messages()
            .into_iter()
            .find(|id| self.rect(*id).is_some_and(|r| r.contains(point)))
    }

    fn selector(&mut self, source: &str) -> Option<Selector> {
        self.selectors
            .entry(source.to_string())
            .or_insert_with(|| Selector::parse(source).ok())
            .clone()
    }

    fn query_all(&mut self, scope: NodeId, source: &str) -> Vec<NodeId> {
        if !self.is_connected(scope) {
            return Vec::new();
        }
        let Some(selector) = self.selector(source) else {
            engine_trace!("unparseable selector {}", source);
            return Vec::new();
        };
        match self.element(scope) {
            Some(element) => element
                .select(&selector)
                .map(|e| e.id())
                .filter(|id| *id != scope)
                .collect(),
            None => Vec::new(),
        }
    }

    fn sort_in_document_order(&self, nodes: &mut [NodeId]) {
        let order: HashMap<NodeId, usize> = self
            .html
            .tree
            .root()
            .descendants()
            .enumerate()
            .map(|(index, node)| (node.id(), index))
            .collect();
        nodes.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
    }

    /// Centering a node never pages in history; scrolling or aligning to the top does.
    fn set_top(&mut self, container: NodeId, top: f64, loads_history: bool) -> Notify {
        if !self.is_container(container) || self.is_frozen(container) {
            return Notify::default();
        }
        let max = (self.scroll_height(container) - self.client_height(container)).max(0.0);
        self.scroll_tops.insert(container, top.clamp(0.0, max));
        if loads_history && top <= 0.0 {
            return self.load_older(container);
        }
        Notify::default()
    }

    /// Reaching the top of a container pulls in its next hidden history batch.
    fn load_older(&mut self, container: NodeId) -> Notify {
        let Some(index) = self
            .older
            .iter()
            .position(|batch| batch.container == Some(container))
        else {
            return Notify::default();
        };
        let batch = self.older.remove(index);
        for row in batch.rows.iter().rev() {
            if let Some(mut parent) = self.html.tree.get_mut(batch.parent) {
                parent.prepend_id(*row);
            }
        }
        engine_trace!("sim loaded {} older rows", batch.rows.len());
        Notify::mutation()
    }

    fn scroll_into_view(&mut self, id: NodeId, align: ScrollAlign) -> Notify {
        let mut notify = Notify::default();
        let mut current = self.nearest_container(id, false);
        while let Some(container) = current {
            if let (Some(target), Some(clip)) = (self.rect(id), self.rect(container)) {
                let delta = match align {
                    ScrollAlign::Start => target.top() - clip.top(),
                    ScrollAlign::Center => target.center().y - clip.center().y,
                };
                let top = self.scroll_top(container) + delta;
                let loads_history = align == ScrollAlign::Start;
                notify = notify.merge(self.set_top(container, top, loads_history));
            }
            current = self.nearest_container(container, false);
        }
        notify
    }

    fn hover(&mut self, point: Point, entering: bool) -> Notify {
        let Some(message) = self.message_at(point) else {
            return Notify::default();
        };
        if entering {
            let text = self.text_of(message);
            self.journal.hovered.push(text);
        }
        self.hovered = Some(message);
        let Some(rect) = self.rect(message) else {
            return Notify::default();
        };
        let control = Rect::new(rect.right() + 20.0, rect.center().y - 12.0, 24.0, 24.0);
        match self.attr(message, "data-more").as_deref() {
            Some("none") => Notify::default(),
            Some("unlabelled") => {
                self.show_overlay(self.overlay.more_unlabelled, control);
                Notify::mutation()
            }
            _ => {
                self.show_overlay(self.overlay.more, control);
                Notify::mutation()
            }
        }
    }

    fn close_menu(&mut self) {
        self.hide_overlay(self.overlay.menu);
        self.hide_overlay(self.overlay.more);
        self.hide_overlay(self.overlay.more_unlabelled);
        self.menu_for = None;
        self.hovered = None;
    }

    fn close_confirmations(&mut self) {
        self.hide_overlay(self.overlay.dialog);
        self.hide_overlay(self.overlay.confirm);
        self.pending = None;
    }

    fn open_menu(&mut self) -> Notify {
        let Some(message) = self.hovered else {
            return Notify::default();
        };
        let Some(anchor) = self.rect(message) else {
            return Notify::default();
        };
        let actions: Vec<String> = match self.raw_attr(message, "data-actions") {
            Some(list) => list
                .split(',')
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            None => DEFAULT_ACTIONS.iter().map(|a| a.to_string()).collect(),
        };

        let items = self.overlay.items.clone();
        for item in &items {
            self.detach(*item);
        }
        let Some(menu) = self.overlay.menu else {
            return Notify::default();
        };
        let x = (anchor.right() - 160.0).max(0.0);
        let y = anchor.bottom() + 4.0;
        let mut shown = 0.0;
        for item in items {
            if actions.iter().any(|a| *a == self.text_of(item).trim()) {
                self.attach(menu, item);
                self.placed
                    .insert(item, Rect::new(x, y + 36.0 * shown, 180.0, 36.0));
                shown += 1.0;
            }
        }
        self.show_overlay(Some(menu), Rect::new(x, y, 180.0, 36.0 * shown.max(1.0)));
        self.menu_for = Some(message);
        let text = self.text_of(message);
        self.journal.menus_opened.push(text);
        Notify::mutation()
    }

    fn choose_item(&mut self, item: NodeId) -> Notify {
        let target = self.menu_for;
        let label = self.text_of(item).trim().to_string();
        self.close_menu();
        if label != "Unsend" {
            return Notify::mutation();
        }
        let Some(message) = target else {
            return Notify::mutation();
        };
        self.pending = Some(message);
        match self.attr(message, "data-confirm").as_deref() {
            Some("none") => {}
            Some("dialog") => {
                self.show_overlay(self.overlay.dialog, Rect::new(400.0, 300.0, 400.0, 200.0));
                self.show_overlay_child(self.overlay.everyone, Rect::new(420.0, 320.0, 360.0, 40.0));
                self.show_overlay_child(self.overlay.only_self, Rect::new(420.0, 370.0, 360.0, 40.0));
                self.show_overlay_child(
                    self.overlay.dialog_remove,
                    Rect::new(660.0, 440.0, 120.0, 40.0),
                );
                if let Some(everyone) = self.overlay.everyone {
                    self.attr_overrides
                        .insert((everyone, "aria-checked".to_string()), "false".to_string());
                }
                if let Some(only_self) = self.overlay.only_self {
                    self.attr_overrides
                        .insert((only_self, "aria-checked".to_string()), "true".to_string());
                }
            }
            _ => {
                self.show_overlay(self.overlay.confirm, Rect::new(480.0, 420.0, 240.0, 44.0));
            }
        }
        Notify::mutation()
    }

    /// Positions a node that stays inside its overlay parent.
    fn show_overlay_child(&mut self, id: Option<NodeId>, rect: Rect) {
        if let Some(id) = id {
            self.placed.insert(id, rect);
        }
    }

    fn select_option(&mut self, option: NodeId) -> Notify {
        for other in [self.overlay.everyone, self.overlay.only_self]
            .into_iter()
            .flatten()
        {
            let checked = if other == option { "true" } else { "false" };
            self.attr_overrides
                .insert((other, "aria-checked".to_string()), checked.to_string());
        }
        Notify::mutation()
    }

    fn retract(&mut self, for_everyone: bool) -> Notify {
        let Some(message) = self.pending else {
            return Notify::default();
        };
        let text = self.text_of(message);
        let row = self
            .html
            .tree
            .get(message)
            .and_then(|node| {
                node.ancestors()
                    .find(|a| ElementRef::wrap(*a).is_some_and(|e| e.value().attr("role") == Some("row")))
            })
            .map(|row| row.id())
            .unwrap_or(message);
        self.close_confirmations();
        if !for_everyone {
            self.journal.removed_for_self.push(text);
            return Notify::mutation();
        }

        self.detach(row);
        self.journal.retracted.push(text);
        let mut notify = Notify::mutation();
        if let Some((count, path)) = self.scripted_navigation.clone() {
            if self.journal.retracted.len() == count {
                self.scripted_navigation = None;
                self.location = path.clone();
                self.journal.navigations.push(path);
                notify.navigation = true;
            }
        }
        notify
    }

    fn click(&mut self, id: NodeId) -> Notify {
        let hit = Some(id);
        if hit == self.overlay.more || hit == self.overlay.more_unlabelled {
            return self.open_menu();
        }
        if self.overlay.items.contains(&id) {
            return self.choose_item(id);
        }
        if hit == self.overlay.everyone || hit == self.overlay.only_self {
            return self.select_option(id);
        }
        if hit == self.overlay.dialog_remove {
            let everyone = self
                .overlay
                .everyone
                .and_then(|e| self.attr(e, "aria-checked"))
                .as_deref()
                == Some("true");
            return self.retract(everyone);
        }
        if hit == self.overlay.confirm {
            return self.retract(true);
        }
        Notify::default()
    }

    fn ensure_connected(&self, id: NodeId) -> Result<(), DomError> {
        if self.is_connected(id) {
            Ok(())
        } else {
            Err(DomError::Detached)
        }
    }
}

fn parse_rect(raw: &str) -> Option<Rect> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [x, y, w, h] => Some(Rect::new(*x, *y, *w, *h)),
        _ => None,
    }
}

impl Document for SimDocument {
    type Node = NodeId;

    fn document_root(&self) -> NodeId {
        self.read(|state| state.html.root_element().id())
    }

    fn query_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        self.read(|state| state.query_all(scope, selector))
    }

    fn sort_in_document_order(&self, nodes: &mut [NodeId]) {
        self.read(|state| state.sort_in_document_order(nodes))
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.read(|state| state.parent_element(node))
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.read(|state| state.is_connected(node))
    }

    fn rect(&self, node: NodeId) -> Option<Rect> {
        self.read(|state| state.rect(node))
    }

    fn text(&self, node: NodeId) -> String {
        self.read(|state| state.text_of(node))
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.read(|state| state.attr(node, name))
    }

    fn element_at(&self, point: Point) -> Option<NodeId> {
        self.read(|state| state.element_at(point))
    }

    fn location_path(&self) -> String {
        self.read(|state| state.location.clone())
    }

    fn scrolling_element(&self) -> NodeId {
        self.document_root()
    }

    fn scroll_top(&self, node: NodeId) -> f64 {
        self.read(|state| state.scroll_top(node))
    }

    fn scroll_height(&self, node: NodeId) -> f64 {
        self.read(|state| state.scroll_height(node))
    }

    fn client_height(&self, node: NodeId) -> f64 {
        self.read(|state| state.client_height(node))
    }

    fn set_scroll_top(&self, node: NodeId, top: f64) -> Result<(), DomError> {
        self.try_with_state(|state| {
            state.ensure_connected(node)?;
            Ok(state.set_top(node, top, true))
        })
    }

    fn scroll_by(&self, node: NodeId, dy: f64, _behavior: ScrollBehavior) -> Result<(), DomError> {
        self.try_with_state(|state| {
            state.ensure_connected(node)?;
            let top = state.scroll_top(node) + dy;
            Ok(state.set_top(node, top, true))
        })
    }

    fn dispatch_wheel(&self, node: NodeId, _dy: f64) -> Result<(), DomError> {
        // Synthetic wheel events are untrusted; they are recorded but do not scroll.
        self.try_with_state(|state| {
            state.ensure_connected(node)?;
            state.journal.wheel_events += 1;
            Ok(Notify::default())
        })
    }

    fn scroll_into_view(&self, node: NodeId, align: ScrollAlign) -> Result<(), DomError> {
        self.try_with_state(|state| {
            state.ensure_connected(node)?;
            Ok(state.scroll_into_view(node, align))
        })
    }

    fn dispatch_pointer(&self, node: NodeId, kind: PointerKind, at: Point) -> Result<(), DomError> {
        self.try_with_state(|state| {
            state.ensure_connected(node)?;
            Ok(match kind {
                PointerKind::Enter => state.hover(at, true),
                PointerKind::Over | PointerKind::Move => state.hover(at, false),
                PointerKind::Click => state.click(node),
            })
        })
    }

    fn click(&self, node: NodeId) -> Result<(), DomError> {
        self.try_with_state(|state| {
            state.ensure_connected(node)?;
            Ok(state.click(node))
        })
    }

    fn press_escape(&self) -> Result<(), DomError> {
        self.try_with_state(|state| {
            state.journal.escapes += 1;
            state.close_menu();
            state.close_confirmations();
            Ok(Notify::mutation())
        })
    }

    fn observe_mutations(&self, _root: NodeId, listener: Listener) -> Subscription {
        self.register(false, listener)
    }
}

impl NavigationObserver for SimDocument {
    fn subscribe(&self, listener: Listener) -> Subscription {
        self.register(true, listener)
    }
}
