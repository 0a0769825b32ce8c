//! Drives the host's hidden retraction workflow for one message.

use engine_logging::{engine_debug, engine_info};

use crate::clock::{Pacer, Pause};
use crate::config::EngineConfig;
use crate::dom::{Document, DomError, PointerKind, ScrollAlign};
use crate::query;
use crate::types::{Point, Rect};

/// Why a candidate could not be acted on. All of these are recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeFailure {
    TargetGone,
    NoMenuControl,
    NoActionItem,
    NoConfirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeOutcome {
    Removed,
    Failed(InvokeFailure),
    /// The run was stopped between two steps.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvokeReport {
    pub outcome: InvokeOutcome,
    /// Where the target sat once aligned, if it was ever rendered.
    pub target_rect: Option<Rect>,
}

pub(crate) struct ActionInvoker<'a, D: Document> {
    doc: &'a D,
    config: &'a EngineConfig,
    pacer: &'a Pacer<'a>,
}

impl<'a, D: Document> ActionInvoker<'a, D> {
    pub(crate) fn new(doc: &'a D, config: &'a EngineConfig, pacer: &'a Pacer<'a>) -> Self {
        Self { doc, config, pacer }
    }

    pub(crate) async fn invoke(
        &self,
        target: D::Node,
        fallback_mode: bool,
    ) -> Result<InvokeReport, DomError> {
        let mut report = InvokeReport {
            outcome: InvokeOutcome::Interrupted,
            target_rect: None,
        };
        if !self.doc.is_connected(target) {
            report.outcome = InvokeOutcome::Failed(InvokeFailure::TargetGone);
            return Ok(report);
        }

        let align = if fallback_mode {
            ScrollAlign::Start
        } else {
            ScrollAlign::Center
        };
        self.doc.scroll_into_view(target, align)?;
        if !self.pacer.pause(Pause::Reveal).await {
            return Ok(report);
        }

        let Some(rect) = query::visible_rect(self.doc, target) else {
            report.outcome = InvokeOutcome::Failed(InvokeFailure::TargetGone);
            return Ok(report);
        };
        report.target_rect = Some(rect);

        self.hover(target, rect)?;
        if !self.pacer.pause(Pause::PostHover).await {
            return Ok(report);
        }

        if !self.open_menu(rect)? {
            report.outcome = InvokeOutcome::Failed(InvokeFailure::NoMenuControl);
            return Ok(report);
        }
        if !self.pacer.pause(Pause::PostMenuOpen).await {
            self.dismiss()?;
            return Ok(report);
        }

        let Some(item) = self.find_action_item() else {
            engine_debug!("menu has no '{}' item", self.config.retraction_label);
            self.dismiss()?;
            self.pacer.pause(Pause::Dismiss).await;
            report.outcome = InvokeOutcome::Failed(InvokeFailure::NoActionItem);
            return Ok(report);
        };
        self.doc.click(item)?;
        if !self.pacer.pause(Pause::PostMenuItem).await {
            self.dismiss()?;
            return Ok(report);
        }

        let attempts = self.config.confirm_attempts.max(1);
        for attempt in 1..=attempts {
            if self.confirm()? {
                engine_info!("retraction confirmed");
                report.outcome = InvokeOutcome::Removed;
                return Ok(report);
            }
            if attempt < attempts && !self.pacer.pause(Pause::ConfirmPoll).await {
                self.dismiss()?;
                return Ok(report);
            }
        }

        engine_debug!("no confirmation appeared after {} attempts", attempts);
        self.dismiss()?;
        self.pacer.pause(Pause::Dismiss).await;
        report.outcome = InvokeOutcome::Failed(InvokeFailure::NoConfirmation);
        Ok(report)
    }

    /// Pointer enter/over/move at the bubble's center, on whatever is painted there.
    fn hover(&self, target: D::Node, rect: Rect) -> Result<(), DomError> {
        let at = rect.center();
        let hit = self.doc.element_at(at).unwrap_or(target);
        for kind in [PointerKind::Enter, PointerKind::Over, PointerKind::Move] {
            self.doc.dispatch_pointer(hit, kind, at)?;
        }
        Ok(())
    }

    /// Clicks the nearest "more actions" control, or blindly right of the bubble.
    fn open_menu(&self, rect: Rect) -> Result<bool, DomError> {
        let root = self.doc.document_root();
        let nearest = query::union_all(self.doc, root, query::MORE_CONTROL_SELECTORS)
            .into_iter()
            .filter(|node| !self.is_foreign_control(*node))
            .filter_map(|node| query::visible_rect(self.doc, node).map(|r| (node, r)))
            .map(|(node, r)| (node, (r.top() - rect.top()).abs()))
            .filter(|(_, distance)| *distance < self.config.menu_proximity_px)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((control, _)) = nearest {
            self.doc.click(control)?;
            return Ok(true);
        }

        let at = Point {
            x: rect.right() + self.config.fallback_click_offset_px,
            y: rect.center().y,
        };
        match self.doc.element_at(at) {
            Some(hit) => {
                engine_debug!("no labelled menu control; clicking at ({}, {})", at.x, at.y);
                self.doc.dispatch_pointer(hit, PointerKind::Click, at)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sidebar controls such as "More options for <name>" belong to other entities.
    fn is_foreign_control(&self, node: D::Node) -> bool {
        self.doc
            .attr(node, "aria-label")
            .map(|label| label.to_lowercase().contains("options for"))
            .unwrap_or(false)
    }

    fn find_action_item(&self) -> Option<D::Node> {
        let root = self.doc.document_root();
        query::union_all(self.doc, root, query::MENU_ITEM_SELECTORS)
            .into_iter()
            .find(|item| self.doc.text(*item).trim() == self.config.retraction_label)
    }

    /// One pass over both confirmation shapes. Returns `true` once confirmed.
    fn confirm(&self) -> Result<bool, DomError> {
        let root = self.doc.document_root();
        for dialog in query::union_all(self.doc, root, query::DIALOG_SELECTORS) {
            if self.confirm_audience_dialog(dialog)? {
                return Ok(true);
            }
        }

        let button = query::union_all(self.doc, root, query::BUTTON_SELECTORS)
            .into_iter()
            .filter(|node| {
                let text = self.doc.text(*node);
                let text = text.trim();
                self.config.confirm_labels.iter().any(|label| label == text)
            })
            .find(|node| {
                query::visible_rect(self.doc, *node)
                    .map(|r| r.width >= self.config.min_confirm_width_px)
                    .unwrap_or(false)
            });
        if let Some(button) = button {
            self.doc.click(button)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Dialog offering who to retract for: pick "for everyone", then remove.
    fn confirm_audience_dialog(&self, dialog: D::Node) -> Result<bool, DomError> {
        let phrase = self.config.everyone_phrase.to_lowercase();
        let everyone = query::union_all(self.doc, dialog, query::RADIO_SELECTORS)
            .into_iter()
            .find(|option| {
                query::label_of(self.doc, *option)
                    .to_lowercase()
                    .contains(&phrase)
            });
        let Some(everyone) = everyone else {
            return Ok(false);
        };
        let remove = query::union_all(self.doc, dialog, query::BUTTON_SELECTORS)
            .into_iter()
            .find(|node| self.doc.text(*node).trim() == self.config.dialog_remove_label);
        let Some(remove) = remove else {
            return Ok(false);
        };

        if !self.is_selected(everyone) {
            self.doc.click(everyone)?;
        }
        self.doc.click(remove)?;
        Ok(true)
    }

    fn is_selected(&self, option: D::Node) -> bool {
        self.doc.attr(option, "aria-checked").as_deref() == Some("true")
            || self.doc.attr(option, "checked").is_some()
    }

    fn dismiss(&self) -> Result<(), DomError> {
        self.doc.press_escape()
    }
}
