//! Builds conversation fixtures for [`SimDocument`].
//!
//! Layout is a 1200x800 viewport: a sidebar on the left, the conversation pane
//! from x=300 with a header, a scrolling history log and the composer. Rows are
//! 60px tall; own bubbles hug the right edge, others the left.

use std::fmt::Write as _;

use crate::sim::SimDocument;

const PANE_X: f64 = 300.0;
const PANE_WIDTH: f64 = 900.0;
const LOG_TOP: f64 = 60.0;
const LOG_HEIGHT: f64 = 640.0;
const ROW_HEIGHT: f64 = 60.0;
const BUBBLE_WIDTH: f64 = 220.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Own,
    Other,
    /// Centered bubble that no geometry rule can attribute.
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmShape {
    Button,
    Dialog,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoreControl {
    Labelled,
    Unlabelled,
    None,
}

#[derive(Debug, Clone)]
pub struct SimMessage {
    text: String,
    side: Side,
    actions: Option<Vec<String>>,
    confirm: ConfirmShape,
    more: MoreControl,
    author_label: Option<String>,
}

impl SimMessage {
    pub fn own(text: &str) -> Self {
        Self::new(text, Side::Own)
    }

    pub fn other(text: &str) -> Self {
        Self::new(text, Side::Other)
    }

    pub fn centered(text: &str) -> Self {
        Self::new(text, Side::Center)
    }

    fn new(text: &str, side: Side) -> Self {
        // Messages from others can only be hidden locally.
        let actions = (side == Side::Other).then(|| {
            ["Reply", "Forward", "Remove for you"]
                .iter()
                .map(|a| a.to_string())
                .collect()
        });
        Self {
            text: text.to_string(),
            side,
            actions,
            confirm: ConfirmShape::Button,
            more: MoreControl::Labelled,
            author_label: None,
        }
    }

    /// Menu items offered for this message.
    pub fn actions(mut self, actions: &[&str]) -> Self {
        self.actions = Some(actions.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn confirm(mut self, shape: ConfirmShape) -> Self {
        self.confirm = shape;
        self
    }

    pub fn more(mut self, control: MoreControl) -> Self {
        self.more = control;
        self
    }

    /// Accessibility label on the enclosing row, e.g. "You sent".
    pub fn labelled(mut self, label: &str) -> Self {
        self.author_label = Some(label.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    location: Option<String>,
    header_link: Option<String>,
    messages: Vec<SimMessage>,
    older: Vec<Vec<SimMessage>>,
    draft: Option<String>,
    frozen_log: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(mut self, path: &str) -> Self {
        self.location = Some(path.to_string());
        self
    }

    /// Thread link in the header, used when the location carries no identity.
    pub fn header_link(mut self, href: &str) -> Self {
        self.header_link = Some(href.to_string());
        self
    }

    pub fn own(self, text: &str) -> Self {
        self.message(SimMessage::own(text))
    }

    pub fn other(self, text: &str) -> Self {
        self.message(SimMessage::other(text))
    }

    /// Appends a message below the existing ones (newer).
    pub fn message(mut self, message: SimMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// History that only loads once the log reaches its top. Batches load in
    /// the order they are added, each one older than the last.
    pub fn older_batch(mut self, batch: Vec<SimMessage>) -> Self {
        self.older.push(batch);
        self
    }

    /// Unsent text in the composer.
    pub fn draft(mut self, text: &str) -> Self {
        self.draft = Some(text.to_string());
        self
    }

    /// The history log ignores scrolling; an outer wrapper scrolls instead.
    pub fn frozen_log(mut self) -> Self {
        self.frozen_log = true;
        self
    }

    pub fn build(&self) -> SimDocument {
        SimDocument::from_html(&self.to_html())
    }

    pub fn to_html(&self) -> String {
        let location = self.location.as_deref().unwrap_or("/t/100");
        let mut html = String::new();
        let _ = write!(
            html,
            r#"<html><body data-location="{}" data-rect="0,0,1200,800">"#,
            escape(location)
        );

        html.push_str(r#"<div role="navigation" data-rect="0,0,300,800">"#);
        html.push_str(r#"<div dir="auto" data-rect="20,20,200,30">Alice</div>"#);
        html.push_str(
            r#"<div role="button" aria-label="More options for Alice" data-rect="250,20,24,24"></div>"#,
        );
        html.push_str("</div>");

        html.push_str(r#"<div role="main" data-rect="300,0,900,800">"#);
        html.push_str(r#"<div role="banner" data-rect="300,0,900,60">"#);
        if let Some(href) = &self.header_link {
            let _ = write!(
                html,
                r#"<a href="{}" data-rect="320,15,200,30">Conversation</a>"#,
                escape(href)
            );
        }
        // Small icon sharing the retraction label; never a confirmation.
        html.push_str(r#"<div role="button" data-rect="1150,18,20,20">Unsend</div>"#);
        html.push_str("</div>");

        let rows = self.rows_html();
        let content_height = ROW_HEIGHT * self.messages.len() as f64;
        if self.frozen_log {
            let _ = write!(
                html,
                r#"<div data-scroll data-rect="{PANE_X},{LOG_TOP},{PANE_WIDTH},{LOG_HEIGHT}"><div role="log" data-rect="{PANE_X},0,{PANE_WIDTH},{content_height}">{rows}</div></div>"#
            );
        } else {
            let _ = write!(
                html,
                r#"<div role="log" data-scroll data-rect="{PANE_X},{LOG_TOP},{PANE_WIDTH},{LOG_HEIGHT}">{rows}</div>"#
            );
        }

        html.push_str(r#"<div role="textbox" contenteditable="true" data-rect="300,700,900,100">"#);
        if let Some(draft) = &self.draft {
            let _ = write!(
                html,
                r#"<div dir="auto" data-rect="320,720,400,30">{}</div>"#,
                escape(draft)
            );
        }
        html.push_str("</div>");
        html.push_str("</div>");

        html.push_str(OVERLAY_HTML);
        html.push_str("</body></html>");
        html
    }

    fn rows_html(&self) -> String {
        let mut out = String::new();
        let mut above = 0.0;
        let mut older_rows = Vec::new();
        for (index, batch) in self.older.iter().enumerate() {
            above += ROW_HEIGHT * batch.len() as f64;
            let mut y = -above;
            let mut batch_rows = String::new();
            for message in batch {
                batch_rows.push_str(&row_html(message, y, Some(index + 1)));
                y += ROW_HEIGHT;
            }
            older_rows.push(batch_rows);
        }
        // Oldest first in document order.
        for batch_rows in older_rows.iter().rev() {
            out.push_str(batch_rows);
        }
        for (index, message) in self.messages.iter().enumerate() {
            out.push_str(&row_html(message, ROW_HEIGHT * index as f64, None));
        }
        out
    }
}

fn row_html(message: &SimMessage, y: f64, batch: Option<usize>) -> String {
    let bubble_x = match message.side {
        Side::Own => PANE_X + PANE_WIDTH - 60.0 - BUBBLE_WIDTH,
        Side::Other => PANE_X + 20.0,
        Side::Center => PANE_X + (PANE_WIDTH - BUBBLE_WIDTH) / 2.0,
    };
    let mut row = format!(r#"<div role="row" data-rect="{PANE_X},{y},{PANE_WIDTH},{ROW_HEIGHT}""#);
    if let Some(label) = &message.author_label {
        let _ = write!(row, r#" aria-label="{}""#, escape(label));
    }
    if let Some(batch) = batch {
        let _ = write!(row, r#" data-older="{batch}""#);
    }
    row.push('>');

    let _ = write!(
        row,
        r#"<div dir="auto" data-message data-rect="{bubble_x},{},{BUBBLE_WIDTH},40""#,
        y + 10.0
    );
    if let Some(actions) = &message.actions {
        let _ = write!(row, r#" data-actions="{}""#, escape(&actions.join(",")));
    }
    let confirm = match message.confirm {
        ConfirmShape::Button => "button",
        ConfirmShape::Dialog => "dialog",
        ConfirmShape::None => "none",
    };
    let more = match message.more {
        MoreControl::Labelled => "labelled",
        MoreControl::Unlabelled => "unlabelled",
        MoreControl::None => "none",
    };
    let _ = write!(
        row,
        r#" data-confirm="{confirm}" data-more="{more}">{}</div></div>"#,
        escape(&message.text)
    );
    row
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const OVERLAY_HTML: &str = concat!(
    r#"<div data-sim="overlay">"#,
    r#"<div role="button" aria-label="More" data-sim="more"></div>"#,
    r#"<div role="button" data-sim="more-unlabelled"></div>"#,
    r#"<div role="menu" data-sim="menu">"#,
    r#"<div role="menuitem" data-sim="menuitem">Unsend</div>"#,
    r#"<div role="menuitem" data-sim="menuitem">Reply</div>"#,
    r#"<div role="menuitem" data-sim="menuitem">Forward</div>"#,
    r#"<div role="menuitem" data-sim="menuitem">Remove for you</div>"#,
    "</div>",
    r#"<div role="dialog" data-sim="dialog">"#,
    r#"<div role="radio" aria-checked="false" data-sim="everyone">Unsend for everyone</div>"#,
    r#"<div role="radio" aria-checked="true" data-sim="self">Remove for you</div>"#,
    r#"<div role="button" data-sim="dialog-remove">Remove</div>"#,
    "</div>",
    r#"<div role="button" data-sim="confirm">Unsend</div>"#,
    "</div>",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_batches_are_laid_out_above_the_visible_rows() {
        let html = Conversation::new()
            .own("newest")
            .older_batch(vec![SimMessage::own("older")])
            .older_batch(vec![SimMessage::own("oldest")])
            .to_html();
        let oldest = html.find("oldest").unwrap();
        let older = html.find(">older<").unwrap();
        let newest = html.find("newest").unwrap();
        assert!(oldest < older && older < newest);
        assert!(html.contains(r#"data-rect="300,-120,900,60" data-older="2""#));
        assert!(html.contains(r#"data-rect="300,-60,900,60" data-older="1""#));
    }
}
