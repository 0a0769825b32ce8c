use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Pause;

/// Tunables of the interaction engine.
///
/// The geometric thresholds are empirical values observed against one host
/// layout; they are configurable because they do not necessarily generalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fraction of the pane width past which a bubble's center counts as own-authored.
    pub own_side_threshold: f64,
    /// Max vertical distance between a "more actions" control and its message.
    pub menu_proximity_px: f64,
    /// Horizontal offset right of the message for the blind menu click.
    pub fallback_click_offset_px: f64,
    pub scroll_step_px: f64,
    /// Offset reduction after acting on a candidate away from the top.
    pub nudge_px: f64,
    /// A target this close to the pane's top edge triggers a full reveal.
    pub near_top_px: f64,
    /// Narrower confirm controls are treated as decorative icons.
    pub min_confirm_width_px: f64,
    pub confirm_attempts: u32,
    pub exhaustion_streak: u32,
    pub stuck_streak: u32,
    pub retraction_label: String,
    pub confirm_labels: Vec<String>,
    pub dialog_remove_label: String,
    pub everyone_phrase: String,
    pub own_label_phrases: Vec<String>,
    pub timings: Timings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            own_side_threshold: 0.55,
            menu_proximity_px: 200.0,
            fallback_click_offset_px: 30.0,
            scroll_step_px: 1000.0,
            nudge_px: 100.0,
            near_top_px: 150.0,
            min_confirm_width_px: 100.0,
            confirm_attempts: 3,
            exhaustion_streak: 3,
            stuck_streak: 3,
            retraction_label: "Unsend".to_string(),
            confirm_labels: vec!["Unsend".to_string(), "Remove".to_string()],
            dialog_remove_label: "Remove".to_string(),
            everyone_phrase: "for everyone".to_string(),
            own_label_phrases: vec![
                "you sent".to_string(),
                "sent by you".to_string(),
                "you replied".to_string(),
            ],
            timings: Timings::default(),
        }
    }
}

/// Settle durations, in milliseconds, for each named suspension point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub initial_ms: u64,
    pub scan_settle_ms: u64,
    pub reveal_ms: u64,
    pub post_hover_ms: u64,
    pub post_menu_open_ms: u64,
    pub post_menu_item_ms: u64,
    pub confirm_poll_ms: u64,
    pub dismiss_ms: u64,
    pub after_scroll_ms: u64,
    pub post_removal_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            initial_ms: 2000,
            scan_settle_ms: 3000,
            reveal_ms: 1000,
            post_hover_ms: 1000,
            post_menu_open_ms: 1500,
            post_menu_item_ms: 1500,
            confirm_poll_ms: 500,
            dismiss_ms: 500,
            after_scroll_ms: 2000,
            post_removal_ms: 500,
        }
    }
}

impl Timings {
    /// `inter_removal` is the operator delay; every other pause is fixed.
    pub fn duration(&self, pause: Pause, inter_removal: Duration) -> Duration {
        let ms = match pause {
            Pause::Initial => self.initial_ms,
            Pause::ScanSettle => self.scan_settle_ms,
            Pause::Reveal => self.reveal_ms,
            Pause::PostHover => self.post_hover_ms,
            Pause::PostMenuOpen => self.post_menu_open_ms,
            Pause::PostMenuItem => self.post_menu_item_ms,
            Pause::ConfirmPoll => self.confirm_poll_ms,
            Pause::Dismiss => self.dismiss_ms,
            Pause::AfterScroll => self.after_scroll_ms,
            Pause::PostRemoval => self.post_removal_ms,
            Pause::InterRemoval => return inter_removal,
        };
        Duration::from_millis(ms)
    }
}
