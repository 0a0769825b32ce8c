//! Wire shapes exchanged with the hosting surface (popup, CLI, relay).
//!
//! Both directions are JSON objects tagged by `action`, with camelCase fields.

use serde::{Deserialize, Serialize};

use crate::{Msg, Severity, StopCause};

/// Parameters of a start command as the operator entered them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartRequest {
    /// Pause after each confirmed retraction, in milliseconds. Negative values are rejected.
    pub delay: i64,
    pub keyword_filters_enabled: bool,
    /// Comma- or newline-separated.
    pub delete_keywords: String,
    /// Comma- or newline-separated. Wins over `delete_keywords`.
    pub ignore_keywords: String,
}

impl StartRequest {
    pub fn with_delay(delay: i64) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn delay_ms(&self) -> Option<u64> {
        u64::try_from(self.delay).ok()
    }

    pub fn delete_list(&self) -> Vec<String> {
        parse_keywords(&self.delete_keywords)
    }

    pub fn ignore_list(&self) -> Vec<String> {
        parse_keywords(&self.ignore_keywords)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum HostCommand {
    Start(StartRequest),
    Stop,
}

impl HostCommand {
    pub fn into_msg(self) -> Msg {
        match self {
            HostCommand::Start(request) => Msg::StartRequested(request),
            HostCommand::Stop => Msg::StopRequested,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum HostEvent {
    Status {
        status: String,
        #[serde(rename = "type")]
        severity: Severity,
    },
    Complete,
    Stopped {
        status: String,
    },
}

impl HostEvent {
    /// The outward notification for an engine message, if it has one.
    pub fn for_msg(msg: &Msg) -> Option<Self> {
        match msg {
            Msg::EngineStatus {
                message, severity, ..
            } => Some(HostEvent::Status {
                status: message.clone(),
                severity: *severity,
            }),
            Msg::RunCompleted { .. } => Some(HostEvent::Complete),
            Msg::RunStopped {
                cause: StopCause::ChatChanged,
                ..
            } => Some(HostEvent::Stopped {
                status: "Stopped: chat changed".to_string(),
            }),
            _ => None,
        }
    }
}

/// Splits operator keyword input on commas and newlines; blanks are dropped.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_split_on_commas_and_lines() {
        assert_eq!(
            parse_keywords("party, Mom\n\n  dinner ,"),
            vec!["party", "Mom", "dinner"]
        );
        assert!(parse_keywords(" \n , ").is_empty());
    }
}
