use serde_json::Value;

use crate::NodeId;

/// A native event as seen by an event decoder.
///
/// `target_value` and `target_checked` snapshot the target's `value` and
/// `checked` properties at the moment the event fired.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub kind: String,
    pub target: NodeId,
    pub current_target: NodeId,
    pub detail: Value,
    pub target_value: Option<String>,
    pub target_checked: Option<bool>,
}

impl RawEvent {
    pub fn new(kind: impl Into<String>, target: NodeId) -> Self {
        Self {
            kind: kind.into(),
            target,
            current_target: target,
            detail: Value::Null,
            target_value: None,
            target_checked: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("`{kind}` event has no `{field}`")]
    MissingField { kind: String, field: String },
    #[error("event rejected: {0}")]
    Rejected(String),
}

impl DecodeError {
    pub fn missing(event: &RawEvent, field: impl Into<String>) -> Self {
        Self::MissingField {
            kind: event.kind.clone(),
            field: field.into(),
        }
    }
}
