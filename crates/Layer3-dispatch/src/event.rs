//! Dispatch events and streaming state
//!
//! The dispatcher's external surface is this event taxonomy; how events
//! are put on the wire (SSE, websockets, ...) is the API layer's
//! business. The stream itself is driven by an explicit state machine:
//! a closed receiving end is observed as a send failure and moves the
//! stream to `Aborted`, never as a panic or an exception.

use serde::{Deserialize, Serialize};

use crate::format::FormattedResult;

// ============================================================================
// Events
// ============================================================================

/// Typed events emitted on a streaming dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum DispatchEvent {
    /// Batch accepted, execution beginning (marker, no payload)
    CallStarted,

    /// One call finished (standard streaming only)
    Result { result: FormattedResult },

    /// Every call finished (automatic streaming only)
    AggregatedResult { results: Vec<FormattedResult> },

    /// A call (or the batch) hit an unrecoverable condition
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        call_id: Option<String>,
        message: String,
    },

    /// Terminal marker; nothing follows
    Completed,
}

impl DispatchEvent {
    /// Wire name of the event, matching the serde tag
    pub fn name(&self) -> &'static str {
        match self {
            Self::CallStarted => "call-started",
            Self::Result { .. } => "result",
            Self::AggregatedResult { .. } => "aggregated-result",
            Self::Error { .. } => "error",
            Self::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

// ============================================================================
// Stream state machine
// ============================================================================

/// States of one streaming dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Stream opened, `call-started` not yet emitted
    Started,

    /// Calls are executing and events are flowing
    Dispatching,

    /// Terminal: all events delivered
    Completed,

    /// Terminal: receiver went away, event production stopped
    Aborted,
}

impl StreamState {
    /// Whether the stream can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    /// Attempt a transition; invalid ones are refused, not panicked on
    pub fn advance(&mut self, next: StreamState) -> bool {
        let valid = matches!(
            (*self, next),
            (Self::Started, Self::Dispatching)
                | (Self::Started, Self::Completed)
                | (Self::Started, Self::Aborted)
                | (Self::Dispatching, Self::Completed)
                | (Self::Dispatching, Self::Aborted)
        );
        if valid {
            *self = next;
        }
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_match_taxonomy() {
        assert_eq!(DispatchEvent::CallStarted.name(), "call-started");
        assert_eq!(DispatchEvent::Completed.name(), "completed");
        assert_eq!(
            DispatchEvent::Error {
                call_id: None,
                message: "x".into()
            }
            .name(),
            "error"
        );
    }

    #[test]
    fn test_event_serialization_tag() {
        let json = serde_json::to_string(&DispatchEvent::CallStarted).unwrap();
        assert!(json.contains("\"call-started\""));
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut state = StreamState::Started;
        assert!(state.advance(StreamState::Dispatching));
        assert!(state.advance(StreamState::Completed));
        assert!(state.is_terminal());
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let mut state = StreamState::Completed;
        assert!(!state.advance(StreamState::Dispatching));
        assert_eq!(state, StreamState::Completed);

        let mut state = StreamState::Aborted;
        assert!(!state.advance(StreamState::Completed));
        assert_eq!(state, StreamState::Aborted);
    }

    #[test]
    fn test_abort_from_any_live_state() {
        let mut state = StreamState::Started;
        assert!(state.advance(StreamState::Aborted));

        let mut state = StreamState::Dispatching;
        assert!(state.advance(StreamState::Aborted));
    }
}
