use serde::{Deserialize, Serialize};

use super::analysis::{AnalysisResult, SectionTrace};

/// Progress message pushed to the single consumer of a streaming run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    Status { message: String },
    ThinkingStart { message: String },
    ThinkingSection { section: String, message: String },
    ThinkingResult { section: String, trace: SectionTrace },
    Complete { data: Box<AnalysisResult> },
    Error { message: String },
}

impl AnalysisEvent {
    pub fn status(message: impl Into<String>) -> Self {
        AnalysisEvent::Status { message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        AnalysisEvent::Error { message: message.into() }
    }

    /// `complete` and `error` end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisEvent::Complete { .. } | AnalysisEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = AnalysisEvent::ThinkingSection {
            section: "Plumbing Systems".to_string(),
            message: "Analyzing Plumbing Systems...".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "thinking_section");
        assert_eq!(json["section"], "Plumbing Systems");

        let done = AnalysisEvent::Complete { data: Box::default() };
        let json = serde_json::to_value(&done).unwrap();
        assert_eq!(json["type"], "complete");
        assert_eq!(json["data"]["overall_risk_score"], "Unknown");
        assert!(done.is_terminal());
        assert!(!AnalysisEvent::status("x").is_terminal());
    }
}
