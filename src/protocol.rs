//! Line-oriented streaming wire protocol.
//!
//! Each frame is one line, terminated by `\n`, tagged by a leading
//! colon-delimited prefix. This is deliberately not Server-Sent-Events: there
//! is no `event:`/`id:` framing, no blank-line terminator, just newline-
//! delimited tagged lines a client can buffer and split on `\n`.

use crate::types::ModelReply;
use serde::Serialize;

/// One frame of the response stream.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Progress indicator naming the step about to run.
    Status { step: &'static str },
    /// A fragment of the final assistant answer.
    Data(String),
    /// Carries the per-model replies for UI display. Exactly one per
    /// successful request.
    ModelResponses(Vec<ModelReply>),
    /// Emitted iff the summariser ran; payload is the new synthetic history
    /// prefix.
    SummaryExecuted(Vec<crate::types::Message>),
    /// Fatal; no further frames follow.
    Error(String),
}

impl Frame {
    /// Renders this frame as a single `\n`-terminated wire line.
    pub fn encode(&self) -> String {
        match self {
            Frame::Status { step } => format!("STATUS:STEP:{}\n", step),
            Frame::Data(chunk) => format!("DATA:{}\n", chunk),
            Frame::ModelResponses(replies) => {
                format!("MODEL_RESPONSES:{}\n", encode_json(replies))
            }
            Frame::SummaryExecuted(messages) => {
                format!("SUMMARY_EXECUTED:{}\n", encode_json(messages))
            }
            Frame::Error(message) => format!("ERROR:{}\n", message),
        }
    }
}

fn encode_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, ModelReply};

    #[test]
    fn test_status_frame_encoding() {
        let frame = Frame::Status {
            step: "execute_standard",
        };
        assert_eq!(frame.encode(), "STATUS:STEP:execute_standard\n");
    }

    #[test]
    fn test_data_frame_encoding() {
        let frame = Frame::Data("hello".to_string());
        assert_eq!(frame.encode(), "DATA:hello\n");
    }

    #[test]
    fn test_error_frame_encoding() {
        let frame = Frame::Error("all parallel inference models failed".to_string());
        assert_eq!(
            frame.encode(),
            "ERROR:all parallel inference models failed\n"
        );
    }

    #[test]
    fn test_model_responses_frame_is_json_array() {
        let frame = Frame::ModelResponses(vec![ModelReply::new("model-a", "reply")]);
        let encoded = frame.encode();
        assert!(encoded.starts_with("MODEL_RESPONSES:["));
        assert!(encoded.ends_with("]\n"));
    }

    #[test]
    fn test_summary_executed_frame_is_json_array() {
        let frame = Frame::SummaryExecuted(vec![Message::system("[summary of prior conversation]\n...")]);
        let encoded = frame.encode();
        assert!(encoded.starts_with("SUMMARY_EXECUTED:["));
    }
}
