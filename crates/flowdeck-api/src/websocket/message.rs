//! WebSocket control message types.
//!
//! Lifecycle events travel as [`flowdeck_engine::WorkflowEvent`] frames; this
//! enum covers everything else on the socket.

use serde::{Deserialize, Serialize};

/// WebSocket message types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Ping/heartbeat.
    Ping {
        #[serde(default)]
        timestamp: i64,
    },

    /// Pong response.
    Pong { timestamp: i64 },

    /// Connection established.
    Connected { connection_id: String },

    /// Join the event group of a workflow.
    SubscribeWorkflow { workflow_id: String },

    /// Leave the event group of a workflow.
    UnsubscribeWorkflow { workflow_id: String },

    /// Error message.
    Error { code: String, message: String },
}

impl WsMessage {
    /// Create a new error message.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_serialization() {
        let msg = WsMessage::Connected {
            connection_id: "conn-1".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["connection_id"], "conn-1");
    }

    #[test]
    fn test_subscribe_deserialization() {
        let json = r#"{"type":"subscribe_workflow","workflow_id":"wf_1a2b3c4d"}"#;
        let msg: WsMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            WsMessage::SubscribeWorkflow {
                workflow_id: "wf_1a2b3c4d".to_string()
            }
        );

        let json = r#"{"type":"unsubscribe_workflow","workflow_id":"wf_1a2b3c4d"}"#;
        let msg: WsMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, WsMessage::UnsubscribeWorkflow { .. }));
    }

    #[test]
    fn test_ping_without_timestamp() {
        let msg: WsMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, WsMessage::Ping { timestamp: 0 });
    }

    #[test]
    fn test_unknown_type_fails() {
        assert!(serde_json::from_str::<WsMessage>(r#"{"type":"chat"}"#).is_err());
        assert!(serde_json::from_str::<WsMessage>("not json").is_err());
    }

    #[test]
    fn test_error_helper() {
        let json = serde_json::to_value(WsMessage::error("PARSE_ERROR", "bad frame")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "PARSE_ERROR");
        assert_eq!(json["message"], "bad frame");
    }
}
