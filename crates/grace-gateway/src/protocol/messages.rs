//! Gateway message format
//!
//! Defines the structure for all WebSocket messages.

use super::{CloseCode, HelloPayload, IdentifyPayload, OpCode, SubscribePayload, UnsubscribePayload};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gateway message format
///
/// All messages sent over the WebSocket connection follow this format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Event type (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event data payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayMessage {
    // === Server Messages ===

    /// Create a Dispatch message (op=0)
    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event_type.into()),
            s: Some(sequence),
            d: Some(data),
        }
    }

    /// Create a Hello message (op=10)
    #[must_use]
    pub fn hello(payload: HelloPayload) -> Self {
        Self {
            op: OpCode::Hello,
            t: None,
            s: None,
            d: Some(serde_json::to_value(payload).unwrap_or_default()),
        }
    }

    /// Create a Heartbeat ACK message (op=11)
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self {
            op: OpCode::HeartbeatAck,
            t: None,
            s: None,
            d: None,
        }
    }

    // === Parsing Client Messages ===

    fn payload<T: DeserializeOwned>(&self, op: OpCode) -> Option<T> {
        if self.op != op {
            return None;
        }
        self.d.as_ref().and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// Try to parse as an Identify payload (op=2); a missing `d` is anonymous
    pub fn as_identify(&self) -> Option<IdentifyPayload> {
        if self.op == OpCode::Identify && self.d.as_ref().map_or(true, Value::is_null) {
            return Some(IdentifyPayload::default());
        }
        self.payload(OpCode::Identify)
    }

    /// Try to parse as a Subscribe payload (op=12)
    pub fn as_subscribe(&self) -> Option<SubscribePayload> {
        self.payload(OpCode::Subscribe)
    }

    /// Try to parse as an Unsubscribe payload (op=13)
    pub fn as_unsubscribe(&self) -> Option<UnsubscribePayload> {
        self.payload(OpCode::Unsubscribe)
    }

    /// Try to parse the heartbeat sequence number (op=1)
    pub fn as_heartbeat_seq(&self) -> Option<Option<u64>> {
        if self.op != OpCode::Heartbeat {
            return None;
        }
        Some(self.d.as_ref().and_then(Value::as_u64))
    }

    // === Utilities ===

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Code and reason for a close frame
    #[must_use]
    pub fn close_frame(code: CloseCode) -> (u16, String) {
        (code.as_u16(), code.description().to_string())
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayMessage(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayMessage(op={})", self.op)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(op: OpCode, d: Option<Value>) -> GatewayMessage {
        GatewayMessage {
            op,
            t: None,
            s: None,
            d,
        }
    }

    #[test]
    fn test_dispatch_message() {
        let msg = GatewayMessage::dispatch("LIKE_COUNT", 42, json!({"like_count": 3}));

        assert_eq!(msg.op, OpCode::Dispatch);
        assert_eq!(msg.t.as_deref(), Some("LIKE_COUNT"));
        assert_eq!(msg.s, Some(42));

        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""op":0"#));
    }

    #[test]
    fn test_hello_message() {
        let msg = GatewayMessage::hello(HelloPayload::with_interval(30_000));
        assert_eq!(msg.op, OpCode::Hello);
        assert!(msg.to_json().unwrap().contains("30000"));
    }

    #[test]
    fn test_heartbeat_ack_has_no_fields() {
        assert_eq!(GatewayMessage::heartbeat_ack().to_json().unwrap(), r#"{"op":11}"#);
    }

    #[test]
    fn test_parse_identify() {
        let anonymous = client(OpCode::Identify, None).as_identify().unwrap();
        assert!(anonymous.token.is_none());

        let with_token = client(OpCode::Identify, Some(json!({"token": "abc"})))
            .as_identify()
            .unwrap();
        assert_eq!(with_token.bearer(), Some("abc"));

        assert!(client(OpCode::Heartbeat, None).as_identify().is_none());
    }

    #[test]
    fn test_parse_subscribe() {
        let msg = client(
            OpCode::Subscribe,
            Some(json!({"query": "comments", "post_id": "7"})),
        );
        assert_eq!(
            msg.as_subscribe(),
            Some(SubscribePayload::Comments {
                post_id: "7".to_string()
            })
        );

        assert!(client(OpCode::Subscribe, None).as_subscribe().is_none());
        assert!(client(OpCode::Subscribe, Some(json!({"query": "nope"})))
            .as_subscribe()
            .is_none());
    }

    #[test]
    fn test_parse_unsubscribe() {
        let msg = client(OpCode::Unsubscribe, Some(json!({"subscription_id": "3"})));
        assert_eq!(msg.as_unsubscribe().unwrap().subscription_id, "3");
    }

    #[test]
    fn test_parse_heartbeat() {
        let msg = client(OpCode::Heartbeat, Some(Value::Number(41.into())));
        assert_eq!(msg.as_heartbeat_seq(), Some(Some(41)));
        assert_eq!(client(OpCode::Heartbeat, None).as_heartbeat_seq(), Some(None));
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(GatewayMessage::from_json(r#"{"op":4}"#).is_err());
    }

    #[test]
    fn test_close_frame() {
        let (code, desc) = GatewayMessage::close_frame(CloseCode::AuthenticationFailed);
        assert_eq!(code, 4004);
        assert!(desc.contains("Authentication"));
    }
}
