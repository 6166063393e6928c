//! Channel wire codec and client-side connection bookkeeping.
//!
//! The admin backend multiplexes named channels over one WebSocket using the
//! Phoenix V2 framing: every message is a five-element JSON array
//! `[join_ref, ref, topic, event, payload]`, refs serialized as decimal
//! strings. [`SocketClient`] is the sans-io half of the client: it allocates
//! refs, remembers which topics are joined and which replies are
//! outstanding, and classifies inbound frames. The browser socket and the
//! test suite drive the same state machine; no I/O happens here.

use serde_json::{Value, json};
use std::collections::HashMap;

use crate::error::ChannelError;

/// Topic of the channel that serves the board list.
pub const INFO_TOPIC: &str = "boards:info";

/// Topic heartbeats are exchanged on.
pub const HEARTBEAT_TOPIC: &str = "phoenix";

/// Control events defined by the framing.
pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_HEARTBEAT: &str = "heartbeat";

/// Push events the board channels deliver.
pub const EVENT_INFO_UPDATED: &str = "board:info_updated";
pub const EVENT_COUNT_UPDATED: &str = "board:image_count_updated";

/// Channel topic for one board's live status.
pub fn board_topic(name: &str) -> String {
    format!("boards:{name}")
}

/// One framed channel message, in either direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Ref of the join that opened the topic this frame belongs to.
    pub join_ref: Option<u64>,
    /// Ref of this message; replies echo it back.
    pub msg_ref: Option<u64>,
    pub topic: String,
    pub event: String,
    pub payload: Value,
}

impl Frame {
    /// Serialize to the wire form `[join_ref, ref, topic, event, payload]`.
    pub fn encode(&self) -> String {
        json!([
            ref_to_value(self.join_ref),
            ref_to_value(self.msg_ref),
            self.topic,
            self.event,
            self.payload,
        ])
        .to_string()
    }

    /// Parse a wire message.
    pub fn decode(text: &str) -> Result<Self, ChannelError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ChannelError::MalformedFrame(e.to_string()))?;
        let Value::Array(parts) = value else {
            return Err(ChannelError::UnexpectedShape);
        };
        let [join_ref, msg_ref, topic, event, payload]: [Value; 5] = parts
            .try_into()
            .map_err(|_| ChannelError::UnexpectedShape)?;

        let (Value::String(topic), Value::String(event)) = (topic, event) else {
            return Err(ChannelError::UnexpectedShape);
        };

        Ok(Self {
            join_ref: value_to_ref(join_ref)?,
            msg_ref: value_to_ref(msg_ref)?,
            topic,
            event,
            payload,
        })
    }
}

fn ref_to_value(r: Option<u64>) -> Value {
    match r {
        Some(n) => Value::String(n.to_string()),
        None => Value::Null,
    }
}

fn value_to_ref(value: Value) -> Result<Option<u64>, ChannelError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ChannelError::InvalidRef(s)),
        // Some servers emit numeric refs; accept them.
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| ChannelError::InvalidRef(n.to_string())),
        other => Err(ChannelError::InvalidRef(other.to_string())),
    }
}

/// Status field of a reply payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Error,
}

impl ReplyStatus {
    pub fn is_ok(self) -> bool {
        matches!(self, ReplyStatus::Ok)
    }
}

/// An inbound frame after routing against the client's pending state.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Reply to a join/push/leave this client sent and still cares about.
    Reply {
        topic: String,
        msg_ref: u64,
        status: ReplyStatus,
        response: Value,
    },
    /// Unsolicited push on a joined topic.
    Event {
        topic: String,
        event: String,
        payload: Value,
    },
    /// The server closed or crashed the topic.
    Closed { topic: String },
    /// A reply whose ref is unknown or was cancelled by a leave.
    Ignored,
}

/// Client-side bookkeeping for one connection.
///
/// Tracks monotonically increasing message refs, the set of joined topics
/// (in join order, so teardown can leave them in the order they were
/// opened), and the refs of replies that are still expected.
#[derive(Debug, Default)]
pub struct SocketClient {
    next_ref: u64,
    joined: HashMap<String, u64>,
    join_order: Vec<String>,
    pending: HashMap<u64, String>,
}

impl SocketClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_ref(&mut self) -> u64 {
        self.next_ref += 1;
        self.next_ref
    }

    /// Build a join frame for `topic` and start expecting its reply.
    ///
    /// Joining an already-joined topic issues a fresh join ref, matching a
    /// client-driven rejoin.
    pub fn join(&mut self, topic: &str, payload: Value) -> Frame {
        let msg_ref = self.take_ref();
        if !self.joined.contains_key(topic) {
            self.join_order.push(topic.to_string());
        }
        self.joined.insert(topic.to_string(), msg_ref);
        self.pending.insert(msg_ref, topic.to_string());
        Frame {
            join_ref: Some(msg_ref),
            msg_ref: Some(msg_ref),
            topic: topic.to_string(),
            event: EVENT_JOIN.to_string(),
            payload,
        }
    }

    /// Build a push frame on `topic` and start expecting its reply.
    pub fn push(&mut self, topic: &str, event: &str, payload: Value) -> Frame {
        let msg_ref = self.take_ref();
        self.pending.insert(msg_ref, topic.to_string());
        Frame {
            join_ref: self.joined.get(topic).copied(),
            msg_ref: Some(msg_ref),
            topic: topic.to_string(),
            event: event.to_string(),
            payload,
        }
    }

    /// Build a leave frame for `topic`, if it is joined.
    ///
    /// Every reply still pending on the topic is cancelled and its ref
    /// returned, so callers can drop the matching handlers; a reply that
    /// arrives afterwards classifies as [`Inbound::Ignored`]. The leave's
    /// own reply is deliberately not expected.
    pub fn leave(&mut self, topic: &str) -> Option<(Frame, Vec<u64>)> {
        let join_ref = self.joined.remove(topic)?;
        self.join_order.retain(|t| t != topic);
        let cancelled = self.discard_pending(topic);
        let frame = Frame {
            join_ref: Some(join_ref),
            msg_ref: Some(self.take_ref()),
            topic: topic.to_string(),
            event: EVENT_LEAVE.to_string(),
            payload: json!({}),
        };
        Some((frame, cancelled))
    }

    /// Build a heartbeat frame.
    pub fn heartbeat(&mut self) -> Frame {
        let msg_ref = self.take_ref();
        self.pending.insert(msg_ref, HEARTBEAT_TOPIC.to_string());
        Frame {
            join_ref: None,
            msg_ref: Some(msg_ref),
            topic: HEARTBEAT_TOPIC.to_string(),
            event: EVENT_HEARTBEAT.to_string(),
            payload: json!({}),
        }
    }

    /// Leave every joined topic, in join order, and forget all pending
    /// replies. The transport is closed only after these frames are sent.
    pub fn shutdown(&mut self) -> Vec<Frame> {
        let topics = std::mem::take(&mut self.join_order);
        let mut frames = Vec::with_capacity(topics.len());
        for topic in topics {
            if let Some(join_ref) = self.joined.remove(&topic) {
                frames.push(Frame {
                    join_ref: Some(join_ref),
                    msg_ref: Some(self.take_ref()),
                    topic,
                    event: EVENT_LEAVE.to_string(),
                    payload: json!({}),
                });
            }
        }
        self.pending.clear();
        frames
    }

    /// Route an inbound frame against the pending and joined state.
    pub fn classify(&mut self, frame: Frame) -> Result<Inbound, ChannelError> {
        match frame.event.as_str() {
            EVENT_REPLY => {
                let Some(msg_ref) = frame.msg_ref else {
                    return Err(ChannelError::InvalidReply("reply without ref".to_string()));
                };
                if self.pending.remove(&msg_ref).is_none() {
                    return Ok(Inbound::Ignored);
                }
                let (status, response) = split_reply(&frame.payload)?;
                Ok(Inbound::Reply {
                    topic: frame.topic,
                    msg_ref,
                    status,
                    response,
                })
            }
            EVENT_CLOSE | EVENT_ERROR => {
                if self.joined.remove(&frame.topic).is_some() {
                    self.join_order.retain(|t| *t != frame.topic);
                }
                self.discard_pending(&frame.topic);
                Ok(Inbound::Closed { topic: frame.topic })
            }
            _ => Ok(Inbound::Event {
                topic: frame.topic,
                event: frame.event,
                payload: frame.payload,
            }),
        }
    }

    /// Whether `topic` is currently joined.
    pub fn is_joined(&self, topic: &str) -> bool {
        self.joined.contains_key(topic)
    }

    fn discard_pending(&mut self, topic: &str) -> Vec<u64> {
        let refs: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, t)| t.as_str() == topic)
            .map(|(r, _)| *r)
            .collect();
        for r in &refs {
            self.pending.remove(r);
        }
        refs
    }
}

/// Pull `status` and `response` out of a reply payload.
fn split_reply(payload: &Value) -> Result<(ReplyStatus, Value), ChannelError> {
    let status = payload
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| ChannelError::InvalidReply("missing status".to_string()))?;
    let status = match status {
        "ok" => ReplyStatus::Ok,
        _ => ReplyStatus::Error,
    };
    let response = payload.get("response").cloned().unwrap_or(Value::Null);
    Ok((status, response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply_frame(msg_ref: u64, topic: &str, status: &str, response: Value) -> Frame {
        Frame {
            join_ref: None,
            msg_ref: Some(msg_ref),
            topic: topic.to_string(),
            event: EVENT_REPLY.to_string(),
            payload: json!({"status": status, "response": response}),
        }
    }

    #[test]
    fn test_frame_encode_shape() {
        let frame = Frame {
            join_ref: Some(1),
            msg_ref: Some(2),
            topic: "boards:info".to_string(),
            event: EVENT_JOIN.to_string(),
            payload: json!({}),
        };
        assert_eq!(frame.encode(), r#"["1","2","boards:info","phx_join",{}]"#);
    }

    #[test]
    fn test_frame_decode_round_trip() {
        let frame = Frame {
            join_ref: Some(7),
            msg_ref: Some(9),
            topic: "boards:wallhaven".to_string(),
            event: "board:image_count_updated".to_string(),
            payload: json!({"indexed_image_count": 42}),
        };
        assert_eq!(Frame::decode(&frame.encode()).unwrap(), frame);
    }

    #[test]
    fn test_frame_decode_null_refs() {
        let frame = Frame::decode(r#"[null,null,"boards:x","board:info_updated",{"a":1}]"#).unwrap();
        assert_eq!(frame.join_ref, None);
        assert_eq!(frame.msg_ref, None);
    }

    #[test]
    fn test_frame_decode_numeric_refs() {
        let frame = Frame::decode(r#"[1,2,"t","e",{}]"#).unwrap();
        assert_eq!(frame.join_ref, Some(1));
        assert_eq!(frame.msg_ref, Some(2));
    }

    #[test]
    fn test_frame_decode_rejects_garbage() {
        assert!(matches!(
            Frame::decode("not json"),
            Err(ChannelError::MalformedFrame(_))
        ));
        assert_eq!(
            Frame::decode(r#"{"topic":"x"}"#),
            Err(ChannelError::UnexpectedShape)
        );
        assert_eq!(
            Frame::decode(r#"[null,null,"t","e"]"#),
            Err(ChannelError::UnexpectedShape)
        );
        assert!(matches!(
            Frame::decode(r#"[true,null,"t","e",{}]"#),
            Err(ChannelError::InvalidRef(_))
        ));
    }

    #[test]
    fn test_join_allocates_increasing_refs() {
        let mut client = SocketClient::new();
        let a = client.join(INFO_TOPIC, json!({}));
        let b = client.join(&board_topic("wallhaven"), json!({}));
        assert_eq!(a.event, EVENT_JOIN);
        assert_eq!(a.join_ref, a.msg_ref);
        assert!(b.msg_ref > a.msg_ref);
        assert!(client.is_joined(INFO_TOPIC));
    }

    #[test]
    fn test_reply_routes_to_pending_join() {
        let mut client = SocketClient::new();
        let join = client.join(INFO_TOPIC, json!({}));
        let reply = reply_frame(
            join.msg_ref.unwrap(),
            INFO_TOPIC,
            "ok",
            json!([{"name": "wallhaven", "total_pages": 5}]),
        );
        match client.classify(reply).unwrap() {
            Inbound::Reply { topic, status, response, .. } => {
                assert_eq!(topic, INFO_TOPIC);
                assert!(status.is_ok());
                assert_eq!(response[0]["name"], "wallhaven");
            }
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[test]
    fn test_error_reply_status() {
        let mut client = SocketClient::new();
        let join = client.join(INFO_TOPIC, json!({}));
        let reply = reply_frame(join.msg_ref.unwrap(), INFO_TOPIC, "error", json!({"reason": "no"}));
        match client.classify(reply).unwrap() {
            Inbound::Reply { status, .. } => assert!(!status.is_ok()),
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_ref_is_ignored() {
        let mut client = SocketClient::new();
        let reply = reply_frame(99, INFO_TOPIC, "ok", Value::Null);
        assert_eq!(client.classify(reply).unwrap(), Inbound::Ignored);
    }

    #[test]
    fn test_duplicate_reply_is_ignored() {
        let mut client = SocketClient::new();
        let join = client.join(INFO_TOPIC, json!({}));
        let reply = reply_frame(join.msg_ref.unwrap(), INFO_TOPIC, "ok", Value::Null);
        assert!(matches!(
            client.classify(reply.clone()).unwrap(),
            Inbound::Reply { .. }
        ));
        assert_eq!(client.classify(reply).unwrap(), Inbound::Ignored);
    }

    #[test]
    fn test_leave_cancels_pending_replies() {
        let mut client = SocketClient::new();
        let topic = board_topic("wallhaven");
        client.join(&topic, json!({}));
        let push = client.push(&topic, "indexing:start", json!({}));

        let (leave, cancelled) = client.leave(&topic).unwrap();
        assert_eq!(leave.event, EVENT_LEAVE);
        assert!(cancelled.contains(&push.msg_ref.unwrap()));
        assert!(!client.is_joined(&topic));

        // A late acknowledgment must not reach any handler.
        let late = reply_frame(push.msg_ref.unwrap(), &topic, "ok", Value::Null);
        assert_eq!(client.classify(late).unwrap(), Inbound::Ignored);
    }

    #[test]
    fn test_leave_unjoined_topic_is_a_no_op() {
        let mut client = SocketClient::new();
        assert!(client.leave("boards:nope").is_none());
    }

    #[test]
    fn test_push_carries_join_ref() {
        let mut client = SocketClient::new();
        let topic = board_topic("wallhaven");
        let join = client.join(&topic, json!({}));
        let push = client.push(&topic, "indexing:stop", json!({}));
        assert_eq!(push.join_ref, join.join_ref);
        assert_ne!(push.msg_ref, join.msg_ref);
    }

    #[test]
    fn test_shutdown_leaves_every_topic_in_join_order() {
        let mut client = SocketClient::new();
        client.join(INFO_TOPIC, json!({}));
        client.join(&board_topic("wallhaven"), json!({}));
        client.join(&board_topic("gelbooru"), json!({}));

        let frames = client.shutdown();
        let topics: Vec<&str> = frames.iter().map(|f| f.topic.as_str()).collect();
        assert_eq!(topics, ["boards:info", "boards:wallhaven", "boards:gelbooru"]);
        assert!(frames.iter().all(|f| f.event == EVENT_LEAVE));
        assert!(!client.is_joined(INFO_TOPIC));

        // Nothing further to leave.
        assert!(client.shutdown().is_empty());
    }

    #[test]
    fn test_server_close_drops_topic_state() {
        let mut client = SocketClient::new();
        let topic = board_topic("wallhaven");
        client.join(&topic, json!({}));
        let close = Frame {
            join_ref: None,
            msg_ref: None,
            topic: topic.clone(),
            event: EVENT_CLOSE.to_string(),
            payload: json!({}),
        };
        assert_eq!(
            client.classify(close).unwrap(),
            Inbound::Closed { topic: topic.clone() }
        );
        assert!(!client.is_joined(&topic));
    }

    #[test]
    fn test_heartbeat_frame() {
        let mut client = SocketClient::new();
        let beat = client.heartbeat();
        assert_eq!(beat.topic, HEARTBEAT_TOPIC);
        assert_eq!(beat.event, EVENT_HEARTBEAT);
        assert_eq!(beat.join_ref, None);

        let reply = reply_frame(beat.msg_ref.unwrap(), HEARTBEAT_TOPIC, "ok", json!({}));
        assert!(matches!(
            client.classify(reply).unwrap(),
            Inbound::Reply { .. }
        ));
    }

    #[test]
    fn test_push_event_passes_through() {
        let mut client = SocketClient::new();
        let frame = Frame {
            join_ref: None,
            msg_ref: None,
            topic: board_topic("wallhaven"),
            event: EVENT_COUNT_UPDATED.to_string(),
            payload: json!({"indexed_image_count": 42}),
        };
        match client.classify(frame).unwrap() {
            Inbound::Event { topic, event, payload } => {
                assert_eq!(topic, "boards:wallhaven");
                assert_eq!(event, EVENT_COUNT_UPDATED);
                assert_eq!(payload["indexed_image_count"], 42);
            }
            other => panic!("expected event, got {other:?}"),
        }
    }
}
