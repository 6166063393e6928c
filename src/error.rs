//! Error types for the channel layer and session replay.

use thiserror::Error;

/// Errors produced while encoding, decoding, or routing channel frames.
#[derive(Debug, Error, PartialEq)]
pub enum ChannelError {
    /// The inbound text was not valid JSON.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The frame was valid JSON but not a five-element message array.
    #[error("unexpected frame shape: expected [join_ref, ref, topic, event, payload]")]
    UnexpectedShape,

    /// A ref slot held something other than null or a decimal string.
    #[error("invalid ref value: {0}")]
    InvalidRef(String),

    /// A reply payload was missing its status or response fields.
    #[error("invalid reply payload: {0}")]
    InvalidReply(String),

    /// A payload did not deserialize into the expected type.
    #[error("invalid payload for {event}: {reason}")]
    InvalidPayload { event: String, reason: String },
}

/// Errors produced while replaying a recorded session log.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// A log line was not valid JSON or not a known line shape.
    #[error("line {line}: {reason}")]
    BadLine { line: usize, reason: String },

    /// An event referenced a board that never appeared in a board list.
    #[error("line {line}: unknown board '{board}'")]
    UnknownBoard { line: usize, board: String },

    /// The log contained events but no leading board list.
    #[error("session log has no board list")]
    MissingBoardList,
}
