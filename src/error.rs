//! Unified error handling for flowstated.
//!
//! Handler errors carry enough context to produce a wire `error` message
//! for the offending connection and a static code for metric labeling. No
//! error here is ever fatal to the process; the worst outcome of one
//! connection misbehaving is that connection's own termination.

use flowstate_proto::Envelope;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during message handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("send error: {0}")]
    Send(#[from] mpsc::error::SendError<Envelope>),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) => "room_not_found",
            Self::Send(_) => "send_error",
        }
    }

    /// Convert to a wire `error` message.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply
    /// (the connection is already gone when a send fails).
    pub fn to_error_message(&self) -> Option<Envelope> {
        match self {
            Self::RoomNotFound(_) => Some(Envelope::error("Room not found")),
            Self::Send(_) => None,
        }
    }
}

/// Result type for message handlers.
pub type HandlerResult = Result<(), HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use flowstate_proto::MessageType;

    #[test]
    fn test_handler_error_codes() {
        assert_eq!(
            HandlerError::RoomNotFound("r1".into()).error_code(),
            "room_not_found"
        );
    }

    #[test]
    fn test_room_not_found_reply() {
        let reply = HandlerError::RoomNotFound("r1".into())
            .to_error_message()
            .expect("room-not-found should produce a reply");
        assert_eq!(reply.kind, MessageType::Error);
        assert_eq!(reply.payload["error"], "Room not found");
    }

    #[test]
    fn test_send_error_has_no_reply() {
        let (tx, rx) = mpsc::channel::<Envelope>(1);
        drop(rx);
        let err = tx
            .try_send(Envelope::error("x"))
            .expect_err("send to dropped receiver must fail");
        let err = HandlerError::Send(mpsc::error::SendError(match err {
            mpsc::error::TrySendError::Closed(msg) => msg,
            mpsc::error::TrySendError::Full(msg) => msg,
        }));
        assert!(err.to_error_message().is_none());
    }
}
