use std::time::Duration;

use sickscan_transport::TransportError;
use sickscan_wire::WireError;

use crate::session::SessionState;

/// Why a reply telegram did not confirm the command.
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    /// The reply does not have the shape expected for the issued command.
    #[error("malformed reply: {0}")]
    Malformed(String),

    /// The device rejected the command.
    #[error("device rejected command (error code {code:#06x})")]
    NotAcknowledged { code: u16 },

    /// The reply payload is shorter than its layout requires.
    #[error("truncated reply: {0}")]
    Truncated(#[from] WireError),
}

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The command needs a session id and no session is established.
    #[error("command requires an established session")]
    NoSession,

    /// No correlated reply arrived, retry included.
    #[error("no reply within {0:?} (retried once)")]
    Timeout(Duration),

    /// The session was closed while the command was in flight.
    #[error("session closed while command was in flight")]
    Aborted,

    /// The operation is not allowed in the current state.
    #[error("invalid session state: expected {expected}, found {actual}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    /// No command stream is attached.
    #[error("session is not connected")]
    NotConnected,

    /// The device answered, but not with a confirmation.
    #[error(transparent)]
    Reply(#[from] ReplyError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Telegram framing or stream error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
}

impl SessionError {
    /// True when the device explicitly rejected the command.
    pub fn is_not_acknowledged(&self) -> bool {
        matches!(
            self,
            SessionError::Reply(ReplyError::NotAcknowledged { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
