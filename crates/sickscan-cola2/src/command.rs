//! The request/reply unit executed by a [`Cola2Session`](crate::Cola2Session).
//!
//! A command renders its payload and judges the reply. Framing, session id
//! and request correlation belong to the session.

use bytes::BytesMut;
use sickscan_wire::codec::read_u16_le;
use sickscan_wire::{CommandKind, Telegram, WireError, ERROR_REPLY};

use crate::error::ReplyError;

/// A decoded reply telegram as delivered to [`TelegramCommand::process_reply`].
pub type Reply = Telegram;

/// A command that can be executed on a COLA2 session.
pub trait TelegramCommand: Send {
    /// Command type and mode of the request telegram.
    fn kind(&self) -> CommandKind;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Append this command's payload to `buf`.
    fn add_telegram_data(&self, buf: &mut BytesMut) -> Result<(), WireError>;

    /// True only for commands that bootstrap a session.
    fn can_be_executed_without_session_id(&self) -> bool {
        false
    }

    /// Check the reply and take over any data it carries.
    fn process_reply(&mut self, reply: &Reply) -> Result<(), ReplyError>;
}

/// Verify the reply kind, turning a negative acknowledgement into
/// [`ReplyError::NotAcknowledged`].
pub fn check_reply_kind(reply: &Reply, expected: CommandKind) -> Result<(), ReplyError> {
    let actual = reply.header.kind;
    if actual == ERROR_REPLY {
        let code = read_u16_le(&reply.payload, 0)?;
        return Err(ReplyError::NotAcknowledged { code });
    }
    if actual != expected {
        return Err(ReplyError::Malformed(format!(
            "expected {expected} reply, got {actual}"
        )));
    }
    Ok(())
}

/// Verify that a method or variable reply echoes the requested index.
pub fn check_echoed_index(reply: &Reply, index: u16) -> Result<(), ReplyError> {
    let echoed = read_u16_le(&reply.payload, 0)?;
    if echoed != index {
        return Err(ReplyError::Malformed(format!(
            "reply for index {echoed:#06x}, expected {index:#06x}"
        )));
    }
    Ok(())
}

/// Grow `buf` by `len` zeroed bytes and return the new region.
pub(crate) fn reserve_block(buf: &mut BytesMut, len: usize) -> &mut [u8] {
    let start = buf.len();
    buf.resize(start + len, 0);
    &mut buf[start..]
}
