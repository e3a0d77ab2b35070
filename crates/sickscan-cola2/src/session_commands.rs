use bytes::BytesMut;
use sickscan_wire::codec::{write_u32_le, write_u8};
use sickscan_wire::{
    CommandKind, WireError, CLOSE_SESSION, CLOSE_SESSION_REPLY, OPEN_SESSION, OPEN_SESSION_REPLY,
};

use crate::command::{check_reply_kind, reserve_block, Reply, TelegramCommand};
use crate::error::ReplyError;

/// Client id sent when the caller does not pick one.
pub const DEFAULT_CLIENT_ID: u32 = 0xFFFF_FFFF;

/// Session timeout sent when the caller does not pick one.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u8 = 60;

/// Opens a session. The device assigns the session id in the reply header.
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    timeout_secs: u8,
    client_id: u32,
    session_id: Option<u32>,
}

impl CreateSessionCommand {
    pub fn new(timeout_secs: u8, client_id: u32) -> Self {
        Self {
            timeout_secs,
            client_id,
            session_id: None,
        }
    }

    /// Session id assigned by the device, once the reply was processed.
    pub fn session_id(&self) -> Option<u32> {
        self.session_id
    }
}

impl Default for CreateSessionCommand {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TIMEOUT_SECS, DEFAULT_CLIENT_ID)
    }
}

impl TelegramCommand for CreateSessionCommand {
    fn kind(&self) -> CommandKind {
        OPEN_SESSION
    }

    fn name(&self) -> &'static str {
        "create_session"
    }

    fn add_telegram_data(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        let block = reserve_block(buf, 5);
        let next = write_u8(block, 0, self.timeout_secs)?;
        write_u32_le(block, next, self.client_id)?;
        Ok(())
    }

    fn can_be_executed_without_session_id(&self) -> bool {
        true
    }

    fn process_reply(&mut self, reply: &Reply) -> Result<(), ReplyError> {
        check_reply_kind(reply, OPEN_SESSION_REPLY)?;
        if reply.header.session_id == 0 {
            return Err(ReplyError::Malformed(
                "open session reply without session id".to_string(),
            ));
        }
        self.session_id = Some(reply.header.session_id);
        Ok(())
    }
}

/// Ends the current session.
#[derive(Debug, Clone, Default)]
pub struct CloseSessionCommand;

impl TelegramCommand for CloseSessionCommand {
    fn kind(&self) -> CommandKind {
        CLOSE_SESSION
    }

    fn name(&self) -> &'static str {
        "close_session"
    }

    fn add_telegram_data(&self, _buf: &mut BytesMut) -> Result<(), WireError> {
        Ok(())
    }

    fn process_reply(&mut self, reply: &Reply) -> Result<(), ReplyError> {
        check_reply_kind(reply, CLOSE_SESSION_REPLY)
    }
}

#[cfg(test)]
mod tests {
    use sickscan_wire::{Telegram, TelegramHeader, ERROR_REPLY};

    use super::*;

    #[test]
    fn create_session_payload() {
        let mut buf = BytesMut::new();
        CreateSessionCommand::new(30, 0x0102_0304)
            .add_telegram_data(&mut buf)
            .unwrap();
        assert_eq!(buf.as_ref(), &[30, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn create_session_defaults() {
        let mut buf = BytesMut::new();
        let cmd = CreateSessionCommand::default();
        cmd.add_telegram_data(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[60, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(cmd.can_be_executed_without_session_id());
        assert_eq!(cmd.session_id(), None);
    }

    #[test]
    fn create_session_takes_id_from_reply_header() {
        let mut cmd = CreateSessionCommand::default();
        let reply = Telegram::new(TelegramHeader::new(0xCAFE, 1, OPEN_SESSION_REPLY), vec![]);
        cmd.process_reply(&reply).unwrap();
        assert_eq!(cmd.session_id(), Some(0xCAFE));
    }

    #[test]
    fn create_session_rejects_zero_id() {
        let mut cmd = CreateSessionCommand::default();
        let reply = Telegram::new(TelegramHeader::new(0, 1, OPEN_SESSION_REPLY), vec![]);
        assert!(matches!(
            cmd.process_reply(&reply),
            Err(ReplyError::Malformed(_))
        ));
        assert_eq!(cmd.session_id(), None);
    }

    #[test]
    fn close_session() {
        let mut cmd = CloseSessionCommand;
        let mut buf = BytesMut::new();
        cmd.add_telegram_data(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert!(!cmd.can_be_executed_without_session_id());

        let ok = Telegram::new(TelegramHeader::new(7, 2, CLOSE_SESSION_REPLY), vec![]);
        assert!(cmd.process_reply(&ok).is_ok());

        let nak = Telegram::new(TelegramHeader::new(7, 2, ERROR_REPLY), vec![0x01, 0x00]);
        assert!(matches!(
            cmd.process_reply(&nak),
            Err(ReplyError::NotAcknowledged { code: 1 })
        ));
    }
}
