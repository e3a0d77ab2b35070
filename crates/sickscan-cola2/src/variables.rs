//! Variable reads.
//!
//! Request payload is the `u16` variable index; the reply echoes the index
//! followed by the value.

use bytes::BytesMut;
use sickscan_wire::codec::{read_slice, read_u32_le, write_u16_le};
use sickscan_wire::{CommandKind, WireError, READ_VARIABLE, READ_VARIABLE_REPLY};

use crate::command::{check_echoed_index, check_reply_kind, reserve_block, Reply, TelegramCommand};
use crate::error::ReplyError;

pub const DEVICE_NAME_INDEX: u16 = 0x0011;
pub const SERIAL_NUMBER_INDEX: u16 = 0x000E;

fn add_index(buf: &mut BytesMut, index: u16) -> Result<(), WireError> {
    write_u16_le(reserve_block(buf, 2), 0, index)?;
    Ok(())
}

fn check_variable_reply(reply: &Reply, index: u16) -> Result<(), ReplyError> {
    check_reply_kind(reply, READ_VARIABLE_REPLY)?;
    check_echoed_index(reply, index)
}

/// Reads the user-assigned device name.
#[derive(Debug, Clone, Default)]
pub struct DeviceNameVariableCommand {
    name: Option<String>,
}

impl DeviceNameVariableCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn into_device_name(self) -> Option<String> {
        self.name
    }
}

impl TelegramCommand for DeviceNameVariableCommand {
    fn kind(&self) -> CommandKind {
        READ_VARIABLE
    }

    fn name(&self) -> &'static str {
        "device_name"
    }

    fn add_telegram_data(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        add_index(buf, DEVICE_NAME_INDEX)
    }

    fn process_reply(&mut self, reply: &Reply) -> Result<(), ReplyError> {
        check_variable_reply(reply, DEVICE_NAME_INDEX)?;
        let len = read_u32_le(&reply.payload, 2)? as usize;
        let raw = read_slice(&reply.payload, 6, len)?;
        let name = std::str::from_utf8(raw)
            .map_err(|_| ReplyError::Malformed("device name is not ASCII".to_string()))?;
        self.name = Some(name.trim_end_matches('\0').to_string());
        Ok(())
    }
}

/// Reads the device serial number.
#[derive(Debug, Clone, Default)]
pub struct SerialNumberVariableCommand {
    serial: Option<u32>,
}

impl SerialNumberVariableCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serial_number(&self) -> Option<u32> {
        self.serial
    }
}

impl TelegramCommand for SerialNumberVariableCommand {
    fn kind(&self) -> CommandKind {
        READ_VARIABLE
    }

    fn name(&self) -> &'static str {
        "serial_number"
    }

    fn add_telegram_data(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        add_index(buf, SERIAL_NUMBER_INDEX)
    }

    fn process_reply(&mut self, reply: &Reply) -> Result<(), ReplyError> {
        check_variable_reply(reply, SERIAL_NUMBER_INDEX)?;
        self.serial = Some(read_u32_le(&reply.payload, 2)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sickscan_wire::{Telegram, TelegramHeader};

    use super::*;

    fn variable_reply(payload: Vec<u8>) -> Reply {
        Telegram::new(TelegramHeader::new(3, 9, READ_VARIABLE_REPLY), payload)
    }

    #[test]
    fn request_payload_is_index() {
        let mut buf = BytesMut::new();
        DeviceNameVariableCommand::new()
            .add_telegram_data(&mut buf)
            .unwrap();
        assert_eq!(buf.as_ref(), &[0x11, 0x00]);

        buf.clear();
        SerialNumberVariableCommand::new()
            .add_telegram_data(&mut buf)
            .unwrap();
        assert_eq!(buf.as_ref(), &[0x0E, 0x00]);
    }

    #[test]
    fn device_name_reply() {
        let mut payload = vec![0x11, 0x00, 6, 0, 0, 0];
        payload.extend_from_slice(b"nano\0\0");
        let mut cmd = DeviceNameVariableCommand::new();
        cmd.process_reply(&variable_reply(payload)).unwrap();
        assert_eq!(cmd.device_name(), Some("nano"));
    }

    #[test]
    fn device_name_length_beyond_payload_is_truncated() {
        let mut payload = vec![0x11, 0x00, 40, 0, 0, 0];
        payload.extend_from_slice(b"short");
        let mut cmd = DeviceNameVariableCommand::new();
        assert!(matches!(
            cmd.process_reply(&variable_reply(payload)),
            Err(ReplyError::Truncated(WireError::BufferUnderrun { .. }))
        ));
        assert_eq!(cmd.device_name(), None);
    }

    #[test]
    fn serial_number_reply() {
        let mut cmd = SerialNumberVariableCommand::new();
        cmd.process_reply(&variable_reply(vec![0x0E, 0x00, 0x15, 0xCD, 0x5B, 0x07]))
            .unwrap();
        assert_eq!(cmd.serial_number(), Some(123_456_789));
    }

    #[test]
    fn serial_number_reply_for_other_variable_is_malformed() {
        let mut cmd = SerialNumberVariableCommand::new();
        assert!(matches!(
            cmd.process_reply(&variable_reply(vec![0x11, 0x00, 0, 0, 0, 0])),
            Err(ReplyError::Malformed(_))
        ));
    }
}
