use bytes::BytesMut;
use sickscan_wire::codec::{write_i32_le, write_u16_le, write_u32_le, write_u8};
use sickscan_wire::{CommandKind, WireError, METHOD_INVOCATION, METHOD_REPLY};

use crate::command::{check_echoed_index, check_reply_kind, reserve_block, Reply, TelegramCommand};
use crate::error::ReplyError;
use crate::settings::CommSettings;

/// Method index of the change-communication-settings call.
pub const CHANGE_COMM_SETTINGS_INDEX: u16 = 0x00B0;

/// Size of the parameter block following the method index.
pub const COMM_SETTINGS_BLOCK_SIZE: usize = 28;

// Offsets inside the parameter block.
const CHANNEL: usize = 0;
const ENABLED: usize = 4;
const INTERFACE_TYPE: usize = 5;
const HOST_IP: usize = 8;
const HOST_PORT: usize = 12;
const FREQUENCY: usize = 14;
const START_ANGLE: usize = 16;
const END_ANGLE: usize = 20;
const FEATURES: usize = 24;

/// Tells the device where and what to publish.
///
/// Payload: `u16` method index, then a 28-byte parameter block. Unused
/// bytes in the block are zero.
#[derive(Debug, Clone)]
pub struct ChangeCommSettingsCommand {
    settings: CommSettings,
}

impl ChangeCommSettingsCommand {
    pub fn new(settings: CommSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CommSettings {
        &self.settings
    }
}

impl TelegramCommand for ChangeCommSettingsCommand {
    fn kind(&self) -> CommandKind {
        METHOD_INVOCATION
    }

    fn name(&self) -> &'static str {
        "change_comm_settings"
    }

    fn add_telegram_data(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        let s = &self.settings;
        let payload = reserve_block(buf, 2 + COMM_SETTINGS_BLOCK_SIZE);
        let next = write_u16_le(payload, 0, CHANGE_COMM_SETTINGS_INDEX)?;

        let block = &mut payload[next..];
        write_u8(block, CHANNEL, s.channel)?;
        write_u8(block, ENABLED, u8::from(s.enabled))?;
        write_u8(block, INTERFACE_TYPE, s.interface_type as u8)?;
        write_u32_le(block, HOST_IP, u32::from(s.host_ip))?;
        write_u16_le(block, HOST_PORT, s.host_udp_port)?;
        write_u16_le(block, FREQUENCY, s.publishing_frequency)?;
        write_i32_le(block, START_ANGLE, s.start_angle)?;
        write_i32_le(block, END_ANGLE, s.end_angle)?;
        write_u16_le(block, FEATURES, s.features.bits())?;
        Ok(())
    }

    fn process_reply(&mut self, reply: &Reply) -> Result<(), ReplyError> {
        check_reply_kind(reply, METHOD_REPLY)?;
        check_echoed_index(reply, CHANGE_COMM_SETTINGS_INDEX)
    }
}
