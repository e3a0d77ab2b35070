use bytes::{Buf, Bytes, BytesMut};

use crate::codec::{
    read_u16_le, read_u32_le, read_u8, write_slice, write_u16_le, write_u32_le, write_u8,
};
use crate::error::{Result, WireError};
use crate::kind::CommandKind;

/// Telegram header: STX (4) + length (4) + hub (1) + NoC (1) + session (4)
/// + request (2) + type (1) + mode (1) = 18 bytes.
pub const HEADER_SIZE: usize = 18;

/// Start-of-telegram marker.
pub const STX: [u8; 4] = [0x02, 0x02, 0x02, 0x02];

/// Bytes preceding the first byte counted by the length field.
pub const PREFIX_SIZE: usize = 8;

/// Default maximum telegram size: 64 KiB.
pub const DEFAULT_MAX_TELEGRAM: usize = 64 * 1024;

/// Fixed fields of a COLA2 command telegram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelegramHeader {
    pub hub_counter: u8,
    pub noc: u8,
    /// Zero until the device has assigned a session.
    pub session_id: u32,
    pub request_id: u16,
    pub kind: CommandKind,
}

impl TelegramHeader {
    pub fn new(session_id: u32, request_id: u16, kind: CommandKind) -> Self {
        Self {
            hub_counter: 0,
            noc: 0,
            session_id,
            request_id,
            kind,
        }
    }
}

/// A complete command or reply telegram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    pub header: TelegramHeader,
    /// Command specific data following the header.
    pub payload: Bytes,
}

impl Telegram {
    pub fn new(header: TelegramHeader, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            payload: payload.into(),
        }
    }

    /// The total wire size of this telegram (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a telegram into the wire format.
///
/// Wire format (integers little-endian):
/// ```text
/// ┌──────────┬──────────┬─────┬─────┬───────────┬──────────┬──────┬──────┬─────────┐
/// │ STX (4B) │ Len (4B) │ Hub │ NoC │ Session   │ Request  │ Type │ Mode │ Payload │
/// │ 02020202 │ rest     │ 1B  │ 1B  │ ID (4B)   │ ID (2B)  │ 1B   │ 1B   │         │
/// └──────────┴──────────┴─────┴─────┴───────────┴──────────┴──────┴──────┴─────────┘
/// ```
/// `Len` counts every byte after itself.
pub fn encode_telegram(header: &TelegramHeader, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let length = HEADER_SIZE - PREFIX_SIZE + payload.len();
    if length > u32::MAX as usize {
        return Err(WireError::TelegramTooLarge {
            size: PREFIX_SIZE + length,
            max: u32::MAX as usize,
        });
    }

    let mut fixed = [0u8; HEADER_SIZE];
    let next = write_slice(&mut fixed, 0, &STX)?;
    let next = write_u32_le(&mut fixed, next, length as u32)?;
    let next = write_u8(&mut fixed, next, header.hub_counter)?;
    let next = write_u8(&mut fixed, next, header.noc)?;
    let next = write_u32_le(&mut fixed, next, header.session_id)?;
    let next = write_u16_le(&mut fixed, next, header.request_id)?;
    let next = write_u8(&mut fixed, next, header.kind.command_type)?;
    write_u8(&mut fixed, next, header.kind.mode)?;

    dst.reserve(HEADER_SIZE + payload.len());
    dst.extend_from_slice(&fixed);
    dst.extend_from_slice(payload);
    Ok(())
}

/// Decode a telegram from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete telegram yet.
/// On success, consumes the telegram bytes from the buffer.
pub fn decode_telegram(src: &mut BytesMut, max_telegram: usize) -> Result<Option<Telegram>> {
    if src.len() < PREFIX_SIZE {
        return Ok(None);
    }

    if src[..STX.len()] != STX {
        return Err(WireError::InvalidStx);
    }

    let length = read_u32_le(src, 4)? as usize;
    if length < HEADER_SIZE - PREFIX_SIZE {
        return Err(WireError::TelegramTooShort(length));
    }

    let total = PREFIX_SIZE.saturating_add(length);
    if total > max_telegram {
        return Err(WireError::TelegramTooLarge {
            size: total,
            max: max_telegram,
        });
    }

    if src.len() < total {
        return Ok(None);
    }

    let header = decode_header(src)?;
    src.advance(HEADER_SIZE);
    let payload = src.split_to(total - HEADER_SIZE).freeze();

    Ok(Some(Telegram { header, payload }))
}

fn decode_header(buf: &[u8]) -> Result<TelegramHeader> {
    Ok(TelegramHeader {
        hub_counter: read_u8(buf, 8)?,
        noc: read_u8(buf, 9)?,
        session_id: read_u32_le(buf, 10)?,
        request_id: read_u16_le(buf, 14)?,
        kind: CommandKind::new(read_u8(buf, 16)?, read_u8(buf, 17)?),
    })
}

/// Configuration for telegram reading and writing.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Maximum telegram size in bytes, header included. Default: 64 KiB.
    pub max_telegram_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            max_telegram_size: DEFAULT_MAX_TELEGRAM,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
