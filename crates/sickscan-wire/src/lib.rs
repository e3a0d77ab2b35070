//! Wire-level encoding for COLA2 safety scanners.
//!
//! - [`codec`]: little-endian integer reads/writes at explicit offsets, the
//!   single place byte order is decided
//! - [`PacketBuffer`]: immutable bytes plus a validity length, the unit
//!   exchanged with transports
//! - [`telegram`]: the COLA2 command telegram framing
//!   (STX, length, hub, NoC, session id, request id, type, mode)
//! - [`TelegramReader`] / [`TelegramWriter`]: blocking telegram I/O
//!
//! With the `async` feature, [`TelegramCodec`] plugs into `tokio_util::codec`.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod kind;
pub mod packet;
pub mod reader;
pub mod telegram;
pub mod units;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::TelegramCodec;
pub use error::{Result, WireError};
pub use kind::{
    command_name, is_reply, CommandKind, CLOSE_SESSION, CLOSE_SESSION_REPLY, ERROR_REPLY,
    METHOD_INVOCATION, METHOD_REPLY, OPEN_SESSION, OPEN_SESSION_REPLY, READ_VARIABLE,
    READ_VARIABLE_REPLY,
};
pub use packet::PacketBuffer;
pub use reader::TelegramReader;
pub use telegram::{
    decode_telegram, encode_telegram, Telegram, TelegramConfig, TelegramHeader,
    DEFAULT_MAX_TELEGRAM, HEADER_SIZE,
};
pub use units::{angle_to_degrees, degrees_to_angle, ANGLE_UNITS_PER_DEGREE};
pub use writer::TelegramWriter;
