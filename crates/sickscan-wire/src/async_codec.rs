//! `tokio_util::codec` adapter for COLA2 telegrams.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::WireError;
use crate::telegram::{decode_telegram, encode_telegram, Telegram, DEFAULT_MAX_TELEGRAM};

/// Codec for framed COLA2 telegrams over an async byte stream.
#[derive(Debug, Clone)]
pub struct TelegramCodec {
    max_telegram_size: usize,
}

impl TelegramCodec {
    pub fn new(max_telegram_size: usize) -> Self {
        Self { max_telegram_size }
    }
}

impl Default for TelegramCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TELEGRAM)
    }
}

impl Decoder for TelegramCodec {
    type Item = Telegram;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_telegram(src, self.max_telegram_size)
    }
}

impl Encoder<Telegram> for TelegramCodec {
    type Error = WireError;

    fn encode(&mut self, item: Telegram, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.wire_size() > self.max_telegram_size {
            return Err(WireError::TelegramTooLarge {
                size: item.wire_size(),
                max: self.max_telegram_size,
            });
        }
        encode_telegram(&item.header, item.payload.as_ref(), dst)
    }
}
