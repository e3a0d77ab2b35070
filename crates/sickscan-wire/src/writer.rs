use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use sickscan_transport::CommandStream;

use crate::error::{Result, WireError};
use crate::reader::transport_to_wire_error;
use crate::telegram::{encode_telegram, Telegram, TelegramConfig, TelegramHeader, HEADER_SIZE};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes complete telegrams to any `Write` stream.
pub struct TelegramWriter<T> {
    inner: T,
    buf: BytesMut,
    config: TelegramConfig,
}

impl<T: Write> TelegramWriter<T> {
    /// Create a new telegram writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, TelegramConfig::default())
    }

    /// Create a new telegram writer with explicit configuration.
    pub fn with_config(inner: T, config: TelegramConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete telegram (blocking).
    pub fn write_telegram(&mut self, telegram: &Telegram) -> Result<()> {
        self.send(&telegram.header, telegram.payload.as_ref())
    }

    /// Frame and send a payload.
    pub fn send(&mut self, header: &TelegramHeader, payload: &[u8]) -> Result<()> {
        let size = HEADER_SIZE + payload.len();
        if size > self.config.max_telegram_size {
            return Err(WireError::TelegramTooLarge {
                size,
                max: self.config.max_telegram_size,
            });
        }

        self.buf.clear();
        encode_telegram(header, payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(WireError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current telegram writer configuration.
    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }
}

impl<T: CommandStream> TelegramWriter<T> {
    /// Create a telegram writer for a command stream and apply the write timeout from config.
    pub fn with_config_stream(inner: T, config: TelegramConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_wire_error)?;
        Ok(Self::with_config(inner, config))
    }
}
