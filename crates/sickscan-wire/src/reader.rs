use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use sickscan_transport::{CommandStream, TransportError};

use crate::error::{Result, WireError};
use crate::telegram::{decode_telegram, Telegram, TelegramConfig};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads complete telegrams from any `Read` stream.
///
/// Handles partial reads internally. Bytes of a telegram received before a
/// read timeout are kept, so a later call resumes where the last one stopped.
pub struct TelegramReader<T> {
    inner: T,
    buf: BytesMut,
    config: TelegramConfig,
}

impl<T: Read> TelegramReader<T> {
    /// Create a new telegram reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, TelegramConfig::default())
    }

    /// Create a new telegram reader with explicit configuration.
    pub fn with_config(inner: T, config: TelegramConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete telegram (blocking).
    ///
    /// Returns `Err(WireError::ConnectionClosed)` when EOF is reached and
    /// `Err(WireError::Io)` with kind `WouldBlock`/`TimedOut` when the stream's
    /// read timeout elapses.
    pub fn read_telegram(&mut self) -> Result<Telegram> {
        loop {
            if let Some(telegram) = self.poll_telegram()? {
                return Ok(telegram);
            }
        }
    }

    /// Issue at most one read and return a telegram if one is complete.
    ///
    /// `Ok(None)` means bytes arrived but the telegram is still incomplete.
    /// Errors are the same as for [`TelegramReader::read_telegram`].
    pub fn poll_telegram(&mut self) -> Result<Option<Telegram>> {
        if let Some(telegram) = decode_telegram(&mut self.buf, self.config.max_telegram_size)? {
            return Ok(Some(telegram));
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        };

        if read == 0 {
            return Err(WireError::ConnectionClosed);
        }

        self.buf.extend_from_slice(&chunk[..read]);
        decode_telegram(&mut self.buf, self.config.max_telegram_size)
    }

    /// Bytes of an incomplete telegram held in the buffer.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current telegram reader configuration.
    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }
}

impl<T: CommandStream> TelegramReader<T> {
    /// Create a telegram reader for a command stream and apply the read timeout from config.
    pub fn with_config_stream(inner: T, config: TelegramConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_wire_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_wire_error(err: TransportError) -> WireError {
    match err {
        TransportError::Io(io) => WireError::Io(io),
        TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => {
            WireError::Io(source)
        }
        TransportError::Shutdown => WireError::ConnectionClosed,
    }
}
