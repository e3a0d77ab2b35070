/// Errors raised by the wire codec and telegram framing.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A read or write would cross the end of the buffer.
    #[error("buffer underrun: {len} bytes at offset {offset} exceed {available} available")]
    BufferUnderrun {
        offset: usize,
        len: usize,
        available: usize,
    },

    /// A packet length marker larger than the backing storage.
    #[error("invalid packet length {length} (capacity {capacity})")]
    InvalidLength { length: usize, capacity: usize },

    /// The telegram does not start with the COLA2 STX marker.
    #[error("invalid telegram STX (expected 0x02020202)")]
    InvalidStx,

    /// The declared telegram length is shorter than the fixed header.
    #[error("telegram length {0} shorter than header")]
    TelegramTooShort(usize),

    /// The telegram exceeds the configured maximum size.
    #[error("telegram too large ({size} bytes, max {max})")]
    TelegramTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing telegrams.
    #[error("telegram I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete telegram was received.
    #[error("connection closed (incomplete telegram)")]
    ConnectionClosed,
}

impl WireError {
    /// True when the error is an elapsed read timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            WireError::Io(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut
        )
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
