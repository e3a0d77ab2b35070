use std::io::ErrorKind;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the stream or socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport has been shut down or a replay source is exhausted.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// True when the error is a read timeout rather than a failure.
    ///
    /// Sockets report an elapsed read timeout as `WouldBlock` on unix and
    /// `TimedOut` on windows.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::Io(err)
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
