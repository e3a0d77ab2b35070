use sickscan_wire::WireError;

/// Errors raised while decoding scan data.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A field or declared block lies outside the telegram.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// A UDP datagram that is not a scan data fragment.
    #[error("invalid datagram: {0}")]
    InvalidDatagram(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;
