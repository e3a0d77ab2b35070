use bytes::Bytes;

use crate::error::{Result, WireError};

/// An immutable byte sequence exchanged with a transport.
///
/// `length` marks how many leading bytes are valid and never exceeds the
/// backing storage. Parsers only ever see [`PacketBuffer::as_slice`], so reads
/// beyond `length` fail in the codec even if the storage is larger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketBuffer {
    bytes: Bytes,
    length: usize,
}

impl PacketBuffer {
    /// Wrap bytes whose full extent is valid.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let length = bytes.len();
        Self { bytes, length }
    }

    /// Wrap bytes of which only the first `length` are valid.
    pub fn with_length(bytes: impl Into<Bytes>, length: usize) -> Result<Self> {
        let bytes = bytes.into();
        if length > bytes.len() {
            return Err(WireError::InvalidLength {
                length,
                capacity: bytes.len(),
            });
        }
        Ok(Self { bytes, length })
    }

    /// The valid bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.length]
    }

    /// Number of valid bytes.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Size of the backing storage.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// The valid bytes as a cheaply cloneable handle.
    pub fn into_bytes(self) -> Bytes {
        self.bytes.slice(..self.length)
    }
}

impl From<Vec<u8>> for PacketBuffer {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<Bytes> for PacketBuffer {
    fn from(value: Bytes) -> Self {
        Self::new(value)
    }
}

impl AsRef<[u8]> for PacketBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
