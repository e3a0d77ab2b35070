use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpStream, UdpSocket};
use std::time::Duration;

use crate::error::{Result, TransportError};

/// A connected, ordered byte stream carrying command telegrams.
///
/// The stream is opened by the caller. A read that hits the configured read
/// timeout must surface as an `io::Error` of kind `WouldBlock` or `TimedOut`
/// so the session can poll for cancellation between reads.
pub trait CommandStream: Read + Write + Send {
    /// Set read timeout on the underlying stream.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()>;

    /// Set write timeout on the underlying stream.
    fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()>;

    /// Shut down both directions of the stream.
    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

impl CommandStream for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        TcpStream::set_read_timeout(self, timeout).map_err(Into::into)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        TcpStream::set_write_timeout(self, timeout).map_err(Into::into)
    }

    fn shutdown(&self) -> Result<()> {
        match TcpStream::shutdown(self, std::net::Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(unix)]
impl CommandStream for std::os::unix::net::UnixStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        std::os::unix::net::UnixStream::set_read_timeout(self, timeout).map_err(Into::into)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        std::os::unix::net::UnixStream::set_write_timeout(self, timeout).map_err(Into::into)
    }

    fn shutdown(&self) -> Result<()> {
        match std::os::unix::net::UnixStream::shutdown(self, std::net::Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl<T: CommandStream + ?Sized> CommandStream for Box<T> {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_read_timeout(timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_write_timeout(timeout)
    }

    fn shutdown(&self) -> Result<()> {
        (**self).shutdown()
    }
}

/// A receiver of whole datagrams carrying scan data.
pub trait DatagramSource: Send {
    /// Receive the next datagram into `buf`, returning its length.
    ///
    /// An elapsed read timeout is reported as an I/O error for which
    /// [`TransportError::is_timeout`] returns true.
    fn recv_datagram(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Set read timeout used by [`DatagramSource::recv_datagram`].
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;
}

impl DatagramSource for UdpSocket {
    fn recv_datagram(&mut self, buf: &mut [u8]) -> Result<usize> {
        let (len, _from) = self.recv_from(buf)?;
        Ok(len)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        UdpSocket::set_read_timeout(self, timeout).map_err(Into::into)
    }
}

/// Datagram source replaying pre-recorded datagrams.
///
/// Used for offline decoding and tests. Returns [`TransportError::Shutdown`]
/// once every datagram has been handed out.
#[derive(Debug, Default)]
pub struct ReplaySource {
    datagrams: VecDeque<Vec<u8>>,
}

impl ReplaySource {
    /// Create a replay source over the given datagrams.
    pub fn new(datagrams: Vec<Vec<u8>>) -> Self {
        Self {
            datagrams: datagrams.into(),
        }
    }

    /// Number of datagrams not yet received.
    pub fn remaining(&self) -> usize {
        self.datagrams.len()
    }

    /// True while datagrams are left.
    pub fn has_more(&self) -> bool {
        !self.datagrams.is_empty()
    }
}

impl DatagramSource for ReplaySource {
    fn recv_datagram(&mut self, buf: &mut [u8]) -> Result<usize> {
        let datagram = self.datagrams.pop_front().ok_or(TransportError::Shutdown)?;
        // Oversized datagrams are truncated like a real socket would.
        let len = datagram.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram[..len]);
        Ok(len)
    }

    fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }
}
