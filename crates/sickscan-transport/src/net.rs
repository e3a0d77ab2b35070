use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Connect to a device command port (blocking, bounded by `timeout`).
///
/// Every resolved address is tried in turn; the last failure is returned.
pub fn connect_tcp(addr: &str, timeout: Duration) -> Result<TcpStream> {
    let candidates: Vec<SocketAddr> = addr
        .to_socket_addrs()
        .map_err(|source| TransportError::Connect {
            addr: addr.to_string(),
            source,
        })?
        .collect();

    let mut last_err = std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "address resolved to nothing",
    );

    for candidate in candidates {
        match TcpStream::connect_timeout(&candidate, timeout) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                info!(%candidate, "connected to device command port");
                return Ok(stream);
            }
            Err(err) => {
                debug!(%candidate, error = %err, "connect attempt failed");
                last_err = err;
            }
        }
    }

    Err(TransportError::Connect {
        addr: addr.to_string(),
        source: last_err,
    })
}

/// Bind a UDP socket for receiving scan data.
pub fn bind_udp(addr: &str) -> Result<UdpSocket> {
    let socket = UdpSocket::bind(addr).map_err(|source| TransportError::Bind {
        addr: addr.to_string(),
        source,
    })?;
    info!(addr = %addr, "listening for scan datagrams");
    Ok(socket)
}
