//! Transport boundary for COLA2 safety scanners.
//!
//! The protocol core never opens sockets. It talks to:
//! - a [`CommandStream`]: an ordered byte stream for command telegrams (TCP)
//! - a [`DatagramSource`]: a datagram receiver for scan data (UDP)
//!
//! Implementations are provided for the `std::net` socket types, plus
//! [`ReplaySource`] for feeding recorded datagrams. The [`net`] helpers
//! open sockets for applications that want them.

pub mod error;
pub mod net;
pub mod traits;

pub use error::{Result, TransportError};
pub use net::{bind_udp, connect_tcp};
pub use traits::{CommandStream, DatagramSource, ReplaySource};
