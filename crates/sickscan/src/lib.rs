//! Host-side driver for COLA2 safety laser scanners.
//!
//! The scanner is configured over a TCP command channel and streams scan
//! data over UDP. This crate ties the layers together:
//!
//! - [`transport`]: stream and datagram abstractions, socket helpers
//! - [`wire`]: little-endian codec, packet buffers, COLA2 telegram framing
//! - [`cola2`]: session state machine and commands (behind `session` feature)
//! - [`data`]: scan telegram parsing and UDP reassembly
//! - [`receiver`]: background thread turning datagrams into parsed scans
//! - [`async_receiver`]: the same on tokio (behind `async` feature)

/// Re-export transport types.
pub mod transport {
    pub use sickscan_transport::*;
}

/// Re-export wire types.
pub mod wire {
    pub use sickscan_wire::*;
}

/// Re-export scan data types.
pub mod data {
    pub use sickscan_data::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod cola2 {
    pub use sickscan_cola2::*;
}

#[cfg(feature = "async")]
pub mod async_receiver;
pub mod receiver;

pub use receiver::{ReceiverConfig, ReceiverStats, ScanAssembler, ScanReceiver};
