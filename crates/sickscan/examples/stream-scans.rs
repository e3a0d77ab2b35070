//! Configure a scanner and print a summary of each scan it publishes.
//!
//! Run with:
//!   cargo run --example stream-scans -- <device:2122> <host-ip> [host-port]

use std::net::Ipv4Addr;

use sickscan::cola2::{connect, CommSettings, Features, SessionConfig};
use sickscan::transport::bind_udp;
use sickscan::{ReceiverConfig, ScanReceiver};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let device = args.next().ok_or("usage: stream-scans <device> <host-ip> [port]")?;
    let host_ip: Ipv4Addr = args.next().ok_or("missing host ip")?.parse()?;
    let host_port: u16 = args.next().map(|p| p.parse::<u16>()).transpose()?.unwrap_or(6060);

    // Bind before configuring so no scan is lost.
    let socket = bind_udp(&format!("0.0.0.0:{host_port}"))?;
    let receiver = ScanReceiver::spawn(socket, ReceiverConfig::default())?;

    let session = connect(&device, SessionConfig::default())?;
    eprintln!("[client] connected to {}", session.device_name()?);
    session.change_comm_settings(&CommSettings {
        host_ip,
        host_udp_port: host_port,
        features: Features::ALL,
        ..CommSettings::default()
    })?;
    session.close()?;

    for data in receiver.iter().take(20) {
        let nearest = data
            .measurement_data
            .beams
            .iter()
            .filter(|beam| beam.is_valid())
            .min_by_key(|beam| beam.distance);
        match nearest {
            Some(beam) => eprintln!(
                "[scan {}] {} beams, nearest {} mm at {:.2}°",
                data.header.scan_number,
                data.measurement_data.number_of_beams(),
                beam.distance,
                beam.angle
            ),
            None => eprintln!("[scan {}] no valid beams", data.header.scan_number),
        }
    }

    let stats = receiver.stop();
    eprintln!("[client] {} datagrams, {} malformed", stats.datagrams, stats.malformed);
    Ok(())
}
