#![cfg(feature = "cli")]

mod common;

use std::net::{Ipv4Addr, UdpSocket};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use sickscan_data::testing::{fragment, ScanTelegramBuilder};
use sickscan_wire::{METHOD_INVOCATION, READ_VARIABLE};

use common::{spawn_device, unique_temp_dir, DEVICE_NAME, SERIAL_NUMBER, SESSION_ID};

#[test]
fn info_prints_device_identity() {
    let (addr, device) = spawn_device();

    let output = Command::new(env!("CARGO_BIN_EXE_sickscan"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("info")
        .arg(&addr)
        .output()
        .expect("info should run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("info should emit json");
    assert_eq!(payload["device_name"], DEVICE_NAME);
    assert_eq!(payload["serial_number"], SERIAL_NUMBER);
    assert_eq!(payload["session_id"], SESSION_ID);

    let requests = device.join().expect("device thread");
    let reads = requests
        .iter()
        .filter(|r| r.header.kind == READ_VARIABLE)
        .count();
    assert_eq!(reads, 2);
}

#[test]
fn configure_sends_settings_from_flags() {
    let (addr, device) = spawn_device();

    let output = Command::new(env!("CARGO_BIN_EXE_sickscan"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("configure")
        .arg(&addr)
        .arg("--host-ip")
        .arg("192.168.1.2")
        .arg("--host-port")
        .arg("7000")
        .arg("--features")
        .arg("all")
        .output()
        .expect("configure should run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("configure should emit json");
    assert_eq!(payload["settings"]["host_udp_port"], 7000);
    assert_eq!(payload["settings"]["features"], 0x1F);

    let requests = device.join().expect("device thread");
    let method = requests
        .iter()
        .find(|r| r.header.kind == METHOD_INVOCATION)
        .expect("settings should be sent");
    let body = &method.payload;
    assert_eq!(&body[..2], &0x00B0u16.to_le_bytes());
    let block = &body[2..];
    assert_eq!(
        &block[8..12],
        &u32::from(Ipv4Addr::new(192, 168, 1, 2)).to_le_bytes()
    );
    assert_eq!(&block[12..14], &7000u16.to_le_bytes());
    assert_eq!(&block[24..26], &0x1Fu16.to_le_bytes());
}

#[test]
fn decode_prints_scan_json() {
    let dir = unique_temp_dir("decode");
    let path = dir.join("scan.bin");
    let telegram = ScanTelegramBuilder::new(321)
        .system_state()
        .derived(1, -47.5, 0.25)
        .beams(&[(1200, 40, 1), (1300, 41, 1)])
        .build();
    std::fs::write(&path, telegram).expect("fixture should be writable");

    let output = Command::new(env!("CARGO_BIN_EXE_sickscan"))
        .arg("--format")
        .arg("json")
        .arg("decode")
        .arg(&path)
        .output()
        .expect("decode should run");

    assert!(output.status.success());
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("decode should emit json");
    assert_eq!(payload["header"]["scan_number"], 321);
    assert_eq!(payload["measurement_data"]["beams"][1]["distance"], 1300);
    assert_eq!(payload["measurement_data"]["beams"][0]["angle"], -47.5);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_accepts_single_datagram() {
    let dir = unique_temp_dir("decode-datagram");
    let path = dir.join("scan.udp");
    let telegram = ScanTelegramBuilder::new(8).derived(1, 0.0, 1.0).build();
    let datagram = fragment(&telegram, 1, telegram.len()).remove(0);
    std::fs::write(&path, datagram).expect("fixture should be writable");

    let output = Command::new(env!("CARGO_BIN_EXE_sickscan"))
        .arg("--format")
        .arg("raw")
        .arg("decode")
        .arg(&path)
        .output()
        .expect("decode should run");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "\n");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn scan_exits_after_count() {
    let port = {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("socket should bind");
        socket.local_addr().expect("socket addr").port()
    };
    let target = format!("127.0.0.1:{port}");

    let mut child = Command::new(env!("CARGO_BIN_EXE_sickscan"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("pretty")
        .arg("scan")
        .arg(&target)
        .arg("--count")
        .arg("1")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("scan should start");

    let telegram = ScanTelegramBuilder::new(55)
        .derived(1, 0.0, 1.0)
        .beams(&[(10, 0, 1)])
        .build();
    let datagrams = fragment(&telegram, 1, 40);
    let sender = UdpSocket::bind("127.0.0.1:0").expect("sender should bind");

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().expect("child status") {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            panic!("scan did not exit");
        }
        for datagram in &datagrams {
            let _ = sender.send_to(datagram, &target);
        }
        thread::sleep(Duration::from_millis(50));
    };

    assert!(status.success());
    let output = child.wait_with_output().expect("scan output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("scan=55 "), "stdout: {stdout}");
}

#[test]
fn version_reports_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_sickscan"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("sickscan {}", env!("CARGO_PKG_VERSION")));
}
