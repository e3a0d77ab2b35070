#![cfg(feature = "cli")]

mod common;

use std::net::TcpListener;
use std::process::Command;

use common::unique_temp_dir;

#[test]
fn decode_invalid_file_returns_60() {
    let dir = unique_temp_dir("decode-invalid");
    let path = dir.join("short.bin");
    std::fs::write(&path, [0u8; 10]).expect("fixture should be writable");

    let output = Command::new(env!("CARGO_BIN_EXE_sickscan"))
        .arg("decode")
        .arg(&path)
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid scan telegram"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_missing_file_fails() {
    let dir = unique_temp_dir("decode-missing");
    let output = Command::new(env!("CARGO_BIN_EXE_sickscan"))
        .arg("decode")
        .arg(dir.join("absent.bin"))
        .output()
        .expect("decode should run");

    assert_eq!(output.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn info_without_device_returns_failure() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        listener.local_addr().expect("listener addr").to_string()
    };

    let output = Command::new(env!("CARGO_BIN_EXE_sickscan"))
        .arg("info")
        .arg(&addr)
        .arg("--timeout")
        .arg("1s")
        .output()
        .expect("info should run");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn info_silent_device_returns_124() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let addr = listener.local_addr().expect("local addr").to_string();
    let holder = std::thread::spawn(move || {
        let (stream, _) = listener.accept().expect("client should connect");
        std::thread::sleep(std::time::Duration::from_secs(2));
        drop(stream);
    });

    let output = Command::new(env!("CARGO_BIN_EXE_sickscan"))
        .arg("info")
        .arg(&addr)
        .arg("--timeout")
        .arg("200ms")
        .output()
        .expect("info should run");

    assert_eq!(output.status.code(), Some(124));
    let _ = holder.join();
}

#[test]
fn unknown_feature_is_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_sickscan"))
        .arg("configure")
        .arg("127.0.0.1:2122")
        .arg("--features")
        .arg("everything")
        .output()
        .expect("configure should run");

    assert_eq!(output.status.code(), Some(2));
}
