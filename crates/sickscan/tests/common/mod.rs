#![allow(dead_code)]

use std::net::TcpListener;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use sickscan_wire::{
    Telegram, TelegramHeader, TelegramReader, TelegramWriter, CLOSE_SESSION,
    CLOSE_SESSION_REPLY, METHOD_INVOCATION, METHOD_REPLY, OPEN_SESSION, OPEN_SESSION_REPLY,
    READ_VARIABLE, READ_VARIABLE_REPLY,
};

pub const SESSION_ID: u32 = 0x1234_5678;
pub const DEVICE_NAME: &str = "microScan3 Pro I/O";
pub const SERIAL_NUMBER: u32 = 21_340_017;

pub fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "sickscan-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

/// Accept one connection and answer like a device until the session is
/// closed. Returns every request telegram received.
pub fn spawn_device() -> (String, JoinHandle<Vec<Telegram>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let addr = listener.local_addr().expect("local addr").to_string();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("client should connect");
        let mut reader = TelegramReader::new(stream.try_clone().expect("clone stream"));
        let mut writer = TelegramWriter::new(stream);
        let mut requests = Vec::new();

        loop {
            let Ok(request) = reader.read_telegram() else {
                break;
            };
            let header = request.header;
            let (kind, payload) = match header.kind {
                OPEN_SESSION => (OPEN_SESSION_REPLY, Vec::new()),
                CLOSE_SESSION => (CLOSE_SESSION_REPLY, Vec::new()),
                METHOD_INVOCATION => (METHOD_REPLY, request.payload[..2].to_vec()),
                READ_VARIABLE => (READ_VARIABLE_REPLY, variable_reply(&request.payload)),
                other => panic!("unexpected request {other}"),
            };
            let session_id = if header.kind == OPEN_SESSION {
                SESSION_ID
            } else {
                header.session_id
            };
            writer
                .write_telegram(&Telegram::new(
                    TelegramHeader::new(session_id, header.request_id, kind),
                    payload,
                ))
                .expect("reply should be written");

            let closing = header.kind == CLOSE_SESSION;
            requests.push(request);
            if closing {
                break;
            }
        }
        requests
    });

    (addr, handle)
}

fn variable_reply(request: &[u8]) -> Vec<u8> {
    let index = u16::from_le_bytes([request[0], request[1]]);
    let mut payload = request[..2].to_vec();
    match index {
        0x0011 => {
            payload.extend_from_slice(&(DEVICE_NAME.len() as u32).to_le_bytes());
            payload.extend_from_slice(DEVICE_NAME.as_bytes());
        }
        0x000E => payload.extend_from_slice(&SERIAL_NUMBER.to_le_bytes()),
        other => panic!("unexpected variable {other:#06x}"),
    }
    payload
}
