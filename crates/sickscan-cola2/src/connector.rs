use std::net::TcpStream;

use sickscan_transport::{connect_tcp, CommandStream};

use crate::error::Result;
use crate::session::{Cola2Session, SessionConfig};

/// Open a session over an already connected stream.
pub fn open_session<T: CommandStream>(stream: T, config: SessionConfig) -> Result<Cola2Session<T>> {
    let session = Cola2Session::new(config);
    session.connect(stream)?;
    session.open()?;
    Ok(session)
}

/// Connect to a device over TCP and open a session.
pub fn connect(addr: &str, config: SessionConfig) -> Result<Cola2Session<TcpStream>> {
    let stream = connect_tcp(addr, config.timeout)?;
    open_session(stream, config)
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use sickscan_wire::{
        Telegram, TelegramHeader, TelegramReader, TelegramWriter, CLOSE_SESSION,
        CLOSE_SESSION_REPLY, OPEN_SESSION, OPEN_SESSION_REPLY,
    };

    use super::*;
    use crate::error::SessionError;
    use crate::session::SessionState;

    #[test]
    fn connect_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let device = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = TelegramReader::new(stream.try_clone().unwrap());
            let mut writer = TelegramWriter::new(stream);

            let open = reader.read_telegram().unwrap();
            assert_eq!(open.header.kind, OPEN_SESSION);
            writer
                .write_telegram(&Telegram::new(
                    TelegramHeader::new(77, open.header.request_id, OPEN_SESSION_REPLY),
                    vec![],
                ))
                .unwrap();

            let close = reader.read_telegram().unwrap();
            assert_eq!(close.header.kind, CLOSE_SESSION);
            assert_eq!(close.header.session_id, 77);
            writer
                .write_telegram(&Telegram::new(
                    TelegramHeader::new(77, close.header.request_id, CLOSE_SESSION_REPLY),
                    vec![],
                ))
                .unwrap();
        });

        let session = connect(&addr, SessionConfig::default()).unwrap();
        assert_eq!(session.session_id(), Some(77));
        assert_eq!(session.state(), SessionState::SessionActive);
        session.close().unwrap();
        device.join().unwrap();
    }

    #[test]
    fn connect_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let config = SessionConfig {
            timeout: Duration::from_millis(200),
            ..SessionConfig::default()
        };
        assert!(matches!(
            connect(&addr, config),
            Err(SessionError::Transport(_))
        ));
    }
}
