use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use serde::Serialize;
use sickscan_transport::CommandStream;
use sickscan_wire::{
    is_reply, Telegram, TelegramConfig, TelegramHeader, TelegramReader, TelegramWriter,
    DEFAULT_MAX_TELEGRAM,
};
use tracing::{debug, info, warn};

use crate::comm_settings::ChangeCommSettingsCommand;
use crate::command::TelegramCommand;
use crate::error::{ReplyError, Result, SessionError};
use crate::session_commands::{
    CloseSessionCommand, CreateSessionCommand, DEFAULT_CLIENT_ID, DEFAULT_SESSION_TIMEOUT_SECS,
};
use crate::settings::CommSettings;
use crate::variables::{DeviceNameVariableCommand, SerialNumberVariableCommand};

/// Sends per command: the first attempt plus one retry on timeout.
const SEND_ATTEMPTS: u32 = 2;

/// Lifecycle of a [`Cola2Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    Connecting,
    SessionEstablishing,
    SessionActive,
    Closing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::SessionEstablishing => "session-establishing",
            SessionState::SessionActive => "session-active",
            SessionState::Closing => "closing",
        };
        f.write_str(name)
    }
}

/// Configuration for a COLA2 session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for a reply, per send attempt.
    pub timeout: Duration,
    /// Read timeout slice; bounds how quickly a waiting command notices `close()`.
    pub poll_interval: Duration,
    /// Session timeout requested from the device.
    pub session_timeout_secs: u8,
    /// Client id sent when opening the session.
    pub client_id: u32,
    /// Maximum telegram size accepted from the device.
    pub max_telegram_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(50),
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            client_id: DEFAULT_CLIENT_ID,
            max_telegram_size: DEFAULT_MAX_TELEGRAM,
        }
    }
}

#[derive(Debug)]
struct Shared {
    state: SessionState,
    session_id: Option<u32>,
}

/// Request/reply protocol over a command stream.
///
/// One command is in flight at a time; concurrent [`execute`](Self::execute)
/// calls queue on the stream. [`close`](Self::close) may be called from any
/// thread and aborts a waiting command.
///
/// Lock order: `link` before `shared`. `shared` is never held while waiting
/// for `link`.
pub struct Cola2Session<T> {
    config: SessionConfig,
    shared: Mutex<Shared>,
    link: Mutex<Option<TelegramReader<T>>>,
    next_request_id: AtomicU16,
}

fn lock<U>(mutex: &Mutex<U>) -> MutexGuard<'_, U> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: CommandStream> Cola2Session<T> {
    /// Create a disconnected session.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            shared: Mutex::new(Shared {
                state: SessionState::Disconnected,
                session_id: None,
            }),
            link: Mutex::new(None),
            next_request_id: AtomicU16::new(1),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        lock(&self.shared).state
    }

    /// Session id assigned by the device, if a session is established.
    pub fn session_id(&self) -> Option<u32> {
        lock(&self.shared).session_id
    }

    /// Attach an externally opened command stream.
    pub fn connect(&self, stream: T) -> Result<()> {
        let mut link = lock(&self.link);
        {
            let shared = lock(&self.shared);
            if shared.state != SessionState::Disconnected {
                return Err(SessionError::InvalidState {
                    expected: SessionState::Disconnected,
                    actual: shared.state,
                });
            }
        }

        stream.set_write_timeout(Some(self.config.timeout))?;
        let reader = TelegramReader::with_config_stream(stream, self.telegram_config())?;
        *link = Some(reader);
        self.set_state(SessionState::Connecting);
        Ok(())
    }

    /// Establish a session and return the id the device assigned.
    pub fn open(&self) -> Result<u32> {
        let mut link = lock(&self.link);
        self.transition(SessionState::Connecting, SessionState::SessionEstablishing)?;

        let mut command =
            CreateSessionCommand::new(self.config.session_timeout_secs, self.config.client_id);
        let result = self.exchange(&mut link, &mut command, 0, true);

        let mut shared = lock(&self.shared);
        match (result, command.session_id()) {
            (Ok(()), Some(id)) => {
                shared.session_id = Some(id);
                shared.state = SessionState::SessionActive;
                info!(session_id = %format_args!("{id:#010x}"), "session established");
                Ok(id)
            }
            (result, _) => {
                if shared.state == SessionState::SessionEstablishing {
                    shared.state = SessionState::Connecting;
                }
                Err(result.err().unwrap_or_else(|| {
                    ReplyError::Malformed("no session id assigned".to_string()).into()
                }))
            }
        }
    }

    /// Execute a command and wait for its reply.
    ///
    /// Fails with [`SessionError::NoSession`] before touching the stream if
    /// the command needs a session and none is established. A command that
    /// gets no reply is sent once more; negative acknowledgements are never
    /// retried.
    pub fn execute(&self, command: &mut dyn TelegramCommand) -> Result<()> {
        let needs_session = !command.can_be_executed_without_session_id();
        let had_session = self.session_id().is_some();
        if needs_session && !had_session {
            return Err(SessionError::NoSession);
        }

        let mut link = lock(&self.link);
        let session_id = {
            let shared = lock(&self.shared);
            if shared.state == SessionState::Closing {
                return Err(SessionError::Aborted);
            }
            match shared.session_id {
                Some(id) => id,
                None if !needs_session => 0,
                // closed while queued behind another command
                None if had_session => return Err(SessionError::Aborted),
                None => return Err(SessionError::NoSession),
            }
        };

        self.exchange(&mut link, command, session_id, true)
    }

    /// Close the session and release the stream.
    ///
    /// Commands waiting for a reply fail with [`SessionError::Aborted`]. The
    /// device is asked to end the session; teardown happens even if it does
    /// not confirm, in which case that error is returned.
    pub fn close(&self) -> Result<()> {
        let session_id = {
            let mut shared = lock(&self.shared);
            if matches!(
                shared.state,
                SessionState::Disconnected | SessionState::Closing
            ) {
                return Ok(());
            }
            debug!(from = %shared.state, "closing session");
            shared.state = SessionState::Closing;
            shared.session_id
        };

        let mut link = lock(&self.link);
        let result = match session_id {
            Some(id) => self.exchange(&mut link, &mut CloseSessionCommand, id, false),
            None => Ok(()),
        };
        if let Err(err) = &result {
            debug!(error = %err, "close session not confirmed");
        }

        if let Some(reader) = link.take() {
            if let Err(err) = reader.get_ref().shutdown() {
                debug!(error = %err, "command stream shutdown failed");
            }
        }

        let mut shared = lock(&self.shared);
        shared.state = SessionState::Disconnected;
        shared.session_id = None;
        info!("session closed");
        result
    }

    /// Push communication settings to the device.
    pub fn change_comm_settings(&self, settings: &CommSettings) -> Result<()> {
        self.execute(&mut ChangeCommSettingsCommand::new(*settings))
    }

    /// Read the device name.
    pub fn device_name(&self) -> Result<String> {
        let mut command = DeviceNameVariableCommand::new();
        self.execute(&mut command)?;
        command
            .into_device_name()
            .ok_or_else(|| ReplyError::Malformed("device name missing".to_string()).into())
    }

    /// Read the device serial number.
    pub fn serial_number(&self) -> Result<u32> {
        let mut command = SerialNumberVariableCommand::new();
        self.execute(&mut command)?;
        command
            .serial_number()
            .ok_or_else(|| ReplyError::Malformed("serial number missing".to_string()).into())
    }

    fn telegram_config(&self) -> TelegramConfig {
        TelegramConfig {
            max_telegram_size: self.config.max_telegram_size,
            read_timeout: Some(self.config.poll_interval),
            write_timeout: Some(self.config.timeout),
        }
    }

    fn set_state(&self, state: SessionState) {
        let mut shared = lock(&self.shared);
        debug!(from = %shared.state, to = %state, "session state");
        shared.state = state;
    }

    fn transition(&self, from: SessionState, to: SessionState) -> Result<()> {
        let mut shared = lock(&self.shared);
        if shared.state != from {
            return Err(SessionError::InvalidState {
                expected: from,
                actual: shared.state,
            });
        }
        debug!(from = %from, to = %to, "session state");
        shared.state = to;
        Ok(())
    }

    /// Render, send and correlate one command. Caller holds the link lock.
    fn exchange(
        &self,
        link: &mut Option<TelegramReader<T>>,
        command: &mut dyn TelegramCommand,
        session_id: u32,
        cancellable: bool,
    ) -> Result<()> {
        let reader = link.as_mut().ok_or(SessionError::NotConnected)?;

        let mut payload = BytesMut::new();
        command.add_telegram_data(&mut payload)?;
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let header = TelegramHeader::new(session_id, request_id, command.kind());

        match self.round_trip(reader, &header, &payload, cancellable) {
            Ok(reply) => {
                debug!(
                    command = command.name(),
                    request_id,
                    reply = %reply.header.kind,
                    "reply received"
                );
                command.process_reply(&reply).map_err(|err| {
                    debug!(command = command.name(), error = %err, "reply rejected");
                    SessionError::Reply(err)
                })
            }
            Err(err) => {
                if matches!(err, SessionError::Wire(_) | SessionError::Transport(_)) {
                    self.drop_link(link, &err);
                }
                Err(err)
            }
        }
    }

    fn round_trip(
        &self,
        reader: &mut TelegramReader<T>,
        header: &TelegramHeader,
        payload: &[u8],
        cancellable: bool,
    ) -> Result<Telegram> {
        for attempt in 1..=SEND_ATTEMPTS {
            if attempt > 1 {
                warn!(
                    request_id = header.request_id,
                    kind = %header.kind,
                    "no reply, resending"
                );
            } else {
                debug!(
                    request_id = header.request_id,
                    kind = %header.kind,
                    len = payload.len(),
                    "sending command"
                );
            }

            TelegramWriter::with_config(reader.get_mut(), self.telegram_config())
                .send(header, payload)?;

            if let Some(reply) = self.await_reply(reader, header, cancellable)? {
                return Ok(reply);
            }
        }

        Err(SessionError::Timeout(self.config.timeout))
    }

    /// Wait for the reply to `request`. `Ok(None)` means the deadline passed.
    fn await_reply(
        &self,
        reader: &mut TelegramReader<T>,
        request: &TelegramHeader,
        cancellable: bool,
    ) -> Result<Option<Telegram>> {
        let deadline = Instant::now() + self.config.timeout;
        loop {
            if cancellable && self.state() == SessionState::Closing {
                return Err(SessionError::Aborted);
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }

            match reader.poll_telegram() {
                Ok(Some(reply)) if correlates(request, &reply.header) => return Ok(Some(reply)),
                Ok(Some(telegram)) => {
                    debug!(
                        expected = request.request_id,
                        request_id = telegram.header.request_id,
                        session_id = telegram.header.session_id,
                        kind = %telegram.header.kind,
                        reply = is_reply(telegram.header.kind),
                        "discarding uncorrelated telegram"
                    );
                }
                Ok(None) => continue,
                Err(err) if err.is_timeout() => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn drop_link(&self, link: &mut Option<TelegramReader<T>>, cause: &SessionError) {
        warn!(error = %cause, "command stream failed, dropping session");
        if let Some(reader) = link.take() {
            let _ = reader.get_ref().shutdown();
        }
        let mut shared = lock(&self.shared);
        shared.state = SessionState::Disconnected;
        shared.session_id = None;
    }
}

fn correlates(request: &TelegramHeader, reply: &TelegramHeader) -> bool {
    reply.request_id == request.request_id
        && (request.session_id == 0 || reply.session_id == request.session_id)
}
