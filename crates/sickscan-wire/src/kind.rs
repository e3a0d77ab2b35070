//! COLA2 command kinds.
//!
//! Every telegram carries a command type and a command mode byte, both ASCII.
//! Requests and their replies use different pairs.

/// Command type and mode of a telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CommandKind {
    pub command_type: u8,
    pub mode: u8,
}

impl CommandKind {
    pub const fn new(command_type: u8, mode: u8) -> Self {
        Self { command_type, mode }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} ({})",
            char::from(self.command_type),
            char::from(self.mode),
            command_name(*self)
        )
    }
}

/// Open a session (request).
pub const OPEN_SESSION: CommandKind = CommandKind::new(b'O', b'X');
/// Session opened (reply).
pub const OPEN_SESSION_REPLY: CommandKind = CommandKind::new(b'O', b'A');

/// Close a session (request).
pub const CLOSE_SESSION: CommandKind = CommandKind::new(b'C', b'X');
/// Session closed (reply).
pub const CLOSE_SESSION_REPLY: CommandKind = CommandKind::new(b'C', b'A');

/// Read a device variable by index (request).
pub const READ_VARIABLE: CommandKind = CommandKind::new(b'R', b'I');
/// Variable value (reply).
pub const READ_VARIABLE_REPLY: CommandKind = CommandKind::new(b'R', b'A');

/// Invoke a device method by index (request).
pub const METHOD_INVOCATION: CommandKind = CommandKind::new(b'M', b'N');
/// Method acknowledged (reply).
pub const METHOD_REPLY: CommandKind = CommandKind::new(b'A', b'N');

/// Negative acknowledgement carrying a device error code (reply to any request).
pub const ERROR_REPLY: CommandKind = CommandKind::new(b'F', b'A');

/// Returns a human-readable name for a command kind.
pub fn command_name(kind: CommandKind) -> &'static str {
    match kind {
        OPEN_SESSION => "OPEN_SESSION",
        OPEN_SESSION_REPLY => "OPEN_SESSION_REPLY",
        CLOSE_SESSION => "CLOSE_SESSION",
        CLOSE_SESSION_REPLY => "CLOSE_SESSION_REPLY",
        READ_VARIABLE => "READ_VARIABLE",
        READ_VARIABLE_REPLY => "READ_VARIABLE_REPLY",
        METHOD_INVOCATION => "METHOD_INVOCATION",
        METHOD_REPLY => "METHOD_REPLY",
        ERROR_REPLY => "ERROR_REPLY",
        _ => "UNKNOWN",
    }
}

/// Returns true for kinds the device sends in reply to a request.
pub fn is_reply(kind: CommandKind) -> bool {
    matches!(
        kind,
        OPEN_SESSION_REPLY
            | CLOSE_SESSION_REPLY
            | READ_VARIABLE_REPLY
            | METHOD_REPLY
            | ERROR_REPLY
    )
}
