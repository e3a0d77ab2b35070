//! COLA2 command channel for safety laser scanners.
//!
//! Commands implement [`TelegramCommand`]; a [`Cola2Session`] frames them,
//! sends them over a [`CommandStream`](sickscan_transport::CommandStream),
//! and correlates the device's replies.
//!
//! ```no_run
//! use sickscan_cola2::{connect, CommSettings, SessionConfig};
//!
//! let session = connect("192.168.1.10:2122", SessionConfig::default())?;
//! println!("{}", session.device_name()?);
//! session.change_comm_settings(&CommSettings::default())?;
//! session.close()?;
//! # Ok::<(), sickscan_cola2::SessionError>(())
//! ```

pub mod comm_settings;
pub mod command;
pub mod connector;
pub mod error;
pub mod session;
pub mod session_commands;
pub mod settings;
pub mod variables;

pub use comm_settings::{ChangeCommSettingsCommand, CHANGE_COMM_SETTINGS_INDEX};
pub use command::{check_echoed_index, check_reply_kind, Reply, TelegramCommand};
pub use connector::{connect, open_session};
pub use error::{ReplyError, Result, SessionError};
pub use session::{Cola2Session, SessionConfig, SessionState};
pub use session_commands::{CloseSessionCommand, CreateSessionCommand};
pub use settings::{CommSettings, Features, InterfaceType};
pub use variables::{DeviceNameVariableCommand, SerialNumberVariableCommand};
