// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains exception and Result definitions
use thiserror::Error;

/// Represents all kind of errors which can occur while running a control session.
#[derive(Error, Debug)]
pub enum JacoException {
    /// ConnectionError is returned if the arm cannot be reached or the connection drops.
    /// It is fatal for the session.
    #[error("connection error: {message}")]
    ConnectionError { message: String },

    /// ModeError is returned if the arm refuses to switch between position and torque mode.
    /// It is treated like a ConnectionError.
    #[error("mode error: {message}")]
    ModeError { message: String },

    /// CommandError is returned if a position or torque command could not be executed.
    #[error("command error: {message}")]
    CommandError { message: String },

    /// ReadError is returned if feedback or torque load could not be read from the arm.
    #[error("read error: {message}")]
    ReadError { message: String },

    /// HomingTimeout is returned if a position command did not settle in time.
    /// The supervisor reports it but does not abort because of it.
    #[error("position command did not settle within {timeout_s} s")]
    HomingTimeout {
        /// Time waited for the arm to settle in \[s\].
        timeout_s: f64,
    },

    /// RealTimeException is returned if the real-time priority cannot be set
    #[error("{message:?}")]
    RealTimeException { message: String },

    /// TelemetryError is returned if the recorded telemetry cannot be persisted or loaded.
    #[error("telemetry error: {message}")]
    TelemetryError { message: String },

    /// ConfigError is returned if a session configuration is malformed.
    #[error("config error: {message}")]
    ConfigError { message: String },
}

impl JacoException {
    /// Whether the error ends a session without any further attempt to move the arm.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            JacoException::ConnectionError { .. } | JacoException::ModeError { .. }
        )
    }
}

/// creates a CommandException from a static string slice
pub(crate) fn create_command_exception(message: &'static str) -> JacoException {
    JacoException::CommandError {
        message: message.to_string(),
    }
}

/// creates a ReadError from a static string slice
pub(crate) fn create_read_exception(message: &'static str) -> JacoException {
    JacoException::ReadError {
        message: message.to_string(),
    }
}

impl From<std::io::Error> for JacoException {
    fn from(error: std::io::Error) -> Self {
        JacoException::TelemetryError {
            message: error.to_string(),
        }
    }
}

impl From<bincode::Error> for JacoException {
    fn from(error: bincode::Error) -> Self {
        JacoException::TelemetryError {
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for JacoException {
    fn from(error: toml::de::Error) -> Self {
        JacoException::ConfigError {
            message: error.to_string(),
        }
    }
}

/// Result type which can have JacoException as Error
pub type JacoResult<T> = Result<T, JacoException>;
