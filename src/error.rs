//! Unified error types for the WallyBox firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they can be passed through the engines and the service without
//! allocation.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A command queue had no free slot; the command was dropped.
    Queue(QueueFull),
    /// The charging-hardware link failed.
    Rapi(RapiError),
    /// The Wi-Fi module link failed.
    Wifi(WifiError),
    /// Persistent storage access failed.
    Storage(StorageError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// An invariant was violated; the controller must halt.
    Fatal(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queue(e) => write!(f, "queue: {e}"),
            Self::Rapi(e) => write!(f, "rapi: {e}"),
            Self::Wifi(e) => write!(f, "wifi: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Fatal(msg) => write!(f, "fatal: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Queue capacity
// ---------------------------------------------------------------------------

/// Returned when a command is offered to a queue that is already full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

impl fmt::Display for QueueFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command queue full")
    }
}

impl From<QueueFull> for Error {
    fn from(e: QueueFull) -> Self {
        Self::Queue(e)
    }
}

// ---------------------------------------------------------------------------
// Charging-hardware (RAPI) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RapiError {
    /// Response checksum missing or wrong.
    BadChecksum,
    /// Response did not start with the `$OK` marker.
    NotOk,
    /// No complete response within the response timeout.
    Timeout,
    /// Response overflowed the in-flight result buffer.
    Overflow,
    /// Outbound frame did not fit the frame buffer.
    FrameTooLong,
    /// The transport refused the outbound frame.
    Transport,
    /// A bridged raw command is already waiting for its response.
    BridgeBusy,
}

impl fmt::Display for RapiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadChecksum => write!(f, "bad checksum"),
            Self::NotOk => write!(f, "response not OK"),
            Self::Timeout => write!(f, "response timeout"),
            Self::Overflow => write!(f, "response overflow"),
            Self::FrameTooLong => write!(f, "frame too long"),
            Self::Transport => write!(f, "transport write failed"),
            Self::BridgeBusy => write!(f, "bridge busy"),
        }
    }
}

impl From<RapiError> for Error {
    fn from(e: RapiError) -> Self {
        Self::Rapi(e)
    }
}

// ---------------------------------------------------------------------------
// Wi-Fi errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    /// Formatted command exceeded the queue entry size.
    CommandTooLong,
    /// Outbound socket payload exceeded the data-mode buffer.
    DataOverflow,
    /// The module is not in a state that accepts the request.
    NotReady,
    /// The transport refused an outbound write.
    Transport,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandTooLong => write!(f, "command too long"),
            Self::DataOverflow => write!(f, "socket data buffer full"),
            Self::NotReady => write!(f, "module not ready"),
            Self::Transport => write!(f, "transport write failed"),
        }
    }
}

impl From<WifiError> for Error {
    fn from(e: WifiError) -> Self {
        Self::Wifi(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::StorageFull => Self::Config("storage full"),
            ConfigError::IoError => Self::Storage(StorageError::IoError),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
