//! Unified error type for the tracing engine.

use std::net::AddrParseError;

/// Errors that can occur while setting up or running a trace.
///
/// Every fallible public operation in this crate returns `TraceResult<T>`.
/// Per the error handling policy: codec and measurement-timeout failures
/// are absorbed locally and never reach this type; only permission,
/// address and unrecoverable socket errors are surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum TracerError {
    /// Opening the raw ICMP socket was denied by the OS. Fatal to the
    /// trace; carries human-readable remediation guidance.
    #[error("raw socket permission denied: {remediation}")]
    RawSocketPermission {
        /// What the caller should do to fix this (grant a capability,
        /// run as a privileged user, etc).
        remediation: String,
    },

    /// The target hostname did not resolve to exactly one IPv4 address.
    #[error("could not resolve '{0}' to a single IPv4 address")]
    InvalidAddress(String),

    /// A received packet failed to decode as an ICMP Time-Exceeded or
    /// Destination-Unreachable reply to one of our UDP probes.
    #[error("invalid probe reply: {0}")]
    InvalidProbeReply(String),

    /// The requested packet size exceeds what this crate supports.
    #[error("invalid packet size: {0} bytes")]
    InvalidPacketSize(usize),

    /// An unrecoverable socket or system call error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<AddrParseError> for TracerError {
    fn from(err: AddrParseError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type TraceResult<T> = Result<T, TracerError>;
