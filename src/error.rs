//! Error types for the IEC 60870-5-104 outstation.

use std::borrow::Cow;

use thiserror::Error;

/// Result type alias for IEC 104 operations.
pub type Result<T> = std::result::Result<T, Iec104Error>;

/// IEC 60870-5-104 protocol error types.
///
/// Every error above the transport layer is fatal to exactly one
/// connection: the connection is closed and removed from the server,
/// other connections are unaffected.
#[derive(Debug, Error)]
pub enum Iec104Error {
    /// APDU length field exceeds the 253 octet maximum
    #[error("Frame too large: {0} octets")]
    FrameTooLarge(usize),

    /// First octet of a frame is not 0x68
    #[error("Invalid start byte: 0x{0:02X}")]
    InvalidStartByte(u8),

    /// Malformed APCI control field or length
    #[error("Invalid frame: {0}")]
    InvalidFrame(Cow<'static, str>),

    /// Unknown type identifier; the ASDU is dropped, the link survives
    #[error("Unknown type ID: {0}")]
    UnknownTypeId(u8),

    /// ASDU body does not match its declared structure
    #[error("Malformed ASDU: {0}")]
    MalformedAsdu(Cow<'static, str>),

    /// Send or receive sequence number violation
    #[error("Sequence error: expected {expected}, got {actual}")]
    SequenceError { expected: u16, actual: u16 },

    /// T1 timeout: peer failed to acknowledge in time
    #[error("T1 timeout: no acknowledgment received")]
    T1Timeout,

    /// T2 timeout (acknowledge deferral; handled internally with an S-frame)
    #[error("T2 timeout: acknowledgment deferral expired")]
    T2Timeout,

    /// T3 timeout (idle probe; handled internally with TESTFR)
    #[error("T3 timeout: link idle")]
    T3Timeout,

    /// Peer closed the transport
    #[error("Transport closed by peer")]
    TransportClosed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Message queue at capacity (surfaced only under the reject policy)
    #[error("Message queue full")]
    QueueFull,

    /// Concurrent connection limit reached
    #[error("Connection limit exceeded ({0})")]
    ConnectionLimitExceeded(usize),

    /// Enqueue targeted a connection that no longer exists
    #[error("No such target connection")]
    NoTargetConnection,

    /// Protocol rule violation
    #[error("Protocol error: {0}")]
    Protocol(Cow<'static, str>),

    /// Internal channel closed
    #[error("Channel closed")]
    ChannelClosed,
}

impl Iec104Error {
    /// Create a protocol error with an owned message.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(Cow::Owned(msg.into()))
    }

    /// Create a protocol error from a static message (no allocation).
    pub const fn protocol_static(msg: &'static str) -> Self {
        Self::Protocol(Cow::Borrowed(msg))
    }

    /// Create an invalid frame error with an owned message.
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(Cow::Owned(msg.into()))
    }

    /// Create an invalid frame error from a static message (no allocation).
    pub const fn invalid_frame_static(msg: &'static str) -> Self {
        Self::InvalidFrame(Cow::Borrowed(msg))
    }

    /// Create a malformed ASDU error with an owned message.
    pub fn malformed_asdu(msg: impl Into<String>) -> Self {
        Self::MalformedAsdu(Cow::Owned(msg.into()))
    }

    /// Create a malformed ASDU error from a static message (no allocation).
    pub const fn malformed_asdu_static(msg: &'static str) -> Self {
        Self::MalformedAsdu(Cow::Borrowed(msg))
    }

    /// Check if this error terminates the connection it occurred on.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::FrameTooLarge(_)
                | Self::InvalidStartByte(_)
                | Self::InvalidFrame(_)
                | Self::MalformedAsdu(_)
                | Self::SequenceError { .. }
                | Self::T1Timeout
                | Self::TransportClosed
                | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Iec104Error::InvalidStartByte(0xFF);
        assert_eq!(err.to_string(), "Invalid start byte: 0xFF");

        let err = Iec104Error::UnknownTypeId(255);
        assert_eq!(err.to_string(), "Unknown type ID: 255");

        let err = Iec104Error::SequenceError {
            expected: 10,
            actual: 5,
        };
        assert_eq!(err.to_string(), "Sequence error: expected 10, got 5");

        let err = Iec104Error::ConnectionLimitExceeded(4);
        assert_eq!(err.to_string(), "Connection limit exceeded (4)");
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Iec104Error::TransportClosed.is_connection_error());
        assert!(Iec104Error::T1Timeout.is_connection_error());
        assert!(Iec104Error::InvalidStartByte(0).is_connection_error());
        assert!(Iec104Error::SequenceError {
            expected: 0,
            actual: 1
        }
        .is_connection_error());

        // local conditions, not link failures
        assert!(!Iec104Error::QueueFull.is_connection_error());
        assert!(!Iec104Error::UnknownTypeId(200).is_connection_error());
        assert!(!Iec104Error::NoTargetConnection.is_connection_error());
    }
}
