//! Error types for the ds3270 engine
//!
//! Codec errors always carry the stream offset they were raised at, since a
//! misparsed 3270 stream cannot be resynchronised. Screen mutation has no
//! error type at all: out-of-range addresses wrap the way terminal hardware
//! does.

use std::io;

use thiserror::Error;

/// Top-level error type for ds3270 operations
#[derive(Debug, Error)]
pub enum Tn3270Error {
    /// Outbound or inbound data stream could not be decoded
    #[error("Data stream error: {0}")]
    DataStream(#[from] DataStreamError),
    /// Terminal session operation failed
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A two-byte coded buffer address could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressDecodeError {
    /// Byte is not the code-table entry for its low six bits (12-bit mode)
    #[error("byte 0x{byte:02X} is not a 12-bit address code")]
    InvalidCode { byte: u8 },
    /// First byte of a 14-bit address has a high bit set
    #[error("byte 0x{byte:02X} has its high bits set in 14-bit addressing")]
    HighBitsSet { byte: u8 },
    /// Decoded position lies outside the screen buffer
    #[error("address {address} is outside a {buffer_size}-cell buffer")]
    OutOfRange { address: usize, buffer_size: usize },
}

/// 3270 data stream codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataStreamError {
    /// Malformed buffer address operand
    #[error("invalid buffer address at offset {offset}: {source}")]
    AddressDecode {
        offset: usize,
        #[source]
        source: AddressDecodeError,
    },
    /// Unassigned order identifier byte
    #[error("unknown order 0x{byte:02X} at offset {offset}")]
    UnknownOrder { byte: u8, offset: usize },
    /// Unassigned command byte
    #[error("unknown command 0x{byte:02X} at offset {offset}")]
    UnknownCommand { byte: u8, offset: usize },
    /// Decoding needs more bytes than the stream holds
    #[error("truncated stream at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedStream {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// Unassigned attention identifier
    #[error("unknown AID 0x{byte:02X}")]
    UnknownAid { byte: u8 },
    /// Structured field length shorter than its own header
    #[error("malformed structured field at offset {offset}: length {length}")]
    MalformedStructuredField { offset: usize, length: usize },
    /// Bytes following a command that carries no body
    #[error("unexpected data at offset {offset} after a command without a body")]
    TrailingData { offset: usize },
    /// A list or payload longer than its length field can carry
    #[error("{what} of {length} exceeds the encodable maximum of {max}")]
    OperandOverflow {
        what: &'static str,
        length: usize,
        max: usize,
    },
}

/// Terminal session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// A bounded wait expired
    #[error("timed out after {timeout_ms}ms waiting for {operation}")]
    Timeout { operation: String, timeout_ms: u64 },
    /// The host sent a stream that could not be decoded
    #[error(transparent)]
    DataStream(#[from] DataStreamError),
    /// Operator input aimed at a protected field or an unformatted attribute position
    #[error("position {address} is protected")]
    FieldProtected { address: u16 },
    /// Non-digit typed into a numeric-only field
    #[error("'{ch}' rejected at position {address}: field is numeric only")]
    NumericOnly { address: u16, ch: char },
    /// Operator input while the keyboard is locked
    #[error("keyboard is locked")]
    KeyboardLocked,
    /// The transport dropped its end of the channel
    #[error("host transport disconnected")]
    Disconnected,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration parameter
    #[error("invalid configuration parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    /// Missing required configuration
    #[error("missing required configuration parameter: {parameter}")]
    MissingRequired { parameter: String },
    /// Configuration file could not be read or written
    #[error("configuration file error '{path}': {source}")]
    FileError {
        path: String,
        #[source]
        source: io::Error,
    },
    /// Configuration JSON could not be (de)serialised
    #[error("configuration serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for ds3270 operations
pub type Tn3270Result<T> = Result<T, Tn3270Error>;

/// Specialized result types for different components
pub type StreamResult<T> = Result<T, DataStreamError>;
pub type SessionResult<T> = Result<T, SessionError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_position() {
        let err = DataStreamError::UnknownOrder { byte: 0x99, offset: 7 };
        assert_eq!(err.to_string(), "unknown order 0x99 at offset 7");

        let err = DataStreamError::AddressDecode {
            offset: 3,
            source: AddressDecodeError::InvalidCode { byte: 0x41 },
        };
        assert!(err.to_string().contains("offset 3"));
        assert!(err.to_string().contains("0x41"));
    }

    #[test]
    fn test_error_conversion() {
        let stream = DataStreamError::UnknownAid { byte: 0x01 };
        let session: SessionError = stream.clone().into();
        assert!(matches!(session, SessionError::DataStream(_)));

        let top: Tn3270Error = stream.into();
        assert!(matches!(top, Tn3270Error::DataStream(DataStreamError::UnknownAid { byte: 0x01 })));
    }

    #[test]
    fn test_timeout_is_recoverable_value() {
        let err = SessionError::Timeout {
            operation: "text 'READY'".to_string(),
            timeout_ms: 250,
        };
        assert_eq!(err.to_string(), "timed out after 250ms waiting for text 'READY'");
    }
}
