//! Error type shared by the cursor, the BER/A-XDR primitives and the codec chains.

use core::fmt;

/// Errors raised while decoding an AARQ or encoding an AARE.
///
/// Every variant is fatal for the operation that produced it. Authentication
/// failures are not errors: they are reported to the peer inside the AARE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcseError {
    /// A read went past the end of the received data.
    UnexpectedEnd,
    /// A write went past the end of the buffer.
    BufferFull,
    /// Outer APDU tag or length does not match the received frame.
    Framing,
    /// A BER tag/length header could not be parsed.
    MalformedHeader,
    /// A mandatory field carries another tag than the one expected.
    UnexpectedTag {
        /// Tag required at this position.
        expected: u8,
        /// Tag found on the wire.
        found: u8,
    },
    /// A field declares a length its grammar does not allow.
    InvalidLength,
    /// Field content violates its grammar.
    InvalidContent(&'static str),
    /// Object identifier does not start with the DLMS UA prefix.
    UnknownObjectIdentifier,
    /// A mandatory field is missing from the AARQ.
    MissingField(&'static str),
    /// Bytes remain after the last field of the AARQ.
    TrailingData,
    /// A length does not fit the form it must be written in.
    LengthOverflow,
    /// No reserved length slot is open, or too many are open.
    LengthSlot,
    /// The random source failed to deliver bytes.
    Random,
}

impl fmt::Display for AcseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEnd => write!(f, "Unexpected end of APDU"),
            Self::BufferFull => write!(f, "Output buffer too small"),
            Self::Framing => write!(f, "Bad APDU framing"),
            Self::MalformedHeader => write!(f, "Malformed BER header"),
            Self::UnexpectedTag { expected, found } => {
                write!(f, "Unexpected tag 0x{:02X} (expected 0x{:02X})", found, expected)
            }
            Self::InvalidLength => write!(f, "Invalid field length"),
            Self::InvalidContent(field) => write!(f, "Invalid {} content", field),
            Self::UnknownObjectIdentifier => write!(f, "Unknown object identifier"),
            Self::MissingField(field) => write!(f, "Missing {} field", field),
            Self::TrailingData => write!(f, "Trailing data after last field"),
            Self::LengthOverflow => write!(f, "Length too large for its encoding"),
            Self::LengthSlot => write!(f, "Unbalanced length slot"),
            Self::Random => write!(f, "Random source unavailable"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AcseError {}
