//! RLRQ / RLRE APDUs (A-Release)
//!
//! The server only needs the release reason out of an RLRQ, and always
//! answers with the same RLRE: reason `normal`, no user information.
//!
//! Reference: DLMS Green Book Ed. 12, Section 11 and Table 146-147

use core::fmt;

use log::debug;

use super::{RLRE_TAG, RLRQ_TAG, ReleaseRequestReason};
use crate::{
    ber::{TAG_CONTEXT_SPECIFIC, decode_header},
    cursor::ByteCursor,
    error::AcseError,
};

/// RLRE sent for every accepted release: `[63 03 80 01 00]`
pub const RLRE_LITERAL: [u8; 5] = [RLRE_TAG, 0x03, TAG_CONTEXT_SPECIFIC, 0x01, 0x00];

/// What the server reads from an RLRQ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RlrqApdu {
    /// Release reason, `None` when absent or not a known value
    pub reason: Option<ReleaseRequestReason>,
}

impl RlrqApdu {
    /// Decode an RLRQ, the cursor holding exactly one APDU.
    ///
    /// Fields other than the reason (user-information) are skipped.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, AcseError> {
        let header = decode_header(cursor).map_err(|_| AcseError::Framing)?;
        if header.identifier != RLRQ_TAG || header.length != cursor.unread() {
            return Err(AcseError::Framing);
        }

        let mut apdu = Self::default();
        while cursor.unread() > 0 {
            let field = decode_header(cursor)?;
            if field.identifier == TAG_CONTEXT_SPECIFIC && field.length == 1 {
                let value = cursor.read_u8()?;
                apdu.reason = ReleaseRequestReason::try_from(value).ok();
                if apdu.reason.is_none() {
                    debug!("Unknown release reason {}", value);
                }
            } else {
                debug!("Skipping RLRQ field 0x{:02X} ({} bytes)", field.identifier, field.length);
                cursor.skip(field.length)?;
            }
        }
        Ok(apdu)
    }
}

impl fmt::Display for RlrqApdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            Some(reason) => write!(f, "RLRQ(reason: {})", reason),
            None => write!(f, "RLRQ"),
        }
    }
}

/// Write the RLRE from offset 0 of the cursor, returning its length.
pub fn encode_rlre(cursor: &mut ByteCursor<'_>) -> Result<usize, AcseError> {
    cursor.rewind();
    cursor.write_slice(&RLRE_LITERAL)?;
    Ok(cursor.write_position())
}
