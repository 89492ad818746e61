//! xDLMS InitiateRequest / InitiateResponse
//!
//! These are A-XDR encoded and carried as an OCTET STRING inside the
//! user-information field of AARQ/AARE.
//!
//! ```text
//! InitiateRequest ::= SEQUENCE {
//!     dedicated-key                   OCTET STRING OPTIONAL,
//!     response-allowed                BOOLEAN DEFAULT TRUE,
//!     proposed-quality-of-service     [0] IMPLICIT Integer8 OPTIONAL,
//!     proposed-dlms-version-number    Unsigned8,
//!     proposed-conformance            Conformance,
//!     client-max-receive-pdu-size     Unsigned16
//! }
//!
//! InitiateResponse ::= SEQUENCE {
//!     negotiated-quality-of-service   [0] IMPLICIT Integer8 OPTIONAL,
//!     negotiated-dlms-version-number  Unsigned8,
//!     negotiated-conformance          Conformance,
//!     server-max-receive-pdu-size     Unsigned16,
//!     vaa-name                        ObjectName
//! }
//! ```
//!
//! Reference: DLMS Green Book Ed. 12, Section 11.4

use core::fmt;

use log::debug;

use super::{Conformance, DLMS_VERSION};
use crate::{
    axdr,
    ber::{TagClass, decode_header},
    cursor::ByteCursor,
    error::AcseError,
};

/// xDLMS InitiateRequest tag
pub const INITIATE_REQUEST_TAG: u8 = 0x01;

/// xDLMS InitiateResponse tag
pub const INITIATE_RESPONSE_TAG: u8 = 0x08;

/// `[APPLICATION 31]` identifier of the conformance block
const CONFORMANCE_TAG: [u8; 2] = [0x5F, 0x1F];

/// Conformance tag number
const CONFORMANCE_TAG_NUMBER: u8 = 31;

/// Conformance BIT STRING content: unused-bits byte + 3 bytes
const CONFORMANCE_LEN: usize = 4;

/// What the server keeps from an InitiateRequest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiateRequest {
    pub proposed_conformance: Conformance,
    pub client_max_receive_pdu_size: u16,
}

impl InitiateRequest {
    /// Decode an InitiateRequest, the cursor being positioned on its tag.
    ///
    /// The dedicated key is skipped: ciphered associations are handled by the
    /// security layer.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, AcseError> {
        if cursor.read_u8()? != INITIATE_REQUEST_TAG {
            return Err(AcseError::InvalidContent("InitiateRequest tag"));
        }

        if let Some(length) = axdr::skip_optional_octet_string(cursor)? {
            debug!("Ignoring {} byte dedicated key", length);
        }

        axdr::read_null(cursor)?; // response-allowed
        axdr::read_null(cursor)?; // proposed-quality-of-service

        let version = cursor.read_u8()?;
        if version != DLMS_VERSION {
            return Err(AcseError::InvalidContent("DLMS version"));
        }

        let header = decode_header(cursor)?;
        if header.class != TagClass::Application || header.number != CONFORMANCE_TAG_NUMBER {
            return Err(AcseError::UnexpectedTag {
                expected: CONFORMANCE_TAG[0],
                found: header.identifier,
            });
        }
        if header.length != CONFORMANCE_LEN {
            return Err(AcseError::InvalidLength);
        }
        if cursor.read_u8()? != 0 {
            return Err(AcseError::InvalidContent("conformance unused bits"));
        }
        let mut bits = [0u8; 3];
        cursor.read_into(&mut bits)?;

        let client_max_receive_pdu_size = cursor.read_u16()?;

        Ok(Self { proposed_conformance: Conformance::from_bytes(bits), client_max_receive_pdu_size })
    }
}

impl fmt::Display for InitiateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InitiateRequest(conformance: {}, max_pdu: {})",
            self.proposed_conformance, self.client_max_receive_pdu_size
        )
    }
}

/// InitiateResponse sent by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiateResponse {
    pub negotiated_conformance: Conformance,
    pub server_max_receive_pdu_size: u16,
    /// 0x0007 for LN referencing, base name of the Association object for SN
    pub vaa_name: u16,
}

impl InitiateResponse {
    /// Write the A-XDR encoding (14 bytes).
    pub fn encode(&self, cursor: &mut ByteCursor<'_>) -> Result<(), AcseError> {
        cursor.write_u8(INITIATE_RESPONSE_TAG)?;
        cursor.write_u8(axdr::AXDR_NULL)?; // negotiated-quality-of-service
        cursor.write_u8(DLMS_VERSION)?;
        cursor.write_slice(&CONFORMANCE_TAG)?;
        cursor.write_u8(CONFORMANCE_LEN as u8)?;
        cursor.write_u8(0x00)?; // unused bits
        cursor.write_slice(&self.negotiated_conformance.to_bytes())?;
        cursor.write_u16(self.server_max_receive_pdu_size)?;
        cursor.write_u16(self.vaa_name)
    }
}

impl fmt::Display for InitiateResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InitiateResponse(conformance: {}, max_pdu: {}, vaa: 0x{:04X})",
            self.negotiated_conformance, self.server_max_receive_pdu_size, self.vaa_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<InitiateRequest, AcseError> {
        let mut buf = [0u8; 64];
        buf[..bytes.len()].copy_from_slice(bytes);
        let mut cursor = ByteCursor::with_data(&mut buf, bytes.len());
        InitiateRequest::decode(&mut cursor)
    }

    #[test]
    fn test_initiate_request_decode() {
        // Green Book example: 01 00 00 00 06 5F 1F 04 00 00 7E 1F 04 B0
        let request = decode(&[
            0x01, 0x00, 0x00, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x7E, 0x1F, 0x04, 0xB0,
        ])
        .unwrap();

        assert_eq!(request.proposed_conformance.to_bytes(), [0x00, 0x7E, 0x1F]);
        assert_eq!(request.client_max_receive_pdu_size, 0x04B0);
    }

    #[test]
    fn test_initiate_request_with_dedicated_key() {
        let request = decode(&[
            0x01, 0x01, 0x04, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00,
            0x00, 0x10, 0x1D, 0xFF, 0xFF,
        ])
        .unwrap();

        assert_eq!(request.proposed_conformance, Conformance::DEFAULT_SERVER);
        assert_eq!(request.client_max_receive_pdu_size, 0xFFFF);
    }

    #[test]
    fn test_initiate_request_errors() {
        // Wrong tag
        assert_eq!(
            decode(&[0x08, 0x00, 0x00, 0x00, 0x06]),
            Err(AcseError::InvalidContent("InitiateRequest tag"))
        );
        // response-allowed encoded as present
        assert_eq!(
            decode(&[0x01, 0x00, 0x01, 0x00, 0x06]),
            Err(AcseError::InvalidContent("A-XDR null"))
        );
        // DLMS version 5
        assert_eq!(
            decode(&[0x01, 0x00, 0x00, 0x00, 0x05, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x7E, 0x1F]),
            Err(AcseError::InvalidContent("DLMS version"))
        );
        // Conformance block with a universal BIT STRING tag
        assert_eq!(
            decode(&[0x01, 0x00, 0x00, 0x00, 0x06, 0x03, 0x04, 0x00, 0x00, 0x7E, 0x1F]),
            Err(AcseError::UnexpectedTag { expected: 0x5F, found: 0x03 })
        );
        // Conformance length 3
        assert_eq!(
            decode(&[0x01, 0x00, 0x00, 0x00, 0x06, 0x5F, 0x1F, 0x03, 0x00, 0x7E, 0x1F]),
            Err(AcseError::InvalidLength)
        );
        // Unused bits must be 0
        assert_eq!(
            decode(&[0x01, 0x00, 0x00, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x01, 0x00, 0x7E, 0x1F]),
            Err(AcseError::InvalidContent("conformance unused bits"))
        );
        // PDU size truncated
        assert_eq!(
            decode(&[0x01, 0x00, 0x00, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x7E, 0x1F, 0x04]),
            Err(AcseError::UnexpectedEnd)
        );
    }

    #[test]
    fn test_initiate_response_encode() {
        let mut buf = [0u8; 32];
        let mut cursor = ByteCursor::new(&mut buf);

        InitiateResponse {
            negotiated_conformance: Conformance::DEFAULT_SERVER,
            server_max_receive_pdu_size: 0x0400,
            vaa_name: 0x0007,
        }
        .encode(&mut cursor)
        .unwrap();

        assert_eq!(
            cursor.written(),
            &[0x08, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x10, 0x1D, 0x04, 0x00, 0x00, 0x07]
        );
    }

    #[test]
    fn test_initiate_response_buffer_full() {
        let mut buf = [0u8; 10];
        let mut cursor = ByteCursor::new(&mut buf);

        let response = InitiateResponse {
            negotiated_conformance: Conformance::DEFAULT_SERVER,
            server_max_receive_pdu_size: 0x0400,
            vaa_name: 0xFA00,
        };
        assert_eq!(response.encode(&mut cursor), Err(AcseError::BufferFull));
    }
}
