//! AARQ APDU (A-Associate Request) decoding
//!
//! ```text
//! AARQ ::= [APPLICATION 0] IMPLICIT SEQUENCE {
//!     protocol-version            [0]  IMPLICIT BIT STRING DEFAULT {version1},
//!     application-context-name    [1]  Application-context-name,
//!     called-AP-title             [2]  AP-title OPTIONAL,
//!     called-AE-qualifier         [3]  AE-qualifier OPTIONAL,
//!     called-AP-invocation-id     [4]  AP-invocation-identifier OPTIONAL,
//!     called-AE-invocation-id     [5]  AE-invocation-identifier OPTIONAL,
//!     calling-AP-title            [6]  AP-title OPTIONAL,
//!     calling-AE-qualifier        [7]  AE-qualifier OPTIONAL,
//!     calling-AP-invocation-id    [8]  AP-invocation-identifier OPTIONAL,
//!     calling-AE-invocation-id    [9]  AE-invocation-identifier OPTIONAL,
//!     sender-acse-requirements    [10] IMPLICIT ACSE-requirements OPTIONAL,
//!     mechanism-name              [11] IMPLICIT Mechanism-name OPTIONAL,
//!     calling-authentication-value [12] EXPLICIT Authentication-value OPTIONAL,
//!     implementation-information  [29] IMPLICIT Implementation-data OPTIONAL,
//!     user-information            [30] EXPLICIT Association-information OPTIONAL
//! }
//! ```
//!
//! Reference: DLMS Green Book Ed. 12, Section 11 and Table 141

use log::{debug, warn};

use super::{
    AARQ_TAG, APPLICATION_CONTEXT_NAME, AuthenticationLevel, Challenge, HandshakeState,
    InitiateRequest, ReferencingMode, SECURITY_MECHANISM_NAME, SYSTEM_TITLE_LEN, SystemTitle,
    VERSION1_BIT_STRING,
    chain::{FieldDecoder, FieldDescriptor, Presence, decode_chain},
};
use crate::{
    ber::{
        BerHeader, DLMS_UA_OID_LEN, TAG_CONTEXT_SPECIFIC, TAG_INTEGER, TAG_OBJECT_IDENTIFIER,
        TAG_OCTET_STRING, decode_header, decode_object_identifier,
    },
    cursor::ByteCursor,
    error::AcseError,
};

/// Declared length of application-context-name: OID tag + length + 7 bytes
const APPLICATION_CONTEXT_NAME_LEN: usize = DLMS_UA_OID_LEN + 2;

/// Field kinds of an AARQ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AarqField {
    ProtocolVersion,
    ApplicationContextName,
    /// application-context-name content or mechanism-name
    ObjectIdentifier,
    CallingApTitle,
    SenderAcseRequirements,
    CallingAuthenticationValue,
    UserInformation,
    /// Accepted and discarded
    Skip,
}

/// AARQ fields in wire order
pub const AARQ_CHAIN: [FieldDescriptor<AarqField>; 20] = [
    FieldDescriptor::new(0x80, Presence::Checked, AarqField::ProtocolVersion),
    FieldDescriptor::new(0xA1, Presence::Always, AarqField::ApplicationContextName),
    FieldDescriptor::new(TAG_OBJECT_IDENTIFIER, Presence::Always, AarqField::ObjectIdentifier),
    FieldDescriptor::new(0xA2, Presence::Checked, AarqField::Skip), // called-AP-title
    FieldDescriptor::new(0xA3, Presence::Checked, AarqField::Skip), // called-AE-qualifier
    FieldDescriptor::new(0xA4, Presence::Checked, AarqField::Skip), // called-AP-invocation-id
    FieldDescriptor::new(TAG_INTEGER, Presence::Checked, AarqField::Skip),
    FieldDescriptor::new(0xA5, Presence::Checked, AarqField::Skip), // called-AE-invocation-id
    FieldDescriptor::new(TAG_INTEGER, Presence::Checked, AarqField::Skip),
    FieldDescriptor::new(0xA6, Presence::Optional, AarqField::CallingApTitle),
    FieldDescriptor::new(0xA7, Presence::Checked, AarqField::Skip), // calling-AE-qualifier
    FieldDescriptor::new(0xA8, Presence::Checked, AarqField::Skip), // calling-AP-invocation-id
    FieldDescriptor::new(TAG_INTEGER, Presence::Checked, AarqField::Skip),
    FieldDescriptor::new(0xA9, Presence::Checked, AarqField::Skip), // calling-AE-invocation-id
    FieldDescriptor::new(TAG_INTEGER, Presence::Checked, AarqField::Skip),
    FieldDescriptor::new(0x8A, Presence::Optional, AarqField::SenderAcseRequirements),
    FieldDescriptor::new(0x8B, Presence::Optional, AarqField::ObjectIdentifier),
    FieldDescriptor::new(0xAC, Presence::Optional, AarqField::CallingAuthenticationValue),
    FieldDescriptor::new(0xBD, Presence::Optional, AarqField::Skip), // implementation-information
    FieldDescriptor::new(0xBE, Presence::Optional, AarqField::UserInformation),
];

impl FieldDecoder for AarqField {
    fn name(self) -> &'static str {
        match self {
            AarqField::ProtocolVersion => "protocol-version",
            AarqField::ApplicationContextName => "application-context-name",
            AarqField::ObjectIdentifier => "object identifier",
            AarqField::CallingApTitle => "calling-AP-title",
            AarqField::SenderAcseRequirements => "sender-acse-requirements",
            AarqField::CallingAuthenticationValue => "calling-authentication-value",
            AarqField::UserInformation => "user-information",
            AarqField::Skip => "unused field",
        }
    }

    fn decode(
        self,
        header: &BerHeader,
        cursor: &mut ByteCursor<'_>,
        state: &mut HandshakeState,
    ) -> Result<(), AcseError> {
        match self {
            AarqField::ProtocolVersion | AarqField::SenderAcseRequirements => {
                decode_version1_bit_string(header, cursor)
            }
            AarqField::ApplicationContextName => {
                if header.length != APPLICATION_CONTEXT_NAME_LEN {
                    return Err(AcseError::InvalidLength);
                }
                Ok(())
            }
            AarqField::ObjectIdentifier => decode_name(header, cursor, state),
            AarqField::CallingApTitle => decode_calling_ap_title(cursor, state),
            AarqField::CallingAuthenticationValue => decode_authentication_value(cursor, state),
            AarqField::UserInformation => decode_user_information(cursor, state),
            AarqField::Skip => {
                debug!("Skipping field 0x{:02X}", header.identifier);
                cursor.skip(header.length)
            }
        }
    }

    fn is_container(self) -> bool {
        matches!(self, AarqField::ApplicationContextName)
    }
}

/// Decode a complete AARQ into a fresh handshake.
///
/// The cursor must hold exactly one APDU. Nothing is returned unless every
/// field decoded, so a failed request never leaks partial values.
pub fn decode_aarq(cursor: &mut ByteCursor<'_>) -> Result<HandshakeState, AcseError> {
    let header = decode_header(cursor).map_err(|_| AcseError::Framing)?;
    if header.identifier != AARQ_TAG || header.length != cursor.unread() {
        warn!(
            "Bad AARQ framing: tag 0x{:02X}, length {} for {} bytes",
            header.identifier,
            header.length,
            cursor.unread()
        );
        return Err(AcseError::Framing);
    }

    let mut handshake = HandshakeState::new();
    decode_chain(&AARQ_CHAIN, cursor, &mut handshake)?;
    Ok(handshake)
}

/// `07 80`: version1 / authentication functional unit
fn decode_version1_bit_string(
    header: &BerHeader,
    cursor: &mut ByteCursor<'_>,
) -> Result<(), AcseError> {
    if header.length != VERSION1_BIT_STRING.len() {
        return Err(AcseError::InvalidLength);
    }
    let mut bits = [0u8; 2];
    cursor.read_into(&mut bits)?;
    if bits != VERSION1_BIT_STRING {
        return Err(AcseError::InvalidContent("BIT STRING"));
    }
    Ok(())
}

fn decode_name(
    header: &BerHeader,
    cursor: &mut ByteCursor<'_>,
    state: &mut HandshakeState,
) -> Result<(), AcseError> {
    let (name, id) = decode_object_identifier(header, cursor)?;

    match name {
        APPLICATION_CONTEXT_NAME => match ReferencingMode::try_from(id) {
            Ok(mode) => {
                debug!("{} referencing", mode);
                state.referencing_mode = Some(mode);
            }
            Err(id) => warn!("Application context {} not supported", id),
        },
        SECURITY_MECHANISM_NAME => {
            let level = AuthenticationLevel::from_mechanism_id(id);
            if level == AuthenticationLevel::Unknown {
                warn!("Authentication mechanism {} not supported", id);
            } else {
                debug!("{} authentication", level);
            }
            state.authentication_level = level;
        }
        _ => warn!("Object identifier name {} ignored", name),
    }
    Ok(())
}

/// `04 08 <title>`
fn decode_calling_ap_title(
    cursor: &mut ByteCursor<'_>,
    state: &mut HandshakeState,
) -> Result<(), AcseError> {
    let inner = decode_header(cursor)?;
    if inner.identifier != TAG_OCTET_STRING {
        return Err(AcseError::UnexpectedTag { expected: TAG_OCTET_STRING, found: inner.identifier });
    }
    if inner.length != SYSTEM_TITLE_LEN {
        return Err(AcseError::InvalidLength);
    }

    let mut title = [0u8; SYSTEM_TITLE_LEN];
    cursor.read_into(&mut title)?;
    state.client_system_title = Some(SystemTitle::new(title));
    Ok(())
}

/// `80 <len> <GraphicString>`: LLS password or HLS CtoS challenge
fn decode_authentication_value(
    cursor: &mut ByteCursor<'_>,
    state: &mut HandshakeState,
) -> Result<(), AcseError> {
    let inner = decode_header(cursor)?;
    if inner.identifier != TAG_CONTEXT_SPECIFIC {
        return Err(AcseError::UnexpectedTag {
            expected: TAG_CONTEXT_SPECIFIC,
            found: inner.identifier,
        });
    }

    let value = cursor.unread_slice().get(..inner.length).ok_or(AcseError::UnexpectedEnd)?;
    let challenge = Challenge::from_slice(value)?;
    cursor.skip(inner.length)?;
    state.client_to_server_challenge = challenge;
    Ok(())
}

/// `04 <len> <InitiateRequest>`
fn decode_user_information(
    cursor: &mut ByteCursor<'_>,
    state: &mut HandshakeState,
) -> Result<(), AcseError> {
    let inner = decode_header(cursor)?;
    if inner.identifier != TAG_OCTET_STRING {
        return Err(AcseError::UnexpectedTag { expected: TAG_OCTET_STRING, found: inner.identifier });
    }

    let start = cursor.read_position();
    let request = InitiateRequest::decode(cursor)?;
    if cursor.read_position() != start + inner.length {
        return Err(AcseError::InvalidLength);
    }
    debug!("{}", request);
    state.proposed_conformance = request.proposed_conformance;
    state.client_max_pdu_size = request.client_max_receive_pdu_size;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::Conformance;

    fn decode(bytes: &[u8]) -> Result<HandshakeState, AcseError> {
        let mut buf = [0u8; 160];
        buf[..bytes.len()].copy_from_slice(bytes);
        let mut cursor = ByteCursor::with_data(&mut buf, bytes.len());
        decode_aarq(&mut cursor)
    }

    #[test]
    fn test_decode_aarq_ln_no_security() {
        // Green Book example: LN referencing, lowest level security
        let handshake = decode(&[
            0x60, 0x1D, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01, 0xBE,
            0x10, 0x04, 0x0E, 0x01, 0x00, 0x00, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x7E,
            0x1F, 0x04, 0xB0,
        ])
        .unwrap();

        assert_eq!(handshake.referencing_mode(), Some(ReferencingMode::LogicalName));
        assert_eq!(handshake.authentication_level(), AuthenticationLevel::None);
        assert_eq!(handshake.proposed_conformance(), Conformance::from_bytes([0x00, 0x7E, 0x1F]));
        assert_eq!(handshake.client_max_pdu_size(), 0x04B0);
        assert_eq!(handshake.client_system_title(), None);
    }

    #[test]
    fn test_decode_aarq_low_level_security() {
        // Green Book example: LN referencing, LLS with password "12345678"
        let handshake = decode(&[
            0x60, 0x36, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01, 0x8A,
            0x02, 0x07, 0x80, 0x8B, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x02, 0x01, 0xAC, 0x0A,
            0x80, 0x08, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0xBE, 0x10, 0x04, 0x0E,
            0x01, 0x00, 0x00, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x7E, 0x1F, 0x04, 0xB0,
        ])
        .unwrap();

        assert_eq!(handshake.authentication_level(), AuthenticationLevel::Low);
        assert_eq!(handshake.client_to_server_challenge(), b"12345678");
    }

    #[test]
    fn test_decode_aarq_all_optional_fields() {
        // protocol-version, called-AP-title (skipped), calling-AP-title, HLS mechanism
        let handshake = decode(&[
            0x60, 0x42, 0x80, 0x02, 0x07, 0x80, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05,
            0x08, 0x01, 0x03, 0xA2, 0x04, 0x06, 0x02, 0x2A, 0x03, 0xA6, 0x0A, 0x04, 0x08, 0x4D,
            0x4D, 0x4D, 0x00, 0x00, 0x00, 0x00, 0x01, 0x8A, 0x02, 0x07, 0x80, 0x8B, 0x07, 0x60,
            0x85, 0x74, 0x05, 0x08, 0x02, 0x05, 0xAC, 0x0A, 0x80, 0x08, 0x4B, 0x35, 0x36, 0x69,
            0x56, 0x61, 0x67, 0x59, 0xBE, 0x06, 0x04, 0x04, 0xDE, 0xAD, 0xBE, 0xEF,
        ])
        .unwrap();

        assert_eq!(handshake.referencing_mode(), Some(ReferencingMode::LogicalNameWithCiphering));
        assert_eq!(handshake.authentication_level(), AuthenticationLevel::HighGmac);
        assert_eq!(
            handshake.client_system_title(),
            Some(&SystemTitle::new([0x4D, 0x4D, 0x4D, 0x00, 0x00, 0x00, 0x00, 0x01]))
        );
        assert_eq!(handshake.client_to_server_challenge(), b"K56iVagY");
        // Glo-ciphered user-information is not an InitiateRequest: dropped
        assert_eq!(handshake.client_max_pdu_size(), 0);
    }

    #[test]
    fn test_decode_aarq_minimal() {
        let handshake = decode(&[
            0x60, 0x0B, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x02,
        ])
        .unwrap();

        assert_eq!(handshake.referencing_mode(), Some(ReferencingMode::ShortName));
        assert_eq!(handshake.client_max_pdu_size(), 0);
    }

    #[test]
    fn test_decode_aarq_unknown_ids() {
        // Application context 7, mechanism 2 (HLS manufacturer specific)
        let handshake = decode(&[
            0x60, 0x14, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x07, 0x8B,
            0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x02, 0x02,
        ])
        .unwrap();

        assert_eq!(handshake.referencing_mode(), None);
        assert_eq!(handshake.authentication_level(), AuthenticationLevel::Unknown);
    }

    #[test]
    fn test_decode_aarq_framing() {
        // Length one byte too long
        assert_eq!(
            decode(&[0x60, 0x0C, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01]),
            Err(AcseError::Framing)
        );
        // AARE tag
        assert_eq!(
            decode(&[0x61, 0x0B, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01]),
            Err(AcseError::Framing)
        );
        assert_eq!(decode(&[]), Err(AcseError::Framing));
    }

    #[test]
    fn test_decode_aarq_bad_application_context() {
        // application-context-name length 8
        assert_eq!(
            decode(&[0x60, 0x0B, 0xA1, 0x08, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01]),
            Err(AcseError::InvalidLength)
        );
        // Corrupted DLMS UA prefix
        assert_eq!(
            decode(&[0x60, 0x0B, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x07, 0x01, 0x01]),
            Err(AcseError::UnknownObjectIdentifier)
        );
        // application-context-name missing
        assert_eq!(
            decode(&[0x60, 0x04, 0x80, 0x02, 0x07, 0x80]),
            Err(AcseError::MissingField("application-context-name"))
        );
    }

    #[test]
    fn test_decode_aarq_bad_protocol_version() {
        assert_eq!(
            decode(&[
                0x60, 0x0F, 0x80, 0x02, 0x07, 0x40, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74,
                0x05, 0x08, 0x01, 0x01,
            ]),
            Err(AcseError::InvalidContent("BIT STRING"))
        );
    }

    #[test]
    fn test_decode_aarq_bad_authentication_value() {
        // 7 byte password: the field is dropped, the AARQ still decodes
        let handshake = decode(&[
            0x60, 0x1F, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01, 0x8B,
            0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x02, 0x01, 0xAC, 0x09, 0x80, 0x07, 0x31, 0x32,
            0x33, 0x34, 0x35, 0x36, 0x37,
        ])
        .unwrap();

        assert_eq!(handshake.authentication_level(), AuthenticationLevel::Low);
        assert!(handshake.client_to_server_challenge().is_empty());
    }

    #[test]
    fn test_decode_aarq_trailing_field() {
        // user-information followed by another user-information
        assert_eq!(
            decode(&[
                0x60, 0x13, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01,
                0xBE, 0x02, 0x04, 0x00, 0xBE, 0x02, 0x04, 0x00,
            ]),
            Err(AcseError::TrailingData)
        );
    }

    #[test]
    fn test_decode_aarq_user_information_length_mismatch() {
        // OCTET STRING announces 5 bytes around a 14 byte InitiateRequest
        let handshake = decode(&[
            0x60, 0x1D, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01, 0xBE,
            0x10, 0x04, 0x05, 0x01, 0x00, 0x00, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x7E,
            0x1F, 0x04, 0xB0,
        ])
        .unwrap();
        assert_eq!(handshake.client_max_pdu_size(), 0);
        assert_eq!(handshake.proposed_conformance(), Conformance::EMPTY);

        // Announces 15 bytes: one byte of padding after the InitiateRequest
        let handshake = decode(&[
            0x60, 0x1E, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01, 0xBE,
            0x11, 0x04, 0x0F, 0x01, 0x00, 0x00, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x7E,
            0x1F, 0x04, 0xB0, 0x00,
        ])
        .unwrap();
        assert_eq!(handshake.client_max_pdu_size(), 0);
        assert_eq!(handshake.proposed_conformance(), Conformance::EMPTY);
    }
}
