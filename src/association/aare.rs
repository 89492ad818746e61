//! AARE APDU (A-Associate Response) encoding
//!
//! The AARE is written over the buffer that held the AARQ. Fields that only
//! make sense with high level security (responding title, responder
//! requirements, mechanism name, StoC challenge) are written only when the
//! client asked for HLS-GMAC.
//!
//! Reference: DLMS Green Book Ed. 12, Section 11.4 and Table 138-139

use log::debug;

use super::{
    AARE_TAG, APPLICATION_CONTEXT_NAME, AssociationResult, AssociationState, Challenge,
    ConnectionState, InitiateResponse, MAX_CHALLENGE_LEN, SECURITY_MECHANISM_NAME,
    SYSTEM_TITLE_LEN, VAA_NAME_SN, VERSION1_BIT_STRING,
    chain::{FieldDescriptor, Presence},
};
use crate::{
    ber::{
        DLMS_UA_OID_LEN, TAG_CONTEXT_SPECIFIC, TAG_OBJECT_IDENTIFIER, TAG_OCTET_STRING,
        write_integer, write_length, write_object_identifier,
    },
    config::ServerSettings,
    cursor::ByteCursor,
    error::AcseError,
    services::SystemServices,
};

/// `acse-service-user` choice of Associate-source-diagnostic
const RESULT_SERVICE_USER: u8 = 0xA1;

/// Field kinds of an AARE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AareField {
    ProtocolVersion,
    ApplicationContextName,
    ApplicationContextOid,
    Result,
    ResultSourceDiagnostic,
    RespondingApTitle,
    ResponderAcseRequirements,
    MechanismName,
    RespondingAuthenticationValue,
    UserInformation,
}

/// AARE fields in wire order
pub const AARE_CHAIN: [FieldDescriptor<AareField>; 10] = [
    FieldDescriptor::new(0x80, Presence::Always, AareField::ProtocolVersion),
    FieldDescriptor::new(0xA1, Presence::Always, AareField::ApplicationContextName),
    FieldDescriptor::new(TAG_OBJECT_IDENTIFIER, Presence::Always, AareField::ApplicationContextOid),
    FieldDescriptor::new(0xA2, Presence::Always, AareField::Result),
    FieldDescriptor::new(0xA3, Presence::Always, AareField::ResultSourceDiagnostic),
    FieldDescriptor::new(0xA4, Presence::Security, AareField::RespondingApTitle),
    FieldDescriptor::new(0x88, Presence::Security, AareField::ResponderAcseRequirements),
    FieldDescriptor::new(0x89, Presence::Security, AareField::MechanismName),
    FieldDescriptor::new(0xAA, Presence::Security, AareField::RespondingAuthenticationValue),
    FieldDescriptor::new(0xBE, Presence::Always, AareField::UserInformation),
];

impl AareField {
    pub fn name(self) -> &'static str {
        match self {
            AareField::ProtocolVersion => "protocol-version",
            AareField::ApplicationContextName => "application-context-name",
            AareField::ApplicationContextOid => "application context object identifier",
            AareField::Result => "result",
            AareField::ResultSourceDiagnostic => "result-source-diagnostic",
            AareField::RespondingApTitle => "responding-AP-title",
            AareField::ResponderAcseRequirements => "responder-acse-requirements",
            AareField::MechanismName => "mechanism-name",
            AareField::RespondingAuthenticationValue => "responding-authentication-value",
            AareField::UserInformation => "user-information",
        }
    }

    /// Write the field content, the tag having been written already.
    pub fn encode<S: SystemServices>(
        self,
        cursor: &mut ByteCursor<'_>,
        state: &mut AssociationState,
        settings: &ServerSettings,
        services: &mut S,
    ) -> Result<(), AcseError> {
        let handshake = &mut state.handshake;
        match self {
            AareField::ProtocolVersion | AareField::ResponderAcseRequirements => {
                write_length(cursor, VERSION1_BIT_STRING.len())?;
                cursor.write_slice(&VERSION1_BIT_STRING)
            }
            AareField::ApplicationContextName => write_length(cursor, DLMS_UA_OID_LEN + 2),
            AareField::ApplicationContextOid => {
                let id = handshake.referencing_mode.map_or(0, |mode| mode.as_u8());
                write_object_identifier(cursor, APPLICATION_CONTEXT_NAME, id)
            }
            AareField::Result => {
                let result = if state.connection == ConnectionState::Idle {
                    AssociationResult::RejectedPermanent
                } else {
                    AssociationResult::Accepted
                };
                write_integer(cursor, result.as_u8())
            }
            AareField::ResultSourceDiagnostic => {
                write_length(cursor, 5)?;
                cursor.write_u8(RESULT_SERVICE_USER)?;
                write_integer(cursor, handshake.association_result.as_u8())
            }
            AareField::RespondingApTitle => {
                write_length(cursor, SYSTEM_TITLE_LEN + 2)?;
                cursor.write_u8(TAG_OCTET_STRING)?;
                write_length(cursor, SYSTEM_TITLE_LEN)?;
                cursor.write_slice(services.system_title().as_bytes())
            }
            AareField::MechanismName => write_object_identifier(
                cursor,
                SECURITY_MECHANISM_NAME,
                handshake.authentication_level.as_u8(),
            ),
            AareField::RespondingAuthenticationValue => {
                // StoC mirrors the CtoS size
                let size = handshake.client_to_server_challenge.len();
                let mut stoc = [0u8; MAX_CHALLENGE_LEN];
                let stoc = &mut stoc[..size];
                if size > 0 {
                    services.fill_random(stoc)?;
                    handshake.server_to_client_challenge = Challenge::from_slice(stoc)?;
                } else {
                    handshake.server_to_client_challenge = Challenge::default();
                }

                write_length(cursor, size + 2)?;
                cursor.write_u8(TAG_CONTEXT_SPECIFIC)?; // GraphicString
                write_length(cursor, size)?;
                cursor.write_slice(stoc)
            }
            AareField::UserInformation => {
                let response = InitiateResponse {
                    negotiated_conformance: settings.conformance,
                    server_max_receive_pdu_size: settings.max_receive_pdu_size,
                    vaa_name: handshake.referencing_mode.map_or(VAA_NAME_SN, |mode| mode.vaa_name()),
                };
                debug!("{}", response);

                cursor.open_length()?;
                cursor.write_u8(TAG_OCTET_STRING)?;
                cursor.open_length()?;
                response.encode(cursor)?;
                cursor.close_length()?;
                cursor.close_length()?;
                Ok(())
            }
        }
    }
}

/// Write the AARE for `state` from offset 0 of the cursor.
///
/// Returns the APDU length. On error the buffer content is meaningless.
pub fn encode_aare<S: SystemServices>(
    cursor: &mut ByteCursor<'_>,
    state: &mut AssociationState,
    settings: &ServerSettings,
    services: &mut S,
) -> Result<usize, AcseError> {
    cursor.rewind();
    cursor.write_u8(AARE_TAG)?;
    cursor.open_length()?;

    let level = state.handshake.authentication_level;
    for descriptor in AARE_CHAIN.iter().filter(|descriptor| descriptor.presence.is_mandatory(level)) {
        cursor.write_u8(descriptor.tag)?;
        descriptor.field.encode(cursor, state, settings, services)?;
        debug!("Encoded {} (0x{:02X})", descriptor.field.name(), descriptor.tag);
    }

    cursor.close_length()?;
    Ok(cursor.write_position())
}
