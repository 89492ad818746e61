//! ACSE server: grant decision and APDU dispatch
//!
//! One [`AcseServer`] serves any number of physical connections; each
//! connection owns its own [`AssociationState`], passed to every call.

use core::fmt;

use log::{debug, error, info, warn};

use super::{
    AARQ_TAG, AcseServiceUserDiagnostics, AssociationState, AuthenticationLevel, ConnectionState,
    RLRQ_TAG,
    aare::encode_aare,
    aarq::decode_aarq,
    release::{RlrqApdu, encode_rlre},
};
use crate::{config::ServerSettings, cursor::ByteCursor, error::AcseError, services::SystemServices};

/// Outcome of the grant decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantDecision {
    /// Associated, or pending HLS pass 3/4
    Accepted,
    /// Well formed AARQ with a wrong password: an AARE still reports the failure
    AuthenticationFailed,
    /// Unsupported application context or mechanism
    Rejected,
}

impl fmt::Display for GrantDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "Accepted"),
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Server side of the association control service element
///
/// # Examples
///
/// ```
/// use dlms_acse::{
///     association::{AcseServer, AssociationState, ConnectionState},
///     config::ServerSettings,
///     services::StaticServices,
/// };
///
/// let settings = ServerSettings::default();
/// let services = StaticServices::from_settings(&settings, b"12345678").unwrap();
/// let mut server = AcseServer::new(settings, services);
/// let mut state = AssociationState::new();
///
/// // RLRQ while idle: nothing to answer
/// let mut buffer = [0x62, 0x00, 0, 0, 0, 0, 0, 0];
/// assert_eq!(server.execute(&mut state, &mut buffer, 2), 0);
/// assert_eq!(state.connection(), ConnectionState::Idle);
/// ```
#[derive(Debug, Clone)]
pub struct AcseServer<S: SystemServices> {
    settings: ServerSettings,
    services: S,
}

impl<S: SystemServices> AcseServer<S> {
    pub fn new(settings: ServerSettings, services: S) -> Self {
        Self { settings, services }
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn services(&self) -> &S {
        &self.services
    }

    /// Put a connection back to idle
    pub fn init(&self, state: &mut AssociationState) {
        state.reset();
    }

    /// Decide whether the association described by `state` is granted.
    ///
    /// Called once per decoded AARQ. Sets the connection state and the
    /// diagnostic the AARE will carry.
    pub fn is_granted(&self, state: &mut AssociationState) -> GrantDecision {
        let handshake = &mut state.handshake;

        if handshake.referencing_mode.is_none() {
            warn!("Application context not supported");
            state.connection = ConnectionState::Idle;
            handshake.association_result =
                AcseServiceUserDiagnostics::ApplicationContextNameNotSupported;
            return GrantDecision::Rejected;
        }

        let decision = match handshake.authentication_level {
            AuthenticationLevel::None => {
                state.connection = ConnectionState::Associated;
                handshake.association_result = AcseServiceUserDiagnostics::Null;
                GrantDecision::Accepted
            }
            AuthenticationLevel::Low => {
                let verified = self.services.verify_password(
                    self.settings.server_address,
                    handshake.client_to_server_challenge.as_slice(),
                );
                if verified {
                    state.connection = ConnectionState::Associated;
                    handshake.association_result = AcseServiceUserDiagnostics::Null;
                    GrantDecision::Accepted
                } else {
                    warn!("Low level security: wrong password");
                    state.connection = ConnectionState::Idle;
                    handshake.association_result = AcseServiceUserDiagnostics::AuthenticationFailure;
                    GrantDecision::AuthenticationFailed
                }
            }
            AuthenticationLevel::HighGmac if handshake.client_to_server_challenge.is_empty() => {
                warn!("High level security without a CtoS challenge");
                state.connection = ConnectionState::Idle;
                handshake.association_result = AcseServiceUserDiagnostics::AuthenticationFailure;
                GrantDecision::AuthenticationFailed
            }
            AuthenticationLevel::HighGmac => {
                state.connection = ConnectionState::AssociationPending;
                handshake.association_result = AcseServiceUserDiagnostics::AuthenticationRequired;
                GrantDecision::Accepted
            }
            AuthenticationLevel::Unknown => {
                warn!("Authentication mechanism not recognised");
                state.connection = ConnectionState::Idle;
                handshake.association_result =
                    AcseServiceUserDiagnostics::AuthenticationMechanismNameNotRecognised;
                GrantDecision::Rejected
            }
        };

        info!(
            "Association {} ({}, {})",
            decision, handshake.authentication_level, state.connection
        );
        decision
    }

    /// Handle one inbound APDU of `len` bytes at the start of `buffer`.
    ///
    /// The reply is written over the request. Returns its length, 0 when
    /// nothing must be sent; the transport should then drop the connection.
    pub fn execute(&mut self, state: &mut AssociationState, buffer: &mut [u8], len: usize) -> usize {
        if len == 0 || len > buffer.len() {
            error!("Invalid APDU length {} for a {} byte buffer", len, buffer.len());
            return 0;
        }

        let tag = buffer[0];
        let mut cursor = ByteCursor::with_data(buffer, len);

        let result = match (state.connection, tag) {
            (ConnectionState::Idle, AARQ_TAG) => self.associate(state, &mut cursor),
            (ConnectionState::Associated, RLRQ_TAG) => self.release(state, &mut cursor),
            (connection, tag) => {
                error!("Unexpected APDU 0x{:02X} while {}", tag, connection);
                return 0;
            }
        };

        result.unwrap_or_else(|err| {
            error!("APDU 0x{:02X} dropped: {}", tag, err);
            0
        })
    }

    fn associate(
        &mut self,
        state: &mut AssociationState,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<usize, AcseError> {
        let handshake = decode_aarq(cursor)?;
        debug!(
            "AARQ: {:?}, {}, conformance {}, max PDU {}",
            handshake.referencing_mode,
            handshake.authentication_level,
            handshake.proposed_conformance,
            handshake.client_max_pdu_size
        );
        state.handshake = handshake;

        self.is_granted(state);

        encode_aare(cursor, state, &self.settings, &mut self.services).inspect_err(|_| {
            state.reset();
        })
    }

    fn release(
        &mut self,
        state: &mut AssociationState,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<usize, AcseError> {
        match RlrqApdu::decode(cursor) {
            Ok(rlrq) => info!("{}", rlrq),
            Err(err) => debug!("RLRQ content ignored: {}", err),
        }
        state.reset();
        info!("Association released");
        encode_rlre(cursor)
    }
}
