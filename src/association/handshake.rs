//! Per-session association data
//!
//! [`HandshakeState`] is what the AARQ decoder fills in and the AARE encoder
//! reads back. [`AssociationState`] pairs it with the session-level
//! [`ConnectionState`].

use core::fmt;

use heapless::Vec as HeaplessVec;

use super::{
    AcseServiceUserDiagnostics, AuthenticationLevel, Conformance, ConnectionState,
    ReferencingMode, SYSTEM_TITLE_LEN,
};
use crate::error::AcseError;

/// Shortest accepted authentication value (challenge or password)
pub const MIN_CHALLENGE_LEN: usize = 8;

/// Longest accepted authentication value (challenge or password)
pub const MAX_CHALLENGE_LEN: usize = 64;

/// 8-byte identifier of a communicating entity
///
/// Green Book 4.3.4: 3 bytes manufacturer id followed by 5 bytes serial.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemTitle(pub [u8; SYSTEM_TITLE_LEN]);

impl SystemTitle {
    pub const fn new(bytes: [u8; SYSTEM_TITLE_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; SYSTEM_TITLE_LEN] {
        &self.0
    }
}

impl fmt::Debug for SystemTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemTitle(")?;
        for byte in self.0 {
            write!(f, "{:02X}", byte)?;
        }
        write!(f, ")")
    }
}

/// Authentication value exchanged during association (8 to 64 bytes)
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Challenge {
    bytes: HeaplessVec<u8, MAX_CHALLENGE_LEN>,
}

impl Challenge {
    /// Copy a received or generated value.
    ///
    /// Returns `InvalidLength` outside of 8..=64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AcseError> {
        if !(MIN_CHALLENGE_LEN..=MAX_CHALLENGE_LEN).contains(&bytes.len()) {
            return Err(AcseError::InvalidLength);
        }
        let bytes = HeaplessVec::from_slice(bytes).map_err(|_| AcseError::InvalidLength)?;
        Ok(Self { bytes })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True until a value has been stored
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Challenge {
    // Authentication values may be passwords
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Challenge({} bytes)", self.bytes.len())
    }
}

/// Data negotiated by one AARQ/AARE exchange
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HandshakeState {
    pub(crate) authentication_level: AuthenticationLevel,
    pub(crate) referencing_mode: Option<ReferencingMode>,
    pub(crate) client_to_server_challenge: Challenge,
    pub(crate) server_to_client_challenge: Challenge,
    pub(crate) proposed_conformance: Conformance,
    pub(crate) client_max_pdu_size: u16,
    pub(crate) association_result: AcseServiceUserDiagnostics,
    pub(crate) client_system_title: Option<SystemTitle>,
}

impl HandshakeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authentication_level(&self) -> AuthenticationLevel {
        self.authentication_level
    }

    /// `None` until a supported application context name has been decoded
    pub fn referencing_mode(&self) -> Option<ReferencingMode> {
        self.referencing_mode
    }

    /// Calling authentication value (password for LLS, CtoS challenge for HLS)
    pub fn client_to_server_challenge(&self) -> &[u8] {
        self.client_to_server_challenge.as_slice()
    }

    /// StoC challenge sent in the last AARE, empty unless HLS was requested
    pub fn server_to_client_challenge(&self) -> &[u8] {
        self.server_to_client_challenge.as_slice()
    }

    pub fn proposed_conformance(&self) -> Conformance {
        self.proposed_conformance
    }

    /// Services both sides support
    ///
    /// Informational only: the AARE always carries the server conformance.
    pub fn negotiated_conformance(&self, server: Conformance) -> Conformance {
        self.proposed_conformance & server
    }

    pub fn client_max_pdu_size(&self) -> u16 {
        self.client_max_pdu_size
    }

    /// Diagnostic reported in the AARE result-source-diagnostic field
    pub fn association_result(&self) -> AcseServiceUserDiagnostics {
        self.association_result
    }

    pub fn client_system_title(&self) -> Option<&SystemTitle> {
        self.client_system_title.as_ref()
    }
}

/// Everything a transport keeps per physical connection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssociationState {
    pub(crate) connection: ConnectionState,
    pub(crate) handshake: HandshakeState,
}

impl AssociationState {
    /// Idle state with a blank handshake
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to idle, forgetting everything negotiated
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn handshake(&self) -> &HandshakeState {
        &self.handshake
    }

    /// Conclude HLS pass 3/4, which is handled outside of the ACSE layer
    ///
    /// Only acts while the association is pending: a verified client becomes
    /// associated, any other outcome drops back to idle. Returns whether a
    /// transition happened.
    pub fn complete_authentication(&mut self, verified: bool) -> bool {
        if self.connection != ConnectionState::AssociationPending {
            return false;
        }
        if verified {
            self.connection = ConnectionState::Associated;
            self.handshake.association_result = AcseServiceUserDiagnostics::Null;
        } else {
            self.reset();
        }
        true
    }
}
