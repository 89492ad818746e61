//! Enumerations shared by the AARQ decoder, the AARE encoder and the state machine
//!
//! Reference: DLMS Green Book Ed. 12, Section 11

use core::fmt;

use derive_try_from_primitive::TryFromPrimitive;

/// Session-level state of an association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// No association
    #[default]
    Idle,
    /// AARQ accepted, high level authentication still to be completed
    AssociationPending,
    /// Association usable for xDLMS services
    Associated,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AssociationPending => write!(f, "Association pending"),
            Self::Associated => write!(f, "Associated"),
        }
    }
}

/// Authentication mechanism requested by the client
///
/// The discriminant is the last arc of the mechanism-name OID
/// `2.16.756.5.8.2.x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AuthenticationLevel {
    /// Lowest level security, no authentication
    #[default]
    None = 0,
    /// Low level security (password)
    Low = 1,
    /// High level security, GMAC challenge/response
    HighGmac = 5,
    /// A mechanism this server does not implement
    Unknown = 0xFF,
}

impl AuthenticationLevel {
    /// Map a mechanism-name id; anything unsupported becomes [`Self::Unknown`].
    pub fn from_mechanism_id(id: u8) -> Self {
        Self::try_from(id).unwrap_or(Self::Unknown)
    }

    /// Convert to u8 value
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AuthenticationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "No authentication"),
            Self::Low => write!(f, "Low level (password)"),
            Self::HighGmac => write!(f, "HLS-GMAC"),
            Self::Unknown => write!(f, "Unknown mechanism"),
        }
    }
}

/// Object referencing negotiated through the application context name
///
/// The discriminant is the last arc of the application-context OID
/// `2.16.756.5.8.1.x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ReferencingMode {
    /// Logical Name referencing without ciphering
    LogicalName = 1,
    /// Short Name referencing without ciphering
    ShortName = 2,
    /// Logical Name referencing with ciphering
    LogicalNameWithCiphering = 3,
    /// Short Name referencing with ciphering
    ShortNameWithCiphering = 4,
}

impl ReferencingMode {
    /// Convert to u8 value
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if this context uses ciphering
    pub const fn uses_ciphering(self) -> bool {
        matches!(self, Self::LogicalNameWithCiphering | Self::ShortNameWithCiphering)
    }

    /// Check if this context uses logical name referencing
    pub const fn uses_logical_name(self) -> bool {
        matches!(self, Self::LogicalName | Self::LogicalNameWithCiphering)
    }

    /// VAA name carried in the InitiateResponse
    ///
    /// LN: 0x0007, SN: base name of the current Association object (0xFA00).
    pub const fn vaa_name(self) -> u16 {
        if self.uses_logical_name() { super::VAA_NAME_LN } else { super::VAA_NAME_SN }
    }
}

impl fmt::Display for ReferencingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogicalName => write!(f, "LN"),
            Self::ShortName => write!(f, "SN"),
            Self::LogicalNameWithCiphering => write!(f, "LN with ciphering"),
            Self::ShortNameWithCiphering => write!(f, "SN with ciphering"),
        }
    }
}

/// Association result returned in AARE
///
/// Reference: Green Book Table 138
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AssociationResult {
    /// Association accepted
    Accepted = 0,
    /// Association rejected permanently
    RejectedPermanent = 1,
    /// Association rejected transiently
    RejectedTransient = 2,
}

impl AssociationResult {
    /// Convert to u8 value
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AssociationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "Accepted"),
            Self::RejectedPermanent => write!(f, "Rejected (Permanent)"),
            Self::RejectedTransient => write!(f, "Rejected (Transient)"),
        }
    }
}

/// ACSE service user diagnostics, the `acse-service-user` choice of
/// Associate-source-diagnostic
///
/// Reference: Green Book Table 138
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AcseServiceUserDiagnostics {
    /// No diagnostic information
    #[default]
    Null = 0,
    NoReasonGiven = 1,
    ApplicationContextNameNotSupported = 2,
    CallingApTitleNotRecognized = 3,
    CallingApInvocationIdentifierNotRecognized = 4,
    CallingAeQualifierNotRecognized = 5,
    CallingAeInvocationIdentifierNotRecognized = 6,
    CalledApTitleNotRecognized = 7,
    CalledApInvocationIdentifierNotRecognized = 8,
    CalledAeQualifierNotRecognized = 9,
    CalledAeInvocationIdentifierNotRecognized = 10,
    /// Reported when the requested mechanism is unknown
    AuthenticationMechanismNameNotRecognised = 11,
    AuthenticationMechanismNameRequired = 12,
    /// Low level password mismatch
    AuthenticationFailure = 13,
    /// HLS: association pending until the client proves itself
    AuthenticationRequired = 14,
}

impl AcseServiceUserDiagnostics {
    /// Convert to u8 value
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AcseServiceUserDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Null => "Null",
            Self::NoReasonGiven => "No reason given",
            Self::ApplicationContextNameNotSupported => "Application context name not supported",
            Self::CallingApTitleNotRecognized => "Calling AP title not recognized",
            Self::CallingApInvocationIdentifierNotRecognized => {
                "Calling AP invocation identifier not recognized"
            }
            Self::CallingAeQualifierNotRecognized => "Calling AE qualifier not recognized",
            Self::CallingAeInvocationIdentifierNotRecognized => {
                "Calling AE invocation identifier not recognized"
            }
            Self::CalledApTitleNotRecognized => "Called AP title not recognized",
            Self::CalledApInvocationIdentifierNotRecognized => {
                "Called AP invocation identifier not recognized"
            }
            Self::CalledAeQualifierNotRecognized => "Called AE qualifier not recognized",
            Self::CalledAeInvocationIdentifierNotRecognized => {
                "Called AE invocation identifier not recognized"
            }
            Self::AuthenticationMechanismNameNotRecognised => {
                "Authentication mechanism name not recognised"
            }
            Self::AuthenticationMechanismNameRequired => "Authentication mechanism name required",
            Self::AuthenticationFailure => "Authentication failure",
            Self::AuthenticationRequired => "Authentication required",
        };
        f.write_str(text)
    }
}

/// Release request reason carried by RLRQ
///
/// Reference: Green Book Table 146
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ReleaseRequestReason {
    Normal = 0,
    Urgent = 1,
    UserDefined = 30,
}

impl fmt::Display for ReleaseRequestReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Urgent => write!(f, "Urgent"),
            Self::UserDefined => write!(f, "User defined"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_level_from_mechanism_id() {
        assert_eq!(AuthenticationLevel::from_mechanism_id(0), AuthenticationLevel::None);
        assert_eq!(AuthenticationLevel::from_mechanism_id(1), AuthenticationLevel::Low);
        assert_eq!(AuthenticationLevel::from_mechanism_id(5), AuthenticationLevel::HighGmac);

        // HLS manufacturer, MD5, SHA-1, SHA-256, ECDSA: not supported here
        for id in [2, 3, 4, 6, 7, 0x42] {
            assert_eq!(AuthenticationLevel::from_mechanism_id(id), AuthenticationLevel::Unknown);
        }
    }

    #[test]
    fn test_referencing_mode() {
        assert_eq!(ReferencingMode::try_from(1), Ok(ReferencingMode::LogicalName));
        assert_eq!(ReferencingMode::try_from(4), Ok(ReferencingMode::ShortNameWithCiphering));
        assert_eq!(ReferencingMode::try_from(5), Err(5));

        assert!(ReferencingMode::LogicalNameWithCiphering.uses_ciphering());
        assert!(ReferencingMode::LogicalNameWithCiphering.uses_logical_name());
        assert!(!ReferencingMode::ShortName.uses_logical_name());

        assert_eq!(ReferencingMode::LogicalName.vaa_name(), 0x0007);
        assert_eq!(ReferencingMode::ShortNameWithCiphering.vaa_name(), 0xFA00);
    }

    #[test]
    fn test_association_result() {
        assert_eq!(AssociationResult::Accepted.as_u8(), 0);
        assert_eq!(AssociationResult::RejectedPermanent.as_u8(), 1);
        assert_eq!(AssociationResult::try_from(2), Ok(AssociationResult::RejectedTransient));
        assert_eq!(AssociationResult::try_from(3), Err(3));
    }

    #[test]
    fn test_diagnostics_all_variants() {
        for value in 0..=14u8 {
            let diag = AcseServiceUserDiagnostics::try_from(value).unwrap();
            assert_eq!(diag.as_u8(), value);
        }
        assert_eq!(AcseServiceUserDiagnostics::try_from(15), Err(15));
        assert_eq!(AcseServiceUserDiagnostics::AuthenticationFailure.as_u8(), 13);
        assert_eq!(AcseServiceUserDiagnostics::AuthenticationRequired.as_u8(), 14);
    }
}
