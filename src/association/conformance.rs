//! Conformance block carried in InitiateRequest/InitiateResponse
//!
//! The block is a 24-bit BIT STRING (`[APPLICATION 31] IMPLICIT BIT STRING (SIZE(24))`).
//! Bit 0 of the ASN.1 definition is the most significant bit of the first octet
//! on the wire, so the constants below are the big-endian values of the three
//! octets following the unused-bits byte.
//!
//! Reference: DLMS Green Book Ed. 12, Table 133

use core::fmt;

/// Conformance bits indicating supported DLMS services
///
/// # Examples
///
/// ```
/// use dlms_acse::association::Conformance;
///
/// let server = Conformance::GET | Conformance::SET | Conformance::ACTION;
/// let client = Conformance::from_bytes([0x00, 0x7E, 0x1F]);
///
/// assert!(client.contains(Conformance::GET));
/// assert_eq!((client & server).to_bytes(), [0x00, 0x00, 0x19]);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Conformance {
    bits: u32,
}

impl Conformance {
    /// Reserved (bit 0)
    pub const RESERVED_ZERO: Self = Self { bits: 0x80_0000 };

    /// General protection (bit 1)
    pub const GENERAL_PROTECTION: Self = Self { bits: 0x40_0000 };

    /// General block transfer (bit 2)
    pub const GENERAL_BLOCK_TRANSFER: Self = Self { bits: 0x20_0000 };

    /// Read (bit 3) - Short Name referencing
    pub const READ: Self = Self { bits: 0x10_0000 };

    /// Write (bit 4) - Short Name referencing
    pub const WRITE: Self = Self { bits: 0x08_0000 };

    /// Unconfirmed write (bit 5)
    pub const UNCONFIRMED_WRITE: Self = Self { bits: 0x04_0000 };

    // bits 6 and 7 are reserved

    /// Attribute 0 supported with SET (bit 8)
    pub const ATTRIBUTE_0_SUPPORTED_WITH_SET: Self = Self { bits: 0x00_8000 };

    /// Priority management supported (bit 9)
    pub const PRIORITY_MGMT_SUPPORTED: Self = Self { bits: 0x00_4000 };

    /// Attribute 0 supported with GET (bit 10)
    pub const ATTRIBUTE_0_SUPPORTED_WITH_GET: Self = Self { bits: 0x00_2000 };

    /// Block transfer with GET or READ (bit 11)
    pub const BLOCK_TRANSFER_WITH_GET_OR_READ: Self = Self { bits: 0x00_1000 };

    /// Block transfer with SET or WRITE (bit 12)
    pub const BLOCK_TRANSFER_WITH_SET_OR_WRITE: Self = Self { bits: 0x00_0800 };

    /// Block transfer with ACTION (bit 13)
    pub const BLOCK_TRANSFER_WITH_ACTION: Self = Self { bits: 0x00_0400 };

    /// Multiple references (bit 14)
    pub const MULTIPLE_REFERENCES: Self = Self { bits: 0x00_0200 };

    /// Information report (bit 15)
    pub const INFORMATION_REPORT: Self = Self { bits: 0x00_0100 };

    /// Data notification (bit 16)
    pub const DATA_NOTIFICATION: Self = Self { bits: 0x00_0080 };

    /// Access (bit 17)
    pub const ACCESS: Self = Self { bits: 0x00_0040 };

    /// Parameterized access (bit 18)
    pub const PARAMETERIZED_ACCESS: Self = Self { bits: 0x00_0020 };

    /// GET (bit 19) - Logical Name referencing
    pub const GET: Self = Self { bits: 0x00_0010 };

    /// SET (bit 20) - Logical Name referencing
    pub const SET: Self = Self { bits: 0x00_0008 };

    /// Selective access (bit 21)
    pub const SELECTIVE_ACCESS: Self = Self { bits: 0x00_0004 };

    /// Event notification (bit 22)
    pub const EVENT_NOTIFICATION: Self = Self { bits: 0x00_0002 };

    /// ACTION (bit 23) - Logical Name referencing
    pub const ACTION: Self = Self { bits: 0x00_0001 };

    /// Empty conformance (no services)
    pub const EMPTY: Self = Self { bits: 0 };

    /// Server conformance used when nothing else is configured
    pub const DEFAULT_SERVER: Self = Self {
        bits: Self::GET.bits
            | Self::SET.bits
            | Self::SELECTIVE_ACCESS.bits
            | Self::ACTION.bits
            | Self::BLOCK_TRANSFER_WITH_GET_OR_READ.bits,
    };

    /// Create conformance from raw bits (masked to 24 bits)
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits: bits & 0x00FF_FFFF }
    }

    /// Get raw bits value
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Create conformance from the 3 wire octets (big-endian)
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        let bits = ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32);
        Self::from_bits(bits)
    }

    /// Convert to the 3 wire octets (big-endian)
    pub const fn to_bytes(self) -> [u8; 3] {
        [
            ((self.bits >> 16) & 0xFF) as u8,
            ((self.bits >> 8) & 0xFF) as u8,
            (self.bits & 0xFF) as u8,
        ]
    }

    /// Check if this conformance contains a specific flag
    pub const fn contains(self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Check if this conformance is empty
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Bitwise OR of two conformance values
    pub const fn union(self, other: Self) -> Self {
        Self { bits: self.bits | other.bits }
    }

    /// Bitwise AND of two conformance values
    pub const fn intersection(self, other: Self) -> Self {
        Self { bits: self.bits & other.bits }
    }
}

impl core::ops::BitOr for Conformance {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign for Conformance {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl core::ops::BitAnd for Conformance {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl core::ops::BitAndAssign for Conformance {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = self.intersection(rhs);
    }
}

impl fmt::Debug for Conformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conformance").field("bits", &format_args!("0x{:06X}", self.bits)).finish()
    }
}

impl fmt::Display for Conformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Conformance(0x{:06X})", self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conformance_wire_positions() {
        // Green Book example InitiateResponse: 5F 1F 04 00 00 10 1D
        let conf = Conformance::from_bytes([0x00, 0x10, 0x1D]);
        assert_eq!(conf, Conformance::DEFAULT_SERVER);
        assert!(conf.contains(Conformance::BLOCK_TRANSFER_WITH_GET_OR_READ));
        assert!(!conf.contains(Conformance::READ));
    }

    #[test]
    fn test_conformance_bytes() {
        let conf = Conformance::GENERAL_PROTECTION | Conformance::ACTION;
        assert_eq!(conf.to_bytes(), [0x40, 0x00, 0x01]);
        assert_eq!(Conformance::from_bytes([0x40, 0x00, 0x01]), conf);
        assert_eq!(Conformance::from_bits(0xFF00_0001).bits(), 0x01);
    }

    #[test]
    fn test_conformance_intersection() {
        // Typical client proposal 00 7E 1F
        let client = Conformance::from_bytes([0x00, 0x7E, 0x1F]);
        let negotiated = client & Conformance::DEFAULT_SERVER;

        assert!(negotiated.contains(Conformance::GET));
        assert!(negotiated.contains(Conformance::BLOCK_TRANSFER_WITH_GET_OR_READ));
        assert!(!negotiated.contains(Conformance::MULTIPLE_REFERENCES));
        assert_eq!(negotiated, Conformance::DEFAULT_SERVER);

        let narrow = client & (Conformance::GET | Conformance::ATTRIBUTE_0_SUPPORTED_WITH_SET);
        assert_eq!(narrow, Conformance::GET);
    }

    #[test]
    fn test_conformance_bitops() {
        let mut conf = Conformance::EMPTY;
        assert!(conf.is_empty());

        conf |= Conformance::GET;
        assert!(conf.contains(Conformance::GET));

        conf &= Conformance::SET;
        assert!(conf.is_empty());
    }
}
