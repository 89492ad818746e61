//! ASN.1 BER (Basic Encoding Rules) helpers
//!
//! This module provides the minimal subset of ASN.1 BER needed by the
//! AARQ/AARE codec chains: tag/length headers, short-form length writing,
//! the `[3, 2, 1, v]` INTEGER shape used by AARE results and the fixed-prefix
//! DLMS UA object identifiers.
//!
//! Reference: ISO/IEC 8825-1:2015, DLMS Green Book Ed. 12 Section 11

use nom::{
    IResult,
    error::{Error, ErrorKind},
    number::complete::u8 as nom_u8,
};

use crate::{
    cursor::{ByteCursor, MAX_SHORT_LENGTH},
    error::AcseError,
};

/// Universal INTEGER tag
pub const TAG_INTEGER: u8 = 0x02;

/// Universal OCTET STRING tag
pub const TAG_OCTET_STRING: u8 = 0x04;

/// Universal OBJECT IDENTIFIER tag
pub const TAG_OBJECT_IDENTIFIER: u8 = 0x06;

/// Context-specific primitive tag 0 (GraphicString authentication value)
pub const TAG_CONTEXT_SPECIFIC: u8 = 0x80;

/// Tag number marking the multi-byte (extended) tag form
const EXTENDED_TAG_NUMBER: u8 = 0x1F;

/// DLMS UA object identifier prefix: { 2 16 756 5 8 }
pub const DLMS_UA_OID_PREFIX: [u8; 5] = [0x60, 0x85, 0x74, 0x05, 0x08];

/// Encoded length of a DLMS UA object identifier (prefix + name + id)
pub const DLMS_UA_OID_LEN: usize = 7;

// ============================================================================
// BER Tag Classes and Types
// ============================================================================

/// BER tag class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    /// Universal (0b00)
    Universal,
    /// Application (0b01)
    Application,
    /// Context-specific (0b10)
    ContextSpecific,
    /// Private (0b11)
    Private,
}

impl TagClass {
    /// Parse tag class from upper 2 bits
    pub const fn from_bits(byte: u8) -> Self {
        match byte & 0b11_000000 {
            0b00_000000 => TagClass::Universal,
            0b01_000000 => TagClass::Application,
            0b10_000000 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }
}

/// BER tag type (primitive or constructed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    /// Primitive (0b0)
    Primitive,
    /// Constructed (0b1) - contains nested TLVs
    Constructed,
}

impl TagType {
    /// Parse tag type from bit 5
    pub const fn from_bit(byte: u8) -> Self {
        if byte & 0b0010_0000 != 0 { TagType::Constructed } else { TagType::Primitive }
    }
}

/// A decoded tag/length header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BerHeader {
    /// First identifier octet as it appears on the wire (what codec chains match on)
    pub identifier: u8,
    pub class: TagClass,
    pub tag_type: TagType,
    /// Tag number, taken from the second octet for the extended form
    pub number: u8,
    /// Declared content length
    pub length: usize,
}

impl BerHeader {
    pub const fn is_primitive(&self) -> bool {
        matches!(self.tag_type, TagType::Primitive)
    }
}

// ============================================================================
// BER Header Parsing
// ============================================================================

/// Parse a BER identifier
///
/// Supports the single-octet form and the two-octet extended form
/// (tag numbers 31..=127), which is what the `[APPLICATION 31]` conformance
/// block uses.
///
/// Returns (identifier, class, tag_type, tag_number)
pub fn parse_tag(input: &[u8]) -> IResult<&[u8], (u8, TagClass, TagType, u8)> {
    let (input, byte) = nom_u8(input)?;
    let class = TagClass::from_bits(byte);
    let tag_type = TagType::from_bit(byte);
    let mut tag_number = byte & 0b000_11111;
    let mut input = input;

    if tag_number == EXTENDED_TAG_NUMBER {
        let (rest, extended) = nom_u8(input)?;
        if extended & 0x80 != 0 {
            // More than one subsequent octet is not used by DLMS
            return Err(nom::Err::Error(Error::new(rest, ErrorKind::Tag)));
        }
        tag_number = extended;
        input = rest;
    }

    Ok((input, (byte, class, tag_type, tag_number)))
}

/// Parse BER length in definite form
///
/// Returns the parsed length and remaining input
pub fn parse_length(input: &[u8]) -> IResult<&[u8], usize> {
    let (input, first_byte) = nom_u8(input)?;

    if first_byte & 0x80 == 0 {
        // Short form: length is in the first byte
        Ok((input, first_byte as usize))
    } else {
        // Long form: first byte indicates number of length octets
        let num_octets = (first_byte & 0x7F) as usize;

        if num_octets == 0 {
            // Indefinite form not supported
            return Err(nom::Err::Error(Error::new(input, ErrorKind::LengthValue)));
        }

        if num_octets > 2 {
            // Only support up to 2-byte lengths (max 65535)
            return Err(nom::Err::Error(Error::new(input, ErrorKind::LengthValue)));
        }

        // Parse length bytes (big-endian)
        let mut length = 0usize;
        let mut remaining = input;
        for _ in 0..num_octets {
            let (rest, byte) = nom_u8(remaining)?;
            length = (length << 8) | (byte as usize);
            remaining = rest;
        }

        Ok((remaining, length))
    }
}

/// Parse a complete tag/length header
pub fn parse_header(input: &[u8]) -> IResult<&[u8], BerHeader> {
    let (input, (identifier, class, tag_type, number)) = parse_tag(input)?;
    let (input, length) = parse_length(input)?;
    Ok((input, BerHeader { identifier, class, tag_type, number, length }))
}

/// Decode the header at the cursor read position and step over it
///
/// The declared content length is not checked against the available data;
/// content readers are bounds-checked by the cursor.
pub fn decode_header(cursor: &mut ByteCursor<'_>) -> Result<BerHeader, AcseError> {
    let input = cursor.unread_slice();
    let (rest, header) = parse_header(input).map_err(|_| AcseError::MalformedHeader)?;
    let consumed = input.len() - rest.len();
    cursor.skip(consumed)?;
    Ok(header)
}

// ============================================================================
// BER Writing
// ============================================================================

/// Write a short-form BER length
///
/// Individual AARE fields stay below 128 bytes; anything above is refused
/// instead of being silently truncated. Enclosing lengths go through
/// [`ByteCursor::close_length`], which widens as needed.
pub fn write_length(cursor: &mut ByteCursor<'_>, length: usize) -> Result<(), AcseError> {
    if length > MAX_SHORT_LENGTH {
        return Err(AcseError::LengthOverflow);
    }
    cursor.write_u8(length as u8)
}

/// Write a one-byte INTEGER wrapped in its enclosing length
///
/// Output: `[0x03, 0x02, 0x01, value]`, i.e. the length of the nested TLV
/// followed by the universal INTEGER TLV itself.
pub fn write_integer(cursor: &mut ByteCursor<'_>, value: u8) -> Result<(), AcseError> {
    cursor.write_slice(&[0x03, TAG_INTEGER, 0x01, value])
}

// ============================================================================
// DLMS UA Object Identifiers
// ============================================================================

/// Decode a DLMS UA object identifier
///
/// DLMS only uses identifiers below `{ 2 16 756 5 8 }`, so instead of decoding
/// arcs the prefix is compared byte for byte and the last two octets are
/// returned as (name, id).
pub fn decode_object_identifier(
    header: &BerHeader,
    cursor: &mut ByteCursor<'_>,
) -> Result<(u8, u8), AcseError> {
    if header.length != DLMS_UA_OID_LEN {
        return Err(AcseError::InvalidLength);
    }

    let mut prefix = [0u8; DLMS_UA_OID_PREFIX.len()];
    cursor.read_into(&mut prefix)?;
    if prefix != DLMS_UA_OID_PREFIX {
        return Err(AcseError::UnknownObjectIdentifier);
    }

    let name = cursor.read_u8()?;
    let id = cursor.read_u8()?;
    Ok((name, id))
}

/// Write the length and content of a DLMS UA object identifier
///
/// The tag is written by the caller (the codec chain).
pub fn write_object_identifier(
    cursor: &mut ByteCursor<'_>,
    name: u8,
    id: u8,
) -> Result<(), AcseError> {
    write_length(cursor, DLMS_UA_OID_LEN)?;
    cursor.write_slice(&DLMS_UA_OID_PREFIX)?;
    cursor.write_u8(name)?;
    cursor.write_u8(id)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        // AARQ tag 0x60
        let (_, (id, class, tag_type, num)) = parse_tag(&[0x60]).unwrap();
        assert_eq!(id, 0x60);
        assert_eq!(class, TagClass::Application);
        assert_eq!(tag_type, TagType::Constructed);
        assert_eq!(num, 0);

        // Context[0] primitive 0x80 (protocol-version)
        let (_, (_, class, tag_type, num)) = parse_tag(&[0x80]).unwrap();
        assert_eq!(class, TagClass::ContextSpecific);
        assert_eq!(tag_type, TagType::Primitive);
        assert_eq!(num, 0);
    }

    #[test]
    fn test_parse_tag_extended() {
        // [APPLICATION 31] IMPLICIT BIT STRING (conformance block)
        let (rest, (id, class, tag_type, num)) = parse_tag(&[0x5F, 0x1F, 0x04]).unwrap();
        assert_eq!(rest, &[0x04]);
        assert_eq!(id, 0x5F);
        assert_eq!(class, TagClass::Application);
        assert_eq!(tag_type, TagType::Primitive);
        assert_eq!(num, 31);

        assert!(parse_tag(&[0x5F, 0x81, 0x00]).is_err());
        assert!(parse_tag(&[0x5F]).is_err());
    }

    #[test]
    fn test_parse_length() {
        // Short form
        assert_eq!(parse_length(&[0x05]).unwrap(), (&[][..], 5));
        assert_eq!(parse_length(&[0x7F]).unwrap(), (&[][..], 127));

        // Long form 1 byte
        assert_eq!(parse_length(&[0x81, 0x80]).unwrap(), (&[][..], 128));

        // Long form 2 bytes
        assert_eq!(parse_length(&[0x82, 0x12, 0x34]).unwrap(), (&[][..], 0x1234));

        // Indefinite and oversized forms
        assert!(parse_length(&[0x80]).is_err());
        assert!(parse_length(&[0x83, 0x01, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_decode_header_advances_cursor() {
        let mut buf = [0xA1, 0x09, 0x06, 0x07];
        let mut cursor = ByteCursor::with_data(&mut buf, 4);

        let header = decode_header(&mut cursor).unwrap();
        assert_eq!(header.identifier, 0xA1);
        assert_eq!(header.class, TagClass::ContextSpecific);
        assert!(!header.is_primitive());
        assert_eq!(header.number, 1);
        assert_eq!(header.length, 9);
        assert_eq!(cursor.read_position(), 2);

        let header = decode_header(&mut cursor).unwrap();
        assert_eq!(header.identifier, TAG_OBJECT_IDENTIFIER);
        assert!(header.is_primitive());
        assert_eq!(header.length, 7);
        assert_eq!(cursor.unread(), 0);

        assert_eq!(decode_header(&mut cursor), Err(AcseError::MalformedHeader));
    }

    #[test]
    fn test_decode_object_identifier() {
        let mut buf = [0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01];
        let mut cursor = ByteCursor::with_data(&mut buf, 9);
        let header = decode_header(&mut cursor).unwrap();

        assert_eq!(decode_object_identifier(&header, &mut cursor).unwrap(), (1, 1));
        assert_eq!(cursor.unread(), 0);
    }

    #[test]
    fn test_decode_object_identifier_bad_prefix() {
        let mut buf = [0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x09, 0x01, 0x01];
        let mut cursor = ByteCursor::with_data(&mut buf, 9);
        let header = decode_header(&mut cursor).unwrap();

        assert_eq!(
            decode_object_identifier(&header, &mut cursor),
            Err(AcseError::UnknownObjectIdentifier)
        );
    }

    #[test]
    fn test_decode_object_identifier_bad_length() {
        let mut buf = [0x06, 0x06, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01];
        let mut cursor = ByteCursor::with_data(&mut buf, 8);
        let header = decode_header(&mut cursor).unwrap();

        assert_eq!(decode_object_identifier(&header, &mut cursor), Err(AcseError::InvalidLength));
    }

    #[test]
    fn test_write_helpers() {
        let mut buf = [0u8; 16];
        let mut cursor = ByteCursor::new(&mut buf);

        write_object_identifier(&mut cursor, 2, 5).unwrap();
        write_integer(&mut cursor, 14).unwrap();
        assert_eq!(
            cursor.written(),
            &[0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x02, 0x05, 0x03, 0x02, 0x01, 0x0E]
        );

        assert_eq!(write_length(&mut cursor, 128), Err(AcseError::LengthOverflow));
    }
}
