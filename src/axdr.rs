//! A-XDR primitives used inside the xDLMS InitiateRequest
//!
//! Only what the association layer needs: the null token standing for an
//! absent OPTIONAL/DEFAULT component, and stepping over an OPTIONAL
//! OCTET STRING.
//!
//! Reference: IEC 61334-6, DLMS Green Book Ed. 12 Section 9.5

use crate::{cursor::ByteCursor, error::AcseError};

/// A-XDR null / "component absent" marker
pub const AXDR_NULL: u8 = 0x00;

/// A-XDR "component present" marker for OPTIONAL elements
pub const AXDR_PRESENT: u8 = 0x01;

/// Consume a null token.
pub fn read_null(cursor: &mut ByteCursor<'_>) -> Result<(), AcseError> {
    match cursor.read_u8()? {
        AXDR_NULL => Ok(()),
        _ => Err(AcseError::InvalidContent("A-XDR null")),
    }
}

/// Step over an OPTIONAL OCTET STRING without keeping it.
///
/// Returns the length of the skipped value, `None` when the component is absent.
pub fn skip_optional_octet_string(cursor: &mut ByteCursor<'_>) -> Result<Option<usize>, AcseError> {
    match cursor.read_u8()? {
        AXDR_NULL => Ok(None),
        AXDR_PRESENT => {
            let length = cursor.read_u8()? as usize;
            cursor.skip(length)?;
            Ok(Some(length))
        }
        _ => Err(AcseError::InvalidContent("A-XDR optional")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_null() {
        let mut buf = [0x00, 0x01];
        let mut cursor = ByteCursor::with_data(&mut buf, 2);

        assert_eq!(read_null(&mut cursor), Ok(()));
        assert_eq!(read_null(&mut cursor), Err(AcseError::InvalidContent("A-XDR null")));
        assert_eq!(read_null(&mut cursor), Err(AcseError::UnexpectedEnd));
    }

    #[test]
    fn test_skip_optional_octet_string() {
        let mut buf = [0x00, 0x01, 0x03, 0xAA, 0xBB, 0xCC, 0x06];
        let mut cursor = ByteCursor::with_data(&mut buf, 7);

        assert_eq!(skip_optional_octet_string(&mut cursor), Ok(None));
        assert_eq!(skip_optional_octet_string(&mut cursor), Ok(Some(3)));
        assert_eq!(cursor.read_u8(), Ok(0x06));
    }

    #[test]
    fn test_skip_optional_octet_string_truncated() {
        let mut buf = [0x01, 0x10, 0xAA];
        let mut cursor = ByteCursor::with_data(&mut buf, 3);

        assert_eq!(skip_optional_octet_string(&mut cursor), Err(AcseError::UnexpectedEnd));
    }
}
