//! Field-ordered codec chains
//!
//! AARQ and AARE are SEQUENCEs of context-tagged fields that must appear in a
//! fixed order, most of them optional. Each APDU is described by a static
//! table of [`FieldDescriptor`]s: the wire tag, how the field's presence is
//! decided, and which field kind handles its content.
//!
//! The decode walk ([`decode_chain`]) never consumes bytes for an absent
//! optional field. A header that does not match the current descriptor is
//! compared against the next one until a descriptor matches or a mandatory
//! one is missed.

use log::{debug, warn};

use super::{AuthenticationLevel, HandshakeState};
use crate::{
    ber::{BerHeader, decode_header},
    cursor::ByteCursor,
    error::AcseError,
};

/// When a field is expected on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Defined by ACSE but neither decoded nor emitted
    Never,
    /// Mandatory
    Always,
    /// May be absent; a field that fails to decode is dropped
    Optional,
    /// May be absent; a field that is present must decode
    Checked,
    /// Mandatory with high level security, optional otherwise.
    ///
    /// Only the AARE table uses it, for the fields written under HLS.
    Security,
}

impl Presence {
    /// Must the field be present for the given authentication level?
    ///
    /// On the encode side this also decides which fields are written: the
    /// server only writes what it must.
    pub const fn is_mandatory(self, level: AuthenticationLevel) -> bool {
        match self {
            Presence::Always => true,
            Presence::Security => matches!(level, AuthenticationLevel::HighGmac),
            Presence::Never | Presence::Optional | Presence::Checked => false,
        }
    }

    /// Can a field that fails to decode be dropped?
    pub const fn tolerates_failure(self, level: AuthenticationLevel) -> bool {
        match self {
            Presence::Optional => true,
            Presence::Security => !matches!(level, AuthenticationLevel::HighGmac),
            Presence::Never | Presence::Always | Presence::Checked => false,
        }
    }
}

/// One entry of a codec chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor<F> {
    /// First identifier octet of the field
    pub tag: u8,
    pub presence: Presence,
    pub field: F,
}

impl<F> FieldDescriptor<F> {
    pub const fn new(tag: u8, presence: Presence, field: F) -> Self {
        Self { tag, presence, field }
    }
}

/// Content decoder bound to a field kind
pub trait FieldDecoder: Copy {
    /// Field name used in errors and logs
    fn name(self) -> &'static str;

    /// Decode the content announced by `header`, the cursor being positioned
    /// right after it.
    fn decode(
        self,
        header: &BerHeader,
        cursor: &mut ByteCursor<'_>,
        state: &mut HandshakeState,
    ) -> Result<(), AcseError>;

    /// Containers only check their header; their content is decoded by the
    /// following descriptors.
    fn is_container(self) -> bool {
        false
    }
}

/// Walk `table` over the unread bytes of `cursor`, filling `state`.
///
/// The cursor must hold exactly the body of the enclosing APDU.
pub fn decode_chain<F: FieldDecoder>(
    table: &[FieldDescriptor<F>],
    cursor: &mut ByteCursor<'_>,
    state: &mut HandshakeState,
) -> Result<(), AcseError> {
    let mut index = 0;

    while cursor.unread() > 0 {
        let header = decode_header(cursor)?;
        let content_start = cursor.read_position();

        // Find the descriptor for this header, stepping over absent fields
        let descriptor = loop {
            let Some(descriptor) = table.get(index) else {
                warn!("Field 0x{:02X} left over after the last descriptor", header.identifier);
                return Err(AcseError::TrailingData);
            };
            index += 1;

            if descriptor.presence == Presence::Never {
                continue;
            }
            if descriptor.tag == header.identifier {
                break descriptor;
            }
            if descriptor.presence.is_mandatory(state.authentication_level) {
                warn!(
                    "Expected {} (0x{:02X}), found 0x{:02X}",
                    descriptor.field.name(),
                    descriptor.tag,
                    header.identifier
                );
                return Err(AcseError::UnexpectedTag {
                    expected: descriptor.tag,
                    found: header.identifier,
                });
            }
        };

        let field = descriptor.field;
        let result = field.decode(&header, cursor, state).and_then(|()| {
            if field.is_container() || cursor.read_position() == content_start + header.length {
                Ok(())
            } else {
                Err(AcseError::InvalidLength)
            }
        });

        match result {
            Ok(()) => debug!("Decoded {} (0x{:02X})", field.name(), descriptor.tag),
            Err(err) if descriptor.presence.tolerates_failure(state.authentication_level) => {
                warn!("Dropping {}: {}", field.name(), err);
                cursor.set_read_position(content_start + header.length)?;
            }
            Err(err) => {
                warn!("Invalid {}: {}", field.name(), err);
                return Err(err);
            }
        }
    }

    // Whatever was not seen must be optional
    if let Some(missing) = table[index..]
        .iter()
        .find(|descriptor| descriptor.presence.is_mandatory(state.authentication_level))
    {
        warn!("Missing {} (0x{:02X})", missing.field.name(), missing.tag);
        return Err(AcseError::MissingField(missing.field.name()));
    }

    Ok(())
}
