//! Server configuration

use crate::association::{Conformance, SystemTitle};

/// Settings of the logical device answering association requests
///
/// # Examples
///
/// ```
/// use dlms_acse::{association::Conformance, config::ServerSettings};
///
/// let settings = ServerSettings {
///     conformance: ServerSettings::default().conformance | Conformance::BLOCK_TRANSFER_WITH_ACTION,
///     ..Default::default()
/// };
/// assert_eq!(settings.max_receive_pdu_size, 0x0400);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServerSettings {
    /// Server SAP, used as the subject of low level password checks.
    /// Default: 1 (Management Logical Device).
    pub server_address: u16,
    /// Conformance written in every InitiateResponse.
    /// Default: GET, SET, selective access, ACTION, block transfer with GET.
    pub conformance: Conformance,
    /// Largest APDU the server accepts.
    /// Default: 0x0400 (1024).
    pub max_receive_pdu_size: u16,
    /// Title of this server, written in the responding-AP-title of HLS AAREs
    /// through [`StaticServices::from_settings`](crate::services::StaticServices::from_settings).
    /// Default: 4D4D4D0000BC614E (Green Book example meter).
    pub system_title: SystemTitle,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            server_address: 1, // Management Logical Device
            conformance: Conformance::DEFAULT_SERVER,
            max_receive_pdu_size: 0x0400,
            system_title: SystemTitle::new([0x4D, 0x4D, 0x4D, 0x00, 0x00, 0xBC, 0x61, 0x4E]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ServerSettings::default();
        assert_eq!(settings.server_address, 1);
        assert_eq!(settings.conformance.to_bytes(), [0x00, 0x10, 0x1D]);
        assert_eq!(settings.max_receive_pdu_size, 0x0400);
        assert_eq!(settings.system_title.as_bytes()[..3], *b"MMM");
    }
}
