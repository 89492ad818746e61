//! Platform services the association layer relies on
//!
//! The ACSE server never touches hardware or key storage itself. It asks a
//! [`SystemServices`] implementation for the server system title, for random
//! bytes (server-to-client challenges) and for low level password checks.

use heapless::Vec as HeaplessVec;
use log::warn;
use subtle::ConstantTimeEq;

use crate::{
    association::{Challenge, SystemTitle},
    config::ServerSettings,
    error::AcseError,
};

/// Number of per-address passwords [`StaticServices`] can hold
pub const MAX_PASSWORDS: usize = 4;

/// Collaborators provided by the meter platform
pub trait SystemServices {
    /// Title written in the responding-AP-title field
    fn system_title(&self) -> &SystemTitle;

    /// Fill `buffer` from a cryptographically secure source.
    fn fill_random(&mut self, buffer: &mut [u8]) -> Result<(), AcseError>;

    /// Check a low level security password for the logical device `subject`.
    fn verify_password(&self, subject: u16, candidate: &[u8]) -> bool;
}

/// [`SystemServices`] backed by fixed credentials and `getrandom`
///
/// Bare-metal targets must register a `getrandom` custom backend.
#[derive(Debug, Clone)]
pub struct StaticServices {
    system_title: SystemTitle,
    password: Challenge,
    overrides: HeaplessVec<(u16, Challenge), MAX_PASSWORDS>,
}

impl StaticServices {
    /// Services answering with the title of `settings`, with one password
    /// shared by every logical device.
    ///
    /// The password must be 8 to 64 bytes long.
    pub fn from_settings(settings: &ServerSettings, password: &[u8]) -> Result<Self, AcseError> {
        Ok(Self {
            system_title: settings.system_title,
            password: Challenge::from_slice(password)?,
            overrides: HeaplessVec::new(),
        })
    }

    /// Use a dedicated password for the logical device at `subject`.
    ///
    /// [`AcseServer`](crate::association::AcseServer) checks passwords against
    /// its [`ServerSettings::server_address`], so an override only applies to
    /// the server configured for that SAP. Clone the services into one server
    /// per logical device to serve several of them.
    pub fn with_password(mut self, subject: u16, password: &[u8]) -> Result<Self, AcseError> {
        let password = Challenge::from_slice(password)?;
        if let Some(entry) = self.overrides.iter_mut().find(|(address, _)| *address == subject) {
            entry.1 = password;
            return Ok(self);
        }
        self.overrides.push((subject, password)).map_err(|_| AcseError::BufferFull)?;
        Ok(self)
    }

    fn password_for(&self, subject: u16) -> &Challenge {
        self.overrides
            .iter()
            .find(|(address, _)| *address == subject)
            .map_or(&self.password, |(_, password)| password)
    }
}

impl SystemServices for StaticServices {
    fn system_title(&self) -> &SystemTitle {
        &self.system_title
    }

    fn fill_random(&mut self, buffer: &mut [u8]) -> Result<(), AcseError> {
        getrandom::getrandom(buffer).map_err(|err| {
            warn!("Random source failed: {}", err);
            AcseError::Random
        })
    }

    fn verify_password(&self, subject: u16, candidate: &[u8]) -> bool {
        constant_time_eq(self.password_for(subject).as_slice(), candidate)
    }
}

/// Compare without stopping at the first difference
fn constant_time_eq(expected: &[u8], candidate: &[u8]) -> bool {
    expected.len() == candidate.len() && bool::from(expected.ct_eq(candidate))
}
