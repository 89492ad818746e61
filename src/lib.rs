//! Server-side ACSE association layer for DLMS/COSEM meters.
//!
//! This crate implements the association control part of a DLMS/COSEM server:
//! - decoding of the AARQ APDU (A-Associate Request) sent by a client,
//! - the grant decision (no security, low level password, high level GMAC),
//! - encoding of the AARE APDU (A-Associate Response) in place,
//! - release handling (RLRQ in, fixed RLRE out).
//!
//! Reference: DLMS Green Book Ed. 12, Section 11
//!
//! # Usage
//!
//! ```
//! use dlms_acse::{
//!     association::{AcseServer, AssociationState, ConnectionState},
//!     config::ServerSettings,
//!     services::StaticServices,
//! };
//!
//! let settings = ServerSettings::default();
//! let services = StaticServices::from_settings(&settings, b"12345678").unwrap();
//! let mut server = AcseServer::new(settings, services);
//! let mut state = AssociationState::new();
//!
//! // AARQ: LN referencing, no authentication
//! let aarq = [
//!     0x60, 0x1D, 0xA1, 0x09, 0x06, 0x07, 0x60, 0x85, 0x74, 0x05, 0x08, 0x01, 0x01, 0xBE,
//!     0x10, 0x04, 0x0E, 0x01, 0x00, 0x00, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x7E,
//!     0x1F, 0x04, 0xB0,
//! ];
//! let mut buffer = [0u8; 256];
//! buffer[..aarq.len()].copy_from_slice(&aarq);
//!
//! let reply_len = server.execute(&mut state, &mut buffer, aarq.len());
//! assert!(reply_len > 0);
//! assert_eq!(buffer[0], 0x61);
//! assert_eq!(state.connection(), ConnectionState::Associated);
//! ```
//!
//! # Features
//!
//! - `std` (default): `std::error::Error` for [`error::AcseError`] and OS randomness
//! - `serde`: (de)serialization of [`config::ServerSettings`] and the public enums

#![no_std]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod association;
pub mod axdr;
pub mod ber;
pub mod config;
pub mod cursor;
pub mod error;
pub mod services;

pub use error::AcseError;
