//! Association Layer - server side of the DLMS/COSEM ACSE
//!
//! This module answers Application Association (AA) establishment and release:
//! - AARQ (A-Associate Request) is decoded field by field,
//! - the grant decision picks the association result and the session state,
//! - AARE (A-Associate Response) is written in place of the request,
//! - RLRQ (A-Release Request) is answered with a fixed RLRE.
//!
//! Reference: DLMS Green Book Ed. 12, Section 11
//!
//! # Architecture
//!
//! The association establishment follows this sequence:
//! 1. Client sends AARQ APDU (tag 0x60) containing:
//!    - Application context (LN/SN, with/without ciphering)
//!    - Authentication mechanism and credentials
//!    - xDLMS InitiateRequest with conformance and PDU size
//! 2. Server responds with AARE APDU (tag 0x61) containing:
//!    - Association result (accepted/rejected)
//!    - Diagnostic information if rejected
//!    - HLS only: server system title and StoC challenge
//!    - xDLMS InitiateResponse with the server parameters
//!
//! # Encoding
//!
//! - AARQ/AARE use ASN.1 BER encoding with context-specific tags
//! - xDLMS APDUs (InitiateRequest/Response) use A-XDR encoding
//! - Both APDUs are described by field tables, see [`chain`]

pub use self::{
    chain::{FieldDecoder, FieldDescriptor, Presence},
    conformance::Conformance,
    enums::*,
    handshake::{
        AssociationState, Challenge, HandshakeState, MAX_CHALLENGE_LEN, MIN_CHALLENGE_LEN,
        SystemTitle,
    },
    initiate::{InitiateRequest, InitiateResponse},
    server::{AcseServer, GrantDecision},
};

pub mod aare;
pub mod aarq;
pub mod chain;
mod conformance;
mod enums;
mod handshake;
mod initiate;
pub mod release;
mod server;

/// ASN.1 BER tag for AARQ APDU
pub const AARQ_TAG: u8 = 0x60;

/// ASN.1 BER tag for AARE APDU
pub const AARE_TAG: u8 = 0x61;

/// ASN.1 BER tag for RLRQ APDU
pub const RLRQ_TAG: u8 = 0x62;

/// ASN.1 BER tag for RLRE APDU
pub const RLRE_TAG: u8 = 0x63;

/// xDLMS VAA name for Logical Name referencing
pub const VAA_NAME_LN: u16 = 0x0007;

/// xDLMS VAA name for Short Name referencing (base name of the Association SN object)
pub const VAA_NAME_SN: u16 = 0xFA00;

/// Default DLMS version number (version 6)
pub const DLMS_VERSION: u8 = 6;

/// Size of a system title
pub const SYSTEM_TITLE_LEN: usize = 8;

/// Object identifier name class of application context names
pub const APPLICATION_CONTEXT_NAME: u8 = 1;

/// Object identifier name class of authentication mechanism names
pub const SECURITY_MECHANISM_NAME: u8 = 2;

/// Protocol version / ACSE requirements BIT STRING: 7 unused bits, bit 0 set
pub(crate) const VERSION1_BIT_STRING: [u8; 2] = [0x07, 0x80];
