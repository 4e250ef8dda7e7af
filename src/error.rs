// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Crate-wide error taxonomy.
//!
//! Every fallible operation in this crate returns [`SnmpError`] (or a type
//! convertible into it) rather than an opaque string, so callers can match
//! on the failure kind the way the protocol itself distinguishes them:
//! transport failures, wire-format failures, SNMP error-status values
//! reflected back from a peer, and USM security failures.

use thiserror::Error;

/// Result alias used throughout the public API.
pub type Result<T> = std::result::Result<T, SnmpError>;

/// Decode-time failures produced by the BER codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    #[error("truncated: needed {needed} bytes, had {available}")]
    Truncated { needed: usize, available: usize },
    #[error("unexpected tag: got {got:#04x}, expected {expected:#04x}")]
    UnexpectedTag { got: u8, expected: u8 },
    #[error("malformed length encoding")]
    MalformedLength,
    #[error("malformed object identifier")]
    MalformedOid,
    #[error("integer out of range for target type")]
    IntegerOutOfRange,
    #[error("invalid boolean encoding")]
    InvalidBoolean,
    #[error("trailing bytes after outermost SEQUENCE")]
    TrailingBytes,
    #[error("non-minimal integer encoding rejected in strict mode")]
    NonMinimalInteger,
}

/// Cryptographic failures from the USM security subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoErrorKind {
    #[error("no authentication key configured for this user")]
    NoAuthKey,
    #[error("no privacy key configured for this user")]
    NoPrivKey,
    #[error("HMAC verification failed")]
    HmacMismatch,
    #[error("wrong MAC length: expected {expected}, got {actual}")]
    WrongMacLength { expected: usize, actual: usize },
    #[error("unsupported authentication protocol")]
    UnsupportedAuthProtocol,
    #[error("unsupported privacy protocol")]
    UnsupportedPrivProtocol,
    #[error("invalid privParameters length: expected {expected}, got {actual}")]
    InvalidPrivParamsLength { expected: usize, actual: usize },
    #[error("ciphertext length {length} is not a multiple of block size {block_size}")]
    InvalidCiphertextLength { length: usize, block_size: usize },
    #[error("invalid padding in decrypted scoped PDU")]
    InvalidPadding,
    #[error("cipher operation failed")]
    CipherFailure,
}

/// The complete error taxonomy from spec §7.
#[derive(Debug, Error)]
pub enum SnmpError {
    // --- Transport ---
    #[error("request timed out after {retries} retries")]
    Timeout { retries: u32 },
    #[error("failed to send request: {0}")]
    SendError(String),
    #[error("network unreachable")]
    NetworkUnreachable,
    #[error("host unreachable")]
    HostUnreachable,

    // --- Protocol ---
    #[error("decode error: {0}")]
    Decode(#[from] DecodeErrorKind),
    #[error("protocol error: {0}")]
    ProtocolError(String),
    #[error("non-increasing OID returned by peer during walk")]
    NonIncreasingOid,
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u8, got: u8 },
    #[error("operation unsupported for this SNMP version")]
    UnsupportedForVersion,

    // --- SNMP error-status (mapped from the wire) ---
    #[error("tooBig")]
    TooBig,
    #[error("noSuchName")]
    NoSuchName,
    #[error("badValue")]
    BadValue,
    #[error("readOnly")]
    ReadOnly,
    #[error("genErr")]
    GenErr,
    #[error("noAccess")]
    NoAccess,
    #[error("wrongType")]
    WrongType,
    #[error("wrongLength")]
    WrongLength,
    #[error("wrongEncoding")]
    WrongEncoding,
    #[error("wrongValue")]
    WrongValue,
    #[error("noCreation")]
    NoCreation,
    #[error("inconsistentValue")]
    InconsistentValue,
    #[error("resourceUnavailable")]
    ResourceUnavailable,
    #[error("commitFailed")]
    CommitFailed,
    #[error("undoFailed")]
    UndoFailed,
    #[error("authorizationError")]
    AuthorizationError,
    #[error("notWritable")]
    NotWritable,
    #[error("inconsistentName")]
    InconsistentName,

    // --- v2c in-band varbind exceptions, surfaced as errors only when the
    // caller explicitly asked a single-varbind accessor to treat them as such ---
    #[error("noSuchObject")]
    NoSuchObject,
    #[error("noSuchInstance")]
    NoSuchInstance,
    #[error("endOfMibView")]
    EndOfMibView,

    // --- Security ---
    #[error("authentication failure")]
    AuthFailure,
    #[error("decryption failure: {0}")]
    Decryption(#[from] CryptoErrorKind),
    #[error("unknown engine id")]
    UnknownEngineId,
    #[error("not in time window (clock skew or stale engine_boots)")]
    NotInTimeWindow,
    #[error("unknown user name")]
    UnknownUserName,
    #[error("wrong digest")]
    WrongDigest,

    // --- Control flow ---
    #[error("walk cancelled")]
    Cancelled,
    #[error("operation invalid: {0}")]
    InvalidArgument(String),
}

/// Translate a wire `error_status` code (spec §3 PDU, §4.2.5) into the
/// matching [`SnmpError`] variant.
impl SnmpError {
    pub fn from_error_status(status: i32) -> Option<Self> {
        Some(match status {
            0 => return None,
            1 => SnmpError::TooBig,
            2 => SnmpError::NoSuchName,
            3 => SnmpError::BadValue,
            4 => SnmpError::ReadOnly,
            5 => SnmpError::GenErr,
            6 => SnmpError::NoAccess,
            7 => SnmpError::WrongType,
            8 => SnmpError::WrongLength,
            9 => SnmpError::WrongEncoding,
            10 => SnmpError::WrongValue,
            11 => SnmpError::NoCreation,
            12 => SnmpError::InconsistentValue,
            13 => SnmpError::ResourceUnavailable,
            14 => SnmpError::CommitFailed,
            15 => SnmpError::UndoFailed,
            16 => SnmpError::AuthorizationError,
            17 => SnmpError::NotWritable,
            18 => SnmpError::InconsistentName,
            _ => SnmpError::GenErr,
        })
    }

    /// Wire `error_status` code for this error, if it maps to one (spec §3).
    pub fn to_error_status(&self) -> i32 {
        match self {
            SnmpError::TooBig => 1,
            SnmpError::NoSuchName => 2,
            SnmpError::BadValue => 3,
            SnmpError::ReadOnly => 4,
            SnmpError::GenErr => 5,
            SnmpError::NoAccess => 6,
            SnmpError::WrongType => 7,
            SnmpError::WrongLength => 8,
            SnmpError::WrongEncoding => 9,
            SnmpError::WrongValue => 10,
            SnmpError::NoCreation => 11,
            SnmpError::InconsistentValue => 12,
            SnmpError::ResourceUnavailable => 13,
            SnmpError::CommitFailed => 14,
            SnmpError::UndoFailed => 15,
            SnmpError::AuthorizationError => 16,
            SnmpError::NotWritable => 17,
            SnmpError::InconsistentName => 18,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_round_trips() {
        for status in 1..=18 {
            let err = SnmpError::from_error_status(status).expect("mapped");
            assert_eq!(err.to_error_status(), status);
        }
    }

    #[test]
    fn zero_status_is_not_an_error() {
        assert!(SnmpError::from_error_status(0).is_none());
    }
}
