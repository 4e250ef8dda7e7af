// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! USM user table (spec §3, §4.4): the per-user security parameters a
//! manager or simulator needs to authenticate and/or encrypt v3 traffic.

use crate::{error::SnmpError, usm::key::localize_key};

/// `usmUserAuthProtocol` (RFC 3414 §5, RFC 7860 for the SHA-2 entries).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProtocol {
    None,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// `usmUserPrivProtocol` (RFC 3414 §5 for DES, RFC 3826 for AES).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivProtocol {
    None,
    Des,
    Aes128,
    Aes192,
    Aes256,
}

/// A configured v3 user, with keys already localized to a specific
/// `engine_id` (spec §4.4 "Key localization"). A user object is only
/// valid for the engine it was localized against.
#[derive(Debug, Clone)]
pub struct UsmUser {
    pub security_name: String,
    pub engine_id: Vec<u8>,
    pub auth_protocol: AuthProtocol,
    pub priv_protocol: PrivProtocol,
    pub auth_key: Vec<u8>,
    pub priv_key: Vec<u8>,
}

impl UsmUser {
    /// Build a user from plaintext passphrases, localizing both keys to
    /// `engine_id` immediately (spec §4.4).
    pub fn from_passphrases(
        security_name: impl Into<String>,
        engine_id: impl Into<Vec<u8>>,
        auth_protocol: AuthProtocol,
        auth_passphrase: Option<&str>,
        priv_protocol: PrivProtocol,
        priv_passphrase: Option<&str>,
    ) -> Result<Self, SnmpError> {
        let engine_id = engine_id.into();
        let auth_key = match (auth_protocol, auth_passphrase) {
            (AuthProtocol::None, _) => Vec::new(),
            (_, None) => {
                return Err(SnmpError::InvalidArgument(
                    "auth protocol configured without a passphrase".into(),
                ));
            }
            (proto, Some(pass)) => localize_key(proto, pass.as_bytes(), &engine_id)?,
        };
        let priv_key = match (priv_protocol, priv_passphrase) {
            (PrivProtocol::None, _) => Vec::new(),
            (_, None) => {
                return Err(SnmpError::InvalidArgument(
                    "privacy protocol configured without a passphrase".into(),
                ));
            }
            // RFC 3414/3826: the privacy key is derived with the *auth*
            // protocol's hash, then truncated to the cipher's key size.
            (proto, Some(pass)) => {
                let localized = localize_key(auth_protocol, pass.as_bytes(), &engine_id)?;
                truncate_priv_key(proto, localized)?
            }
        };
        Ok(UsmUser {
            security_name: security_name.into(),
            engine_id,
            auth_protocol,
            priv_protocol,
            auth_key,
            priv_key,
        })
    }

    pub fn has_auth(&self) -> bool {
        self.auth_protocol != AuthProtocol::None
    }

    pub fn has_priv(&self) -> bool {
        self.priv_protocol != PrivProtocol::None
    }
}

fn truncate_priv_key(protocol: PrivProtocol, localized: Vec<u8>) -> Result<Vec<u8>, SnmpError> {
    let needed = match protocol {
        PrivProtocol::None => 0,
        PrivProtocol::Des => 16,
        PrivProtocol::Aes128 => 16,
        PrivProtocol::Aes192 => 24,
        PrivProtocol::Aes256 => 32,
    };
    if localized.len() < needed {
        // Only possible with MD5 localization (16 bytes) feeding AES-192/256
        // (24/32 bytes needed); RFC 3414 does not define key extension for
        // this combination.
        return Err(SnmpError::InvalidArgument(format!(
            "auth protocol's digest is too short to derive a {needed}-byte privacy key"
        )));
    }
    let mut key = localized;
    key.truncate(needed);
    Ok(key)
}
