// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! HMAC-based message authentication (spec §4.4 "Authentication").
//! `msgAuthenticationParameters` is computed over the whole serialized
//! message with the field itself zeroed, then truncated to a
//! protocol-specific width and substituted in place.

use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::{
    error::{CryptoErrorKind, SnmpError},
    usm::user::AuthProtocol,
};

/// Width of `msgAuthenticationParameters` on the wire. MD5/SHA1 use the
/// legacy RFC 3414 96-bit truncation; the RFC 7860 SHA-2 protocols each
/// define their own width.
pub fn auth_param_len(protocol: AuthProtocol) -> usize {
    match protocol {
        AuthProtocol::None => 0,
        AuthProtocol::Md5 | AuthProtocol::Sha1 => 12,
        AuthProtocol::Sha224 => 16,
        AuthProtocol::Sha256 => 24,
        AuthProtocol::Sha384 => 32,
        AuthProtocol::Sha512 => 48,
    }
}

/// Compute the truncated HMAC of `message` under `key`.
pub fn compute_mac(protocol: AuthProtocol, key: &[u8], message: &[u8]) -> Result<Vec<u8>, SnmpError> {
    let len = auth_param_len(protocol);
    let full = match protocol {
        AuthProtocol::None => return Err(CryptoErrorKind::UnsupportedAuthProtocol.into()),
        AuthProtocol::Md5 => {
            let mut mac = Hmac::<Md5>::new_from_slice(key).map_err(|_| CryptoErrorKind::NoAuthKey)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        AuthProtocol::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(|_| CryptoErrorKind::NoAuthKey)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        AuthProtocol::Sha224 => {
            let mut mac = Hmac::<Sha224>::new_from_slice(key).map_err(|_| CryptoErrorKind::NoAuthKey)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        AuthProtocol::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(|_| CryptoErrorKind::NoAuthKey)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        AuthProtocol::Sha384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(key).map_err(|_| CryptoErrorKind::NoAuthKey)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        AuthProtocol::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key).map_err(|_| CryptoErrorKind::NoAuthKey)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
    };
    Ok(full[..len].to_vec())
}

/// Verify `received` against a freshly computed MAC over `message` (which
/// must already have its auth-params field zeroed).
pub fn verify_mac(
    protocol: AuthProtocol,
    key: &[u8],
    message: &[u8],
    received: &[u8],
) -> Result<(), SnmpError> {
    let expected = compute_mac(protocol, key, message)?;
    if expected.len() != received.len() {
        return Err(CryptoErrorKind::WrongMacLength { expected: expected.len(), actual: received.len() }.into());
    }
    // Constant-time-ish comparison: fold over the whole slice regardless
    // of where the first mismatch occurs.
    let diff = expected
        .iter()
        .zip(received.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    if diff == 0 {
        Ok(())
    } else {
        Err(SnmpError::WrongDigest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_round_trips() {
        let key = vec![1u8; 16];
        let message = b"the quick brown fox";
        let mac = compute_mac(AuthProtocol::Sha1, &key, message).unwrap();
        assert_eq!(mac.len(), auth_param_len(AuthProtocol::Sha1));
        verify_mac(AuthProtocol::Sha1, &key, message, &mac).unwrap();
    }

    #[test]
    fn tampered_message_fails_verification() {
        let key = vec![1u8; 16];
        let mac = compute_mac(AuthProtocol::Md5, &key, b"hello").unwrap();
        assert!(verify_mac(AuthProtocol::Md5, &key, b"hellp", &mac).is_err());
    }

    #[test]
    fn sha2_widths_match_rfc7860() {
        let key = vec![2u8; 32];
        assert_eq!(compute_mac(AuthProtocol::Sha224, &key, b"x").unwrap().len(), 16);
        assert_eq!(compute_mac(AuthProtocol::Sha256, &key, b"x").unwrap().len(), 24);
        assert_eq!(compute_mac(AuthProtocol::Sha384, &key, b"x").unwrap().len(), 32);
        assert_eq!(compute_mac(AuthProtocol::Sha512, &key, b"x").unwrap().len(), 48);
    }
}
