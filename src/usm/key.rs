// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! RFC 3414 §A.2/§A.3 key localization: turn a human passphrase into a
//! key bound to one authoritative engine.

use digest::Digest;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::{error::SnmpError, usm::user::AuthProtocol};

/// Number of octets the password-to-key algorithm expands the passphrase
/// to before hashing (RFC 3414 §A.2, the "1,048,576 octets" constant).
const EXPANDED_LENGTH: usize = 1_048_576;

pub fn localize_key(
    protocol: AuthProtocol,
    passphrase: &[u8],
    engine_id: &[u8],
) -> Result<Vec<u8>, SnmpError> {
    if passphrase.is_empty() {
        return Err(SnmpError::InvalidArgument("empty passphrase".into()));
    }
    Ok(match protocol {
        AuthProtocol::None => Vec::new(),
        AuthProtocol::Md5 => localize::<Md5>(passphrase, engine_id),
        AuthProtocol::Sha1 => localize::<Sha1>(passphrase, engine_id),
        AuthProtocol::Sha224 => localize::<Sha224>(passphrase, engine_id),
        AuthProtocol::Sha256 => localize::<Sha256>(passphrase, engine_id),
        AuthProtocol::Sha384 => localize::<Sha384>(passphrase, engine_id),
        AuthProtocol::Sha512 => localize::<Sha512>(passphrase, engine_id),
    })
}

/// `Ku = H(expand(passphrase))`, then `Kul = H(Ku || engineID || Ku)`.
fn localize<D: Digest>(passphrase: &[u8], engine_id: &[u8]) -> Vec<u8> {
    let ku = password_to_key::<D>(passphrase);
    let mut hasher = D::new();
    hasher.update(&ku);
    hasher.update(engine_id);
    hasher.update(&ku);
    hasher.finalize().to_vec()
}

fn password_to_key<D: Digest>(passphrase: &[u8]) -> Vec<u8> {
    let mut hasher = D::new();
    let mut buf = [0u8; 64];
    let mut produced = 0usize;
    let plen = passphrase.len();
    while produced < EXPANDED_LENGTH {
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = passphrase[(produced + i) % plen];
        }
        hasher.update(buf);
        produced += 64;
    }
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_localization_matches_rfc3414_appendix_a_example() {
        // RFC 3414 Appendix A.3.1: passphrase "maplesyrup" localized to
        // engineID 0x000000000000000000000002.
        let engine_id = hex_literal::hex!("000000000000000000000002");
        let key = localize_key(AuthProtocol::Md5, b"maplesyrup", &engine_id).unwrap();
        assert_eq!(key, hex_literal::hex!("526f5eed9fcce26f8964c2930787d82b"));
    }

    #[test]
    fn sha1_localization_matches_rfc3414_appendix_a_example() {
        let engine_id = hex_literal::hex!("000000000000000000000002");
        let key = localize_key(AuthProtocol::Sha1, b"maplesyrup", &engine_id).unwrap();
        assert_eq!(key, hex_literal::hex!("6695febc9288e36282235fc7151f128497b38f3f"));
    }

    #[test]
    fn empty_passphrase_rejected() {
        assert!(localize_key(AuthProtocol::Md5, b"", b"engine").is_err());
    }
}
