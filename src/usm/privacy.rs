// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Scoped-PDU encryption (spec §4.4 "Privacy"): DES-CBC (RFC 3414 §8) and
//! AES-128/192/256-CFB (RFC 3826).
//!
//! Both ciphers take an 8-byte `salt` that is carried on the wire as
//! `msgPrivacyParameters`. DES pads the plaintext to a multiple of 8
//! bytes with zero bytes; AES-CFB is a stream cipher and needs no padding.

use aes::{Aes128, Aes192, Aes256};
use cipher::{AsyncStreamCipher, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::Des;

use crate::{
    error::{CryptoErrorKind, SnmpError},
    usm::user::{PrivProtocol, UsmUser},
};

type DesCbcEnc = cbc::Encryptor<Des>;
type DesCbcDec = cbc::Decryptor<Des>;
type Aes128CfbEnc = cfb_mode::Encryptor<Aes128>;
type Aes128CfbDec = cfb_mode::Decryptor<Aes128>;
type Aes192CfbEnc = cfb_mode::Encryptor<Aes192>;
type Aes192CfbDec = cfb_mode::Decryptor<Aes192>;
type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;

const DES_BLOCK: usize = 8;

/// Encrypt a scoped PDU. `salt` is an 8-byte value unique per message
/// under this key (spec §4.4); the caller is responsible for generating
/// and advancing it (usually a per-session counter).
pub fn encrypt(
    user: &UsmUser,
    engine_boots: u32,
    engine_time: u32,
    salt: [u8; 8],
    plaintext: &[u8],
) -> Result<Vec<u8>, SnmpError> {
    match user.priv_protocol {
        PrivProtocol::None => Err(CryptoErrorKind::UnsupportedPrivProtocol.into()),
        PrivProtocol::Des => {
            let (key, pre_iv) = des_key_and_preiv(&user.priv_key)?;
            let iv = xor8(pre_iv, salt);
            let mut buf = plaintext.to_vec();
            let pad = (DES_BLOCK - buf.len() % DES_BLOCK) % DES_BLOCK;
            buf.extend(std::iter::repeat_n(0u8, pad));
            let enc = DesCbcEnc::new((&key).into(), (&iv).into());
            encrypt_blocks_des(enc, &mut buf);
            Ok(buf)
        }
        PrivProtocol::Aes128 | PrivProtocol::Aes192 | PrivProtocol::Aes256 => {
            let iv = aes_iv(engine_boots, engine_time, salt);
            let mut buf = plaintext.to_vec();
            match user.priv_protocol {
                PrivProtocol::Aes128 => {
                    let key: [u8; 16] = user.priv_key[..16]
                        .try_into()
                        .map_err(|_| CryptoErrorKind::CipherFailure)?;
                    Aes128CfbEnc::new(&key.into(), &iv.into()).encrypt(&mut buf);
                }
                PrivProtocol::Aes192 => {
                    let key: [u8; 24] = user.priv_key[..24]
                        .try_into()
                        .map_err(|_| CryptoErrorKind::CipherFailure)?;
                    Aes192CfbEnc::new(&key.into(), &iv.into()).encrypt(&mut buf);
                }
                PrivProtocol::Aes256 => {
                    let key: [u8; 32] = user.priv_key[..32]
                        .try_into()
                        .map_err(|_| CryptoErrorKind::CipherFailure)?;
                    Aes256CfbEnc::new(&key.into(), &iv.into()).encrypt(&mut buf);
                }
                _ => unreachable!(),
            }
            Ok(buf)
        }
    }
}

/// Decrypt an encrypted scoped PDU. `salt` is the `msgPrivacyParameters`
/// received on the wire.
pub fn decrypt(
    user: &UsmUser,
    engine_boots: u32,
    engine_time: u32,
    salt: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, SnmpError> {
    if salt.len() != 8 {
        return Err(CryptoErrorKind::InvalidPrivParamsLength { expected: 8, actual: salt.len() }.into());
    }
    let salt: [u8; 8] = salt.try_into().map_err(|_| CryptoErrorKind::CipherFailure)?;
    match user.priv_protocol {
        PrivProtocol::None => Err(CryptoErrorKind::UnsupportedPrivProtocol.into()),
        PrivProtocol::Des => {
            if ciphertext.len() % DES_BLOCK != 0 {
                return Err(CryptoErrorKind::InvalidCiphertextLength {
                    length: ciphertext.len(),
                    block_size: DES_BLOCK,
                }
                .into());
            }
            let (key, pre_iv) = des_key_and_preiv(&user.priv_key)?;
            let iv = xor8(pre_iv, salt);
            let mut buf = ciphertext.to_vec();
            let dec = DesCbcDec::new((&key).into(), (&iv).into());
            decrypt_blocks_des(dec, &mut buf);
            Ok(buf)
        }
        PrivProtocol::Aes128 | PrivProtocol::Aes192 | PrivProtocol::Aes256 => {
            let iv = aes_iv(engine_boots, engine_time, salt);
            let mut buf = ciphertext.to_vec();
            match user.priv_protocol {
                PrivProtocol::Aes128 => {
                    let key: [u8; 16] = user.priv_key[..16]
                        .try_into()
                        .map_err(|_| CryptoErrorKind::CipherFailure)?;
                    Aes128CfbDec::new(&key.into(), &iv.into()).decrypt(&mut buf);
                }
                PrivProtocol::Aes192 => {
                    let key: [u8; 24] = user.priv_key[..24]
                        .try_into()
                        .map_err(|_| CryptoErrorKind::CipherFailure)?;
                    Aes192CfbDec::new(&key.into(), &iv.into()).decrypt(&mut buf);
                }
                PrivProtocol::Aes256 => {
                    let key: [u8; 32] = user.priv_key[..32]
                        .try_into()
                        .map_err(|_| CryptoErrorKind::CipherFailure)?;
                    Aes256CfbDec::new(&key.into(), &iv.into()).decrypt(&mut buf);
                }
                _ => unreachable!(),
            }
            Ok(buf)
        }
    }
}

fn des_key_and_preiv(priv_key: &[u8]) -> Result<([u8; 8], [u8; 8]), SnmpError> {
    if priv_key.len() < 16 {
        return Err(CryptoErrorKind::CipherFailure.into());
    }
    let mut key = [0u8; 8];
    let mut pre_iv = [0u8; 8];
    key.copy_from_slice(&priv_key[..8]);
    pre_iv.copy_from_slice(&priv_key[8..16]);
    Ok((key, pre_iv))
}

fn xor8(a: [u8; 8], b: [u8; 8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for i in 0..8 {
        out[i] = a[i] ^ b[i];
    }
    out
}

/// RFC 3826 §3.1.2.1: IV = engineBoots (4 bytes BE) || engineTime (4
/// bytes BE) || salt (8 bytes).
fn aes_iv(engine_boots: u32, engine_time: u32, salt: [u8; 8]) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[0..4].copy_from_slice(&engine_boots.to_be_bytes());
    iv[4..8].copy_from_slice(&engine_time.to_be_bytes());
    iv[8..16].copy_from_slice(&salt);
    iv
}

fn encrypt_blocks_des(mut enc: DesCbcEnc, buf: &mut [u8]) {
    for block in buf.chunks_exact_mut(DES_BLOCK) {
        enc.encrypt_block_mut(block.into());
    }
}

fn decrypt_blocks_des(mut dec: DesCbcDec, buf: &mut [u8]) {
    for block in buf.chunks_exact_mut(DES_BLOCK) {
        dec.decrypt_block_mut(block.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usm::user::AuthProtocol;

    fn aes_user(priv_len: usize, protocol: PrivProtocol) -> UsmUser {
        UsmUser {
            security_name: "tester".into(),
            engine_id: vec![0x80, 0x00, 0x00, 0x00, 0x01],
            auth_protocol: AuthProtocol::Sha1,
            priv_protocol: protocol,
            auth_key: vec![1u8; 20],
            priv_key: vec![2u8; priv_len],
        }
    }

    #[test]
    fn aes128_round_trips() {
        let user = aes_user(16, PrivProtocol::Aes128);
        let plaintext = b"scoped pdu bytes go here";
        let salt = [9u8; 8];
        let ct = encrypt(&user, 3, 1000, salt, plaintext).unwrap();
        let pt = decrypt(&user, 3, 1000, &salt, &ct).unwrap();
        assert_eq!(pt, plaintext);
    }

    #[test]
    fn des_round_trips_with_zero_padding() {
        let user = UsmUser {
            security_name: "tester".into(),
            engine_id: vec![0x80, 0x00, 0x00, 0x00, 0x01],
            auth_protocol: AuthProtocol::Md5,
            priv_protocol: PrivProtocol::Des,
            auth_key: vec![1u8; 16],
            priv_key: vec![3u8; 16],
        };
        let plaintext = b"seven \xD0\xB1";
        let salt = [7u8; 8];
        let ct = encrypt(&user, 1, 1, salt, plaintext).unwrap();
        assert_eq!(ct.len() % DES_BLOCK, 0);
        let pt = decrypt(&user, 1, 1, &salt, &ct).unwrap();
        assert_eq!(&pt[..plaintext.len()], plaintext.as_slice());
    }

    #[test]
    fn wrong_salt_length_rejected() {
        let user = aes_user(32, PrivProtocol::Aes256);
        assert!(decrypt(&user, 1, 1, &[0u8; 4], b"whatever").is_err());
    }
}
