// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `UsmSecurityParameters` (RFC 3414 §2.4): the structured contents of a
//! v3 message's opaque `security_params` byte string when the security
//! model is USM.

use crate::{
    ber::{decode::decode_tlv, encode::encode_tlv, tag},
    error::{DecodeErrorKind, SnmpError},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsmSecurityParameters {
    pub authoritative_engine_id: Vec<u8>,
    pub authoritative_engine_boots: u32,
    pub authoritative_engine_time: u32,
    pub user_name: Vec<u8>,
    pub auth_params: Vec<u8>,
    pub priv_params: Vec<u8>,
}

impl UsmSecurityParameters {
    pub fn encode(&self) -> Vec<u8> {
        let mut content = Vec::new();
        encode_tlv(tag::OCTET_STRING, &self.authoritative_engine_id, &mut content);
        encode_tlv(
            tag::INTEGER,
            &crate::ber::encode::encode_integer_content(self.authoritative_engine_boots as i64),
            &mut content,
        );
        encode_tlv(
            tag::INTEGER,
            &crate::ber::encode::encode_integer_content(self.authoritative_engine_time as i64),
            &mut content,
        );
        encode_tlv(tag::OCTET_STRING, &self.user_name, &mut content);
        encode_tlv(tag::OCTET_STRING, &self.auth_params, &mut content);
        encode_tlv(tag::OCTET_STRING, &self.priv_params, &mut content);
        let mut out = Vec::new();
        crate::ber::encode::encode_sequence(&content, &mut out);
        out
    }

    /// `security_params` as carried by [`crate::message::Message::V3`] is
    /// the raw bytes of this SEQUENCE (itself nested, unlike
    /// `msgAuthenticationParameters`'s in-place substitution handled by
    /// `usm::auth`).
    pub fn decode(bytes: &[u8]) -> Result<Self, SnmpError> {
        let (content, remaining) = crate::ber::decode::expect_tag(bytes, tag::SEQUENCE)?;
        if !remaining.is_empty() {
            return Err(DecodeErrorKind::TrailingBytes.into());
        }
        let (engine_id, rest) = crate::ber::decode::expect_tag(content, tag::OCTET_STRING)?;
        let (t, c, rest) = decode_tlv(rest)?;
        if t != tag::INTEGER {
            return Err(DecodeErrorKind::UnexpectedTag { got: t, expected: tag::INTEGER }.into());
        }
        let engine_boots = crate::ber::decode::decode_integer_i32(c, false)? as u32;
        let (t, c, rest) = decode_tlv(rest)?;
        if t != tag::INTEGER {
            return Err(DecodeErrorKind::UnexpectedTag { got: t, expected: tag::INTEGER }.into());
        }
        let engine_time = crate::ber::decode::decode_integer_i32(c, false)? as u32;
        let (user_name, rest) = crate::ber::decode::expect_tag(rest, tag::OCTET_STRING)?;
        let (auth_params, rest) = crate::ber::decode::expect_tag(rest, tag::OCTET_STRING)?;
        let (priv_params, rest) = crate::ber::decode::expect_tag(rest, tag::OCTET_STRING)?;
        if !rest.is_empty() {
            return Err(DecodeErrorKind::TrailingBytes.into());
        }
        Ok(UsmSecurityParameters {
            authoritative_engine_id: engine_id.to_vec(),
            authoritative_engine_boots: engine_boots,
            authoritative_engine_time: engine_time,
            user_name: user_name.to_vec(),
            auth_params: auth_params.to_vec(),
            priv_params: priv_params.to_vec(),
        })
    }

    /// The byte offset and length of `auth_params` within [`Self::encode`]'s
    /// output, needed so the caller can zero it in place for MAC
    /// computation (RFC 3414 §6.3.2 step 4) without re-encoding. Walks
    /// the five preceding fields, summing consumed bytes, since lengths
    /// are self-describing.
    pub fn auth_params_span(encoded: &[u8], auth_params_len: usize) -> Result<(usize, usize), SnmpError> {
        let (content, _) = crate::ber::decode::expect_tag(encoded, tag::SEQUENCE)?;
        let mut cursor = content;
        for _ in 0..4 {
            let (_, _, rest) = decode_tlv(cursor)?;
            cursor = rest;
        }
        // `cursor` now begins at the `auth_params` TLV.
        let consumed_before = encoded.len() - cursor.len();
        if cursor.is_empty() {
            return Err(DecodeErrorKind::Truncated { needed: 1, available: 0 }.into());
        }
        let (value_len, after_len) = crate::ber::decode::decode_length(&cursor[1..])?;
        let header_len = cursor.len() - after_len.len();
        if value_len != auth_params_len {
            return Err(DecodeErrorKind::MalformedLength.into());
        }
        Ok((consumed_before + header_len, value_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let params = UsmSecurityParameters {
            authoritative_engine_id: vec![0x80, 0, 0, 0, 1],
            authoritative_engine_boots: 3,
            authoritative_engine_time: 1000,
            user_name: b"alice".to_vec(),
            auth_params: vec![0u8; 12],
            priv_params: vec![0u8; 8],
        };
        let bytes = params.encode();
        let decoded = UsmSecurityParameters::decode(&bytes).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn auth_params_span_locates_the_field() {
        let params = UsmSecurityParameters {
            authoritative_engine_id: vec![0x80, 0, 0, 0, 1],
            authoritative_engine_boots: 3,
            authoritative_engine_time: 1000,
            user_name: b"alice".to_vec(),
            auth_params: vec![0xaa; 12],
            priv_params: vec![0u8; 8],
        };
        let bytes = params.encode();
        let (start, len) = UsmSecurityParameters::auth_params_span(&bytes, 12).unwrap();
        assert_eq!(&bytes[start..start + len], vec![0xaa; 12].as_slice());
    }
}
