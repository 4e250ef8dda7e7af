// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The message envelope: v1/v2c community framing and v3 USM framing
//! (spec §3 "Message envelope", component C2).

use bitflags::bitflags;

use crate::{
    ber::{
        decode::{decode_integer_i32, decode_tlv, expect_tag},
        encode::{encode_sequence, encode_tlv},
        tag,
    },
    error::{DecodeErrorKind, SnmpError},
    pdu::Pdu,
};

bitflags! {
    /// `msgFlags` (spec §3): a single octet with `auth`, `priv`, and
    /// `reportable` bits (RFC 3412 §6.3, RFC 3414 discovery flow).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MsgFlags: u8 {
        const AUTH        = 0b0000_0001;
        const PRIV        = 0b0000_0010;
        const REPORTABLE  = 0b0000_0100;
    }
}

/// `scopedPDU = (contextEngineID, contextName, PDU)` (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedPdu {
    pub context_engine_id: Vec<u8>,
    pub context_name: Vec<u8>,
    pub pdu: Pdu,
}

/// The scoped PDU is either plaintext (no privacy) or an opaque encrypted
/// blob, transported as a SEQUENCE or OCTET STRING respectively (spec
/// §4.4 "Privacy").
#[derive(Debug, Clone, PartialEq)]
pub enum ScopedPduData {
    Plaintext(ScopedPdu),
    Encrypted(Vec<u8>),
}

/// The v3 header fields shared before security-model-specific parameters
/// (spec §3 "v3").
#[derive(Debug, Clone, PartialEq)]
pub struct V3Header {
    pub msg_id: i32,
    pub msg_max_size: i32,
    pub msg_flags: MsgFlags,
    pub msg_security_model: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// v1 (`version == 0`) or v2c (`version == 1`).
    V1V2c { version: u8, community: Vec<u8>, pdu: Pdu },
    V3 {
        header: V3Header,
        security_params: Vec<u8>,
        scoped_pdu: ScopedPduData,
    },
}

impl Message {
    pub fn v1(community: impl Into<Vec<u8>>, pdu: Pdu) -> Self {
        Message::V1V2c { version: 0, community: community.into(), pdu }
    }

    pub fn v2c(community: impl Into<Vec<u8>>, pdu: Pdu) -> Self {
        Message::V1V2c { version: 1, community: community.into(), pdu }
    }

    pub fn version(&self) -> u8 {
        match self {
            Message::V1V2c { version, .. } => *version,
            Message::V3 { .. } => 3,
        }
    }

    /// The `pdu`, if it is available without decrypting (v1/v2c, or v3
    /// with a plaintext scoped PDU).
    pub fn pdu(&self) -> Option<&Pdu> {
        match self {
            Message::V1V2c { pdu, .. } => Some(pdu),
            Message::V3 { scoped_pdu: ScopedPduData::Plaintext(sp), .. } => Some(&sp.pdu),
            Message::V3 { .. } => None,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, SnmpError> {
        let mut content = Vec::new();
        match self {
            Message::V1V2c { version, community, pdu } => {
                encode_tlv(tag::INTEGER, &crate::ber::encode::encode_integer_content(*version as i64), &mut content);
                encode_tlv(tag::OCTET_STRING, community, &mut content);
                content.extend_from_slice(&pdu.encode()?);
            }
            Message::V3 { header, security_params, scoped_pdu } => {
                encode_tlv(tag::INTEGER, &crate::ber::encode::encode_integer_content(3), &mut content);
                content.extend_from_slice(&encode_v3_header(header));
                encode_tlv(tag::OCTET_STRING, security_params, &mut content);
                content.extend_from_slice(&encode_scoped_pdu(scoped_pdu)?);
            }
        }
        let mut out = Vec::new();
        encode_sequence(&content, &mut out);
        Ok(out)
    }

    /// Like [`Self::encode`], but additionally returns the absolute byte
    /// offset of `security_params`'s content within the output, for v3
    /// messages. USM uses this to zero/patch `msgAuthenticationParameters`
    /// (nested inside that opaque blob) without re-encoding the envelope.
    pub fn encode_with_security_offset(&self) -> Result<(Vec<u8>, Option<usize>), SnmpError> {
        match self {
            Message::V1V2c { .. } => Ok((self.encode()?, None)),
            Message::V3 { header, security_params, scoped_pdu } => {
                let mut content = Vec::new();
                encode_tlv(tag::INTEGER, &crate::ber::encode::encode_integer_content(3), &mut content);
                content.extend_from_slice(&encode_v3_header(header));
                let before_sp = content.len();
                encode_tlv(tag::OCTET_STRING, security_params, &mut content);
                let sp_content_offset_in_content =
                    before_sp + 1 + crate::ber::encode::length_header_size(security_params.len());
                content.extend_from_slice(&encode_scoped_pdu(scoped_pdu)?);
                let mut out = Vec::new();
                encode_sequence(&content, &mut out);
                let offset = 1 + crate::ber::encode::length_header_size(content.len()) + sp_content_offset_in_content;
                Ok((out, Some(offset)))
            }
        }
    }

    /// Decode a complete wire message. This is the "outermost call" from
    /// spec §4.1: any bytes left over after the envelope is fully consumed
    /// are a [`DecodeErrorKind::TrailingBytes`] error.
    pub fn decode(bytes: &[u8]) -> Result<Message, SnmpError> {
        let (content, remaining) = expect_tag(bytes, tag::SEQUENCE)?;
        if !remaining.is_empty() {
            return Err(DecodeErrorKind::TrailingBytes.into());
        }
        let (t, vcontent, rest) = decode_tlv(content)?;
        if t != tag::INTEGER {
            return Err(DecodeErrorKind::UnexpectedTag { got: t, expected: tag::INTEGER }.into());
        }
        let version = decode_integer_i32(vcontent, false)?;
        match version {
            0 | 1 => {
                let (community, rest) = expect_tag(rest, tag::OCTET_STRING)?;
                let (pdu, rest) = Pdu::decode(rest)?;
                if !rest.is_empty() {
                    return Err(DecodeErrorKind::TrailingBytes.into());
                }
                Ok(Message::V1V2c { version: version as u8, community: community.to_vec(), pdu })
            }
            3 => {
                let (header, rest) = decode_v3_header(rest)?;
                let (security_params, rest) = expect_tag(rest, tag::OCTET_STRING)?;
                let (scoped_pdu, rest) = decode_scoped_pdu(rest)?;
                if !rest.is_empty() {
                    return Err(DecodeErrorKind::TrailingBytes.into());
                }
                Ok(Message::V3 { header, security_params: security_params.to_vec(), scoped_pdu })
            }
            other => Err(SnmpError::VersionMismatch { expected: 3, got: other as u8 }),
        }
    }
}

/// Like [`Message::decode`], but also returns the byte offset of
/// `security_params`'s content within `bytes`, computed from the
/// decoder's zero-copy sub-slicing (no bytes are moved, so a pointer
/// difference is safe and exact).
impl Message {
    pub fn decode_with_security_offset(bytes: &[u8]) -> Result<(Message, Option<usize>), SnmpError> {
        let (content, remaining) = expect_tag(bytes, tag::SEQUENCE)?;
        if !remaining.is_empty() {
            return Err(DecodeErrorKind::TrailingBytes.into());
        }
        let (t, vcontent, rest) = decode_tlv(content)?;
        if t != tag::INTEGER {
            return Err(DecodeErrorKind::UnexpectedTag { got: t, expected: tag::INTEGER }.into());
        }
        let version = decode_integer_i32(vcontent, false)?;
        if version != 3 {
            let message = Message::decode(bytes)?;
            return Ok((message, None));
        }
        let (header, rest) = decode_v3_header(rest)?;
        let (security_params, rest) = expect_tag(rest, tag::OCTET_STRING)?;
        let offset = security_params.as_ptr() as usize - bytes.as_ptr() as usize;
        let (scoped_pdu, rest) = decode_scoped_pdu(rest)?;
        if !rest.is_empty() {
            return Err(DecodeErrorKind::TrailingBytes.into());
        }
        Ok((
            Message::V3 { header, security_params: security_params.to_vec(), scoped_pdu },
            Some(offset),
        ))
    }
}

fn encode_v3_header(h: &V3Header) -> Vec<u8> {
    let mut content = Vec::new();
    encode_tlv(tag::INTEGER, &crate::ber::encode::encode_integer_content(h.msg_id as i64), &mut content);
    encode_tlv(tag::INTEGER, &crate::ber::encode::encode_integer_content(h.msg_max_size as i64), &mut content);
    encode_tlv(tag::OCTET_STRING, &[h.msg_flags.bits()], &mut content);
    encode_tlv(tag::INTEGER, &crate::ber::encode::encode_integer_content(h.msg_security_model as i64), &mut content);
    let mut out = Vec::new();
    encode_sequence(&content, &mut out);
    out
}

fn decode_v3_header(bytes: &[u8]) -> Result<(V3Header, &[u8]), SnmpError> {
    let (content, remaining) = expect_tag(bytes, tag::SEQUENCE)?;
    let (t, c, rest) = decode_tlv(content)?;
    if t != tag::INTEGER {
        return Err(DecodeErrorKind::UnexpectedTag { got: t, expected: tag::INTEGER }.into());
    }
    let msg_id = decode_integer_i32(c, false)?;
    let (t, c, rest) = decode_tlv(rest)?;
    if t != tag::INTEGER {
        return Err(DecodeErrorKind::UnexpectedTag { got: t, expected: tag::INTEGER }.into());
    }
    let msg_max_size = decode_integer_i32(c, false)?;
    let (flags_content, rest) = expect_tag(rest, tag::OCTET_STRING)?;
    let flags_byte = *flags_content.first().ok_or(DecodeErrorKind::Truncated { needed: 1, available: 0 })?;
    let msg_flags = MsgFlags::from_bits_truncate(flags_byte);
    let (t, c, rest) = decode_tlv(rest)?;
    if t != tag::INTEGER {
        return Err(DecodeErrorKind::UnexpectedTag { got: t, expected: tag::INTEGER }.into());
    }
    let msg_security_model = decode_integer_i32(c, false)?;
    if !rest.is_empty() {
        return Err(DecodeErrorKind::TrailingBytes.into());
    }
    Ok((V3Header { msg_id, msg_max_size, msg_flags, msg_security_model }, remaining))
}

fn encode_scoped_pdu(sp: &ScopedPduData) -> Result<Vec<u8>, SnmpError> {
    match sp {
        ScopedPduData::Plaintext(scoped) => {
            let mut content = Vec::new();
            encode_tlv(tag::OCTET_STRING, &scoped.context_engine_id, &mut content);
            encode_tlv(tag::OCTET_STRING, &scoped.context_name, &mut content);
            content.extend_from_slice(&scoped.pdu.encode()?);
            let mut out = Vec::new();
            encode_sequence(&content, &mut out);
            Ok(out)
        }
        ScopedPduData::Encrypted(bytes) => {
            let mut out = Vec::new();
            encode_tlv(tag::OCTET_STRING, bytes, &mut out);
            Ok(out)
        }
    }
}

fn decode_scoped_pdu(bytes: &[u8]) -> Result<(ScopedPduData, &[u8]), SnmpError> {
    let (t, content, remaining) = decode_tlv(bytes)?;
    match t {
        tag::SEQUENCE => {
            let (engine_id, rest) = expect_tag(content, tag::OCTET_STRING)?;
            let (context_name, rest) = expect_tag(rest, tag::OCTET_STRING)?;
            let (pdu, rest) = Pdu::decode(rest)?;
            if !rest.is_empty() {
                return Err(DecodeErrorKind::TrailingBytes.into());
            }
            Ok((
                ScopedPduData::Plaintext(ScopedPdu {
                    context_engine_id: engine_id.to_vec(),
                    context_name: context_name.to_vec(),
                    pdu,
                }),
                remaining,
            ))
        }
        tag::OCTET_STRING => Ok((ScopedPduData::Encrypted(content.to_vec()), remaining)),
        other => Err(DecodeErrorKind::UnexpectedTag { got: other, expected: tag::SEQUENCE }.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pdu::RequestPdu, varbind::VarBind};

    #[test]
    fn v2c_round_trips() {
        let pdu = Pdu::GetRequest(RequestPdu::new(
            42,
            vec![VarBind::request("1.3.6.1.2.1.1.1.0".parse().unwrap())],
        ));
        let msg = Message::v2c("public", pdu);
        let bytes = msg.encode().unwrap();
        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn v3_plaintext_round_trips() {
        let pdu = Pdu::GetRequest(RequestPdu::new(1, vec![]));
        let msg = Message::V3 {
            header: V3Header {
                msg_id: 7,
                msg_max_size: 65507,
                msg_flags: MsgFlags::REPORTABLE,
                msg_security_model: 3,
            },
            security_params: vec![0x30, 0x00],
            scoped_pdu: ScopedPduData::Plaintext(ScopedPdu {
                context_engine_id: vec![],
                context_name: vec![],
                pdu,
            }),
        };
        let bytes = msg.encode().unwrap();
        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn security_offset_points_at_security_params_content() {
        let pdu = Pdu::GetRequest(RequestPdu::new(1, vec![]));
        let msg = Message::V3 {
            header: V3Header {
                msg_id: 7,
                msg_max_size: 65507,
                msg_flags: MsgFlags::AUTH | MsgFlags::REPORTABLE,
                msg_security_model: 3,
            },
            security_params: vec![0xaa; 40],
            scoped_pdu: ScopedPduData::Plaintext(ScopedPdu {
                context_engine_id: vec![],
                context_name: vec![],
                pdu,
            }),
        };
        let (bytes, offset) = msg.encode_with_security_offset().unwrap();
        let offset = offset.unwrap();
        assert_eq!(&bytes[offset..offset + 40], vec![0xaa; 40].as_slice());
    }

    #[test]
    fn decode_security_offset_round_trips_with_encode_offset() {
        let pdu = Pdu::GetRequest(RequestPdu::new(1, vec![]));
        let msg = Message::V3 {
            header: V3Header {
                msg_id: 7,
                msg_max_size: 65507,
                msg_flags: MsgFlags::AUTH | MsgFlags::REPORTABLE,
                msg_security_model: 3,
            },
            security_params: vec![0xbb; 40],
            scoped_pdu: ScopedPduData::Plaintext(ScopedPdu {
                context_engine_id: vec![],
                context_name: vec![],
                pdu,
            }),
        };
        let (bytes, encode_offset) = msg.encode_with_security_offset().unwrap();
        let (decoded, decode_offset) = Message::decode_with_security_offset(&bytes).unwrap();
        assert_eq!(encode_offset, decode_offset);
        assert_eq!(decoded, msg);
    }

    #[test]
    fn trailing_bytes_rejected() {
        let pdu = Pdu::GetRequest(RequestPdu::new(1, vec![]));
        let mut bytes = Message::v2c("public", pdu).encode().unwrap();
        bytes.push(0xff);
        assert!(Message::decode(&bytes).is_err());
    }
}
