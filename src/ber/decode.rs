// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! BER decoding (spec §4.1). Every parser here follows the "yields
//! `(value, remaining_bytes)`" stream contract so callers can decode a
//! SEQUENCE's children one at a time without buffering.

use crate::{
    ber::tag,
    error::{DecodeErrorKind, SnmpError},
    oid::{decode_subidentifiers, Oid},
    value::SnmpValue,
    varbind::VarBind,
};

/// Parse a BER length (short or long form). Indefinite length (`0x80`
/// alone) is not produced by SNMP and is rejected.
pub fn decode_length(bytes: &[u8]) -> Result<(usize, &[u8]), SnmpError> {
    let (&first, rest) = bytes
        .split_first()
        .ok_or(DecodeErrorKind::Truncated { needed: 1, available: 0 })?;
    if first & 0x80 == 0 {
        return Ok((first as usize, rest));
    }
    let n = (first & 0x7f) as usize;
    if n == 0 {
        // Indefinite length form: unsupported by this codec.
        return Err(DecodeErrorKind::MalformedLength.into());
    }
    if rest.len() < n {
        return Err(DecodeErrorKind::Truncated { needed: n, available: rest.len() }.into());
    }
    let (len_bytes, rest) = rest.split_at(n);
    let mut len: usize = 0;
    for &b in len_bytes {
        len = len
            .checked_shl(8)
            .and_then(|v| v.checked_add(b as usize))
            .ok_or(DecodeErrorKind::MalformedLength)?;
    }
    Ok((len, rest))
}

/// Parse a full tag-length-value, returning `(tag, content, remaining)`.
pub fn decode_tlv(bytes: &[u8]) -> Result<(u8, &[u8], &[u8]), SnmpError> {
    let (&t, rest) = bytes
        .split_first()
        .ok_or(DecodeErrorKind::Truncated { needed: 1, available: 0 })?;
    let (len, rest) = decode_length(rest)?;
    if rest.len() < len {
        return Err(DecodeErrorKind::Truncated { needed: len, available: rest.len() }.into());
    }
    let (content, remaining) = rest.split_at(len);
    Ok((t, content, remaining))
}

/// Parse a TLV and assert its tag matches `expected`.
pub fn expect_tag(bytes: &[u8], expected: u8) -> Result<(&[u8], &[u8]), SnmpError> {
    let (got, content, rest) = decode_tlv(bytes)?;
    if got != expected {
        return Err(DecodeErrorKind::UnexpectedTag { got, expected }.into());
    }
    Ok((content, rest))
}

/// Decode a two's-complement INTEGER. In lenient mode (the default on
/// decode, spec §4.1) non-minimal encodings are accepted; in strict mode
/// they are rejected.
pub fn decode_integer(content: &[u8], strict: bool) -> Result<i64, SnmpError> {
    if content.is_empty() {
        return Err(DecodeErrorKind::Truncated { needed: 1, available: 0 }.into());
    }
    if content.len() > 8 {
        return Err(DecodeErrorKind::IntegerOutOfRange.into());
    }
    if strict && content.len() > 1 {
        let redundant_zero = content[0] == 0x00 && content[1] & 0x80 == 0;
        let redundant_ff = content[0] == 0xff && content[1] & 0x80 != 0;
        if redundant_zero || redundant_ff {
            return Err(DecodeErrorKind::NonMinimalInteger.into());
        }
    }
    let negative = content[0] & 0x80 != 0;
    let mut buf = [if negative { 0xffu8 } else { 0x00u8 }; 8];
    let offset = 8 - content.len();
    buf[offset..].copy_from_slice(content);
    Ok(i64::from_be_bytes(buf))
}

pub fn decode_integer_i32(content: &[u8], strict: bool) -> Result<i32, SnmpError> {
    let v = decode_integer(content, strict)?;
    i32::try_from(v).map_err(|_| DecodeErrorKind::IntegerOutOfRange.into())
}

/// Decode an unsigned value (Counter32/Gauge32/TimeTicks/Counter64). A
/// leading zero byte inserted purely to keep the sign bit clear is legal
/// and stripped.
pub fn decode_unsigned(content: &[u8]) -> Result<u64, SnmpError> {
    if content.is_empty() {
        return Err(DecodeErrorKind::Truncated { needed: 1, available: 0 }.into());
    }
    if content.len() > 9 || (content.len() == 9 && content[0] != 0x00) {
        return Err(DecodeErrorKind::IntegerOutOfRange.into());
    }
    let mut buf = [0u8; 8];
    let trimmed = if content.len() == 9 { &content[1..] } else { content };
    let offset = 8 - trimmed.len();
    buf[offset..].copy_from_slice(trimmed);
    Ok(u64::from_be_bytes(buf))
}

pub fn decode_oid_content(content: &[u8]) -> Result<Oid, SnmpError> {
    Ok(Oid::new(decode_subidentifiers(content)?))
}

/// Decode a value given its wire tag and content bytes.
pub fn decode_value(t: u8, content: &[u8]) -> Result<SnmpValue, SnmpError> {
    Ok(match t {
        tag::NULL => SnmpValue::Null,
        tag::INTEGER => SnmpValue::Integer(decode_integer_i32(content, false)?),
        tag::OCTET_STRING => SnmpValue::OctetString(content.to_vec()),
        tag::OID => SnmpValue::Oid(decode_oid_content(content)?),
        tag::IP_ADDRESS => {
            // Strict on encode, lenient on decode (spec §9 Open Question):
            // a 4-byte binary is required here, a dotted string is not a
            // legal wire encoding so it is not special-cased.
            if content.len() != 4 {
                return Err(DecodeErrorKind::IntegerOutOfRange.into());
            }
            let mut addr = [0u8; 4];
            addr.copy_from_slice(content);
            SnmpValue::IpAddress(addr)
        }
        tag::COUNTER32 => SnmpValue::Counter32(decode_unsigned(content)? as u32),
        tag::GAUGE32 => SnmpValue::Gauge32(decode_unsigned(content)? as u32),
        tag::TIMETICKS => SnmpValue::TimeTicks(decode_unsigned(content)? as u32),
        tag::OPAQUE => SnmpValue::Opaque(content.to_vec()),
        tag::COUNTER64 => SnmpValue::Counter64(decode_unsigned(content)?),
        tag::NO_SUCH_OBJECT => SnmpValue::NoSuchObject,
        tag::NO_SUCH_INSTANCE => SnmpValue::NoSuchInstance,
        tag::END_OF_MIB_VIEW => SnmpValue::EndOfMibView,
        other => {
            return Err(DecodeErrorKind::UnexpectedTag { got: other, expected: tag::NULL }.into());
        }
    })
}

/// Decode a varbind `SEQUENCE { OID, value }`, returning the varbind and
/// whatever bytes follow it.
pub fn decode_varbind(bytes: &[u8]) -> Result<(VarBind, &[u8]), SnmpError> {
    let (content, remaining) = expect_tag(bytes, tag::SEQUENCE)?;
    let (oid_content, rest) = expect_tag(content, tag::OID)?;
    let oid = decode_oid_content(oid_content)?;
    let (vtag, vcontent, rest) = decode_tlv(rest)?;
    let value = decode_value(vtag, vcontent)?;
    if !rest.is_empty() {
        return Err(DecodeErrorKind::TrailingBytes.into());
    }
    Ok((VarBind::new(oid, value), remaining))
}
