// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! BER encoding (spec §4.1). Encoding is always strict: minimal-length
//! INTEGER encodings, strict 4-byte `IpAddress` (spec §9 Open Question:
//! strict on encode, lenient on decode).

use crate::{
    ber::tag,
    error::SnmpError,
    oid::{encode_subidentifiers, Oid},
    value::SnmpValue,
    varbind::VarBind,
};

/// Append a BER length (short or long form) to `out`.
pub fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 128 {
        out.push(len as u8);
        return;
    }
    let mut bytes = Vec::new();
    let mut n = len;
    while n > 0 {
        bytes.push((n & 0xff) as u8);
        n >>= 8;
    }
    bytes.reverse();
    out.push(0x80 | bytes.len() as u8);
    out.extend_from_slice(&bytes);
}

/// Number of bytes [`encode_length`] would append for `len` (short or
/// long form), without allocating.
pub fn length_header_size(len: usize) -> usize {
    if len < 128 {
        1
    } else {
        1 + ((usize::BITS - len.leading_zeros()).div_ceil(8)) as usize
    }
}

/// Append a full tag-length-value to `out`.
pub fn encode_tlv(tag: u8, content: &[u8], out: &mut Vec<u8>) {
    out.push(tag);
    encode_length(content.len(), out);
    out.extend_from_slice(content);
}

/// Wrap already-encoded children in a SEQUENCE whose length is exactly the
/// sum of the children's lengths (spec §4.1 SEQUENCE).
pub fn encode_sequence(children: &[u8], out: &mut Vec<u8>) {
    encode_tlv(tag::SEQUENCE, children, out);
}

/// Minimum two's-complement encoding of a signed integer.
pub fn encode_integer_content(value: i64) -> Vec<u8> {
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.len() > 1
        && ((bytes[0] == 0x00 && bytes[1] & 0x80 == 0)
            || (bytes[0] == 0xff && bytes[1] & 0x80 != 0))
    {
        bytes.remove(0);
    }
    bytes
}

/// Minimum encoding of an unsigned value, inserting a leading zero byte
/// when the high bit of the first significant byte is set so it is not
/// misread as negative (used for Counter32/Gauge32/TimeTicks/Counter64).
pub fn encode_unsigned_content(value: u64) -> Vec<u8> {
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.len() > 1 && bytes[0] == 0x00 && bytes[1] & 0x80 == 0 {
        bytes.remove(0);
    }
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0x00);
    }
    bytes
}

pub fn encode_oid_content(oid: &Oid) -> Result<Vec<u8>, SnmpError> {
    let mut out = Vec::new();
    encode_subidentifiers(oid.as_slice(), &mut out)?;
    Ok(out)
}

/// Encode a value's content bytes together with its wire tag.
pub fn encode_value(value: &SnmpValue) -> Result<(u8, Vec<u8>), SnmpError> {
    Ok(match value {
        SnmpValue::Null => (tag::NULL, Vec::new()),
        SnmpValue::Integer(i) => (tag::INTEGER, encode_integer_content(*i as i64)),
        SnmpValue::OctetString(bytes) => (tag::OCTET_STRING, bytes.clone()),
        SnmpValue::Oid(oid) => (tag::OID, encode_oid_content(oid)?),
        SnmpValue::IpAddress(addr) => (tag::IP_ADDRESS, addr.to_vec()),
        SnmpValue::Counter32(v) => (tag::COUNTER32, encode_unsigned_content(*v as u64)),
        SnmpValue::Gauge32(v) => (tag::GAUGE32, encode_unsigned_content(*v as u64)),
        SnmpValue::TimeTicks(v) => (tag::TIMETICKS, encode_unsigned_content(*v as u64)),
        SnmpValue::Opaque(bytes) => (tag::OPAQUE, bytes.clone()),
        SnmpValue::Counter64(v) => (tag::COUNTER64, encode_unsigned_content(*v)),
        SnmpValue::NoSuchObject => (tag::NO_SUCH_OBJECT, Vec::new()),
        SnmpValue::NoSuchInstance => (tag::NO_SUCH_INSTANCE, Vec::new()),
        SnmpValue::EndOfMibView => (tag::END_OF_MIB_VIEW, Vec::new()),
    })
}

/// Encode a varbind as a SEQUENCE { OID, value } and append it to `out`.
pub fn encode_varbind(vb: &VarBind, out: &mut Vec<u8>) -> Result<(), SnmpError> {
    let mut content = Vec::new();
    encode_tlv(tag::OID, &encode_oid_content(&vb.oid)?, &mut content);
    let (vtag, vcontent) = encode_value(&vb.value)?;
    encode_tlv(vtag, &vcontent, &mut content);
    encode_sequence(&content, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_length() {
        let mut out = Vec::new();
        encode_length(5, &mut out);
        assert_eq!(out, vec![5]);
    }

    #[test]
    fn length_header_size_matches_encode_length() {
        for len in [0usize, 1, 127, 128, 255, 300, 70000] {
            let mut out = Vec::new();
            encode_length(len, &mut out);
            assert_eq!(out.len(), length_header_size(len));
        }
    }

    #[test]
    fn long_form_length() {
        let mut out = Vec::new();
        encode_length(300, &mut out);
        assert_eq!(out, vec![0x82, 0x01, 0x2c]);
    }

    #[test]
    fn integer_minimal_encoding() {
        assert_eq!(encode_integer_content(0), vec![0x00]);
        assert_eq!(encode_integer_content(127), vec![0x7f]);
        assert_eq!(encode_integer_content(128), vec![0x00, 0x80]);
        assert_eq!(encode_integer_content(-1), vec![0xff]);
        assert_eq!(encode_integer_content(-128), vec![0x80]);
        assert_eq!(encode_integer_content(-129), vec![0xff, 0x7f]);
    }

    #[test]
    fn unsigned_gets_leading_zero_when_high_bit_set() {
        assert_eq!(encode_unsigned_content(0x80), vec![0x00, 0x80]);
        assert_eq!(encode_unsigned_content(0x7f), vec![0x7f]);
    }
}
