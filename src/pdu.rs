// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The PDU sum type (spec §3, component C2).
//!
//! The source this spec was distilled from represented PDUs as
//! heterogeneous maps, which let `non_repeaters`/`max_repetitions` leak
//! onto non-bulk PDUs and vice versa. Here each PDU shape is its own
//! struct, and [`Pdu`] only ever holds the variant matching its wire tag,
//! so `non_repeaters`/`max_repetitions` exist on the wire *and* in the type
//! system only for [`BulkPdu`] (spec §9 design note).

use crate::{
    ber::{
        decode::{decode_tlv, decode_varbind, expect_tag},
        encode::{encode_sequence, encode_tlv, encode_varbind},
        tag,
    },
    error::{DecodeErrorKind, SnmpError},
    oid::Oid,
    varbind::VarBind,
};

/// Fields shared by GetRequest/GetNextRequest/Response/SetRequest/
/// InformRequest/SNMPv2-Trap/Report (spec §3 "PDU").
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPdu {
    pub request_id: i32,
    pub error_status: i32,
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

impl RequestPdu {
    pub fn new(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        RequestPdu { request_id, error_status: 0, error_index: 0, varbinds }
    }
}

/// GetBulkRequest replaces `error_status`/`error_index` with
/// `non_repeaters`/`max_repetitions` (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct BulkPdu {
    pub request_id: i32,
    pub non_repeaters: i32,
    pub max_repetitions: i32,
    pub varbinds: Vec<VarBind>,
}

/// SNMPv1 Trap-PDU (RFC 1157) has an entirely different shape: no
/// `request_id`, no `error_status`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapV1Pdu {
    pub enterprise: Oid,
    pub agent_addr: [u8; 4],
    pub generic_trap: i32,
    pub specific_trap: i32,
    pub time_stamp: u32,
    pub varbinds: Vec<VarBind>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pdu {
    GetRequest(RequestPdu),
    GetNextRequest(RequestPdu),
    Response(RequestPdu),
    SetRequest(RequestPdu),
    GetBulkRequest(BulkPdu),
    Trap(TrapV1Pdu),
    InformRequest(RequestPdu),
    SnmpV2Trap(RequestPdu),
    Report(RequestPdu),
}

impl Pdu {
    pub fn wire_tag(&self) -> u8 {
        match self {
            Pdu::GetRequest(_) => tag::GET_REQUEST,
            Pdu::GetNextRequest(_) => tag::GET_NEXT_REQUEST,
            Pdu::Response(_) => tag::RESPONSE,
            Pdu::SetRequest(_) => tag::SET_REQUEST,
            Pdu::GetBulkRequest(_) => tag::GET_BULK_REQUEST,
            Pdu::Trap(_) => tag::TRAP,
            Pdu::InformRequest(_) => tag::INFORM_REQUEST,
            Pdu::SnmpV2Trap(_) => tag::SNMPV2_TRAP,
            Pdu::Report(_) => tag::REPORT,
        }
    }

    /// `None` only for the v1 Trap-PDU, which carries no request id.
    pub fn request_id(&self) -> Option<i32> {
        match self {
            Pdu::GetRequest(p)
            | Pdu::GetNextRequest(p)
            | Pdu::Response(p)
            | Pdu::SetRequest(p)
            | Pdu::InformRequest(p)
            | Pdu::SnmpV2Trap(p)
            | Pdu::Report(p) => Some(p.request_id),
            Pdu::GetBulkRequest(p) => Some(p.request_id),
            Pdu::Trap(_) => None,
        }
    }

    pub fn varbinds(&self) -> &[VarBind] {
        match self {
            Pdu::GetRequest(p)
            | Pdu::GetNextRequest(p)
            | Pdu::Response(p)
            | Pdu::SetRequest(p)
            | Pdu::InformRequest(p)
            | Pdu::SnmpV2Trap(p)
            | Pdu::Report(p) => &p.varbinds,
            Pdu::GetBulkRequest(p) => &p.varbinds,
            Pdu::Trap(p) => &p.varbinds,
        }
    }

    pub fn error_status(&self) -> i32 {
        match self {
            Pdu::GetRequest(p)
            | Pdu::GetNextRequest(p)
            | Pdu::Response(p)
            | Pdu::SetRequest(p)
            | Pdu::InformRequest(p)
            | Pdu::SnmpV2Trap(p)
            | Pdu::Report(p) => p.error_status,
            _ => 0,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, SnmpError> {
        let mut out = Vec::new();
        match self {
            Pdu::GetRequest(p)
            | Pdu::GetNextRequest(p)
            | Pdu::Response(p)
            | Pdu::SetRequest(p)
            | Pdu::InformRequest(p)
            | Pdu::SnmpV2Trap(p)
            | Pdu::Report(p) => {
                encode_tlv(self.wire_tag(), &encode_request_pdu_content(p)?, &mut out);
            }
            Pdu::GetBulkRequest(p) => {
                encode_tlv(self.wire_tag(), &encode_bulk_pdu_content(p)?, &mut out);
            }
            Pdu::Trap(p) => {
                encode_tlv(self.wire_tag(), &encode_trap_v1_content(p)?, &mut out);
            }
        }
        Ok(out)
    }

    /// Decode a PDU from its outer context tag, returning the remaining
    /// bytes after this PDU (spec §4.1: parse yields `(value, remaining)`).
    pub fn decode(bytes: &[u8]) -> Result<(Pdu, &[u8]), SnmpError> {
        let (t, content, remaining) = decode_tlv(bytes)?;
        let pdu = match t {
            tag::GET_REQUEST => Pdu::GetRequest(decode_request_pdu_content(content)?),
            tag::GET_NEXT_REQUEST => Pdu::GetNextRequest(decode_request_pdu_content(content)?),
            tag::RESPONSE => Pdu::Response(decode_request_pdu_content(content)?),
            tag::SET_REQUEST => Pdu::SetRequest(decode_request_pdu_content(content)?),
            tag::INFORM_REQUEST => Pdu::InformRequest(decode_request_pdu_content(content)?),
            tag::SNMPV2_TRAP => Pdu::SnmpV2Trap(decode_request_pdu_content(content)?),
            tag::REPORT => Pdu::Report(decode_request_pdu_content(content)?),
            tag::GET_BULK_REQUEST => Pdu::GetBulkRequest(decode_bulk_pdu_content(content)?),
            tag::TRAP => Pdu::Trap(decode_trap_v1_content(content)?),
            other => {
                return Err(DecodeErrorKind::UnexpectedTag { got: other, expected: tag::GET_REQUEST }.into());
            }
        };
        Ok((pdu, remaining))
    }
}

fn encode_varbind_list(varbinds: &[VarBind]) -> Result<Vec<u8>, SnmpError> {
    let mut children = Vec::new();
    for vb in varbinds {
        encode_varbind(vb, &mut children)?;
    }
    let mut out = Vec::new();
    encode_sequence(&children, &mut out);
    Ok(out)
}

fn decode_varbind_list(bytes: &[u8]) -> Result<Vec<VarBind>, SnmpError> {
    let (mut content, _) = expect_tag(bytes, tag::SEQUENCE)?;
    let mut varbinds = Vec::new();
    while !content.is_empty() {
        let (vb, rest) = decode_varbind(content)?;
        varbinds.push(vb);
        content = rest;
    }
    Ok(varbinds)
}

fn encode_integer_tlv(value: i64, out: &mut Vec<u8>) {
    encode_tlv(tag::INTEGER, &crate::ber::encode::encode_integer_content(value), out);
}

fn decode_integer_field<'a>(bytes: &'a [u8]) -> Result<(i32, &'a [u8]), SnmpError> {
    let (t, content, rest) = decode_tlv(bytes)?;
    if t != tag::INTEGER {
        return Err(DecodeErrorKind::UnexpectedTag { got: t, expected: tag::INTEGER }.into());
    }
    Ok((crate::ber::decode::decode_integer_i32(content, false)?, rest))
}

fn encode_request_pdu_content(p: &RequestPdu) -> Result<Vec<u8>, SnmpError> {
    let mut out = Vec::new();
    encode_integer_tlv(p.request_id as i64, &mut out);
    encode_integer_tlv(p.error_status as i64, &mut out);
    encode_integer_tlv(p.error_index as i64, &mut out);
    out.extend_from_slice(&encode_varbind_list(&p.varbinds)?);
    Ok(out)
}

fn decode_request_pdu_content(bytes: &[u8]) -> Result<RequestPdu, SnmpError> {
    let (request_id, rest) = decode_integer_field(bytes)?;
    let (error_status, rest) = decode_integer_field(rest)?;
    let (error_index, rest) = decode_integer_field(rest)?;
    let varbinds = decode_varbind_list(rest)?;
    Ok(RequestPdu { request_id, error_status, error_index, varbinds })
}

fn encode_bulk_pdu_content(p: &BulkPdu) -> Result<Vec<u8>, SnmpError> {
    let mut out = Vec::new();
    encode_integer_tlv(p.request_id as i64, &mut out);
    encode_integer_tlv(p.non_repeaters as i64, &mut out);
    encode_integer_tlv(p.max_repetitions as i64, &mut out);
    out.extend_from_slice(&encode_varbind_list(&p.varbinds)?);
    Ok(out)
}

fn decode_bulk_pdu_content(bytes: &[u8]) -> Result<BulkPdu, SnmpError> {
    let (request_id, rest) = decode_integer_field(bytes)?;
    let (non_repeaters, rest) = decode_integer_field(rest)?;
    let (max_repetitions, rest) = decode_integer_field(rest)?;
    let varbinds = decode_varbind_list(rest)?;
    Ok(BulkPdu { request_id, non_repeaters, max_repetitions, varbinds })
}

fn encode_trap_v1_content(p: &TrapV1Pdu) -> Result<Vec<u8>, SnmpError> {
    let mut out = Vec::new();
    encode_tlv(tag::OID, &crate::ber::encode::encode_oid_content(&p.enterprise)?, &mut out);
    encode_tlv(tag::IP_ADDRESS, &p.agent_addr, &mut out);
    encode_integer_tlv(p.generic_trap as i64, &mut out);
    encode_integer_tlv(p.specific_trap as i64, &mut out);
    encode_tlv(
        tag::TIMETICKS,
        &crate::ber::encode::encode_unsigned_content(p.time_stamp as u64),
        &mut out,
    );
    out.extend_from_slice(&encode_varbind_list(&p.varbinds)?);
    Ok(out)
}

fn decode_trap_v1_content(bytes: &[u8]) -> Result<TrapV1Pdu, SnmpError> {
    let (content, rest) = expect_tag(bytes, tag::OID)?;
    let enterprise = crate::ber::decode::decode_oid_content(content)?;
    let (content, rest) = expect_tag(rest, tag::IP_ADDRESS)?;
    if content.len() != 4 {
        return Err(DecodeErrorKind::MalformedLength.into());
    }
    let mut agent_addr = [0u8; 4];
    agent_addr.copy_from_slice(content);
    let (generic_trap, rest) = decode_integer_field(rest)?;
    let (specific_trap, rest) = decode_integer_field(rest)?;
    let (t, content, rest) = decode_tlv(rest)?;
    if t != tag::TIMETICKS {
        return Err(DecodeErrorKind::UnexpectedTag { got: t, expected: tag::TIMETICKS }.into());
    }
    let time_stamp = crate::ber::decode::decode_unsigned(content)? as u32;
    let varbinds = decode_varbind_list(rest)?;
    Ok(TrapV1Pdu { enterprise, agent_addr, generic_trap, specific_trap, time_stamp, varbinds })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SnmpValue;

    #[test]
    fn get_request_round_trips() {
        let pdu = Pdu::GetRequest(RequestPdu::new(
            42,
            vec![VarBind::request("1.3.6.1.2.1.1.1.0".parse().unwrap())],
        ));
        let bytes = pdu.encode().unwrap();
        let (decoded, rest) = Pdu::decode(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn bulk_pdu_keeps_non_repeaters_off_other_variants() {
        let pdu = Pdu::GetBulkRequest(BulkPdu {
            request_id: 1,
            non_repeaters: 0,
            max_repetitions: 10,
            varbinds: vec![VarBind::request("1.3.6.1.2.1.1".parse().unwrap())],
        });
        let bytes = pdu.encode().unwrap();
        let (decoded, _) = Pdu::decode(&bytes).unwrap();
        match decoded {
            Pdu::GetBulkRequest(b) => assert_eq!(b.max_repetitions, 10),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn response_with_real_value_round_trips() {
        let mut p = RequestPdu::new(42, vec![]);
        p.varbinds.push(VarBind::new(
            "1.3.6.1.2.1.1.1.0".parse().unwrap(),
            SnmpValue::OctetString(b"Test Device".to_vec()),
        ));
        let pdu = Pdu::Response(p);
        let bytes = pdu.encode().unwrap();
        let (decoded, rest) = Pdu::decode(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn trap_v1_has_no_request_id() {
        let pdu = Pdu::Trap(TrapV1Pdu {
            enterprise: "1.3.6.1.4.1.1".parse().unwrap(),
            agent_addr: [10, 0, 0, 1],
            generic_trap: 6,
            specific_trap: 1,
            time_stamp: 1234,
            varbinds: vec![],
        });
        assert_eq!(pdu.request_id(), None);
        let bytes = pdu.encode().unwrap();
        let (decoded, _) = Pdu::decode(&bytes).unwrap();
        assert_eq!(decoded, pdu);
    }
}
