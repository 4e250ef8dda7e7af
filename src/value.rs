// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The SNMP value tagged union (spec §3).

use crate::oid::Oid;

/// A typed SNMP value. The discriminant is authoritative: it is carried by
/// the wire tag and is never inferred from the payload on ingress or
/// egress (spec §3 invariant I1).
#[derive(Debug, Clone, PartialEq)]
pub enum SnmpValue {
    Null,
    Integer(i32),
    OctetString(Vec<u8>),
    Oid(Oid),
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Opaque(Vec<u8>),
    Counter64(u64),

    /// In-band exception marker. `NoSuchObject`/`NoSuchInstance` may appear
    /// in v1 and v2c GET/GET-NEXT responses; `EndOfMibView` is a v2c-only
    /// marker (spec §3).
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl SnmpValue {
    /// True for the three exception markers a walk must recognize as
    /// "not real data" (spec §3, §4.2.4).
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            SnmpValue::NoSuchObject | SnmpValue::NoSuchInstance | SnmpValue::EndOfMibView
        )
    }

    pub fn is_end_of_mib_view(&self) -> bool {
        matches!(self, SnmpValue::EndOfMibView)
    }

    /// Short type name used for pretty-printing and the textual walk-file
    /// format (spec §6).
    pub fn type_name(&self) -> &'static str {
        match self {
            SnmpValue::Null => "Null",
            SnmpValue::Integer(_) => "INTEGER",
            SnmpValue::OctetString(_) => "OCTET STRING",
            SnmpValue::Oid(_) => "OID",
            SnmpValue::IpAddress(_) => "IpAddress",
            SnmpValue::Counter32(_) => "Counter32",
            SnmpValue::Gauge32(_) => "Gauge32",
            SnmpValue::TimeTicks(_) => "Timeticks",
            SnmpValue::Opaque(_) => "Opaque",
            SnmpValue::Counter64(_) => "Counter64",
            SnmpValue::NoSuchObject => "noSuchObject",
            SnmpValue::NoSuchInstance => "noSuchInstance",
            SnmpValue::EndOfMibView => "endOfMibView",
        }
    }
}
