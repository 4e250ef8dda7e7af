// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The varbind struct (spec §3, §9 design note on ad-hoc `{oid, value}`
//! shapes).
//!
//! The source this spec was distilled from carried a regression risk from
//! ambiguous `{oid, value}` vs `{oid, type, value}` return shapes. This
//! struct makes the type tag a mandatory field so it cannot be dropped by
//! accident anywhere it is constructed or matched.

use crate::{oid::Oid, value::SnmpValue};

/// A single `(oid, type, value)` triple appearing in a PDU. The `type` tag
/// lives inside [`SnmpValue`]'s discriminant, but is named here explicitly
/// in the struct's documentation because callers must never reconstruct it
/// from the value's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: SnmpValue,
}

impl VarBind {
    pub fn new(oid: Oid, value: SnmpValue) -> Self {
        VarBind { oid, value }
    }

    /// A varbind requesting a value with no payload yet (the shape used in
    /// outbound GET/GET-NEXT requests).
    pub fn request(oid: Oid) -> Self {
        VarBind { oid, value: SnmpValue::Null }
    }
}
