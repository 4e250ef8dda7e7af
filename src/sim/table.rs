// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The simulator's managed-object store (spec §4.5): a sorted OID table
//! with `O(log n)` successor lookup, backing GET/GET-NEXT/GET-BULK.

use std::{
    collections::BTreeMap,
    ops::Bound::{Excluded, Unbounded},
};

use crate::{oid::Oid, value::SnmpValue};

/// A lexicographically ordered `OID -> value` map. `BTreeMap` already
/// orders keys the way [`Oid`]'s `Ord` impl defines subtree boundaries, so
/// successor lookup is a single `range` query.
#[derive(Debug, Clone, Default)]
pub struct OidTable(BTreeMap<Oid, SnmpValue>);

impl OidTable {
    pub fn new() -> Self {
        OidTable(BTreeMap::new())
    }

    pub fn get(&self, oid: &Oid) -> Option<&SnmpValue> {
        self.0.get(oid)
    }

    pub fn contains(&self, oid: &Oid) -> bool {
        self.0.contains_key(oid)
    }

    /// Insert or overwrite `oid`'s value, returning the previous value if
    /// any (used by SET's atomic-revert path).
    pub fn set(&mut self, oid: Oid, value: SnmpValue) -> Option<SnmpValue> {
        self.0.insert(oid, value)
    }

    pub fn remove(&mut self, oid: &Oid) -> Option<SnmpValue> {
        self.0.remove(oid)
    }

    /// The least key strictly greater than `oid` (spec §4.5 GET-NEXT).
    pub fn successor(&self, oid: &Oid) -> Option<(&Oid, &SnmpValue)> {
        self.0.range((Excluded(oid), Unbounded)).next()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &SnmpValue)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> OidTable {
        let mut t = OidTable::new();
        t.set("1.3.6.1.2.1.1.1.0".parse().unwrap(), SnmpValue::OctetString(b"dev".to_vec()));
        t.set("1.3.6.1.2.1.1.3.0".parse().unwrap(), SnmpValue::TimeTicks(12345));
        t.set("1.3.6.1.2.1.1.5.0".parse().unwrap(), SnmpValue::OctetString(b"name".to_vec()));
        t
    }

    #[test]
    fn successor_finds_next_key_in_order() {
        let t = table();
        let cursor: Oid = "1.3.6.1.2.1.1.1.0".parse().unwrap();
        let (next, _) = t.successor(&cursor).unwrap();
        assert_eq!(next.to_string(), "1.3.6.1.2.1.1.3.0");
    }

    #[test]
    fn successor_of_last_key_is_none() {
        let t = table();
        let cursor: Oid = "1.3.6.1.2.1.1.5.0".parse().unwrap();
        assert!(t.successor(&cursor).is_none());
    }

    #[test]
    fn successor_is_strict_not_inclusive() {
        let t = table();
        let cursor: Oid = "1.3.6.1.2.1.1.3.0".parse().unwrap();
        let (next, _) = t.successor(&cursor).unwrap();
        assert_ne!(next, &cursor);
    }
}
