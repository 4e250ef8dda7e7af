// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Walk algorithms (spec §4.2.4, component C5): `walk`, `bulk_walk`,
//! `walk_table`, and the adaptive variant, all built on the single-request
//! API in [`super::client`].

use std::collections::BTreeMap;

use crate::{
    error::SnmpError,
    manager::client::Manager,
    oid::Oid,
    target::{Options, SnmpVersion, Target},
    value::SnmpValue,
    varbind::VarBind,
};

/// `walk_table`'s grouped output: `index -> {column -> value}`, with
/// columns recorded in first-seen order inside each index's map is not
/// preserved by `BTreeMap`; callers that need that ordering should use
/// the flat `varbinds` returned by `walk` instead (spec §4.2.4.4).
pub type TableRows = BTreeMap<Vec<u32>, BTreeMap<Vec<u32>, (Oid, SnmpValue)>>;

/// Enumerate every varbind in subtree `root`, choosing GET-NEXT or
/// GET-BULK iteration based on `options.version` (spec §4.2.2, §4.2.4).
pub async fn walk(manager: &Manager, target: &Target, root: &Oid, options: &Options) -> Result<Vec<VarBind>, SnmpError> {
    let (result, err) = walk_inner(manager, target, root, options).await;
    match err {
        None => Ok(result),
        Some(e) => Err(e),
    }
}

/// Like [`walk`], but on failure always returns the varbinds accumulated
/// before the error alongside it, instead of discarding them; the caller
/// decides (per `options.partial_on_error`, spec §4.2.5) whether to keep
/// or drop that partial result.
pub async fn walk_with_partial(
    manager: &Manager,
    target: &Target,
    root: &Oid,
    options: &Options,
) -> (Vec<VarBind>, Option<SnmpError>) {
    walk_inner(manager, target, root, options).await
}

async fn walk_inner(manager: &Manager, target: &Target, root: &Oid, options: &Options) -> (Vec<VarBind>, Option<SnmpError>) {
    match options.version {
        SnmpVersion::V1 => get_next_walk_inner(manager, target, root, options).await,
        SnmpVersion::V2c | SnmpVersion::V3 => bulk_walk_inner(manager, target, root, options, None).await,
    }
}

/// GET-NEXT walk (spec §4.2.4.1): one varbind per round, strictly
/// monotonic, bounded by `max_iterations`.
pub async fn get_next_walk(
    manager: &Manager,
    target: &Target,
    root: &Oid,
    options: &Options,
) -> Result<Vec<VarBind>, SnmpError> {
    let (result, err) = get_next_walk_inner(manager, target, root, options).await;
    match err {
        None => Ok(result),
        Some(e) => Err(e),
    }
}

async fn get_next_walk_inner(
    manager: &Manager,
    target: &Target,
    root: &Oid,
    options: &Options,
) -> (Vec<VarBind>, Option<SnmpError>) {
    let mut cursor = root.clone();
    let mut result = Vec::new();
    for _ in 0..options.max_iterations {
        let reply = match manager.get_next(target, std::slice::from_ref(&cursor), options).await {
            Ok(r) => r,
            Err(e) => return (result, Some(e)),
        };
        let vb = match <[VarBind; 1]>::try_from(reply) {
            Ok([vb]) => vb,
            Err(_) => {
                let e = SnmpError::ProtocolError("GET-NEXT reply did not carry exactly one varbind".into());
                return (result, Some(e));
            }
        };
        if vb.value.is_end_of_mib_view() {
            break;
        }
        if !root.is_prefix_of(&vb.oid) {
            break;
        }
        if vb.oid <= cursor {
            return (result, Some(SnmpError::NonIncreasingOid));
        }
        cursor = vb.oid.clone();
        result.push(vb);
    }
    (result, None)
}

/// GET-BULK walk (spec §4.2.4.2): take a prefix of in-scope varbinds each
/// round rather than filtering, so the walk terminates exactly at the
/// subtree boundary even if a later OID would spuriously re-match.
pub async fn bulk_walk(manager: &Manager, target: &Target, root: &Oid, options: &Options) -> Result<Vec<VarBind>, SnmpError> {
    let (result, err) = bulk_walk_inner(manager, target, root, options, None).await;
    match err {
        None => Ok(result),
        Some(e) => Err(e),
    }
}

/// Adaptive walk (spec §4.2.4.3): doubles `max_repetitions` (capped) on
/// a fully-in-scope round, halves it (floor at 1) after a round that
/// crosses the subtree boundary, then continues with the reduced page
/// size instead of stopping — a boundary-crossing round still yields
/// only its in-scope prefix, so halving only affects the cost of the
/// *next* round, not whether this one's results are kept.
pub async fn adaptive_walk(manager: &Manager, target: &Target, root: &Oid, options: &Options) -> Result<Vec<VarBind>, SnmpError> {
    const INITIAL: i32 = 10;
    let (result, err) = bulk_walk_inner(manager, target, root, options, Some(INITIAL)).await;
    match err {
        None => Ok(result),
        Some(e) => Err(e),
    }
}

/// Shared GET-BULK iteration core. `adaptive` carries the starting
/// `max_repetitions` when adaptive sizing is wanted; `None` runs the
/// fixed-size variant used by [`bulk_walk`].
async fn bulk_walk_inner(
    manager: &Manager,
    target: &Target,
    root: &Oid,
    options: &Options,
    adaptive: Option<i32>,
) -> (Vec<VarBind>, Option<SnmpError>) {
    const CAP: i32 = 50;
    let mut cursor = root.clone();
    let mut result = Vec::new();
    let mut max_repetitions = adaptive.unwrap_or(options.max_repetitions);
    loop {
        let mut round_options = options.clone();
        round_options.non_repeaters = 0;
        round_options.max_repetitions = max_repetitions;
        let vbs = match manager.get_bulk(target, std::slice::from_ref(&cursor), &round_options).await {
            Ok(v) => v,
            Err(e) => return (result, Some(e)),
        };
        let in_scope_count = vbs
            .iter()
            .take_while(|vb| !vb.value.is_end_of_mib_view() && root.is_prefix_of(&vb.oid))
            .count();
        let in_scope = &vbs[..in_scope_count];
        if in_scope.is_empty() {
            break;
        }
        let last_oid = in_scope.last().expect("non-empty checked above").oid.clone();
        result.extend_from_slice(in_scope);
        if last_oid <= cursor {
            return (result, Some(SnmpError::NonIncreasingOid));
        }
        let crossed_boundary = in_scope_count < vbs.len();
        cursor = last_oid;
        if crossed_boundary {
            if adaptive.is_none() {
                break;
            }
            max_repetitions = (max_repetitions / 2).max(1);
            continue;
        }
        if adaptive.is_some() {
            max_repetitions = (max_repetitions * 2).min(CAP);
        }
    }
    (result, None)
}

/// `walk_table(R)`: `walk(R)` grouped by index suffix (spec §4.2.4.4).
/// `R`'s immediate child under the walked root is the column; everything
/// after that is the row index.
pub fn group_into_table(root: &Oid, varbinds: Vec<VarBind>) -> TableRows {
    let mut rows: TableRows = BTreeMap::new();
    let prefix_len = root.as_slice().len();
    for vb in varbinds {
        let tail = &vb.oid.as_slice()[prefix_len..];
        if tail.is_empty() {
            continue;
        }
        let column = vec![tail[0]];
        let index = tail[1..].to_vec();
        rows.entry(index).or_default().insert(column, (vb.oid, vb.value));
    }
    rows
}

/// `walk_table(R)` (spec §4.2.4.4).
pub async fn walk_table(manager: &Manager, target: &Target, root: &Oid, options: &Options) -> Result<TableRows, SnmpError> {
    let varbinds = walk(manager, target, root, options).await?;
    Ok(group_into_table(root, varbinds))
}

/// `walk_column(column_oid)`: `walk(column_oid)` under the same subtree
/// invariants (spec §4.2.4.4).
pub async fn walk_column(manager: &Manager, target: &Target, column: &Oid, options: &Options) -> Result<Vec<VarBind>, SnmpError> {
    walk(manager, target, column, options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_into_table_splits_column_and_index() {
        let root: Oid = "1.3.6.1.2.1.2.2".parse().unwrap();
        let vbs = vec![
            VarBind::new("1.3.6.1.2.1.2.2.1.2.1".parse().unwrap(), SnmpValue::OctetString(b"eth0".to_vec())),
            VarBind::new("1.3.6.1.2.1.2.2.1.2.2".parse().unwrap(), SnmpValue::OctetString(b"eth1".to_vec())),
        ];
        let table = group_into_table(&root, vbs);
        assert_eq!(table.len(), 2);
        assert!(table.contains_key(&vec![1u32]));
        assert!(table.contains_key(&vec![2u32]));
    }
}
