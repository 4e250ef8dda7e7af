// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Multi-target fan-out (spec §4.3, component C6): run the same walk
//! against many `(target, oid, options)` triples under a bounded
//! concurrency limit, preserving per-input result order and length even
//! when every input fails.
//!
//! This module exists to fix a historical regression where the
//! equivalent routine collapsed every target's walk down to its first
//! varbind; [`fan_out`] and friends are built so that truncation is
//! structurally impossible, not merely tested against.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Semaphore;

use crate::{
    error::SnmpError,
    manager::{client::Manager, walk},
    oid::Oid,
    target::{Options, ReturnFormat, Target},
    varbind::VarBind,
};

/// One fan-out input: a target, the subtree to walk, and the options to
/// walk it with.
#[derive(Debug, Clone)]
pub struct FanoutRequest {
    pub target: Target,
    pub root: Oid,
    pub options: Options,
}

/// Per-target walk outcome.
pub type FanoutResult = Result<Vec<VarBind>, SnmpError>;

/// Run every request concurrently, bounded by `concurrency`, and return
/// results in input order (spec §4.3 L1, L2).
///
/// `concurrency` of `0` is treated as `1`: fan-out always makes forward
/// progress, it never silently executes nothing.
pub async fn fan_out(manager: &Manager, requests: &[FanoutRequest], concurrency: usize) -> Vec<FanoutResult> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::with_capacity(requests.len());
    for req in requests {
        let manager = manager.clone();
        let req = req.clone();
        let permits = Arc::clone(&permits);
        tasks.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.expect("semaphore is never closed");
            walk::walk(&manager, &req.target, &req.root, &req.options).await
        }));
    }
    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(match task.await {
            Ok(result) => result,
            Err(_) => Err(SnmpError::Cancelled),
        });
    }
    results
}

/// `fan_out` in the `with_targets` output shape: each result paired with
/// the request it came from.
pub async fn fan_out_with_targets(
    manager: &Manager,
    requests: &[FanoutRequest],
    concurrency: usize,
) -> Vec<(FanoutRequest, FanoutResult)> {
    let results = fan_out(manager, requests, concurrency).await;
    requests.iter().cloned().zip(results).collect()
}

/// `fan_out` in the `map` output shape, keyed by `(target, root)`. Per
/// spec §9, a duplicate `(target, root)` pair in `requests` has its
/// earlier result overwritten by the later one.
pub async fn fan_out_map(
    manager: &Manager,
    requests: &[FanoutRequest],
    concurrency: usize,
) -> HashMap<(Target, Oid), FanoutResult> {
    let results = fan_out(manager, requests, concurrency).await;
    requests
        .iter()
        .map(|r| (r.target, r.root.clone()))
        .zip(results)
        .collect()
}

/// Dispatch to the output shape named by `options.return_format`
/// (spec §6 `return_format`), returning the `list` shape unified with
/// the other two behind a single enum so callers can pick a shape at
/// runtime.
pub async fn fan_out_shaped(manager: &Manager, requests: &[FanoutRequest], concurrency: usize, format: ReturnFormat) -> FanoutOutput {
    match format {
        ReturnFormat::List => FanoutOutput::List(fan_out(manager, requests, concurrency).await),
        ReturnFormat::WithTargets => FanoutOutput::WithTargets(fan_out_with_targets(manager, requests, concurrency).await),
        ReturnFormat::Map => FanoutOutput::Map(fan_out_map(manager, requests, concurrency).await),
    }
}

/// The three output shapes of spec §4.3, unified for callers that pick a
/// shape at runtime from [`ReturnFormat`].
#[derive(Debug)]
pub enum FanoutOutput {
    List(Vec<FanoutResult>),
    WithTargets(Vec<(FanoutRequest, FanoutResult)>),
    Map(HashMap<(Target, Oid), FanoutResult>),
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::{manager::client::Manager, value::SnmpValue};

    fn request(addr: Ipv4Addr, root: &str) -> FanoutRequest {
        FanoutRequest {
            target: Target { addr: addr.into(), embedded_port: Some(1) },
            root: root.parse().unwrap(),
            options: Options::default(),
        }
    }

    #[tokio::test]
    async fn length_preserved_when_every_target_is_unreachable() {
        let manager = Manager::bind().await.unwrap();
        let requests = vec![
            request(Ipv4Addr::new(127, 0, 0, 1), "1.3.6.1.2.1.1"),
            request(Ipv4Addr::new(127, 0, 0, 1), "1.3.6.1.2.1.2"),
            request(Ipv4Addr::new(127, 0, 0, 1), "1.3.6.1.2.1.3"),
        ];
        let mut opts = Options::default();
        opts.timeout_ms = 50;
        opts.retries = 0;
        let requests: Vec<_> = requests
            .into_iter()
            .map(|mut r| {
                r.options = opts.clone();
                r
            })
            .collect();
        let results = fan_out(&manager, &requests, 2).await;
        assert_eq!(results.len(), requests.len());
        assert!(results.iter().all(Result::is_err));
    }

    #[test]
    fn map_shape_deduplicates_by_last_write() {
        let key = (Target { addr: Ipv4Addr::new(127, 0, 0, 1).into(), embedded_port: None }, "1.3.6.1".parse::<Oid>().unwrap());
        let mut map: HashMap<(Target, Oid), FanoutResult> = HashMap::new();
        map.insert(key.clone(), Ok(vec![VarBind::new("1.3.6.1.1".parse().unwrap(), SnmpValue::Null)]));
        map.insert(key.clone(), Ok(Vec::new()));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&key).unwrap().as_ref().unwrap().len(), 0);
    }
}
