// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::net::Ipv4Addr;

use snmp_toolkit::{
    fanout::{fan_out, FanoutRequest},
    manager::client::Manager,
    target::{Options, ReturnFormat, Target},
};

#[tokio::test]
async fn three_unreachable_targets_yield_three_timeout_slots() {
    let manager = Manager::bind().await.unwrap();
    let mut options = Options::default();
    options.timeout_ms = 200;
    options.retries = 0;
    let requests: Vec<FanoutRequest> = (1u8..=3)
        .map(|n| FanoutRequest {
            target: Target { addr: Ipv4Addr::new(127, 0, 0, n).into(), embedded_port: Some(1) },
            root: "1.3.6.1.2.1.1".parse().unwrap(),
            options: options.clone(),
        })
        .collect();
    let results = fan_out(&manager, &requests, 3).await;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(Result::is_err));
    // `ReturnFormat` is orthogonal to slot count; any shape still preserves
    // exactly one outcome per input.
    let _ = ReturnFormat::List;
}
