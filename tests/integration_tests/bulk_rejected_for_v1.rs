// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use snmp_toolkit::{error::SnmpError, manager::client::Manager, target::{Options, SnmpVersion, Target}};

#[tokio::test]
async fn get_bulk_is_rejected_for_v1_without_sending_a_packet() {
    let manager = Manager::bind().await.unwrap();
    // An address nothing is listening on; if get_bulk sent a packet this
    // test would hang on the timeout instead of failing fast.
    let target: Target = "127.0.0.1:1".parse().unwrap();
    let mut options = Options::default();
    options.version = SnmpVersion::V1;
    let result = manager.get_bulk(&target, &["1.3.6.1.2.1.1".parse().unwrap()], &options).await;
    assert!(matches!(result, Err(SnmpError::UnsupportedForVersion)));
}
