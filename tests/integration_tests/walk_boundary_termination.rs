// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serial_test::serial;
use snmp_toolkit::{manager::walk, value::SnmpValue};

use super::common::{device_and_manager, v2c_options};

#[tokio::test]
#[serial]
async fn walk_stops_at_the_subtree_boundary_even_with_a_large_page() {
    let entries = vec![
        ("1.3.6.1.2.1.1.1.0".parse().unwrap(), SnmpValue::OctetString(b"dev".to_vec())),
        ("1.3.6.1.2.1.1.3.0".parse().unwrap(), SnmpValue::TimeTicks(12345)),
        ("1.3.6.1.2.1.1.5.0".parse().unwrap(), SnmpValue::OctetString(b"name".to_vec())),
        ("1.3.6.1.2.1.2.1.0".parse().unwrap(), SnmpValue::Integer(5)),
    ];
    let (_server, manager, target) = device_and_manager(entries).await;
    let mut options = v2c_options();
    options.max_repetitions = 10;
    let root = "1.3.6.1.2.1.1".parse().unwrap();
    let result = walk::walk(&manager, &target, &root, &options).await.unwrap();
    assert_eq!(result.len(), 3);
    assert!(result.iter().all(|vb| vb.oid.to_string() != "1.3.6.1.2.1.2.1.0"));
}
