// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serial_test::serial;
use snmp_toolkit::{manager::walk, value::SnmpValue};

use super::common::{device_and_manager, v2c_options};

#[tokio::test]
#[serial]
async fn walk_returns_the_whole_system_subtree_in_order() {
    let entries = vec![
        ("1.3.6.1.2.1.1.1.0".parse().unwrap(), SnmpValue::OctetString(b"dev".to_vec())),
        ("1.3.6.1.2.1.1.3.0".parse().unwrap(), SnmpValue::TimeTicks(12345)),
        ("1.3.6.1.2.1.1.5.0".parse().unwrap(), SnmpValue::OctetString(b"name".to_vec())),
    ];
    let (_server, manager, target) = device_and_manager(entries).await;
    let mut options = v2c_options();
    options.max_repetitions = 2;
    let root = "1.3.6.1.2.1.1".parse().unwrap();
    let result = walk::walk(&manager, &target, &root, &options).await.unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result[0].oid.to_string(), "1.3.6.1.2.1.1.1.0");
    assert_eq!(result[0].value.type_name(), "OCTET STRING");
    assert_eq!(result[1].oid.to_string(), "1.3.6.1.2.1.1.3.0");
    assert_eq!(result[1].value.type_name(), "Timeticks");
    assert_eq!(result[2].oid.to_string(), "1.3.6.1.2.1.1.5.0");
    assert_eq!(result[2].value.type_name(), "OCTET STRING");
}
