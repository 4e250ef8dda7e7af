// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use snmp_toolkit::{manager::walk::group_into_table, value::SnmpValue, varbind::VarBind};

#[test]
fn groups_a_two_column_table_by_row_index() {
    let root = "1.3.6.1.2.1.2.2".parse().unwrap();
    let vbs = vec![
        VarBind::new("1.3.6.1.2.1.2.2.1.2.1".parse().unwrap(), SnmpValue::OctetString(b"eth0".to_vec())),
        VarBind::new("1.3.6.1.2.1.2.2.1.2.2".parse().unwrap(), SnmpValue::OctetString(b"eth1".to_vec())),
        VarBind::new("1.3.6.1.2.1.2.2.1.8.1".parse().unwrap(), SnmpValue::Integer(1)),
        VarBind::new("1.3.6.1.2.1.2.2.1.8.2".parse().unwrap(), SnmpValue::Integer(2)),
    ];
    let table = group_into_table(&root, vbs);
    assert_eq!(table.len(), 2);
    let row1 = &table[&vec![1u32]];
    assert_eq!(row1.len(), 2);
    assert_eq!(row1[&vec![2u32]].1, SnmpValue::OctetString(b"eth0".to_vec()));
    assert_eq!(row1[&vec![8u32]].1, SnmpValue::Integer(1));
}

#[test]
fn multi_component_row_indices_stay_distinct() {
    let root = "1.3.6.1.2.1.4.20".parse().unwrap();
    let vbs = vec![
        VarBind::new("1.3.6.1.2.1.4.20.1.1.10.0.0.1".parse().unwrap(), SnmpValue::IpAddress([10, 0, 0, 1])),
        VarBind::new("1.3.6.1.2.1.4.20.1.1.10.0.0.2".parse().unwrap(), SnmpValue::IpAddress([10, 0, 0, 2])),
    ];
    let table = group_into_table(&root, vbs);
    assert_eq!(table.len(), 2);
    assert!(table.contains_key(&vec![10, 0, 0, 1]));
    assert!(table.contains_key(&vec![10, 0, 0, 2]));
}

#[test]
fn varbinds_equal_to_root_are_dropped() {
    let root = "1.3.6.1.2.1.1".parse().unwrap();
    let vbs = vec![VarBind::new("1.3.6.1.2.1.1".parse().unwrap(), SnmpValue::Null)];
    let table = group_into_table(&root, vbs);
    assert!(table.is_empty());
}
