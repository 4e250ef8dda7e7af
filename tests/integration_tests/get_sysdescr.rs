// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serial_test::serial;
use snmp_toolkit::value::SnmpValue;

use super::common::{device_and_manager, v2c_options};

#[tokio::test]
#[serial]
async fn get_system_sysdescr_over_v2c() {
    let entries = vec![("1.3.6.1.2.1.1.1.0".parse().unwrap(), SnmpValue::OctetString(b"Test Device".to_vec()))];
    let (_server, manager, target) = device_and_manager(entries).await;
    let result = manager.get(&target, &["1.3.6.1.2.1.1.1.0".parse().unwrap()], &v2c_options()).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].oid.to_string(), "1.3.6.1.2.1.1.1.0");
    assert_eq!(result[0].value, SnmpValue::OctetString(b"Test Device".to_vec()));
}
