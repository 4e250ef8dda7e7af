// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use serial_test::serial;
use snmp_toolkit::{
    manager::client::Manager,
    sim::{device::SimulatorDevice, server::SimServer},
    target::{Options, SnmpVersion, Target},
    value::SnmpValue,
};

use super::common::v2c_options;

#[tokio::test]
#[serial]
async fn embedded_port_wins_over_the_option_port() {
    let device = Arc::new(SimulatorDevice::new("public", vec![0x80, 0, 0, 0, 1]));
    device.load(vec![("1.3.6.1.2.1.1.1.0".parse().unwrap(), SnmpValue::OctetString(b"dev".to_vec()))]);
    let server = SimServer::bind("127.0.0.1:0".parse().unwrap(), device).await.unwrap();
    let manager = Manager::bind().await.unwrap();

    // Embedded port is the real listener; the option port points nowhere.
    // "localhost" exercises the DNS-name form of "host:port" (spec §6),
    // same shape as the worked example's "dev.local:8161".
    let target = Target::resolve_str(&format!("localhost:{}", server.local_addr.port())).await.unwrap();
    let mut options: Options = v2c_options();
    options.port = Some(1);
    options.version = SnmpVersion::V2c;

    let result = manager.get(&target, &["1.3.6.1.2.1.1.1.0".parse().unwrap()], &options).await.unwrap();
    assert_eq!(result[0].value, SnmpValue::OctetString(b"dev".to_vec()));
}
