// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use snmp_toolkit::{
    manager::client::Manager,
    oid::Oid,
    sim::{device::SimulatorDevice, server::SimServer},
    target::{Options, SnmpVersion, Target},
    value::SnmpValue,
};

/// Bring up a simulator device seeded with `entries` and a manager bound
/// to talk to it over loopback, the shape every scenario test starts
/// from.
pub async fn device_and_manager(entries: Vec<(Oid, SnmpValue)>) -> (SimServer, Manager, Target) {
    let device = Arc::new(SimulatorDevice::new("public", vec![0x80, 0, 0, 0, 1]));
    device.load(entries);
    let server = SimServer::bind("127.0.0.1:0".parse().unwrap(), device).await.unwrap();
    let manager = Manager::bind().await.unwrap();
    let target = Target { addr: "127.0.0.1".parse().unwrap(), embedded_port: Some(server.local_addr.port()) };
    (server, manager, target)
}

pub fn v2c_options() -> Options {
    let mut options = Options::default();
    options.version = SnmpVersion::V2c;
    options.community = b"public".to_vec();
    options
}
