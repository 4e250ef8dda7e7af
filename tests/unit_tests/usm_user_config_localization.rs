// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use snmp_toolkit::{
    config::{ConfigAuthProtocol, ConfigPrivProtocol, UsmUserConfig},
    usm::{AuthProtocol, PrivProtocol},
};

#[test]
fn localizes_auth_and_priv_keys_for_an_engine() {
    let cfg = UsmUserConfig {
        security_name: "alice".into(),
        auth_protocol: ConfigAuthProtocol::Sha1,
        auth_passphrase: Some("authpassphrase".into()),
        priv_protocol: ConfigPrivProtocol::Aes128,
        priv_passphrase: Some("privpassphrase".into()),
    };
    let engine_id = hex_literal::hex!("8000000001020304");
    let user = cfg.localize(&engine_id).unwrap();
    assert_eq!(user.security_name, "alice");
    assert_eq!(user.auth_protocol, AuthProtocol::Sha1);
    assert_eq!(user.priv_protocol, PrivProtocol::Aes128);
    assert_eq!(user.auth_key.len(), 20);
    assert_eq!(user.priv_key.len(), 16);
}

#[test]
fn rejects_auth_protocol_without_passphrase() {
    let cfg = UsmUserConfig {
        security_name: "bob".into(),
        auth_protocol: ConfigAuthProtocol::Md5,
        auth_passphrase: None,
        priv_protocol: ConfigPrivProtocol::None,
        priv_passphrase: None,
    };
    assert!(cfg.localize(b"engine").is_err());
}

#[test]
fn no_auth_no_priv_yields_empty_keys() {
    let cfg = UsmUserConfig {
        security_name: "carol".into(),
        auth_protocol: ConfigAuthProtocol::None,
        auth_passphrase: None,
        priv_protocol: ConfigPrivProtocol::None,
        priv_passphrase: None,
    };
    let user = cfg.localize(b"engine").unwrap();
    assert!(user.auth_key.is_empty());
    assert!(user.priv_key.is_empty());
}
