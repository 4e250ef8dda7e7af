// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! YAML-backed configuration (spec §2.2): manager defaults, simulator
//! bootstrap, and the USM user table, loaded and validated the way
//! `cfg::config` loads iSCSI login parameters.

use std::{fs, net::SocketAddr, path::Path};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    sim::device::DEFAULT_RESPONSE_CAP,
    target::{Options, ReturnFormat, SnmpVersion},
    usm::{AuthProtocol, PrivProtocol, UsmUser},
};

/// Top-level configuration document: a manager side and an optional
/// simulator side, loaded independently by whichever binary needs it.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub manager: ManagerConfig,
    #[serde(default)]
    pub simulator: Option<SimulatorConfig>,
}

/// Defaults backing [`Options`] (spec §6): anything not overridden
/// per-call falls back to these values.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct ManagerConfig {
    #[serde(default = "default_community")]
    pub community: String,
    #[serde(default = "default_version")]
    pub version: ConfigVersion,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_max_repetitions")]
    pub max_repetitions: i32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default)]
    pub partial_on_error: bool,
    #[serde(default)]
    pub return_format: ConfigReturnFormat,
    #[serde(default)]
    pub users: Vec<UsmUserConfig>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            community: default_community(),
            version: default_version(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            max_repetitions: default_max_repetitions(),
            max_iterations: default_max_iterations(),
            partial_on_error: false,
            return_format: ConfigReturnFormat::default(),
            users: Vec::new(),
        }
    }
}

fn default_community() -> String {
    "public".into()
}
fn default_version() -> ConfigVersion {
    ConfigVersion::V2c
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_retries() -> u32 {
    2
}
fn default_max_repetitions() -> i32 {
    10
}
fn default_max_iterations() -> u32 {
    10_000
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigVersion {
    V1,
    V2c,
    V3,
}

impl From<ConfigVersion> for SnmpVersion {
    fn from(v: ConfigVersion) -> Self {
        match v {
            ConfigVersion::V1 => SnmpVersion::V1,
            ConfigVersion::V2c => SnmpVersion::V2c,
            ConfigVersion::V3 => SnmpVersion::V3,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfigReturnFormat {
    #[default]
    List,
    WithTargets,
    Map,
}

impl From<ConfigReturnFormat> for ReturnFormat {
    fn from(f: ConfigReturnFormat) -> Self {
        match f {
            ConfigReturnFormat::List => ReturnFormat::List,
            ConfigReturnFormat::WithTargets => ReturnFormat::WithTargets,
            ConfigReturnFormat::Map => ReturnFormat::Map,
        }
    }
}

/// A USM user as written in YAML: raw passphrases, localized into a
/// [`UsmUser`] once the target engine ID is known (spec §4.4).
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct UsmUserConfig {
    pub security_name: String,
    #[serde(default)]
    pub auth_protocol: ConfigAuthProtocol,
    #[serde(default)]
    pub auth_passphrase: Option<String>,
    #[serde(default)]
    pub priv_protocol: ConfigPrivProtocol,
    #[serde(default)]
    pub priv_passphrase: Option<String>,
}

impl UsmUserConfig {
    /// Localize this user's keys to `engine_id` (spec §4.4 "Key
    /// localization"). A `UsmUser` is only valid for the engine it was
    /// localized against, so this is deferred until that engine ID is
    /// known (after discovery, or from simulator config).
    pub fn localize(&self, engine_id: &[u8]) -> Result<UsmUser> {
        UsmUser::from_passphrases(
            self.security_name.clone(),
            engine_id.to_vec(),
            self.auth_protocol.into(),
            self.auth_passphrase.as_deref(),
            self.priv_protocol.into(),
            self.priv_passphrase.as_deref(),
        )
        .with_context(|| format!("failed to localize USM user {:?}", self.security_name))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfigAuthProtocol {
    #[default]
    None,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl From<ConfigAuthProtocol> for AuthProtocol {
    fn from(p: ConfigAuthProtocol) -> Self {
        match p {
            ConfigAuthProtocol::None => AuthProtocol::None,
            ConfigAuthProtocol::Md5 => AuthProtocol::Md5,
            ConfigAuthProtocol::Sha1 => AuthProtocol::Sha1,
            ConfigAuthProtocol::Sha224 => AuthProtocol::Sha224,
            ConfigAuthProtocol::Sha256 => AuthProtocol::Sha256,
            ConfigAuthProtocol::Sha384 => AuthProtocol::Sha384,
            ConfigAuthProtocol::Sha512 => AuthProtocol::Sha512,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfigPrivProtocol {
    #[default]
    None,
    Des,
    Aes128,
    Aes192,
    Aes256,
}

impl From<ConfigPrivProtocol> for PrivProtocol {
    fn from(p: ConfigPrivProtocol) -> Self {
        match p {
            ConfigPrivProtocol::None => PrivProtocol::None,
            ConfigPrivProtocol::Des => PrivProtocol::Des,
            ConfigPrivProtocol::Aes128 => PrivProtocol::Aes128,
            ConfigPrivProtocol::Aes192 => PrivProtocol::Aes192,
            ConfigPrivProtocol::Aes256 => PrivProtocol::Aes256,
        }
    }
}

/// Simulator bootstrap config (spec §4.5, §6): listen address, device
/// identity/policy, response cap, and the walk file to seed its table
/// from.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct SimulatorConfig {
    pub listen_address: SocketAddr,
    #[serde(default = "default_community")]
    pub community: String,
    pub engine_id: String,
    #[serde(default = "default_response_cap")]
    pub response_cap: usize,
    #[serde(default)]
    pub walk_file: Option<String>,
    #[serde(default)]
    pub users: Vec<UsmUserConfig>,
}

fn default_response_cap() -> usize {
    DEFAULT_RESPONSE_CAP
}

impl SimulatorConfig {
    /// Parse `engine_id` as a hex string (with or without a leading
    /// `0x`), the conventional textual form for an engine ID.
    pub fn engine_id_bytes(&self) -> Result<Vec<u8>> {
        parse_engine_id_hex(&self.engine_id)
    }
}

/// Parse an engine ID written as a hex string, with or without a leading
/// `0x` (spec §4.4). Shared by [`SimulatorConfig::engine_id_bytes`] and
/// CLI `--engine-id` arguments localizing a [`UsmUserConfig`] manager-side.
pub fn parse_engine_id_hex(s: &str) -> Result<Vec<u8>> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).with_context(|| format!("invalid EngineID hex: {s}"))
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.as_ref().display()))?;
        let mut cfg: Config = serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(!self.manager.community.is_empty(), "manager.community must not be empty");
        ensure!(self.manager.max_iterations >= 1, "manager.max_iterations must be >= 1");
        ensure!(self.manager.max_repetitions >= 0, "manager.max_repetitions must be >= 0");
        for user in &self.manager.users {
            ensure!(!user.security_name.is_empty(), "USM security_name must not be empty");
        }
        if let Some(sim) = &self.simulator {
            ensure!(!sim.community.is_empty(), "simulator.community must not be empty");
            sim.engine_id_bytes().context("simulator.engine_id")?;
            ensure!(sim.response_cap > 0, "simulator.response_cap must be > 0");
        }
        Ok(())
    }

    /// Build a manager-side [`Options`] from the configured defaults.
    /// The result carries no USM credentials; callers that need v3
    /// auth/priv must set `options.user` themselves, e.g. via
    /// [`Config::find_user`] and [`UsmUserConfig::localize`].
    pub fn manager_options(&self) -> Options {
        Options {
            community: self.manager.community.clone().into_bytes(),
            version: self.manager.version.into(),
            timeout_ms: self.manager.timeout_ms,
            retries: self.manager.retries,
            max_repetitions: self.manager.max_repetitions,
            max_iterations: self.manager.max_iterations,
            partial_on_error: self.manager.partial_on_error,
            return_format: self.manager.return_format.into(),
            ..Options::default()
        }
    }

    /// Look up a configured manager-side USM user by `security_name`
    /// (spec §2.2 "USM user table"). Returns `None` if the config has no
    /// user by that name, e.g. `manager.users` was left empty.
    pub fn find_user(&self, security_name: &str) -> Option<&UsmUserConfig> {
        self.manager.users.iter().find(|u| u.security_name == security_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let mut cfg = Config::default();
        cfg.validate_and_normalize().unwrap();
    }

    #[test]
    fn rejects_empty_community() {
        let mut cfg = Config::default();
        cfg.manager.community.clear();
        assert!(cfg.validate_and_normalize().is_err());
    }

    #[test]
    fn find_user_locates_a_configured_security_name() {
        let mut cfg = Config::default();
        cfg.manager.users.push(UsmUserConfig {
            security_name: "alice".into(),
            auth_protocol: ConfigAuthProtocol::Sha256,
            auth_passphrase: Some("authpassword".into()),
            priv_protocol: ConfigPrivProtocol::Aes128,
            priv_passphrase: Some("privpassword".into()),
        });
        let found = cfg.find_user("alice").expect("user should be found");
        assert_eq!(found.security_name, "alice");
        assert!(cfg.find_user("bob").is_none());

        let user = found.localize(&[0x80, 0, 0, 0, 1]).unwrap();
        assert_eq!(user.security_name, "alice");
    }

    #[test]
    fn simulator_engine_id_parses_hex() {
        let sim = SimulatorConfig {
            listen_address: "127.0.0.1:1161".parse().unwrap(),
            community: "public".into(),
            engine_id: "0x8000000001020304".into(),
            response_cap: DEFAULT_RESPONSE_CAP,
            walk_file: None,
            users: Vec::new(),
        };
        assert_eq!(sim.engine_id_bytes().unwrap(), vec![0x80, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn parses_full_yaml_document() {
        let yaml = "\
manager:\n\
  Community: public\n\
  Version: v2c\n\
  TimeoutMs: 3000\n\
  Retries: 1\n\
simulator:\n\
  ListenAddress: \"127.0.0.1:1161\"\n\
  Community: public\n\
  EngineId: \"0x8000000001\"\n\
";
        let mut cfg: Config = serde_yaml::from_str(yaml).unwrap();
        cfg.validate_and_normalize().unwrap();
        assert_eq!(cfg.manager.timeout_ms, 3000);
        assert_eq!(cfg.simulator.unwrap().engine_id_bytes().unwrap(), vec![0x80, 0, 0, 0, 1]);
    }
}
