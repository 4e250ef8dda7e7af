// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Target addressing and per-call options (spec §6 "External interfaces").

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    str::FromStr,
};

use tokio::net::lookup_host;

use crate::{error::SnmpError, usm::UsmUser};

/// SNMP protocol version for a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnmpVersion {
    V1,
    V2c,
    V3,
}

/// Multi-target fan-out output shape (spec §4.3, §6 `return_format`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnFormat {
    #[default]
    List,
    WithTargets,
    Map,
}

/// A resolved target: a socket address plus an optional port explicitly
/// embedded in the original syntax (spec §4.2.2 port precedence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub addr: IpAddr,
    pub embedded_port: Option<u16>,
}

impl Target {
    /// Resolve the final socket address per the port-precedence rule:
    /// embedded `host:port` beats the `port` option, which beats the
    /// `default` (161 for agents, 162 for traps).
    pub fn resolve(&self, option_port: Option<u16>, default: u16) -> SocketAddr {
        let port = self.embedded_port.or(option_port).unwrap_or(default);
        SocketAddr::new(self.addr, port)
    }

    /// Parse `s` as a target, accepting a DNS name where [`FromStr`] only
    /// accepts literal IPv4/IPv6 (spec §6: `"host:port"` accepts "IPv4
    /// dotted-quad, IPv6 in brackets, or a DNS name"). Literal addresses
    /// are parsed synchronously first; anything else is resolved via the
    /// system resolver, which needs an async runtime.
    pub async fn resolve_str(s: &str) -> Result<Self, SnmpError> {
        if let Ok(literal) = s.parse::<Target>() {
            return Ok(literal);
        }
        let (host, embedded_port) = match s.rsplit_once(':') {
            Some((host, port)) => (host, Some(parse_port(port)?)),
            None => (s, None),
        };
        if host.is_empty() {
            return Err(SnmpError::InvalidArgument(format!("empty host in target: {s}")));
        }
        // Port 0 here is a placeholder for the lookup; the real port comes
        // from `embedded_port`/the caller's option/the default, per resolve().
        let mut addrs = lookup_host((host, 0))
            .await
            .map_err(|e| SnmpError::InvalidArgument(format!("failed to resolve host {host}: {e}")))?;
        let addr = addrs
            .next()
            .ok_or_else(|| SnmpError::InvalidArgument(format!("no addresses found for host {host}")))?
            .ip();
        Ok(Target { addr, embedded_port })
    }
}

impl FromStr for Target {
    type Err = SnmpError;

    /// Accepts `"host:port"`, `"host"`, `"[ipv6]:port"`, and `"[ipv6]"`
    /// where `host` is a literal IPv4 or IPv6 address. DNS names go
    /// through [`Target::resolve_str`] instead, since resolving one needs
    /// an async runtime.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix('[') {
            let (host, rest) = rest
                .split_once(']')
                .ok_or_else(|| SnmpError::InvalidArgument(format!("unterminated IPv6 literal: {s}")))?;
            let addr = Ipv6Addr::from_str(host)
                .map_err(|e| SnmpError::InvalidArgument(format!("invalid IPv6 address {host}: {e}")))?;
            let embedded_port = match rest.strip_prefix(':') {
                Some(p) => Some(parse_port(p)?),
                None if rest.is_empty() => None,
                None => return Err(SnmpError::InvalidArgument(format!("trailing garbage after ]: {rest}"))),
            };
            return Ok(Target { addr: IpAddr::V6(addr), embedded_port });
        }
        // IPv4 "host:port" vs bare IPv6 (which contains multiple colons
        // and must appear in brackets to carry a port, per spec §6).
        match s.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => {
                let addr = Ipv4Addr::from_str(host)
                    .map_err(|e| SnmpError::InvalidArgument(format!("invalid IPv4 address {host}: {e}")))?;
                Ok(Target { addr: IpAddr::V4(addr), embedded_port: Some(parse_port(port)?) })
            }
            _ => {
                if let Ok(v6) = Ipv6Addr::from_str(s) {
                    return Ok(Target { addr: IpAddr::V6(v6), embedded_port: None });
                }
                let v4 = Ipv4Addr::from_str(s)
                    .map_err(|e| SnmpError::InvalidArgument(format!("invalid address {s}: {e}")))?;
                Ok(Target { addr: IpAddr::V4(v4), embedded_port: None })
            }
        }
    }
}

fn parse_port(s: &str) -> Result<u16, SnmpError> {
    s.parse::<u16>()
        .map_err(|_| SnmpError::InvalidArgument(format!("invalid port: {s}")))
        .and_then(|p| {
            if p == 0 {
                Err(SnmpError::InvalidArgument("port 0 is not valid".into()))
            } else {
                Ok(p)
            }
        })
}

/// Per-call options recognized by manager operations (spec §6 table).
#[derive(Debug, Clone)]
pub struct Options {
    pub community: Vec<u8>,
    pub version: SnmpVersion,
    pub user: Option<UsmUser>,
    pub port: Option<u16>,
    pub timeout_ms: u64,
    pub retries: u32,
    pub max_repetitions: i32,
    pub non_repeaters: i32,
    pub max_iterations: u32,
    pub partial_on_error: bool,
    pub return_format: ReturnFormat,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            community: b"public".to_vec(),
            version: SnmpVersion::V2c,
            user: None,
            port: None,
            timeout_ms: 5000,
            retries: 2,
            max_repetitions: 10,
            non_repeaters: 0,
            max_iterations: 10_000,
            partial_on_error: false,
            return_format: ReturnFormat::default(),
        }
    }
}
