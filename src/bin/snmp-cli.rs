// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Thin CLI surface (spec §2.4, §6): `get`/`walk` against a real agent,
//! and `sim` to run an in-memory device under [`snmp_toolkit::sim`].

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use snmp_toolkit::{
    config::{parse_engine_id_hex, Config},
    manager::{client::Manager, walk},
    oid::Oid,
    sim::{device::SimulatorDevice, server::SimServer, walkfile},
    target::{Options, Target},
};
use tracing::info;

#[derive(Parser)]
#[command(name = "snmp-cli", about = "SNMP v1/v2c/v3 manager and device simulator")]
struct Cli {
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
    #[arg(long)]
    log_config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

/// v3 credential selection shared by `get` and `walk`: a `security_name`
/// from `manager.users` in the config, localized against the target's
/// known `engineID` (spec §4.4; discovery of an unknown engine is out of
/// scope here, so the engine ID must be supplied).
#[derive(clap::Args)]
struct V3Auth {
    /// `security_name` of a user listed under `manager.users` in the config.
    #[arg(long)]
    user: Option<String>,
    /// Target's engineID as hex, with or without a leading `0x`. Required
    /// when `--user` is given.
    #[arg(long)]
    engine_id: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// GET one or more OIDs from a target.
    Get {
        target: String,
        #[arg(required = true)]
        oids: Vec<String>,
        #[command(flatten)]
        auth: V3Auth,
    },
    /// Walk a subtree rooted at `oid` on a target.
    Walk {
        target: String,
        oid: String,
        #[command(flatten)]
        auth: V3Auth,
    },
    /// Run an in-memory device, seeded from a walk file, until interrupted.
    Sim,
}

/// Resolve `auth` against `cfg`, setting `options.user` when a
/// `security_name` was requested.
fn apply_v3_auth(cfg: &Config, auth: &V3Auth, options: &mut Options) -> Result<()> {
    let Some(security_name) = &auth.user else {
        return Ok(());
    };
    let engine_id_hex = auth.engine_id.as_ref().context("--user requires --engine-id")?;
    let engine_id = parse_engine_id_hex(engine_id_hex)?;
    let user_cfg = cfg
        .find_user(security_name)
        .with_context(|| format!("no manager.users entry named {security_name:?} in config"))?;
    options.user = Some(user_cfg.localize(&engine_id)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger_guard = match &cli.log_config {
        Some(path) => Some(snmp_toolkit::logging::init_logger(path.to_str().context("non-utf8 log config path")?)?),
        None => None,
    };

    let cfg = Config::load_from_file(&cli.config).with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command {
        Command::Get { target, oids, auth } => run_get(&cfg, &target, &oids, &auth).await,
        Command::Walk { target, oid, auth } => run_walk(&cfg, &target, &oid, &auth).await,
        Command::Sim => run_sim(&cfg).await,
    }
}

async fn run_get(cfg: &Config, target: &str, oids: &[String], auth: &V3Auth) -> Result<()> {
    let target: Target = Target::resolve_str(target).await.context("invalid or unresolvable target")?;
    let oids: Vec<Oid> = oids.iter().map(|s| s.parse()).collect::<Result<_, _>>().context("invalid OID")?;
    let manager = Manager::bind().await.context("failed to bind UDP transport")?;
    let mut options = cfg.manager_options();
    apply_v3_auth(cfg, auth, &mut options)?;
    let result = manager.get(&target, &oids, &options).await.context("GET failed")?;
    for vb in result {
        println!("{} = {}: {:?}", vb.oid, vb.value.type_name(), vb.value);
    }
    Ok(())
}

async fn run_walk(cfg: &Config, target: &str, oid: &str, auth: &V3Auth) -> Result<()> {
    let target: Target = Target::resolve_str(target).await.context("invalid or unresolvable target")?;
    let root: Oid = oid.parse().context("invalid OID")?;
    let manager = Manager::bind().await.context("failed to bind UDP transport")?;
    let mut options = cfg.manager_options();
    apply_v3_auth(cfg, auth, &mut options)?;
    let result = walk::walk(&manager, &target, &root, &options).await.context("walk failed")?;
    for vb in result {
        println!("{} = {}: {:?}", vb.oid, vb.value.type_name(), vb.value);
    }
    Ok(())
}

async fn run_sim(cfg: &Config) -> Result<()> {
    let sim_cfg = cfg.simulator.as_ref().context("config has no [simulator] section")?;
    let engine_id = sim_cfg.engine_id_bytes()?;
    let mut device = SimulatorDevice::new(sim_cfg.community.clone(), engine_id.clone()).with_response_cap(sim_cfg.response_cap);
    for user_cfg in &sim_cfg.users {
        device = device.with_user(user_cfg.localize(&engine_id)?);
    }
    if let Some(path) = &sim_cfg.walk_file {
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read walk file: {path}"))?;
        device.load(walkfile::parse(&text)?);
    }
    let device = Arc::new(device);
    let server = SimServer::bind(sim_cfg.listen_address, device).await.context("failed to bind simulator socket")?;
    info!(addr = %server.local_addr, "simulator listening");
    std::future::pending::<()>().await;
    Ok(())
}
