// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Tracing setup (spec §2.3): level/output/rotation configured from YAML
//! the way `cfg::logger` does, trimmed to what this crate exercises (no
//! span-field-capturing JSON layer; that machinery fed a span exporter
//! this crate has no use for).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Debug, Deserialize, Clone)]
struct LoggerConfig {
    logger: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
enum Output {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "lowercase")]
enum RotationFreq {
    Minutely,
    Hourly,
    Daily,
    Never,
}

#[derive(Debug, Deserialize, Clone)]
struct LogFileConfig {
    path: String,
    #[serde(default)]
    rotation_frequency: Option<RotationFreq>,
}

#[derive(Debug, Deserialize, Clone)]
struct LogConfig {
    level: String,
    output: Output,
    #[serde(default)]
    file: Option<LogFileConfig>,
}

/// Read `config_path`, build a subscriber from it, and install it as the
/// global default. The returned guard must be kept alive for the
/// process's lifetime when logging to a file (it flushes the
/// non-blocking writer on drop).
pub fn init_logger(config_path: &str) -> Result<WorkerGuard> {
    let content = fs::read_to_string(config_path).with_context(|| format!("failed to read log config: {config_path}"))?;
    let config: LoggerConfig = serde_yaml::from_str(&content).with_context(|| format!("failed to parse log config: {config_path}"))?;

    let (writer, guard) = make_writer(&config.logger)?;
    let env_filter = EnvFilter::try_new(&config.logger.level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .context("failed to parse log level from config or env")?;

    Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("failed to set global default subscriber")?;

    Ok(guard)
}

fn make_writer(cfg: &LogConfig) -> Result<(BoxMakeWriter, WorkerGuard)> {
    Ok(match cfg.output {
        Output::Stdout => {
            let (w, g) = tracing_appender::non_blocking(std::io::stdout());
            (BoxMakeWriter::new(w), g)
        }
        Output::Stderr => {
            let (w, g) = tracing_appender::non_blocking(std::io::stderr());
            (BoxMakeWriter::new(w), g)
        }
        Output::File => {
            let fcfg = cfg.file.clone().context("log.file is required for output=file")?;
            let path = PathBuf::from(&fcfg.path);
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let rotation = match fcfg.rotation_frequency.unwrap_or(RotationFreq::Never) {
                RotationFreq::Minutely => Rotation::MINUTELY,
                RotationFreq::Hourly => Rotation::HOURLY,
                RotationFreq::Daily => Rotation::DAILY,
                RotationFreq::Never => Rotation::NEVER,
            };
            let appender = RollingFileAppender::new(rotation, dir, path.file_name().unwrap_or_default());
            let (w, g) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(w), g)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_file_config_for_file_output() {
        let cfg = LogConfig { level: "info".into(), output: Output::File, file: None };
        assert!(make_writer(&cfg).is_err());
    }
}
