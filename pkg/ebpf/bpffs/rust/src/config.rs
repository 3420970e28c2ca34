// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Settings of the bpffs-pins tool.
//!
//! Every setting is looked up in the environment first, then in the
//! `bpffs_pins` section of the agent config file, then in agent-wide keys:
//!
//! ```yaml
//! log_level: info
//! bpffs_pins:
//!   log_level: debug
//!   mount_table: /host/proc/1/mounts
//! ```

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use yaml_rust2::{Yaml, YamlLoader};

use crate::procfs;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/datadog-agent/system-probe.yaml";

const LOG_LEVEL_ENV: [&str; 2] = ["DD_LOG_LEVEL", "LOG_LEVEL"];
const LOG_LEVEL_KEYS: [&str; 2] = ["bpffs_pins.log_level", "log_level"];
const MOUNT_TABLE_ENV: [&str; 1] = ["DD_BPFFS_PINS_MOUNT_TABLE"];
const MOUNT_TABLE_KEYS: [&str; 1] = ["bpffs_pins.mount_table"];

/// Loads the first document of the YAML config file.
///
/// A missing file is `Ok(None)`; the caller decides whether to mention it,
/// since the logger is usually not installed yet.
pub fn load_config(config_path: Option<PathBuf>) -> Result<Option<Yaml>> {
    let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read config file {}", path.display()));
        }
    };

    let docs = YamlLoader::load_from_str(&contents)
        .with_context(|| format!("Failed to parse YAML config {}", path.display()))?;
    Ok(docs.into_iter().next())
}

/// String at the dotted `key`, or None when a part is missing or the value
/// is not a string.
fn yaml_str<'a>(doc: &'a Yaml, key: &str) -> Option<&'a str> {
    key.split('.')
        .try_fold(doc, |node, part| {
            let next = &node[part];
            (!next.is_badvalue()).then_some(next)
        })?
        .as_str()
}

fn lookup(
    config: &Result<Option<Yaml>>,
    env_keys: &[&str],
    yaml_keys: &[&str],
) -> Option<String> {
    if let Some(value) = env_keys.iter().find_map(|key| env::var(key).ok()) {
        return Some(value);
    }

    let doc = config.as_ref().ok()?.as_ref()?;
    yaml_keys
        .iter()
        .find_map(|key| yaml_str(doc, key))
        .map(str::to_owned)
}

/// Parses an agent (Go) log level name. Unknown names fall back to Info.
fn parse_log_level(level: &str) -> log::Level {
    match level.to_ascii_lowercase().as_str() {
        "warning" => log::Level::Warn,
        "critical" | "off" => log::Level::Error,
        other => other.parse().unwrap_or(log::Level::Info),
    }
}

/// Priority: DD_LOG_LEVEL > LOG_LEVEL > bpffs_pins.log_level > log_level > Info
pub fn get_log_level(config: &Result<Option<Yaml>>) -> log::Level {
    lookup(config, &LOG_LEVEL_ENV, &LOG_LEVEL_KEYS)
        .map(|level| parse_log_level(&level))
        .unwrap_or(log::Level::Info)
}

/// Mount table listing the bpffs mounts to scan.
///
/// Priority: DD_BPFFS_PINS_MOUNT_TABLE > bpffs_pins.mount_table > the mount
/// table under the procfs root. Empty values are ignored.
pub fn get_mount_table(config: &Result<Option<Yaml>>) -> PathBuf {
    lookup(config, &MOUNT_TABLE_ENV, &MOUNT_TABLE_KEYS)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(procfs::mounts_path)
}
