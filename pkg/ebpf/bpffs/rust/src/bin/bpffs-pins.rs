// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use dd_bpffs::{Kernel, ObjType, PinnedObjTable, build_pinned_obj_table_from, config};
use log::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "bpffs-pins")]
#[command(about = "Lists BPF objects pinned in bpffs, keyed by kernel id", long_about = None)]
struct Args {
    /// Kind of object to look for (prog, map or link)
    #[arg(short = 't', long = "type", default_value = "prog")]
    kind: ObjType,

    /// Only print the object with this id
    #[arg(long)]
    id: Option<u32>,

    /// Path to the agent configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[allow(clippy::print_stdout)]
fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));
    let config = config::load_config(Some(config_path.clone()));
    let log_level = config::get_log_level(&config);
    simple_logger::init_with_level(log_level)?;

    match &config {
        Ok(Some(_)) => debug!("Loaded config from {}", config_path.display()),
        Ok(None) => warn!(
            "Config file not found at {}. Checking environment variables only.",
            config_path.display()
        ),
        Err(e) => warn!("Ignoring config: {e:#}"),
    }

    let mount_table = config::get_mount_table(&config);
    let table = build_table(&mount_table, args.kind)?;

    let json = match args.id {
        Some(id) => {
            let Some(obj) = table.get_object(id) else {
                bail!("No pinned {} with id {id}", args.kind);
            };
            serde_json::to_string_pretty(obj)?
        }
        None => serde_json::to_string_pretty(&table.sorted())?,
    };
    println!("{json}");

    Ok(())
}

fn build_table(mount_table: &Path, kind: ObjType) -> Result<PinnedObjTable> {
    let mut table = PinnedObjTable::new();
    build_pinned_obj_table_from(&Kernel, mount_table, &mut table, kind).with_context(|| {
        format!(
            "Failed to build pinned {kind} table from {}",
            mount_table.display()
        )
    })?;
    info!("Found {} pinned {kind} objects", table.len());
    Ok(table)
}
