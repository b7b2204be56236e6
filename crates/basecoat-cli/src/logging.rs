// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the log file. The terminal belongs to the TUI,
/// so nothing is written to stderr once this returns.
pub fn init(config: &Config) -> Result<PathBuf> {
    let path = config.log_path()?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {} -- set [log].path", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(config.log_level()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;

    Ok(path)
}

/// `RUST_LOG` wins over `[log].level` when it parses.
fn build_env_filter(level: &str) -> EnvFilter {
    if let Ok(directives) = std::env::var("RUST_LOG")
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
