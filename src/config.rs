#![forbid(unsafe_code)]

//! Runtime configuration for the bvd binary.
//!
//! The device address and archive root are usually given on the command
//! line, but a cron-driven install can leave them in a `.env` file or the
//! process environment instead. Precedence: caller override, then process
//! environment, then `.env` file, then built-in default (timeouts only).

use anyhow::{Context, Result, anyhow};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_ENV_PATH: &str = ".env";
/// Overall timeout for the inventory request. The listing is small; a
/// device that can't produce it quickly isn't reachable in any useful way.
pub const DEFAULT_LIST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Per-read timeout for artifact transfers. Bounds a stalled socket without
/// capping how long a large video may legitimately take overall.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

/// Timeouts applied to every HTTP exchange with the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub read: Duration,
    pub list: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            list: Duration::from_secs(DEFAULT_LIST_TIMEOUT_SECS),
        }
    }
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Runtime {
    pub device_addr: String,
    pub archive_root: PathBuf,
    pub timeouts: HttpTimeouts,
}

/// Values the caller (normally the CLI) wants to pin regardless of what the
/// environment says.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub device_addr: Option<String>,
    pub archive_root: Option<PathBuf>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_runtime(overrides: RuntimeOverrides) -> Result<Runtime> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_runtime(&file_vars, env_var_string, overrides)
}

fn build_runtime(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: RuntimeOverrides,
) -> Result<Runtime> {
    let device_addr = overrides
        .device_addr
        .map(|addr| addr.trim().to_string())
        .filter(|addr| !addr.is_empty())
        .or_else(|| lookup_value("BLACKVUE_ADDR", file_vars, &env_lookup))
        .ok_or_else(|| {
            anyhow!("device address not set; pass it as an argument or set BLACKVUE_ADDR")
        })?;
    let archive_root = overrides
        .archive_root
        .map(|path| path.to_string_lossy().into_owned())
        .or_else(|| lookup_value("ARCHIVE_ROOT", file_vars, &env_lookup))
        .ok_or_else(|| {
            anyhow!("archive root not set; pass it as an argument or set ARCHIVE_ROOT")
        })?;

    let timeouts = HttpTimeouts {
        connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        read: timeout_secs(
            "BLACKVUE_READ_TIMEOUT",
            file_vars,
            &env_lookup,
            DEFAULT_READ_TIMEOUT_SECS,
        ),
        list: timeout_secs(
            "BLACKVUE_LIST_TIMEOUT",
            file_vars,
            &env_lookup,
            DEFAULT_LIST_TIMEOUT_SECS,
        ),
    };

    Ok(Runtime {
        device_addr,
        archive_root: PathBuf::from(archive_root),
        timeouts,
    })
}

/// Reads a timeout in whole seconds; anything unparseable falls back to the
/// default rather than failing the run.
fn timeout_secs(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
    default_secs: u64,
) -> Duration {
    let secs = lookup_value(key, file_vars, env_lookup)
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key).or_else(|| file_vars.get(key).cloned())
}

/// Parses a `.env`-style file: `KEY=value` lines, optional `export ` prefix,
/// optional single or double quotes, `#` comments. A missing file is the
/// same as an empty one.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    Ok(vars)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .or_else(|| {
            value
                .strip_prefix('\'')
                .and_then(|inner| inner.strip_suffix('\''))
        })
        .unwrap_or(value)
}
