#![forbid(unsafe_code)]

//! Command-line client that mirrors a BlackVue dashcam's recordings.
//!
//! `bvd status` compares what the device holds against the local archive;
//! `bvd sync` downloads everything that's missing, front and rear cameras in
//! parallel. Device address and archive directory come from the command line
//! or, for unattended runs, from the environment (see `config`).

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use blackvue_tools::archive::{self, ArchivePaths};
use blackvue_tools::client::DashcamClient;
use blackvue_tools::config::{Runtime, RuntimeOverrides, resolve_runtime};
use blackvue_tools::security::ensure_not_root;

const USAGE: &str = "Usage: bvd status [device_address] [archive_dir] [--json] [--env-file <path>]\n       bvd sync [device_address] [archive_dir] [--env-file <path>]";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CliCommand {
    Status,
    Sync,
}

#[derive(Debug)]
struct CliArgs {
    command: CliCommand,
    runtime: Runtime,
    json: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        Self::from_iter(env::args().skip(1))
    }

    #[cfg(test)]
    fn from_slice(values: &[&str]) -> Result<Self> {
        Self::from_iter(values.iter().map(|value| value.to_string()))
    }

    fn from_iter<I>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut command: Option<CliCommand> = None;
        let mut positionals: Vec<String> = Vec::new();
        let mut json = false;
        let mut env_file: Option<PathBuf> = None;
        let mut args = iter.into_iter();

        while let Some(arg) = args.next() {
            if let Some(value) = arg.strip_prefix("--env-file=") {
                env_file = Some(PathBuf::from(value));
                continue;
            }

            match arg.as_str() {
                "--json" => json = true,
                "--env-file" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--env-file requires a value"))?;
                    env_file = Some(PathBuf::from(value));
                }
                _ if arg.starts_with('-') => {
                    bail!("unknown argument: {arg}");
                }
                _ if command.is_none() => {
                    command = Some(Self::parse_command(&arg)?);
                }
                _ => positionals.push(arg),
            }
        }

        let Some(command) = command else {
            bail!("{USAGE}");
        };
        if json && command != CliCommand::Status {
            bail!("--json only applies to the status command");
        }
        if positionals.len() > 2 {
            bail!("unexpected argument: {}\n{USAGE}", positionals[2]);
        }

        let mut positionals = positionals.into_iter();
        let runtime = resolve_runtime(RuntimeOverrides {
            device_addr: positionals.next(),
            archive_root: positionals.next().map(PathBuf::from),
            env_path: env_file,
        })?;

        Ok(Self {
            command,
            runtime,
            json,
        })
    }

    fn parse_command(value: &str) -> Result<CliCommand> {
        match value {
            "status" => Ok(CliCommand::Status),
            "sync" => Ok(CliCommand::Sync),
            _ => bail!("unknown command: {value}\n{USAGE}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    ensure_not_root("bvd")?;

    let args = CliArgs::parse()?;
    let client = DashcamClient::new(&args.runtime.device_addr, args.runtime.timeouts);
    let root = std::path::absolute(&args.runtime.archive_root).with_context(|| {
        format!("resolving {}", args.runtime.archive_root.display())
    })?;
    let paths = ArchivePaths::with_root(&root);

    match args.command {
        CliCommand::Status => run_status(client, paths, args.json).await,
        CliCommand::Sync => run_sync(client, paths).await,
    }
}

async fn run_status(client: DashcamClient, paths: ArchivePaths, json: bool) -> Result<()> {
    let device = client.address().to_owned();
    let summary = archive::status(client, paths).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Device {device}");
    print_category("front", summary.front_total, summary.front_missing);
    print_category("rear", summary.rear_total, summary.rear_missing);
    if summary.unknown_total > 0 {
        println!(
            "{} listing entries with no orientation tag:",
            summary.unknown_total
        );
        for identifier in &summary.unknown {
            println!("  - {identifier}");
        }
    }
    Ok(())
}

fn print_category(label: &str, total: usize, missing: usize) {
    println!(
        "{label}: {} of {total} archived, {missing} missing",
        total - missing
    );
}

async fn run_sync(client: DashcamClient, paths: ArchivePaths) -> Result<()> {
    println!("===================================");
    println!("BlackVue Recording Sync");
    println!("===================================");
    println!("Device: {}", client.address());
    println!("Archive: {}", paths.root.display());
    println!();

    archive::sync(client, paths).await?;

    println!();
    println!("Sync pass complete.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    // Argument parsing resolves config relative to the cwd, so tests that
    // exercise .env fallback serialize their cwd changes.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn parse_in_dir(env_contents: Option<&str>, args: &[&str]) -> Result<CliArgs> {
        let _lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        if let Some(contents) = env_contents {
            fs::write(dir.path().join(".env"), contents).unwrap();
        }
        let cwd = env::current_dir().unwrap();
        env::set_current_dir(dir.path()).unwrap();
        let parsed = CliArgs::from_slice(args);
        env::set_current_dir(cwd).unwrap();
        parsed
    }

    #[test]
    fn parses_sync_with_positionals() {
        let args = parse_in_dir(None, &["sync", "10.0.0.42", "/srv/dashcam"]).unwrap();
        assert_eq!(args.command, CliCommand::Sync);
        assert_eq!(args.runtime.device_addr, "10.0.0.42");
        assert_eq!(args.runtime.archive_root, PathBuf::from("/srv/dashcam"));
        assert!(!args.json);
    }

    #[test]
    fn parses_status_with_json_flag() {
        let args = parse_in_dir(None, &["status", "10.0.0.42", "/srv", "--json"]).unwrap();
        assert_eq!(args.command, CliCommand::Status);
        assert!(args.json);
    }

    #[test]
    fn json_is_rejected_for_sync() {
        let err = parse_in_dir(None, &["sync", "10.0.0.42", "/srv", "--json"]).unwrap_err();
        assert!(err.to_string().contains("--json"));
    }

    #[test]
    fn missing_command_shows_usage() {
        let err = parse_in_dir(None, &[]).unwrap_err();
        assert!(err.to_string().contains("Usage:"));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let err = parse_in_dir(None, &["prune", "10.0.0.42", "/srv"]).unwrap_err();
        assert!(err.to_string().contains("unknown command: prune"));
    }

    #[test]
    fn extra_positionals_are_rejected() {
        let err = parse_in_dir(None, &["sync", "a", "b", "c"]).unwrap_err();
        assert!(err.to_string().contains("unexpected argument: c"));
    }

    #[test]
    fn positionals_fall_back_to_env_file() {
        let args = parse_in_dir(
            Some("BLACKVUE_ADDR=\"10.0.0.42\"\nARCHIVE_ROOT=\"/srv/dashcam\"\n"),
            &["sync"],
        )
        .unwrap();
        assert_eq!(args.runtime.device_addr, "10.0.0.42");
        assert_eq!(args.runtime.archive_root, PathBuf::from("/srv/dashcam"));
    }

    #[test]
    fn missing_device_address_is_a_usage_error() {
        let err = parse_in_dir(None, &["sync"]).unwrap_err();
        assert!(err.to_string().contains("BLACKVUE_ADDR"));
    }

    #[test]
    fn explicit_env_file_is_honored() {
        let _lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let env_path = dir.path().join("device.env");
        fs::write(
            &env_path,
            "BLACKVUE_ADDR=\"192.168.1.7\"\nARCHIVE_ROOT=\"/mnt/usb\"\n",
        )
        .unwrap();

        let args = CliArgs::from_slice(&[
            "status",
            "--env-file",
            env_path.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(args.runtime.device_addr, "192.168.1.7");
    }
}
