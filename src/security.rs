#![forbid(unsafe_code)]

//! Process-level guard rails shared by the bvd commands.

use anyhow::{Result, bail};
use nix::unistd::Uid;

/// Fails fast when started as root. The archive lives in a user-owned
/// directory; a root-run pass would leave root-owned files behind that later
/// unprivileged runs cannot truncate or replace.
pub fn ensure_not_root(process: &str) -> Result<()> {
    ensure_not_root_for(Uid::current(), process)
}

fn ensure_not_root_for(uid: Uid, process: &str) -> Result<()> {
    if uid.is_root() {
        bail!("{process} must not run as root; run it as the user that owns the archive");
    }
    Ok(())
}
