#![forbid(unsafe_code)]

//! HTTP client for the dashcam's embedded file server.
//!
//! The device speaks plain HTTP: one CGI endpoint that lists every recording
//! it currently holds, and a `/Record/` path serving the files themselves.
//! One client instance binds one device address, so several cameras can be
//! mirrored by independent clients.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::HttpTimeouts;
use crate::listing::{Listing, parse_listing};

const LISTING_ENDPOINT: &str = "blackvue_vod.cgi";
const RECORD_PATH: &str = "Record";

#[derive(Clone)]
pub struct DashcamClient {
    address: String,
    agent: ureq::Agent,
    list_timeout: Duration,
}

impl DashcamClient {
    /// Binds a client to one device address (`ip` or `ip:port`).
    pub fn new(address: &str, timeouts: HttpTimeouts) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeouts.connect)
            .timeout_read(timeouts.read)
            .build();
        Self {
            address: address.to_owned(),
            agent,
            list_timeout: timeouts.list,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Fetches and parses the device's recording inventory.
    ///
    /// The inventory is produced fresh on every call; nothing is cached
    /// between passes.
    pub fn list(&self) -> Result<Listing> {
        let url = format!("http://{}/{}", self.address, LISTING_ENDPOINT);
        let response = self
            .agent
            .get(&url)
            .timeout(self.list_timeout)
            .call()
            .with_context(|| format!("requesting inventory from {url}"))?;

        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .context("reading inventory response")?;
        Ok(parse_listing(&body))
    }

    /// Downloads one artifact (`<identifier>.mp4` or `<identifier>.thm`)
    /// into `dir`, returning the number of bytes written.
    ///
    /// The local file is created, truncating any previous partial copy,
    /// before the transfer starts. An interrupted transfer therefore leaves
    /// a zero-length or short file behind; file presence alone is not proof
    /// of a complete download.
    pub fn download(&self, dir: &Path, artifact: &str) -> Result<u64> {
        let target = dir.join(artifact);
        let mut file = File::create(&target)
            .with_context(|| format!("creating {}", target.display()))?;

        let url = format!("http://{}/{}/{}", self.address, RECORD_PATH, artifact);
        let response = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("requesting {url}"))?;
        io::copy(&mut response.into_reader(), &mut file)
            .with_context(|| format!("writing {}", target.display()))
    }
}
