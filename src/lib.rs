#![forbid(unsafe_code)]

//! Tools for mirroring a BlackVue dashcam's recordings to local disk.
//!
//! The dashcam runs an embedded HTTP file server. [`client::DashcamClient`]
//! talks to one device, [`listing`] parses its inventory format, and
//! [`archive`] decides which recordings are missing locally and drives the
//! fetch pass. The `bvd` binary wires these together behind `status` and
//! `sync` commands.

pub mod archive;
pub mod client;
pub mod config;
pub mod listing;
pub mod security;

pub use archive::{ArchivePaths, Summary};
pub use client::DashcamClient;
pub use listing::{Category, Listing, Recording};
