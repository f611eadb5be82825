//! giftsync daemon library.
//!
//! Keeps a local `SQLite` store of gift codes and a remote gift code API in
//! sync, announces newly discovered codes, and auto-claims them for opted-in
//! groups. The binary (`giftsync-daemon`) runs the periodic sync; the CLI
//! (`giftsync`) drives the same services on demand.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`db`] - Unified store and legacy import
//! - [`remote`] - Remote gift code API client
//! - [`notify`] / [`slack`] - New-code notifications
//! - [`redeem`] - Redemption collaborator seam
//! - [`services`] - Sync engine, dispatcher, lifecycle API, scheduler
//! - [`bootstrap`] - Wiring the above from a [`config::DaemonConfig`]
//! - [`routes`] - Health and status endpoints
//! - [`telemetry`] - Tracing and Sentry setup

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod notify;
pub mod redeem;
pub mod remote;
pub mod routes;
pub mod services;
pub mod slack;
pub mod state;
pub mod telemetry;

pub use bootstrap::Services;
pub use error::DaemonError;
