//! giftsync core - Shared gift code types.
//!
//! This crate provides the types used across all giftsync components:
//! - `daemon` - Reconciliation service that keeps local and remote code sets in sync
//! - `cli` - Command-line tools for on-demand code operations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Gift codes, issue dates, remote line validation, IDs and outcomes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
