//! Remote gift code API integration.
//!
//! This module provides:
//! - [`RemoteClient`] for listing, upserting, deleting and checking codes
//! - Wire types for the JSON bodies the endpoint exchanges
//! - [`RemoteError`], split into transport and protocol failures
//!
//! # Protocol
//!
//! One endpoint, authenticated with an `X-API-Key` header:
//!
//! | Method | Body | Response |
//! |---|---|---|
//! | `GET` | - | `{"codes": ["<code> <DD.MM.YYYY>", ...]}` or `{"error": "..."}` |
//! | `GET ?action=check&giftcode=<code>` | - | `{"exists": bool}` |
//! | `POST` | `{"code", "date"}` | `{"success": bool}` |
//! | `DELETE` | `{"code"}` | `{"success": bool}` |
//!
//! Every call is stateless. Only `DELETE` is destructive, and callers must
//! only issue it for codes already classified invalid.

mod client;
mod error;
mod types;

pub use client::RemoteClient;
pub use error::RemoteError;
pub use types::{CodeListing, WriteAck};
