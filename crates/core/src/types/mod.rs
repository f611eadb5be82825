//! Core types for giftsync.
//!
//! This module provides type-safe wrappers for the gift code domain.

pub mod code;
pub mod date;
pub mod id;
pub mod line;
pub mod status;

pub use code::{CodeError, GiftCode};
pub use date::{DateError, IssuedDate};
pub use id::*;
pub use line::{InvalidReason, ParsedLine, leading_token, parse_line};
pub use status::*;
