//! Slack delivery for new-code alerts.
//!
//! [`SlackClient`] wraps `chat.postMessage`; [`build_new_code_message`] lays
//! out the alert with the Block Kit types in [`types`].

mod client;
mod error;
mod messages;
pub mod types;

pub use client::SlackClient;
pub use error::SlackError;
pub use messages::build_new_code_message;
pub use types::{Block, TextObject};
