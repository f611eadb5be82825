//! The slice of Block Kit the new-code alert needs.
//!
//! See: <https://api.slack.com/block-kit>

use serde::{Deserialize, Serialize};

/// Kind of a text object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    PlainText,
    Mrkdwn,
}

/// A Block Kit text object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub kind: TextKind,
    pub text: String,
    /// Only meaningful for plain text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

impl TextObject {
    /// Plain text with emoji shortcodes rendered.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::PlainText,
            text: text.into(),
            emoji: Some(true),
        }
    }

    /// Slack-flavoured markdown.
    #[must_use]
    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::Mrkdwn,
            text: text.into(),
            emoji: None,
        }
    }
}

/// Layout blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Large bold title; plain text only.
    Header { text: TextObject },
    Section {
        text: TextObject,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
    },
    /// Small grey footer line.
    Context { elements: Vec<TextObject> },
    Divider,
}

/// `chat.postMessage` request body.
#[derive(Debug, Serialize)]
pub(crate) struct PostMessage<'a> {
    pub channel: &'a str,
    /// Shown in push notifications and by clients that cannot render blocks.
    pub text: &'a str,
    pub blocks: &'a [Block],
    pub unfurl_links: bool,
}

/// The envelope every Web API method answers with.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackReply {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Timestamp (message ID) of a posted message.
    #[serde(default)]
    pub ts: Option<String>,
}
