//! The new-code alert layout.

use chrono::{DateTime, Utc};

use super::types::{Block, TextObject};

/// Blocks announcing a newly discovered code.
///
/// `found_at` renders as a relative time in the reader's client
/// ("5 minutes ago"), falling back to RFC 3339.
#[must_use]
pub fn build_new_code_message(
    title: &str,
    code: &str,
    date: &str,
    source: &str,
    found_at: DateTime<Utc>,
    auto_group_count: usize,
) -> Vec<Block> {
    let footer = format!(
        "{source} \u{2022} <!date^{}^{{ago}}|{}>",
        found_at.timestamp(),
        found_at.to_rfc3339()
    );

    vec![
        Block::Header {
            text: TextObject::plain(format!("\u{1f381} {title}")),
        },
        Block::Section {
            text: TextObject::markdown(format!("*Code:* `{code}`")),
            fields: vec![
                TextObject::markdown(format!("*Issued:*\n`{date}`")),
                TextObject::markdown(format!("*Auto-claim groups:*\n`{auto_group_count}`")),
            ],
        },
        Block::Divider,
        Block::Context {
            elements: vec![TextObject::markdown(footer)],
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::Value;

    use super::*;

    #[test]
    fn test_new_code_message_layout() {
        let found_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let blocks = build_new_code_message(
            "New Gift Code Found!",
            "ABC123",
            "2024-06-01",
            "Remote API",
            found_at,
            3,
        );
        let json: Value = serde_json::to_value(&blocks).unwrap();

        assert_eq!(json[0]["type"], "header");
        assert_eq!(json[0]["text"]["type"], "plain_text");
        assert!(json[0]["text"]["text"].as_str().unwrap().ends_with("New Gift Code Found!"));
        assert_eq!(json[1]["text"]["text"], "*Code:* `ABC123`");
        assert_eq!(json[1]["fields"][0]["text"], "*Issued:*\n`2024-06-01`");
        assert_eq!(json[1]["fields"][1]["text"], "*Auto-claim groups:*\n`3`");
        assert!(json[1]["text"].get("emoji").is_none());
        assert_eq!(json[2]["type"], "divider");

        let footer = json[3]["elements"][0]["text"].as_str().unwrap();
        assert!(footer.starts_with("Remote API"));
        assert!(footer.contains(&format!("<!date^{}^{{ago}}|", found_at.timestamp())));
    }
}
