use serde::{Deserialize, Serialize};

/// An incoming-webhook chat message.
///
/// Field names follow the webhook wire format. Empty fields are omitted when
/// serialized so that the rendered payload only carries what was configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Display name of the sender.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_emoji: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_url: String,

    /// Target channel override.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel: String,

    /// Parent message timestamp when replying in a thread.
    #[serde(rename = "thread_ts", default, skip_serializing_if = "String::is_empty")]
    pub thread_timestamp: String,

    /// Body text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    /// Parse mode (`full` or `none`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parse: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Create a message with the given body text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Whether the message carries anything worth delivering.
    pub fn has_content(&self) -> bool {
        !self.text.is_empty() || !self.attachments.is_empty()
    }
}

/// A structured block appended to a [`Message`].
///
/// Common keys are typed; anything else (actions, blocks, vendor extensions)
/// is kept verbatim in [`Attachment::extra`] so it survives the
/// serialize / render / parse round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fallback: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub callback_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author_link: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author_icon: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title_link: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pretext: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thumb_url: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AttachmentField>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mrkdwn_in: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub footer: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub footer_icon: String,

    /// Epoch timestamp shown in the footer. Usually a number produced by a
    /// numeric placeholder, but kept as raw JSON so strings also pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<serde_json::Value>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A title/value pair rendered in a grid inside an [`Attachment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentField {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub short: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_are_omitted() {
        let json = serde_json::to_string(&Message::new("hello")).unwrap();
        assert_eq!(json, r#"{"text":"hello"}"#);
    }

    #[test]
    fn thread_timestamp_uses_wire_name() {
        let msg = Message {
            thread_timestamp: "1700000000.000100".into(),
            ..Message::default()
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["thread_ts"], "1700000000.000100");
    }

    #[test]
    fn has_content_requires_text_or_attachments() {
        assert!(!Message::default().has_content());
        assert!(Message::new("hi").has_content());

        let msg = Message {
            attachments: vec![Attachment::default()],
            ..Message::default()
        };
        assert!(msg.has_content());
    }

    #[test]
    fn unknown_attachment_keys_survive_round_trip() {
        let doc = serde_json::json!({
            "color": "#36a64f",
            "title": "Build",
            "ts": 1_700_000_000,
            "fields": [{"title": "Branch", "value": "main", "short": true}],
            "actions": [{"type": "button", "text": "Open"}]
        });
        let attachment: Attachment = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(attachment.fields[0].value, "main");
        assert!(attachment.extra.contains_key("actions"));
        assert_eq!(serde_json::to_value(&attachment).unwrap(), doc);
    }

    #[test]
    fn attachments_parse_from_message_document() {
        let doc = r#"{"text": "ignored", "attachments": [{"title": "a"}, {"title": "b"}]}"#;
        let msg: Message = serde_json::from_str(doc).unwrap();
        let titles: Vec<_> = msg.attachments.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["a", "b"]);
    }
}
