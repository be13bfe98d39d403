//! Typed subset of Slack's Block Kit used by deployment messages.
//!
//! Every enum is internally tagged on `"type"`, so serializing a value yields
//! exactly the JSON object Slack expects (e.g. `{"type": "divider"}`).

use serde::{Deserialize, Serialize};

/// The top-level object posted to the incoming webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Hex color of the attachment bar, e.g. `#00c100`.
    pub color: String,
    /// Summary text shown in notifications and by clients without blocks.
    pub text: String,
    pub blocks: Vec<Block>,
}

/// The wire body: an [`Attachment`], optionally with a top-level `channel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(flatten)]
    pub attachment: Attachment,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// A layout block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: TextObject,
    },
    Section {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accessory: Option<Accessory>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
    },
    Divider,
}

impl Block {
    pub fn header(text: impl Into<String>) -> Self {
        Block::Header {
            text: TextObject::plain(text),
        }
    }

    pub fn section(text: TextObject) -> Self {
        Block::Section {
            text: Some(text),
            accessory: None,
            fields: Vec::new(),
        }
    }

    pub fn divider() -> Self {
        Block::Divider
    }

    /// The Block Kit `type` tag of this block.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Header { .. } => "header",
            Block::Section { .. } => "section",
            Block::Divider => "divider",
        }
    }
}

/// A text composition object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    PlainText { text: String, emoji: bool },
    #[serde(rename = "mrkdwn")]
    Markdown { text: String },
}

impl TextObject {
    /// Plain text with emoji shortcodes enabled.
    pub fn plain(text: impl Into<String>) -> Self {
        TextObject::PlainText {
            text: text.into(),
            emoji: true,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        TextObject::Markdown { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            TextObject::PlainText { text, .. } | TextObject::Markdown { text } => text,
        }
    }
}

/// An element rendered to the right of a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Accessory {
    Image {
        image_url: String,
        alt_text: String,
    },
    Button {
        text: TextObject,
        url: String,
        action_id: String,
    },
}
