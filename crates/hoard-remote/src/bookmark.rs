use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Progress of the backend's asynchronous tag generation.
///
/// `Success` and `Failure` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaggingStatus {
    #[default]
    Pending,
    Success,
    Failure,
}

impl TaggingStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaggingStatus::Pending)
    }
}

impl fmt::Display for TaggingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaggingStatus::Pending => "pending",
            TaggingStatus::Success => "success",
            TaggingStatus::Failure => "failure",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// Snapshot of a remote bookmark. Each poll yields a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,

    #[serde(default, deserialize_with = "status_or_pending")]
    pub tagging_status: TaggingStatus,

    #[serde(default)]
    pub tags: Vec<Tag>,
}

fn status_or_pending<'de, D>(deserializer: D) -> Result<TaggingStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TaggingStatus>::deserialize(deserializer)?.unwrap_or_default())
}

impl Bookmark {
    /// Tags rendered as `#name` words separated by single spaces, with spaces
    /// and hyphens stripped from each name.
    pub fn hashtags(&self) -> String {
        self.tags
            .iter()
            .map(|tag| format!("#{}", tag.name.replace([' ', '-'], "")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Request body for bookmark creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NewBookmark {
    Link { url: String },
    Text { text: String },
}

impl NewBookmark {
    /// A link bookmark when `message` is an absolute http(s) URL with a host,
    /// a text bookmark otherwise. Blank messages yield `None`.
    pub fn from_message(message: &str) -> Option<Self> {
        if message.trim().is_empty() {
            return None;
        }

        if is_web_url(message) {
            Some(NewBookmark::Link {
                url: message.to_owned(),
            })
        } else {
            Some(NewBookmark::Text {
                text: message.to_owned(),
            })
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NewBookmark::Link { .. } => "link",
            NewBookmark::Text { .. } => "text",
        }
    }
}

pub(crate) fn is_web_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}
