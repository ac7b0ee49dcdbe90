use serde::{Deserialize, Serialize};

/// Format tag of a Matrix `formatted_body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageFormat {
    #[serde(rename = "org.matrix.custom.html")]
    Html,
    /// Any format this bridge does not render. Content falls back to `body`.
    #[serde(other)]
    Unknown,
}

/// The text part of a Matrix message event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageContent {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<MessageFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_body: Option<String>,
}

impl MessageContent {
    pub fn plain(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            format: None,
            formatted_body: None,
        }
    }

    pub fn html(body: impl Into<String>, formatted_body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            format: Some(MessageFormat::Html),
            formatted_body: Some(formatted_body.into()),
        }
    }

    /// The HTML body, if this content carries a non-empty one.
    pub fn html_body(&self) -> Option<&str> {
        match (self.format, self.formatted_body.as_deref()) {
            (Some(MessageFormat::Html), Some(html)) if !html.is_empty() => Some(html),
            _ => None,
        }
    }
}
