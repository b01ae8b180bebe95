//! Chat transcript types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of trailing messages sent along as conversation context.
pub const CONTEXT_WINDOW: usize = 3;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The player.
    User,
    /// The mentor.
    Model,
}

/// Kind of media attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video clip.
    Video,
    /// Audio clip.
    Audio,
}

/// Media attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    /// Media kind.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Where the media can be displayed from.
    pub url: String,
    /// MIME type.
    pub mime_type: String,
    /// Inline base64 payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// One message of the mentor conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message id.
    pub id: String,
    /// Author.
    pub role: ChatRole,
    /// Message text.
    pub text: String,
    /// Whether the reply came from a thinking model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_thinking: Option<bool>,
    /// Reasoning trace, when the model exposed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_process: Option<String>,
    /// Name of the model that answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    /// Search grounding sources, kept as the provider returned them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_chunks: Option<Vec<serde_json::Value>>,
    /// Attached media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaAttachment>,
}

impl ChatMessage {
    fn with_role(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            role,
            text: text.into(),
            is_thinking: None,
            thinking_process: None,
            model_used: None,
            grounding_chunks: None,
            media: None,
        }
    }

    /// Message typed by the player.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(ChatRole::User, text)
    }

    /// Message written by the mentor.
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self::with_role(ChatRole::Model, text)
    }

    /// Attach media.
    #[must_use]
    pub fn with_media(mut self, media: MediaAttachment) -> Self {
        self.media = Some(media);
        self
    }
}

/// Opening message of a fresh conversation.
#[must_use]
pub fn greeting(name: &str) -> ChatMessage {
    let mut message = ChatMessage::model(format!(
        "Hi {name}! I'm Dr. Rudhh. How can I help you progress right now?"
    ));
    message.id = "1".to_string();
    message
}

/// The trailing messages sent as context with a new question.
#[must_use]
pub fn recent_context(history: &[ChatMessage]) -> &[ChatMessage] {
    let start = history.len().saturating_sub(CONTEXT_WINDOW);
    &history[start..]
}
