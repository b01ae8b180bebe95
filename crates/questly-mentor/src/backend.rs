//! Model backend abstraction and model routing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use questly_progression::{ChatMessage, ChatRole};
use std::fmt;

use crate::error::MentorResult;

/// Words that make a question need fresh web results.
const SEARCH_TRIGGERS: [&str; 5] = ["latest", "news", "current", "who is", "weather"];

/// Models the mentor routes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MentorModel {
    /// Cheapest model, used by default.
    FlashLite,
    /// Model with search grounding.
    Flash,
    /// Deep reasoning model.
    Pro,
}

impl MentorModel {
    /// Provider model name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FlashLite => "gemini-flash-lite-latest",
            Self::Flash => "gemini-3-flash-preview",
            Self::Pro => "gemini-3-pro-preview",
        }
    }
}

impl fmt::Display for MentorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Routing decision for one chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelChoice {
    /// Model to call.
    pub model: MentorModel,
    /// Whether web search grounding is enabled.
    pub search_grounding: bool,
}

/// Whether a question asks about something time-sensitive.
#[must_use]
pub fn needs_search(input: &str) -> bool {
    let lower = input.to_lowercase();
    SEARCH_TRIGGERS.iter().any(|word| lower.contains(word))
}

/// Pick the model for a chat turn.
///
/// Search questions always go to the grounded model, even in thinking mode.
#[must_use]
pub fn choose_model(input: &str, thinking: bool) -> ModelChoice {
    if needs_search(input) {
        return ModelChoice {
            model: MentorModel::Flash,
            search_grounding: true,
        };
    }
    let model = if thinking {
        MentorModel::Pro
    } else {
        MentorModel::FlashLite
    };
    ModelChoice {
        model,
        search_grounding: false,
    }
}

/// One turn of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTurn {
    /// Author.
    pub role: ChatRole,
    /// Text.
    pub text: String,
}

impl From<&ChatMessage> for ContentTurn {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            text: message.text.clone(),
        }
    }
}

/// Inline media sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMedia {
    /// Base64 payload.
    pub data: String,
    /// MIME type.
    pub mime_type: String,
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Model to call.
    pub model: MentorModel,
    /// System instruction, if any.
    pub system_instruction: Option<String>,
    /// Conversation, oldest first.
    pub contents: Vec<ContentTurn>,
    /// Ask for a JSON answer.
    pub json_response: bool,
    /// Enable web search grounding.
    pub search_grounding: bool,
    /// Reasoning token budget for thinking models.
    pub thinking_budget: Option<u32>,
    /// Media the prompt refers to.
    pub media: Option<InlineMedia>,
}

impl GenerationRequest {
    /// Single-prompt request.
    #[must_use]
    pub fn prompt(model: MentorModel, text: impl Into<String>) -> Self {
        Self {
            model,
            system_instruction: None,
            contents: vec![ContentTurn {
                role: ChatRole::User,
                text: text.into(),
            }],
            json_response: false,
            search_grounding: false,
            thinking_budget: None,
            media: None,
        }
    }

    /// Attach inline media.
    #[must_use]
    pub fn with_media(mut self, media: InlineMedia) -> Self {
        self.media = Some(media);
        self
    }

    /// Request a JSON answer.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// What the backend answered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResponse {
    /// Answer text.
    pub text: Option<String>,
    /// Reasoning trace.
    pub thinking: Option<String>,
    /// Search grounding sources.
    pub grounding_chunks: Option<Vec<serde_json::Value>>,
}

impl GenerationResponse {
    /// Response carrying only text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Non-empty answer text.
    #[must_use]
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// A generative model provider.
#[async_trait]
pub trait MentorBackend: Send + Sync {
    /// Run one generation.
    async fn generate(&self, request: GenerationRequest) -> MentorResult<GenerationResponse>;
}
