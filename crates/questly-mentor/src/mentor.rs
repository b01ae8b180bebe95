//! The mentor: prompts, routing and fallbacks around a [`MentorBackend`].

use questly_progression::{
    recent_context, ChatMessage, ChatRole, ModelPreference, SuggestedQuest,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::backend::{
    choose_model, ContentTurn, GenerationRequest, GenerationResponse, InlineMedia, MentorBackend,
    MentorModel,
};
use crate::error::MentorResult;
use crate::fallback::{
    with_timeout, DEFAULT_TIMEOUT, EMPTY_MEDIA_REVIEW, EMPTY_NUDGE, FALLBACK_MEDIA_REVIEW,
    FALLBACK_MESSAGE, FALLBACK_NUDGE, FALLBACK_QUESTION, FALLBACK_SUGGESTIONS,
};

/// Reasoning budget granted to the thinking model.
pub const THINKING_BUDGET: u32 = 16_000;

/// Most clarifying questions asked about a new goal.
pub const MAX_CLARIFYING_QUESTIONS: usize = 1;

/// Most sub-step ideas returned for a goal.
pub const MAX_SUGGESTIONS: usize = 5;

/// One review question of a mastery challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeQuestion {
    /// Question text.
    pub question: String,
    /// Answer options.
    pub options: Vec<String>,
    /// The correct option.
    pub correct_answer: String,
    /// Why it is correct.
    pub explanation: String,
}

/// Review questions plus the quest to tackle next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryChallenge {
    /// Review questions, possibly none.
    #[serde(default)]
    pub questions: Vec<PracticeQuestion>,
    /// Suggested follow-up quest.
    #[serde(default = "daily_focus")]
    pub next_quest: SuggestedQuest,
}

fn daily_focus() -> SuggestedQuest {
    SuggestedQuest {
        title: "Daily Focus".to_string(),
        description: "Stay consistent with your routine.".to_string(),
        category: "Study".to_string(),
    }
}

impl Default for MasteryChallenge {
    fn default() -> Self {
        Self {
            questions: Vec::new(),
            next_quest: daily_focus(),
        }
    }
}

/// Everything a chat turn needs.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    /// What the player typed.
    pub input: &'a str,
    /// Conversation so far; only the tail is sent.
    pub history: &'a [ChatMessage],
    /// Model preference from settings.
    pub preference: ModelPreference,
    /// Personality descriptor from settings.
    pub personality: &'a str,
    /// Titles of the current quests, focus quest first.
    pub task_titles: &'a [String],
    /// Thinking mode toggle.
    pub thinking: bool,
}

/// The mentor's answer to a chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct MentorReply {
    /// Answer text.
    pub text: String,
    /// Model that was asked.
    pub model: MentorModel,
    /// Search grounding sources.
    pub grounding_chunks: Option<Vec<serde_json::Value>>,
    /// Reasoning trace.
    pub thinking: Option<String>,
}

impl MentorReply {
    fn fallback(model: MentorModel) -> Self {
        Self {
            text: FALLBACK_MESSAGE.to_string(),
            model,
            grounding_chunks: None,
            thinking: None,
        }
    }

    /// Transcript entry for this reply.
    #[must_use]
    pub fn into_message(self) -> ChatMessage {
        let mut message = ChatMessage::model(self.text);
        message.model_used = Some(self.model.name().to_string());
        message.is_thinking = self.thinking.as_ref().map(|_| true);
        message.thinking_process = self.thinking;
        message.grounding_chunks = self.grounding_chunks;
        message
    }
}

/// System instruction for the chat persona.
#[must_use]
pub fn system_instruction(personality: &str, focus: Option<&str>) -> String {
    let focus = focus.unwrap_or("a new quest");
    format!(
        "You are Dr. Rudhh, a mentor.\n\
         Your personality is: {personality}.\n\
         Max 120 words. No repetition. Bullet points for lists.\n\
         NEVER say \"I hit a snag\" or \"Analyzing\".\n\
         If an error occurs, suggest focusing on: {focus}.\n\
         No emojis."
    )
}

fn parse_json<T: DeserializeOwned>(response: &GenerationResponse, empty: &str) -> MentorResult<T> {
    let text = response.non_empty_text().unwrap_or(empty);
    Ok(serde_json::from_str(text)?)
}

fn fallback_suggestions() -> Vec<SuggestedQuest> {
    FALLBACK_SUGGESTIONS
        .iter()
        .map(|(title, description)| SuggestedQuest {
            title: (*title).to_string(),
            description: (*description).to_string(),
            category: "Study".to_string(),
        })
        .collect()
}

/// Mentor assistant over a model backend.
pub struct Mentor<B> {
    backend: B,
    timeout: Duration,
}

impl<B: MentorBackend> Mentor<B> {
    /// Mentor with the default call timeout.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the call timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Answer one chat turn.
    pub async fn chat(&self, request: ChatRequest<'_>) -> MentorReply {
        let choice = choose_model(request.input, request.thinking);
        debug!(
            model = %choice.model,
            preference = ?request.preference,
            search = choice.search_grounding,
            "Routing mentor chat"
        );

        let mut contents: Vec<ContentTurn> = recent_context(request.history)
            .iter()
            .map(ContentTurn::from)
            .collect();
        contents.push(ContentTurn {
            role: ChatRole::User,
            text: request.input.to_string(),
        });

        let generation = GenerationRequest {
            model: choice.model,
            system_instruction: Some(system_instruction(
                request.personality,
                request.task_titles.first().map(String::as_str),
            )),
            contents,
            json_response: false,
            search_grounding: choice.search_grounding,
            thinking_budget: (request.thinking && choice.model == MentorModel::Pro)
                .then_some(THINKING_BUDGET),
            media: None,
        };

        with_timeout(
            self.try_chat(generation),
            MentorReply::fallback(choice.model),
            self.timeout,
        )
        .await
    }

    async fn try_chat(&self, generation: GenerationRequest) -> MentorResult<MentorReply> {
        let model = generation.model;
        let response = self.backend.generate(generation).await?;
        let text = response
            .non_empty_text()
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string();
        Ok(MentorReply {
            text,
            model,
            grounding_chunks: response.grounding_chunks,
            thinking: response.thinking,
        })
    }

    async fn generate_json<T: DeserializeOwned>(
        &self,
        request: GenerationRequest,
        empty: &str,
    ) -> MentorResult<T> {
        let response = self.backend.generate(request).await?;
        parse_json(&response, empty)
    }

    /// Review questions for a finished quest plus a follow-up quest.
    pub async fn mastery_challenge(&self, task_title: &str) -> MasteryChallenge {
        let request = GenerationRequest::prompt(
            MentorModel::Flash,
            format!(
                "Generate 3 quick review questions for \"{task_title}\". \
                 Bullet points. No emojis. No analysis."
            ),
        )
        .json();
        with_timeout(
            self.generate_json(request, "{}"),
            MasteryChallenge::default(),
            self.timeout,
        )
        .await
    }

    /// One short clarifying question about a new goal.
    pub async fn clarifying_questions(&self, goal: &str) -> Vec<String> {
        let request = GenerationRequest::prompt(
            MentorModel::FlashLite,
            format!(
                "Ask exactly ONE short clarifying question for the goal: \"{goal}\". No emojis."
            ),
        )
        .json();
        let mut questions = with_timeout(
            self.generate_json::<Vec<String>>(request, "[]"),
            vec![FALLBACK_QUESTION.to_string()],
            self.timeout,
        )
        .await;
        questions.truncate(MAX_CLARIFYING_QUESTIONS);
        questions
    }

    /// Up to five actionable sub-steps for a goal.
    pub async fn task_suggestions(
        &self,
        goal: &str,
        answers: &BTreeMap<String, String>,
    ) -> Vec<SuggestedQuest> {
        let context = serde_json::to_string(answers).unwrap_or_else(|_| "{}".to_string());
        let request = GenerationRequest::prompt(
            MentorModel::FlashLite,
            format!(
                "Goal: \"{goal}\". Context: {context}. Generate EXACTLY 5 short actionable \
                 sub-tasks. No analysis. JSON array only."
            ),
        )
        .json();
        let mut suggestions = with_timeout(
            self.generate_json::<Vec<SuggestedQuest>>(request, "[]"),
            fallback_suggestions(),
            self.timeout,
        )
        .await;
        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }

    /// One-sentence encouragement for the board's progress.
    pub async fn progress_nudge(&self, completed: usize, total: usize) -> String {
        let request = GenerationRequest::prompt(
            MentorModel::FlashLite,
            format!("Progress: {completed}/{total}. One short sentence nudge. No emojis."),
        );
        let call = async {
            self.backend
                .generate(request)
                .await
                .map(|response| response.non_empty_text().unwrap_or(EMPTY_NUDGE).to_string())
        };
        with_timeout(call, FALLBACK_NUDGE.to_string(), self.timeout).await
    }

    /// Short comment on an uploaded image, clip or recording.
    pub async fn analyze_media(&self, media: InlineMedia, prompt: &str) -> String {
        let request = GenerationRequest::prompt(
            MentorModel::Flash,
            format!("{prompt} (Brief reply only. No emojis.)"),
        )
        .with_media(media);
        let call = async {
            self.backend.generate(request).await.map(|response| {
                response
                    .non_empty_text()
                    .unwrap_or(EMPTY_MEDIA_REVIEW)
                    .to_string()
            })
        };
        with_timeout(call, FALLBACK_MEDIA_REVIEW.to_string(), self.timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MentorError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Backend answering every request the same way.
    #[derive(Default)]
    struct ScriptedBackend {
        answer: Option<String>,
        fail: bool,
        delay: Option<Duration>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedBackend {
        fn answering(text: &str) -> Self {
            Self {
                answer: Some(text.to_string()),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn slow() -> Self {
            Self {
                answer: Some("too late".to_string()),
                delay: Some(Duration::from_secs(5)),
                ..Self::default()
            }
        }

        fn last_request(&self) -> GenerationRequest {
            self.seen
                .lock()
                .expect("lock")
                .last()
                .cloned()
                .expect("a request was made")
        }
    }

    #[async_trait]
    impl MentorBackend for ScriptedBackend {
        async fn generate(&self, request: GenerationRequest) -> MentorResult<GenerationResponse> {
            self.seen.lock().expect("lock").push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(MentorError::Backend("quota exceeded".to_string()));
            }
            Ok(GenerationResponse {
                text: self.answer.clone(),
                ..GenerationResponse::default()
            })
        }
    }

    fn chat_request<'a>(
        input: &'a str,
        history: &'a [ChatMessage],
        titles: &'a [String],
    ) -> ChatRequest<'a> {
        ChatRequest {
            input,
            history,
            preference: ModelPreference::Fast,
            personality: "Calm coach",
            task_titles: titles,
            thinking: false,
        }
    }

    #[tokio::test]
    async fn test_chat_sends_recent_context() {
        let mentor = Mentor::new(ScriptedBackend::answering("Start with chapter one."));
        let history: Vec<ChatMessage> = ["a", "b", "c", "d"]
            .into_iter()
            .map(ChatMessage::user)
            .collect();
        let titles = vec!["Read chapter 1".to_string()];

        let reply = mentor.chat(chat_request("help me", &history, &titles)).await;
        assert_eq!(reply.text, "Start with chapter one.");
        assert_eq!(reply.model, MentorModel::FlashLite);

        let sent = mentor.backend().last_request();
        // three context messages plus the new input
        assert_eq!(sent.contents.len(), 4);
        assert_eq!(sent.contents[0].text, "b");
        assert_eq!(sent.contents[3].text, "help me");
        let instruction = sent.system_instruction.expect("system instruction");
        assert!(instruction.contains("Calm coach"));
        assert!(instruction.contains("Read chapter 1"));
        assert_eq!(sent.thinking_budget, None);
    }

    #[tokio::test]
    async fn test_chat_thinking_mode() {
        let mentor = Mentor::new(ScriptedBackend::answering("Deep answer"));
        let mut request = chat_request("explain recursion", &[], &[]);
        request.thinking = true;

        let reply = mentor.chat(request).await;
        assert_eq!(reply.model, MentorModel::Pro);
        let sent = mentor.backend().last_request();
        assert_eq!(sent.thinking_budget, Some(THINKING_BUDGET));
        assert!(sent
            .system_instruction
            .expect("system instruction")
            .contains("a new quest"));

        let message = reply.into_message();
        assert_eq!(message.model_used.as_deref(), Some("gemini-3-pro-preview"));
        assert_eq!(message.role, ChatRole::Model);
    }

    #[tokio::test]
    async fn test_chat_falls_back_on_error_and_empty() {
        let failing = Mentor::new(ScriptedBackend::failing());
        let reply = failing.chat(chat_request("latest news", &[], &[])).await;
        assert_eq!(reply.text, FALLBACK_MESSAGE);
        assert_eq!(reply.model, MentorModel::Flash);

        let empty = Mentor::new(ScriptedBackend::answering("  "));
        let reply = empty.chat(chat_request("hi", &[], &[])).await;
        assert_eq!(reply.text, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_mastery_challenge_parses_answer() {
        let json = r#"{
            "questions": [{
                "question": "What is 2+2?",
                "options": ["3", "4"],
                "correctAnswer": "4",
                "explanation": "Arithmetic."
            }],
            "nextQuest": {"title": "Fractions", "description": "Practice halves.", "category": "Study"}
        }"#;
        let mentor = Mentor::new(ScriptedBackend::answering(json));
        let challenge = mentor.mastery_challenge("Addition").await;
        assert_eq!(challenge.questions.len(), 1);
        assert_eq!(challenge.questions[0].correct_answer, "4");
        assert_eq!(challenge.next_quest.title, "Fractions");
        assert!(mentor.backend().last_request().json_response);
    }

    #[tokio::test]
    async fn test_mastery_challenge_fallbacks() {
        let mentor = Mentor::new(ScriptedBackend::answering("not json"));
        let challenge = mentor.mastery_challenge("Addition").await;
        assert!(challenge.questions.is_empty());
        assert_eq!(challenge.next_quest.title, "Daily Focus");

        // an empty answer parses as an empty object
        let mentor = Mentor::new(ScriptedBackend::answering(""));
        assert_eq!(
            mentor.mastery_challenge("Addition").await,
            MasteryChallenge::default()
        );
    }

    #[tokio::test]
    async fn test_clarifying_questions_capped() {
        let mentor = Mentor::new(ScriptedBackend::answering(r#"["Why?", "When?"]"#));
        assert_eq!(
            mentor.clarifying_questions("Run 5k").await,
            vec!["Why?".to_string()]
        );

        let mentor = Mentor::new(ScriptedBackend::failing());
        assert_eq!(
            mentor.clarifying_questions("Run 5k").await,
            vec![FALLBACK_QUESTION.to_string()]
        );
    }

    #[tokio::test]
    async fn test_task_suggestions() {
        let many: Vec<SuggestedQuest> = (0..7)
            .map(|i| SuggestedQuest {
                title: format!("Step {i}"),
                description: String::new(),
                category: "Work".to_string(),
            })
            .collect();
        let json = serde_json::to_string(&many).expect("serialize");
        let mentor = Mentor::new(ScriptedBackend::answering(&json));

        let mut answers = BTreeMap::new();
        answers.insert("Why?".to_string(), "Health".to_string());
        let suggestions = mentor.task_suggestions("Run 5k", &answers).await;
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        let prompt = &mentor.backend().last_request().contents[0].text;
        assert!(prompt.contains(r#"{"Why?":"Health"}"#));
    }

    #[tokio::test]
    async fn test_slow_backend_uses_fallbacks() {
        let mentor =
            Mentor::new(ScriptedBackend::slow()).with_call_timeout(Duration::from_millis(20));

        let suggestions = mentor.task_suggestions("Run 5k", &BTreeMap::new()).await;
        assert_eq!(suggestions.len(), 5);
        assert_eq!(suggestions[0].title, "Define first step");
        assert!(suggestions.iter().all(|s| s.category == "Study"));

        assert_eq!(mentor.progress_nudge(1, 4).await, FALLBACK_NUDGE);
    }

    #[tokio::test]
    async fn test_progress_nudge() {
        let mentor = Mentor::new(ScriptedBackend::answering("Two down, keep going."));
        assert_eq!(mentor.progress_nudge(2, 5).await, "Two down, keep going.");
        assert_eq!(
            mentor.backend().last_request().contents[0].text,
            "Progress: 2/5. One short sentence nudge. No emojis."
        );

        let mentor = Mentor::new(ScriptedBackend::answering(""));
        assert_eq!(mentor.progress_nudge(2, 5).await, EMPTY_NUDGE);
    }

    fn photo() -> InlineMedia {
        InlineMedia {
            data: "aGVsbG8=".to_string(),
            mime_type: "image/png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_analyze_media() {
        let mentor = Mentor::new(ScriptedBackend::answering("Neat notes."));
        assert_eq!(
            mentor.analyze_media(photo(), "Check my notes").await,
            "Neat notes."
        );
        let sent = mentor.backend().last_request();
        assert_eq!(sent.model, MentorModel::Flash);
        assert_eq!(sent.media, Some(photo()));
        assert_eq!(
            sent.contents[0].text,
            "Check my notes (Brief reply only. No emojis.)"
        );

        let empty = Mentor::new(ScriptedBackend::answering(" "));
        assert_eq!(empty.analyze_media(photo(), "x").await, EMPTY_MEDIA_REVIEW);

        let failing = Mentor::new(ScriptedBackend::failing());
        assert_eq!(
            failing.analyze_media(photo(), "x").await,
            FALLBACK_MEDIA_REVIEW
        );
    }
}
