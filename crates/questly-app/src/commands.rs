//! CLI command definitions and their handlers.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use clap::{Subcommand, ValueEnum};
use questly_common::{SubTaskId, TaskId};
use questly_mentor::{
    ChatRequest, GenerationRequest, GenerationResponse, Mentor, MentorBackend, MentorError,
    MentorResult,
};
use questly_progression::{
    format_duration, greeting, level_progress_percent, weekday_label, xp_to_next_tier,
    ChatMessage, Difficulty, ModelPreference, Moment, QuestSession, TaskBoard, TaskCategory,
    ThemeColor, TransitionEvent, UserProfile, PERSONALITY_PRESETS,
};
use questly_store::{DocumentStore, QuestlyDocument};
use std::mem;
use tracing::info;

use crate::config::AppConfig;

/// Characters of an id shown in listings.
const SHORT_ID_LEN: usize = 8;

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show profile, rank and the quest board
    Status,

    /// Set the player name and open the mentor conversation
    Onboard {
        /// Display name
        name: String,
    },

    /// Add a quest to the top of the board
    Add {
        /// Quest title
        title: String,
        /// Category (study, health, coding, creative, other)
        #[arg(long, short = 'c', default_value = "study")]
        category: String,
        /// Difficulty, fixes the XP reward
        #[arg(long, short = 'd', value_enum, default_value_t = DifficultyArg::Easy)]
        difficulty: DifficultyArg,
        /// Days until the quest is due
        #[arg(long, default_value_t = 0)]
        due_in: i64,
    },

    /// Answer the mentor's open clarification question about a quest
    Answer {
        /// Quest id or unique id prefix
        id: String,
        /// Your answer
        text: String,
    },

    /// Complete or reopen a quest
    Toggle {
        /// Quest id or unique id prefix
        id: String,
    },

    /// Take the mastery challenge of a completed quest
    Mastery {
        /// Quest id or unique id prefix
        id: String,
    },

    /// Tick or untick a sub-step
    Subtask {
        /// Quest id or unique id prefix
        task: String,
        /// Sub-step id or unique id prefix
        sub: String,
    },

    /// Ask the mentor to break a quest into sub-steps
    Suggest {
        /// Quest id or unique id prefix
        id: String,
    },

    /// Remove a quest (earned XP stays)
    Delete {
        /// Quest id or unique id prefix
        id: String,
    },

    /// Talk to the mentor
    Chat {
        /// Message
        text: String,
        /// Use the deep reasoning model
        #[arg(long)]
        think: bool,
    },

    /// Turn ranked progression on or off
    Ranked {
        /// New state
        #[arg(value_enum)]
        state: Switch,
    },

    /// Show or change settings
    Settings {
        /// Accent color
        #[arg(long, value_enum)]
        color: Option<ColorArg>,
        /// Mentor personality: a preset name or your own description
        #[arg(long)]
        personality: Option<String>,
        /// Mentor model preference
        #[arg(long, value_enum)]
        model: Option<ModelArg>,
        /// High contrast background
        #[arg(long, value_enum)]
        high_contrast: Option<Switch>,
        /// Notifications
        #[arg(long, value_enum)]
        notifications: Option<Switch>,
    },

    /// Show completions per weekday
    History,

    /// Ask the mentor for a progress nudge
    Nudge,

    /// Delete all saved progress
    Reset,
}

/// Difficulty as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DifficultyArg {
    /// 50 XP
    Easy,
    /// 150 XP
    Hard,
    /// 300 XP
    Extreme,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Self::Easy,
            DifficultyArg::Hard => Self::Hard,
            DifficultyArg::Extreme => Self::ExtremelyHard,
        }
    }
}

/// Accent color as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorArg {
    /// Classic
    Violet,
    /// Green
    Emerald,
    /// Blue
    Blue,
    /// Rose
    Rose,
    /// Honey
    Amber,
}

impl From<ColorArg> for ThemeColor {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Violet => Self::Violet,
            ColorArg::Emerald => Self::Emerald,
            ColorArg::Blue => Self::Blue,
            ColorArg::Rose => Self::Rose,
            ColorArg::Amber => Self::Amber,
        }
    }
}

/// Model preference as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelArg {
    /// Low latency
    Fast,
    /// Stronger, slower
    Genius,
}

impl From<ModelArg> for ModelPreference {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Fast => Self::Fast,
            ModelArg::Genius => Self::Genius,
        }
    }
}

/// On/off switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    /// Enable
    On,
    /// Disable
    Off,
}

impl Switch {
    fn is_on(self) -> bool {
        self == Self::On
    }
}

/// Backend used when no model provider is configured. Every call fails, so
/// the mentor answers with its canned fallbacks.
struct OfflineBackend;

#[async_trait]
impl MentorBackend for OfflineBackend {
    async fn generate(&self, request: GenerationRequest) -> MentorResult<GenerationResponse> {
        Err(MentorError::Backend(format!(
            "no provider configured for {}",
            request.model
        )))
    }
}

/// Run one command against the configured store.
pub fn run(command: Commands, config: &AppConfig) -> Result<()> {
    run_with(command, config, OfflineBackend)
}

/// Run one command, asking `backend` whenever the mentor is needed.
fn run_with<B: MentorBackend>(command: Commands, config: &AppConfig, backend: B) -> Result<()> {
    let store = DocumentStore::open(&config.data_dir, config.storage_key.as_str())
        .context("Failed to open the Questly store")?;
    let mentor = Mentor::new(backend).with_call_timeout(config.mentor_timeout());

    match command {
        Commands::Status => print_status(&store.load()?),
        Commands::History => print_history(&store.load()?),
        Commands::Onboard { name } => {
            let mut doc = store.load()?;
            with_session(&mut doc, |session| {
                session.complete_onboarding(&name);
                Ok(())
            })?;
            if doc.chat_history.is_empty() {
                doc.chat_history.push(greeting(display_name(&doc.user)));
            }
            store.save(&doc)?;
            println!("Welcome, {}!", display_name(&doc.user));
        },
        Commands::Add {
            title,
            category,
            difficulty,
            due_in,
        } => {
            let mut doc = store.load()?;
            let now = Utc::now();
            let id = with_session(&mut doc, |session| {
                Ok(session.create_quest(
                    &title,
                    TaskCategory::parse_or_default(&category),
                    difficulty.into(),
                    now + Duration::days(due_in.max(0)),
                    now,
                )?)
            })?;

            let questions = block_on(mentor.clarifying_questions(title.trim()))?;
            for question in &questions {
                println!("  Mentor asks: {question}");
            }
            with_session(&mut doc, |session| {
                Ok(session.set_clarification_questions(&id, questions)?)
            })?;
            store.save(&doc)?;
            println!("Added quest {}", short(id.as_str()));
        },
        Commands::Answer { id, text } => {
            let mut doc = store.load()?;
            let id = resolve_task(&doc.tasks, &id)?;
            let question =
                with_session(&mut doc, |session| Ok(session.answer_clarification(&id, &text)?))?;
            println!("Answered \"{question}\"");

            match next_open_question(&doc.tasks, &id) {
                Some(next) => println!("  Mentor asks: {next}"),
                None => suggest_sub_tasks(&mentor, &mut doc, &id)?,
            }
            store.save(&doc)?;
        },
        Commands::Toggle { id } => {
            let mut doc = store.load()?;
            let id = resolve_task(&doc.tasks, &id)?;
            let events = with_session(&mut doc, |session| {
                Ok(session.toggle_task(&id, Moment::now())?)
            })?;
            store.save(&doc)?;
            print_events(&events);
        },
        Commands::Mastery { id } => {
            let mut doc = store.load()?;
            let id = resolve_task(&doc.tasks, &id)?;
            let task = doc
                .tasks
                .get(&id)
                .with_context(|| format!("Quest not found: {id}"))?;
            if !task.is_completed {
                bail!("Complete \"{}\" before taking its mastery challenge", task.title);
            }

            let challenge = block_on(mentor.mastery_challenge(&task.title))?;
            if challenge.questions.is_empty() {
                println!("No mastery challenge available right now.");
                return Ok(());
            }
            for (n, question) in challenge.questions.iter().enumerate() {
                println!("{}. {}", n + 1, question.question);
                for option in &question.options {
                    println!("     - {option}");
                }
                println!(
                    "   Answer: {} ({})",
                    question.correct_answer, question.explanation
                );
            }

            let (next_id, events) = with_session(&mut doc, |session| {
                Ok(session.finish_mastery(&challenge.next_quest, Moment::now()))
            })?;
            store.save(&doc)?;
            print_events(&events);
            println!(
                "Added quest {}  Next step: {}",
                short(next_id.as_str()),
                challenge.next_quest.title
            );
        },
        Commands::Subtask { task, sub } => {
            let mut doc = store.load()?;
            let task_id = resolve_task(&doc.tasks, &task)?;
            let sub_id = resolve_sub_task(&doc.tasks, &task_id, &sub)?;
            let events = with_session(&mut doc, |session| {
                Ok(session.toggle_sub_task(&task_id, &sub_id, Moment::now())?)
            })?;
            store.save(&doc)?;
            print_events(&events);
        },
        Commands::Suggest { id } => {
            let mut doc = store.load()?;
            let id = resolve_task(&doc.tasks, &id)?;
            suggest_sub_tasks(&mentor, &mut doc, &id)?;
            store.save(&doc)?;
        },
        Commands::Delete { id } => {
            let mut doc = store.load()?;
            let id = resolve_task(&doc.tasks, &id)?;
            let removed = with_session(&mut doc, |session| Ok(session.delete_task(&id)?))?;
            store.save(&doc)?;
            println!("Deleted \"{}\"", removed.title);
        },
        Commands::Chat { text, think } => {
            let input = text.trim();
            if input.is_empty() {
                bail!("Nothing to send");
            }
            let mut doc = store.load()?;
            if doc.chat_history.is_empty() {
                doc.chat_history.push(greeting(display_name(&doc.user)));
            }

            let titles = doc.tasks.titles();
            let settings = &doc.user.settings;
            let reply = block_on(mentor.chat(ChatRequest {
                input,
                history: &doc.chat_history,
                preference: settings.model_preference,
                personality: &settings.rudhh_personality,
                task_titles: &titles,
                thinking: think,
            }))?;

            println!("{}", reply.text);
            doc.chat_history.push(ChatMessage::user(input));
            doc.chat_history.push(reply.into_message());
            store.save(&doc)?;
        },
        Commands::Ranked { state } => {
            let mut doc = store.load()?;
            with_session(&mut doc, |session| {
                let mut settings = session.profile().settings.clone();
                settings.is_ranked_mode = state.is_on();
                session.update_settings(settings);
                Ok(())
            })?;
            store.save(&doc)?;
            println!("Ranked mode {}", if state.is_on() { "on" } else { "off" });
        },
        Commands::Settings {
            color,
            personality,
            model,
            high_contrast,
            notifications,
        } => {
            let mut doc = store.load()?;
            let mut settings = doc.user.settings.clone();
            if let Some(color) = color {
                settings.color = color.into();
            }
            if let Some(personality) = personality.as_deref() {
                settings.rudhh_personality = resolve_personality(personality);
            }
            if let Some(model) = model {
                settings.model_preference = model.into();
            }
            if let Some(state) = high_contrast {
                settings.is_high_contrast = state.is_on();
            }
            if let Some(state) = notifications {
                settings.notifications_enabled = state.is_on();
            }

            if settings != doc.user.settings {
                with_session(&mut doc, |session| {
                    session.update_settings(settings);
                    Ok(())
                })?;
                store.save(&doc)?;
                info!("Settings updated");
            }
            print_settings(&doc.user);
        },
        Commands::Nudge => {
            let stats = store.load()?.tasks.stats();
            println!(
                "{}",
                block_on(mentor.progress_nudge(stats.completed, stats.total))?
            );
        },
        Commands::Reset => {
            store.logout()?;
            info!("Progress cleared");
            println!("Progress cleared.");
        },
    }

    Ok(())
}

/// Ask the mentor for sub-steps using the quest's clarification answers.
fn suggest_sub_tasks<B: MentorBackend>(
    mentor: &Mentor<B>,
    doc: &mut QuestlyDocument,
    id: &TaskId,
) -> Result<()> {
    let task = doc
        .tasks
        .get(id)
        .with_context(|| format!("Quest not found: {id}"))?;
    let suggestions = block_on(mentor.task_suggestions(&task.title, &task.clarification_answers))?;
    for suggestion in &suggestions {
        println!("  - {}: {}", suggestion.title, suggestion.description);
    }
    with_session(doc, |session| {
        Ok(session.set_sub_tasks(id, suggestions.into_iter().map(|s| s.title))?)
    })
}

fn next_open_question<'a>(board: &'a TaskBoard, id: &TaskId) -> Option<&'a str> {
    let task = board.get(id)?;
    task.clarification_questions
        .iter()
        .find(|q| !task.clarification_answers.contains_key(q.as_str()))
        .map(String::as_str)
}

/// A preset label picks its descriptor; anything else is used as written.
fn resolve_personality(input: &str) -> String {
    let input = input.trim();
    PERSONALITY_PRESETS
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(input))
        .map_or_else(|| input.to_string(), |(_, descriptor)| (*descriptor).to_string())
}

fn display_name(user: &UserProfile) -> &str {
    if user.name.is_empty() {
        "Adventurer"
    } else {
        user.name.as_str()
    }
}

/// Run a session operation over the document's profile, board and history.
fn with_session<T>(
    doc: &mut QuestlyDocument,
    apply: impl FnOnce(&mut QuestSession) -> Result<T>,
) -> Result<T> {
    let mut session = QuestSession::new(
        mem::take(&mut doc.user),
        mem::take(&mut doc.tasks),
        mem::take(&mut doc.history),
    );
    let result = apply(&mut session);
    (doc.user, doc.tasks, doc.history) = session.into_parts();
    result
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Find the quest whose id starts with `prefix`.
fn resolve_task(board: &TaskBoard, prefix: &str) -> Result<TaskId> {
    let matches: Vec<&TaskId> = board
        .iter()
        .map(|t| &t.id)
        .filter(|id| id.as_str().starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("No quest matches '{prefix}'"),
        _ => bail!("'{prefix}' matches {} quests, use more characters", matches.len()),
    }
}

/// Find the sub-step of `task` whose id starts with `prefix`.
fn resolve_sub_task(board: &TaskBoard, task: &TaskId, prefix: &str) -> Result<SubTaskId> {
    let sub_tasks = board
        .get(task)
        .and_then(|t| t.sub_tasks.as_deref())
        .unwrap_or_default();
    let matches: Vec<&SubTaskId> = sub_tasks
        .iter()
        .map(|s| &s.id)
        .filter(|id| id.as_str().starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("No sub-step matches '{prefix}'"),
        _ => bail!("'{prefix}' matches {} sub-steps, use more characters", matches.len()),
    }
}

fn short(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

fn print_events(events: &[TransitionEvent]) {
    for event in events {
        println!("  {event}");
    }
}

fn print_status(doc: &QuestlyDocument) {
    let user = &doc.user;
    let name = display_name(user);
    println!(
        "{name}  Lv {} ({:.0}%)  {} XP  streak {}",
        user.level,
        level_progress_percent(user.xp),
        user.xp,
        user.streak
    );
    if user.settings.is_ranked_mode {
        println!(
            "Rank {} ({} RP to next tier), best {}",
            user.rank_label(),
            xp_to_next_tier(user.rank_xp),
            user.highest_rank
        );
    } else {
        println!("Ranked mode off");
    }
    if !user.badges.is_empty() {
        let badges: Vec<String> = user
            .badges
            .iter()
            .map(|b| format!("{} {}", b.icon, b.name))
            .collect();
        println!("Badges: {}", badges.join(", "));
    }

    println!();
    println!("Quests ({}% done)", doc.tasks.completion_percent());
    for task in doc.tasks.iter() {
        let mark = if task.is_completed { 'x' } else { ' ' };
        println!(
            "  [{mark}] {}  {} ({}, {} XP)",
            short(task.id.as_str()),
            task.title,
            task.difficulty.label(),
            task.xp_value
        );
        for sub_task in task.sub_tasks.iter().flatten() {
            let mark = if sub_task.is_completed { 'x' } else { ' ' };
            println!(
                "        [{mark}] {}  {}",
                short(sub_task.id.as_str()),
                sub_task.title
            );
        }
    }
    if let Some(focus) = doc.tasks.focus_quest() {
        println!("Focus: {}", focus.title);
    }
    if let Some(average) = doc.tasks.average_completion_time() {
        println!("Average time to complete: {}", format_duration(average));
    }
}

fn print_settings(user: &UserProfile) {
    let settings = &user.settings;
    let on_off = |on: bool| if on { "on" } else { "off" };
    println!(
        "Theme: {} ({}), background {}",
        settings.color.label(),
        settings.color.hex(),
        settings.background()
    );
    println!("Mentor personality: {}", settings.rudhh_personality);
    println!("Model preference: {:?}", settings.model_preference);
    println!(
        "Ranked mode {}, notifications {}, high contrast {}",
        on_off(settings.is_ranked_mode),
        on_off(settings.notifications_enabled),
        on_off(settings.is_high_contrast)
    );
    let presets: Vec<&str> = PERSONALITY_PRESETS.iter().map(|(label, _)| *label).collect();
    println!("Personality presets: {}", presets.join(", "));
}

fn print_history(doc: &QuestlyDocument) {
    for day in doc.history.days() {
        let bar = "#".repeat(usize::try_from(day.count).unwrap_or(usize::MAX).min(40));
        println!("{:>3} {:>3} {bar}", day.date, day.count);
    }
    let today = weekday_label(Moment::now().weekday);
    println!("Today: {today}, streak {}", doc.user.streak);
}
