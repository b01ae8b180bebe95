//! Quest session: the single owner of the current profile, board and history.
//!
//! Every XP-changing action funnels through [`apply_xp_delta`]; the session
//! swaps in the returned profile and history and hands the events back to
//! whoever is presenting them.

use chrono::{DateTime, Utc};
use questly_common::{QuestlyError, QuestlyResult, SubTaskId, TaskId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::badge::BadgeCatalog;
use crate::events::TransitionEvent;
use crate::history::{Moment, WeeklyHistory};
use crate::profile::UserProfile;
use crate::settings::Settings;
use crate::task::{Difficulty, SubTask, Task, TaskBoard, TaskCategory};
use crate::transaction::{apply_xp_delta, XpChange};

/// XP for ticking a sub-step (taken back when unticked).
pub const SUB_TASK_XP: i64 = 5;

/// XP for finishing a mastery challenge.
pub const MASTERY_REWARD_XP: i64 = 100;

/// XP value of the follow-up quest a mastery challenge suggests.
pub const FOLLOW_UP_QUEST_XP: u64 = 150;

/// Quest suggested by the mentor (follow-ups and sub-step ideas).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestedQuest {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Category name as returned by the mentor.
    pub category: String,
}

/// Profile, board and history, updated together.
#[derive(Debug, Clone, Default)]
pub struct QuestSession {
    profile: UserProfile,
    tasks: TaskBoard,
    history: WeeklyHistory,
    catalog: BadgeCatalog,
}

impl QuestSession {
    /// Session over existing state with the standard badge catalog.
    #[must_use]
    pub fn new(profile: UserProfile, tasks: TaskBoard, history: WeeklyHistory) -> Self {
        Self {
            profile,
            tasks,
            history,
            catalog: BadgeCatalog::standard(),
        }
    }

    /// Current profile.
    #[must_use]
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Current board.
    #[must_use]
    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    /// Current history.
    #[must_use]
    pub fn history(&self) -> &WeeklyHistory {
        &self.history
    }

    /// Split back into its parts, e.g. for saving.
    #[must_use]
    pub fn into_parts(self) -> (UserProfile, TaskBoard, WeeklyHistory) {
        (self.profile, self.tasks, self.history)
    }

    fn apply(&mut self, change: XpChange, moment: Moment) -> Vec<TransitionEvent> {
        let outcome = apply_xp_delta(
            &self.profile,
            &self.history,
            &self.tasks.stats(),
            &self.catalog,
            change,
            moment,
        );
        self.profile = outcome.profile;
        self.history = outcome.history;
        outcome.events
    }

    /// Add a quest to the top of the board.
    pub fn create_quest(
        &mut self,
        title: &str,
        category: TaskCategory,
        difficulty: Difficulty,
        due_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> QuestlyResult<TaskId> {
        let title = title.trim();
        if title.is_empty() {
            return Err(QuestlyError::EmptyTitle);
        }

        let task = Task::new(title, category, difficulty, due_date, now).ai_generated();
        let id = task.id.clone();
        info!(quest = %id, title, ?difficulty, "Quest created");
        self.tasks.add_front(task);
        Ok(id)
    }

    /// Complete or reopen a quest.
    pub fn toggle_task(
        &mut self,
        id: &TaskId,
        moment: Moment,
    ) -> QuestlyResult<Vec<TransitionEvent>> {
        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| QuestlyError::TaskNotFound(id.clone()))?;

        let xp = i64::try_from(task.xp_value).unwrap_or(i64::MAX);
        let delta = if task.is_completed {
            task.is_completed = false;
            task.completed_at = None;
            -xp
        } else {
            task.is_completed = true;
            task.completed_at = Some(moment.at);
            xp
        };
        debug!(quest = %id, completed = task.is_completed, "Quest toggled");

        Ok(self.apply(XpChange::major(delta), moment))
    }

    /// Tick or untick a sub-step.
    pub fn toggle_sub_task(
        &mut self,
        task_id: &TaskId,
        sub_task_id: &SubTaskId,
        moment: Moment,
    ) -> QuestlyResult<Vec<TransitionEvent>> {
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| QuestlyError::TaskNotFound(task_id.clone()))?;
        let sub_task = task
            .sub_task_mut(sub_task_id)
            .ok_or_else(|| QuestlyError::SubTaskNotFound {
                task: task_id.clone(),
                sub_task: sub_task_id.clone(),
            })?;

        sub_task.is_completed = !sub_task.is_completed;
        let delta = if sub_task.is_completed {
            SUB_TASK_XP
        } else {
            -SUB_TASK_XP
        };

        Ok(self.apply(XpChange::minor(delta), moment))
    }

    /// Replace a quest's sub-steps with fresh ones built from titles.
    pub fn set_sub_tasks<I, S>(&mut self, task_id: &TaskId, titles: I) -> QuestlyResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| QuestlyError::TaskNotFound(task_id.clone()))?;
        task.sub_tasks = Some(titles.into_iter().map(SubTask::new).collect());
        Ok(())
    }

    /// Record clarification questions the mentor asked about a quest.
    pub fn set_clarification_questions(
        &mut self,
        task_id: &TaskId,
        questions: Vec<String>,
    ) -> QuestlyResult<()> {
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| QuestlyError::TaskNotFound(task_id.clone()))?;
        task.clarification_questions = questions;
        Ok(())
    }

    /// Answer the first clarification question still open on a quest.
    ///
    /// Returns the question that was answered.
    pub fn answer_clarification(
        &mut self,
        task_id: &TaskId,
        answer: &str,
    ) -> QuestlyResult<String> {
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| QuestlyError::TaskNotFound(task_id.clone()))?;
        let question = task
            .clarification_questions
            .iter()
            .find(|q| !task.clarification_answers.contains_key(q.as_str()))
            .cloned()
            .ok_or_else(|| QuestlyError::NoOpenQuestion(task_id.clone()))?;

        debug!(quest = %task_id, %question, "Clarification answered");
        task.clarification_answers
            .insert(question.clone(), answer.trim().to_string());
        Ok(question)
    }

    /// Grant the mastery reward and put the suggested follow-up quest on top.
    pub fn finish_mastery(
        &mut self,
        next: &SuggestedQuest,
        moment: Moment,
    ) -> (TaskId, Vec<TransitionEvent>) {
        let events = self.apply(XpChange::minor(MASTERY_REWARD_XP), moment);

        let follow_up = Task::new(
            format!("Next step: {}", next.title),
            TaskCategory::parse_or_default(&next.category),
            Difficulty::Hard,
            moment.at,
            moment.at,
        )
        .with_description(next.description.clone())
        .with_xp_value(FOLLOW_UP_QUEST_XP)
        .ai_generated();
        let id = follow_up.id.clone();
        self.tasks.add_front(follow_up);

        (id, events)
    }

    /// Remove a quest. XP already earned stays.
    pub fn delete_task(&mut self, id: &TaskId) -> QuestlyResult<Task> {
        self.tasks
            .remove(id)
            .ok_or_else(|| QuestlyError::TaskNotFound(id.clone()))
    }

    /// Replace the player's settings.
    pub fn update_settings(&mut self, settings: Settings) {
        self.profile.settings = settings;
    }

    /// Finish onboarding under the given name.
    pub fn complete_onboarding(&mut self, name: &str) {
        self.profile.name = name.trim().to_string();
        self.profile.onboarding_complete = true;
    }

    /// Mark the tutorial as seen.
    pub fn complete_tutorial(&mut self) {
        self.profile.tutorial_complete = true;
    }
}
