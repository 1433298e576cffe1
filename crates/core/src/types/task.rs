use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

// =============================================================================
// Task Types
// =============================================================================

/// Identifying pair of a task inside the host's quest registry.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskKey {
    pub quest_id: String,
    pub task_id: String,
}

impl TaskKey {
    pub fn new(quest_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            quest_id: quest_id.into(),
            task_id: task_id.into(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.quest_id, self.task_id)
    }
}

/// Task status as mirrored to the host.
///
/// Statuses are ordered by [`rank`](TaskStatus::rank); a task may only move to
/// a status of strictly higher rank, so adding an intermediate status only
/// needs a rank between the existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum TaskStatus {
    /// Registered, objective not reached yet.
    Pending,
    /// Objective reached. Terminal.
    Completed,
}

impl TaskStatus {
    /// Position of the status in the one-way lifecycle.
    pub fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Completed => 10,
        }
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic.
    pub fn can_advance_to(self, next: TaskStatus) -> bool {
        next.rank() > self.rank()
    }

    /// Whether no further transition can leave this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule deciding which visit locators complete a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum VisitTrigger {
    /// The locator contains `fragment` anywhere.
    Contains { fragment: String },
    /// The locator equals `locator` exactly.
    Exact { locator: String },
    /// The locator's host is `host` or one of its subdomains.
    Domain { host: String },
}

impl VisitTrigger {
    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains {
            fragment: fragment.into(),
        }
    }

    pub fn exact(locator: impl Into<String>) -> Self {
        Self::Exact {
            locator: locator.into(),
        }
    }

    pub fn domain(host: impl Into<String>) -> Self {
        Self::Domain { host: host.into() }
    }

    fn pattern(&self) -> &str {
        match self {
            Self::Contains { fragment } => fragment,
            Self::Exact { locator } => locator,
            Self::Domain { host } => host,
        }
    }
}

/// Static definition of a quest task, as registered at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub quest_id: String,
    pub task_id: String,
    pub description: String,

    /// Which visits complete the task.
    pub trigger: VisitTrigger,

    /// Notification sent to the player when the task completes.
    pub completion_message: String,
}

impl TaskDefinition {
    pub fn new(
        quest_id: impl Into<String>,
        task_id: impl Into<String>,
        description: impl Into<String>,
        trigger: VisitTrigger,
    ) -> Self {
        let quest_id = quest_id.into();
        let task_id = task_id.into();
        let completion_message = format!("Task Complete: {}/{}", quest_id, task_id);
        Self {
            quest_id,
            task_id,
            description: description.into(),
            trigger,
            completion_message,
        }
    }

    pub fn with_completion_message(mut self, message: impl Into<String>) -> Self {
        self.completion_message = message.into();
        self
    }

    pub fn key(&self) -> TaskKey {
        TaskKey::new(&self.quest_id, &self.task_id)
    }

    /// Reject definitions that cannot be addressed in the host registry.
    pub fn validate(&self) -> Result<()> {
        if self.quest_id.trim().is_empty() {
            return Err(Error::invalid_task("quest_id must not be empty"));
        }
        if self.task_id.trim().is_empty() {
            return Err(Error::invalid_task(format!(
                "task in quest '{}' has an empty task_id",
                self.quest_id
            )));
        }
        if self.trigger.pattern().is_empty() {
            // An empty fragment would match every visit.
            return Err(Error::invalid_task(format!(
                "task '{}' has an empty trigger",
                self.key()
            )));
        }
        Ok(())
    }
}

/// Point-in-time view of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub quest_id: String,
    pub task_id: String,
    pub description: String,
    pub status: TaskStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_monotonic() {
        assert!(TaskStatus::Pending.can_advance_to(TaskStatus::Completed));
        assert!(!TaskStatus::Completed.can_advance_to(TaskStatus::Pending));
        assert!(!TaskStatus::Completed.can_advance_to(TaskStatus::Completed));
        assert!(TaskStatus::Completed.is_terminal());
    }

    #[test]
    fn test_definition_validation() {
        let ok = TaskDefinition::new("quest-1", "task-1", "Visit", VisitTrigger::contains("google.com"));
        assert!(ok.validate().is_ok());
        assert_eq!(ok.key().to_string(), "quest-1/task-1");

        let no_quest = TaskDefinition::new("", "task-1", "Visit", VisitTrigger::contains("x"));
        assert!(matches!(no_quest.validate(), Err(Error::InvalidTask(_))));

        let empty_trigger = TaskDefinition::new("q", "t", "Visit", VisitTrigger::contains(""));
        assert!(empty_trigger.validate().is_err());
    }

    #[test]
    fn test_trigger_serde_tag() {
        let trigger = from_json("{\"match\":\"domain\",\"host\":\"google.com\"}");
        assert_eq!(trigger, VisitTrigger::domain("google.com"));
    }

    fn from_json(raw: &str) -> VisitTrigger {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Json))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("trigger should deserialize")
    }
}
