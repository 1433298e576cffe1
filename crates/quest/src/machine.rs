//! Task State Machine.
//!
//! Tracks the status of every registered task and turns host events into
//! status transitions. Status only ever moves forward: a transition is legal
//! when the target status ranks strictly higher than the current one.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use quest_packet_core::{
    ContentItem, Error, Result, TaskDefinition, TaskKey, TaskSnapshot, TaskStatus,
};

use crate::matcher::LocatorMatcher;

// =============================================================================
// Events and Transitions
// =============================================================================

/// Event delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestEvent {
    /// The player navigated to `locator`.
    Visit { locator: String },
}

impl QuestEvent {
    pub fn visit(locator: impl Into<String>) -> Self {
        Self::Visit {
            locator: locator.into(),
        }
    }
}

/// A committed status change and the notification it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub key: TaskKey,
    pub from: TaskStatus,
    pub to: TaskStatus,
    /// Message for the player.
    pub notification: String,
}

// =============================================================================
// State Machine
// =============================================================================

#[derive(Debug, Clone)]
struct TrackedTask {
    definition: TaskDefinition,
    status: TaskStatus,
}

#[derive(Debug, Default)]
pub struct TaskStateMachine {
    tasks: Vec<TrackedTask>,
    index: HashMap<TaskKey, usize>,
    items: Vec<ContentItem>,
}

impl TaskStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load task and item definitions, every task starting `PENDING`.
    ///
    /// All definitions are validated before anything is stored; on error the
    /// machine keeps its previous contents. Loading again replaces the
    /// previous definitions and resets every status.
    pub fn initialize(&mut self, tasks: Vec<TaskDefinition>, items: Vec<ContentItem>) -> Result<()> {
        let mut item_ids = HashSet::new();
        for item in &items {
            item.validate()?;
            if !item_ids.insert(item.item_id.as_str()) {
                return Err(Error::DuplicateItem(item.item_id.clone()));
            }
        }

        let mut index = HashMap::with_capacity(tasks.len());
        for (position, task) in tasks.iter().enumerate() {
            task.validate()?;
            if index.insert(task.key(), position).is_some() {
                return Err(Error::DuplicateTask(task.key().to_string()));
            }
        }

        self.tasks = tasks
            .into_iter()
            .map(|definition| TrackedTask {
                definition,
                status: TaskStatus::Pending,
            })
            .collect();
        self.index = index;
        self.items = items;

        tracing::info!(
            tasks = self.tasks.len(),
            items = self.items.len(),
            "Task state machine initialized"
        );
        Ok(())
    }

    /// Items in registration order.
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Task definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.tasks.iter().map(|task| &task.definition)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn status(&self, key: &TaskKey) -> Option<TaskStatus> {
        self.index.get(key).map(|&position| self.tasks[position].status)
    }

    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        self.tasks
            .iter()
            .map(|task| TaskSnapshot {
                quest_id: task.definition.quest_id.clone(),
                task_id: task.definition.task_id.clone(),
                description: task.definition.description.clone(),
                status: task.status,
            })
            .collect()
    }

    /// Apply an event, returning the transitions it fired in registration
    /// order. Events that match nothing, or only tasks already completed,
    /// return an empty list.
    pub fn on_event(&mut self, event: &QuestEvent) -> Vec<Transition> {
        match event {
            QuestEvent::Visit { locator } => {
                let matched: Vec<TaskKey> = self
                    .tasks
                    .iter()
                    .filter(|task| task.status.can_advance_to(TaskStatus::Completed))
                    .filter(|task| task.definition.trigger.matches(locator))
                    .map(|task| task.definition.key())
                    .collect();

                let transitions: Vec<Transition> = matched
                    .iter()
                    .filter_map(|key| self.commit(key, TaskStatus::Completed))
                    .collect();

                if transitions.is_empty() {
                    tracing::debug!(locator = %locator, "Visit matched no pending task");
                }
                transitions
            }
        }
    }

    /// Move `key` to `to`.
    ///
    /// Returns `Ok(None)` when the task is already in `to`. Moving backwards
    /// is an [`Error::InvalidTransition`].
    pub fn advance(&mut self, key: &TaskKey, to: TaskStatus) -> Result<Option<Transition>> {
        let from = self
            .status(key)
            .ok_or_else(|| Error::UnknownTask(key.to_string()))?;
        if from == to {
            return Ok(None);
        }
        if !from.can_advance_to(to) {
            return Err(Error::InvalidTransition {
                task: key.to_string(),
                from,
                to,
            });
        }
        Ok(self.commit(key, to))
    }

    fn commit(&mut self, key: &TaskKey, to: TaskStatus) -> Option<Transition> {
        let task = &mut self.tasks[*self.index.get(key)?];
        let from = task.status;
        task.status = to;

        let notification = match to {
            TaskStatus::Completed => task.definition.completion_message.clone(),
            other => format!("{}: {}", task.definition.description, other),
        };
        tracing::info!(
            quest_id = %key.quest_id,
            task_id = %key.task_id,
            from = %from,
            to = %to,
            "Task transitioned"
        );
        Some(Transition {
            key: key.clone(),
            from,
            to,
            notification,
        })
    }
}
