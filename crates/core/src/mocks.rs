//! Mock implementations of the host traits for testing.
//!
//! [`RecordingHost`] implements both [`ContentHost`] and [`QuestHost`],
//! records every call in order and can be told to fail selected calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::{
    traits::{ContentHost, QuestHost},
    types::TaskStatus,
    Error, Result,
};

/// A single host call as observed by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    RegisterItem {
        item_id: String,
        locator: String,
        label: String,
        kind: String,
    },
    RegisterTask {
        quest_id: String,
        task_id: String,
        description: String,
    },
    UpdateTask {
        quest_id: String,
        task_id: String,
        status: TaskStatus,
    },
    NotifyPlayer(String),
}

// =============================================================================
// Recording Host
// =============================================================================

/// In-memory host double that records calls.
///
/// Failed calls are still recorded, so tests can assert that the agent
/// attempted them.
#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    fail_notifications: AtomicBool,
    fail_updates: AtomicBool,
    fail_registrations: AtomicBool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `notify_player` call return an error.
    pub fn failing_notifications(self) -> Self {
        self.fail_notifications.store(true, Ordering::SeqCst);
        self
    }

    /// Make every `update_task` call return an error.
    pub fn failing_updates(self) -> Self {
        self.fail_updates.store(true, Ordering::SeqCst);
        self
    }

    /// Make every registration call return an error.
    pub fn failing_registrations(self) -> Self {
        self.fail_registrations.store(true, Ordering::SeqCst);
        self
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Messages passed to `notify_player`, in order.
    pub fn notifications(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::NotifyPlayer(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// `(quest_id, task_id, status)` of every `update_task` call.
    pub fn updates(&self) -> Vec<(String, String, TaskStatus)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::UpdateTask {
                    quest_id,
                    task_id,
                    status,
                } => Some((quest_id, task_id, status)),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: HostCall, fail: &AtomicBool) -> Result<()> {
        let name = match &call {
            HostCall::RegisterItem { .. } => "register_item",
            HostCall::RegisterTask { .. } => "register_task",
            HostCall::UpdateTask { .. } => "update_task",
            HostCall::NotifyPlayer(_) => "notify_player",
        };
        self.calls.lock().unwrap().push(call);
        if fail.load(Ordering::SeqCst) {
            return Err(Error::host(format!("{} unavailable", name)));
        }
        Ok(())
    }
}

impl ContentHost for RecordingHost {
    fn register_item(&self, item_id: &str, locator: &str, label: &str, kind: &str) -> Result<()> {
        self.record(
            HostCall::RegisterItem {
                item_id: item_id.to_string(),
                locator: locator.to_string(),
                label: label.to_string(),
                kind: kind.to_string(),
            },
            &self.fail_registrations,
        )
    }
}

impl QuestHost for RecordingHost {
    fn register_task(&self, quest_id: &str, task_id: &str, description: &str) -> Result<()> {
        self.record(
            HostCall::RegisterTask {
                quest_id: quest_id.to_string(),
                task_id: task_id.to_string(),
                description: description.to_string(),
            },
            &self.fail_registrations,
        )
    }

    fn update_task(&self, quest_id: &str, task_id: &str, status: TaskStatus) -> Result<()> {
        self.record(
            HostCall::UpdateTask {
                quest_id: quest_id.to_string(),
                task_id: task_id.to_string(),
                status,
            },
            &self.fail_updates,
        )
    }

    fn notify_player(&self, message: &str) -> Result<()> {
        self.record(
            HostCall::NotifyPlayer(message.to_string()),
            &self.fail_notifications,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentItem;

    #[test]
    fn test_records_in_order() {
        let host = RecordingHost::new();
        host.register(&ContentItem::webpage("a", "https://a.test", "A"))
            .unwrap();
        host.notify_player("hello").unwrap();

        let calls = host.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], HostCall::RegisterItem { item_id, kind, .. } if item_id == "a" && kind == "webpage"));
        assert_eq!(host.notifications(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_failing_notifications_still_recorded() {
        let host = RecordingHost::new().failing_notifications();
        assert!(host.notify_player("lost").is_err());
        assert_eq!(host.notifications().len(), 1);
        assert!(host.update_task("q", "t", TaskStatus::Completed).is_ok());
    }
}
