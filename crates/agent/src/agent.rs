//! The agent facade.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use quest_packet_core::config::PacketConfig;
use quest_packet_core::{ContentHost, QuestHost, Result, TaskSnapshot};
use quest_packet_quest::{QuestEvent, TaskStateMachine, Transition};
use quest_packet_sandbox::ExecutionSandbox;

use crate::builder::QuestAgentBuilder;

/// Entry point the host drives.
///
/// The host calls [`initialize`](Self::initialize) once, then delivers visits
/// through [`on_visit`](Self::on_visit) and code payloads through
/// [`run`](Self::run). None of these return errors: host call failures are
/// logged and evaluation faults come back as text.
pub struct QuestAgent {
    pub(crate) start_message: String,
    pub(crate) content_host: Arc<dyn ContentHost>,
    pub(crate) quest_host: Arc<dyn QuestHost>,
    /// Exclusive-mutation lock for concurrent event delivery.
    pub(crate) machine: Mutex<TaskStateMachine>,
    pub(crate) sandbox: ExecutionSandbox,
    /// Set by the first `initialize` call.
    pub(crate) initialize_started: AtomicBool,
    /// Set once registration and the start announcement are done.
    pub(crate) initialized: AtomicBool,
}

impl QuestAgent {
    pub fn builder() -> QuestAgentBuilder {
        QuestAgentBuilder::new()
    }

    /// Build an agent from `config` with the script engine.
    pub fn from_config(
        config: PacketConfig,
        content_host: Arc<dyn ContentHost>,
        quest_host: Arc<dyn QuestHost>,
    ) -> Result<Self> {
        Self::builder()
            .with_config(config)
            .with_content_host(content_host)
            .with_quest_host(quest_host)
            .build()
    }

    /// Register every item, then every task, then announce the quest.
    ///
    /// Only the first call does anything. Returns whether this call performed
    /// the registration. Visits are accepted only after it returns, so the
    /// host never sees `update_task` for a task it has not registered.
    pub fn initialize(&self) -> bool {
        if self.initialize_started.swap(true, Ordering::SeqCst) {
            tracing::warn!("Agent already initialized; ignoring repeated initialize");
            return false;
        }

        // Copy the definitions so no lock is held across host calls.
        let (items, tasks) = {
            let machine = self.machine();
            let items = machine.items().to_vec();
            let tasks: Vec<_> = machine.definitions().cloned().collect();
            (items, tasks)
        };

        for item in &items {
            match self.content_host.register(item) {
                Ok(()) => tracing::info!(item_id = %item.item_id, locator = %item.locator, "Item registered"),
                Err(e) => tracing::warn!(item_id = %item.item_id, error = %e, "Item registration failed"),
            }
        }

        for task in &tasks {
            match self
                .quest_host
                .register_task(&task.quest_id, &task.task_id, &task.description)
            {
                Ok(()) => tracing::info!(quest_id = %task.quest_id, task_id = %task.task_id, "Task registered"),
                Err(e) => tracing::warn!(
                    quest_id = %task.quest_id,
                    task_id = %task.task_id,
                    error = %e,
                    "Task registration failed"
                ),
            }
        }

        self.notify(&self.start_message);
        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(items = items.len(), tasks = tasks.len(), "Agent initialized");
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Handle a visit to `locator`.
    ///
    /// Each transition is mirrored to the host with `update_task` and
    /// announced with `notify_player`. The local status change stands even if
    /// those calls fail.
    pub fn on_visit(&self, locator: &str) -> Vec<Transition> {
        if !self.is_initialized() {
            tracing::warn!(locator = %locator, "Visit before initialize ignored");
            return Vec::new();
        }

        let transitions = self.machine().on_event(&QuestEvent::visit(locator));

        for transition in &transitions {
            let key = &transition.key;
            if let Err(e) = self
                .quest_host
                .update_task(&key.quest_id, &key.task_id, transition.to)
            {
                tracing::warn!(
                    quest_id = %key.quest_id,
                    task_id = %key.task_id,
                    error = %e,
                    "Host task update failed"
                );
            }
            self.notify(&transition.notification);
        }
        transitions
    }

    /// Evaluate `code` and render the outcome for the host.
    ///
    /// Success renders as the configured success message, failure as the
    /// failure prefix followed by the fault description.
    pub fn run(&self, code: &str) -> String {
        self.sandbox
            .execute(code)
            .render(&self.sandbox.settings().failure_prefix)
    }

    /// Current status of every task.
    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        self.machine().snapshot()
    }

    fn notify(&self, message: &str) {
        if let Err(e) = self.quest_host.notify_player(message) {
            tracing::warn!(error = %e, "Player notification failed");
        }
    }

    fn machine(&self) -> MutexGuard<'_, TaskStateMachine> {
        // State machine mutations do not panic midway, so a poisoned lock
        // still guards consistent state.
        self.machine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_packet_core::mocks::{HostCall, RecordingHost};

    fn agent(host: Arc<RecordingHost>) -> QuestAgent {
        QuestAgent::builder().with_host(host).build().unwrap()
    }

    #[test]
    fn test_build_requires_hosts() {
        assert!(QuestAgent::builder().build().is_err());
        let host: Arc<dyn QuestHost> = Arc::new(RecordingHost::new());
        assert!(QuestAgent::builder().with_quest_host(host).build().is_err());
    }

    #[test]
    fn test_initialize_runs_once() {
        let host = Arc::new(RecordingHost::new());
        let agent = agent(host.clone());
        assert!(agent.initialize());
        let calls = host.calls().len();
        assert!(!agent.initialize());
        assert_eq!(host.calls().len(), calls);
    }

    #[test]
    fn test_visit_before_initialize_is_ignored() {
        let host = Arc::new(RecordingHost::new());
        let agent = agent(host.clone());
        assert!(agent.on_visit("https://google.com").is_empty());
        assert!(host.calls().is_empty());
        assert_eq!(agent.snapshot()[0].status, quest_packet_core::TaskStatus::Pending);
    }

    #[test]
    fn test_transition_order_is_update_then_notify() {
        let host = Arc::new(RecordingHost::new());
        let agent = agent(host.clone());
        agent.initialize();
        host.clear();
        agent.on_visit("https://google.com");
        let calls = host.calls();
        assert!(matches!(calls[0], HostCall::UpdateTask { .. }));
        assert_eq!(
            calls[1],
            HostCall::NotifyPlayer("Rust Task Complete: Google visited!".into())
        );
    }
}
