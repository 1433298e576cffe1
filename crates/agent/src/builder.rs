//! Builder for [`QuestAgent`].

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use quest_packet_core::config::PacketConfig;
use quest_packet_core::{ContentHost, Error, QuestHost, Result};
use quest_packet_quest::TaskStateMachine;
use quest_packet_sandbox::{ExecutionSandbox, SandboxEngine};

use crate::agent::QuestAgent;

/// Builder for constructing a [`QuestAgent`].
///
/// Both host collaborators are required. Without an explicit sandbox the
/// agent evaluates payloads with the built-in script engine, configured from
/// the `sandbox` section of the configuration.
pub struct QuestAgentBuilder {
    config: PacketConfig,
    content_host: Option<Arc<dyn ContentHost>>,
    quest_host: Option<Arc<dyn QuestHost>>,
    sandbox: Option<ExecutionSandbox>,
    engine: Option<Arc<dyn SandboxEngine>>,
}

impl QuestAgentBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: PacketConfig::default(),
            content_host: None,
            quest_host: None,
            sandbox: None,
            engine: None,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: PacketConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the host content registry.
    pub fn with_content_host(mut self, host: Arc<dyn ContentHost>) -> Self {
        self.content_host = Some(host);
        self
    }

    /// Set the host quest registry and notification channel.
    pub fn with_quest_host(mut self, host: Arc<dyn QuestHost>) -> Self {
        self.quest_host = Some(host);
        self
    }

    /// Use one object for both host roles.
    pub fn with_host<H>(self, host: Arc<H>) -> Self
    where
        H: ContentHost + QuestHost + 'static,
    {
        let content: Arc<dyn ContentHost> = host.clone();
        let quest: Arc<dyn QuestHost> = host;
        self.with_content_host(content).with_quest_host(quest)
    }

    /// Use a fully configured sandbox.
    pub fn with_sandbox(mut self, sandbox: ExecutionSandbox) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Use `engine` with the configured sandbox settings.
    pub fn with_engine(mut self, engine: Arc<dyn SandboxEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Build the agent.
    ///
    /// Fails when a host is missing or the task and item definitions are
    /// invalid.
    pub fn build(self) -> Result<QuestAgent> {
        let content_host = self
            .content_host
            .ok_or_else(|| Error::invalid_config("a content host is required"))?;
        let quest_host = self
            .quest_host
            .ok_or_else(|| Error::invalid_config("a quest host is required"))?;

        self.config.validate()?;
        let mut machine = TaskStateMachine::new();
        machine.initialize(self.config.tasks.clone(), self.config.items.clone())?;

        let sandbox = match (self.sandbox, self.engine) {
            (Some(sandbox), _) => sandbox,
            (None, Some(engine)) => ExecutionSandbox::new(engine, self.config.sandbox.clone()),
            (None, None) => ExecutionSandbox::with_script_engine(self.config.sandbox.clone()),
        };

        tracing::debug!(
            packet = %self.config.packet.name,
            engine = sandbox.engine().name(),
            "Quest agent built"
        );

        Ok(QuestAgent {
            start_message: self.config.packet.start_message,
            content_host,
            quest_host,
            machine: Mutex::new(machine),
            sandbox,
            initialize_started: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
        })
    }
}

impl Default for QuestAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
