use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{ContentItem, TaskDefinition, VisitTrigger};

/// Upper bound for `sandbox.max_nesting_depth`. The script engine's
/// evaluation stack is sized for this many bracket levels.
pub const NESTING_DEPTH_CEILING: usize = 100;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PacketConfig {
    pub packet: PacketSection,
    pub items: Vec<ContentItem>,
    pub tasks: Vec<TaskDefinition>,
    pub sandbox: SandboxSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PacketSection {
    pub name: String,
    pub start_message: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SandboxSettings {
    /// Returned for every payload that evaluates without a fault.
    pub success_message: String,
    /// Payload answered before evaluation.
    pub control_payload: String,
    pub control_message: String,
    /// Prepended to fault descriptions when rendering for the host.
    pub failure_prefix: String,
    pub max_payload_bytes: usize,
    pub max_nesting_depth: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    pub json: bool,
}

impl PacketConfig {
    /// Load from `./config`, honoring `QUEST_PACKET_ENV` and
    /// `QUEST_PACKET__*` environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let env = std::env::var("QUEST_PACKET_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(&env)).required(false))
            .add_source(File::from(dir.join("local")).required(false))
            // QUEST_PACKET__SANDBOX__FAILURE_PREFIX maps to sandbox.failure_prefix
            .add_source(Environment::with_prefix("QUEST_PACKET").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        tracing::debug!(
            dir = %dir.display(),
            env = %env,
            items = config.items.len(),
            tasks = config.tasks.len(),
            "Packet configuration loaded"
        );
        Ok(config)
    }

    /// Reject definitions the host registries could not hold.
    pub fn validate(&self) -> Result<()> {
        let mut item_ids = HashSet::new();
        for item in &self.items {
            item.validate()?;
            if !item_ids.insert(item.item_id.as_str()) {
                return Err(Error::DuplicateItem(item.item_id.clone()));
            }
        }

        let mut task_keys = HashSet::new();
        for task in &self.tasks {
            task.validate()?;
            if !task_keys.insert(task.key()) {
                return Err(Error::DuplicateTask(task.key().to_string()));
            }
        }

        if self.sandbox.max_payload_bytes == 0 {
            return Err(Error::invalid_config("sandbox.max_payload_bytes must be positive"));
        }
        if self.sandbox.max_nesting_depth == 0
            || self.sandbox.max_nesting_depth > NESTING_DEPTH_CEILING
        {
            return Err(Error::invalid_config(format!(
                "sandbox.max_nesting_depth must be between 1 and {}",
                NESTING_DEPTH_CEILING
            )));
        }
        Ok(())
    }
}

impl Default for PacketConfig {
    fn default() -> Self {
        let packet = PacketSection::default();
        let name = packet.name.clone();
        Self {
            packet,
            items: vec![ContentItem::webpage(
                "google-item",
                "https://google.com",
                "Visit Google",
            )],
            tasks: vec![TaskDefinition::new(
                "quest-1",
                "task-1",
                "Visit https://google.com",
                VisitTrigger::contains("google.com"),
            )
            .with_completion_message(format!("{} Task Complete: Google visited!", name))],
            sandbox: SandboxSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PacketSection {
    fn default() -> Self {
        Self {
            name: "Rust".into(),
            start_message: "Rust Quest Started: Visit Google!".into(),
        }
    }
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            success_message: "Code executed successfully".into(),
            control_payload: "init".into(),
            control_message: "Sandbox initialized".into(),
            failure_prefix: "Error: ".into(),
            max_payload_bytes: 64 * 1024,
            max_nesting_depth: 64,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,quest_packet=debug".into(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_describe_google_quest() {
        let config = PacketConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.items[0].item_id, "google-item");
        assert_eq!(config.tasks[0].key().to_string(), "quest-1/task-1");
        assert_eq!(
            config.tasks[0].completion_message,
            "Rust Task Complete: Google visited!"
        );
        assert_eq!(config.sandbox.control_payload, "init");
    }

    #[test]
    fn test_load_from_directory_overrides_sandbox() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("default.toml")).unwrap();
        writeln!(
            file,
            r#"
[sandbox]
failure_prefix = "Failed: "

[[tasks]]
quest_id = "quest-2"
task_id = "docs"
description = "Read the docs"
completion_message = "Docs read!"
trigger = {{ match = "domain", host = "docs.rs" }}
"#
        )
        .unwrap();

        let config = PacketConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.sandbox.failure_prefix, "Failed: ");
        assert_eq!(config.sandbox.success_message, "Code executed successfully");
        assert_eq!(config.tasks.len(), 1);
        assert_eq!(config.tasks[0].trigger, VisitTrigger::domain("docs.rs"));
        // Items were not overridden.
        assert_eq!(config.items.len(), 1);
    }

    #[test]
    fn test_duplicate_task_rejected() {
        let mut config = PacketConfig::default();
        config.tasks.push(config.tasks[0].clone());
        assert!(matches!(config.validate(), Err(Error::DuplicateTask(_))));
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let mut config = PacketConfig::default();
        config.items.push(config.items[0].clone());
        assert!(matches!(config.validate(), Err(Error::DuplicateItem(_))));
    }

    #[test]
    fn test_nesting_depth_bounds() {
        let mut config = PacketConfig::default();
        config.sandbox.max_nesting_depth = NESTING_DEPTH_CEILING + 1;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        config.sandbox.max_nesting_depth = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
