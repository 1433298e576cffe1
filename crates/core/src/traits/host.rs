use crate::error::Result;
use crate::types::{ContentItem, TaskStatus};

// =============================================================================
// Host Capability Traits
// =============================================================================

/// Content registry owned by the host.
pub trait ContentHost: Send + Sync {
    /// Register a visitable item. De-duplication is the host's concern.
    fn register_item(&self, item_id: &str, locator: &str, label: &str, kind: &str) -> Result<()>;

    /// Register a [`ContentItem`] by its fields.
    fn register(&self, item: &ContentItem) -> Result<()> {
        self.register_item(&item.item_id, &item.locator, &item.label, &item.kind)
    }
}

/// Quest registry and player notification channel owned by the host.
pub trait QuestHost: Send + Sync {
    /// Register a task in `PENDING` status.
    fn register_task(&self, quest_id: &str, task_id: &str, description: &str) -> Result<()>;

    /// Mirror a local status transition into the host registry.
    fn update_task(&self, quest_id: &str, task_id: &str, status: TaskStatus) -> Result<()>;

    /// Best-effort user-facing notification.
    fn notify_player(&self, message: &str) -> Result<()>;
}
