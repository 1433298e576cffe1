use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Content Types
// =============================================================================

/// A visitable resource the agent announces to the host's content registry.
///
/// The host owns the item once registered; the agent only keeps the
/// definition so it can register it during initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Identifier, unique within the host registry.
    pub item_id: String,

    /// URI the item points at.
    pub locator: String,

    /// Human-readable label.
    pub label: String,

    /// Item kind, e.g. "webpage".
    pub kind: String,
}

impl ContentItem {
    /// Create a new content item.
    pub fn new(
        item_id: impl Into<String>,
        locator: impl Into<String>,
        label: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            locator: locator.into(),
            label: label.into(),
            kind: kind.into(),
        }
    }

    /// Create a webpage item.
    pub fn webpage(
        item_id: impl Into<String>,
        locator: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self::new(item_id, locator, label, "webpage")
    }

    /// Reject items the host registry could not address.
    pub fn validate(&self) -> Result<()> {
        if self.item_id.trim().is_empty() {
            return Err(Error::invalid_item("item_id must not be empty"));
        }
        if self.locator.trim().is_empty() {
            return Err(Error::invalid_item(format!(
                "item '{}' has an empty locator",
                self.item_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webpage_kind() {
        let item = ContentItem::webpage("google-item", "https://google.com", "Visit Google");
        assert_eq!(item.kind, "webpage");
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_empty_locator_rejected() {
        let item = ContentItem::webpage("blank", " ", "Nothing");
        assert!(matches!(item.validate(), Err(Error::InvalidItem(_))));
    }
}
