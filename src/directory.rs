//! Display-name lookups for reports.
//!
//! Lookups are best effort: a missing name never blocks tallying, callers
//! fall back to the raw identifier.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, instrument};

use crate::tournament::UserId;

/// Source of user display names.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the display name for `user_id`, or `None` if the lookup fails.
    async fn display_name(&self, user_id: UserId) -> Option<String>;
}

/// Placeholder shown when a name cannot be resolved.
pub fn fallback_name(user_id: UserId) -> String {
    format!("ID{}", user_id)
}

/// Resolves a name through `directory`, falling back to [`fallback_name`].
#[instrument(skip(directory))]
pub async fn resolve_name(directory: &dyn UserDirectory, user_id: UserId) -> String {
    match directory.display_name(user_id).await {
        Some(name) => name,
        None => {
            debug!(user_id, "Display name unavailable, using raw id");
            fallback_name(user_id)
        }
    }
}

/// In-memory directory that learns names from inbound events.
#[derive(Debug, Clone, Default)]
pub struct NameCache {
    names: Arc<RwLock<HashMap<UserId, String>>>,
}

impl NameCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the latest non-empty name seen for `user_id`.
    pub fn remember(&self, user_id: UserId, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id, name.to_string());
    }
}

#[async_trait]
impl UserDirectory for NameCache {
    async fn display_name(&self, user_id: UserId) -> Option<String> {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .cloned()
    }
}
