use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;

/// Shared key/value store holding the wizard's global state and form slices.
///
/// Clones share the same storage, so a session and the step handlers working on
/// it always see each other's writes.
#[derive(Clone, Debug, Default)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, key: impl Into<String>, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.data.insert(key.into(), value);
        Ok(())
    }

    /// Values that no longer deserialize as `T` read as absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub async fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, v)| v)
    }

    pub async fn clear(&self) {
        self.data.clear();
    }

    /// Raw JSON copy of every key, for API responses
    pub fn snapshot(&self) -> serde_json::Map<String, Value> {
        self.data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_storage() {
        let context = Context::new();
        let handle = context.clone();
        handle.set("claimFormId", "c-1").await.unwrap();

        assert_eq!(context.get::<String>("claimFormId").await.as_deref(), Some("c-1"));
        assert_eq!(context.get::<u32>("claimFormId").await, None);

        context.remove("claimFormId").await;
        assert!(handle.snapshot().is_empty());

        handle.set("locale", "de").await.unwrap();
        context.clear().await;
        assert!(handle.snapshot().is_empty());
    }
}
