//! Per-user agent sessions: one long-lived handle per Telegram user id.
//!
//! Handles are created lazily on the first event from a user and live for
//! the process lifetime; there is no eviction.

use crate::agent::{AgentFactory, AgentHandle};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory map from user id to that user's agent session handle.
pub struct SessionResolver {
    factory: Arc<dyn AgentFactory>,
    inner: Arc<RwLock<HashMap<String, Arc<dyn AgentHandle>>>>,
}

impl SessionResolver {
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            factory,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Return the session handle for `user_id`, constructing it on first use.
    pub async fn resolve(&self, user_id: &str) -> Arc<dyn AgentHandle> {
        if let Some(handle) = self.inner.read().await.get(user_id) {
            return handle.clone();
        }
        let mut guard = self.inner.write().await;
        // another task may have created the session between the two locks
        if let Some(handle) = guard.get(user_id) {
            return handle.clone();
        }
        let handle = self.factory.construct(user_id);
        guard.insert(user_id.to_string(), handle.clone());
        log::debug!("created agent session for user {}", user_id);
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoAgent;

    impl AgentHandle for EchoAgent {
        fn run(&self, input: &str) -> Result<String, AgentError> {
            Ok(input.to_string())
        }
    }

    struct CountingFactory {
        constructed: AtomicUsize,
    }

    impl AgentFactory for CountingFactory {
        fn construct(&self, _session_id: &str) -> Arc<dyn AgentHandle> {
            self.constructed.fetch_add(1, Ordering::SeqCst);
            Arc::new(EchoAgent)
        }
    }

    #[tokio::test]
    async fn resolve_returns_same_handle_per_user() {
        let factory = Arc::new(CountingFactory {
            constructed: AtomicUsize::new(0),
        });
        let resolver = SessionResolver::new(factory.clone());
        let a = resolver.resolve("42").await;
        let b = resolver.resolve("42").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.constructed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_users_get_distinct_handles() {
        let factory = Arc::new(CountingFactory {
            constructed: AtomicUsize::new(0),
        });
        let resolver = SessionResolver::new(factory.clone());
        let a = resolver.resolve("42").await;
        let b = resolver.resolve("7").await;
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(factory.constructed.load(Ordering::SeqCst), 2);
    }
}
