//! Conversation memory keyed by (resource, thread).

use crate::message::Message;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Durable conversation history behind the agent. Keys come straight
/// from the request's `resourceId` / `threadId` pair.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn load(&self, resource_id: &str, thread_id: &str) -> Vec<Message>;
    async fn append(&self, resource_id: &str, thread_id: &str, messages: Vec<Message>);
}

/// Process-local store. History lives for the lifetime of the server.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    threads: Arc<RwLock<HashMap<(String, String), Vec<Message>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn load(&self, resource_id: &str, thread_id: &str) -> Vec<Message> {
        let threads = self.threads.read().await;
        threads
            .get(&(resource_id.to_string(), thread_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    async fn append(&self, resource_id: &str, thread_id: &str, messages: Vec<Message>) {
        let mut threads = self.threads.write().await;
        threads
            .entry((resource_id.to_string(), thread_id.to_string()))
            .or_default()
            .extend(messages);
    }
}
