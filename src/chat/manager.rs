//! Registry of live conversations

use super::classifier::Classifier;
use super::dispatch::Replies;
use super::runtime::{spawn_conversation, ChatHandle};
use crate::llm::CompletionService;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Creates conversations and hands out their handles.
///
/// Removing a conversation drops the manager's handle; its router stops once
/// every other handle is gone, discarding completions still in flight.
pub struct ChatManager {
    completions: Arc<dyn CompletionService>,
    classifier: Arc<dyn Classifier>,
    replies: Arc<Replies>,
    conversations: RwLock<HashMap<String, ChatHandle>>,
}

impl ChatManager {
    pub fn new(
        completions: Arc<dyn CompletionService>,
        classifier: Arc<dyn Classifier>,
        replies: Replies,
    ) -> Self {
        Self {
            completions,
            classifier,
            replies: Arc::new(replies),
            conversations: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self) -> (String, ChatHandle) {
        let id = uuid::Uuid::new_v4().to_string();
        let handle = spawn_conversation(
            id.clone(),
            Arc::clone(&self.completions),
            Arc::clone(&self.classifier),
            Arc::clone(&self.replies),
        );
        self.conversations
            .write()
            .await
            .insert(id.clone(), handle.clone());
        tracing::info!(conv_id = %id, "Conversation created");
        (id, handle)
    }

    pub async fn get(&self, id: &str) -> Option<ChatHandle> {
        self.conversations.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.conversations.write().await.remove(id).is_some();
        if removed {
            tracing::info!(conv_id = %id, "Conversation removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }
}
