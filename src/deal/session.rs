use crate::deal::DealContext;
use dashmap::DashMap;

/// Active deal per chat. Lives only in memory and is lost on restart.
#[derive(Debug, Default)]
pub struct SessionStore {
    chats: DashMap<i64, DealContext>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chat_id: i64) -> Option<DealContext> {
        self.chats.get(&chat_id).map(|entry| entry.value().clone())
    }

    /// Makes `ctx` the chat's active deal, replacing any previous one.
    pub fn insert(&self, chat_id: i64, ctx: DealContext) {
        self.chats.insert(chat_id, ctx);
    }

    /// Returns false when the chat has no active deal.
    pub fn set_target(&self, chat_id: i64, target: &str) -> bool {
        match self.chats.get_mut(&chat_id) {
            Some(mut ctx) => {
                ctx.target = target.to_string();
                true
            }
            None => false,
        }
    }

    /// Number of chats with an active deal.
    pub fn active_chats(&self) -> usize {
        self.chats.len()
    }
}
