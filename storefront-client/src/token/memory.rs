//! In-memory token store

use std::sync::RwLock;

use crate::error::ClientResult;
use crate::token::TokenStore;

/// Token store backed by process memory, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ClientResult<Option<String>> {
        Ok(self.token.read().unwrap().clone())
    }

    fn save(&self, token: &str) -> ClientResult<()> {
        *self.token.write().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.token.write().unwrap() = None;
        Ok(())
    }
}
