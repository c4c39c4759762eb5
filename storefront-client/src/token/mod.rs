//! Token persistence
//!
//! Stores hold at most one access token under a fixed key; an absent
//! token means the client is anonymous.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

use crate::error::ClientResult;

/// Persistence backend for the session access token
pub trait TokenStore: Send + Sync {
    /// Load the stored token, if any
    fn load(&self) -> ClientResult<Option<String>>;

    /// Persist a token, replacing any previous one
    fn save(&self, token: &str) -> ClientResult<()>;

    /// Remove the stored token; removing an absent token is not an error
    fn clear(&self) -> ClientResult<()>;
}

impl<T: TokenStore + ?Sized> TokenStore for std::sync::Arc<T> {
    fn load(&self) -> ClientResult<Option<String>> {
        self.as_ref().load()
    }

    fn save(&self, token: &str) -> ClientResult<()> {
        self.as_ref().save(token)
    }

    fn clear(&self) -> ClientResult<()> {
        self.as_ref().clear()
    }
}
