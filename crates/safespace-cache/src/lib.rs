//! SafeSpace Cache
//!
//! Content-addressed store for remote classification and rewrite outputs.
//!
//! Provides:
//! - Keys derived from the task kind and normalized message text
//! - A thread-safe in-memory map shared by all workers
//! - JSON-lines persistence, loaded at startup and flushed periodically

pub mod cache;
pub mod key;
pub mod persistence;

pub use cache::{CachedValue, ResponseCache};
pub use key::{cache_key, normalize, TaskKind};
pub use persistence::PersistenceConfig;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cache::{CachedValue, ResponseCache};
    pub use crate::key::TaskKind;
    pub use crate::persistence::PersistenceConfig;
}
