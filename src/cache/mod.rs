//! Content-Addressed Cache
//!
//! Maps deterministic hashes of inputs (file bytes, file sets, entity ids)
//! to previously computed results so downstream components avoid repeating
//! expensive work. The cache is strictly an optimization: every read and
//! write is wrapped so that backend unavailability degrades to a miss or
//! no-op and never reaches the caller.

pub mod handle;
pub mod keys;
pub mod store;

pub use handle::CacheHandle;
pub use store::{CacheBackend, CacheError, MemoryCache, DEFAULT_TTL};
