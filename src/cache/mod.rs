//! Cache module - File-backed key/value entries
//!
//! Provides:
//! - The entry store (`Cache`) with ttl handling and bulk operations
//! - One `CacheFile` handle per entry, owning descriptor and lock state
//! - Key validation, file naming and value encoding

pub mod codec;
pub mod file;
pub mod key;
pub mod store;
pub mod ttl;
