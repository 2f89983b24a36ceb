//! filecache - a persistent key/value cache with one file per entry
//!
//! Entries live in `cache-<key>.cache` files inside a directory. Values are
//! stored as escaped base64 of their JSON encoding, expiration is the file's
//! modification time (timestamp `1` means "never expires"), and `lock` takes
//! a non-blocking exclusive advisory lock that other processes using the
//! same directory respect.
//!
//! ```no_run
//! use filecache::{Cache, Ttl};
//!
//! let mut cache = Cache::new("/tmp/cache")?;
//! cache.set("greeting", "hello", None)?;
//! cache.set("numbers", &[1, 2, 3], Some(Ttl::Seconds(5)))?;
//!
//! let greeting: String = cache.get("greeting", String::new())?;
//! assert_eq!(greeting, "hello");
//!
//! if cache.lock("report")? {
//!     // exclusive section shared with other processes
//!     cache.unlock("report")?;
//! }
//! # Ok::<(), filecache::CacheError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod core;

pub use crate::cache::file::CacheFile;
pub use crate::cache::store::Cache;
pub use crate::cache::ttl::{Expiration, Ttl, NEVER_EXPIRES};
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::config::CacheConfig;
pub use crate::core::error::{CacheError, Result};
