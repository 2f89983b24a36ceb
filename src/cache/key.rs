//! Cache keys and the file names derived from them
//!
//! Every entry lives in `cache-<key>.cache`. The same pattern recognizes
//! cache files during directory sweeps, so it must match exactly the
//! names `file_name` produces and nothing else.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::error::{CacheError, Result};

pub const FILE_PREFIX: &str = "cache-";
pub const FILE_EXTENSION: &str = ".cache";

/// Characters a key may not contain
pub const FORBIDDEN_CHARS: [char; 7] = ['{', '}', '(', ')', '/', '\\', '@'];

/// Regex matching cache file names
pub static CACHE_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^cache-([^{}()/\\@]+)\.cache$").expect("Invalid CACHE_FILE_RE regex")
});

pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(&FORBIDDEN_CHARS[..])
}

/// Fail with `InvalidKey` unless the key is usable
pub fn validate_key(key: &str) -> Result<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(CacheError::InvalidKey(key.to_string()))
    }
}

/// File name for a key
pub fn file_name(key: &str) -> String {
    format!("{}{}{}", FILE_PREFIX, key, FILE_EXTENSION)
}

/// Recover the key from a cache file name, if it is one
pub fn key_from_file_name(name: &str) -> Option<&str> {
    CACHE_FILE_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn is_cache_file_name(name: &str) -> bool {
    CACHE_FILE_RE.is_match(name)
}
