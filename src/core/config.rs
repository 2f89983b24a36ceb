//! Cache configuration

use serde::{Deserialize, Serialize};

/// Options controlling store behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When set, `has` reports expired entries as absent.
    ///
    /// Off by default: `has` only checks that the backing file exists,
    /// while `get` honors expiration.
    #[serde(default)]
    pub has_checks_expiration: bool,
}

impl CacheConfig {
    pub fn with_has_checks_expiration(mut self, enabled: bool) -> Self {
        self.has_checks_expiration = enabled;
        self
    }
}
