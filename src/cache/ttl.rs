//! Time-to-live values and expiration timestamps
//!
//! Expiration is persisted as the cache file's modification time. The
//! reserved timestamp [`NEVER_EXPIRES`] marks entries without a ttl.

use std::time::Duration;

use crate::core::error::{CacheError, Result};

/// Modification time meaning "never expires"
pub const NEVER_EXPIRES: i64 = 1;

/// How long an entry should live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Whole seconds; must not be negative
    Seconds(i64),
    /// An interval, truncated to whole seconds
    Interval(Duration),
}

impl Ttl {
    /// Validated length in seconds
    pub fn as_secs(&self) -> Result<i64> {
        match *self {
            Ttl::Seconds(secs) if secs < 0 => Err(CacheError::InvalidTtl(format!(
                "{} seconds is negative",
                secs
            ))),
            Ttl::Seconds(secs) => Ok(secs),
            Ttl::Interval(interval) => i64::try_from(interval.as_secs())
                .map_err(|_| CacheError::InvalidTtl(format!("{:?} is too large", interval))),
        }
    }
}

impl From<i64> for Ttl {
    fn from(secs: i64) -> Self {
        Ttl::Seconds(secs)
    }
}

impl From<Duration> for Ttl {
    fn from(interval: Duration) -> Self {
        Ttl::Interval(interval)
    }
}

/// Absolute expiration timestamp for an entry written at `now`
///
/// A missing or zero ttl maps to [`NEVER_EXPIRES`].
pub fn expiration_timestamp(ttl: Option<Ttl>, now: i64) -> Result<i64> {
    let secs = match ttl {
        None => return Ok(NEVER_EXPIRES),
        Some(ttl) => ttl.as_secs()?,
    };

    if secs == 0 {
        return Ok(NEVER_EXPIRES);
    }

    now.checked_add(secs)
        .ok_or_else(|| CacheError::InvalidTtl(format!("{} seconds overflows", secs)))
}

/// Resolved view of a stored expiration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    Never,
    At(i64),
}

impl Expiration {
    pub fn from_timestamp(timestamp: i64) -> Self {
        if timestamp == NEVER_EXPIRES {
            Expiration::Never
        } else {
            Expiration::At(timestamp)
        }
    }

    /// Expired at `now`; the expiration instant itself counts as expired
    pub fn is_expired_at(&self, now: i64) -> bool {
        match *self {
            Expiration::Never => false,
            Expiration::At(timestamp) => now >= timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ttl_never_expires() {
        assert_eq!(expiration_timestamp(None, 1000).unwrap(), NEVER_EXPIRES);
        assert_eq!(
            expiration_timestamp(Some(Ttl::Seconds(0)), 1000).unwrap(),
            NEVER_EXPIRES
        );
        assert_eq!(
            expiration_timestamp(Some(Duration::ZERO.into()), 1000).unwrap(),
            NEVER_EXPIRES
        );
    }

    #[test]
    fn test_seconds_and_interval() {
        assert_eq!(expiration_timestamp(Some(Ttl::Seconds(5)), 1000).unwrap(), 1005);
        assert_eq!(
            expiration_timestamp(Some(Duration::from_secs(60 * 60 * 5).into()), 1000).unwrap(),
            1000 + 18_000
        );
        // sub-second remainder is dropped
        assert_eq!(
            expiration_timestamp(Some(Duration::from_millis(2_900).into()), 1000).unwrap(),
            1002
        );
    }

    #[test]
    fn test_negative_ttl_is_invalid() {
        let err = expiration_timestamp(Some(Ttl::Seconds(-1)), 1000).unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl(_)));
    }

    #[test]
    fn test_overflow_is_invalid() {
        let err = expiration_timestamp(Some(Ttl::Seconds(i64::MAX)), 1000).unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl(_)));
    }

    #[test]
    fn test_expiration_boundary() {
        let exp = Expiration::from_timestamp(1005);
        assert!(!exp.is_expired_at(1004));
        assert!(exp.is_expired_at(1005));
        assert!(exp.is_expired_at(1006));
    }

    #[test]
    fn test_sentinel_never_expires() {
        let exp = Expiration::from_timestamp(NEVER_EXPIRES);
        assert_eq!(exp, Expiration::Never);
        assert!(!exp.is_expired_at(i64::MAX));
    }
}
