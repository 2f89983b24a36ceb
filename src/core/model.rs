//! Result model for CLI output
//!
//! Every command maps its outcome to `ResultItem`s before rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::ttl::Expiration;

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A cache entry (value, listing row)
    Entry,
    /// Outcome of a mutating command
    Status,
}

/// A single line of command output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub kind: Kind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Command that produced a status item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,

    /// RFC 3339 expiration, or "never"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl ResultItem {
    fn empty(kind: Kind) -> Self {
        Self {
            kind,
            key: None,
            op: None,
            value: None,
            expires: None,
            expired: None,
            ok: None,
            count: None,
        }
    }

    /// An entry carrying its value
    pub fn entry(key: impl Into<String>, value: serde_json::Value) -> Self {
        let mut item = Self::empty(Kind::Entry);
        item.key = Some(key.into());
        item.value = Some(value);
        item
    }

    /// A listing row: key plus expiration state
    pub fn listing(key: impl Into<String>, expiration: Expiration, expired: bool) -> Self {
        let mut item = Self::empty(Kind::Entry);
        item.key = Some(key.into());
        item.expires = Some(format_expiration(expiration));
        item.expired = Some(expired);
        item
    }

    /// Outcome of an operation
    pub fn status(op: impl Into<String>, ok: bool) -> Self {
        let mut item = Self::empty(Kind::Status);
        item.op = Some(op.into());
        item.ok = Some(ok);
        item
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_expiration(mut self, expiration: Option<Expiration>) -> Self {
        self.expires = expiration.map(format_expiration);
        self
    }
}

/// Render an expiration for humans and JSON alike
pub fn format_expiration(expiration: Expiration) -> String {
    match expiration {
        Expiration::Never => "never".to_string(),
        Expiration::At(timestamp) => DateTime::<Utc>::from_timestamp(timestamp, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| timestamp.to_string()),
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
