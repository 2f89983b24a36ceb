//! Value encoding for cache files
//!
//! value -> JSON bytes -> base64 -> backslash-escaped text, and back.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::error::{CacheError, Result};

/// Encode a value into the text stored on disk
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(escape(&STANDARD.encode(bytes)))
}

/// Decode text read from disk back into a value
pub fn decode<T: DeserializeOwned>(content: &str) -> Result<T> {
    let unescaped = unescape(content);
    let bytes = STANDARD
        .decode(unescaped.trim())
        .map_err(|e| CacheError::Decode(format!("base64: {}", e)))?;
    serde_json::from_slice(&bytes).map_err(|e| CacheError::Decode(format!("json: {}", e)))
}

/// Backslash-escape quotes, backslashes and NUL
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '\'' | '"' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape`]
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some(next) => out.push(next),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    #[test]
    fn test_round_trip_nested_value() {
        let value = json!({
            "name": "hello",
            "list": [1, 2, 3],
            "nested": {"flag": true, "none": null, "pi": 3.5}
        });

        let encoded = encode(&value).unwrap();
        let decoded: Value = decode(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_round_trip_typed_struct() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Session {
            user: String,
            roles: Vec<String>,
            attrs: BTreeMap<String, i64>,
        }

        let session = Session {
            user: "ana".into(),
            roles: vec!["admin".into()],
            attrs: BTreeMap::from([("visits".to_string(), 7)]),
        };

        let decoded: Session = decode(&encode(&session).unwrap()).unwrap();
        assert_eq!(decoded, session);
    }

    #[test]
    fn test_encoded_is_base64_text() {
        let encoded = encode("hello").unwrap();
        // "hello" as JSON is "\"hello\""
        assert_eq!(encoded, "ImhlbGxvIg==");
    }

    #[test]
    fn test_escape_unescape() {
        let raw = "a\\b'c\"d\0e";
        let escaped = escape(raw);
        assert_eq!(escaped, "a\\\\b\\'c\\\"d\\0e");
        assert_eq!(unescape(&escaped), raw);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result: Result<Value> = decode("!!not base64!!");
        assert!(matches!(result, Err(CacheError::Decode(_))));

        let result: Result<Value> = decode("");
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_wrong_type_fails() {
        let encoded = encode(&[1, 2, 3]).unwrap();
        let result: Result<String> = decode(&encoded);
        assert!(result.is_err());
    }
}
