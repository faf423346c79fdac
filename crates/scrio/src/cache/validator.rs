//! # Cache Validator
//!
//! Guards cache writes so that empty or error-shaped payloads are never
//! persisted. A rejected payload is still returned to the caller; it
//! just does not poison the cache until its TTL runs out.

use serde_json::Value;
use tracing::debug;

/// Keys whose mere presence marks a payload as an upstream error.
const ERROR_KEYS: [&str; 3] = ["error", "errorMessage", "errorCode"];

/// Collection keys that must not be empty when present.
const COLLECTION_KEYS: [&str; 5] = ["resources", "results", "data", "items", "files"];

/// How validation rejections are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Skip the cache write silently and return the payload as-is.
    #[default]
    Permissive,
    /// Fail the operation with a validation error.
    Strict,
}

/// Outcome of validating a payload before a cache write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// Whether the payload may be persisted
    pub cacheable: bool,
    /// Rejection causes, empty when cacheable
    pub reasons: Vec<String>,
    /// Suspicious but non-blocking observations
    pub warnings: Vec<String>,
}

/// Validates payloads against the empty/error shapes upstream is known
/// to produce on partial failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheValidator {
    mode: ValidationMode,
}

impl CacheValidator {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    pub fn is_strict(&self) -> bool {
        self.mode == ValidationMode::Strict
    }

    /// Classify a payload. Warnings never block the write.
    pub fn validate(&self, value: &Value) -> Validation {
        let mut reasons = Vec::new();
        let mut warnings = Vec::new();

        match value {
            Value::Null => reasons.push("payload is null".to_string()),
            Value::String(s) if s.is_empty() => reasons.push("payload is an empty string".to_string()),
            Value::Array(items) if items.is_empty() => {
                reasons.push("payload is an empty array".to_string());
            }
            Value::Object(map) => {
                if map.is_empty() {
                    reasons.push("payload is an object with no keys".to_string());
                }
                for key in ERROR_KEYS {
                    if map.contains_key(key) {
                        reasons.push(format!("payload carries error field '{key}'"));
                    }
                }
                for key in COLLECTION_KEYS {
                    if let Some(Value::Array(items)) = map.get(key) {
                        if items.is_empty() {
                            reasons.push(format!("collection '{key}' is empty"));
                        }
                    }
                }

                if map.get("totalCount").and_then(Value::as_u64) == Some(0) {
                    warnings.push("totalCount is zero".to_string());
                }
                if let Some(Value::Object(meta)) = map.get("metadata") {
                    if meta.get("incomplete").and_then(Value::as_bool) == Some(true) {
                        warnings.push("metadata reports an incomplete result".to_string());
                    }
                    if meta.contains_key("error") {
                        warnings.push("metadata carries an error field".to_string());
                    }
                }
            }
            _ => {}
        }

        if !reasons.is_empty() {
            debug!(reasons = ?reasons, "payload rejected for caching");
        }

        Validation {
            cacheable: reasons.is_empty(),
            reasons,
            warnings,
        }
    }
}
