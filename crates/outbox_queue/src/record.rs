//! Queued mutation records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// HTTP verbs eligible for queueing.
///
/// Read verbs (GET, HEAD) are never queued; a failed read propagates to
/// the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Create a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Partially update a resource.
    Patch,
    /// Delete a resource.
    Delete,
}

impl Method {
    /// Parses a verb string, returning `None` for anything that is not a
    /// queueable write.
    pub fn parse(verb: &str) -> Option<Self> {
        match verb.to_ascii_uppercase().as_str() {
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    /// Returns the verb as an uppercase HTTP method string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for a queued mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationId(Uuid);

impl MutationId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A captured write request awaiting replay.
///
/// `attempts` and `last_error` are replay bookkeeping owned by the sync
/// engine. They are not part of the persisted record and reset to zero
/// when a journal is reopened.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMutation {
    /// Unique mutation id.
    pub id: MutationId,
    /// Write verb of the original call.
    pub method: Method,
    /// Target URL of the original call.
    pub url: String,
    /// Opaque serialized body, replayed byte-for-byte.
    pub payload: Option<Vec<u8>>,
    /// Enqueue time in milliseconds since the Unix epoch.
    pub enqueued_at: u64,
    /// Number of failed replay attempts so far.
    pub attempts: u32,
    /// Message from the most recent failed replay.
    pub last_error: Option<String>,
}

impl QueuedMutation {
    /// Creates a new record with a fresh id and the current timestamp.
    pub fn new(method: Method, url: impl Into<String>, payload: Option<Vec<u8>>) -> Self {
        Self {
            id: MutationId::new(),
            method,
            url: url.into(),
            payload,
            enqueued_at: now_millis(),
            attempts: 0,
            last_error: None,
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_write_verbs() {
        assert_eq!(Method::parse("POST"), Some(Method::Post));
        assert_eq!(Method::parse("put"), Some(Method::Put));
        assert_eq!(Method::parse("Patch"), Some(Method::Patch));
        assert_eq!(Method::parse("DELETE"), Some(Method::Delete));
    }

    #[test]
    fn read_verbs_are_not_queueable() {
        assert_eq!(Method::parse("GET"), None);
        assert_eq!(Method::parse("HEAD"), None);
        assert_eq!(Method::parse("OPTIONS"), None);
        assert_eq!(Method::parse(""), None);
    }

    #[test]
    fn method_round_trips_through_str() {
        for method in [Method::Post, Method::Put, Method::Patch, Method::Delete] {
            assert_eq!(Method::parse(method.as_str()), Some(method));
        }
    }

    #[test]
    fn mutation_ids_are_unique() {
        assert_ne!(MutationId::new(), MutationId::new());
    }

    #[test]
    fn new_mutation_starts_untried() {
        let m = QueuedMutation::new(Method::Post, "/api/orders", Some(vec![1, 2, 3]));
        assert_eq!(m.attempts, 0);
        assert!(m.last_error.is_none());
        assert!(m.enqueued_at > 0);
    }
}
