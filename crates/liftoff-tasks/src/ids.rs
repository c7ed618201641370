//! Task id generation
//!
//! Queue task ids are 22-character URL-safe base64 slugs of a v4 UUID. The
//! first bit is cleared so an id never starts with `-`, which would read as
//! a command-line flag.

use std::sync::atomic::{AtomicUsize, Ordering};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use uuid::Uuid;

/// Generate a fresh slug id
pub fn slug_id() -> String {
    let mut bytes = *Uuid::new_v4().as_bytes();
    bytes[0] &= 0x7f;
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Source of task ids for one graph
pub trait IdGenerator: Send + Sync {
    /// Issue a new id, never returned before
    fn next_id(&self) -> String;
}

/// Random slug ids
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugIds;

impl IdGenerator for SlugIds {
    fn next_id(&self) -> String {
        slug_id()
    }
}

/// Predictable ids (`task-0`, `task-1`, ...) for tests and plan output
#[derive(Debug, Default)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicUsize,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicUsize::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slug_id_shape() {
        for _ in 0..200 {
            let id = slug_id();
            assert_eq!(id.len(), 22);
            assert!(!id.starts_with('-'));
            assert!(id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn test_slug_ids_are_unique() {
        let ids: HashSet<String> = (0..500).map(|_| SlugIds.next_id()).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new("task");
        assert_eq!(ids.next_id(), "task-0");
        assert_eq!(ids.next_id(), "task-1");
    }
}
