//! Bounded, newest-first history of successful predictions.

use std::collections::VecDeque;

use crate::models::prediction::AuditLogEntry;

pub const DEFAULT_CAPACITY: usize = 5;

/// In-memory audit log. Lives as long as its session; nothing is persisted.
#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: VecDeque<AuditLogEntry>,
    capacity: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl AuditLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add an entry at the head, evicting the oldest past capacity.
    pub fn append(&mut self, entry: AuditLogEntry) -> &VecDeque<AuditLogEntry> {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        &self.entries
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &AuditLogEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: &str) -> Option<&AuditLogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn latest(&self) -> Option<&AuditLogEntry> {
        self.entries.front()
    }

    pub fn to_vec(&self) -> Vec<AuditLogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
