//! Rolling conversation history

use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::chat::{Message, Role};

/// Default bound: ten user/assistant pairs
pub const DEFAULT_MAX_ENTRIES: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl Entry {
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.text.clone(),
        }
    }
}

/// Append-only history, trimmed from the oldest end past `max_entries`
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    entries: VecDeque<Entry>,
    max_entries: usize,
}

impl ConversationHistory {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries + 1),
            max_entries,
        }
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.entries.push_back(Entry {
            role,
            text: text.into(),
            timestamp: Local::now(),
        });
        while self.entries.len() > self.max_entries {
            if let Some(dropped) = self.entries.pop_front() {
                tracing::trace!(role = ?dropped.role, "history trimmed");
            }
        }
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(Role::User, text);
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(Role::Assistant, text);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.back()
    }

    /// The most recent `n` entries as chat messages, oldest first
    pub fn tail_messages(&self, n: usize) -> Vec<Message> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).map(Entry::to_message).collect()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_to_most_recent() {
        let mut history = ConversationHistory::default();
        for i in 0..25 {
            history.push_user(format!("turn {i}"));
        }
        assert_eq!(history.len(), 20);
        let texts: Vec<_> = history.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts.first(), Some(&"turn 5"));
        assert_eq!(texts.last(), Some(&"turn 24"));
    }

    #[test]
    fn test_tail_messages() {
        let mut history = ConversationHistory::new(6);
        history.push_user("hi");
        history.push_assistant("hello");
        history.push_user("how are you");

        let tail = history.tail_messages(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].role, Role::Assistant);
        assert_eq!(tail[1].content, "how are you");

        assert_eq!(history.tail_messages(10).len(), 3);
    }

    #[test]
    fn test_zero_bound_is_clamped() {
        let mut history = ConversationHistory::new(0);
        history.push_user("a");
        history.push_user("b");
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().map(|e| e.text.as_str()), Some("b"));
    }
}
