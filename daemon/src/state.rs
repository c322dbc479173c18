use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Complete snapshot of the remote unread-chat summary.
///
/// Only the `chats` array is interpreted; each entry and any sibling fields
/// the API returns are carried through untouched so the persisted file
/// mirrors what the server sent. A snapshot always replaces the previous one
/// wholesale. A document without a `chats` array is not a snapshot and fails
/// to deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationState {
    pub chats: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotificationState {
    /// Number of chats with unread replies.
    pub fn unread_count(&self) -> usize {
        self.chats.len()
    }

    /// True for the zero snapshot used before anything has been observed.
    pub fn is_first_run(&self) -> bool {
        self.chats.is_empty() && self.extra.is_empty()
    }
}

#[cfg(test)]
impl NotificationState {
    /// Snapshot holding the given chat records and nothing else.
    pub fn with_chats(chats: Vec<Value>) -> Self {
        Self {
            chats,
            extra: Map::new(),
        }
    }
}
