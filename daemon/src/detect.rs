/// Decides whether a newly fetched snapshot is worth surfacing.
///
/// The comparison is by cardinality only. If one chat is read and a
/// different one gains a reply within the same interval the counts match and
/// the result is [`ChangeDecision::NoChange`]. Chat records are opaque to the
/// agent, so there is no stable identity to diff by.
use crate::state::NotificationState;

/// Outcome of comparing two consecutive snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDecision {
    NoChange,
    /// More chats are unread than before, or the first observation found some.
    NewActivity,
    /// Fewer chats are unread than before.
    ActivityCleared,
}

impl ChangeDecision {
    /// Log line for the decision, if it warrants one.
    pub fn describe(self) -> Option<&'static str> {
        match self {
            ChangeDecision::NewActivity => Some("New notification detected."),
            ChangeDecision::ActivityCleared => Some("You've checked on an unread reply."),
            ChangeDecision::NoChange => None,
        }
    }
}

/// Compares `previous` against `current`. Neither snapshot is modified.
pub fn detect(previous: &NotificationState, current: &NotificationState) -> ChangeDecision {
    let count_prev = previous.unread_count();
    let count_curr = current.unread_count();

    if previous.is_first_run() && count_curr > 0 {
        return ChangeDecision::NewActivity;
    }

    match count_curr.cmp(&count_prev) {
        std::cmp::Ordering::Greater => ChangeDecision::NewActivity,
        std::cmp::Ordering::Less => ChangeDecision::ActivityCleared,
        std::cmp::Ordering::Equal => ChangeDecision::NoChange,
    }
}
