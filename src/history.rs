//! Append-only conversation log.
//!
//! Records are immutable once created and kept in the order turns resolve.
//! The log lives for one session; [`crate::transcript`] can export it.

use serde::{Deserialize, Serialize};

/// One resolved turn: the query, the response it produced, and the human's
/// feedback on that response if any was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    query: String,
    response: String,
    feedback: Option<String>,
}

impl InteractionRecord {
    pub fn new(query: impl Into<String>, response: impl Into<String>, feedback: Option<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            feedback,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }
}

/// Ordered log of [`InteractionRecord`]s for a single session.
///
/// There is no way to remove or edit a record: the only mutation is
/// [`ConversationHistory::append`].
#[derive(Debug, Default)]
pub struct ConversationHistory {
    records: Vec<InteractionRecord>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to the end of the log.
    pub fn append(&mut self, record: InteractionRecord) {
        self.records.push(record);
    }

    /// Read-only view of every record, oldest first.
    pub fn as_sequence(&self) -> &[InteractionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_history_is_empty() {
        let history = ConversationHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.as_sequence().len(), 0);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut history = ConversationHistory::new();
        history.append(InteractionRecord::new("first", "a", None));
        history.append(InteractionRecord::new("second", "b", Some("shorter".into())));
        history.append(InteractionRecord::new("third", "c", None));

        let queries: Vec<&str> = history.as_sequence().iter().map(|r| r.query()).collect();
        assert_eq!(queries, ["first", "second", "third"]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.as_sequence()[1].feedback(), Some("shorter"));
        assert_eq!(history.as_sequence()[2].feedback(), None);
    }

    #[test]
    fn test_record_serializes_as_triple() {
        let record = InteractionRecord::new("q", "r", None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["query"], "q");
        assert_eq!(json["response"], "r");
        assert!(json["feedback"].is_null());
    }
}
