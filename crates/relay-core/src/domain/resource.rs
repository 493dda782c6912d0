//! ResourceSpec - 中継対象のリソース定義

/// Describes the single upstream collection being relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Collection path segment and response key, e.g. `tickets`. Also the cursor name.
    pub collection: String,
    /// Resource type used as the idempotency key prefix, e.g. `ticket`.
    pub kind: String,
    /// Event name that webhook destinations register for.
    pub event: String,
    /// `source` field of every delivered envelope.
    pub source: String,
}

impl ResourceSpec {
    pub fn new(
        collection: impl Into<String>,
        kind: impl Into<String>,
        event: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            kind: kind.into(),
            event: event.into(),
            source: source.into(),
        }
    }

    pub fn cursor_name(&self) -> &str {
        &self.collection
    }
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self::new("tickets", "ticket", "ticket.updated", "freshdesk")
    }
}
