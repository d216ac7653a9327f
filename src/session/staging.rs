use crate::storage::Attachment;

/// Attachments waiting to go out with the next message
#[derive(Debug, Clone, Default)]
pub struct ContextStaging {
    items: Vec<Attachment>,
}

impl ContextStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: Attachment) {
        tracing::debug!(name = %item.name, kind = ?item.kind, "attachment staged");
        self.items.push(item);
    }

    /// Hands over everything staged and leaves staging empty
    pub fn snapshot_and_clear(&mut self) -> Vec<Attachment> {
        std::mem::take(&mut self.items)
    }

    /// Puts a snapshot back ahead of anything staged since
    pub fn restore(&mut self, snapshot: Vec<Attachment>) {
        if snapshot.is_empty() {
            return;
        }
        let newer = std::mem::replace(&mut self.items, snapshot);
        self.items.extend(newer);
    }

    /// Drops the most recently staged attachment
    pub fn remove_last(&mut self) -> Option<Attachment> {
        self.items.pop()
    }

    #[must_use]
    pub fn items(&self) -> &[Attachment] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
