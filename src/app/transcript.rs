use crate::storage::{Attachment, Message, Role, StoredMessage};

/// One visible turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    pub attachments: Vec<Attachment>,
    /// Still receiving text
    pub live: bool,
}

impl TranscriptEntry {
    fn from_message(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            attachments: message.attachments.clone(),
            live: false,
        }
    }
}

/// What the chat view shows: persisted turns plus at most one live reply
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    live: Option<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything with stored history
    pub fn reset(&mut self, messages: &[StoredMessage]) {
        self.entries = messages
            .iter()
            .map(|stored| TranscriptEntry::from_message(&stored.message))
            .collect();
        self.live = None;
    }

    pub fn render_message(&mut self, message: &Message) {
        self.entries.push(TranscriptEntry::from_message(message));
    }

    /// Shows `text` as the in-flight reply, creating the live entry on first use
    pub fn render_streaming_delta(&mut self, text: &str) {
        if let Some(entry) = self.live.and_then(|index| self.entries.get_mut(index)) {
            entry.content.clear();
            entry.content.push_str(text);
            return;
        }
        self.entries.push(TranscriptEntry {
            role: Role::Assistant,
            content: text.to_string(),
            attachments: Vec::new(),
            live: true,
        });
        self.live = Some(self.entries.len() - 1);
    }

    /// Freezes the live reply as `text`; appends it if nothing streamed
    pub fn finalize(&mut self, text: &str) {
        match self.live.take().and_then(|index| self.entries.get_mut(index)) {
            Some(entry) => {
                entry.content.clear();
                entry.content.push_str(text);
                entry.live = false;
            }
            None => self.render_message(&Message::assistant(text)),
        }
    }

    /// Drops the live reply of a failed send
    pub fn discard_live(&mut self) {
        if let Some(index) = self.live.take()
            && index < self.entries.len()
        {
            self.entries.remove(index);
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn has_live_entry(&self) -> bool {
        self.live.is_some()
    }

    #[must_use]
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.role == Role::Assistant && !entry.live)
            .map(|entry| entry.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_updates_a_single_live_entry() {
        let mut transcript = Transcript::new();
        transcript.render_message(&Message::user("Hello", Vec::new()));

        transcript.render_streaming_delta("Hi");
        transcript.render_streaming_delta("Hi there");

        assert_eq!(transcript.entries().len(), 2);
        assert!(transcript.has_live_entry());
        assert_eq!(transcript.entries()[1].content, "Hi there");
        assert_eq!(transcript.last_assistant_text(), None);

        transcript.finalize("Hi there");
        assert!(!transcript.has_live_entry());
        assert!(!transcript.entries()[1].live);
        assert_eq!(transcript.last_assistant_text(), Some("Hi there"));
    }

    #[test]
    fn next_reply_gets_a_fresh_live_entry() {
        let mut transcript = Transcript::new();
        transcript.render_streaming_delta("first");
        transcript.finalize("first");
        transcript.render_streaming_delta("second");

        let contents: Vec<&str> = transcript.entries().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn empty_reply_is_still_shown_on_finalize() {
        let mut transcript = Transcript::new();
        transcript.finalize("");
        assert_eq!(transcript.entries().len(), 1);
        assert_eq!(transcript.entries()[0].role, Role::Assistant);
    }

    #[test]
    fn discard_live_removes_partial_reply() {
        let mut transcript = Transcript::new();
        transcript.render_message(&Message::user("Hello", Vec::new()));
        transcript.render_streaming_delta("par");
        transcript.discard_live();
        assert_eq!(transcript.entries().len(), 1);
        assert!(!transcript.has_live_entry());
    }

    #[test]
    fn reset_replaces_entries_and_drops_live_reply() {
        let mut transcript = Transcript::new();
        transcript.render_streaming_delta("stale");
        let stored = vec![StoredMessage {
            id: 1,
            message: Message::user("kept", vec![Attachment::text("a.txt", "a")]),
        }];

        transcript.reset(&stored);

        assert_eq!(transcript.entries().len(), 1);
        assert_eq!(transcript.entries()[0].attachments.len(), 1);
        assert!(!transcript.has_live_entry());
        transcript.reset(&[]);
        assert!(transcript.is_empty());
    }
}
