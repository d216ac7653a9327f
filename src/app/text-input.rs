/// Single-line editable text with a cursor
///
/// The cursor is a byte offset that always sits on a character boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    content: String,
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an input holding `content` with the cursor at the end
    pub fn with_content(content: impl Into<String>) -> Self {
        let content = content.into();
        let cursor = content.len();
        Self { content, cursor }
    }

    pub fn insert_char(&mut self, character: char) {
        self.content.insert(self.cursor, character);
        self.cursor += character.len_utf8();
    }

    /// Inserts pasted text; line breaks become spaces
    pub fn insert_str(&mut self, text: &str) {
        let flattened: String = text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        self.content.insert_str(self.cursor, &flattened);
        self.cursor += flattened.len();
    }

    /// Backspace
    pub fn delete_before(&mut self) {
        if let Some(previous) = self.previous_boundary() {
            self.content.replace_range(previous..self.cursor, "");
            self.cursor = previous;
        }
    }

    /// Delete
    pub fn delete_after(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.content.replace_range(self.cursor..next, "");
        }
    }

    /// Ctrl+W: removes the word left of the cursor and the spaces after it
    pub fn delete_word_before(&mut self) {
        let before = self.content.get(..self.cursor).unwrap_or_default();
        let trimmed = before.trim_end();
        let start = trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map_or(0, |(index, c)| index + c.len_utf8());
        self.content.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    pub fn move_left(&mut self) {
        if let Some(previous) = self.previous_boundary() {
            self.cursor = previous;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.len();
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Cursor position counted in characters
    #[must_use]
    pub fn cursor_position(&self) -> usize {
        self.content
            .get(..self.cursor)
            .map_or(0, |before| before.chars().count())
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cursor = self.content.len();
    }

    fn previous_boundary(&self) -> Option<usize> {
        self.content
            .get(..self.cursor)?
            .char_indices()
            .next_back()
            .map(|(index, _)| index)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.content
            .get(self.cursor..)?
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_happen_at_the_cursor() {
        let mut input = TextInput::with_content("helo");
        input.move_left();
        input.insert_char('l');
        assert_eq!(input.content(), "hello");
        assert_eq!(input.cursor_position(), 4);

        input.move_home();
        input.delete_after();
        input.insert_char('J');
        assert_eq!(input.content(), "Jello");
    }

    #[test]
    fn multibyte_characters_are_handled_whole() {
        let mut input = TextInput::new();
        for c in "añ🦀".chars() {
            input.insert_char(c);
        }
        assert_eq!(input.cursor_position(), 3);
        input.delete_before();
        assert_eq!(input.content(), "añ");
        input.move_left();
        input.delete_before();
        assert_eq!(input.content(), "ñ");
        input.move_right();
        input.move_right();
        assert_eq!(input.cursor_position(), 1);
    }

    #[test]
    fn delete_word_before_removes_last_word() {
        let mut input = TextInput::with_content("explain this  ");
        input.delete_word_before();
        assert_eq!(input.content(), "explain ");
        input.delete_word_before();
        assert_eq!(input.content(), "");
        input.delete_word_before();
        assert!(input.is_empty());
    }

    #[test]
    fn pasted_newlines_become_spaces() {
        let mut input = TextInput::with_content("a");
        input.insert_str("b\r\nc");
        assert_eq!(input.content(), "ab  c");
        input.clear();
        assert!(input.is_empty());
        assert_eq!(input.cursor_position(), 0);
    }
}
