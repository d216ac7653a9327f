use crate::app::App;

/// Lines moved per PageUp/PageDown
const PAGE_LINES: usize = 20;

impl App {
    /// Offsets count lines up from the bottom of the transcript
    pub fn scroll_chat_up_lines(&mut self, lines: usize) {
        self.chat_auto_scroll = false;
        self.chat_scroll_offset = self
            .chat_scroll_offset
            .saturating_add(lines)
            .min(self.chat_scroll_limit.get());
    }

    pub fn scroll_chat_down_lines(&mut self, lines: usize) {
        self.chat_scroll_offset = self
            .chat_scroll_offset
            .min(self.chat_scroll_limit.get())
            .saturating_sub(lines);
        if self.chat_scroll_offset == 0 {
            self.chat_auto_scroll = true;
        }
    }

    pub fn scroll_chat_up_page(&mut self) {
        self.scroll_chat_up_lines(PAGE_LINES);
    }

    pub fn scroll_chat_down_page(&mut self) {
        self.scroll_chat_down_lines(PAGE_LINES);
    }

    pub fn jump_to_top(&mut self) {
        self.chat_auto_scroll = false;
        self.chat_scroll_offset = self.chat_scroll_limit.get();
    }

    pub fn reset_chat_scroll(&mut self) {
        self.chat_scroll_offset = 0;
        self.chat_auto_scroll = true;
    }

    /// Keeps the newest entry in view unless the user scrolled away
    pub(crate) fn follow_latest(&mut self) {
        if self.chat_auto_scroll {
            self.chat_scroll_offset = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::testing::ScriptedTransport;
    use crate::app::tests::test_app;

    #[test]
    fn scrolling_back_down_re_enables_follow() {
        let mut t = test_app(None, ScriptedTransport::replying(&[]));
        t.app.chat_scroll_limit.set(100);
        t.app.scroll_chat_up_lines(3);
        assert!(!t.app.chat_auto_scroll);
        t.app.follow_latest();
        assert_eq!(t.app.chat_scroll_offset, 3);

        t.app.scroll_chat_down_page();
        assert_eq!(t.app.chat_scroll_offset, 0);
        assert!(t.app.chat_auto_scroll);
    }

    #[test]
    fn offsets_stay_within_the_drawn_transcript() {
        let mut t = test_app(None, ScriptedTransport::replying(&[]));
        t.app.chat_scroll_limit.set(30);

        t.app.jump_to_top();
        assert_eq!(t.app.chat_scroll_offset, 30);
        t.app.scroll_chat_down_lines(3);
        assert_eq!(t.app.chat_scroll_offset, 27);
        assert!(!t.app.chat_auto_scroll);

        t.app.scroll_chat_up_page();
        assert_eq!(t.app.chat_scroll_offset, 30);

        // The transcript shrank since the offset was taken
        t.app.chat_scroll_limit.set(10);
        t.app.scroll_chat_down_lines(3);
        assert_eq!(t.app.chat_scroll_offset, 7);
    }
}
