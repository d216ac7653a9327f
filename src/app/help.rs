use crate::app::{App, AppMode};

/// Shortcut reference shown by the help popup
pub const SHORTCUTS: &[(&str, &str)] = &[
    ("Enter", "Send message"),
    ("/", "Command menu"),
    ("Ctrl+O", "Attach a file"),
    ("Ctrl+V", "Attach clipboard image"),
    ("Ctrl+S", "Server settings"),
    ("Ctrl+E", "Export history"),
    ("Ctrl+L", "Clear history"),
    ("Ctrl+T", "Toggle theme"),
    ("Ctrl+Y", "Copy last reply"),
    ("PgUp/PgDn", "Scroll transcript"),
    ("Backspace", "Remove last attachment when the prompt is empty"),
    ("?", "This help"),
    ("Ctrl+C", "Quit"),
];

impl App {
    pub fn open_help(&mut self) {
        self.previous_mode = Some(self.mode);
        self.mode = AppMode::Help;
    }

    pub fn close_help(&mut self) {
        self.mode = match self.previous_mode.take() {
            Some(AppMode::Help) | None => AppMode::Chat,
            Some(mode) => mode,
        };
    }
}
