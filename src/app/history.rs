use crate::app::{App, AppMode, ConfirmChoice};
use std::path::PathBuf;

impl App {
    pub fn export_history(&mut self) {
        let dir = default_export_dir();
        match self.session.export_history(&dir) {
            Ok(path) => {
                let name = path.file_name().map_or_else(
                    || path.display().to_string(),
                    |name| name.to_string_lossy().into_owned(),
                );
                self.show_status_toast(format!("EXPORTED {name}"));
            }
            Err(error) => {
                tracing::error!(%error, dir = %dir.display(), "export failed");
                self.push_alert(format!("Export failed: {error}"));
            }
        }
    }

    pub fn open_clear_confirmation(&mut self) {
        self.confirm_choice = ConfirmChoice::Cancel;
        self.mode = AppMode::ConfirmClear;
    }

    pub fn toggle_confirm_choice(&mut self) {
        self.confirm_choice = self.confirm_choice.toggled();
    }

    pub fn submit_confirm_clear(&mut self) {
        match self.confirm_choice {
            ConfirmChoice::Delete => self.confirm_clear(),
            ConfirmChoice::Cancel => self.cancel_clear(),
        }
    }

    /// Deletes stored history and empties the transcript
    pub fn confirm_clear(&mut self) {
        self.mode = AppMode::Chat;
        self.confirm_choice = ConfirmChoice::Cancel;
        match self.session.clear_history() {
            Ok(()) => {
                self.reload_transcript();
                self.show_status_toast("HISTORY CLEARED");
            }
            Err(error) => self.push_alert(format!("Could not clear history: {error}")),
        }
    }

    pub fn cancel_clear(&mut self) {
        self.mode = AppMode::Chat;
        self.confirm_choice = ConfirmChoice::Cancel;
    }
}

/// Download folder, else the working directory
pub fn default_export_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(PathBuf::from))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::ScriptedTransport;
    use crate::app::tests::{pump_until, test_app};
    use crate::app::{AppMode, ConfirmChoice};

    #[test]
    fn cancel_is_the_default_and_keeps_history() {
        let mut t = test_app(
            Some("http://localhost:1234"),
            ScriptedTransport::replying(&["Hi"]),
        );
        t.app.chat_input.set_content("Hello");
        t.app.send_chat_message();
        pump_until(&mut t.app, |app| !app.is_streaming());

        t.app.open_clear_confirmation();
        assert_eq!(t.app.mode, AppMode::ConfirmClear);
        assert_eq!(t.app.confirm_choice, ConfirmChoice::Cancel);
        t.app.submit_confirm_clear();

        assert_eq!(t.app.mode, AppMode::Chat);
        assert_eq!(t.app.session.messages().unwrap().len(), 2);
        assert_eq!(t.app.transcript.entries().len(), 2);
    }

    #[test]
    fn confirmed_clear_empties_history_and_transcript() {
        let mut t = test_app(
            Some("http://localhost:1234"),
            ScriptedTransport::replying(&["Hi"]),
        );
        t.app.chat_input.set_content("Hello");
        t.app.send_chat_message();
        pump_until(&mut t.app, |app| !app.is_streaming());

        t.app.open_clear_confirmation();
        t.app.toggle_confirm_choice();
        t.app.submit_confirm_clear();

        assert!(t.app.session.messages().unwrap().is_empty());
        assert!(t.app.transcript.is_empty());
        assert_eq!(t.app.status_toast_message(), Some("HISTORY CLEARED"));
    }
}
