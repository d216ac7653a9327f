use crate::app::{App, AppMode, TextInput};
use crate::services::attachments;

impl App {
    /// Opens the settings popup prefilled with the stored API URL
    pub fn open_settings(&mut self) {
        let api_url = self.session.config().api_url.unwrap_or_default();
        self.settings_input = TextInput::with_content(api_url);
        self.mode = AppMode::Settings;
    }

    pub fn close_settings(&mut self) {
        self.settings_input.clear();
        self.mode = AppMode::Chat;
    }

    /// Saves the API URL and refetches models; an empty URL keeps the popup open
    pub fn save_settings(&mut self) {
        match self.session.save_api_url(self.settings_input.content()) {
            Ok(_) => {
                self.close_settings();
                self.show_status_toast("SETTINGS SAVED");
                self.refresh_models();
            }
            Err(error) => self.push_alert(error.to_string()),
        }
    }

    pub fn open_attach_input(&mut self) {
        self.attach_input.clear();
        self.mode = AppMode::AttachInput;
    }

    pub fn close_attach_input(&mut self) {
        self.attach_input.clear();
        self.mode = AppMode::Chat;
    }

    /// Stages the typed path; an unreadable path keeps the popup open
    pub fn submit_attach_input(&mut self) {
        let typed = self.attach_input.content().trim().to_string();
        if typed.is_empty() {
            self.close_attach_input();
            return;
        }
        let Some(path) = attachments::parse_attachment_path(&typed) else {
            self.push_alert(format!("File not found: {typed}"));
            return;
        };
        if self.stage_file(&path) {
            self.close_attach_input();
        }
    }
}
