use crate::api::StreamEvent;
use crate::app::{App, AppEvent};
use crate::services::attachments;
use crate::session::SendError;
use std::path::Path;
use std::thread;

impl App {
    /// Sends the prompt in the input box and streams the reply on a worker thread
    pub fn send_chat_message(&mut self) {
        let text = self.chat_input.content().trim().to_string();
        if text.is_empty() {
            return;
        }

        let prepared = match self.session.begin_send(&text) {
            Ok(prepared) => prepared,
            Err(SendError::Busy) => {
                self.show_status_toast("STILL STREAMING");
                return;
            }
            Err(error) => {
                self.push_alert(error.to_string());
                return;
            }
        };

        self.chat_input.clear();
        self.transcript.render_message(&prepared.user_message.message);
        self.reset_chat_scroll();

        let tx = self.event_sender();
        thread::spawn(move || {
            let result = prepared.stream(|event| {
                let _ = tx.send(AppEvent::Stream(event));
            });
            let _ = tx.send(AppEvent::StreamFinished(result));
        });
    }

    pub(crate) fn apply_stream_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Delta { text, .. } => {
                self.transcript.render_streaming_delta(&text);
                self.follow_latest();
            }
            StreamEvent::ServerError { message } => {
                self.push_alert(format!("API error: {message}"));
            }
        }
    }

    pub(crate) fn apply_stream_result(&mut self, result: color_eyre::Result<String>) {
        match result {
            Ok(text) => match self.session.finish_send(text) {
                Ok(stored) => {
                    self.transcript.finalize(&stored.message.content);
                    self.follow_latest();
                }
                Err(error) => {
                    self.transcript.discard_live();
                    self.push_alert(error.to_string());
                }
            },
            Err(error) => {
                let failed = self.session.fail_send(&error);
                self.transcript.discard_live();
                self.push_alert(failed.error.to_string());
                if failed.restored_attachments > 0 {
                    self.show_status_toast("CONTEXT RESTORED");
                }
            }
        }
    }

    /// Stages a file as context for the next message
    pub fn stage_file(&mut self, path: &Path) -> bool {
        match attachments::load_attachment(path) {
            Ok(attachment) => {
                let label = attachments::chip_label(&attachment);
                self.session.stage(attachment);
                self.show_status_toast(format!("ATTACHED {label}"));
                true
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "could not read attachment");
                self.push_alert(format!("Could not read {}: {error}", path.display()));
                false
            }
        }
    }

    /// Pasting a file path attaches the file, anything else is typed
    pub fn handle_chat_paste(&mut self, text: &str) {
        if let Some(path) = attachments::parse_attachment_path(text) {
            self.stage_file(&path);
            return;
        }
        self.chat_input.insert_str(text);
    }

    pub fn handle_chat_clipboard_image(&mut self) {
        match self.clipboard_service.read_image_png() {
            Ok(Some(png)) => {
                let name = format!(
                    "clipboard-{}.png",
                    chrono::Local::now().format("%Y%m%d-%H%M%S")
                );
                self.session.stage(attachments::png_attachment(name, &png));
                self.show_status_toast("IMAGE ADDED");
            }
            Ok(None) => self.show_status_toast("NO IMAGE"),
            Err(error) => {
                tracing::warn!(%error, "clipboard image unavailable");
                self.show_status_toast("NO IMAGE");
            }
        }
    }

    /// Backspace on an empty prompt removes the newest staged attachment
    pub fn remove_chat_input_char(&mut self) {
        if self.chat_input.is_empty() {
            if let Some(removed) = self.session.unstage_last() {
                self.show_status_toast(format!("REMOVED {}", removed.name));
            }
            return;
        }
        self.chat_input.delete_before();
    }

    pub fn copy_last_reply(&mut self) {
        let Some(reply) = self.transcript.last_assistant_text().map(str::to_string) else {
            self.show_status_toast("NOTHING TO COPY");
            return;
        };
        if self.clipboard_service.copy_text(&reply).is_ok() {
            self.show_status_toast("COPIED");
        } else {
            self.show_status_toast("COPY FAILED");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{ScriptedTransport, StreamScript};
    use crate::app::tests::{pump_until, test_app};
    use crate::session::MISSING_API_URL_MESSAGE;
    use crate::storage::{Attachment, Role};

    #[test]
    fn send_without_api_url_alerts_and_keeps_input() {
        let mut t = test_app(None, ScriptedTransport::replying(&["Hi"]));
        t.app.chat_input.set_content("Hello");

        t.app.send_chat_message();

        assert_eq!(t.app.current_alert(), Some(MISSING_API_URL_MESSAGE));
        assert_eq!(t.app.chat_input.content(), "Hello");
        assert!(t.app.transcript.is_empty());
        assert!(t.app.session.messages().unwrap().is_empty());
    }

    #[test]
    fn streamed_reply_lands_in_transcript_and_history() {
        let mut t = test_app(
            Some("http://localhost:1234"),
            ScriptedTransport::replying(&["Hi", " there"]),
        );
        t.app.chat_input.set_content("  Hello ");

        t.app.send_chat_message();
        assert!(t.app.chat_input.is_empty());
        pump_until(&mut t.app, |app| !app.is_streaming());

        let entries = t.app.transcript.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "Hello");
        assert_eq!(entries[1].content, "Hi there");
        assert!(!entries[1].live);

        let roles: Vec<Role> = t
            .app
            .session
            .messages()
            .unwrap()
            .into_iter()
            .map(|stored| stored.message.role)
            .collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn failed_stream_alerts_and_drops_partial_reply() {
        let chunks = vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"par\"}}]}\n".to_string(),
        ];
        let mut t = test_app(
            Some("http://localhost:1234"),
            ScriptedTransport::new(StreamScript::BrokenAfter(chunks)),
        );
        t.app.chat_input.set_content("Hello");

        t.app.send_chat_message();
        pump_until(&mut t.app, |app| !app.is_streaming());

        assert!(t.app.current_alert().unwrap().starts_with("API error: "));
        assert_eq!(t.app.transcript.entries().len(), 1);
        assert_eq!(t.app.session.messages().unwrap().len(), 1);
    }

    #[test]
    fn failed_stream_announces_restored_context() {
        let chunks = vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"par\"}}]}\n".to_string(),
        ];
        let mut t = test_app(
            Some("http://localhost:1234"),
            ScriptedTransport::new(StreamScript::BrokenAfter(chunks)),
        );
        t.app.session.stage(Attachment::text("ctx.txt", "context"));
        t.app.chat_input.set_content("Hello");

        t.app.send_chat_message();
        assert!(t.app.session.staging().is_empty());
        pump_until(&mut t.app, |app| !app.is_streaming());

        assert_eq!(t.app.status_toast_message(), Some("CONTEXT RESTORED"));
        assert_eq!(t.app.session.staging().items()[0].name, "ctx.txt");
    }

    #[test]
    fn failed_stream_without_context_restores_nothing() {
        let mut t = test_app(
            Some("http://localhost:1234"),
            ScriptedTransport::new(StreamScript::Refused("HTTP 500".to_string())),
        );
        t.app.chat_input.set_content("Hello");

        t.app.send_chat_message();
        pump_until(&mut t.app, |app| !app.is_streaming());

        assert_eq!(t.app.current_alert(), Some("API error: HTTP 500"));
        assert_eq!(t.app.status_toast_message(), None);
    }

    #[test]
    fn server_error_mid_stream_alerts_and_reply_still_lands() {
        let chunks = vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n".to_string(),
            "data: {\"error\":{\"message\":\"context overflow\"}}\n".to_string(),
            "data: {\"choices\":[{\"delta\":{\"content\":\" again\"}}]}\n".to_string(),
            "data: [DONE]\n".to_string(),
        ];
        let mut t = test_app(
            Some("http://localhost:1234"),
            ScriptedTransport::new(StreamScript::Body(chunks)),
        );
        t.app.chat_input.set_content("Hello");

        t.app.send_chat_message();
        pump_until(&mut t.app, |app| !app.is_streaming());

        assert_eq!(t.app.current_alert(), Some("API error: context overflow"));
        assert_eq!(t.app.transcript.entries()[1].content, "Hi again");
        let stored = t.app.session.messages().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].message.content, "Hi again");
    }

    #[test]
    fn blank_prompt_is_ignored() {
        let mut t = test_app(
            Some("http://localhost:1234"),
            ScriptedTransport::replying(&["Hi"]),
        );
        t.app.chat_input.set_content("   ");
        t.app.send_chat_message();
        assert!(!t.app.is_streaming());
        assert!(t.app.transcript.is_empty());
    }

    #[test]
    fn pasted_path_stages_file_and_backspace_unstages_it() {
        let mut t = test_app(None, ScriptedTransport::replying(&[]));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctx.txt");
        std::fs::write(&path, "context").unwrap();

        t.app.handle_chat_paste(&path.to_string_lossy());
        assert_eq!(t.app.session.staging().len(), 1);
        assert!(t.app.chat_input.is_empty());

        t.app.handle_chat_paste("plain words");
        assert_eq!(t.app.chat_input.content(), "plain words");

        t.app.chat_input.clear();
        t.app.remove_chat_input_char();
        assert!(t.app.session.staging().is_empty());
    }
}
