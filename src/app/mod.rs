mod chat;
mod command;
mod help;
mod history;
mod models;
mod scroll;
mod settings;
#[path = "text-input.rs"]
mod text_input;
mod transcript;
mod types;

pub use help::SHORTCUTS;
pub use history::default_export_dir;
pub use text_input::TextInput;
pub use transcript::{Transcript, TranscriptEntry};
pub use types::*;

use crate::api::{ModelDirectory, StreamEvent};
use crate::config::Theme;
use crate::services::ClipboardService;
use crate::session::ChatSession;
use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

/// Application mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Chat,
    CommandMenu,
    Settings,
    ModelSelection,
    AttachInput,
    ConfirmClear,
    Help,
}

/// Results coming back from worker threads
pub enum AppEvent {
    Stream(StreamEvent),
    StreamFinished(color_eyre::Result<String>),
    ModelsLoaded {
        listing: color_eyre::Result<Vec<String>>,
        selected_model: Option<String>,
    },
}

/// Main application state
pub struct App {
    pub mode: AppMode,
    pub previous_mode: Option<AppMode>,
    pub should_quit: bool,
    pub session: ChatSession,
    pub transcript: Transcript,
    pub models: ModelDirectory,
    pub models_loading: bool,
    pub theme: Theme,

    pub chat_input: TextInput,
    pub chat_scroll_offset: usize,
    pub chat_auto_scroll: bool,
    /// Largest offset the transcript allowed at the last draw
    pub chat_scroll_limit: Cell<usize>,

    // Command menu
    pub input: String,
    pub selected_index: usize,

    pub settings_input: TextInput,
    pub attach_input: TextInput,
    pub model_selection_index: usize,
    pub confirm_choice: ConfirmChoice,

    pub alerts: VecDeque<String>,
    pub status_toast: Option<StatusToast>,
    pub clipboard_service: ClipboardService,
    pub loading_frame: u8,
    pub last_loading_tick: Option<Instant>,

    event_tx: Sender<AppEvent>,
    event_rx: Receiver<AppEvent>,
}

impl App {
    pub fn new(session: ChatSession) -> Self {
        let (event_tx, event_rx) = channel();
        let theme = session.theme();
        Self {
            mode: AppMode::Chat,
            previous_mode: None,
            should_quit: false,
            session,
            transcript: Transcript::new(),
            models: ModelDirectory::new(),
            models_loading: false,
            theme,
            chat_input: TextInput::new(),
            chat_scroll_offset: 0,
            chat_auto_scroll: true,
            chat_scroll_limit: Cell::new(0),
            input: String::new(),
            selected_index: 0,
            settings_input: TextInput::new(),
            attach_input: TextInput::new(),
            model_selection_index: 0,
            confirm_choice: ConfirmChoice::default(),
            alerts: VecDeque::new(),
            status_toast: None,
            clipboard_service: ClipboardService::new(),
            loading_frame: 0,
            last_loading_tick: None,
            event_tx,
            event_rx,
        }
    }

    /// Loads stored history into the transcript and starts the first model fetch
    pub fn init(&mut self) {
        self.reload_transcript();
        self.refresh_models();
    }

    pub(crate) fn reload_transcript(&mut self) {
        match self.session.messages() {
            Ok(messages) => {
                tracing::debug!(count = messages.len(), "history loaded");
                self.transcript.reset(&messages);
                self.reset_chat_scroll();
            }
            Err(error) => {
                tracing::error!(%error, "failed to load history");
                self.push_alert(format!("Could not load history: {error}"));
            }
        }
    }

    /// Drains worker results; call once per tick
    pub fn check_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::Stream(event) => self.apply_stream_event(event),
                AppEvent::StreamFinished(result) => self.apply_stream_result(result),
                AppEvent::ModelsLoaded {
                    listing,
                    selected_model,
                } => self.apply_model_listing(listing, selected_model.as_deref()),
            }
        }
    }

    pub(crate) fn event_sender(&self) -> Sender<AppEvent> {
        self.event_tx.clone()
    }

    /// Queues a modal alert; alerts are shown one at a time in arrival order
    pub fn push_alert(&mut self, message: impl Into<String>) {
        self.alerts.push_back(message.into());
    }

    #[must_use]
    pub fn current_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }

    pub fn show_status_toast(&mut self, message: impl Into<String>) {
        self.status_toast = Some(StatusToast::new(message));
    }

    pub fn clear_expired_status_toast(&mut self) {
        let should_clear = self
            .status_toast
            .as_ref()
            .is_some_and(|toast| toast.is_expired(Duration::from_secs(3)));
        if should_clear {
            self.status_toast = None;
        }
    }

    #[must_use]
    pub fn status_toast_message(&self) -> Option<&str> {
        self.status_toast.as_ref().map(|toast| toast.message.as_str())
    }

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.session.is_streaming()
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Err(error) = self.session.save_theme(self.theme) {
            tracing::warn!(%error, "failed to persist theme");
        }
        self.show_status_toast(match self.theme {
            Theme::Light => "LIGHT",
            Theme::Dark => "DARK",
        });
    }

    pub fn on_focus_gained(&mut self) {
        self.session.reacquire_wake_lock();
    }

    pub fn shutdown(&mut self) {
        self.session.release_wake_lock();
    }
}
