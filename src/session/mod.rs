mod staging;

pub use staging::ContextStaging;

use color_eyre::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::api::{
    ChatCompletionRequest, CompletionTransport, StreamEvent, build_request, stream_completion,
};
use crate::config::{AppDirs, Config, ConfigStore, Theme};
use crate::services::WakeLockManager;
use crate::storage::{Attachment, HistoryStore, Message, StoredMessage};

pub const MISSING_API_URL_MESSAGE: &str = "Please configure the LM Studio URL first (Ctrl+S).";
pub const EMPTY_API_URL_MESSAGE: &str = "API URL cannot be empty.";

/// Where the current send is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPhase {
    Idle,
    BuildingRequest,
    Streaming,
    Finalizing,
    Error,
}

impl SendPhase {
    /// A new send may start from here
    #[must_use]
    pub fn accepts_send(self) -> bool {
        matches!(self, SendPhase::Idle | SendPhase::Error)
    }
}

/// Why a send did not complete
#[derive(Debug, Error)]
pub enum SendError {
    #[error("Please configure the LM Studio URL first (Ctrl+S).")]
    MissingApiUrl,

    #[error("Still streaming the previous reply.")]
    Busy,

    #[error("API error: {0}")]
    Transport(String),

    #[error("Could not save the conversation: {0}")]
    Storage(String),
}

/// A send abandoned mid-stream
#[derive(Debug)]
pub struct FailedSend {
    pub error: SendError,
    /// Attachments put back into staging
    pub restored_attachments: usize,
}

/// Everything a worker needs to stream one reply without touching the session
pub struct PreparedSend {
    transport: Arc<dyn CompletionTransport>,
    base_url: String,
    pub request: ChatCompletionRequest,
    pub user_message: StoredMessage,
}

impl PreparedSend {
    /// Streams the reply to the end; blocks the calling thread
    pub fn stream(&self, on_event: impl FnMut(StreamEvent)) -> Result<String> {
        stream_completion(
            self.transport.as_ref(),
            &self.base_url,
            &self.request,
            on_event,
        )
    }
}

/// Both halves of a completed exchange
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user: StoredMessage,
    pub assistant: StoredMessage,
}

/// Owns the stores, staged context, transport and wake lock of one chat
pub struct ChatSession {
    runtime: tokio::runtime::Runtime,
    config: ConfigStore,
    history: HistoryStore,
    staging: ContextStaging,
    transport: Arc<dyn CompletionTransport>,
    wake_lock: WakeLockManager,
    phase: SendPhase,
    in_flight: Option<Vec<Attachment>>,
}

impl ChatSession {
    /// Opens the on-disk stores under `dirs`
    pub fn open(dirs: &AppDirs, transport: Arc<dyn CompletionTransport>) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let history = runtime.block_on(HistoryStore::open(dirs.history_db()))?;
        Ok(Self::from_parts(
            runtime,
            ConfigStore::open(dirs),
            history,
            transport,
            WakeLockManager::new(),
        ))
    }

    pub fn from_parts(
        runtime: tokio::runtime::Runtime,
        config: ConfigStore,
        history: HistoryStore,
        transport: Arc<dyn CompletionTransport>,
        wake_lock: WakeLockManager,
    ) -> Self {
        Self {
            runtime,
            config,
            history,
            staging: ContextStaging::new(),
            transport,
            wake_lock,
            phase: SendPhase::Idle,
            in_flight: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SendPhase {
        self.phase
    }

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        !self.phase.accepts_send()
    }

    #[must_use]
    pub fn transport(&self) -> Arc<dyn CompletionTransport> {
        Arc::clone(&self.transport)
    }

    // -- Send lifecycle --

    /// Validates config, snapshots staging, persists the user turn and builds the request
    ///
    /// On success the session is streaming until [`finish_send`](Self::finish_send)
    /// or [`fail_send`](Self::fail_send) is called.
    pub fn begin_send(&mut self, text: &str) -> std::result::Result<PreparedSend, SendError> {
        if !self.phase.accepts_send() {
            tracing::debug!(phase = ?self.phase, "send rejected while busy");
            return Err(SendError::Busy);
        }

        let config = self.config.load();
        let Some(base_url) = config.base_url().map(str::to_string) else {
            tracing::warn!("send attempted without an API URL");
            return Err(SendError::MissingApiUrl);
        };

        self.phase = SendPhase::BuildingRequest;
        self.wake_lock.acquire();

        let attachments = self.staging.snapshot_and_clear();
        let request = build_request(text, &attachments, config.selected_model());
        let user = Message::user(text, attachments.clone());

        let user_message = match self.runtime.block_on(self.history.append(user)) {
            Ok(stored) => stored,
            Err(error) => {
                tracing::error!(%error, "failed to persist user message");
                self.staging.restore(attachments);
                self.enter_error();
                return Err(SendError::Storage(format!("{error:#}")));
            }
        };

        tracing::info!(
            id = user_message.id,
            attachments = attachments.len(),
            model = config.selected_model().unwrap_or("<server default>"),
            "sending prompt"
        );
        self.in_flight = Some(attachments);
        self.phase = SendPhase::Streaming;

        Ok(PreparedSend {
            transport: Arc::clone(&self.transport),
            base_url,
            request,
            user_message,
        })
    }

    /// Persists the streamed reply and returns to idle
    pub fn finish_send(&mut self, text: String) -> std::result::Result<StoredMessage, SendError> {
        self.phase = SendPhase::Finalizing;
        self.in_flight = None;

        match self.runtime.block_on(self.history.append(Message::assistant(text))) {
            Ok(stored) => {
                tracing::info!(
                    id = stored.id,
                    chars = stored.message.content.len(),
                    "reply stored"
                );
                self.wake_lock.release();
                self.phase = SendPhase::Idle;
                Ok(stored)
            }
            Err(error) => {
                tracing::error!(%error, "failed to persist assistant reply");
                self.enter_error();
                Err(SendError::Storage(format!("{error:#}")))
            }
        }
    }

    /// Abandons the in-flight send; its attachments go back to staging
    pub fn fail_send(&mut self, error: &color_eyre::Report) -> FailedSend {
        tracing::error!(error = %format!("{error:#}"), "send failed");
        let restored = self.in_flight.take().unwrap_or_default();
        let restored_attachments = restored.len();
        if restored_attachments > 0 {
            self.staging.restore(restored);
        }
        self.enter_error();
        FailedSend {
            error: SendError::Transport(error.to_string()),
            restored_attachments,
        }
    }

    /// Runs a whole send on the current thread
    pub fn send_blocking(
        &mut self,
        text: &str,
        on_event: impl FnMut(StreamEvent),
    ) -> std::result::Result<Exchange, SendError> {
        let prepared = self.begin_send(text)?;
        match prepared.stream(on_event) {
            Ok(reply) => {
                let assistant = self.finish_send(reply)?;
                Ok(Exchange {
                    user: prepared.user_message,
                    assistant,
                })
            }
            Err(error) => Err(self.fail_send(&error).error),
        }
    }

    fn enter_error(&mut self) {
        self.wake_lock.release();
        self.phase = SendPhase::Error;
    }

    /// Takes the wake lock back if it was lost mid-send
    pub fn reacquire_wake_lock(&mut self) {
        if self.phase == SendPhase::Streaming {
            self.wake_lock.reacquire_if_lost();
        }
    }

    pub fn release_wake_lock(&mut self) {
        self.wake_lock.release();
    }

    // -- Staged context --

    #[must_use]
    pub fn staging(&self) -> &ContextStaging {
        &self.staging
    }

    pub fn stage(&mut self, attachment: Attachment) {
        self.staging.add(attachment);
    }

    pub fn unstage_last(&mut self) -> Option<Attachment> {
        self.staging.remove_last()
    }

    // -- History --

    pub fn messages(&self) -> Result<Vec<StoredMessage>> {
        self.runtime.block_on(self.history.all())
    }

    pub fn clear_history(&self) -> Result<()> {
        self.runtime.block_on(self.history.clear())?;
        tracing::info!("history cleared");
        Ok(())
    }

    pub fn export_history(&self, dir: &Path) -> Result<PathBuf> {
        self.runtime.block_on(self.history.export(dir))
    }

    // -- Settings --

    #[must_use]
    pub fn config(&self) -> Config {
        self.config.load()
    }

    /// Stores a new API URL, keeping the selected model
    pub fn save_api_url(&self, input: &str) -> Result<Config> {
        let api_url = input.trim();
        if api_url.is_empty() {
            return Err(color_eyre::eyre::eyre!(EMPTY_API_URL_MESSAGE));
        }
        let config = self
            .config
            .update(|config| config.api_url = Some(api_url.to_string()))?;
        tracing::info!(api_url, "API URL saved");
        Ok(config)
    }

    /// Stores the chosen model; `None` lets the server pick
    pub fn select_model(&self, model: Option<&str>) -> Result<Config> {
        let model = model.filter(|model| !model.is_empty()).map(str::to_string);
        self.config.update(|config| config.model = model)
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.config.load_theme()
    }

    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        self.config.save_theme(theme)
    }
}
