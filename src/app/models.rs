use crate::app::{App, AppEvent, AppMode};
use std::thread;

impl App {
    pub fn open_model_selection(&mut self) {
        if !self.models.is_loaded() {
            self.refresh_models();
        }
        self.model_selection_index = self.models.selected_index();
        self.mode = AppMode::ModelSelection;
    }

    pub fn close_model_selection(&mut self) {
        self.mode = AppMode::Chat;
    }

    pub fn next_model(&mut self) {
        let count = self.models.entries().len();
        if count > 0 {
            self.model_selection_index = (self.model_selection_index + 1) % count;
        }
    }

    pub fn previous_model(&mut self) {
        let count = self.models.entries().len();
        if count > 0 {
            self.model_selection_index = self
                .model_selection_index
                .checked_sub(1)
                .unwrap_or(count - 1);
        }
    }

    /// Persists the highlighted model; the placeholder clears the choice
    pub fn select_model_entry(&mut self) {
        let model = self
            .models
            .select(self.model_selection_index)
            .map(str::to_string);
        self.mode = AppMode::Chat;

        match self.session.select_model(model.as_deref()) {
            Ok(_) => {
                tracing::info!(
                    model = model.as_deref().unwrap_or("default"),
                    "model selected"
                );
                self.show_status_toast(model.map_or_else(
                    || "SERVER DEFAULT MODEL".to_string(),
                    |model| format!("MODEL {model}"),
                ));
            }
            Err(error) => self.push_alert(format!("Could not save the model: {error}")),
        }
    }

    /// Lists models on a worker thread; without an API URL nothing happens
    pub fn refresh_models(&mut self) {
        let config = self.session.config();
        let Some(base_url) = config.base_url().map(str::to_string) else {
            return;
        };
        let selected_model = config.selected_model().map(str::to_string);
        let transport = self.session.transport();
        let tx = self.event_sender();

        self.models_loading = true;
        thread::spawn(move || {
            let listing = transport.list_models(&base_url);
            let _ = tx.send(AppEvent::ModelsLoaded {
                listing,
                selected_model,
            });
        });
    }

    pub(crate) fn apply_model_listing(
        &mut self,
        listing: color_eyre::Result<Vec<String>>,
        selected_model: Option<&str>,
    ) {
        self.models_loading = false;
        if self.models.apply_listing(listing, selected_model) {
            self.model_selection_index = self.models.selected_index();
        }
    }
}
