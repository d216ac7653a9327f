use color_eyre::Result;

use super::CompletionTransport;
use crate::config::Config;

pub const PLACEHOLDER_LABEL: &str = "-- select model --";

/// One row of the model selector; the placeholder has an empty id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub id: String,
    pub label: String,
}

impl ModelEntry {
    fn placeholder() -> Self {
        Self {
            id: String::new(),
            label: PLACEHOLDER_LABEL.to_string(),
        }
    }

    fn model(id: String) -> Self {
        Self {
            label: id.clone(),
            id,
        }
    }
}

/// Models offered by the configured server, plus the current selection
#[derive(Debug, Clone)]
pub struct ModelDirectory {
    entries: Vec<ModelEntry>,
    selected: usize,
    loaded: bool,
}

impl Default for ModelDirectory {
    fn default() -> Self {
        Self {
            entries: vec![ModelEntry::placeholder()],
            selected: 0,
            loaded: false,
        }
    }
}

impl ModelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Whether at least one listing has been applied
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Selected model id, `None` for the placeholder
    #[must_use]
    pub fn selected_model_id(&self) -> Option<&str> {
        self.entries
            .get(self.selected)
            .map(|entry| entry.id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// Moves the selection; out-of-range indices are ignored
    pub fn select(&mut self, index: usize) -> Option<&str> {
        if index < self.entries.len() {
            self.selected = index;
        }
        self.selected_model_id()
    }

    /// Points the selection at `model`, or at the placeholder if it is not listed
    pub fn follow(&mut self, model: Option<&str>) {
        self.selected = model
            .and_then(|model| {
                self.entries
                    .iter()
                    .position(|entry| !entry.id.is_empty() && entry.id == model)
            })
            .unwrap_or(0);
    }

    /// Replaces the entries with a fresh listing; a failed listing keeps the prior state
    pub fn apply_listing(
        &mut self,
        listing: Result<Vec<String>>,
        selected_model: Option<&str>,
    ) -> bool {
        let ids = match listing {
            Ok(ids) => ids,
            Err(error) => {
                tracing::warn!(%error, "failed to load models");
                return false;
            }
        };

        tracing::debug!(count = ids.len(), "model list loaded");
        self.entries = std::iter::once(ModelEntry::placeholder())
            .chain(ids.into_iter().map(ModelEntry::model))
            .collect();
        self.loaded = true;
        self.follow(selected_model);
        true
    }

    /// Fetches the listing for `config`; without an API URL nothing happens
    pub fn refresh(&mut self, config: &Config, transport: &dyn CompletionTransport) -> bool {
        let Some(base_url) = config.base_url() else {
            return false;
        };
        self.apply_listing(transport.list_models(base_url), config.selected_model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{ScriptedTransport, StreamScript};

    fn configured(model: Option<&str>) -> Config {
        Config {
            api_url: Some("http://localhost:1234/".to_string()),
            model: model.map(str::to_string),
        }
    }

    fn transport() -> ScriptedTransport {
        ScriptedTransport::new(StreamScript::Body(Vec::new()))
    }

    #[test]
    fn starts_with_only_the_placeholder() {
        let directory = ModelDirectory::new();
        assert_eq!(directory.entries().len(), 1);
        assert_eq!(directory.entries()[0].label, PLACEHOLDER_LABEL);
        assert_eq!(directory.selected_model_id(), None);
        assert!(!directory.is_loaded());
    }

    #[test]
    fn refresh_lists_models_and_follows_config() {
        let transport = transport().with_models(&["llama-3.2-1b", "qwen2.5-7b"]);
        let mut directory = ModelDirectory::new();

        let config = configured(Some("qwen2.5-7b"));
        assert!(directory.refresh(&config, &transport));

        let ids: Vec<&str> = directory.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["", "llama-3.2-1b", "qwen2.5-7b"]);
        assert_eq!(directory.selected_index(), 2);
        assert_eq!(directory.selected_model_id(), Some("qwen2.5-7b"));
    }

    #[test]
    fn unknown_configured_model_selects_placeholder() {
        let transport = transport().with_models(&["llama-3.2-1b"]);
        let mut directory = ModelDirectory::new();
        directory.refresh(&configured(Some("gone-model")), &transport);
        assert_eq!(directory.selected_index(), 0);
        assert_eq!(directory.selected_model_id(), None);
    }

    #[test]
    fn failed_refresh_keeps_prior_entries() {
        let mut directory = ModelDirectory::new();
        directory.refresh(
            &configured(Some("a")),
            &transport().with_models(&["a", "b"]),
        );

        let failing = transport().with_model_error("connection refused");
        assert!(!directory.refresh(&configured(None), &failing));

        assert_eq!(directory.entries().len(), 3);
        assert_eq!(directory.selected_model_id(), Some("a"));
    }

    #[test]
    fn refresh_without_api_url_does_nothing() {
        let transport = transport().with_models(&["a"]);
        let mut directory = ModelDirectory::new();
        assert!(!directory.refresh(&Config::default(), &transport));
        assert_eq!(directory.entries().len(), 1);
    }

    #[test]
    fn select_ignores_out_of_range_index() {
        let mut directory = ModelDirectory::new();
        directory.apply_listing(Ok(vec!["a".to_string()]), None);
        assert_eq!(directory.select(1), Some("a"));
        assert_eq!(directory.select(9), Some("a"));
        assert_eq!(directory.select(0), None);
    }
}
