use std::time::{Duration, Instant};

/// Entry in the command palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub name: &'static str,
    pub description: &'static str,
}

impl MenuItem {
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self { name, description }
    }
}

#[derive(Debug, Clone)]
pub struct StatusToast {
    pub message: String,
    pub created_at: Instant,
}

impl StatusToast {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            created_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn is_expired(&self, duration: Duration) -> bool {
        self.created_at.elapsed() >= duration
    }
}

/// Which button of the clear-history confirmation is focused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmChoice {
    #[default]
    Cancel,
    Delete,
}

impl ConfirmChoice {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            ConfirmChoice::Cancel => ConfirmChoice::Delete,
            ConfirmChoice::Delete => ConfirmChoice::Cancel,
        }
    }
}
