use crate::app::{App, AppMode, MenuItem};

pub const MENU_ITEMS: &[MenuItem] = &[
    MenuItem::new("attach", "Attach a file as context"),
    MenuItem::new("settings", "Set the LM Studio server URL"),
    MenuItem::new("models", "Choose the model"),
    MenuItem::new("export", "Export chat history as JSON"),
    MenuItem::new("clear", "Delete all stored messages"),
    MenuItem::new("theme", "Toggle light and dark theme"),
    MenuItem::new("copy", "Copy the last reply"),
    MenuItem::new("help", "Show keyboard shortcuts"),
    MenuItem::new("quit", "Exit the application"),
];

impl App {
    pub fn open_command_menu(&mut self) {
        self.previous_mode = Some(self.mode);
        self.mode = AppMode::CommandMenu;
        self.input.clear();
        self.selected_index = 0;
    }

    pub fn close_menu(&mut self) {
        self.mode = self.previous_mode.take().unwrap_or(AppMode::Chat);
        self.input.clear();
        self.selected_index = 0;
    }

    pub fn add_input_char(&mut self, character: char) {
        self.input.push(character);
        self.selected_index = 0;
    }

    pub fn remove_input_char(&mut self) {
        self.input.pop();
        self.selected_index = 0;
    }

    /// Menu entries matching the filter, best match first
    #[must_use]
    pub fn filtered_items(&self) -> Vec<MenuItem> {
        filter_menu(MENU_ITEMS, &self.input)
    }

    pub fn next_item(&mut self) {
        let count = self.filtered_items().len();
        if count > 0 {
            self.selected_index = (self.selected_index + 1) % count;
        }
    }

    pub fn previous_item(&mut self) {
        let count = self.filtered_items().len();
        if count > 0 {
            self.selected_index = self.selected_index.checked_sub(1).unwrap_or(count - 1);
        }
    }

    pub fn execute_selected(&mut self) {
        let selected = self.filtered_items().get(self.selected_index).copied();
        match selected {
            Some(item) => self.execute_command(item.name),
            None => self.close_menu(),
        }
    }

    pub fn execute_command(&mut self, command: &str) {
        self.input.clear();
        self.selected_index = 0;
        self.previous_mode = None;
        self.mode = AppMode::Chat;
        tracing::debug!(command, "running command");

        match command {
            "attach" => self.open_attach_input(),
            "settings" => self.open_settings(),
            "models" => self.open_model_selection(),
            "export" => self.export_history(),
            "clear" => self.open_clear_confirmation(),
            "theme" => self.toggle_theme(),
            "copy" => self.copy_last_reply(),
            "help" => self.open_help(),
            "quit" => self.should_quit = true,
            other => self.push_alert(format!("Unknown command: {other}")),
        }
    }
}

/// Ranks `items` against `query`; an empty query keeps the original order
#[must_use]
pub fn filter_menu(items: &[MenuItem], query: &str) -> Vec<MenuItem> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return items.to_vec();
    }

    let mut scored: Vec<(u32, MenuItem)> = items
        .iter()
        .filter_map(|item| {
            let name = match_score(&query, item.name).map(|score| score + 50);
            let description = match_score(&query, item.description);
            name.max(description).map(|score| (score, *item))
        })
        .collect();
    // Stable sort: ties keep menu order
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, item)| item).collect()
}

/// Higher is better; `None` when the query letters do not appear in order
fn match_score(query: &str, candidate: &str) -> Option<u32> {
    let candidate = candidate.to_lowercase();
    if candidate == query {
        return Some(1000);
    }
    if candidate.starts_with(query) {
        return Some(800);
    }
    if candidate
        .split_whitespace()
        .any(|word| word.starts_with(query))
    {
        return Some(700);
    }
    if candidate.contains(query) {
        return Some(600);
    }

    // Subsequence match, penalised by the letters skipped between hits
    let mut gaps = 0u32;
    let mut started = false;
    let mut wanted = query.chars().peekable();
    for c in candidate.chars() {
        match wanted.peek() {
            Some(&next) if next == c => {
                started = true;
                wanted.next();
            }
            Some(_) if started => gaps += 1,
            Some(_) => {}
            None => break,
        }
    }
    if wanted.peek().is_some() {
        return None;
    }
    Some(400u32.saturating_sub(gaps * 10).max(100))
}
