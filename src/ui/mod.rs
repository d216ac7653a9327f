mod chat;
mod components;
mod confirm;
mod help;
mod menu;
mod models;
mod settings;
mod theme;
mod utils;

pub use chat::chat_layout;

use theme::Palette;

use crate::app::{App, AppMode};
use ratatui::Frame;

pub fn render(f: &mut Frame, app: &App) {
    let palette = Palette::for_theme(app.theme);

    // Popups are drawn over the chat view
    chat::render_chat_view(f, app, &palette);
    match app.mode {
        AppMode::Chat => {}
        AppMode::CommandMenu => menu::render_command_menu(f, app, &palette),
        AppMode::Settings => settings::render_settings(f, app, &palette),
        AppMode::AttachInput => settings::render_attach_input(f, app, &palette),
        AppMode::ModelSelection => models::render_model_selection(f, app, &palette),
        AppMode::ConfirmClear => confirm::render_clear_confirmation(f, app, &palette),
        AppMode::Help => help::render_help_view(f, &palette),
    }

    if let Some(message) = app.current_alert() {
        confirm::render_alert(f, message, app.alerts.len(), &palette);
    }
}
