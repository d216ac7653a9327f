use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use super::components;
use super::theme::Palette;
use super::utils::popup_rect;
use crate::app::App;

pub fn render_model_selection(f: &mut Frame, app: &App, palette: &Palette) {
    let entries = app.models.entries();
    let rows = u16::try_from(entries.len()).unwrap_or(u16::MAX).min(16);
    let area = popup_rect(50, 40, rows.saturating_add(4), f.area());
    let inner = components::render_popup_frame(f, area, "Model", palette);
    let rows = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]);
    let [list_area, hint] = rows.areas(inner);

    let current = app.models.selected_index();
    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let is_highlighted = index == app.model_selection_index;
            let pointer = if is_highlighted { " > " } else { "   " };
            let marker = if index == current { "● " } else { "  " };
            let style = if entry.id.is_empty() {
                palette.muted_style()
            } else {
                palette.selected_style(is_highlighted)
            };
            ListItem::new(Line::from(vec![
                Span::styled(pointer, palette.muted_style()),
                Span::styled(marker, ratatui::style::Style::default().fg(palette.accent)),
                Span::styled(entry.label.clone(), style),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.model_selection_index));
    f.render_stateful_widget(List::new(items), list_area, &mut state);

    let status = if app.models_loading {
        " loading models..."
    } else if !app.models.is_loaded() {
        " no models loaded, check the server URL (Ctrl+S)"
    } else {
        " Enter select  Esc close"
    };
    let status = Paragraph::new(Span::styled(status, palette.muted_style()));
    f.render_widget(status, hint);
}
