use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::Modifier,
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use super::components;
use super::theme::Palette;
use super::utils::popup_rect;
use crate::app::{App, MenuItem};

pub fn render_command_menu(frame: &mut Frame, app: &App, palette: &Palette) {
    let filtered_items = app.filtered_items();
    let height = u16::try_from(filtered_items.len())
        .unwrap_or(u16::MAX)
        .max(1)
        .saturating_add(4);
    let area = popup_rect(50, 44, height, frame.area());
    let inner = components::render_popup_frame(frame, area, "Commands", palette);

    let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]);
    let [search, list] = rows.areas(inner);
    render_search_input(frame, app, search, palette);

    if filtered_items.is_empty() {
        let empty = Paragraph::new(Span::styled(" No matching commands", palette.muted_style()));
        frame.render_widget(empty, list);
        return;
    }
    render_command_list(frame, app, &filtered_items, list, palette);
}

fn render_search_input(
    frame: &mut Frame,
    app: &App,
    area: ratatui::layout::Rect,
    palette: &Palette,
) {
    let cursor = Span::styled(
        "█",
        ratatui::style::Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::SLOW_BLINK),
    );
    let prompt = if app.input.is_empty() {
        Line::from(vec![
            Span::styled(" / ", palette.muted_style()),
            cursor,
            Span::styled(
                "type to filter",
                palette.muted_style().add_modifier(Modifier::ITALIC),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled(" / ", ratatui::style::Style::default().fg(palette.accent)),
            Span::styled(app.input.clone(), palette.text_style()),
            cursor,
        ])
    };
    frame.render_widget(Paragraph::new(prompt), area);
}

fn render_command_list(
    frame: &mut Frame,
    app: &App,
    filtered_items: &[MenuItem],
    area: ratatui::layout::Rect,
    palette: &Palette,
) {
    let name_width = filtered_items
        .iter()
        .map(|item| item.name.len())
        .max()
        .unwrap_or(0);

    let items: Vec<ListItem> = filtered_items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let is_selected = index == app.selected_index;
            let prefix = if is_selected { " > " } else { "   " };
            ListItem::new(Line::from(vec![
                Span::styled(prefix, palette.muted_style()),
                Span::styled(
                    format!("{:<name_width$}", item.name),
                    palette.selected_style(is_selected),
                ),
                Span::styled("  ", palette.muted_style()),
                Span::styled(item.description, palette.muted_style()),
            ]))
        })
        .collect();

    let mut state = ListState::default().with_selected(Some(app.selected_index));
    frame.render_stateful_widget(List::new(items), area, &mut state);
}
