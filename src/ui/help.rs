use ratatui::{
    Frame,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::components;
use super::theme::Palette;
use super::utils::popup_rect;
use crate::app::SHORTCUTS;

pub fn render_help_view(f: &mut Frame, palette: &Palette) {
    let key_width = SHORTCUTS.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let height = u16::try_from(SHORTCUTS.len())
        .unwrap_or(u16::MAX)
        .saturating_add(4);
    let area = popup_rect(60, 50, height, f.area());
    let inner = components::render_popup_frame(f, area, "Shortcuts", palette);

    let mut lines: Vec<Line> = SHORTCUTS
        .iter()
        .map(|(key, description)| {
            Line::from(vec![
                Span::styled(
                    format!("  {key:<key_width$}"),
                    Style::default().fg(palette.accent),
                ),
                Span::styled(format!("  {description}"), palette.text_style()),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  Esc close", palette.muted_style())));

    f.render_widget(Paragraph::new(lines), inner);
}
