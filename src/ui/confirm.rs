use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use super::components;
use super::theme::Palette;
use super::utils::{centered_rect, popup_rect};
use crate::app::{App, ConfirmChoice};

pub fn render_clear_confirmation(f: &mut Frame, app: &App, palette: &Palette) {
    let area = centered_rect(46, 7, f.area());
    let inner = components::render_popup_frame(f, area, "Clear history", palette);
    let [question, _, buttons] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    f.render_widget(
        Paragraph::new(Span::styled(
            "Delete every stored message?",
            palette.text_style(),
        ))
        .alignment(Alignment::Center),
        question,
    );

    let button = |label: &'static str, active: bool| {
        if active {
            Span::styled(
                format!(" {label} "),
                palette.key_style().add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(format!(" {label} "), palette.muted_style())
        }
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            button("Cancel", app.confirm_choice == ConfirmChoice::Cancel),
            Span::raw("   "),
            button("Delete", app.confirm_choice == ConfirmChoice::Delete),
        ]))
        .alignment(Alignment::Center),
        buttons,
    );
}

/// Front of the alert queue, drawn over everything else
pub fn render_alert(f: &mut Frame, message: &str, queued: usize, palette: &Palette) {
    let width = u16::try_from(message.width() + 6)
        .unwrap_or(u16::MAX)
        .clamp(30, 70);
    let text_width = usize::from(width.saturating_sub(4).max(1));
    let text_rows = u16::try_from(message.width() / text_width)
        .unwrap_or(8)
        .saturating_add(1);
    let area = popup_rect(0, width, text_rows.saturating_add(4), f.area());
    let title = if queued > 1 {
        format!("Alert (1/{queued})")
    } else {
        "Alert".to_string()
    };
    let inner = components::render_popup_frame(f, area, &title, palette);
    let rows = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]);
    let [body, hint] = rows.areas(inner);

    f.render_widget(
        Paragraph::new(Span::styled(message.to_string(), Style::default().fg(palette.error)))
            .wrap(Wrap { trim: true }),
        body,
    );
    f.render_widget(
        Paragraph::new(Span::styled("Enter/Esc dismiss", palette.muted_style()))
            .alignment(Alignment::Right),
        hint,
    );
}
