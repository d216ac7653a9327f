use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::theme::Palette;
use crate::app::TextInput;

const SEPARATOR: &str = "  ";
const CURSOR: &str = "█";

/// Configuration for text input rendering
pub struct TextInputConfig<'a> {
    pub input: &'a TextInput,
    pub title: Line<'a>,
    pub placeholder: Option<&'a str>,
    pub show_cursor: bool,
}

impl<'a> TextInputConfig<'a> {
    pub fn new(input: &'a TextInput, title: impl Into<Line<'a>>) -> Self {
        Self {
            input,
            title: title.into(),
            placeholder: None,
            show_cursor: true,
        }
    }

    pub fn with_placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn with_cursor_visible(mut self, show_cursor: bool) -> Self {
        self.show_cursor = show_cursor;
        self
    }
}

/// Renders a bordered one-line input, scrolled so the cursor stays visible
pub fn render_text_input(
    frame: &mut Frame,
    area: Rect,
    config: TextInputConfig,
    palette: &Palette,
) {
    let cursor_style = Style::default()
        .fg(palette.accent)
        .add_modifier(Modifier::SLOW_BLINK);
    let cursor = if config.show_cursor { CURSOR } else { "" };
    let content = config.input.content();

    let line = if content.is_empty() {
        let mut spans = vec![
            Span::styled("> ", palette.muted_style()),
            Span::styled(cursor, cursor_style),
        ];
        if let Some(placeholder) = config.placeholder {
            spans.push(Span::styled(
                placeholder,
                palette.muted_style().add_modifier(Modifier::ITALIC),
            ));
        }
        Line::from(spans)
    } else {
        let inner_width = usize::from(area.width.saturating_sub(2));
        let available = inner_width
            .saturating_sub(2 + usize::from(config.show_cursor))
            .max(1);
        let cursor_index = config.input.cursor_position();
        let (start, end) = visible_window(content, cursor_index, available);
        let before = slice_by_chars(content, start, cursor_index.max(start));
        let after = slice_by_chars(content, cursor_index.max(start), end);

        Line::from(vec![
            Span::styled("> ", Style::default().fg(palette.accent)),
            Span::styled(before, palette.text_style()),
            Span::styled(cursor, cursor_style),
            Span::styled(after, palette.text_style()),
        ])
    };

    let border_color = if content.is_empty() {
        palette.border
    } else {
        palette.accent
    };

    frame.render_widget(
        Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .title(config.title)
                .border_style(Style::default().fg(border_color)),
        ),
        area,
    );
}

/// Char range of `content` that fits `width` columns around `cursor`
fn visible_window(content: &str, cursor: usize, width: usize) -> (usize, usize) {
    let length = content.chars().count();
    let cursor = cursor.min(length);
    if length <= width {
        return (0, length);
    }
    let start = cursor
        .saturating_sub(width.saturating_sub(1))
        .min(length.saturating_sub(width));
    (start, start + width)
}

fn slice_by_chars(value: &str, start: usize, end: usize) -> String {
    value
        .chars()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}

/// Mode badge followed by key hints
pub fn footer_spans(
    mode: &str,
    keybindings: &[(&str, &str)],
    palette: &Palette,
) -> Vec<Span<'static>> {
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(format!(" {mode} "), palette.badge_style()),
    ];
    for &(key, description) in keybindings {
        spans.push(Span::raw(SEPARATOR));
        spans.push(Span::styled(format!(" {key} "), palette.key_style()));
        spans.push(Span::styled(format!(" {description}"), palette.text_style()));
    }
    spans
}

pub fn render_status_toast(frame: &mut Frame, area: Rect, message: &str, palette: &Palette) {
    let toast = Paragraph::new(Line::from(vec![Span::styled(
        format!(" {message} "),
        palette.chip_style(),
    )]))
    .alignment(Alignment::Right);

    frame.render_widget(toast, area);
}

/// Clears `area` and draws a titled popup border; returns the inner area
pub fn render_popup_frame(frame: &mut Frame, area: Rect, title: &str, palette: &Palette) -> Rect {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}
