use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::components;
use super::theme::Palette;
use super::utils::inner;
use crate::app::{App, TranscriptEntry};
use crate::storage::{Attachment, AttachmentKind, Role};

/// Lines of a text attachment shown before the preview is cut
pub const PREVIEW_LINES: usize = 12;

const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Areas of the chat screen, shared with mouse hit-testing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatLayout {
    pub header: Rect,
    pub history: Rect,
    pub input: Rect,
    pub footer: Rect,
}

pub fn chat_layout(area: Rect) -> ChatLayout {
    let [header, history, input, footer] = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(0),    // Transcript
        Constraint::Length(3), // Input
        Constraint::Length(3), // Footer
    ])
    .areas(area);
    ChatLayout {
        header,
        history,
        input,
        footer,
    }
}

/// Primary chat view with header, transcript, input, and footer
pub fn render_chat_view(f: &mut Frame, app: &App, palette: &Palette) {
    let layout = chat_layout(f.area());
    render_chat_header(f, app, layout.header, palette);
    render_chat_history(f, app, layout.history, palette);
    render_chat_input(f, app, layout.input, palette);
    render_chat_footer(f, app, layout.footer, palette);
}

fn render_chat_header(f: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(palette.border_style()),
        area,
    );
    let inner = inner(area);

    let title = Line::from(vec![
        Span::raw(" "),
        Span::styled(
            "LM Studio",
            Style::default()
                .fg(palette.assistant)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled("Chat", Style::default().fg(palette.accent)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            palette.muted_style(),
        ),
    ]);

    let model_label = if app.models_loading {
        "loading models".to_string()
    } else {
        app.models
            .selected_model_id()
            .unwrap_or("server default")
            .to_string()
    };
    let label_width = model_label.width() + 2;
    let model_width = u16::try_from(label_width).unwrap_or(inner.width);
    let columns = Layout::horizontal([Constraint::Min(0), Constraint::Length(model_width)]);
    let [left, right] = columns.areas(inner);

    f.render_widget(Paragraph::new(title), left);
    f.render_widget(
        Paragraph::new(Span::styled(format!(" {model_label} "), palette.text_style()))
            .alignment(Alignment::Right),
        right,
    );
}

fn render_chat_history(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let content_width = usize::from(area.width.saturating_sub(2));
    let max_content_width = content_width.saturating_sub(4).max(1);

    let mut lines: Vec<Line<'static>> = Vec::new();
    if app.transcript.is_empty() && !app.is_streaming() {
        add_welcome_message(&mut lines, max_content_width, palette);
    }

    for entry in app.transcript.entries() {
        add_spacing(&mut lines);
        lines.extend(entry_lines(entry, max_content_width, palette));
    }

    // Spinner until the first fragment creates the live entry
    if app.is_streaming() && !app.transcript.has_live_entry() {
        add_spacing(&mut lines);
        lines.push(loading_line(app.loading_frame, palette));
    }
    add_spacing(&mut lines);

    let visible_height = usize::from(area.height.saturating_sub(2));
    let (scroll_from_top, actual_scroll_offset) = calculate_scroll_position(
        lines.len(),
        visible_height,
        app.chat_scroll_offset,
        app.chat_auto_scroll,
    );
    app.chat_scroll_limit.set(lines.len().saturating_sub(visible_height));

    let mut title_spans = vec![Span::styled(" Conversation ", palette.text_style())];
    if actual_scroll_offset > 0 {
        title_spans.push(Span::styled(
            format!("[+{actual_scroll_offset} lines] "),
            Style::default().fg(palette.accent),
        ));
    }

    let content = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Line::from(title_spans))
                .border_style(palette.border_style()),
        )
        .scroll((u16::try_from(scroll_from_top).unwrap_or(u16::MAX), 0));

    frame.render_widget(content, area);
}

fn add_welcome_message(lines: &mut Vec<Line<'static>>, max_width: usize, palette: &Palette) {
    lines.push(Line::from(""));
    for line in wrap_text("Ask anything. Your local model is listening.", max_width) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(line, palette.muted_style()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(
            "Press / for commands or ? for shortcuts",
            Style::default().fg(palette.accent),
        ),
    ]));
}

/// Role header, wrapped content and attachment previews of one entry
pub fn entry_lines(
    entry: &TranscriptEntry,
    max_width: usize,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let (indicator, name, color) = match entry.role {
        Role::User => (">", "You", palette.user),
        Role::Assistant => ("<", "Assistant", palette.assistant),
    };

    let mut header = vec![
        Span::styled(format!(" {indicator} "), palette.muted_style()),
        Span::styled(
            name,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ];
    if entry.live {
        header.push(Span::styled("  streaming", palette.muted_style()));
    }

    let mut lines = vec![Line::from(header)];
    for content_line in wrap_text(&entry.content, max_width) {
        lines.push(Line::from(vec![
            Span::raw("   "),
            Span::styled(content_line, palette.text_style()),
        ]));
    }
    for attachment in &entry.attachments {
        lines.extend(attachment_preview(attachment, max_width, palette));
    }
    lines
}

/// `[image] name` for images, a boxed excerpt for text files
pub fn attachment_preview(
    attachment: &Attachment,
    max_width: usize,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let indent = Span::raw("   ");
    match attachment.kind {
        AttachmentKind::Image => vec![Line::from(vec![
            indent,
            Span::styled("[image] ", Style::default().fg(palette.accent)),
            Span::styled(attachment.name.clone(), palette.text_style()),
        ])],
        AttachmentKind::Text => {
            let inner_width = max_width.saturating_sub(2).max(1);
            let rule = |left: &str, label: &str| {
                let used = label.width() + 1;
                format!(
                    "{left}{label}{}",
                    "─".repeat(inner_width.saturating_sub(used))
                )
            };

            let mut lines = vec![Line::from(vec![
                indent.clone(),
                Span::styled(
                    rule("┌", &format!(" {} ", attachment.name)),
                    palette.muted_style(),
                ),
            ])];
            let total = attachment.content.lines().count();
            for text in attachment.content.lines().take(PREVIEW_LINES) {
                lines.push(Line::from(vec![
                    indent.clone(),
                    Span::styled("│ ", palette.muted_style()),
                    Span::styled(
                        truncate_to_width(text, inner_width.saturating_sub(1)),
                        palette.text_style(),
                    ),
                ]));
            }
            if total > PREVIEW_LINES {
                lines.push(Line::from(vec![
                    indent.clone(),
                    Span::styled("│ ", palette.muted_style()),
                    Span::styled(
                        format!("… {} more lines", total - PREVIEW_LINES),
                        palette.muted_style().add_modifier(Modifier::ITALIC),
                    ),
                ]));
            }
            lines.push(Line::from(vec![
                indent,
                Span::styled(rule("└", ""), palette.muted_style()),
            ]));
            lines
        }
    }
}

fn loading_line(frame: u8, palette: &Palette) -> Line<'static> {
    let dots = SPINNER_FRAMES
        .get(usize::from(frame) % SPINNER_FRAMES.len())
        .copied()
        .unwrap_or_default();
    Line::from(vec![
        Span::styled(" < ", palette.muted_style()),
        Span::styled(
            "Assistant",
            Style::default()
                .fg(palette.assistant)
                .add_modifier(Modifier::DIM),
        ),
        Span::styled(format!(" thinking {dots}"), palette.muted_style()),
    ])
}

/// Top row to show and the clamped offset from the bottom
pub fn calculate_scroll_position(
    total_lines: usize,
    visible_height: usize,
    chat_scroll_offset: usize,
    chat_auto_scroll: bool,
) -> (usize, usize) {
    let max_scroll_offset = total_lines.saturating_sub(visible_height);
    let actual_scroll_offset = if chat_auto_scroll {
        0
    } else {
        chat_scroll_offset.min(max_scroll_offset)
    };
    (max_scroll_offset - actual_scroll_offset, actual_scroll_offset)
}

/// Word-wraps `text` to `max_width` columns, keeping indentation
///
/// Runs of blank lines collapse to one.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut lines: Vec<String> = Vec::new();
    for raw_line in text.lines() {
        lines.extend(wrap_line(raw_line.trim_end(), max_width));
    }

    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    let mut previous_blank = true;
    lines.retain(|line| {
        let blank = line.is_empty();
        let keep = !(blank && previous_blank);
        previous_blank = blank;
        keep
    });
    lines
}

fn wrap_line(line: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut width = 0usize;

    for (index, word) in line.split(' ').enumerate() {
        let word_width = word.width();
        if index > 0 {
            if width > 0 && width + 1 + word_width > max_width {
                lines.push(std::mem::take(&mut current));
                width = 0;
            } else {
                current.push(' ');
                width += 1;
            }
        }

        if word_width <= max_width.saturating_sub(width) {
            current.push_str(word);
            width += word_width;
            continue;
        }
        // Words longer than the line are broken by character
        for character in word.chars() {
            let char_width = character.width().unwrap_or(0);
            if width > 0 && width + char_width > max_width {
                lines.push(std::mem::take(&mut current));
                width = 0;
            }
            current.push(character);
            width += char_width;
        }
    }
    lines.push(current);
    lines
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for character in text.chars() {
        let char_width = character.width().unwrap_or(0);
        if width + char_width + 1 > max_width {
            break;
        }
        result.push(character);
        width += char_width;
    }
    result.push('…');
    result
}

fn add_spacing(lines: &mut Vec<Line<'static>>) {
    if lines.last().is_some_and(|line| line.width() > 0) {
        lines.push(Line::from(""));
    }
}

fn render_chat_input(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let mut title = vec![Span::styled(" Message ", palette.text_style())];
    for attachment in app.session.staging().items() {
        let icon = match attachment.kind {
            AttachmentKind::Image => "img",
            AttachmentKind::Text => "txt",
        };
        title.push(Span::styled(
            format!(" {icon} {} ", attachment.name),
            palette.chip_style(),
        ));
        title.push(Span::raw(" "));
    }

    let placeholder = if app.is_streaming() {
        "Waiting for response..."
    } else {
        "Type your message here..."
    };
    let config = components::TextInputConfig::new(&app.chat_input, Line::from(title))
        .with_placeholder(placeholder)
        .with_cursor_visible(matches!(app.mode, crate::app::AppMode::Chat));

    components::render_text_input(frame, area, config, palette);
}

fn render_chat_footer(f: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let keybindings = [
        ("/", "menu"),
        ("^O", "attach"),
        ("^S", "settings"),
        ("?", "help"),
    ];
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(palette.border_style()),
        area,
    );
    let inner = inner(area);

    let toast_message = app.status_toast_message();
    let toast_width = toast_message.map_or(0, |message| message.width() + 4);
    let toast_width = u16::try_from(toast_width).unwrap_or(inner.width);
    let columns = Layout::horizontal([Constraint::Min(0), Constraint::Length(toast_width)]);
    let [left, right] = columns.areas(inner);

    let mode = if app.is_streaming() {
        "STREAMING"
    } else {
        "CHAT"
    };
    let footer = Line::from(components::footer_spans(mode, &keybindings, palette));
    f.render_widget(Paragraph::new(footer), left);
    if let Some(message) = toast_message {
        components::render_status_toast(f, right, message, palette);
    }
}
