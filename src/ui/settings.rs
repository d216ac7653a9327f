use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    text::Span,
    widgets::Paragraph,
};

use super::components::{self, TextInputConfig};
use super::theme::Palette;
use super::utils::popup_rect;
use crate::app::{App, TextInput};

pub fn render_settings(f: &mut Frame, app: &App, palette: &Palette) {
    render_input_popup(
        f,
        palette,
        "Settings",
        InputPopup {
            input: &app.settings_input,
            label: " LM Studio URL ",
            placeholder: "http://localhost:1234",
            hint: " Enter save  Esc cancel",
        },
    );
}

pub fn render_attach_input(f: &mut Frame, app: &App, palette: &Palette) {
    render_input_popup(
        f,
        palette,
        "Attach file",
        InputPopup {
            input: &app.attach_input,
            label: " Path ",
            placeholder: "~/notes/todo.md",
            hint: " Enter attach  Esc cancel  (images become image parts)",
        },
    );
}

struct InputPopup<'a> {
    input: &'a TextInput,
    label: &'a str,
    placeholder: &'a str,
    hint: &'a str,
}

fn render_input_popup(f: &mut Frame, palette: &Palette, title: &str, popup: InputPopup) {
    let area = popup_rect(60, 40, 7, f.area());
    let inner = components::render_popup_frame(f, area, title, palette);
    let rows = Layout::vertical([Constraint::Length(3), Constraint::Length(1)]);
    let [input, hint] = rows.areas(inner);

    let config = TextInputConfig::new(popup.input, popup.label)
        .with_placeholder(popup.placeholder);
    components::render_text_input(f, input, config, palette);
    let hint_line = Paragraph::new(Span::styled(popup.hint, palette.muted_style()));
    f.render_widget(hint_line, hint);
}
