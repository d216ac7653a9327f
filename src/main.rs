// Defensive programming lints - prevent panics and unsafe patterns
#![deny(clippy::indexing_slicing)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::fallible_impl_from)]
#![warn(clippy::wildcard_enum_match_arm)]
#![warn(clippy::fn_params_excessive_bools)]
// Idiomatic Rust lints
#![warn(clippy::needless_return)]
#![warn(clippy::let_and_return)]
#![warn(clippy::must_use_candidate)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::map_unwrap_or)]
#![warn(clippy::explicit_iter_loop)]

mod api;
mod app;
mod config;
mod logging;
mod services;
mod session;
mod storage;
mod ui;

use api::{CompletionTransport, HttpTransport, ModelDirectory, StreamEvent};
use app::{App, AppMode, TextInput};
use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use config::AppDirs;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    layout::Rect,
};
use session::ChatSession;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Terminal chat for LM Studio
#[derive(Parser)]
#[command(name = "lmchat", version, long_about = None)]
#[command(after_help = "Run without a command to start interactive mode.\n\
                        Set LMCHAT_LOG=debug for verbose logs.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one prompt and stream the reply
    Ask(AskArgs),
    /// List models on the configured server
    Models,
    /// Export chat history as JSON
    Export {
        /// Target directory, the download folder by default
        dir: Option<PathBuf>,
    },
    /// Delete all chat history
    Clear,
    /// Show or set the server URL
    Config {
        /// New server URL, e.g. http://localhost:1234
        api_url: Option<String>,
    },
}

#[derive(Args, Debug)]
struct AskArgs {
    /// Attach a file as context; repeatable
    #[arg(short = 'a', long = "attach", value_name = "FILE")]
    attachments: Vec<PathBuf>,

    /// Prompt words, joined with spaces
    #[arg(required = true, value_name = "PROMPT")]
    prompt: Vec<String>,
}

impl AskArgs {
    fn prompt_text(&self) -> String {
        self.prompt.join(" ").trim().to_string()
    }
}

fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let cli = Cli::parse();

    let dirs = AppDirs::resolve()?;
    if let Err(error) = logging::init(&dirs.log_file()) {
        eprintln!("Logging disabled: {error}");
    }
    let transport: Arc<dyn CompletionTransport> = Arc::new(HttpTransport::new()?);
    let mut session = ChatSession::open(&dirs, transport)?;

    if let Some(command) = cli.command {
        return handle_cli_command(command, &mut session);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    app.init();
    let res = run_app(&mut terminal, &mut app);
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn handle_cli_command(command: Commands, session: &mut ChatSession) -> Result<()> {
    match command {
        Commands::Ask(args) => run_ask(session, &args),
        Commands::Models => {
            let config = session.config();
            let base_url = config
                .base_url()
                .ok_or_else(|| eyre!(session::MISSING_API_URL_MESSAGE))?;
            let mut directory = ModelDirectory::new();
            if !directory.refresh(&config, session.transport().as_ref()) {
                return Err(eyre!(
                    "Could not list models from {base_url}, details are in lmchat.log"
                ));
            }
            // The first entry is the placeholder
            for (index, entry) in directory.entries().iter().enumerate().skip(1) {
                let marker = if index == directory.selected_index() {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {}", entry.id);
            }
            Ok(())
        }
        Commands::Export { dir } => {
            let dir = dir.unwrap_or_else(app::default_export_dir);
            let path = session.export_history(&dir)?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Clear => {
            session.clear_history()?;
            println!("History cleared");
            Ok(())
        }
        Commands::Config { api_url } => {
            let config = match api_url {
                Some(api_url) => session.save_api_url(&api_url)?,
                None => session.config(),
            };
            println!(
                "apiUrl: {}",
                config.api_url.as_deref().unwrap_or("(not set)")
            );
            println!(
                "model:  {}",
                config.model.as_deref().unwrap_or("(server default)")
            );
            Ok(())
        }
    }
}

fn run_ask(session: &mut ChatSession, args: &AskArgs) -> Result<()> {
    let prompt = args.prompt_text();
    if prompt.is_empty() {
        return Err(eyre!("Nothing to ask"));
    }
    for path in &args.attachments {
        session.stage(services::attachments::load_attachment(path)?);
    }

    let mut stdout = io::stdout();
    let exchange = session.send_blocking(&prompt, |event| match event {
        StreamEvent::Delta { fragment, .. } => {
            let _ = write!(stdout, "{fragment}");
            let _ = stdout.flush();
        }
        StreamEvent::ServerError { message } => eprintln!("API error: {message}"),
    });
    println!();

    let exchange = exchange?;
    tracing::debug!(
        user = exchange.user.id,
        assistant = exchange.assistant.id,
        "ask finished"
    );
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.check_events();
        tick_loading_animation(app);
        app.clear_expired_status_toast();

        terminal.draw(|f| ui::render(f, app))?;

        if app.should_quit {
            break;
        }

        // Poll for events with a timeout
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle KeyPress events to avoid duplicate handling
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        app.should_quit = true;
                        continue;
                    }
                    // An open alert swallows every other key
                    if app.current_alert().is_some() {
                        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                            app.dismiss_alert();
                        }
                        continue;
                    }

                    match app.mode {
                        AppMode::Chat => handle_chat_mode(app, key.code, key.modifiers),
                        AppMode::CommandMenu => handle_command_menu(app, key.code),
                        AppMode::Settings => handle_settings_mode(app, key.code),
                        AppMode::AttachInput => handle_attach_mode(app, key.code),
                        AppMode::ModelSelection => handle_model_selection(app, key.code),
                        AppMode::ConfirmClear => handle_confirm_clear(app, key.code),
                        AppMode::Help => handle_help_mode(app, key.code),
                    }
                }
                Event::Mouse(mouse) => handle_mouse_event(app, mouse)?,
                Event::Paste(paste) => handle_paste(app, &paste),
                Event::FocusGained => app.on_focus_gained(),
                Event::FocusLost | Event::Resize(_, _) => {}
            }
        }
    }

    Ok(())
}

fn tick_loading_animation(app: &mut App) {
    if !app.is_streaming() {
        app.loading_frame = 0;
        app.last_loading_tick = None;
        return;
    }

    let now = Instant::now();
    let should_tick = app
        .last_loading_tick
        .is_none_or(|last_tick| now.duration_since(last_tick) >= Duration::from_millis(200));

    if should_tick {
        app.loading_frame = app.loading_frame.wrapping_add(1);
        app.last_loading_tick = Some(now);
    }
}

fn handle_chat_mode(app: &mut App, key_code: KeyCode, modifiers: KeyModifiers) {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match (key_code, modifiers) {
        (KeyCode::Char('o'), _) if ctrl => app.open_attach_input(),
        (KeyCode::Char('s'), _) if ctrl => app.open_settings(),
        (KeyCode::Char('e'), _) if ctrl => app.export_history(),
        (KeyCode::Char('l'), _) if ctrl => app.open_clear_confirmation(),
        (KeyCode::Char('t'), _) if ctrl => app.toggle_theme(),
        (KeyCode::Char('y'), _) if ctrl => app.copy_last_reply(),
        (KeyCode::Char('v'), _) if ctrl => app.handle_chat_clipboard_image(),
        (KeyCode::Char('w'), _) if ctrl => app.chat_input.delete_word_before(),
        (KeyCode::Char(_), _) if ctrl => {}
        (KeyCode::Char('/'), _) if app.chat_input.is_empty() => app.open_command_menu(),
        (KeyCode::Char('?'), _) if app.chat_input.is_empty() => app.open_help(),
        (KeyCode::Char(character), _) => app.chat_input.insert_char(character),
        (KeyCode::Up, _) if app.chat_input.is_empty() || ctrl => app.scroll_chat_up_lines(3),
        (KeyCode::Down, _) if app.chat_input.is_empty() || ctrl => app.scroll_chat_down_lines(3),
        (KeyCode::PageUp, _) => app.scroll_chat_up_page(),
        (KeyCode::PageDown, _) => app.scroll_chat_down_page(),
        (KeyCode::Home, _) if app.chat_input.is_empty() => app.jump_to_top(),
        (KeyCode::End, _) if app.chat_input.is_empty() => app.reset_chat_scroll(),
        (KeyCode::Home, _) => app.chat_input.move_home(),
        (KeyCode::End, _) => app.chat_input.move_end(),
        (KeyCode::Left, _) => app.chat_input.move_left(),
        (KeyCode::Right, _) => app.chat_input.move_right(),
        (KeyCode::Enter, _) => app.send_chat_message(),
        (KeyCode::Backspace, _) => app.remove_chat_input_char(),
        (KeyCode::Delete, _) => app.chat_input.delete_after(),
        (KeyCode::Up, _)
        | (KeyCode::Down, _)
        | (KeyCode::Esc, _)
        | (KeyCode::Tab, _)
        | (KeyCode::BackTab, _)
        | (KeyCode::Insert, _)
        | (KeyCode::F(_), _)
        | (KeyCode::Null, _)
        | (KeyCode::CapsLock, _)
        | (KeyCode::ScrollLock, _)
        | (KeyCode::NumLock, _)
        | (KeyCode::PrintScreen, _)
        | (KeyCode::Pause, _)
        | (KeyCode::Menu, _)
        | (KeyCode::KeypadBegin, _)
        | (KeyCode::Media(_), _)
        | (KeyCode::Modifier(_), _) => {}
    }
}

fn handle_command_menu(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Esc => app.close_menu(),
        KeyCode::Enter => app.execute_selected(),
        KeyCode::Up | KeyCode::BackTab => app.previous_item(),
        KeyCode::Down | KeyCode::Tab => app.next_item(),
        KeyCode::Char(character) => app.add_input_char(character),
        KeyCode::Backspace => app.remove_input_char(),
        KeyCode::Left
        | KeyCode::Right
        | KeyCode::Home
        | KeyCode::End
        | KeyCode::PageUp
        | KeyCode::PageDown
        | KeyCode::Delete
        | KeyCode::Insert
        | KeyCode::F(_)
        | KeyCode::Null
        | KeyCode::CapsLock
        | KeyCode::ScrollLock
        | KeyCode::NumLock
        | KeyCode::PrintScreen
        | KeyCode::Pause
        | KeyCode::Menu
        | KeyCode::KeypadBegin
        | KeyCode::Media(_)
        | KeyCode::Modifier(_) => {}
    }
}

fn handle_settings_mode(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Esc => app.close_settings(),
        KeyCode::Enter => app.save_settings(),
        KeyCode::Char(_)
        | KeyCode::Backspace
        | KeyCode::Delete
        | KeyCode::Left
        | KeyCode::Right
        | KeyCode::Home
        | KeyCode::End => edit_text_input(&mut app.settings_input, key_code),
        KeyCode::Up
        | KeyCode::Down
        | KeyCode::PageUp
        | KeyCode::PageDown
        | KeyCode::Tab
        | KeyCode::BackTab
        | KeyCode::Insert
        | KeyCode::F(_)
        | KeyCode::Null
        | KeyCode::CapsLock
        | KeyCode::ScrollLock
        | KeyCode::NumLock
        | KeyCode::PrintScreen
        | KeyCode::Pause
        | KeyCode::Menu
        | KeyCode::KeypadBegin
        | KeyCode::Media(_)
        | KeyCode::Modifier(_) => {}
    }
}

fn handle_attach_mode(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Esc => app.close_attach_input(),
        KeyCode::Enter => app.submit_attach_input(),
        KeyCode::Char(_)
        | KeyCode::Backspace
        | KeyCode::Delete
        | KeyCode::Left
        | KeyCode::Right
        | KeyCode::Home
        | KeyCode::End => edit_text_input(&mut app.attach_input, key_code),
        KeyCode::Up
        | KeyCode::Down
        | KeyCode::PageUp
        | KeyCode::PageDown
        | KeyCode::Tab
        | KeyCode::BackTab
        | KeyCode::Insert
        | KeyCode::F(_)
        | KeyCode::Null
        | KeyCode::CapsLock
        | KeyCode::ScrollLock
        | KeyCode::NumLock
        | KeyCode::PrintScreen
        | KeyCode::Pause
        | KeyCode::Menu
        | KeyCode::KeypadBegin
        | KeyCode::Media(_)
        | KeyCode::Modifier(_) => {}
    }
}

/// Line-editing keys shared by the popup inputs
fn edit_text_input(input: &mut TextInput, key_code: KeyCode) {
    match key_code {
        KeyCode::Char(character) => input.insert_char(character),
        KeyCode::Backspace => input.delete_before(),
        KeyCode::Delete => input.delete_after(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        KeyCode::Enter
        | KeyCode::Esc
        | KeyCode::Up
        | KeyCode::Down
        | KeyCode::PageUp
        | KeyCode::PageDown
        | KeyCode::Tab
        | KeyCode::BackTab
        | KeyCode::Insert
        | KeyCode::F(_)
        | KeyCode::Null
        | KeyCode::CapsLock
        | KeyCode::ScrollLock
        | KeyCode::NumLock
        | KeyCode::PrintScreen
        | KeyCode::Pause
        | KeyCode::Menu
        | KeyCode::KeypadBegin
        | KeyCode::Media(_)
        | KeyCode::Modifier(_) => {}
    }
}

fn handle_model_selection(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Esc => app.close_model_selection(),
        KeyCode::Up => app.previous_model(),
        KeyCode::Down => app.next_model(),
        KeyCode::Enter => app.select_model_entry(),
        KeyCode::Char('r') => app.refresh_models(),
        KeyCode::Backspace
        | KeyCode::Left
        | KeyCode::Right
        | KeyCode::Home
        | KeyCode::End
        | KeyCode::PageUp
        | KeyCode::PageDown
        | KeyCode::Tab
        | KeyCode::BackTab
        | KeyCode::Delete
        | KeyCode::Insert
        | KeyCode::F(_)
        | KeyCode::Char(_)
        | KeyCode::Null
        | KeyCode::CapsLock
        | KeyCode::ScrollLock
        | KeyCode::NumLock
        | KeyCode::PrintScreen
        | KeyCode::Pause
        | KeyCode::Menu
        | KeyCode::KeypadBegin
        | KeyCode::Media(_)
        | KeyCode::Modifier(_) => {}
    }
}

fn handle_confirm_clear(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Esc | KeyCode::Char('n') => app.cancel_clear(),
        KeyCode::Char('y') => app.confirm_clear(),
        KeyCode::Enter => app.submit_confirm_clear(),
        KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
            app.toggle_confirm_choice();
        }
        KeyCode::Backspace
        | KeyCode::Up
        | KeyCode::Down
        | KeyCode::Home
        | KeyCode::End
        | KeyCode::PageUp
        | KeyCode::PageDown
        | KeyCode::Delete
        | KeyCode::Insert
        | KeyCode::F(_)
        | KeyCode::Char(_)
        | KeyCode::Null
        | KeyCode::CapsLock
        | KeyCode::ScrollLock
        | KeyCode::NumLock
        | KeyCode::PrintScreen
        | KeyCode::Pause
        | KeyCode::Menu
        | KeyCode::KeypadBegin
        | KeyCode::Media(_)
        | KeyCode::Modifier(_) => {}
    }
}

fn handle_help_mode(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q' | '?') => app.close_help(),
        KeyCode::Backspace
        | KeyCode::Up
        | KeyCode::Down
        | KeyCode::Left
        | KeyCode::Right
        | KeyCode::Home
        | KeyCode::End
        | KeyCode::PageUp
        | KeyCode::PageDown
        | KeyCode::Tab
        | KeyCode::BackTab
        | KeyCode::Delete
        | KeyCode::Insert
        | KeyCode::F(_)
        | KeyCode::Char(_)
        | KeyCode::Null
        | KeyCode::CapsLock
        | KeyCode::ScrollLock
        | KeyCode::NumLock
        | KeyCode::PrintScreen
        | KeyCode::Pause
        | KeyCode::Menu
        | KeyCode::KeypadBegin
        | KeyCode::Media(_)
        | KeyCode::Modifier(_) => {}
    }
}

fn handle_mouse_event(app: &mut App, mouse: event::MouseEvent) -> Result<()> {
    if app.mode != AppMode::Chat || app.current_alert().is_some() {
        return Ok(());
    }

    match mouse.kind {
        event::MouseEventKind::Down(event::MouseButton::Left) => {
            if is_in_chat_history(mouse.column, mouse.row)? {
                app.copy_last_reply();
            }
        }
        event::MouseEventKind::ScrollUp => app.scroll_chat_up_lines(3),
        event::MouseEventKind::ScrollDown => app.scroll_chat_down_lines(3),
        event::MouseEventKind::ScrollLeft
        | event::MouseEventKind::ScrollRight
        | event::MouseEventKind::Down(_)
        | event::MouseEventKind::Up(_)
        | event::MouseEventKind::Drag(_)
        | event::MouseEventKind::Moved => {}
    }
    Ok(())
}

fn handle_paste(app: &mut App, paste: &str) {
    if app.current_alert().is_some() {
        return;
    }
    match app.mode {
        AppMode::Chat => app.handle_chat_paste(paste),
        AppMode::CommandMenu => {
            for character in paste.chars().filter(|c| !c.is_control()) {
                app.add_input_char(character);
            }
        }
        AppMode::Settings => app.settings_input.insert_str(paste.trim()),
        AppMode::AttachInput => app.attach_input.insert_str(paste.trim()),
        AppMode::ModelSelection | AppMode::ConfirmClear | AppMode::Help => {}
    }
}

fn is_in_chat_history(column: u16, row: u16) -> Result<bool> {
    let (width, height) = crossterm::terminal::size()?;
    let history = ui::chat_layout(Rect::new(0, 0, width, height)).history;
    Ok(history.contains(ratatui::layout::Position::new(column, row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        let argv = std::iter::once("lmchat").chain(args.iter().copied());
        Cli::try_parse_from(argv)
    }

    fn ask(args: &[&str]) -> AskArgs {
        match parse(args).unwrap().command {
            Some(Commands::Ask(ask)) => ask,
            other => panic!("expected ask, got {other:?}"),
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_collects_attachments_and_prompt_words() {
        let parsed = ask(&[
            "ask", "-a", "a.txt", "explain", "--attach", "b.png", "this",
        ]);
        assert_eq!(
            parsed.attachments,
            vec![PathBuf::from("a.txt"), PathBuf::from("b.png")]
        );
        assert_eq!(parsed.prompt_text(), "explain this");
    }

    #[test]
    fn double_dash_keeps_flag_like_words() {
        let parsed = ask(&["ask", "--", "-a", "is", "a", "flag"]);
        assert!(parsed.attachments.is_empty());
        assert_eq!(parsed.prompt_text(), "-a is a flag");
    }

    #[test]
    fn ask_rejects_missing_prompt_or_path() {
        assert!(parse(&["ask", "-a", "a.txt"]).is_err());
        assert!(parse(&["ask", "hello", "-a"]).is_err());
        assert!(parse(&["ask"]).is_err());
    }

    #[test]
    fn other_commands_take_optional_values() {
        assert!(parse(&[]).unwrap().command.is_none());
        assert!(matches!(
            parse(&["export"]).unwrap().command,
            Some(Commands::Export { dir: None })
        ));
        match parse(&["config", "http://localhost:1234"]).unwrap().command {
            Some(Commands::Config { api_url }) => {
                assert_eq!(api_url.as_deref(), Some("http://localhost:1234"));
            }
            other => panic!("expected config, got {other:?}"),
        }
        assert!(parse(&["frobnicate"]).is_err());
    }
}
