mod app;
mod draw;
mod element;
mod geometry;
mod history;
mod pdf;
mod render;
mod sync;
mod tools;
mod ui;

use std::fs::OpenOptions;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

use app::{App, Mode, Tool};
use sync::service::HttpSessionService;
use sync::{SyncHandle, SyncMode};

/// Terminal PDF annotation editor with real-time collaboration
#[derive(Parser, Debug)]
#[command(name = "pagemark")]
#[command(version, about, long_about = None)]
struct Args {
    /// PDF file to annotate
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Session service base URL
    #[arg(long, value_name = "URL", default_value = "http://localhost:8080/api")]
    service: String,

    /// Initial stroke/text color as #rrggbb
    #[arg(long, value_name = "HEX")]
    color: Option<String>,

    /// Disable sync (offline mode)
    #[arg(long)]
    offline: bool,
}

/// Log to a file under the platform data dir; the terminal owns stdout.
fn init_logging() {
    let log_path = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pagemark");
    if std::fs::create_dir_all(&log_path).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path.join("pagemark.log"))
    else {
        return;
    };
    let filter = EnvFilter::try_from_env("PAGEMARK_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let sync_mode = if args.offline {
        SyncMode::Disabled
    } else {
        SyncMode::Active
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let mut app = App::new(size.width, size.height.saturating_sub(2))?;

    if let Some(file) = &args.file {
        app.load_document(file);
    } else {
        app.set_status("No document - pass a PDF file on the command line");
    }

    if let Some(hex) = &args.color {
        match element::Rgb::from_hex(hex) {
            Some(color) => {
                app.shape_defaults.stroke_color = color;
                app.text_defaults.color = color;
            }
            None => app.set_status("Invalid --color, expected #rrggbb"),
        }
    }

    // Start the sync worker once a document is loaded
    let sync_handle = match (&app.doc, sync_mode) {
        (Some(doc), SyncMode::Active) => match HttpSessionService::new(&args.service) {
            Ok(service) => Some(sync::start_sync_thread(
                Arc::new(service),
                doc.bytes().to_vec(),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "sync client unavailable");
                app.set_status(format!("Sync unavailable: {e}"));
                None
            }
        },
        _ => None,
    };
    if let Some(handle) = &sync_handle {
        app.attach_sync(handle.command_tx.clone());
    }

    let result = run_app(&mut terminal, &mut app, sync_handle.as_ref());

    if let Some(handle) = sync_handle {
        let _ = handle.send_command(sync::SyncCommand::Shutdown);
    }

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    sync_handle: Option<&SyncHandle>,
) -> Result<()> {
    while app.running {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Drain sync events (non-blocking)
        if let Some(handle) = sync_handle {
            while let Some(event) = handle.poll_event() {
                match event {
                    sync::SyncEvent::Ready { session_id } => {
                        app.set_status(format!("Session ready: {}", session_id.short()));
                        app.session_id = Some(session_id);
                    }
                    sync::SyncEvent::Saved { bytes } => {
                        app.finish_export(&bytes);
                    }
                    sync::SyncEvent::Error(msg) => {
                        app.set_status(msg);
                    }
                }
            }
        }

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Blocking load error: only quitting works until a new
                    // document is opened from the command line.
                    if app.load_error.is_some() {
                        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                            || (key.code == KeyCode::Char('c')
                                && key.modifiers.contains(KeyModifiers::CONTROL))
                        {
                            app.running = false;
                        }
                        continue;
                    }

                    app.clear_status();
                    match app.mode.clone() {
                        Mode::Normal => handle_normal_mode(app, key),
                        Mode::ContentInput { .. } => handle_content_input_mode(app, key),
                        Mode::ExportPath { .. } => handle_export_path_mode(app, key),
                    }
                }
                Event::Mouse(mouse) => {
                    if app.load_error.is_none() && matches!(app.mode, Mode::Normal) {
                        match app.current_tool {
                            Tool::Select => tools::handle_select_event(app, mouse),
                            Tool::Text => tools::handle_text_event(app, mouse),
                            Tool::Image => tools::handle_image_event(app, mouse),
                            Tool::Signature => tools::handle_signature_event(app, mouse),
                            Tool::Rectangle | Tool::Circle | Tool::Line | Tool::Arrow => {
                                tools::handle_shape_event(app, mouse)
                            }
                        }
                    }
                }
                Event::Resize(w, h) => {
                    app.viewport.resize(w, h.saturating_sub(2));
                }
                _ => {}
            }
        }
    }

    Ok(())
}

fn handle_normal_mode(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
        }
        KeyCode::Esc => {
            app.cancel_gesture();
            app.selected = None;
        }

        // Export (Ctrl+S)
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.start_export();
        }

        // Tool selection
        KeyCode::Char('s') => app.set_tool(Tool::Select),
        KeyCode::Char('t') => app.set_tool(Tool::Text),
        KeyCode::Char('r') => app.set_tool(Tool::Rectangle),
        KeyCode::Char('c') => app.set_tool(Tool::Circle),
        KeyCode::Char('l') => app.set_tool(Tool::Line),
        KeyCode::Char('a') => app.set_tool(Tool::Arrow),
        KeyCode::Char('i') => app.set_tool(Tool::Image),
        KeyCode::Char('g') => app.set_tool(Tool::Signature),

        // Undo/Redo
        KeyCode::Char('u') => app.undo(),
        KeyCode::Char('U') => app.redo(),

        // Element operations
        KeyCode::Delete | KeyCode::Backspace => app.delete_selected(),
        KeyCode::Enter => {
            if app.start_content_edit() {
                app.set_status("Editing content - Enter to finish");
            }
        }
        KeyCode::Char('v') => app.toggle_visible(),
        KeyCode::Char('k') => app.toggle_locked(),
        KeyCode::Char('{') => app.lower_layer(),
        KeyCode::Char('}') => app.raise_layer(),
        KeyCode::Char('R') => app.rotate_selected(),
        KeyCode::Char('o') => app.adjust_opacity(-0.1),
        KeyCode::Char('O') => app.adjust_opacity(0.1),

        // Text properties
        KeyCode::Char('b') => app.toggle_bold(),
        KeyCode::Char('e') => app.toggle_italic(),
        KeyCode::Char('d') => app.toggle_underline(),
        KeyCode::Char('f') => app.cycle_align(),
        KeyCode::Char('<') => app.adjust_font_size(-2.0),
        KeyCode::Char('>') => app.adjust_font_size(2.0),

        // Shape properties
        KeyCode::Char('y') => app.cycle_stroke_style(),
        KeyCode::Char('w') => app.adjust_stroke_width(1.0),
        KeyCode::Char('W') => app.adjust_stroke_width(-1.0),
        KeyCode::Char('C') => app.cycle_stroke_color(),
        KeyCode::Char('F') => app.cycle_fill_color(),

        // Pages
        KeyCode::Char('[') | KeyCode::PageUp => app.prev_page(),
        KeyCode::Char(']') | KeyCode::PageDown => app.next_page(),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.viewport.zoom_in(),
        KeyCode::Char('-') => app.viewport.zoom_out(),

        // Panel toggle
        KeyCode::Char('P') => app.show_properties = !app.show_properties,

        // Viewport panning
        KeyCode::Up => app.viewport.pan(0.0, -1.0),
        KeyCode::Down => app.viewport.pan(0.0, 1.0),
        KeyCode::Left => app.viewport.pan(-1.0, 0.0),
        KeyCode::Right => app.viewport.pan(1.0, 0.0),

        _ => {}
    }
}

fn handle_content_input_mode(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            app.push_input_char('\n');
        }
        KeyCode::Esc | KeyCode::Enter => {
            app.commit_content_edit();
        }
        KeyCode::Backspace => {
            app.backspace_input();
        }
        KeyCode::Char(c) => {
            app.push_input_char(c);
        }
        _ => {}
    }
}

fn handle_export_path_mode(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.cancel_input();
        }
        KeyCode::Enter => {
            app.confirm_export();
        }
        KeyCode::Backspace => {
            app.backspace_input();
        }
        KeyCode::Char(c) => {
            app.push_input_char(c);
        }
        _ => {}
    }
}
