use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::{App, Mode, Tool};
use crate::element::ElementKind;
use crate::render::CanvasWidget;

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Canvas area (+ optional panel)
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    // Load failure is a blocking state: no canvas, no interaction.
    if let Some(error) = &app.load_error {
        render_load_error(frame, error, chunks[0]);
        render_status_bar(frame, app, chunks[1]);
        render_help_bar(frame, app, chunks[2]);
        return;
    }

    let canvas_area = if app.show_properties {
        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(30)])
            .split(chunks[0]);
        render_properties_panel(frame, app, horizontal[1]);
        horizontal[0]
    } else {
        chunks[0]
    };

    frame.render_widget(CanvasWidget { app }, canvas_area);
    render_status_bar(frame, app, chunks[1]);
    render_help_bar(frame, app, chunks[2]);

    match &app.mode {
        Mode::ContentInput { text, .. } => {
            render_input(frame, "Content (Alt+Enter for newline):", text, canvas_area);
        }
        Mode::ExportPath { path } => {
            render_input(frame, "Export to:", path, canvas_area);
        }
        Mode::Normal => {}
    }
}

fn render_load_error(frame: &mut Frame, error: &str, area: Rect) {
    let block = Block::default()
        .title(" Document error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    let text = Paragraph::new(vec![
        Line::raw(""),
        Line::raw(error.to_string()),
        Line::raw(""),
        Line::styled(
            "Open a different file to continue, or press q to quit.",
            Style::default().fg(Color::Gray),
        ),
    ])
    .alignment(Alignment::Center)
    .block(block);

    let popup = centered(area, 70, 8);
    frame.render_widget(Clear, popup);
    frame.render_widget(text, popup);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            format!(" {} ", app.current_tool.name()),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];

    if app.page_count() > 0 {
        spans.push(Span::raw(format!(
            "Page {}/{}  ",
            app.current_page + 1,
            app.page_count()
        )));
        spans.push(Span::raw(format!(
            "{}%  ",
            (app.viewport.zoom * 100.0).round()
        )));
    }

    if let Some(session) = &app.session_id {
        spans.push(Span::styled(
            format!("session {}  ", session.short()),
            Style::default().fg(Color::Green),
        ));
    }

    if app.history.can_undo() {
        spans.push(Span::styled(
            "modified  ",
            Style::default().fg(Color::Magenta),
        ));
    }
    if app.history.can_redo() {
        spans.push(Span::styled(
            "redo available  ",
            Style::default().fg(Color::DarkGray),
        ));
    }

    if let Some(msg) = &app.status_message {
        spans.push(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_help_bar(frame: &mut Frame, app: &App, area: Rect) {
    let help = match app.mode {
        Mode::Normal => {
            "s:select t:text r:rect c:circle l:line a:arrow i:image g:sign | u:undo U:redo Del:delete Enter:edit [ ]:page +/-:zoom P:panel ^S:export q:quit"
        }
        Mode::ContentInput { .. } => "Enter:commit Esc:commit Alt+Enter:newline Backspace:erase",
        Mode::ExportPath { .. } => "Enter:save Esc:cancel",
    };
    frame.render_widget(
        Paragraph::new(Line::styled(help, Style::default().fg(Color::DarkGray))),
        area,
    );
}

fn render_properties_panel(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    match app.selected.and_then(|id| app.store.get(id)) {
        Some(el) => {
            lines.push(Line::styled(
                "Selected element",
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::raw(format!("type: {}", el.kind.name())));
            lines.push(Line::raw(format!("pos: {:.0}, {:.0}", el.x, el.y)));
            lines.push(Line::raw(format!(
                "size: {:.0} x {:.0}",
                el.width, el.height
            )));
            lines.push(Line::raw(format!("page: {}", el.page_index + 1)));
            lines.push(Line::raw(format!("layer: {}", el.layer)));
            lines.push(Line::raw(format!(
                "visible: {}  locked: {}",
                el.visible, el.locked
            )));
            lines.push(Line::raw(format!("rotation: {:.0}\u{00b0}", el.rotation)));
            lines.push(Line::raw(format!("opacity: {:.1}", el.opacity)));
            match &el.kind {
                ElementKind::Text {
                    font_size,
                    font_family,
                    bold,
                    italic,
                    underline,
                    align,
                    ..
                } => {
                    lines.push(Line::raw(""));
                    lines.push(Line::raw(format!("{font_family} {font_size}pt")));
                    lines.push(Line::raw(format!(
                        "b:{bold} i:{italic} u:{underline} {}",
                        align.name()
                    )));
                }
                ElementKind::Shape {
                    stroke_color,
                    fill_color,
                    stroke_width,
                    stroke_style,
                    ..
                } => {
                    lines.push(Line::raw(""));
                    lines.push(Line::raw(format!(
                        "stroke: {} {}pt {}",
                        stroke_color.to_hex(),
                        stroke_width,
                        stroke_style.name()
                    )));
                    let fill = match fill_color {
                        Some(c) => c.to_hex(),
                        None => "none".into(),
                    };
                    lines.push(Line::raw(format!("fill: {fill}")));
                }
                ElementKind::Image { src, keep_aspect, .. } => {
                    lines.push(Line::raw(""));
                    lines.push(Line::raw(format!("src: {src}")));
                    lines.push(Line::raw(format!("keep aspect: {keep_aspect}")));
                }
                ElementKind::Signature { origin, .. } => {
                    lines.push(Line::raw(""));
                    lines.push(Line::raw(format!("origin: {origin:?}")));
                }
            }
        }
        None => {
            lines.push(Line::styled(
                "Tool defaults",
                Style::default().add_modifier(Modifier::BOLD),
            ));
            match app.current_tool {
                Tool::Text => {
                    let d = &app.text_defaults;
                    lines.push(Line::raw(format!("{} {}pt", d.font_family, d.font_size)));
                    lines.push(Line::raw(format!("color: {}", d.color.to_hex())));
                    lines.push(Line::raw(format!(
                        "b:{} i:{} u:{} {}",
                        d.bold,
                        d.italic,
                        d.underline,
                        d.align.name()
                    )));
                }
                _ => {
                    let d = &app.shape_defaults;
                    lines.push(Line::raw(format!(
                        "stroke: {} {}pt {}",
                        d.stroke_color.to_hex(),
                        d.stroke_width,
                        d.stroke_style.name()
                    )));
                    let fill = match d.fill_color {
                        Some(c) => c.to_hex(),
                        None => "none".into(),
                    };
                    lines.push(Line::raw(format!("fill: {fill}")));
                }
            }
        }
    }

    // Layer list for the current page, topmost first.
    let mut on_page: Vec<_> = app.store.page_elements(app.current_page).collect();
    if !on_page.is_empty() {
        on_page.sort_by(|a, b| b.layer.cmp(&a.layer));
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            "Layers",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for el in on_page.iter().take(12) {
            let marker = if app.selected == Some(el.id) { ">" } else { " " };
            let eye = if el.visible { "" } else { " (hidden)" };
            lines.push(Line::raw(format!(
                "{marker}{} {}{eye}",
                el.layer,
                el.kind.name()
            )));
        }
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(" Properties ")
            .borders(Borders::LEFT),
    );
    frame.render_widget(panel, area);
}

fn render_input(frame: &mut Frame, label: &str, value: &str, area: Rect) {
    let popup = Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(3),
        width: area.width.saturating_sub(2),
        height: 3,
    };
    let block = Block::default().title(label.to_string()).borders(Borders::ALL);
    // Show the tail when the value is wider than the box.
    let inner_width = popup.width.saturating_sub(2) as usize;
    let shown: String = value
        .chars()
        .rev()
        .take(inner_width.saturating_sub(1))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let text = Line::from(vec![
        Span::raw(shown.replace('\n', "\u{21b5}")),
        Span::styled("\u{2588}", Style::default().fg(Color::Cyan)),
    ]);
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(text).block(block), popup);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}
