use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;

/// Handle mouse events for the shape tools (rectangle, circle, line, arrow).
/// Dragging stretches the candidate bounds; releasing with non-zero size
/// commits an element built from the current shape defaults.
pub fn handle_shape_event(app: &mut App, event: MouseEvent) {
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let pos = app.viewport.screen_to_doc(event.column, event.row);
            app.pointer_down(pos);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let pos = app.viewport.screen_to_doc(event.column, event.row);
            app.pointer_move(pos);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.pointer_up();
        }
        MouseEventKind::Down(MouseButton::Right) => {
            // Cancel the candidate on right click
            app.cancel_gesture();
        }
        MouseEventKind::ScrollUp => {
            app.viewport.pan(0.0, -3.0);
        }
        MouseEventKind::ScrollDown => {
            app.viewport.pan(0.0, 3.0);
        }
        MouseEventKind::ScrollLeft => {
            app.viewport.pan(-3.0, 0.0);
        }
        MouseEventKind::ScrollRight => {
            app.viewport.pan(3.0, 0.0);
        }
        _ => {}
    }
}
