use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;

/// Handle mouse events for the select tool: click to select, drag to move,
/// click on empty canvas to deselect.
pub fn handle_select_event(app: &mut App, event: MouseEvent) {
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
