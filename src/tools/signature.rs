use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;

/// Handle mouse events for the signature tool. Drag out the signature box,
/// then type the signature text with Enter.
pub fn handle_signature_event(app: &mut App, event: MouseEvent) {
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
        _ => {}
    }
}
