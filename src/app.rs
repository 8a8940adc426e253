use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;

use anyhow::Result;

use crate::element::{
    Element, ElementId, ElementKind, ElementStore, Rgb, ShapeType, SignatureOrigin, TextAlign,
};
use crate::geometry::{Point, Rect, Vec2, Viewport};
use crate::history::History;
use crate::pdf::PdfDocument;
use crate::sync::SyncCommand;
use crate::sync::service::SessionId;

/// Rotation step for keyboard rotation, in degrees
const ROTATE_STEP: f32 = 15.0;

/// Colors the property keys cycle through
const PALETTE: &[Rgb] = &[
    Rgb { r: 0x00, g: 0x00, b: 0x00 },
    Rgb { r: 0xcd, g: 0x00, b: 0x00 },
    Rgb { r: 0x00, g: 0x7b, b: 0xff },
    Rgb { r: 0x00, g: 0xcd, b: 0x00 },
    Rgb { r: 0xcd, g: 0xcd, b: 0x00 },
    Rgb { r: 0xff, g: 0xff, b: 0xff },
];

/// Available editing tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Select,
    Text,
    Rectangle,
    Circle,
    Line,
    Arrow,
    Image,
    Signature,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Text => "Text",
            Tool::Rectangle => "Rectangle",
            Tool::Circle => "Circle",
            Tool::Line => "Line",
            Tool::Arrow => "Arrow",
            Tool::Image => "Image",
            Tool::Signature => "Signature",
        }
    }

    fn shape_type(&self) -> Option<ShapeType> {
        match self {
            Tool::Rectangle => Some(ShapeType::Rectangle),
            Tool::Circle => Some(ShapeType::Circle),
            Tool::Line => Some(ShapeType::Line),
            Tool::Arrow => Some(ShapeType::Arrow),
            _ => None,
        }
    }
}

/// Application mode
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    /// Editing the text content of a text element (or the source reference
    /// of an image/signature)
    ContentInput { id: ElementId, text: String },
    /// Choosing the output path for an export
    ExportPath { path: String },
}

/// Pointer interaction state. `Idle` on pointer-up; `Drag` moves an existing
/// element preserving the grab point; `Draw` stretches a new element's
/// bounds, which stay out of the store until the gesture commits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    Drag {
        id: ElementId,
        grab: Vec2,
        moved: bool,
    },
    Draw {
        start: Point,
        rect: Rect,
    },
}

/// Property defaults consumed when the text tool commits a new element
#[derive(Debug, Clone)]
pub struct TextDefaults {
    pub content: String,
    pub font_size: f32,
    pub font_family: String,
    pub color: Rgb,
    pub background: Option<Rgb>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: TextAlign,
    pub line_height: f32,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            content: "New Text".into(),
            font_size: 16.0,
            font_family: "Helvetica".into(),
            color: Rgb::BLACK,
            background: None,
            bold: false,
            italic: false,
            underline: false,
            align: TextAlign::Left,
            line_height: 1.2,
        }
    }
}

/// Property defaults consumed when a shape tool commits a new element
#[derive(Debug, Clone)]
pub struct ShapeDefaults {
    pub stroke_color: Rgb,
    pub fill_color: Option<Rgb>,
    pub stroke_width: f32,
    pub stroke_style: crate::element::StrokeStyle,
}

impl Default for ShapeDefaults {
    fn default() -> Self {
        Self {
            stroke_color: Rgb::BLACK,
            fill_color: None,
            stroke_width: 2.0,
            stroke_style: crate::element::StrokeStyle::Solid,
        }
    }
}

/// Main application state
pub struct App {
    /// The element collection - the source of truth for all annotations
    pub store: ElementStore,
    /// Snapshot history; the store always equals the entry at its index
    pub history: History,
    pub selected: Option<ElementId>,
    pub gesture: Gesture,
    pub viewport: Viewport,
    pub current_page: usize,
    pub doc: Option<PdfDocument>,
    /// Blocking load failure; while set, only quitting is possible
    pub load_error: Option<String>,
    pub current_tool: Tool,
    pub mode: Mode,
    pub text_defaults: TextDefaults,
    pub shape_defaults: ShapeDefaults,
    pub running: bool,
    pub status_message: Option<String>,
    pub show_properties: bool,
    pub session_id: Option<SessionId>,
    pub file_path: Option<PathBuf>,
    pending_export: Option<PathBuf>,
    sync_tx: Option<std_mpsc::Sender<SyncCommand>>,
}

impl App {
    pub fn new(width: u16, height: u16) -> Result<Self> {
        let store = ElementStore::new();
        let history = History::new(&store)?;
        Ok(Self {
            store,
            history,
            selected: None,
            gesture: Gesture::Idle,
            viewport: Viewport::new(width, height),
            current_page: 0,
            doc: None,
            load_error: None,
            current_tool: Tool::Select,
            mode: Mode::Normal,
            text_defaults: TextDefaults::default(),
            shape_defaults: ShapeDefaults::default(),
            running: true,
            status_message: None,
            show_properties: false,
            session_id: None,
            file_path: None,
            pending_export: None,
            sync_tx: None,
        })
    }

    pub fn load_document(&mut self, path: &Path) {
        match PdfDocument::load(path) {
            Ok(doc) => {
                self.doc = Some(doc);
                self.file_path = Some(path.to_path_buf());
                self.load_error = None;
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "document load failed");
                self.load_error = Some(format!("Failed to load {}: {e:#}", path.display()));
            }
        }
    }

    /// Wire the outbound sync queue. Without it every push is a no-op.
    pub fn attach_sync(&mut self, tx: std_mpsc::Sender<SyncCommand>) {
        self.sync_tx = Some(tx);
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn page_count(&self) -> usize {
        self.doc.as_ref().map_or(0, |d| d.page_count())
    }

    fn push_sync(&self, cmd: SyncCommand) {
        if let Some(tx) = &self.sync_tx {
            if tx.send(cmd).is_err() {
                tracing::warn!("sync worker gone, dropping command");
            }
        }
    }

    /// Enqueue the element's current state for the session service.
    fn sync_element(&self, id: ElementId) {
        if let Some(el) = self.store.get(id) {
            self.push_sync(SyncCommand::Upsert {
                element: el.clone(),
            });
        }
    }

    fn commit_history(&mut self) {
        if let Err(e) = self.history.push(&self.store) {
            self.set_status(format!("History error: {e}"));
        }
    }

    // --- Pointer interaction state machine ---

    pub fn pointer_down(&mut self, p: Point) {
        match self.current_tool {
            Tool::Select => {
                if let Some(id) = self.store.hit_test(self.current_page, p) {
                    self.selected = Some(id);
                    if let Some(el) = self.store.get(id) {
                        let grab = Vec2::new(p.x - el.x, p.y - el.y);
                        self.gesture = Gesture::Drag {
                            id,
                            grab,
                            moved: false,
                        };
                    }
                } else {
                    self.selected = None;
                }
            }
            _ => {
                self.gesture = Gesture::Draw {
                    start: p,
                    rect: Rect::new(p.x, p.y, 0.0, 0.0),
                };
            }
        }
    }

    pub fn pointer_move(&mut self, p: Point) {
        match self.gesture {
            Gesture::Drag { id, grab, .. } => {
                let nx = p.x - grab.x;
                let ny = p.y - grab.y;
                if self.store.update(id, |el| {
                    el.x = nx;
                    el.y = ny;
                }) {
                    if let Gesture::Drag { moved, .. } = &mut self.gesture {
                        *moved = true;
                    }
                    // Applied locally first; the push never blocks the UI.
                    self.sync_element(id);
                }
            }
            Gesture::Draw { start, .. } => {
                let rect = Rect::from_corners(start, p);
                if let Gesture::Draw { rect: r, .. } = &mut self.gesture {
                    *r = rect;
                }
            }
            Gesture::Idle => {}
        }
    }

    pub fn pointer_up(&mut self) {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => {}
            Gesture::Drag { moved, .. } => {
                // Intermediate positions were synced per move; history gets
                // one entry for the whole gesture.
                if moved {
                    self.commit_history();
                }
            }
            Gesture::Draw { rect, .. } => {
                // A click with no drag creates nothing.
                if rect.width > 0.0 && rect.height > 0.0 {
                    if let Some(kind) = self.kind_for_tool(rect) {
                        let el = Element::new(self.current_page, rect, kind);
                        let id = el.id;
                        self.store.add(el);
                        self.selected = Some(id);
                        self.commit_history();
                        self.sync_element(id);
                    }
                }
            }
        }
    }

    pub fn cancel_gesture(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Element fields for a creation-gesture commit, synthesized from the
    /// active tool's property defaults.
    fn kind_for_tool(&self, rect: Rect) -> Option<ElementKind> {
        match self.current_tool {
            Tool::Select => None,
            Tool::Text => {
                let d = &self.text_defaults;
                Some(ElementKind::Text {
                    content: d.content.clone(),
                    font_size: d.font_size,
                    font_family: d.font_family.clone(),
                    color: d.color,
                    background: d.background,
                    bold: d.bold,
                    italic: d.italic,
                    underline: d.underline,
                    align: d.align,
                    line_height: d.line_height,
                })
            }
            Tool::Image => Some(ElementKind::Image {
                src: String::new(),
                original_width: rect.width,
                original_height: rect.height,
                keep_aspect: true,
            }),
            Tool::Signature => Some(ElementKind::Signature {
                image_data: String::new(),
                origin: SignatureOrigin::Type,
            }),
            tool => {
                let d = &self.shape_defaults;
                Some(ElementKind::Shape {
                    shape: tool.shape_type()?,
                    stroke_color: d.stroke_color,
                    fill_color: d.fill_color,
                    stroke_width: d.stroke_width,
                    stroke_style: d.stroke_style,
                })
            }
        }
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.cancel_gesture();
        self.current_tool = tool;
        self.set_status(format!("Tool: {}", tool.name()));
    }

    // --- Undo/redo ---

    pub fn undo(&mut self) {
        match self.history.undo(&mut self.store) {
            Ok(true) => {
                self.prune_selection();
                self.set_status("Undo");
            }
            Ok(false) => self.set_status("Nothing to undo"),
            Err(e) => self.set_status(format!("Undo error: {e}")),
        }
    }

    pub fn redo(&mut self) {
        match self.history.redo(&mut self.store) {
            Ok(true) => {
                self.prune_selection();
                self.set_status("Redo");
            }
            Ok(false) => self.set_status("Nothing to redo"),
            Err(e) => self.set_status(format!("Redo error: {e}")),
        }
    }

    fn prune_selection(&mut self) {
        if let Some(id) = self.selected {
            if !self.store.contains(id) {
                self.selected = None;
            }
        }
    }

    // --- Element operations ---

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected.take() {
            if self.store.remove(id).is_some() {
                self.commit_history();
                self.push_sync(SyncCommand::Delete { id });
                self.set_status("Deleted element");
            }
        }
    }

    /// Apply a property edit to the selected element: one history entry and
    /// one sync push per edit. Returns false when nothing is selected.
    fn edit_selected(&mut self, f: impl FnOnce(&mut Element)) -> bool {
        let Some(id) = self.selected else {
            return false;
        };
        if !self.store.update(id, f) {
            return false;
        }
        self.commit_history();
        self.sync_element(id);
        true
    }

    fn selected_kind(&self) -> Option<&ElementKind> {
        self.selected
            .and_then(|id| self.store.get(id))
            .map(|el| &el.kind)
    }

    pub fn toggle_visible(&mut self) {
        if self.edit_selected(|el| el.visible = !el.visible) {
            self.set_status("Toggled visibility");
        }
    }

    pub fn toggle_locked(&mut self) {
        if self.edit_selected(|el| el.locked = !el.locked) {
            self.set_status("Toggled lock");
        }
    }

    pub fn raise_layer(&mut self) {
        self.edit_selected(|el| el.layer += 1);
    }

    pub fn lower_layer(&mut self) {
        self.edit_selected(|el| el.layer -= 1);
    }

    pub fn rotate_selected(&mut self) {
        self.edit_selected(|el| el.rotation = (el.rotation + ROTATE_STEP) % 360.0);
    }

    pub fn adjust_opacity(&mut self, delta: f32) {
        self.edit_selected(|el| el.opacity = (el.opacity + delta).clamp(0.0, 1.0));
    }

    // --- Text properties: apply to the selected text element, otherwise to
    // the tool defaults consumed by the next creation ---

    pub fn toggle_bold(&mut self) {
        if matches!(self.selected_kind(), Some(ElementKind::Text { .. })) {
            self.edit_selected(|el| {
                if let ElementKind::Text { bold, .. } = &mut el.kind {
                    *bold = !*bold;
                }
            });
        } else {
            self.text_defaults.bold = !self.text_defaults.bold;
            self.set_status(format!("Bold: {}", self.text_defaults.bold));
        }
    }

    pub fn toggle_italic(&mut self) {
        if matches!(self.selected_kind(), Some(ElementKind::Text { .. })) {
            self.edit_selected(|el| {
                if let ElementKind::Text { italic, .. } = &mut el.kind {
                    *italic = !*italic;
                }
            });
        } else {
            self.text_defaults.italic = !self.text_defaults.italic;
            self.set_status(format!("Italic: {}", self.text_defaults.italic));
        }
    }

    pub fn toggle_underline(&mut self) {
        if matches!(self.selected_kind(), Some(ElementKind::Text { .. })) {
            self.edit_selected(|el| {
                if let ElementKind::Text { underline, .. } = &mut el.kind {
                    *underline = !*underline;
                }
            });
        } else {
            self.text_defaults.underline = !self.text_defaults.underline;
            self.set_status(format!("Underline: {}", self.text_defaults.underline));
        }
    }

    pub fn cycle_align(&mut self) {
        if matches!(self.selected_kind(), Some(ElementKind::Text { .. })) {
            self.edit_selected(|el| {
                if let ElementKind::Text { align, .. } = &mut el.kind {
                    *align = align.next();
                }
            });
        } else {
            self.text_defaults.align = self.text_defaults.align.next();
            self.set_status(format!("Align: {}", self.text_defaults.align.name()));
        }
    }

    pub fn adjust_font_size(&mut self, delta: f32) {
        if matches!(self.selected_kind(), Some(ElementKind::Text { .. })) {
            self.edit_selected(|el| {
                if let ElementKind::Text { font_size, .. } = &mut el.kind {
                    *font_size = (*font_size + delta).clamp(8.0, 72.0);
                }
            });
        } else {
            self.text_defaults.font_size =
                (self.text_defaults.font_size + delta).clamp(8.0, 72.0);
            self.set_status(format!("Font size: {}", self.text_defaults.font_size));
        }
    }

    // --- Shape properties, same dual behavior ---

    pub fn cycle_stroke_style(&mut self) {
        if matches!(self.selected_kind(), Some(ElementKind::Shape { .. })) {
            self.edit_selected(|el| {
                if let ElementKind::Shape { stroke_style, .. } = &mut el.kind {
                    *stroke_style = stroke_style.next();
                }
            });
        } else {
            self.shape_defaults.stroke_style = self.shape_defaults.stroke_style.next();
            self.set_status(format!(
                "Stroke: {}",
                self.shape_defaults.stroke_style.name()
            ));
        }
    }

    pub fn adjust_stroke_width(&mut self, delta: f32) {
        if matches!(self.selected_kind(), Some(ElementKind::Shape { .. })) {
            self.edit_selected(|el| {
                if let ElementKind::Shape { stroke_width, .. } = &mut el.kind {
                    *stroke_width = (*stroke_width + delta).clamp(1.0, 20.0);
                }
            });
        } else {
            self.shape_defaults.stroke_width =
                (self.shape_defaults.stroke_width + delta).clamp(1.0, 20.0);
            self.set_status(format!(
                "Stroke width: {}",
                self.shape_defaults.stroke_width
            ));
        }
    }

    pub fn cycle_stroke_color(&mut self) {
        if matches!(self.selected_kind(), Some(ElementKind::Shape { .. })) {
            self.edit_selected(|el| {
                if let ElementKind::Shape { stroke_color, .. } = &mut el.kind {
                    *stroke_color = next_color(*stroke_color);
                }
            });
        } else if matches!(self.selected_kind(), Some(ElementKind::Text { .. })) {
            self.edit_selected(|el| {
                if let ElementKind::Text { color, .. } = &mut el.kind {
                    *color = next_color(*color);
                }
            });
        } else {
            self.shape_defaults.stroke_color = next_color(self.shape_defaults.stroke_color);
            self.text_defaults.color = self.shape_defaults.stroke_color;
            self.set_status(format!(
                "Color: {}",
                self.shape_defaults.stroke_color.to_hex()
            ));
        }
    }

    pub fn cycle_fill_color(&mut self) {
        if matches!(self.selected_kind(), Some(ElementKind::Shape { .. })) {
            self.edit_selected(|el| {
                if let ElementKind::Shape { fill_color, .. } = &mut el.kind {
                    *fill_color = next_fill(*fill_color);
                }
            });
        } else {
            self.shape_defaults.fill_color = next_fill(self.shape_defaults.fill_color);
            let name = match self.shape_defaults.fill_color {
                Some(c) => c.to_hex(),
                None => "none".into(),
            };
            self.set_status(format!("Fill: {name}"));
        }
    }

    // --- Content editing ---

    pub fn start_content_edit(&mut self) -> bool {
        let Some(el) = self.selected.and_then(|id| self.store.get(id)) else {
            return false;
        };
        let text = match &el.kind {
            ElementKind::Text { content, .. } => content.clone(),
            ElementKind::Image { src, .. } => src.clone(),
            ElementKind::Signature { image_data, .. } => image_data.clone(),
            ElementKind::Shape { .. } => return false,
        };
        self.mode = Mode::ContentInput { id: el.id, text };
        true
    }

    pub fn push_input_char(&mut self, ch: char) {
        match &mut self.mode {
            Mode::ContentInput { text, .. } => text.push(ch),
            Mode::ExportPath { path } => path.push(ch),
            Mode::Normal => {}
        }
    }

    pub fn backspace_input(&mut self) {
        match &mut self.mode {
            Mode::ContentInput { text, .. } => {
                text.pop();
            }
            Mode::ExportPath { path } => {
                path.pop();
            }
            Mode::Normal => {}
        }
    }

    pub fn commit_content_edit(&mut self) {
        if let Mode::ContentInput { id, text } = std::mem::replace(&mut self.mode, Mode::Normal) {
            let changed = self.store.update(id, move |el| match &mut el.kind {
                ElementKind::Text { content, .. } => *content = text,
                ElementKind::Image { src, .. } => *src = text,
                ElementKind::Signature { image_data, .. } => *image_data = text,
                ElementKind::Shape { .. } => {}
            });
            if changed {
                self.commit_history();
                self.sync_element(id);
            }
        }
    }

    pub fn cancel_input(&mut self) {
        self.mode = Mode::Normal;
    }

    // --- Pages ---

    pub fn next_page(&mut self) {
        let count = self.page_count();
        if count > 0 && self.current_page + 1 < count {
            self.current_page += 1;
            self.cancel_gesture();
            self.selected = None;
        }
    }

    pub fn prev_page(&mut self) {
        if self.current_page > 0 {
            self.current_page -= 1;
            self.cancel_gesture();
            self.selected = None;
        }
    }

    // --- Export ---

    pub fn start_export(&mut self) {
        if self.session_id.is_none() {
            self.set_status("No active session - export needs sync");
            return;
        }
        let initial = self
            .file_path
            .as_ref()
            .map(|p| {
                let stem = p
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "document".into());
                p.with_file_name(format!("{stem}_annotated.pdf"))
                    .to_string_lossy()
                    .into_owned()
            })
            .unwrap_or_else(|| "annotated.pdf".into());
        self.mode = Mode::ExportPath { path: initial };
    }

    pub fn confirm_export(&mut self) {
        if let Mode::ExportPath { path } = std::mem::replace(&mut self.mode, Mode::Normal) {
            self.pending_export = Some(PathBuf::from(path));
            self.push_sync(SyncCommand::Save);
            self.set_status("Saving document...");
        }
    }

    /// Called when the worker delivers the saved document bytes.
    pub fn finish_export(&mut self, bytes: &[u8]) {
        let Some(path) = self.pending_export.take() else {
            return;
        };
        match std::fs::write(&path, bytes) {
            Ok(()) => self.set_status(format!("Exported to {}", path.display())),
            Err(e) => self.set_status(format!("Export error: {e}")),
        }
    }
}

fn next_color(current: Rgb) -> Rgb {
    let idx = PALETTE.iter().position(|&c| c == current);
    match idx {
        Some(i) => PALETTE[(i + 1) % PALETTE.len()],
        None => PALETTE[0],
    }
}

/// None (no fill) is part of the cycle.
fn next_fill(current: Option<Rgb>) -> Option<Rgb> {
    match current {
        None => Some(PALETTE[0]),
        Some(c) => match PALETTE.iter().position(|&p| p == c) {
            Some(i) if i + 1 < PALETTE.len() => Some(PALETTE[i + 1]),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::StrokeStyle;

    fn app() -> App {
        App::new(120, 40).unwrap()
    }

    fn text_element(rect: Rect) -> Element {
        Element::new(
            0,
            rect,
            ElementKind::Text {
                content: "hi".into(),
                font_size: 16.0,
                font_family: "Helvetica".into(),
                color: Rgb::BLACK,
                background: None,
                bold: false,
                italic: false,
                underline: false,
                align: TextAlign::Left,
                line_height: 1.2,
            },
        )
    }

    fn circle_element(rect: Rect, layer: i32) -> Element {
        let mut el = Element::new(
            0,
            rect,
            ElementKind::Shape {
                shape: ShapeType::Circle,
                stroke_color: Rgb::BLACK,
                fill_color: None,
                stroke_width: 2.0,
                stroke_style: StrokeStyle::Solid,
            },
        );
        el.layer = layer;
        el
    }

    #[test]
    fn draw_rectangle_then_undo_then_redo() {
        let mut app = app();
        app.set_tool(Tool::Rectangle);

        app.pointer_down(Point::new(10.0, 10.0));
        app.pointer_move(Point::new(100.0, 80.0));
        app.pointer_up();

        assert_eq!(app.store.len(), 1);
        let el = app.store.iter().next().unwrap();
        let id = el.id;
        assert_eq!((el.x, el.y, el.width, el.height), (10.0, 10.0, 90.0, 70.0));
        assert!(matches!(
            el.kind,
            ElementKind::Shape {
                shape: ShapeType::Rectangle,
                ..
            }
        ));
        assert_eq!(app.selected, Some(id));

        app.undo();
        assert!(app.store.is_empty());
        assert_eq!(app.selected, None);

        // The element reappears with an identical id.
        app.redo();
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.iter().next().unwrap().id, id);
    }

    #[test]
    fn zero_size_click_creates_nothing() {
        let mut app = app();
        app.set_tool(Tool::Circle);

        app.pointer_down(Point::new(5.0, 5.0));
        app.pointer_up();

        assert!(app.store.is_empty());
        assert!(!app.history.can_undo());
    }

    #[test]
    fn drag_changes_only_position() {
        let mut app = app();
        let el = text_element(Rect::new(50.0, 50.0, 100.0, 30.0));
        let id = el.id;
        let modified_before = el.modified;
        app.store.add(el);

        // Grab at (60,60), release at (80,90): the element moves by (20,30).
        app.pointer_down(Point::new(60.0, 60.0));
        assert_eq!(app.selected, Some(id));
        app.pointer_move(Point::new(80.0, 90.0));
        app.pointer_up();

        let el = app.store.get(id).unwrap();
        assert_eq!((el.x, el.y), (70.0, 80.0));
        assert_eq!((el.width, el.height), (100.0, 30.0));
        assert!(el.modified > modified_before);
    }

    #[test]
    fn drag_coalesces_into_one_history_entry() {
        let mut app = app();
        let el = text_element(Rect::new(0.0, 0.0, 10.0, 10.0));
        let id = el.id;
        app.store.add(el);
        app.commit_history();

        app.pointer_down(Point::new(5.0, 5.0));
        for i in 1..=20 {
            app.pointer_move(Point::new(5.0 + i as f32, 5.0));
        }
        app.pointer_up();

        // One undo returns to the pre-drag position, not an intermediate one.
        app.undo();
        assert_eq!(app.store.get(id).unwrap().x, 0.0);
    }

    #[test]
    fn click_on_empty_canvas_deselects() {
        let mut app = app();
        let el = text_element(Rect::new(0.0, 0.0, 10.0, 10.0));
        app.store.add(el);

        app.pointer_down(Point::new(5.0, 5.0));
        assert!(app.selected.is_some());
        app.pointer_up();

        app.pointer_down(Point::new(500.0, 500.0));
        assert_eq!(app.selected, None);
    }

    #[test]
    fn overlapping_click_selects_higher_layer() {
        let mut app = app();
        let low = circle_element(Rect::new(0.0, 0.0, 50.0, 50.0), 1);
        let high = circle_element(Rect::new(0.0, 0.0, 50.0, 50.0), 2);
        let high_id = high.id;
        app.store.add(low);
        app.store.add(high);

        app.pointer_down(Point::new(25.0, 25.0));
        assert_eq!(app.selected, Some(high_id));
    }

    #[test]
    fn text_commit_uses_tool_defaults() {
        let mut app = app();
        app.text_defaults.bold = true;
        app.text_defaults.content = "annotated".into();
        app.set_tool(Tool::Text);

        app.pointer_down(Point::new(0.0, 0.0));
        app.pointer_move(Point::new(40.0, 12.0));
        app.pointer_up();

        let el = app.store.iter().next().unwrap();
        match &el.kind {
            ElementKind::Text { content, bold, .. } => {
                assert_eq!(content, "annotated");
                assert!(*bold);
            }
            other => panic!("expected text element, got {other:?}"),
        }
    }

    #[test]
    fn delete_selected_removes_and_records_history() {
        let mut app = app();
        let el = text_element(Rect::new(0.0, 0.0, 10.0, 10.0));
        let id = el.id;
        app.store.add(el);
        app.commit_history();

        app.selected = Some(id);
        app.delete_selected();
        assert!(app.store.is_empty());
        assert_eq!(app.selected, None);

        app.undo();
        assert!(app.store.contains(id));
    }

    #[test]
    fn property_edit_without_selection_changes_defaults() {
        let mut app = app();
        assert!(!app.text_defaults.bold);
        app.toggle_bold();
        assert!(app.text_defaults.bold);
        // No element touched, no history entry.
        assert!(!app.history.can_undo());
    }

    #[test]
    fn content_edit_round_trip() {
        let mut app = app();
        let el = text_element(Rect::new(0.0, 0.0, 10.0, 10.0));
        let id = el.id;
        app.store.add(el);
        app.commit_history();
        app.selected = Some(id);

        assert!(app.start_content_edit());
        app.push_input_char('!');
        app.commit_content_edit();

        match &app.store.get(id).unwrap().kind {
            ElementKind::Text { content, .. } => assert_eq!(content, "hi!"),
            other => panic!("expected text, got {other:?}"),
        }
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn switching_tool_discards_in_progress_draw() {
        let mut app = app();
        app.set_tool(Tool::Rectangle);
        app.pointer_down(Point::new(0.0, 0.0));
        app.pointer_move(Point::new(30.0, 30.0));

        app.set_tool(Tool::Select);
        assert_eq!(app.gesture, Gesture::Idle);
        assert!(app.store.is_empty());
    }
}
