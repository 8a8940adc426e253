//! Annotation element model - the source of truth for everything placed on
//! top of the document pages.
//!
//! Elements are plain data: the interaction code mutates them through
//! [`ElementStore`], the renderer reads them back, and the history manager
//! snapshots the whole store after every committed mutation.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Point, Rect};

/// Element identifier - UUID for global uniqueness across pages and sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// 24-bit color, parsed from `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert to ratatui Color for terminal rendering
    pub fn to_ratatui(self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Horizontal text alignment within the element box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn next(self) -> Self {
        match self {
            TextAlign::Left => TextAlign::Center,
            TextAlign::Center => TextAlign::Right,
            TextAlign::Right => TextAlign::Left,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Stroke dash pattern for shape outlines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    pub fn next(self) -> Self {
        match self {
            StrokeStyle::Solid => StrokeStyle::Dashed,
            StrokeStyle::Dashed => StrokeStyle::Dotted,
            StrokeStyle::Dotted => StrokeStyle::Solid,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StrokeStyle::Solid => "solid",
            StrokeStyle::Dashed => "dashed",
            StrokeStyle::Dotted => "dotted",
        }
    }
}

/// Geometric shape carried by a shape element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rectangle,
    Circle,
    Line,
    Arrow,
}

impl ShapeType {
    pub fn name(self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Circle => "circle",
            ShapeType::Line => "line",
            ShapeType::Arrow => "arrow",
        }
    }
}

/// How a signature was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureOrigin {
    Draw,
    #[default]
    Type,
    Upload,
}

/// Type-specific payload of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text {
        /// May contain embedded newlines; each line renders on its own row.
        content: String,
        font_size: f32,
        font_family: String,
        color: Rgb,
        /// None renders no background (the wire format's "transparent").
        background: Option<Rgb>,
        bold: bool,
        italic: bool,
        underline: bool,
        align: TextAlign,
        line_height: f32,
    },
    Shape {
        shape: ShapeType,
        stroke_color: Rgb,
        /// None means unfilled.
        fill_color: Option<Rgb>,
        stroke_width: f32,
        stroke_style: StrokeStyle,
    },
    Image {
        src: String,
        original_width: f32,
        original_height: f32,
        keep_aspect: bool,
    },
    Signature {
        image_data: String,
        origin: SignatureOrigin,
    },
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Text { .. } => "text",
            ElementKind::Shape { shape, .. } => shape.name(),
            ElementKind::Image { .. } => "image",
            ElementKind::Signature { .. } => "signature",
        }
    }
}

/// One placed annotation on a document page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    /// Zero-based page the element belongs to; rendered and hit-testable
    /// only while this page is current.
    pub page_index: usize,
    /// Position and size in document space, never screen cells.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Stacking order; higher draws on top and wins overlapping hit-tests.
    pub layer: i32,
    pub visible: bool,
    pub locked: bool,
    /// Degrees about the element center.
    pub rotation: f32,
    pub opacity: f32,
    pub created: u64,
    pub modified: u64,
    pub kind: ElementKind,
}

impl Element {
    pub fn new(page_index: usize, rect: Rect, kind: ElementKind) -> Self {
        let now = now_millis();
        Self {
            id: ElementId::new(),
            page_index,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            layer: 1,
            visible: true,
            locked: false,
            rotation: 0.0,
            opacity: 1.0,
            created: now,
            modified: now,
            kind,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Bump the modification timestamp. The clock can tick twice within one
    /// millisecond, so this forces strict monotonicity.
    pub fn touch(&mut self) {
        self.modified = now_millis().max(self.modified + 1);
    }
}

/// The element collection - sole owner of all element data. Collection order
/// is insertion order; draw order and hit-test order are governed by `layer`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementStore {
    elements: Vec<Element>,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|el| el.id == id)
    }

    /// Apply an edit to an element and bump its `modified` timestamp.
    /// Updating an unknown id is a no-op and returns false; interaction code
    /// relies on this instead of handling a missing-id error.
    pub fn update(&mut self, id: ElementId, f: impl FnOnce(&mut Element)) -> bool {
        match self.elements.iter_mut().find(|el| el.id == id) {
            Some(el) => {
                f(el);
                el.touch();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let idx = self.elements.iter().position(|el| el.id == id)?;
        Some(self.elements.remove(idx))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.iter().any(|el| el.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn page_elements(&self, page: usize) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |el| el.page_index == page)
    }

    /// Visible elements of a page in draw order: ascending layer, insertion
    /// order breaking ties (Vec::sort_by is stable).
    pub fn render_order(&self, page: usize) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self
            .elements
            .iter()
            .filter(|el| el.page_index == page && el.visible)
            .collect();
        ordered.sort_by(|a, b| a.layer.cmp(&b.layer));
        ordered
    }

    /// Topmost interactive element under a document-space point. Scans in
    /// reverse draw order so overlapping elements resolve to the one drawn
    /// on top; invisible and locked elements are skipped.
    pub fn hit_test(&self, page: usize, p: Point) -> Option<ElementId> {
        self.render_order(page)
            .iter()
            .rev()
            .find(|el| !el.locked && el.bounds().contains(p))
            .map(|el| el.id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Serialize the full collection for an undo snapshot.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(&self.elements).context("serializing element snapshot")
    }

    /// Restore the collection from a snapshot produced by [`snapshot`].
    ///
    /// [`snapshot`]: ElementStore::snapshot
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self> {
        let elements = rmp_serde::from_slice(bytes).context("decoding element snapshot")?;
        Ok(Self { elements })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_kind() -> ElementKind {
        ElementKind::Text {
            content: "hello".into(),
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

    fn circle_at(rect: Rect, layer: i32) -> Element {
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
    fn update_bumps_modified_and_preserves_other_fields() {
        let mut store = ElementStore::new();
        let el = Element::new(0, Rect::new(50.0, 50.0, 100.0, 30.0), text_kind());
        let id = el.id;
        let before = el.clone();
        store.add(el);

        assert!(store.update(id, |el| {
            el.x += 20.0;
            el.y += 30.0;
        }));

        let after = store.get(id).unwrap();
        assert_eq!(after.x, 70.0);
        assert_eq!(after.y, 80.0);
        assert_eq!(after.width, before.width);
        assert_eq!(after.height, before.height);
        assert_eq!(after.kind, before.kind);
        assert!(after.modified > before.modified);
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let mut store = ElementStore::new();
        assert!(!store.update(ElementId::new(), |el| el.x = 1.0));
        assert!(store.is_empty());
    }

    #[test]
    fn hit_test_prefers_higher_layer() {
        let mut store = ElementStore::new();
        let low = circle_at(Rect::new(0.0, 0.0, 50.0, 50.0), 1);
        let high = circle_at(Rect::new(10.0, 10.0, 50.0, 50.0), 2);
        let high_id = high.id;
        // Insert the high layer first so layer order, not insertion order,
        // decides the winner.
        store.add(high);
        store.add(low);

        assert_eq!(store.hit_test(0, Point::new(25.0, 25.0)), Some(high_id));
    }

    #[test]
    fn hit_test_skips_invisible_and_locked() {
        let mut store = ElementStore::new();
        let mut hidden = circle_at(Rect::new(0.0, 0.0, 50.0, 50.0), 3);
        hidden.visible = false;
        let mut locked = circle_at(Rect::new(0.0, 0.0, 50.0, 50.0), 2);
        locked.locked = true;
        let plain = circle_at(Rect::new(0.0, 0.0, 50.0, 50.0), 1);
        let plain_id = plain.id;
        store.add(hidden);
        store.add(locked);
        store.add(plain);

        assert_eq!(store.hit_test(0, Point::new(25.0, 25.0)), Some(plain_id));
    }

    #[test]
    fn hit_test_ignores_other_pages() {
        let mut store = ElementStore::new();
        let mut el = circle_at(Rect::new(0.0, 0.0, 50.0, 50.0), 1);
        el.page_index = 2;
        store.add(el);

        assert_eq!(store.hit_test(0, Point::new(25.0, 25.0)), None);
    }

    #[test]
    fn snapshot_round_trips() {
        let mut store = ElementStore::new();
        store.add(Element::new(1, Rect::new(10.0, 10.0, 90.0, 70.0), text_kind()));
        store.add(circle_at(Rect::new(0.0, 0.0, 20.0, 20.0), 4));

        let bytes = store.snapshot().unwrap();
        let restored = ElementStore::from_snapshot(&bytes).unwrap();
        assert_eq!(store, restored);
    }

    #[test]
    fn rgb_hex_parsing() {
        assert_eq!(Rgb::from_hex("#007bff"), Some(Rgb::new(0, 0x7b, 0xff)));
        assert_eq!(Rgb::from_hex("007bff"), None);
        assert_eq!(Rgb::from_hex("#xyzxyz"), None);
        assert_eq!(Rgb::new(0, 0x7b, 0xff).to_hex(), "#007bff");
    }
}
