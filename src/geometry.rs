use serde::{Deserialize, Serialize};

/// A point in document space (unscaled PDF points).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A delta in document space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in document space. Width and height are
/// non-negative for every committed element; only the in-progress draw
/// candidate may pass through zero size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanning two opposite corners, so a drag in any
    /// of the four directions yields a positive-size rect.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x
            && p.x <= self.x + self.width
            && p.y >= self.y
            && p.y <= self.y + self.height
    }
}

/// Maps document space to terminal cells and back. All screen/document
/// conversions in the editor go through this type so the renderer and the
/// pointer code can never disagree about the transform.
#[derive(Debug, Clone)]
pub struct Viewport {
    /// Zoom factor: one document point occupies `zoom` terminal cells.
    pub zoom: f32,
    /// Scroll offset in screen cells.
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub width: u16,
    pub height: u16,
}

pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 4.0;
const ZOOM_STEP: f32 = 1.1;

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            zoom: 0.15,
            scroll_x: 0.0,
            scroll_y: 0.0,
            width,
            height,
        }
    }

    /// Convert a screen cell to document coordinates. A screen delta
    /// `(sx, sy)` translates to a document delta `(sx / zoom, sy / zoom)`.
    pub fn screen_to_doc(&self, col: u16, row: u16) -> Point {
        Point::new(
            (col as f32 + self.scroll_x) / self.zoom,
            (row as f32 + self.scroll_y) / self.zoom,
        )
    }

    /// Convert a document point to a screen cell (may be off-screen).
    pub fn doc_to_screen(&self, p: Point) -> (i32, i32) {
        (
            (p.x * self.zoom - self.scroll_x).round() as i32,
            (p.y * self.zoom - self.scroll_y).round() as i32,
        )
    }

    /// Convert a document rect to screen cells `(x0, y0, x1, y1)` inclusive.
    pub fn doc_rect_to_screen(&self, r: Rect) -> (i32, i32, i32, i32) {
        let (x0, y0) = self.doc_to_screen(Point::new(r.x, r.y));
        let (x1, y1) = self.doc_to_screen(Point::new(r.x + r.width, r.y + r.height));
        (x0, y0, x1.max(x0), y1.max(y0))
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Pan the viewport by screen cells.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.scroll_x += dx;
        self.scroll_y += dy;
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn from_corners_normalizes_any_direction() {
        let a = Point::new(100.0, 80.0);
        let b = Point::new(10.0, 10.0);
        let r = Rect::from_corners(a, b);
        assert_eq!(r, Rect::new(10.0, 10.0, 90.0, 70.0));
        // Same rect regardless of drag direction
        assert_eq!(r, Rect::from_corners(b, a));
    }

    #[test]
    fn screen_delta_scales_by_inverse_zoom() {
        let mut vp = Viewport::new(80, 24);
        vp.zoom = 2.0;
        let a = vp.screen_to_doc(10, 10);
        let b = vp.screen_to_doc(14, 16);
        assert!((b.x - a.x - 4.0 / 2.0).abs() < 1e-5);
        assert!((b.y - a.y - 6.0 / 2.0).abs() < 1e-5);
    }

    #[test]
    fn doc_to_screen_inverts_screen_to_doc() {
        let mut vp = Viewport::new(80, 24);
        vp.zoom = 0.5;
        vp.scroll_x = 7.0;
        vp.scroll_y = 3.0;
        let p = vp.screen_to_doc(23, 11);
        assert_eq!(vp.doc_to_screen(p), (23, 11));
    }

    proptest! {
        #[test]
        fn from_corners_always_non_negative(
            ax in -1e4f32..1e4, ay in -1e4f32..1e4,
            bx in -1e4f32..1e4, by in -1e4f32..1e4,
        ) {
            let r = Rect::from_corners(Point::new(ax, ay), Point::new(bx, by));
            prop_assert!(r.width >= 0.0);
            prop_assert!(r.height >= 0.0);
            prop_assert_eq!(r.x, ax.min(bx));
            prop_assert_eq!(r.y, ay.min(by));
        }
    }
}
