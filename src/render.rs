//! Overlay render pipeline: page sheet, elements in layer order, selection
//! handles, in-progress draw preview.
//!
//! The widget is a pure function of the app state - each frame renders from
//! scratch into the buffer, so redraws are idempotent. Rotation is carried
//! in the model but not applied here: a cell grid cannot rotate glyphs, so
//! it only takes effect in exported output. Opacity below 1.0 maps to the
//! DIM modifier.

use ratatui::{
    buffer::Buffer,
    layout::Rect as ScreenRect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

use crate::app::{App, Gesture, Tool};
use crate::draw;
use crate::element::{Element, ElementKind, Rgb, ShapeType, StrokeStyle, TextAlign};
use crate::geometry::Rect;

const PAGE_BG: Color = Color::White;
const PAGE_BORDER: Color = Color::DarkGray;
const HANDLE_COLOR: Color = Color::Cyan;
const PREVIEW_COLOR: Color = Color::Yellow;

pub struct CanvasWidget<'a> {
    pub app: &'a App,
}

impl CanvasWidget<'_> {
    fn put(&self, buf: &mut Buffer, area: ScreenRect, x: i32, y: i32, ch: char, style: Style) {
        if x < 0 || y < 0 {
            return;
        }
        let x = area.x as i32 + x;
        let y = area.y as i32 + y;
        if x >= area.x as i32
            && x < (area.x + area.width) as i32
            && y >= area.y as i32
            && y < (area.y + area.height) as i32
        {
            buf[(x as u16, y as u16)].set_char(ch).set_style(style);
        }
    }

    fn fill(
        &self,
        buf: &mut Buffer,
        area: ScreenRect,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        style: Style,
    ) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.put(buf, area, x, y, ' ', style);
            }
        }
    }

    fn element_style(&self, el: &Element, fg: Rgb) -> Style {
        let mut style = Style::default().fg(fg.to_ratatui()).bg(PAGE_BG);
        if el.opacity < 1.0 {
            style = style.add_modifier(Modifier::DIM);
        }
        style
    }

    fn render_page(&self, buf: &mut Buffer, area: ScreenRect) {
        let Some(doc) = &self.app.doc else {
            return;
        };
        match doc.page_size(self.app.current_page) {
            Some(size) => {
                let page_rect = Rect::new(0.0, 0.0, size.width, size.height);
                let (x0, y0, x1, y1) = self.app.viewport.doc_rect_to_screen(page_rect);
                self.fill(buf, area, x0, y0, x1, y1, Style::default().bg(PAGE_BG));
                for (x, y, ch) in draw::rect_outline(x0, y0, x1, y1, StrokeStyle::Solid) {
                    self.put(
                        buf,
                        area,
                        x,
                        y,
                        ch,
                        Style::default().fg(PAGE_BORDER).bg(PAGE_BG),
                    );
                }
            }
            None => {
                // Page-level failure: the document stays usable, the broken
                // page just reports itself.
                let msg = format!("page {} could not be rendered", self.app.current_page + 1);
                let x = (area.width.saturating_sub(msg.len() as u16)) / 2;
                let y = area.height / 2;
                for (i, ch) in msg.chars().enumerate() {
                    self.put(
                        buf,
                        area,
                        x as i32 + i as i32,
                        y as i32,
                        ch,
                        Style::default().fg(Color::Red),
                    );
                }
            }
        }
    }

    fn render_element(&self, buf: &mut Buffer, area: ScreenRect, el: &Element) {
        let (x0, y0, x1, y1) = self.app.viewport.doc_rect_to_screen(el.bounds());
        match &el.kind {
            ElementKind::Text {
                content,
                color,
                background,
                bold,
                italic,
                underline,
                align,
                ..
            } => {
                let mut style = self.element_style(el, *color);
                if let Some(bg) = background {
                    style = style.bg(bg.to_ratatui());
                    self.fill(buf, area, x0, y0, x1, y1, style);
                }
                if *bold {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if *italic {
                    style = style.add_modifier(Modifier::ITALIC);
                }
                if *underline {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }

                let width = (x1 - x0 + 1).max(1) as usize;
                // One terminal row per text line; lines beyond the element
                // box are clipped.
                for (row, line) in content.split('\n').enumerate() {
                    let y = y0 + row as i32;
                    if y > y1 {
                        break;
                    }
                    let len = line.chars().count().min(width);
                    let start = match align {
                        TextAlign::Left => x0,
                        TextAlign::Center => x0 + ((width - len) / 2) as i32,
                        TextAlign::Right => x0 + (width - len) as i32,
                    };
                    for (i, ch) in line.chars().take(width).enumerate() {
                        self.put(buf, area, start + i as i32, y, ch, style);
                    }
                }
            }
            ElementKind::Shape {
                shape,
                stroke_color,
                fill_color,
                stroke_style,
                ..
            } => {
                let stroke = self.element_style(el, *stroke_color);
                if let Some(fill) = fill_color {
                    let fill_style = Style::default().bg(fill.to_ratatui());
                    match shape {
                        ShapeType::Rectangle => {
                            self.fill(buf, area, x0, y0, x1, y1, fill_style)
                        }
                        ShapeType::Circle => {
                            for (sx, ex, y) in draw::ellipse_fill_spans(x0, y0, x1, y1) {
                                for x in sx..=ex {
                                    self.put(buf, area, x, y, ' ', fill_style);
                                }
                            }
                        }
                        // Lines have no interior.
                        ShapeType::Line | ShapeType::Arrow => {}
                    }
                }
                let cells = match shape {
                    ShapeType::Rectangle => draw::rect_outline(x0, y0, x1, y1, *stroke_style),
                    ShapeType::Circle => draw::ellipse_outline(x0, y0, x1, y1),
                    ShapeType::Line => draw::line_outline(x0, y0, x1, y1, *stroke_style),
                    ShapeType::Arrow => draw::arrow_outline(x0, y0, x1, y1, *stroke_style),
                };
                for (x, y, ch) in cells {
                    self.put(buf, area, x, y, ch, stroke);
                }
            }
            ElementKind::Image { src, .. } => {
                let style = self.element_style(el, Rgb::new(0x80, 0x80, 0x80));
                for y in y0..=y1 {
                    for x in x0..=x1 {
                        self.put(buf, area, x, y, '▒', style);
                    }
                }
                let caption = if src.is_empty() { "image" } else { src.as_str() };
                self.caption(buf, area, x0, x1, (y0 + y1) / 2, caption, style);
            }
            ElementKind::Signature {
                image_data, origin, ..
            } => {
                let style = self
                    .element_style(el, Rgb::BLACK)
                    .add_modifier(Modifier::ITALIC);
                for (x, y, ch) in draw::rect_outline(x0, y0, x1, y1, StrokeStyle::Dotted) {
                    self.put(buf, area, x, y, ch, style);
                }
                let caption = match origin {
                    crate::element::SignatureOrigin::Type if !image_data.is_empty() => {
                        image_data.as_str()
                    }
                    _ => "signature",
                };
                self.caption(buf, area, x0, x1, (y0 + y1) / 2, caption, style);
            }
        }
    }

    /// Centered single-line caption clipped to the element width.
    fn caption(
        &self,
        buf: &mut Buffer,
        area: ScreenRect,
        x0: i32,
        x1: i32,
        y: i32,
        text: &str,
        style: Style,
    ) {
        let width = (x1 - x0 + 1).max(1) as usize;
        let len = text.chars().count().min(width);
        let start = x0 + ((width - len) / 2) as i32;
        for (i, ch) in text.chars().take(len).enumerate() {
            self.put(buf, area, start + i as i32, y, ch, style);
        }
    }

    fn render_selection(&self, buf: &mut Buffer, area: ScreenRect) {
        let Some(el) = self
            .app
            .selected
            .and_then(|id| self.app.store.get(id))
            .filter(|el| el.page_index == self.app.current_page)
        else {
            return;
        };
        let (x0, y0, x1, y1) = self.app.viewport.doc_rect_to_screen(el.bounds());
        let style = Style::default()
            .fg(HANDLE_COLOR)
            .add_modifier(Modifier::BOLD);
        // Fixed-size corner handles in screen space.
        for (x, y) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
            self.put(buf, area, x, y, '■', style);
        }
    }

    fn render_preview(&self, buf: &mut Buffer, area: ScreenRect) {
        if self.app.current_tool == Tool::Select {
            return;
        }
        let Gesture::Draw { rect, .. } = self.app.gesture else {
            return;
        };
        let (x0, y0, x1, y1) = self.app.viewport.doc_rect_to_screen(rect);
        let style = Style::default()
            .fg(PREVIEW_COLOR)
            .add_modifier(Modifier::DIM);
        for (x, y, ch) in draw::rect_outline(x0, y0, x1, y1, StrokeStyle::Dashed) {
            self.put(buf, area, x, y, ch, style);
        }
    }
}

impl Widget for CanvasWidget<'_> {
    fn render(self, area: ScreenRect, buf: &mut Buffer) {
        // 1. base page, 2. visible page elements ascending by layer,
        // 3. selection affordances, 4. draw preview.
        self.render_page(buf, area);
        for el in self.app.store.render_order(self.app.current_page) {
            self.render_element(buf, area, el);
        }
        self.render_selection(buf, area);
        self.render_preview(buf, area);
    }
}
