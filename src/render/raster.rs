//! Software rasterizer for page previews.
//!
//! Blocks are stacked top to bottom in page order and the frame grows to fit
//! them. Pixels are BGRX, the byte order X11 expects for 24/32-bit ZPixmap
//! images, so a frame can be handed to the window without conversion.

use std::path::Path;

use fontdue::{Font, FontSettings};
use image::{ColorType, ImageFormat, ImageResult};
use tracing::{debug, warn};

use crate::render::hit_test::{HitTestIndex, LinkRegion};
use crate::spec::model::{
    AlertProps, AlertVariant, BadgeProps, BadgeVariant, ButtonSize, ButtonVariant, CardProps,
    FeatureGridProps, HeroProps, InputProps, InputType, LabelProps, Orientation, ProgressProps,
    SeparatorProps, TestimonialProps, TextareaProps,
};
use crate::spec::{Component, PageSpec, Theme};

pub const FONT_ENV: &str = "PAGESPEC_FONT";

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

const MIN_WIDTH: u32 = 320;
const MARGIN: i32 = 32;
const BLOCK_GAP: i32 = 24;
const TEXT_GAP: i32 = 8;
const CARD_PAD: i32 = 20;
const CARD_GAP: i32 = 16;
const RADIUS: i32 = 8;

const HEADLINE: f32 = 40.0;
const TITLE: f32 = 28.0;
const LEAD: f32 = 20.0;
const BODY: f32 = 16.0;
const SMALL: f32 = 14.0;
const TINY: f32 = 12.0;

/// Average advance as a share of the em size, used to lay out text without a font.
const FALLBACK_ADVANCE: f32 = 0.55;

type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, Copy)]
struct Palette {
    background: Rgb,
    foreground: Rgb,
    muted: Rgb,
    muted_fg: Rgb,
    border: Rgb,
    card: Rgb,
    primary: Rgb,
    primary_fg: Rgb,
    secondary: Rgb,
    secondary_fg: Rgb,
    destructive: Rgb,
    destructive_fg: Rgb,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                background: (255, 255, 255),
                foreground: (15, 23, 42),
                muted: (241, 245, 249),
                muted_fg: (100, 116, 139),
                border: (226, 232, 240),
                card: (255, 255, 255),
                primary: (15, 23, 42),
                primary_fg: (248, 250, 252),
                secondary: (241, 245, 249),
                secondary_fg: (15, 23, 42),
                destructive: (239, 68, 68),
                destructive_fg: (248, 250, 252),
            },
            Theme::Dark => Self {
                background: (2, 8, 23),
                foreground: (248, 250, 252),
                muted: (30, 41, 59),
                muted_fg: (148, 163, 184),
                border: (30, 41, 59),
                card: (15, 23, 42),
                primary: (248, 250, 252),
                primary_fg: (15, 23, 42),
                secondary: (30, 41, 59),
                secondary_fg: (248, 250, 252),
                destructive: (220, 38, 38),
                destructive_fg: (248, 250, 252),
            },
        }
    }
}

/// A rendered page: BGRX pixels plus the link regions drawn into them.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub links: HitTestIndex,
}

impl Frame {
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        Some((self.pixels[idx + 2], self.pixels[idx + 1], self.pixels[idx]))
    }

    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(4) {
            rgba.extend_from_slice(&[px[2], px[1], px[0], 255]);
        }
        rgba
    }

    pub fn save_png(&self, path: &Path) -> ImageResult<()> {
        image::save_buffer_with_format(
            path,
            &self.to_rgba(),
            self.width,
            self.height,
            ColorType::Rgba8,
            ImageFormat::Png,
        )
    }
}

/// Loads the preview font from `PAGESPEC_FONT` or a few common system paths.
pub fn load_font() -> Option<Font> {
    let from_env = std::env::var(FONT_ENV).ok();
    let candidates = from_env
        .iter()
        .map(String::as_str)
        .chain(FONT_CANDIDATES.iter().copied());
    for path in candidates {
        if let Some(font) = load_font_from_path(Path::new(path)) {
            debug!(path, "loaded preview font");
            return Some(font);
        }
    }
    warn!("no usable font found; set {FONT_ENV} to draw text in previews");
    None
}

fn load_font_from_path(path: &Path) -> Option<Font> {
    let bytes = std::fs::read(path).ok()?;
    Font::from_bytes(bytes, FontSettings::default()).ok()
}

pub fn render_page(spec: &PageSpec, font: Option<&Font>, width: u32) -> Frame {
    let width = width.max(MIN_WIDTH);
    let palette = Palette::for_theme(spec.theme().unwrap_or_default());
    let mut layout = Layout {
        painter: Painter::new(width as usize, palette.background, font),
        palette,
        links: HitTestIndex::new(),
        cursor: MARGIN,
    };

    for block in spec.blocks() {
        let height = layout.block(block);
        debug!(kind = block.kind().as_str(), y = layout.cursor, height, "laid out block");
        layout.cursor += height + BLOCK_GAP;
    }
    let bottom = layout.cursor - BLOCK_GAP + MARGIN;
    layout.painter.grow_to(bottom);

    let Layout { painter, links, .. } = layout;
    Frame {
        width,
        height: painter.height as u32,
        pixels: painter.pixels,
        links,
    }
}

fn mix(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let lerp = |x: u8, y: u8| (x as f32 * (1.0 - t) + y as f32 * t).round() as u8;
    (lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

fn blend(fg: Rgb, bg: Rgb, alpha: u8) -> Rgb {
    let a = alpha as u16;
    let inv = 255 - a;
    let channel = |f: u8, b: u8| ((f as u16 * a + b as u16 * inv) / 255) as u8;
    (channel(fg.0, bg.0), channel(fg.1, bg.1), channel(fg.2, bg.2))
}

struct Painter<'f> {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    background: Rgb,
    font: Option<&'f Font>,
}

impl<'f> Painter<'f> {
    fn new(width: usize, background: Rgb, font: Option<&'f Font>) -> Self {
        Self {
            width,
            height: 0,
            pixels: Vec::new(),
            background,
            font,
        }
    }

    /// Extends the canvas with background rows until it is `rows` tall.
    fn grow_to(&mut self, rows: i32) {
        let rows = rows.max(0) as usize;
        if rows <= self.height {
            return;
        }
        let (r, g, b) = self.background;
        let added = (rows - self.height) * self.width;
        self.pixels.reserve(added * 4);
        for _ in 0..added {
            self.pixels.extend_from_slice(&[b, g, r, 0]);
        }
        self.height = rows;
    }

    fn get(&self, x: i32, y: i32) -> Option<Rgb> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        Some((self.pixels[idx + 2], self.pixels[idx + 1], self.pixels[idx]))
    }

    fn put(&mut self, x: i32, y: i32, rgb: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        self.pixels[idx] = rgb.2;
        self.pixels[idx + 1] = rgb.1;
        self.pixels[idx + 2] = rgb.0;
        self.pixels[idx + 3] = 0;
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, rgb: Rgb) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        for iy in y0..y1 {
            for ix in x0..x1 {
                self.put(ix, iy, rgb);
            }
        }
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, rgb: Rgb, t: i32) {
        let thickness = t.max(1);
        let half = thickness / 2;
        let mut x = x1;
        let mut y = y1;
        let dx = (x2 - x1).abs();
        let dy = -(y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.fill_rect(x - half, y - half, thickness, thickness, rgb);
            if x == x2 && y == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn draw_rect_outline(&mut self, x: i32, y: i32, w: i32, h: i32, rgb: Rgb, t: i32) {
        for i in 0..t {
            self.draw_line(x, y + i, x + w - 1, y + i, rgb, 1);
            self.draw_line(x, y + h - 1 - i, x + w - 1, y + h - 1 - i, rgb, 1);
            self.draw_line(x + i, y, x + i, y + h - 1, rgb, 1);
            self.draw_line(x + w - 1 - i, y, x + w - 1 - i, y + h - 1, rgb, 1);
        }
    }

    fn fill_round_rect(&mut self, x: i32, y: i32, w: i32, h: i32, r: i32, rgb: Rgb) {
        let r = r.min(w.min(h) / 2).max(0);
        self.fill_rect(x + r, y, w - 2 * r, h, rgb);
        self.fill_rect(x, y + r, r, h - 2 * r, rgb);
        self.fill_rect(x + w - r, y + r, r, h - 2 * r, rgb);
        self.fill_circle_quadrant(x + r, y + r, r, rgb, -1, -1);
        self.fill_circle_quadrant(x + w - r - 1, y + r, r, rgb, 1, -1);
        self.fill_circle_quadrant(x + r, y + h - r - 1, r, rgb, -1, 1);
        self.fill_circle_quadrant(x + w - r - 1, y + h - r - 1, r, rgb, 1, 1);
    }

    fn fill_circle_quadrant(&mut self, cx: i32, cy: i32, r: i32, rgb: Rgb, sx: i32, sy: i32) {
        let r2 = (r * r) as f32;
        for dy in 0..=r {
            let dx = (r2 - (dy * dy) as f32).sqrt() as i32;
            let x_start = if sx < 0 { cx - dx } else { cx };
            self.fill_rect(x_start, cy + sy * dy, dx + 1, 1, rgb);
        }
    }

    fn draw_round_rect_outline(&mut self, x: i32, y: i32, w: i32, h: i32, r: i32, rgb: Rgb, t: i32) {
        let r = r.min(w.min(h) / 2).max(0);
        self.draw_line(x + r, y, x + w - r - 1, y, rgb, t);
        self.draw_line(x + r, y + h - 1, x + w - r - 1, y + h - 1, rgb, t);
        self.draw_line(x, y + r, x, y + h - r - 1, rgb, t);
        self.draw_line(x + w - 1, y + r, x + w - 1, y + h - r - 1, rgb, t);
        self.draw_arc(x + r, y + r, r, 180.0, 270.0, rgb, t);
        self.draw_arc(x + w - r - 1, y + r, r, 270.0, 360.0, rgb, t);
        self.draw_arc(x + w - r - 1, y + h - r - 1, r, 0.0, 90.0, rgb, t);
        self.draw_arc(x + r, y + h - r - 1, r, 90.0, 180.0, rgb, t);
    }

    fn draw_arc(&mut self, cx: i32, cy: i32, r: i32, start_deg: f32, end_deg: f32, rgb: Rgb, t: i32) {
        let mut angle = start_deg;
        let mut prev = None;
        while angle <= end_deg {
            let rad = angle.to_radians();
            let x = cx + (r as f32 * rad.cos()).round() as i32;
            let y = cy + (r as f32 * rad.sin()).round() as i32;
            if let Some((px, py)) = prev {
                self.draw_line(px, py, x, y, rgb, t);
            }
            prev = Some((x, y));
            angle += 1.0;
        }
    }

    fn text_width(&self, text: &str, size: f32) -> i32 {
        let advance: f32 = match self.font {
            Some(font) => text.chars().map(|ch| font.metrics(ch, size).advance_width).sum(),
            None => text.chars().count() as f32 * size * FALLBACK_ADVANCE,
        };
        advance.ceil() as i32
    }

    fn line_height(&self, size: f32) -> i32 {
        self.font
            .and_then(|font| font.horizontal_line_metrics(size))
            .map_or(size * 1.3, |m| m.new_line_size * 1.1)
            .ceil() as i32
    }

    /// Greedy word wrap. Words wider than `max_width` get a line of their own.
    fn wrap(&self, text: &str, size: f32, max_width: i32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.lines() {
            let mut line = String::new();
            for word in paragraph.split_whitespace() {
                if line.is_empty() {
                    line.push_str(word);
                    continue;
                }
                let candidate = format!("{line} {word}");
                if self.text_width(&candidate, size) <= max_width {
                    line = candidate;
                } else {
                    lines.push(std::mem::take(&mut line));
                    line.push_str(word);
                }
            }
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Height of a wrapped text group, including the gap that follows it.
    fn lines_height(&self, lines: &[String], size: f32) -> i32 {
        if lines.is_empty() {
            0
        } else {
            lines.len() as i32 * self.line_height(size) + TEXT_GAP
        }
    }

    fn draw_lines(&mut self, x: i32, y: i32, lines: &[String], size: f32, fg: Rgb) -> i32 {
        let line_height = self.line_height(size);
        for (i, line) in lines.iter().enumerate() {
            self.draw_text(x, y + i as i32 * line_height, line, size, fg);
        }
        self.lines_height(lines, size)
    }

    /// Draws one line of text with its top edge at `top`. No-op without a font.
    fn draw_text(&mut self, x: i32, top: i32, text: &str, size: f32, fg: Rgb) {
        let Some(font) = self.font else {
            return;
        };
        let ascent = font.horizontal_line_metrics(size).map_or(size, |m| m.ascent);
        let baseline = (top as f32 + ascent).round() as i32;
        let mut cursor_x = x as f32;

        for ch in text.chars() {
            let (metrics, bitmap) = font.rasterize(ch, size);
            let gx = cursor_x.round() as i32 + metrics.xmin;
            let gy = baseline - (metrics.ymin + metrics.height as i32);
            for by in 0..metrics.height {
                for bx in 0..metrics.width {
                    let alpha = bitmap[by * metrics.width + bx];
                    if alpha == 0 {
                        continue;
                    }
                    let (px, py) = (gx + bx as i32, gy + by as i32);
                    if let Some(under) = self.get(px, py) {
                        self.put(px, py, blend(fg, under, alpha));
                    }
                }
            }
            cursor_x += metrics.advance_width;
        }
    }
}

struct FeatureCard {
    icon: Option<String>,
    label: Vec<String>,
    description: Vec<String>,
}

struct Layout<'f> {
    painter: Painter<'f>,
    palette: Palette,
    links: HitTestIndex,
    cursor: i32,
}

impl Layout<'_> {
    fn content_width(&self) -> i32 {
        self.painter.width as i32 - 2 * MARGIN
    }

    /// Draws `block` at the cursor and returns the height it occupies.
    fn block(&mut self, block: &Component) -> i32 {
        match block {
            Component::Hero(props) => self.hero(props),
            Component::FeatureGrid(props) => self.feature_grid(props),
            Component::Testimonial(props) => self.testimonial(props),
            Component::Button(props) => {
                let y = self.cursor;
                self.button(
                    MARGIN,
                    y,
                    &props.children,
                    props.variant,
                    props.size,
                    props.href.as_deref(),
                    props.disabled.unwrap_or(false),
                )
            }
            Component::Badge(props) => self.badge(props),
            Component::Card(props) => self.card(props),
            Component::Alert(props) => self.alert(props),
            Component::Input(props) => self.input(props),
            Component::Label(props) => self.label(props),
            Component::Textarea(props) => self.textarea(props),
            Component::Progress(props) => self.progress(props),
            Component::Separator(props) => self.separator(props),
        }
    }

    fn hero(&mut self, props: &HeroProps) -> i32 {
        let pad = 40;
        let top = self.cursor;
        let width = self.content_width();
        let inner = width - 2 * pad;
        let p = self.palette;

        let eyebrow = props
            .eyebrow
            .as_deref()
            .map(|text| self.painter.wrap(&text.to_uppercase(), SMALL, inner))
            .unwrap_or_default();
        let headline = self.painter.wrap(&props.headline, HEADLINE, inner);
        let subhead = props
            .subhead
            .as_deref()
            .map(|text| self.painter.wrap(text, LEAD, inner))
            .unwrap_or_default();

        let mut height = 2 * pad
            + self.painter.lines_height(&eyebrow, SMALL)
            + self.painter.lines_height(&headline, HEADLINE)
            + self.painter.lines_height(&subhead, LEAD);
        if props.cta.is_some() {
            height += TEXT_GAP + button_metrics(ButtonSize::Lg).0;
        }

        self.painter.grow_to(top + height);
        self.painter.fill_round_rect(MARGIN, top, width, height, 12, p.muted);

        let x = MARGIN + pad;
        let mut y = top + pad;
        y += self.painter.draw_lines(x, y, &eyebrow, SMALL, p.muted_fg);
        y += self.painter.draw_lines(x, y, &headline, HEADLINE, p.foreground);
        y += self.painter.draw_lines(x, y, &subhead, LEAD, p.muted_fg);
        if let Some(cta) = &props.cta {
            self.button(
                x,
                y + TEXT_GAP,
                &cta.label,
                cta.variant.unwrap_or_default(),
                ButtonSize::Lg,
                cta.href.as_deref(),
                false,
            );
        }
        height
    }

    fn feature_grid(&mut self, props: &FeatureGridProps) -> i32 {
        let top = self.cursor;
        let width = self.content_width();
        let p = self.palette;

        let title = self.painter.wrap(&props.title, TITLE, width);
        let title_height = self.painter.lines_height(&title, TITLE);

        let columns = grid_columns(width).min(props.items.len()).max(1);
        let column_width = (width - (columns as i32 - 1) * CARD_GAP) / columns as i32;
        let inner = column_width - 2 * CARD_PAD;
        let cards: Vec<FeatureCard> = props
            .items
            .iter()
            .map(|item| FeatureCard {
                icon: item.icon.clone(),
                label: self.painter.wrap(&item.label, BODY, inner),
                description: self.painter.wrap(&item.description, SMALL, inner),
            })
            .collect();
        let row_heights: Vec<i32> = cards
            .chunks(columns)
            .map(|row| row.iter().map(|card| self.feature_card_height(card)).max().unwrap_or(0))
            .collect();

        let rows = row_heights.len() as i32;
        let height = title_height + row_heights.iter().sum::<i32>() + (rows - 1).max(0) * CARD_GAP;
        self.painter.grow_to(top + height);
        self.painter.draw_lines(MARGIN, top, &title, TITLE, p.foreground);

        let mut y = top + title_height;
        for (row, &row_height) in cards.chunks(columns).zip(&row_heights) {
            for (i, card) in row.iter().enumerate() {
                let x = MARGIN + i as i32 * (column_width + CARD_GAP);
                self.painter.fill_round_rect(x, y, column_width, row_height, RADIUS, p.card);
                self.painter
                    .draw_round_rect_outline(x, y, column_width, row_height, RADIUS, p.border, 1);

                let tx = x + CARD_PAD;
                let mut ty = y + CARD_PAD;
                if let Some(icon) = &card.icon {
                    self.painter.fill_round_rect(tx, ty, 28, 28, 6, p.secondary);
                    let glyph: String = icon.chars().take(1).collect();
                    let glyph_width = self.painter.text_width(&glyph, SMALL);
                    self.painter
                        .draw_text(tx + (28 - glyph_width) / 2, ty + 4, &glyph, SMALL, p.primary);
                    ty += 28 + TEXT_GAP;
                }
                ty += self.painter.draw_lines(tx, ty, &card.label, BODY, p.foreground);
                self.painter.draw_lines(tx, ty, &card.description, SMALL, p.muted_fg);
            }
            y += row_height + CARD_GAP;
        }
        height
    }

    fn feature_card_height(&self, card: &FeatureCard) -> i32 {
        let icon = if card.icon.is_some() { 28 + TEXT_GAP } else { 0 };
        2 * CARD_PAD
            + icon
            + self.painter.lines_height(&card.label, BODY)
            + self.painter.lines_height(&card.description, SMALL)
    }

    fn testimonial(&mut self, props: &TestimonialProps) -> i32 {
        let top = self.cursor;
        let width = self.content_width();
        let inner = width - 2 * CARD_PAD - 8;
        let p = self.palette;

        let quote = self
            .painter
            .wrap(&format!("\u{201c}{}\u{201d}", props.quote), LEAD, inner);
        let attribution = match (&props.author, &props.role) {
            (Some(author), Some(role)) => Some(format!("{author}, {role}")),
            (Some(author), None) => Some(author.clone()),
            (None, Some(role)) => Some(role.clone()),
            (None, None) => None,
        };
        let attribution = attribution
            .map(|text| self.painter.wrap(&text, SMALL, inner))
            .unwrap_or_default();

        let height = 2 * CARD_PAD
            + self.painter.lines_height(&quote, LEAD)
            + self.painter.lines_height(&attribution, SMALL);
        self.painter.grow_to(top + height);
        self.painter.fill_round_rect(MARGIN, top, width, height, RADIUS, p.card);
        self.painter
            .draw_round_rect_outline(MARGIN, top, width, height, RADIUS, p.border, 1);
        self.painter.fill_rect(MARGIN + 1, top + RADIUS, 4, height - 2 * RADIUS, p.primary);

        let x = MARGIN + CARD_PAD + 8;
        let y = top + CARD_PAD;
        let y = y + self.painter.draw_lines(x, y, &quote, LEAD, p.foreground);
        self.painter.draw_lines(x, y, &attribution, SMALL, p.muted_fg);
        height
    }

    #[allow(clippy::too_many_arguments)]
    fn button(
        &mut self,
        x: i32,
        y: i32,
        label: &str,
        variant: ButtonVariant,
        size: ButtonSize,
        href: Option<&str>,
        disabled: bool,
    ) -> i32 {
        let (height, pad, text_size) = button_metrics(size);
        let p = self.palette;
        let text_width = self.painter.text_width(label, text_size);
        let width = match size {
            ButtonSize::Icon => height.max(text_width + 2 * pad),
            _ => text_width + 2 * pad,
        }
        .min(self.content_width());

        let (fill, fg, border) = match variant {
            ButtonVariant::Default => (Some(p.primary), p.primary_fg, None),
            ButtonVariant::Secondary => (Some(p.secondary), p.secondary_fg, None),
            ButtonVariant::Destructive => (Some(p.destructive), p.destructive_fg, None),
            ButtonVariant::Outline => (Some(p.background), p.foreground, Some(p.border)),
            ButtonVariant::Ghost => (None, p.foreground, None),
            ButtonVariant::Link => (None, p.primary, None),
        };
        let fade = |color: Rgb| if disabled { mix(color, p.background, 0.5) } else { color };

        self.painter.grow_to(y + height);
        if let Some(fill) = fill {
            self.painter.fill_round_rect(x, y, width, height, 6, fade(fill));
        }
        if let Some(border) = border {
            self.painter.draw_round_rect_outline(x, y, width, height, 6, fade(border), 1);
        }
        let line_height = self.painter.line_height(text_size);
        let text_x = x + (width - text_width) / 2;
        let text_top = y + (height - line_height) / 2;
        self.painter.draw_text(text_x, text_top, label, text_size, fade(fg));
        if variant == ButtonVariant::Link {
            let underline = text_top + line_height - 2;
            self.painter.fill_rect(text_x, underline, text_width, 1, fade(fg));
        }

        if let (Some(href), false) = (href, disabled) {
            self.links.add(LinkRegion {
                href: href.to_string(),
                x,
                y,
                w: width as u32,
                h: height as u32,
            });
        }
        height
    }

    fn badge(&mut self, props: &BadgeProps) -> i32 {
        let height = 22;
        let top = self.cursor;
        let p = self.palette;
        let text_width = self.painter.text_width(&props.children, TINY);
        let width = (text_width + 20).min(self.content_width());
        let (fill, fg, border) = match props.variant {
            BadgeVariant::Default => (p.primary, p.primary_fg, None),
            BadgeVariant::Secondary => (p.secondary, p.secondary_fg, None),
            BadgeVariant::Destructive => (p.destructive, p.destructive_fg, None),
            BadgeVariant::Outline => (p.background, p.foreground, Some(p.border)),
        };

        self.painter.grow_to(top + height);
        self.painter.fill_round_rect(MARGIN, top, width, height, height / 2, fill);
        if let Some(border) = border {
            self.painter
                .draw_round_rect_outline(MARGIN, top, width, height, height / 2, border, 1);
        }
        let text_top = top + (height - self.painter.line_height(TINY)) / 2;
        self.painter.draw_text(MARGIN + 10, text_top, &props.children, TINY, fg);
        height
    }

    fn card(&mut self, props: &CardProps) -> i32 {
        let top = self.cursor;
        let width = self.content_width();
        let p = self.palette;
        let body = props
            .children
            .as_deref()
            .map(|text| self.painter.wrap(text, BODY, width - 2 * CARD_PAD))
            .unwrap_or_default();
        let height = (2 * CARD_PAD + self.painter.lines_height(&body, BODY)).max(64);

        self.painter.grow_to(top + height);
        self.painter.fill_round_rect(MARGIN, top, width, height, RADIUS, p.card);
        self.painter
            .draw_round_rect_outline(MARGIN, top, width, height, RADIUS, p.border, 1);
        self.painter
            .draw_lines(MARGIN + CARD_PAD, top + CARD_PAD, &body, BODY, p.foreground);
        height
    }

    fn alert(&mut self, props: &AlertProps) -> i32 {
        let pad = 16;
        let top = self.cursor;
        let width = self.content_width();
        let inner = width - 2 * pad;
        let p = self.palette;
        let (accent, text) = match props.variant {
            AlertVariant::Default => (p.border, p.foreground),
            AlertVariant::Destructive => (p.destructive, p.destructive),
        };

        let title = props
            .title
            .as_deref()
            .map(|text| self.painter.wrap(text, BODY, inner))
            .unwrap_or_default();
        let description = self.painter.wrap(&props.description, SMALL, inner);
        let height = 2 * pad
            + self.painter.lines_height(&title, BODY)
            + self.painter.lines_height(&description, SMALL);

        self.painter.grow_to(top + height);
        self.painter.fill_round_rect(MARGIN, top, width, height, RADIUS, p.background);
        self.painter
            .draw_round_rect_outline(MARGIN, top, width, height, RADIUS, accent, 1);
        let x = MARGIN + pad;
        let y = top + pad;
        let y = y + self.painter.draw_lines(x, y, &title, BODY, text);
        self.painter.draw_lines(x, y, &description, SMALL, text);
        height
    }

    fn input(&mut self, props: &InputProps) -> i32 {
        let height = 40;
        let top = self.cursor;
        let width = self.content_width().min(480);
        let p = self.palette;
        let disabled = props.disabled.unwrap_or(false);

        let (text, color) = match (&props.value, &props.placeholder) {
            (Some(value), _) if props.input_type == InputType::Password => {
                ("\u{2022}".repeat(value.chars().count()), p.foreground)
            }
            (Some(value), _) => (value.clone(), p.foreground),
            (None, Some(placeholder)) => (placeholder.clone(), p.muted_fg),
            (None, None) => (String::new(), p.muted_fg),
        };

        self.painter.grow_to(top + height);
        let fill = if disabled { p.muted } else { p.background };
        self.painter.fill_rect(MARGIN, top, width, height, fill);
        self.painter.draw_rect_outline(MARGIN, top, width, height, p.border, 1);
        let text_top = top + (height - self.painter.line_height(SMALL)) / 2;
        self.painter.draw_text(MARGIN + 12, text_top, &text, SMALL, color);
        height
    }

    fn label(&mut self, props: &LabelProps) -> i32 {
        let top = self.cursor;
        let lines = self.painter.wrap(&props.children, SMALL, self.content_width());
        let height = (self.painter.lines_height(&lines, SMALL) - TEXT_GAP).max(0);
        self.painter.grow_to(top + height);
        let fg = self.palette.foreground;
        self.painter.draw_lines(MARGIN, top, &lines, SMALL, fg);
        height
    }

    fn textarea(&mut self, props: &TextareaProps) -> i32 {
        let pad = 8;
        let top = self.cursor;
        let width = self.content_width().min(640);
        let p = self.palette;
        let rows = props.rows.unwrap_or(3.0).ceil() as usize;
        let line_height = self.painter.line_height(SMALL);
        let height = rows as i32 * line_height + 2 * pad;

        let (text, color) = match (&props.value, &props.placeholder) {
            (Some(value), _) => (value.as_str(), p.foreground),
            (None, Some(placeholder)) => (placeholder.as_str(), p.muted_fg),
            (None, None) => ("", p.muted_fg),
        };
        let mut lines = self.painter.wrap(text, SMALL, width - 2 * pad - 4);
        lines.truncate(rows);

        self.painter.grow_to(top + height);
        let fill = if props.disabled.unwrap_or(false) { p.muted } else { p.background };
        self.painter.fill_rect(MARGIN, top, width, height, fill);
        self.painter.draw_rect_outline(MARGIN, top, width, height, p.border, 1);
        self.painter
            .draw_lines(MARGIN + pad + 4, top + pad, &lines, SMALL, color);
        height
    }

    fn progress(&mut self, props: &ProgressProps) -> i32 {
        let height = 12;
        let top = self.cursor;
        let width = self.content_width().min(480);
        let p = self.palette;
        let filled = (width as f64 * props.value.clamp(0.0, 100.0) / 100.0).round() as i32;

        self.painter.grow_to(top + height);
        self.painter.fill_round_rect(MARGIN, top, width, height, height / 2, p.secondary);
        if filled > 0 {
            self.painter
                .fill_round_rect(MARGIN, top, filled, height, height / 2, p.primary);
        }
        height
    }

    fn separator(&mut self, props: &SeparatorProps) -> i32 {
        let top = self.cursor;
        let border = self.palette.border;
        match props.orientation {
            Orientation::Horizontal => {
                self.painter.grow_to(top + 1);
                self.painter.fill_rect(MARGIN, top, self.content_width(), 1, border);
                1
            }
            Orientation::Vertical => {
                let height = 48;
                self.painter.grow_to(top + height);
                self.painter.fill_rect(MARGIN, top, 1, height, border);
                height
            }
        }
    }
}

/// Height, horizontal padding and text size of a button.
fn button_metrics(size: ButtonSize) -> (i32, i32, f32) {
    match size {
        ButtonSize::Sm => (32, 12, 13.0),
        ButtonSize::Default => (40, 16, SMALL),
        ButtonSize::Lg => (44, 32, BODY),
        ButtonSize::Icon => (40, 10, SMALL),
    }
}

fn grid_columns(width: i32) -> usize {
    match width {
        w if w >= 720 => 3,
        w if w >= 460 => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::validate;
    use serde_json::{json, Value};

    fn page(blocks: Value) -> PageSpec {
        validate(&json!({"version": "1", "blocks": blocks})).unwrap()
    }

    #[test]
    fn frame_grows_with_content() {
        let one = render_page(&page(json!([{"type": "Separator", "props": {}}])), None, 800);
        let many = render_page(
            &page(json!([
                {"type": "Hero", "props": {"headline": "Charles Pfaff"}},
                {"type": "Separator", "props": {}},
                {"type": "Progress", "props": {"value": 40}}
            ])),
            None,
            800,
        );
        assert_eq!(one.width, 800);
        assert!(one.height > 0);
        assert!(many.height > one.height);
        assert_eq!(many.pixels.len(), (many.width * many.height * 4) as usize);
    }

    #[test]
    fn width_has_a_floor() {
        let frame = render_page(&page(json!([{"type": "Label", "props": {"children": "Hi"}}])), None, 10);
        assert_eq!(frame.width, MIN_WIDTH);
    }

    #[test]
    fn links_are_recorded_for_enabled_buttons_and_ctas() {
        let frame = render_page(
            &page(json!([
                {"type": "Hero", "props": {
                    "headline": "Work",
                    "cta": {"label": "See projects", "href": "https://pfaff.design/work"}
                }},
                {"type": "Button", "props": {"children": "GitHub", "href": "https://github.com/charlespfaff"}},
                {"type": "Button", "props": {"children": "Soon", "href": "https://example.com", "disabled": true}},
                {"type": "Button", "props": {"children": "No link"}}
            ])),
            None,
            960,
        );
        let hrefs: Vec<&str> = frame.links.links().iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, ["https://pfaff.design/work", "https://github.com/charlespfaff"]);

        let button = &frame.links.links()[1];
        let hit = frame.links.hit(button.x + 1, button.y + 1).map(|l| l.href.as_str());
        assert_eq!(hit, Some("https://github.com/charlespfaff"));
    }

    #[test]
    fn dark_theme_switches_the_background() {
        let blocks = json!([{"type": "Separator", "props": {}}]);
        let light = render_page(&page(blocks.clone()), None, 400);
        let dark = render_page(
            &validate(&json!({"version": "1", "theme": "dark", "blocks": blocks})).unwrap(),
            None,
            400,
        );
        assert_eq!(light.pixel(0, 0), Some((255, 255, 255)));
        assert_eq!(dark.pixel(0, 0), Some((2, 8, 23)));
    }

    #[test]
    fn progress_fill_tracks_value() {
        let frame = render_page(&page(json!([{"type": "Progress", "props": {"value": 50}}])), None, 800);
        let mid_y = (MARGIN + 6) as u32;
        let palette = Palette::for_theme(Theme::Light);
        assert_eq!(frame.pixel((MARGIN + 100) as u32, mid_y), Some(palette.primary));
        assert_eq!(frame.pixel((MARGIN + 400) as u32, mid_y), Some(palette.secondary));
    }

    #[test]
    fn wraps_on_word_boundaries_without_a_font() {
        let painter = Painter::new(400, (255, 255, 255), None);
        let lines = painter.wrap("one two three four five six", 10.0, 60);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "one two three four five six");
        assert!(painter.wrap("", 10.0, 60).is_empty());
    }

    #[test]
    fn writes_a_png() {
        let frame = render_page(&page(json!([{"type": "Badge", "props": {"children": "New"}}])), None, 320);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.png");
        frame.save_png(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
