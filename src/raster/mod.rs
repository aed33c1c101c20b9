//! # Rasterizer
//!
//! Paints a laid-out canvas into one tall RGB bitmap at an upscale factor.
//! This is the capture step of the PDF export: the bitmap is what ends up,
//! JPEG-compressed, on every page.
//!
//! Paint order per box is background, border, bottom rule, text, children.
//! Background fills follow the media: under a print sheet without exact
//! colors they are skipped, as a print engine would skip them. Strokes and
//! text are always painted.

use image::{Rgb, RgbImage};
use rusttype::{point, Font, Scale};

use crate::layout::{Decoration, LayoutBox, LayoutTree, TextRun};
use crate::resource::FontFaces;
use crate::style::Color;

/// Largest bitmap edge the JPEG encoder accepts.
pub const MAX_DIMENSION: u32 = 65_500;

/// An axis-aligned rectangle in device pixels.
#[derive(Debug, Clone, Copy)]
struct DeviceRect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl DeviceRect {
    fn inset(&self, by: f64) -> Self {
        Self {
            x0: self.x0 + by,
            y0: self.y0 + by,
            x1: self.x1 - by,
            y1: self.y1 - by,
        }
    }

    fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Whether a point lies inside the rectangle with corners rounded to `radius`.
    fn contains(&self, x: f64, y: f64, radius: f64) -> bool {
        if x < self.x0 || x >= self.x1 || y < self.y0 || y >= self.y1 {
            return false;
        }
        let r = radius
            .min((self.x1 - self.x0) / 2.0)
            .min((self.y1 - self.y0) / 2.0)
            .max(0.0);
        if r == 0.0 {
            return true;
        }
        let cx = x.clamp(self.x0 + r, self.x1 - r);
        let cy = y.clamp(self.y0 + r, self.y1 - r);
        let (dx, dy) = (x - cx, y - cy);
        dx * dx + dy * dy <= r * r
    }
}

struct Painter<'a> {
    canvas: RgbImage,
    scale: f64,
    faces: &'a FontFaces,
    backgrounds: bool,
}

impl Painter<'_> {
    fn device(&self, x: f64, y: f64, w: f64, h: f64) -> DeviceRect {
        DeviceRect {
            x0: x * self.scale,
            y0: y * self.scale,
            x1: (x + w) * self.scale,
            y1: (y + h) * self.scale,
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: [u8; 3], alpha: f32) {
        if x < 0 || y < 0 || x >= self.canvas.width() as i64 || y >= self.canvas.height() as i64 {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        let Rgb(dst) = self.canvas.get_pixel_mut(x as u32, y as u32);
        for (d, s) in dst.iter_mut().zip(color) {
            *d = (*d as f32 * (1.0 - alpha) + s as f32 * alpha).round() as u8;
        }
    }

    /// Fill `outer` minus `hole` (if any), both with rounded corners.
    fn fill(&mut self, outer: DeviceRect, radius: f64, hole: Option<(DeviceRect, f64)>, color: Color) {
        if outer.is_empty() {
            return;
        }
        let rgb = color.to_rgb8();
        let alpha = color.a as f32;
        let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
        let y_start = outer.y0.max(0.0).floor() as i64;
        let y_end = outer.y1.min(h).ceil() as i64;
        let x_start = outer.x0.max(0.0).floor() as i64;
        let x_end = outer.x1.min(w).ceil() as i64;
        for py in y_start..y_end {
            for px in x_start..x_end {
                let (cx, cy) = (px as f64 + 0.5, py as f64 + 0.5);
                if !outer.contains(cx, cy, radius) {
                    continue;
                }
                if let Some((inner, inner_radius)) = hole {
                    if inner.contains(cx, cy, inner_radius) {
                        continue;
                    }
                }
                self.blend(px, py, rgb, alpha);
            }
        }
    }

    fn paint_decoration(&mut self, b: &LayoutBox, deco: &Decoration) {
        let rect = self.device(b.x, b.y, b.width, b.height);
        let radius = deco.radius * self.scale;

        if self.backgrounds {
            if let Some(background) = deco.background {
                self.fill(rect, radius, None, background);
            }
        }
        if let Some(border) = deco.border {
            let width = border.width * self.scale;
            let inner = rect.inset(width);
            let hole = (!inner.is_empty()).then(|| (inner, (radius - width).max(0.0)));
            self.fill(rect, radius, hole, border.color);
        }
        if let Some(rule) = deco.border_bottom {
            let width = rule.width * self.scale;
            let line = DeviceRect {
                y0: rect.y1 - width,
                ..rect
            };
            self.fill(line, 0.0, None, rule.color);
        }
    }

    fn paint_text(&mut self, run: &TextRun) {
        let Some(font) = self.faces.face(run.bold) else {
            return;
        };
        let size = (run.font_size * self.scale) as f32;
        let scale = Scale::uniform(size);
        let v = font.v_metrics(scale);
        let line_height = (run.line_height * self.scale) as f32;
        let half_leading = (line_height - (v.ascent - v.descent)) / 2.0;
        let color = run.color.to_rgb8();

        for line in &run.lines {
            let baseline = line.y as f32 * self.scale as f32 + half_leading + v.ascent;
            let origin = point(line.x as f32 * self.scale as f32, baseline);
            self.draw_glyphs(font, &line.text, scale, origin, color);
        }
    }

    fn draw_glyphs(
        &mut self,
        font: &Font<'static>,
        text: &str,
        scale: Scale,
        origin: rusttype::Point<f32>,
        color: [u8; 3],
    ) {
        for glyph in font.layout(text, scale, origin) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            let mut coverage = Vec::new();
            glyph.draw(|gx, gy, c| coverage.push((gx, gy, c)));
            for (gx, gy, c) in coverage {
                if c > 0.0 {
                    self.blend(
                        (bb.min.x + gx as i32) as i64,
                        (bb.min.y + gy as i32) as i64,
                        color,
                        c,
                    );
                }
            }
        }
    }

    fn paint(&mut self, b: &LayoutBox) {
        if let Some(deco) = &b.decoration {
            self.paint_decoration(b, deco);
        }
        if let Some(run) = &b.text {
            self.paint_text(run);
        }
        for child in &b.children {
            self.paint(child);
        }
    }
}

/// Size of the bitmap a capture at `scale` produces.
pub fn bitmap_size(tree: &LayoutTree, scale: f64) -> (u32, u32) {
    let w = (tree.width * scale).ceil().max(1.0);
    let h = (tree.height * scale).ceil().max(1.0);
    (w.min(u32::MAX as f64) as u32, h.min(u32::MAX as f64) as u32)
}

/// Paint `tree` at `scale` device pixels per CSS pixel.
///
/// Fails when the bitmap would exceed what the page images can carry.
/// Missing font faces are not a failure; their text is left blank.
pub fn rasterize(tree: &LayoutTree, faces: &FontFaces, scale: f64) -> Result<RgbImage, String> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(format!("invalid capture scale {}", scale));
    }
    let (width, height) = bitmap_size(tree, scale);
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(format!(
            "capture of {}x{} px exceeds the {} px limit",
            width, height, MAX_DIMENSION
        ));
    }

    let mut painter = Painter {
        canvas: RgbImage::from_pixel(width, height, Rgb([255, 255, 255])),
        scale,
        faces,
        backgrounds: tree.media.paints_backgrounds(),
    };
    painter.paint(&tree.root);
    Ok(painter.canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutEngine;
    use crate::model::{ContactInfo, ProjectItem, ResumeData};
    use crate::render::render;
    use crate::style::Media;
    use crate::template::Template;

    fn data() -> ResumeData {
        ResumeData {
            full_name: "Ada Lovelace".to_string(),
            skills: vec!["OCaml".to_string(), "Proofs".to_string()],
            projects: vec![ProjectItem {
                title: "Engine".to_string(),
                ..Default::default()
            }],
            contact: ContactInfo {
                email: "a@b.com".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn count(img: &RgbImage, rgb: [u8; 3]) -> usize {
        img.pixels().filter(|p| p.0 == rgb).count()
    }

    fn capture(media: Media, template: &Template) -> RgbImage {
        let tree = LayoutEngine::new(media).layout(&render(&data(), template));
        rasterize(&tree, &FontFaces::default(), 2.0).unwrap()
    }

    #[test]
    fn test_bitmap_is_upscaled() {
        let tree = LayoutEngine::new(Media::Screen).layout(&render(&data(), &Template::default()));
        let img = rasterize(&tree, &FontFaces::default(), 2.0).unwrap();
        assert_eq!(img.width(), (tree.width * 2.0).ceil() as u32);
        assert_eq!(img.height(), (tree.height * 2.0).ceil() as u32);
    }

    #[test]
    fn test_backgrounds_follow_exact_colors() {
        let cards = Template::by_id("creative-designer").unwrap();
        let accent = cards.palette().accent.to_rgb8();
        assert!(count(&capture(Media::Print { exact_colors: true }, cards), accent) > 0);
        assert_eq!(count(&capture(Media::Print { exact_colors: false }, cards), accent), 0);
    }

    #[test]
    fn test_bottom_rule_painted_for_bordered_headings() {
        let bordered = Template::default();
        let accent = bordered.palette().accent.to_rgb8();
        // Rules are strokes, so they survive even without exact colors.
        assert!(count(&capture(Media::Print { exact_colors: false }, &bordered), accent) > 0);
    }

    #[test]
    fn test_oversized_capture_fails() {
        let mut tree =
            LayoutEngine::new(Media::Screen).layout(&render(&data(), &Template::default()));
        tree.height = 40_000.0;
        assert!(rasterize(&tree, &FontFaces::default(), 2.0).is_err());
        assert!(rasterize(&tree, &FontFaces::default(), 0.0).is_err());
    }

    #[test]
    fn test_rounded_corners_are_cut() {
        let rect = DeviceRect {
            x0: 0.0,
            y0: 0.0,
            x1: 20.0,
            y1: 20.0,
        };
        assert!(!rect.contains(0.5, 0.5, 8.0));
        assert!(rect.contains(10.0, 0.5, 8.0));
        assert!(rect.contains(0.5, 0.5, 0.0));
    }
}
