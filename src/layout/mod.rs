//! # Layout
//!
//! Resolves the preview tree into absolute geometry on a single tall canvas,
//! in CSS pixels. This is the "on-screen element" the PDF exporter captures:
//! the canvas is laid out once, unpaginated, and pagination happens later
//! either by fixed stride or by the planner in [`page_break`].
//!
//! The model is a small subset of CSS block layout:
//!
//! - `Block` stacks children vertically at full width, with `gap` between
//!   them and each child's `margin_bottom` after it.
//! - `Row` gives trailing children their natural width, flush right, and the
//!   first child whatever is left (`justify-content: space-between`).
//! - `Flow` places children at their natural width and wraps onto new lines.
//! - `Text` wraps its content to the available width.
//!
//! Every measurement goes through [`crate::font`], so the same tree always
//! produces the same geometry.

pub mod page_break;
pub mod text;

use crate::font::StandardFont;
use crate::render::{BreakRule, Justify, NodeKind, Region, VisualNode, VisualTree};
use crate::style::{Color, Media, NodeStyle, Stroke, TextAlign};

use page_break::Block;

/// Canvas width in CSS pixels: 210 mm at 96 dpi.
pub const CANVAS_WIDTH_PX: f64 = 794.0;

/// Slack added to measured widths so a run laid out at its own natural width
/// never wraps from rounding.
const WIDTH_EPSILON: f64 = 0.01;

/// Box painting, resolved from a [`NodeStyle`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub background: Option<Color>,
    pub border: Option<Stroke>,
    pub border_bottom: Option<Stroke>,
    pub radius: f64,
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f64,
    /// Top of the line box.
    pub y: f64,
    pub width: f64,
    pub text: String,
}

/// Wrapped text in one face and size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub lines: Vec<TextLine>,
    pub color: Color,
    pub font_size: f64,
    pub line_height: f64,
    pub bold: bool,
}

/// A positioned box. Coordinates are absolute canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub decoration: Option<Decoration>,
    pub text: Option<TextRun>,
    pub children: Vec<LayoutBox>,
    pub region: Option<Region>,
    pub break_rule: BreakRule,
}

impl LayoutBox {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Depth-first search for the first box with the given label.
    pub fn find(&self, region: Region) -> Option<&LayoutBox> {
        if self.region == Some(region) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(region))
    }

    fn collect_unsplittable(&self, mm_per_px: f64, out: &mut Vec<Block>) {
        if self.break_rule.is_unsplittable() {
            out.push(Block {
                top: self.y * mm_per_px,
                height: self.height * mm_per_px,
            });
            return;
        }
        for child in &self.children {
            child.collect_unsplittable(mm_per_px, out);
        }
    }
}

/// The laid-out canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTree {
    pub media: Media,
    pub width: f64,
    pub height: f64,
    pub root: LayoutBox,
}

impl LayoutTree {
    /// Outermost non-splittable boxes in document order, scaled into
    /// document units by `mm_per_px`.
    pub fn unsplittable_blocks(&self, mm_per_px: f64) -> Vec<Block> {
        let mut out = Vec::new();
        self.root.collect_unsplittable(mm_per_px, &mut out);
        out
    }
}

/// Lays out preview trees for one media.
#[derive(Debug, Clone, Copy)]
pub struct LayoutEngine {
    media: Media,
    width: f64,
}

impl LayoutEngine {
    pub fn new(media: Media) -> Self {
        Self {
            media,
            width: CANVAS_WIDTH_PX,
        }
    }

    pub fn layout(&self, tree: &VisualTree) -> LayoutTree {
        let root = self.layout_node(&tree.root, 0.0, 0.0, self.width);
        LayoutTree {
            media: self.media,
            width: self.width,
            height: root.height,
            root,
        }
    }

    fn font_size(&self, style: &NodeStyle) -> f64 {
        style.font.size.px(self.media)
    }

    fn line_height(&self, style: &NodeStyle) -> f64 {
        self.font_size(style) * self.media.line_height()
    }

    fn face(style: &NodeStyle) -> StandardFont {
        StandardFont::for_weight(style.font.weight.is_bold())
    }

    /// Width the node would take with no constraint (shrink-to-fit).
    fn natural_width(&self, node: &VisualNode) -> f64 {
        let padding = node.style.padding(self.media).horizontal();
        let gap = node.style.gap.resolve(self.media);
        let content = match &node.kind {
            NodeKind::Text { content } => text::break_into_lines(
                content,
                f64::INFINITY,
                Self::face(&node.style),
                self.font_size(&node.style),
            )
            .iter()
            .map(|l| l.width)
            .fold(0.0, f64::max),
            NodeKind::Block => node
                .children
                .iter()
                .map(|c| self.natural_width(c))
                .fold(0.0, f64::max),
            NodeKind::Row | NodeKind::Flow { .. } => {
                let sum: f64 = node.children.iter().map(|c| self.natural_width(c)).sum();
                sum + gap * node.children.len().saturating_sub(1) as f64
            }
        };
        content + padding
    }

    fn layout_node(&self, node: &VisualNode, x: f64, y: f64, width: f64) -> LayoutBox {
        let padding = node.style.padding(self.media);
        let inner_x = x + padding.left;
        let inner_y = y + padding.top;
        let inner_width = (width - padding.horizontal()).max(0.0);

        let (children, text, content_height) = match &node.kind {
            NodeKind::Block => {
                let (children, h) = self.layout_stack(node, inner_x, inner_y, inner_width);
                (children, None, h)
            }
            NodeKind::Row => {
                let (children, h) = self.layout_row(node, inner_x, inner_y, inner_width);
                (children, None, h)
            }
            NodeKind::Flow { justify } => {
                let (children, h) =
                    self.layout_flow(node, *justify, inner_x, inner_y, inner_width);
                (children, None, h)
            }
            NodeKind::Text { content } => {
                let run = self.layout_text(content, &node.style, inner_x, inner_y, inner_width);
                let h = run.lines.len() as f64 * run.line_height;
                (Vec::new(), Some(run), h)
            }
        };

        let style = &node.style;
        let decoration = style.is_decorated().then(|| Decoration {
            background: style.background,
            border: style.border,
            border_bottom: style.border_bottom,
            radius: style.radius,
        });

        LayoutBox {
            x,
            y,
            width,
            height: content_height + padding.vertical(),
            decoration,
            text,
            children,
            region: node.region,
            break_rule: node.break_rule,
        }
    }

    fn layout_text(&self, content: &str, style: &NodeStyle, x: f64, y: f64, width: f64) -> TextRun {
        let font_size = self.font_size(style);
        let line_height = self.line_height(style);
        let broken = text::break_into_lines(
            content,
            width + WIDTH_EPSILON,
            Self::face(style),
            font_size,
        );
        let lines = broken
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let offset = match style.text_align {
                    TextAlign::Left | TextAlign::Justify => 0.0,
                    TextAlign::Center => ((width - line.width) / 2.0).max(0.0),
                    TextAlign::Right => (width - line.width).max(0.0),
                };
                TextLine {
                    x: x + offset,
                    y: y + i as f64 * line_height,
                    width: line.width,
                    text: line.text,
                }
            })
            .collect();
        TextRun {
            lines,
            color: style.color,
            font_size,
            line_height,
            bold: style.font.weight.is_bold(),
        }
    }

    fn layout_stack(&self, node: &VisualNode, x: f64, y: f64, width: f64) -> (Vec<LayoutBox>, f64) {
        let gap = node.style.gap.resolve(self.media);
        let mut cursor = y;
        let mut boxes = Vec::with_capacity(node.children.len());
        for (i, child) in node.children.iter().enumerate() {
            if i > 0 {
                cursor += gap;
            }
            let laid = self.layout_node(child, x, cursor, width);
            cursor = laid.bottom() + child.style.margin_bottom.resolve(self.media);
            boxes.push(laid);
        }
        (boxes, cursor - y)
    }

    fn layout_row(&self, node: &VisualNode, x: f64, y: f64, width: f64) -> (Vec<LayoutBox>, f64) {
        let gap = node.style.gap.resolve(self.media);
        let Some((first, rest)) = node.children.split_first() else {
            return (Vec::new(), 0.0);
        };

        let trailing: Vec<f64> = rest
            .iter()
            .map(|c| self.natural_width(c).min(width / 2.0))
            .collect();
        let trailing_total: f64 =
            trailing.iter().sum::<f64>() + gap * trailing.len() as f64;
        let first_width = (width - trailing_total).max(0.0);

        let mut boxes = vec![self.layout_node(first, x, y, first_width)];
        let mut right = x + width;
        let mut placed = Vec::with_capacity(rest.len());
        for (child, w) in rest.iter().zip(&trailing).rev() {
            right -= w;
            placed.push(self.layout_node(child, right, y, *w));
            right -= gap;
        }
        placed.reverse();
        boxes.extend(placed);

        let height = boxes.iter().map(|b| b.height).fold(0.0, f64::max);
        (boxes, height)
    }

    fn layout_flow(
        &self,
        node: &VisualNode,
        justify: Justify,
        x: f64,
        y: f64,
        width: f64,
    ) -> (Vec<LayoutBox>, f64) {
        let gap = node.style.gap.resolve(self.media);

        // Group children into lines first, then position each line.
        let mut lines: Vec<Vec<(usize, f64)>> = Vec::new();
        let mut current: Vec<(usize, f64)> = Vec::new();
        let mut used = 0.0;
        for (i, child) in node.children.iter().enumerate() {
            let w = self.natural_width(child).min(width);
            let needed = if current.is_empty() { w } else { used + gap + w };
            if !current.is_empty() && needed > width + WIDTH_EPSILON {
                lines.push(std::mem::take(&mut current));
                used = w;
            } else {
                used = needed;
            }
            current.push((i, w));
        }
        if !current.is_empty() {
            lines.push(current);
        }

        let mut boxes = Vec::with_capacity(node.children.len());
        let mut cursor = y;
        for (line_no, line) in lines.iter().enumerate() {
            if line_no > 0 {
                cursor += gap;
            }
            let line_width: f64 =
                line.iter().map(|(_, w)| w).sum::<f64>() + gap * (line.len() - 1) as f64;
            let mut left = x + match justify {
                Justify::Start => 0.0,
                Justify::Center => ((width - line_width) / 2.0).max(0.0),
            };
            let mut line_height: f64 = 0.0;
            for &(i, w) in line {
                let laid = self.layout_node(&node.children[i], left, cursor, w);
                line_height = line_height.max(laid.height);
                left += w + gap;
                boxes.push(laid);
            }
            cursor += line_height;
        }
        (boxes, cursor - y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::render::render;
    use crate::template::Template;

    fn sample() -> ResumeData {
        ResumeData {
            full_name: "Ada Lovelace".to_string(),
            about_me: "Mathematician and writer, chiefly known for work on the Analytical Engine."
                .to_string(),
            skills: vec!["OCaml".to_string(), "Proofs".to_string(), "Rust".to_string()],
            experience: vec![ExperienceItem {
                company: "Analytical Society".to_string(),
                role: "Analyst".to_string(),
                duration: "1842 - 1843".to_string(),
            }],
            projects: vec![
                ProjectItem {
                    title: "Engine".to_string(),
                    description: "Notes on the engine.".to_string(),
                    ..Default::default()
                },
                ProjectItem {
                    title: "Bernoulli".to_string(),
                    tech_used: "Punch cards".to_string(),
                    ..Default::default()
                },
            ],
            contact: ContactInfo {
                email: "a@b.com".to_string(),
                github: "https://github.com/ada".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn laid(media: Media, template: &Template) -> LayoutTree {
        LayoutEngine::new(media).layout(&render(&sample(), template))
    }

    fn assert_contained(parent: &LayoutBox) {
        for child in &parent.children {
            assert!(child.y >= parent.y - 1e-6);
            assert!(child.bottom() <= parent.bottom() + 1e-6);
            assert_contained(child);
        }
    }

    #[test]
    fn test_canvas_is_full_width() {
        let tree = laid(Media::Screen, &Template::default());
        assert_eq!(tree.width, CANVAS_WIDTH_PX);
        assert_eq!(tree.root.width, CANVAS_WIDTH_PX);
        assert!(tree.height > 0.0);
        assert_eq!(tree.height, tree.root.height);
    }

    #[test]
    fn test_children_stay_inside_parents() {
        for template in crate::template::catalog() {
            assert_contained(&laid(Media::Screen, template).root);
        }
    }

    #[test]
    fn test_sections_stack_in_order() {
        let tree = laid(Media::Screen, &Template::default());
        let tops: Vec<f64> = tree.root.children.iter().map(|c| c.y).collect();
        assert!(tops.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_print_media_is_more_compact() {
        let screen = laid(Media::Screen, &Template::default());
        let print = laid(Media::Print { exact_colors: true }, &Template::default());
        assert!(print.height < screen.height);
    }

    #[test]
    fn test_centered_name_is_centered() {
        let tree = laid(Media::Screen, &Template::default());
        let header = tree.root.find(Region::Header).unwrap();
        let run = header.children[0].text.as_ref().unwrap();
        let line = &run.lines[0];
        let left_gap = line.x - header.x;
        let right_gap = header.x + header.width - (line.x + line.width);
        assert!((left_gap - right_gap).abs() < 1e-6);
    }

    #[test]
    fn test_row_date_is_flush_right() {
        let tree = laid(Media::Screen, &Template::default());
        let item = tree.root.find(Region::Experience).unwrap().find(Region::Item).unwrap();
        let row = &item.children[0];
        let date = &row.children[1];
        assert!((date.x + date.width - (row.x + row.width)).abs() < 1e-6);
        let date_line = &date.text.as_ref().unwrap().lines[0];
        assert_eq!(date_line.text, "1842 - 1843");
    }

    #[test]
    fn test_long_text_wraps() {
        let mut data = sample();
        data.about_me = "word ".repeat(400);
        let tree = LayoutEngine::new(Media::Screen).layout(&render(&data, &Template::default()));
        let about = tree.root.find(Region::About).unwrap();
        let paragraph = &about.children[1];
        let run = paragraph.text.as_ref().unwrap();
        assert!(run.lines.len() > 5);
        assert!(run.lines.iter().all(|l| l.width <= paragraph.width + WIDTH_EPSILON));
    }

    #[test]
    fn test_unsplittable_blocks_are_outermost_and_ordered() {
        let tree = laid(Media::Screen, &Template::default());
        let blocks = tree.unsplittable_blocks(1.0);
        // header, about, skills, experience heading + item, projects heading + 2 items
        assert_eq!(blocks.len(), 8);
        assert!(blocks.windows(2).all(|w| w[0].bottom() <= w[1].top + 1e-6));
    }

    #[test]
    fn test_unsplittable_blocks_scale() {
        let tree = laid(Media::Screen, &Template::default());
        let px = tree.unsplittable_blocks(1.0);
        let mm = tree.unsplittable_blocks(0.5);
        assert!((mm[1].top - px[1].top * 0.5).abs() < 1e-9);
        assert!((mm[1].height - px[1].height * 0.5).abs() < 1e-9);
    }
}
