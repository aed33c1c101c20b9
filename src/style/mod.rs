//! # Style System
//!
//! The small set of visual values the renderer resolves from a template:
//! colors, typography tokens, spacing and box decoration.
//!
//! Sizes are kept as tokens until layout, because the same node measures
//! differently on screen and under the print style sheet. [`Media`] is the
//! switch: layout asks each token for its value in the active media.

use serde::{Deserialize, Serialize};

/// CSS pixels per typographic point (96 dpi / 72 dpi).
pub const PX_PER_PT: f64 = 96.0 / 72.0;

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).unwrap_or(0);
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                (r, g, b)
            }
            _ => (0, 0, 0),
        };
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }

    /// 8-bit channels for raster painting.
    pub fn to_rgb8(&self) -> [u8; 3] {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.r), channel(self.g), channel(self.b)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Edge values (top, right, bottom, left) used for padding.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges<T: Copy> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> Edges<T> {
    pub fn uniform(v: T) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: T, horizontal: T) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }
}

impl Edges<f64> {
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Which style sheet layout is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Media {
    /// The on-screen live preview.
    #[default]
    Screen,
    /// Under an active print style sheet.
    Print {
        /// Paint backgrounds exactly instead of dropping them.
        exact_colors: bool,
    },
}

impl Media {
    pub fn is_print(&self) -> bool {
        matches!(self, Media::Print { .. })
    }

    /// Whether background fills reach the output.
    pub fn paints_backgrounds(&self) -> bool {
        match self {
            Media::Screen => true,
            Media::Print { exact_colors } => *exact_colors,
        }
    }

    /// Line height as a multiplier of font size.
    pub fn line_height(&self) -> f64 {
        if self.is_print() {
            1.3
        } else {
            1.5
        }
    }
}

/// Font size tokens. Screen values are CSS pixels, print values are points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeToken {
    Xs,
    Sm,
    Base,
    Lg,
    Xl,
    #[serde(rename = "2xl")]
    Xxl,
    #[serde(rename = "3xl")]
    Xxxl,
}

impl SizeToken {
    /// Resolved font size in CSS pixels.
    pub fn px(&self, media: Media) -> f64 {
        let (screen_px, print_pt) = match self {
            SizeToken::Xs => (12.0, 9.0),
            SizeToken::Sm => (14.0, 10.0),
            SizeToken::Base => (16.0, 11.0),
            SizeToken::Lg => (18.0, 13.0),
            SizeToken::Xl => (20.0, 15.0),
            SizeToken::Xxl => (24.0, 17.0),
            // The name drops to the 2xl print size.
            SizeToken::Xxxl => (30.0, 17.0),
        };
        if media.is_print() {
            print_pt * PX_PER_PT
        } else {
            screen_px
        }
    }

    /// Size in `rem` for the standalone HTML style sheet.
    pub fn rem(&self) -> f64 {
        match self {
            SizeToken::Xs => 0.75,
            SizeToken::Sm => 0.875,
            SizeToken::Base => 1.0,
            SizeToken::Lg => 1.125,
            SizeToken::Xl => 1.25,
            SizeToken::Xxl => 1.5,
            SizeToken::Xxxl => 1.875,
        }
    }
}

/// Font weight tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightToken {
    Normal,
    Medium,
    Semibold,
    Bold,
}

impl WeightToken {
    pub fn value(&self) -> u32 {
        match self {
            WeightToken::Normal => 400,
            WeightToken::Medium => 500,
            WeightToken::Semibold => 600,
            WeightToken::Bold => 700,
        }
    }

    /// Whether a two-face (regular/bold) font set should use the bold face.
    pub fn is_bold(&self) -> bool {
        self.value() >= 600
    }
}

/// A resolved font: size token plus weight token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSpec {
    pub size: SizeToken,
    pub weight: WeightToken,
}

/// A spacing value with separate screen (px) and print (pt) resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Space {
    pub screen_px: f64,
    pub print_pt: f64,
}

impl Space {
    pub const ZERO: Space = Space {
        screen_px: 0.0,
        print_pt: 0.0,
    };

    pub const fn new(screen_px: f64, print_pt: f64) -> Self {
        Self {
            screen_px,
            print_pt,
        }
    }

    /// Same value in both media, given in pixels.
    pub fn px(v: f64) -> Self {
        Self {
            screen_px: v,
            print_pt: v / PX_PER_PT,
        }
    }

    pub fn resolve(&self, media: Media) -> f64 {
        if media.is_print() {
            self.print_pt * PX_PER_PT
        } else {
            self.screen_px
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

/// A solid stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub color: Color,
}

/// Fully resolved visual values carried by every rendered node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStyle {
    pub color: Color,
    pub background: Option<Color>,
    /// Stroke around the whole box.
    pub border: Option<Stroke>,
    /// Rule under the box only.
    pub border_bottom: Option<Stroke>,
    pub radius: f64,
    pub padding: Edges<Space>,
    pub margin_bottom: Space,
    /// Gap between children (both axes for flows).
    pub gap: Space,
    pub font: FontSpec,
    pub text_align: TextAlign,
}

impl NodeStyle {
    /// A plain style: given color and font, no decoration, no spacing.
    pub fn plain(color: Color, font: FontSpec) -> Self {
        Self {
            color,
            background: None,
            border: None,
            border_bottom: None,
            radius: 0.0,
            padding: Edges::uniform(Space::ZERO),
            margin_bottom: Space::ZERO,
            gap: Space::ZERO,
            font,
            text_align: TextAlign::Left,
        }
    }

    /// Padding resolved for the given media.
    pub fn padding(&self, media: Media) -> Edges<f64> {
        Edges {
            top: self.padding.top.resolve(media),
            right: self.padding.right.resolve(media),
            bottom: self.padding.bottom.resolve(media),
            left: self.padding.left.resolve(media),
        }
    }

    /// Whether the node paints anything of its own besides text.
    pub fn is_decorated(&self) -> bool {
        self.background.is_some() || self.border.is_some() || self.border_bottom.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        let c = Color::hex("#1e40af");
        assert_eq!(c.to_rgb8(), [0x1e, 0x40, 0xaf]);
        assert_eq!(Color::hex("fff").to_rgb8(), [255, 255, 255]);
        assert_eq!(Color::hex("nonsense").to_rgb8(), [0, 0, 0]);
    }

    #[test]
    fn test_print_sizes_differ_from_screen() {
        let print = Media::Print { exact_colors: true };
        assert_eq!(SizeToken::Sm.px(Media::Screen), 14.0);
        assert!((SizeToken::Sm.px(print) - 10.0 * PX_PER_PT).abs() < 1e-9);
        assert_eq!(SizeToken::Xxxl.px(print), SizeToken::Xxl.px(print));
    }

    #[test]
    fn test_backgrounds_dropped_without_exact_colors() {
        assert!(Media::Screen.paints_backgrounds());
        assert!(Media::Print { exact_colors: true }.paints_backgrounds());
        assert!(!Media::Print { exact_colors: false }.paints_backgrounds());
    }

    #[test]
    fn test_space_resolution() {
        let s = Space::new(32.0, 15.0);
        assert_eq!(s.resolve(Media::Screen), 32.0);
        assert!((s.resolve(Media::Print { exact_colors: true }) - 20.0).abs() < 1e-9);
        assert!((Space::px(8.0).resolve(Media::Print { exact_colors: true }) - 8.0).abs() < 1e-9);
    }
}
