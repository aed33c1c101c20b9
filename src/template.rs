//! Template catalog.
//!
//! Five fixed visual styles. A template is plain data: the renderer and the
//! HTML exporter switch on [`HeaderStyle`] and [`SectionStyle`] rather than
//! dispatching through behavior on the template itself.

use serde::Serialize;

use crate::style::{Color, SizeToken, WeightToken};

/// How the name and contact block is arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    /// Everything centered in one column.
    Center,
    /// Same content, left-aligned.
    Left,
    /// Name, email and phone on the left; profile links on the right.
    Split,
}

/// How section headings (and, for cards, items) are decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStyle {
    /// Accent-colored rule under each heading.
    Bordered,
    /// No decoration.
    Minimal,
    /// Accent-colored rounded panels around headings and items.
    Cards,
}

/// Hex color values; parsed with [`ColorScheme::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorScheme {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub text: &'static str,
    pub background: &'static str,
}

/// The scheme with every value parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub text: Color,
    pub background: Color,
}

impl ColorScheme {
    pub fn resolve(&self) -> Palette {
        Palette {
            primary: Color::hex(self.primary),
            secondary: Color::hex(self.secondary),
            accent: Color::hex(self.accent),
            text: Color::hex(self.text),
            background: Color::hex(self.background),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub heading_font: WeightToken,
    pub body_font: WeightToken,
    pub heading_size: SizeToken,
    pub body_size: SizeToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub header_style: HeaderStyle,
    pub section_style: SectionStyle,
    pub color_scheme: ColorScheme,
    pub typography: Typography,
}

static CATALOG: [Template; 5] = [
    Template {
        id: "modern-professional",
        name: "Modern Professional",
        description: "Clean and professional with blue accents",
        header_style: HeaderStyle::Center,
        section_style: SectionStyle::Bordered,
        color_scheme: ColorScheme {
            primary: "#1e40af",
            secondary: "#3b82f6",
            accent: "#dbeafe",
            text: "#1f2937",
            background: "#ffffff",
        },
        typography: Typography {
            heading_font: WeightToken::Bold,
            body_font: WeightToken::Normal,
            heading_size: SizeToken::Xl,
            body_size: SizeToken::Sm,
        },
    },
    Template {
        id: "creative-designer",
        name: "Creative Designer",
        description: "Vibrant and creative with purple gradients",
        header_style: HeaderStyle::Left,
        section_style: SectionStyle::Cards,
        color_scheme: ColorScheme {
            primary: "#7c3aed",
            secondary: "#a855f7",
            accent: "#f3e8ff",
            text: "#1f2937",
            background: "#fefefe",
        },
        typography: Typography {
            heading_font: WeightToken::Bold,
            body_font: WeightToken::Normal,
            heading_size: SizeToken::Lg,
            body_size: SizeToken::Sm,
        },
    },
    Template {
        id: "tech-developer",
        name: "Tech Developer",
        description: "Modern tech-focused with green accents",
        header_style: HeaderStyle::Split,
        section_style: SectionStyle::Minimal,
        color_scheme: ColorScheme {
            primary: "#059669",
            secondary: "#10b981",
            accent: "#d1fae5",
            text: "#1f2937",
            background: "#ffffff",
        },
        typography: Typography {
            heading_font: WeightToken::Semibold,
            body_font: WeightToken::Normal,
            heading_size: SizeToken::Lg,
            body_size: SizeToken::Sm,
        },
    },
    Template {
        id: "minimalist-clean",
        name: "Minimalist Clean",
        description: "Ultra-clean minimalist design",
        header_style: HeaderStyle::Center,
        section_style: SectionStyle::Minimal,
        color_scheme: ColorScheme {
            primary: "#374151",
            secondary: "#6b7280",
            accent: "#f3f4f6",
            text: "#1f2937",
            background: "#ffffff",
        },
        typography: Typography {
            heading_font: WeightToken::Medium,
            body_font: WeightToken::Normal,
            heading_size: SizeToken::Lg,
            body_size: SizeToken::Sm,
        },
    },
    Template {
        id: "executive-formal",
        name: "Executive Formal",
        description: "Professional executive style with navy theme",
        header_style: HeaderStyle::Left,
        section_style: SectionStyle::Bordered,
        color_scheme: ColorScheme {
            primary: "#1e293b",
            secondary: "#475569",
            accent: "#e2e8f0",
            text: "#1f2937",
            background: "#ffffff",
        },
        typography: Typography {
            heading_font: WeightToken::Bold,
            body_font: WeightToken::Normal,
            heading_size: SizeToken::Xl,
            body_size: SizeToken::Sm,
        },
    },
];

/// Every template, in gallery order.
pub fn catalog() -> &'static [Template] {
    &CATALOG
}

impl Template {
    /// Look a template up by its identifier.
    pub fn by_id(id: &str) -> Option<&'static Template> {
        CATALOG.iter().find(|t| t.id == id)
    }

    pub fn palette(&self) -> Palette {
        self.color_scheme.resolve()
    }
}

impl Default for Template {
    fn default() -> Self {
        CATALOG[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_five_unique_ids() {
        let ids: Vec<_> = catalog().iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 5);
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 5);
    }

    #[test]
    fn test_lookup_by_id() {
        let t = Template::by_id("tech-developer").unwrap();
        assert_eq!(t.name, "Tech Developer");
        assert_eq!(t.header_style, HeaderStyle::Split);
        assert_eq!(t.section_style, SectionStyle::Minimal);
        assert!(Template::by_id("nope").is_none());
    }

    #[test]
    fn test_default_is_modern_professional() {
        assert_eq!(Template::default().name, "Modern Professional");
    }

    #[test]
    fn test_palette_resolves_hex() {
        let p = Template::default().palette();
        assert_eq!(p.accent.to_rgb8(), [0xdb, 0xea, 0xfe]);
        assert_eq!(p.background.to_rgb8(), [255, 255, 255]);
    }
}
