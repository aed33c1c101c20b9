//! # Visual Renderer
//!
//! Projects a [`ResumeData`] snapshot and a [`Template`] into a tree of
//! labeled regions: the preview. The same tree backs the live preview and
//! the PDF capture, so every decision about what appears and how it is
//! decorated is made here, once.
//!
//! ```text
//! Preview (Block)
//!   ├─ Header        avoid-split
//!   ├─ About         avoid-split
//!   ├─ Skills        avoid-split
//!   ├─ Experience    splittable between items
//!   │    ├─ Heading  avoid-split-after
//!   │    └─ Item*    avoid-split
//!   ├─ Education     (as Experience)
//!   └─ Projects      (as Experience)
//! ```
//!
//! A section is only emitted when it has something to show, and every node
//! carries colors and type tokens resolved from the template. Nothing in the
//! tree is a hard-coded visual value.

use crate::model::{ContactInfo, EducationItem, ExperienceItem, ProjectItem, ResumeData};
use crate::style::{Edges, FontSpec, NodeStyle, Space, Stroke, TextAlign, WeightToken, SizeToken};
use crate::template::{HeaderStyle, Palette, SectionStyle, Template};

/// What a region of the preview represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Header,
    About,
    Skills,
    Experience,
    Education,
    Projects,
    /// A section heading.
    Heading,
    /// One entry of a list section.
    Item,
}

impl Region {
    pub fn title(&self) -> &'static str {
        match self {
            Region::Header => "Header",
            Region::About => "About Me",
            Region::Skills => "Skills",
            Region::Experience => "Experience",
            Region::Education => "Education",
            Region::Projects => "Projects",
            Region::Heading => "Heading",
            Region::Item => "Item",
        }
    }
}

/// How a node may be divided across a page boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BreakRule {
    /// No constraint of its own.
    #[default]
    Auto,
    /// Never divide this node.
    AvoidSplit,
    /// Breaks may fall between children, never inside one.
    SplittableBetweenItems,
    /// A heading: never divided, and should stay with what follows.
    AvoidSplitAfter,
}

impl BreakRule {
    /// Whether a page boundary may never fall strictly inside the node.
    pub fn is_unsplittable(&self) -> bool {
        matches!(self, BreakRule::AvoidSplit | BreakRule::AvoidSplitAfter)
    }
}

/// Horizontal distribution of a flow's lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Justify {
    #[default]
    Start,
    Center,
}

/// The kinds of node in the preview tree.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Children stacked top to bottom, stretched to full width.
    Block,
    /// Children side by side: the first takes the remaining width, the
    /// rest shrink to fit and sit flush right.
    Row,
    /// Children laid inline at their natural width, wrapping onto new lines.
    Flow { justify: Justify },
    /// A run of text.
    Text { content: String },
}

/// A node in the preview tree.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualNode {
    pub kind: NodeKind,
    pub style: NodeStyle,
    pub children: Vec<VisualNode>,
    pub region: Option<Region>,
    pub break_rule: BreakRule,
}

impl VisualNode {
    pub fn block(style: NodeStyle, children: Vec<VisualNode>) -> Self {
        Self {
            kind: NodeKind::Block,
            style,
            children,
            region: None,
            break_rule: BreakRule::Auto,
        }
    }

    pub fn row(style: NodeStyle, children: Vec<VisualNode>) -> Self {
        Self {
            kind: NodeKind::Row,
            ..Self::block(style, children)
        }
    }

    pub fn flow(justify: Justify, style: NodeStyle, children: Vec<VisualNode>) -> Self {
        Self {
            kind: NodeKind::Flow { justify },
            ..Self::block(style, children)
        }
    }

    pub fn text(content: &str, style: NodeStyle) -> Self {
        Self {
            kind: NodeKind::Text {
                content: content.to_string(),
            },
            ..Self::block(style, vec![])
        }
    }

    fn labeled(mut self, region: Region, break_rule: BreakRule) -> Self {
        self.region = Some(region);
        self.break_rule = break_rule;
        self
    }

    /// Depth-first search for the first node with the given label.
    pub fn find(&self, region: Region) -> Option<&VisualNode> {
        if self.region == Some(region) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(region))
    }

    /// All text content under this node, in document order.
    pub fn text_content(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let NodeKind::Text { content } = &self.kind {
            out.push(content);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// The rendered preview: a root block plus the template it was drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualTree {
    pub template_id: &'static str,
    pub root: VisualNode,
}

impl VisualTree {
    /// Top-level regions (header and sections), in document order.
    pub fn regions(&self) -> Vec<Region> {
        self.root.children.iter().filter_map(|c| c.region).collect()
    }

    pub fn region(&self, region: Region) -> Option<&VisualNode> {
        self.root.children.iter().find(|c| c.region == Some(region))
    }
}

/// Render a snapshot with a template into the preview tree.
pub fn render(data: &ResumeData, template: &Template) -> VisualTree {
    let kit = StyleKit::new(template);

    let mut children = vec![header(data, template, &kit)];
    if let Some(about) = data.about() {
        let paragraph = VisualNode::text(about, kit.body(kit.palette.text, TextAlign::Justify));
        children.push(kit.whole_section(Region::About, vec![paragraph]));
    }
    if data.has_skills() {
        let badges = data.visible_skills().map(|s| kit.badge(s)).collect();
        let flow = VisualNode::flow(Justify::Start, kit.gap(Space::px(8.0)), badges);
        children.push(kit.whole_section(Region::Skills, vec![flow]));
    }
    if data.has_experience() {
        let items = data.visible_experience().map(|e| experience_item(e, &kit)).collect();
        children.push(kit.list_section(Region::Experience, items));
    }
    if data.has_education() {
        let items = data.visible_education().map(|e| education_item(e, &kit)).collect();
        children.push(kit.list_section(Region::Education, items));
    }
    if data.has_projects() {
        let items = data.visible_projects().map(|p| project_item(p, &kit)).collect();
        children.push(kit.list_section(Region::Projects, items));
    }

    let mut root_style = kit.body(kit.palette.text, TextAlign::Left);
    root_style.background = Some(kit.palette.background);
    root_style.padding = Edges::uniform(Space::new(32.0, 15.0));

    VisualTree {
        template_id: template.id,
        root: VisualNode::block(root_style, children),
    }
}

/// Placeholder shown when no name has been entered yet.
pub const NAME_PLACEHOLDER: &str = "Your Name";

fn header(data: &ResumeData, template: &Template, kit: &StyleKit) -> VisualNode {
    let name_align = match template.header_style {
        HeaderStyle::Center => TextAlign::Center,
        HeaderStyle::Left | HeaderStyle::Split => TextAlign::Left,
    };
    let mut name_style = kit.styled(
        kit.palette.primary,
        FontSpec {
            size: SizeToken::Xxxl,
            weight: WeightToken::Bold,
        },
        name_align,
    );
    name_style.margin_bottom = Space::new(8.0, 6.0);
    let name = VisualNode::text(data.name().unwrap_or(NAME_PLACEHOLDER), name_style);

    let contact = &data.contact;
    let mut header_style = kit.gap(Space::ZERO);
    header_style.margin_bottom = Space::new(32.0, 15.0);

    let node = match template.header_style {
        HeaderStyle::Center | HeaderStyle::Left => {
            let justify = if template.header_style == HeaderStyle::Center {
                Justify::Center
            } else {
                Justify::Start
            };
            let items: Vec<_> = contact_lines(contact, true, true)
                .into_iter()
                .map(|line| VisualNode::text(line, kit.contact(TextAlign::Left)))
                .collect();
            let mut children = vec![name];
            if !items.is_empty() {
                children.push(VisualNode::flow(justify, kit.gap(Space::px(16.0)), items));
            }
            VisualNode::block(header_style, children)
        }
        HeaderStyle::Split => {
            let left_lines = contact_lines(contact, true, false)
                .into_iter()
                .map(|line| VisualNode::text(line, kit.contact(TextAlign::Left)));
            let mut left = vec![name];
            left.extend(left_lines);
            let right: Vec<_> = contact_lines(contact, false, true)
                .into_iter()
                .map(|line| VisualNode::text(line, kit.contact(TextAlign::Right)))
                .collect();

            let mut row_style = header_style;
            row_style.gap = Space::px(16.0);
            let mut columns = vec![VisualNode::block(kit.gap(Space::px(4.0)), left)];
            if !right.is_empty() {
                columns.push(VisualNode::block(kit.gap(Space::px(4.0)), right));
            }
            VisualNode::row(row_style, columns)
        }
    };
    node.labeled(Region::Header, BreakRule::AvoidSplit)
}

/// Contact lines: direct details (email, phone) and profile links.
fn contact_lines(contact: &ContactInfo, direct: bool, links: bool) -> Vec<&str> {
    let mut lines = Vec::new();
    if direct {
        lines.extend(contact.email());
        lines.extend(contact.phone());
    }
    if links {
        if contact.linkedin().is_some() {
            lines.push("LinkedIn");
        }
        if contact.github().is_some() {
            lines.push("GitHub");
        }
    }
    lines
}

fn experience_item(item: &ExperienceItem, kit: &StyleKit) -> VisualNode {
    let mut children = Vec::new();
    children.extend(kit.title_row(&item.role, &item.duration));
    if let Some(company) = crate::model::displayable(&item.company) {
        let mut style = kit.body(kit.palette.secondary, TextAlign::Left);
        style.font.weight = kit.heading_weight;
        children.push(VisualNode::text(company, style));
    }
    kit.item(children)
}

fn education_item(item: &EducationItem, kit: &StyleKit) -> VisualNode {
    let mut children = Vec::new();
    children.extend(kit.title_row(&item.degree, &item.year));
    if let Some(institution) = crate::model::displayable(&item.institution) {
        children.push(VisualNode::text(
            institution,
            kit.body(kit.palette.secondary, TextAlign::Left),
        ));
    }
    kit.item(children)
}

fn project_item(item: &ProjectItem, kit: &StyleKit) -> VisualNode {
    let mut children = Vec::new();
    if let Some(title) = crate::model::displayable(&item.title) {
        let mut style = kit.item_title();
        style.margin_bottom = Space::px(4.0);
        children.push(VisualNode::text(title, style));
    }
    if let Some(description) = crate::model::displayable(&item.description) {
        let mut style = kit.body(kit.palette.text, TextAlign::Justify);
        style.margin_bottom = Space::px(8.0);
        children.push(VisualNode::text(description, style));
    }
    if let Some(tech) = crate::model::displayable(&item.tech_used) {
        let mut style = kit.body(kit.palette.secondary, TextAlign::Left);
        style.margin_bottom = Space::px(4.0);
        children.push(VisualNode::text(&format!("Technologies: {}", tech), style));
    }
    if crate::model::displayable(&item.github_link).is_some() {
        children.push(VisualNode::text(
            "GitHub Repository",
            kit.body(kit.palette.primary, TextAlign::Left),
        ));
    }
    kit.item(children)
}

/// Template-derived style factory shared by all region builders.
struct StyleKit {
    palette: Palette,
    section_style: SectionStyle,
    heading_weight: WeightToken,
    heading_size: SizeToken,
    body_font: FontSpec,
}

impl StyleKit {
    fn new(template: &Template) -> Self {
        let t = &template.typography;
        Self {
            palette: template.palette(),
            section_style: template.section_style,
            heading_weight: t.heading_font,
            heading_size: t.heading_size,
            body_font: FontSpec {
                size: t.body_size,
                weight: t.body_font,
            },
        }
    }

    fn styled(&self, color: crate::style::Color, font: FontSpec, align: TextAlign) -> NodeStyle {
        let mut style = NodeStyle::plain(color, font);
        style.text_align = align;
        style
    }

    fn body(&self, color: crate::style::Color, align: TextAlign) -> NodeStyle {
        self.styled(color, self.body_font, align)
    }

    /// An undecorated container with the given child gap.
    fn gap(&self, gap: Space) -> NodeStyle {
        let mut style = self.body(self.palette.text, TextAlign::Left);
        style.gap = gap;
        style
    }

    fn contact(&self, align: TextAlign) -> NodeStyle {
        self.styled(
            self.palette.secondary,
            FontSpec {
                size: SizeToken::Sm,
                weight: WeightToken::Normal,
            },
            align,
        )
    }

    fn item_title(&self) -> NodeStyle {
        self.styled(
            self.palette.text,
            FontSpec {
                size: SizeToken::Base,
                weight: self.heading_weight,
            },
            TextAlign::Left,
        )
    }

    fn badge(&self, skill: &str) -> VisualNode {
        let mut style = self.styled(
            self.palette.primary,
            FontSpec {
                size: SizeToken::Xs,
                weight: WeightToken::Semibold,
            },
            TextAlign::Left,
        );
        style.background = Some(self.palette.accent);
        style.border = Some(Stroke {
            width: 1.0,
            color: self.palette.secondary,
        });
        style.radius = 9999.0;
        style.padding = Edges::symmetric(Space::new(2.0, 1.0), Space::new(10.0, 4.0));
        VisualNode::text(skill, style)
    }

    fn heading(&self, region: Region) -> VisualNode {
        let mut style = self.styled(
            self.palette.primary,
            FontSpec {
                size: self.heading_size,
                weight: self.heading_weight,
            },
            TextAlign::Left,
        );
        style.padding.bottom = Space::px(4.0);
        style.margin_bottom = Space::new(12.0, 8.0);
        match self.section_style {
            SectionStyle::Bordered => {
                style.border_bottom = Some(Stroke {
                    width: 2.0,
                    color: self.palette.accent,
                });
            }
            SectionStyle::Cards => {
                style.background = Some(self.palette.accent);
                style.radius = 8.0;
                style.padding = Edges::uniform(Space::px(12.0));
            }
            SectionStyle::Minimal => {}
        }
        VisualNode::text(region.title(), style).labeled(Region::Heading, BreakRule::AvoidSplitAfter)
    }

    fn section_style(&self) -> NodeStyle {
        let mut style = self.gap(Space::ZERO);
        style.margin_bottom = Space::new(24.0, 10.0);
        style
    }

    /// A section kept on one page as a whole (about, skills).
    fn whole_section(&self, region: Region, body: Vec<VisualNode>) -> VisualNode {
        let mut children = vec![self.heading(region)];
        children.extend(body);
        VisualNode::block(self.section_style(), children).labeled(region, BreakRule::AvoidSplit)
    }

    /// A list section: breaks may fall between items, never inside one.
    fn list_section(&self, region: Region, items: Vec<VisualNode>) -> VisualNode {
        let list = VisualNode::block(self.gap(Space::new(16.0, 8.0)), items);
        VisualNode::block(self.section_style(), vec![self.heading(region), list])
            .labeled(region, BreakRule::SplittableBetweenItems)
    }

    fn item(&self, children: Vec<VisualNode>) -> VisualNode {
        let mut style = self.gap(Space::ZERO);
        if self.section_style == SectionStyle::Cards {
            style.background = Some(self.palette.accent);
            style.radius = 8.0;
            style.padding = Edges::uniform(Space::px(16.0));
        }
        VisualNode::block(style, children).labeled(Region::Item, BreakRule::AvoidSplit)
    }

    /// Title on the left, date flush right; either may be absent.
    fn title_row(&self, title: &str, date: &str) -> Option<VisualNode> {
        let title = crate::model::displayable(title);
        let date = crate::model::displayable(date);
        if title.is_none() && date.is_none() {
            return None;
        }
        let mut row_style = self.gap(Space::px(8.0));
        row_style.margin_bottom = Space::px(4.0);
        let children = vec![
            VisualNode::text(title.unwrap_or(""), self.item_title()),
            VisualNode::text(
                date.unwrap_or(""),
                self.body(self.palette.secondary, TextAlign::Right),
            ),
        ];
        Some(VisualNode::row(row_style, children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn ada() -> ResumeData {
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

    #[test]
    fn test_only_sections_with_content_are_emitted() {
        let tree = render(&ada(), &Template::default());
        assert_eq!(
            tree.regions(),
            vec![Region::Header, Region::Skills, Region::Projects]
        );
    }

    #[test]
    fn test_blank_rows_skip_section() {
        let mut data = ada();
        data.education = vec![EducationItem::default()];
        data.experience = vec![ExperienceItem::default(), ExperienceItem::default()];
        let tree = render(&data, &Template::default());
        assert!(tree.region(Region::Education).is_none());
        assert!(tree.region(Region::Experience).is_none());
    }

    #[test]
    fn test_break_rules() {
        let mut data = ada();
        data.about_me = "Analyst.".to_string();
        let tree = render(&data, &Template::default());
        assert_eq!(tree.region(Region::Header).unwrap().break_rule, BreakRule::AvoidSplit);
        assert_eq!(tree.region(Region::About).unwrap().break_rule, BreakRule::AvoidSplit);

        let projects = tree.region(Region::Projects).unwrap();
        assert_eq!(projects.break_rule, BreakRule::SplittableBetweenItems);
        let heading = projects.find(Region::Heading).unwrap();
        assert_eq!(heading.break_rule, BreakRule::AvoidSplitAfter);
        let item = projects.find(Region::Item).unwrap();
        assert_eq!(item.break_rule, BreakRule::AvoidSplit);
    }

    #[test]
    fn test_split_header_puts_links_in_right_column() {
        let mut data = ada();
        data.contact.linkedin = "https://linkedin.com/in/ada".to_string();
        let template = Template::by_id("tech-developer").unwrap();
        let tree = render(&data, template);
        let header = tree.region(Region::Header).unwrap();
        assert_eq!(header.kind, NodeKind::Row);
        assert_eq!(header.children.len(), 2);
        assert_eq!(header.children[0].text_content(), vec!["Ada Lovelace", "a@b.com"]);
        assert_eq!(header.children[1].text_content(), vec!["LinkedIn"]);
    }

    #[test]
    fn test_centered_header_centers_contact_flow() {
        let tree = render(&ada(), &Template::default());
        let header = tree.region(Region::Header).unwrap();
        assert_eq!(header.children[0].style.text_align, TextAlign::Center);
        assert_eq!(
            header.children[1].kind,
            NodeKind::Flow {
                justify: Justify::Center
            }
        );
    }

    #[test]
    fn test_section_decoration_follows_template() {
        let palette_of = |id: &str| Template::by_id(id).unwrap().palette();

        let bordered = render(&ada(), Template::by_id("modern-professional").unwrap());
        let heading = bordered.root.find(Region::Heading).unwrap();
        assert_eq!(
            heading.style.border_bottom.map(|s| s.color),
            Some(palette_of("modern-professional").accent)
        );
        assert!(heading.style.background.is_none());

        let cards = render(&ada(), Template::by_id("creative-designer").unwrap());
        let heading = cards.root.find(Region::Heading).unwrap();
        assert_eq!(heading.style.background, Some(palette_of("creative-designer").accent));
        let item = cards.root.find(Region::Item).unwrap();
        assert_eq!(item.style.background, Some(palette_of("creative-designer").accent));
        assert!(item.style.radius > 0.0);

        let minimal = render(&ada(), Template::by_id("minimalist-clean").unwrap());
        let heading = minimal.root.find(Region::Heading).unwrap();
        assert!(!heading.style.is_decorated());
    }

    #[test]
    fn test_missing_name_uses_placeholder() {
        let tree = render(&ResumeData::default(), &Template::default());
        assert_eq!(tree.regions(), vec![Region::Header]);
        let header = tree.region(Region::Header).unwrap();
        assert_eq!(header.text_content(), vec![NAME_PLACEHOLDER]);
    }
}
