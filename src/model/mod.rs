//! # Document Model
//!
//! The snapshot of user-entered resume content handed to the renderer and
//! the exporters. A snapshot is read-only for the duration of one export:
//! every stage takes it by reference and never mutates it.
//!
//! The editing layer always keeps a trailing blank row in each list, so the
//! lists routinely contain entries where every field is empty. Nothing here
//! assumes that, though. A zero-length list and a list of blank rows are
//! treated identically by the display predicates below: the section is
//! skipped.

use serde::{Deserialize, Serialize};

/// A complete resume/portfolio snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeData {
    /// Required for export; drives titles, authors and file names.
    pub full_name: String,
    pub about_me: String,
    /// Insertion order is display order.
    pub skills: Vec<String>,
    pub education: Vec<EducationItem>,
    pub projects: Vec<ProjectItem>,
    pub experience: Vec<ExperienceItem>,
    pub contact: ContactInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationItem {
    pub institution: String,
    pub degree: String,
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectItem {
    pub title: String,
    pub description: String,
    pub tech_used: String,
    pub github_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceItem {
    pub company: String,
    pub role: String,
    pub duration: String,
}

/// Contact details. Presence of a value alone toggles its display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
}

/// A text field is displayable when it has something besides whitespace.
pub fn displayable(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Entries of a list section that have at least one non-blank field.
pub trait Entry {
    fn is_blank(&self) -> bool;
}

impl Entry for EducationItem {
    fn is_blank(&self) -> bool {
        [&self.institution, &self.degree, &self.year]
            .iter()
            .all(|f| displayable(f).is_none())
    }
}

impl Entry for ProjectItem {
    fn is_blank(&self) -> bool {
        [&self.title, &self.description, &self.tech_used, &self.github_link]
            .iter()
            .all(|f| displayable(f).is_none())
    }
}

impl Entry for ExperienceItem {
    fn is_blank(&self) -> bool {
        [&self.company, &self.role, &self.duration]
            .iter()
            .all(|f| displayable(f).is_none())
    }
}

fn visible<T: Entry>(items: &[T]) -> impl Iterator<Item = &T> {
    items.iter().filter(|item| !item.is_blank())
}

impl ResumeData {
    /// The trimmed full name, if one was entered.
    pub fn name(&self) -> Option<&str> {
        displayable(&self.full_name)
    }

    pub fn about(&self) -> Option<&str> {
        displayable(&self.about_me)
    }

    pub fn visible_skills(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().filter_map(|s| displayable(s))
    }

    pub fn visible_education(&self) -> impl Iterator<Item = &EducationItem> {
        visible(&self.education)
    }

    pub fn visible_projects(&self) -> impl Iterator<Item = &ProjectItem> {
        visible(&self.projects)
    }

    pub fn visible_experience(&self) -> impl Iterator<Item = &ExperienceItem> {
        visible(&self.experience)
    }

    pub fn has_skills(&self) -> bool {
        self.visible_skills().next().is_some()
    }

    pub fn has_education(&self) -> bool {
        self.visible_education().next().is_some()
    }

    pub fn has_projects(&self) -> bool {
        self.visible_projects().next().is_some()
    }

    pub fn has_experience(&self) -> bool {
        self.visible_experience().next().is_some()
    }
}

impl ContactInfo {
    pub fn email(&self) -> Option<&str> {
        displayable(&self.email)
    }

    pub fn phone(&self) -> Option<&str> {
        displayable(&self.phone)
    }

    pub fn linkedin(&self) -> Option<&str> {
        displayable(&self.linkedin)
    }

    pub fn github(&self) -> Option<&str> {
        displayable(&self.github)
    }

    pub fn is_empty(&self) -> bool {
        self.email().is_none()
            && self.phone().is_none()
            && self.linkedin().is_none()
            && self.github().is_none()
    }
}

/// Fixed output page geometry, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
}

/// Points per millimetre (72 pt per 25.4 mm).
pub const PT_PER_MM: f64 = 72.0 / 25.4;

impl PageGeometry {
    /// A4 portrait with a uniform 10 mm margin.
    pub const A4: PageGeometry = PageGeometry {
        width_mm: 210.0,
        height_mm: 297.0,
        margin_mm: 10.0,
    };

    /// Page height minus top and bottom margins.
    pub fn usable_height_mm(&self) -> f64 {
        self.height_mm - self.margin_mm * 2.0
    }

    /// Page width minus left and right margins.
    pub fn usable_width_mm(&self) -> f64 {
        self.width_mm - self.margin_mm * 2.0
    }

    /// Returns (width, height) in points.
    pub fn dimensions_pt(&self) -> (f64, f64) {
        (self.width_mm * PT_PER_MM, self.height_mm * PT_PER_MM)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry::A4
    }
}
