//! # Stage
//!
//! The document-wide state an export reaches into: which rendered trees are
//! mounted (by element id) and which print style sheets are active.
//!
//! A print style sheet affects every mounted element, not only the one being
//! captured, so it must never outlive the capture that installed it.
//! [`Stage::apply_print_styles`] hands back a guard; the sheet is removed when
//! the guard drops, whichever way the capture exits.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::render::VisualTree;
use crate::style::Media;

/// Element id the preview is mounted under.
pub const PREVIEW_ELEMENT_ID: &str = "resume-preview";

/// Overrides installed for the duration of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintStyleSheet {
    /// Reproduce backgrounds and colors exactly.
    pub exact_colors: bool,
}

impl Default for PrintStyleSheet {
    fn default() -> Self {
        Self { exact_colors: true }
    }
}

/// Mounted elements plus the active style sheets.
#[derive(Debug, Default)]
pub struct Stage {
    elements: RefCell<BTreeMap<String, VisualTree>>,
    sheets: RefCell<Vec<(u64, PrintStyleSheet)>>,
    next_sheet: Cell<u64>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount (or replace) the tree shown under `id`.
    pub fn mount(&self, id: &str, tree: VisualTree) {
        self.elements.borrow_mut().insert(id.to_string(), tree);
    }

    pub fn unmount(&self, id: &str) -> Option<VisualTree> {
        self.elements.borrow_mut().remove(id)
    }

    /// A snapshot of the tree mounted under `id`.
    pub fn element(&self, id: &str) -> Option<VisualTree> {
        self.elements.borrow().get(id).cloned()
    }

    pub fn has_element(&self, id: &str) -> bool {
        self.elements.borrow().contains_key(id)
    }

    /// Install a print style sheet until the returned guard is dropped.
    pub fn apply_print_styles(&self, sheet: PrintStyleSheet) -> PrintStyleGuard<'_> {
        let id = self.next_sheet.get();
        self.next_sheet.set(id + 1);
        self.sheets.borrow_mut().push((id, sheet));
        log::debug!("print style sheet {} applied", id);
        PrintStyleGuard { stage: self, id }
    }

    pub fn active_sheets(&self) -> usize {
        self.sheets.borrow().len()
    }

    /// Media every element currently resolves against.
    pub fn media(&self) -> Media {
        match self.sheets.borrow().last() {
            Some((_, sheet)) => Media::Print {
                exact_colors: sheet.exact_colors,
            },
            None => Media::Screen,
        }
    }
}

/// Keeps a print style sheet installed. Dropping it removes the sheet.
#[must_use = "the print style sheet is removed as soon as the guard is dropped"]
pub struct PrintStyleGuard<'a> {
    stage: &'a Stage,
    id: u64,
}

impl Drop for PrintStyleGuard<'_> {
    fn drop(&mut self) {
        self.stage.sheets.borrow_mut().retain(|(id, _)| *id != self.id);
        log::debug!("print style sheet {} removed", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResumeData;
    use crate::render::render;
    use crate::template::Template;

    #[test]
    fn test_mount_and_lookup() {
        let stage = Stage::new();
        assert!(!stage.has_element(PREVIEW_ELEMENT_ID));
        stage.mount(
            PREVIEW_ELEMENT_ID,
            render(&ResumeData::default(), &Template::default()),
        );
        assert!(stage.has_element(PREVIEW_ELEMENT_ID));
        assert!(stage.element("other").is_none());
        assert!(stage.unmount(PREVIEW_ELEMENT_ID).is_some());
        assert!(!stage.has_element(PREVIEW_ELEMENT_ID));
    }

    #[test]
    fn test_guard_scopes_print_media() {
        let stage = Stage::new();
        assert_eq!(stage.media(), Media::Screen);
        {
            let _guard = stage.apply_print_styles(PrintStyleSheet::default());
            assert_eq!(stage.media(), Media::Print { exact_colors: true });
            assert_eq!(stage.active_sheets(), 1);
        }
        assert_eq!(stage.media(), Media::Screen);
        assert_eq!(stage.active_sheets(), 0);
    }

    #[test]
    fn test_guard_released_on_early_return() {
        fn failing_capture(stage: &Stage) -> Result<(), String> {
            let _guard = stage.apply_print_styles(PrintStyleSheet::default());
            Err("rasterization failed".to_string())
        }
        let stage = Stage::new();
        assert!(failing_capture(&stage).is_err());
        assert_eq!(stage.active_sheets(), 0);
    }

    #[test]
    fn test_out_of_order_release() {
        let stage = Stage::new();
        let first = stage.apply_print_styles(PrintStyleSheet { exact_colors: false });
        let second = stage.apply_print_styles(PrintStyleSheet::default());
        drop(first);
        assert_eq!(stage.media(), Media::Print { exact_colors: true });
        drop(second);
        assert_eq!(stage.media(), Media::Screen);
    }
}
