//! # BuildFolio
//!
//! Resume and portfolio export pipeline.
//!
//! A resume snapshot and one of five templates are projected into a visual
//! tree, the live preview. From there two independent exports exist: a
//! paginated A4 PDF built from a raster capture of the preview, and a
//! standalone HTML page that re-serializes the snapshot with print rules
//! for a browser's print engine.
//!
//! ## Architecture
//!
//! ```text
//! ResumeData + Template
//!       ↓
//!   [render]   visual tree (preview), mounted on the [stage]
//!       ↓                                   ↘
//!   [layout]   geometry under print media     [html]  standalone page
//!       ↓
//!   [raster]   tall RGB capture
//!       ↓
//!   [pdf]      JPEG XObject sliced across A4 pages
//! ```
//!
//! [`export::ExportSession`] drives both exports and owns the generating
//! gate, the progress channel and error reporting.

pub mod model;
pub mod template;
pub mod style;
pub mod render;
pub mod font;
pub mod layout;
pub mod stage;
pub mod resource;
pub mod raster;
pub mod pdf;
pub mod html;
pub mod security;
pub mod export;
pub mod error;

use error::SnapshotError;
use model::ResumeData;
use render::VisualTree;
use template::Template;

/// Build the preview tree for a snapshot.
pub fn render_preview(data: &ResumeData, template: &Template) -> VisualTree {
    render::render(data, template)
}

/// Standalone HTML portfolio page for a snapshot.
pub fn portfolio_html(data: &ResumeData, template: &Template) -> String {
    html::portfolio_html(data, template)
}

/// Parse a snapshot from JSON. Missing fields take their defaults.
pub fn parse_snapshot(json: &str) -> Result<ResumeData, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}
