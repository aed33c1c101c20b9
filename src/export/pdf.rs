//! The PDF export pipeline.
//!
//! ```text
//! capture:   print sheet on -> settle -> layout -> load faces -> rasterize -> print sheet off
//! assemble:  JPEG encode -> slice pages -> write PDF -> file name
//! ```
//!
//! Both stages report [`PipelineFailure`]; the session turns any failure into
//! the single generic export error.

use std::io::Cursor;

use chrono::NaiveDate;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, RgbImage};
use log::{debug, info};

use crate::error::PipelineFailure;
use crate::layout::page_break::plan_page_breaks;
use crate::layout::{LayoutEngine, LayoutTree};
use crate::model::{PageGeometry, ResumeData};
use crate::pdf::{fixed_stride_slices, planned_slices, DocumentInfo, PageImage, PageSlice, PdfWriter};
use crate::raster;
use crate::resource;
use crate::security::Permissions;
use crate::stage::{PrintStyleSheet, Stage};
use crate::template::Template;

use super::{pdf_file_name, ExportConfig, SliceStrategy};

/// Creator tag in the document info.
pub const CREATOR: &str = "BuildFolio";
/// Producer tag in the document info.
pub const PRODUCER: &str = "BuildFolio PDF Generator";
/// Author used when no name was entered.
pub const FALLBACK_AUTHOR: &str = "Resume Builder User";

/// A captured preview: its geometry under the print sheet and its bitmap.
pub struct Capture {
    pub layout: LayoutTree,
    pub bitmap: RgbImage,
}

/// A finished, not yet delivered, PDF.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Capture the element mounted under `target_id`.
///
/// The print style sheet is installed for exactly the duration of this call.
pub async fn capture(
    stage: &Stage,
    target_id: &str,
    config: &ExportConfig,
) -> Result<Capture, PipelineFailure> {
    let tree = stage
        .element(target_id)
        .ok_or_else(|| PipelineFailure::Capture(format!("'{}' is no longer mounted", target_id)))?;

    let _print = stage.apply_print_styles(PrintStyleSheet::default());
    tokio::time::sleep(config.settle_delay()).await;

    let layout = LayoutEngine::new(stage.media()).layout(&tree);
    let faces = resource::load_faces(&config.fonts, config.resource_timeout()).await;
    let bitmap = raster::rasterize(&layout, &faces, config.scale).map_err(PipelineFailure::Capture)?;
    info!(
        "captured '{}': {}x{} px at scale {}",
        target_id,
        bitmap.width(),
        bitmap.height(),
        config.scale
    );
    Ok(Capture { layout, bitmap })
}

pub fn encode_jpeg(bitmap: &RgbImage, quality: u8) -> Result<Vec<u8>, PipelineFailure> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode(
        bitmap.as_raw(),
        bitmap.width(),
        bitmap.height(),
        ColorType::Rgb8,
    )?;
    Ok(out.into_inner())
}

/// Info dictionary values for a snapshot and template.
pub fn document_info(
    data: &ResumeData,
    template: &Template,
    protection: Option<Permissions>,
) -> DocumentInfo {
    DocumentInfo {
        title: format!("{} - {}", data.name().unwrap_or("Resume"), template.name),
        author: data.name().unwrap_or(FALLBACK_AUTHOR).to_string(),
        creator: CREATOR.to_string(),
        producer: PRODUCER.to_string(),
        protection,
    }
}

/// Cut a document of `doc_height_mm` into A4 page slices.
pub fn slice_pages(layout: &LayoutTree, doc_height_mm: f64, strategy: SliceStrategy) -> Vec<PageSlice> {
    let geometry = PageGeometry::A4;
    let usable = geometry.usable_height_mm();
    match strategy {
        SliceStrategy::FixedStride => fixed_stride_slices(doc_height_mm, usable),
        SliceStrategy::PlannedBreaks => {
            let mm_per_px = geometry.usable_width_mm() / layout.width;
            let blocks = layout.unsplittable_blocks(mm_per_px);
            let breaks = plan_page_breaks(&blocks, usable);
            debug!("planned page breaks (mm): {:?}", breaks);
            planned_slices(doc_height_mm, usable, &breaks, &blocks)
        }
    }
}

/// Turn a capture into a paginated PDF.
pub fn assemble(
    capture: &Capture,
    data: &ResumeData,
    template: &Template,
    protection: Option<Permissions>,
    config: &ExportConfig,
    today: NaiveDate,
) -> Result<PdfDocument, PipelineFailure> {
    let geometry = PageGeometry::A4;
    let image = PageImage {
        jpeg: encode_jpeg(&capture.bitmap, config.jpeg_quality)?,
        width_px: capture.bitmap.width(),
        height_px: capture.bitmap.height(),
    };

    let writer = PdfWriter::new(geometry);
    let doc_height = writer.image_height_mm(&image);
    let slices = slice_pages(&capture.layout, doc_height, config.slice_strategy);

    let info = document_info(data, template, protection);
    let bytes = writer
        .write(&image, &slices, &info)
        .map_err(PipelineFailure::Assembly)?;
    let file_name = pdf_file_name(data, template, today, protection.is_some());
    info!(
        "assembled {} ({} pages, {} bytes, protected: {})",
        file_name,
        slices.len(),
        bytes.len(),
        protection.is_some()
    );

    Ok(PdfDocument {
        file_name,
        bytes,
        page_count: slices.len(),
    })
}
