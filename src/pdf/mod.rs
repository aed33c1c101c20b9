//! # PDF Writer
//!
//! Assembles the captured bitmap into a paginated PDF.
//!
//! The capture is a single tall JPEG. It is embedded once, as one image
//! XObject, and every page draws that same object shifted up by the page's
//! offset into the document and clipped to the printable area. Nothing is
//! re-rendered per page.
//!
//! ```text
//! %PDF-1.7
//! 1 0 obj  Catalog
//! 2 0 obj  Pages
//! 3 0 obj  Image XObject (DCTDecode)     <- shared by every page
//! 4 0 obj  Helvetica                     <- only when a marker is stamped
//! n 0 obj  content stream, page          <- one pair per page
//! m 0 obj  Info
//! xref / trailer / %%EOF
//! ```
//!
//! Coordinates are written in points with the origin at the bottom-left of
//! the page. Document offsets come in as millimetres.

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::font::StandardFont;
use crate::layout::page_break::Block;
use crate::model::{PageGeometry, PT_PER_MM};
use crate::security::Permissions;

/// Text stamped on every page of a protected export.
pub const PROTECTION_MARKER: &str = "Password Protected";
/// Marker type size, in points.
const MARKER_FONT_SIZE: f64 = 7.0;
/// Marker grey level (180/255).
const MARKER_GREY: f64 = 180.0 / 255.0;
/// Marker baseline height above the bottom edge, in mm.
const MARKER_BASELINE_MM: f64 = 3.0;
/// Smallest page advance the planned slicer will make.
const SLICE_EPSILON_MM: f64 = 0.01;

/// JPEG bytes of the capture.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub jpeg: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// The part of the document one page shows, in document millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSlice {
    /// Document offset drawn at the top of the printable area.
    pub offset_mm: f64,
    /// How much of the printable area this page reveals.
    pub visible_mm: f64,
}

/// Document information dictionary entries.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub creator: String,
    pub producer: String,
    /// Set when the export was protected: stamps the marker and records the
    /// requested permissions.
    pub protection: Option<Permissions>,
}

/// Pages at a fixed stride: page `k` starts at `k * usable_mm`.
///
/// Always at least one page, even for an empty document.
pub fn fixed_stride_slices(doc_height_mm: f64, usable_mm: f64) -> Vec<PageSlice> {
    let count = if doc_height_mm > 0.0 {
        (doc_height_mm / usable_mm).ceil().max(1.0) as usize
    } else {
        1
    };
    (0..count)
        .map(|k| PageSlice {
            offset_mm: k as f64 * usable_mm,
            visible_mm: usable_mm,
        })
        .collect()
}

/// Pages starting at planned break offsets.
///
/// Each page reveals only up to the next break, so content pushed to the
/// next page is not also shown at the bottom of this one. When the content
/// between two breaks (gaps included) is taller than one page, the page is
/// cut at the lowest block edge that still fits. Only a block taller than a
/// page is cut at a fixed stride.
pub fn planned_slices(
    doc_height_mm: f64,
    usable_mm: f64,
    breaks: &[f64],
    blocks: &[Block],
) -> Vec<PageSlice> {
    let mut starts = vec![0.0];
    for &b in breaks {
        let last = starts.last().copied().unwrap_or(0.0);
        if b > last && b < doc_height_mm {
            starts.push(b);
        }
    }

    let mut slices = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(doc_height_mm).max(start);
        let mut offset = start;
        loop {
            if end - offset <= usable_mm {
                slices.push(PageSlice {
                    offset_mm: offset,
                    visible_mm: (end - offset).max(0.0),
                });
                break;
            }
            let cut = last_fitting_edge(blocks, offset, offset + usable_mm)
                .unwrap_or(offset + usable_mm);
            slices.push(PageSlice {
                offset_mm: offset,
                visible_mm: cut - offset,
            });
            offset = cut;
        }
    }
    // The last page of a document always shows the full printable area.
    if let Some(last) = slices.last_mut() {
        last.visible_mm = usable_mm;
    }
    slices
}

/// The lowest block edge in `(from, limit]` that no block straddles.
fn last_fitting_edge(blocks: &[Block], from: f64, limit: f64) -> Option<f64> {
    blocks
        .iter()
        .flat_map(|b| [b.top, b.bottom()])
        .filter(|&edge| edge > from + SLICE_EPSILON_MM && edge <= limit)
        .filter(|&edge| blocks.iter().all(|b| !b.straddles(edge)))
        .max_by(|a, b| a.total_cmp(b))
}

/// Escape a string for a PDF literal.
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// A PDF text string: a literal for ASCII, UTF-16BE hex with BOM otherwise.
fn pdf_text_string(s: &str) -> String {
    if s.is_ascii() {
        format!("({})", escape_pdf_string(s))
    } else {
        let mut hex = String::from("<FEFF");
        for unit in s.encode_utf16() {
            let _ = write!(hex, "{:04X}", unit);
        }
        hex.push('>');
        hex
    }
}

fn flag(allowed: bool) -> &'static str {
    if allowed {
        "allowed"
    } else {
        "denied"
    }
}

fn mm(v: f64) -> f64 {
    v * PT_PER_MM
}

pub struct PdfWriter {
    geometry: PageGeometry,
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(PdfObject { data });
        self.objects.len() - 1
    }
}

impl PdfWriter {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    /// Height in mm the image occupies when scaled to the printable width.
    pub fn image_height_mm(&self, image: &PageImage) -> f64 {
        if image.width_px == 0 {
            return 0.0;
        }
        self.geometry.usable_width_mm() * image.height_px as f64 / image.width_px as f64
    }

    /// Write the PDF.
    pub fn write(
        &self,
        image: &PageImage,
        slices: &[PageSlice],
        info: &DocumentInfo,
    ) -> Result<Vec<u8>, String> {
        if slices.is_empty() {
            return Err("no pages to write".to_string());
        }
        if image.width_px == 0 || image.height_px == 0 || image.jpeg.is_empty() {
            return Err("empty page image".to_string());
        }

        let mut builder = PdfBuilder {
            objects: Vec::new(),
        };

        // 0 = placeholder (objects are 1-indexed), 1 = Catalog, 2 = Pages
        builder.push(vec![]);
        builder.push(vec![]);
        builder.push(vec![]);

        let mut image_obj: Vec<u8> = Vec::new();
        let _ = write!(
            image_obj,
            "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
             /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode \
             /Length {} >>\nstream\n",
            image.width_px,
            image.height_px,
            image.jpeg.len()
        );
        image_obj.extend_from_slice(&image.jpeg);
        image_obj.extend_from_slice(b"\nendstream");
        let image_id = builder.push(image_obj);

        let font_id = info.protection.map(|_| {
            let dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                StandardFont::Helvetica.pdf_name()
            );
            builder.push(dict.into_bytes())
        });

        let (page_w, page_h) = self.geometry.dimensions_pt();
        let image_h_mm = self.image_height_mm(image);
        let mut page_ids = Vec::with_capacity(slices.len());

        for slice in slices {
            let content = self.content_stream(slice, image_h_mm, info.protection.is_some());
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let mut content_obj: Vec<u8> = Vec::new();
            let _ = write!(
                content_obj,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_obj.extend_from_slice(&compressed);
            content_obj.extend_from_slice(b"\nendstream");
            let content_id = builder.push(content_obj);

            let font_resources = font_id
                .map(|id| format!(" /Font << /F1 {} 0 R >>", id))
                .unwrap_or_default();
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /XObject << /Im0 {} 0 R >>{} >> >>",
                page_w, page_h, content_id, image_id, font_resources
            );
            page_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_ids.len()
        )
        .into_bytes();

        let info_id = builder.push(Self::info_dict(info).into_bytes());
        Ok(self.serialize(&builder, info_id))
    }

    /// Content stream for one page: the shared image, shifted and clipped,
    /// plus the protection marker.
    fn content_stream(&self, slice: &PageSlice, image_h_mm: f64, marker: bool) -> String {
        let g = &self.geometry;
        let page_h = g.height_mm;
        let mut stream = String::new();

        // Clip to the revealed part of the printable area.
        let clip_h = slice.visible_mm.min(g.usable_height_mm());
        let _ = writeln!(stream, "q");
        let _ = writeln!(
            stream,
            "{:.3} {:.3} {:.3} {:.3} re W n",
            mm(g.margin_mm),
            mm(page_h - g.margin_mm - clip_h),
            mm(g.usable_width_mm()),
            mm(clip_h)
        );

        // Image top sits at `margin - offset` from the page top.
        let image_bottom = page_h - (g.margin_mm - slice.offset_mm) - image_h_mm;
        let _ = writeln!(
            stream,
            "{:.3} 0 0 {:.3} {:.3} {:.3} cm",
            mm(g.usable_width_mm()),
            mm(image_h_mm),
            mm(g.margin_mm),
            mm(image_bottom)
        );
        let _ = writeln!(stream, "/Im0 Do");
        let _ = writeln!(stream, "Q");

        if marker {
            let _ = writeln!(
                stream,
                "BT\n/F1 {:.1} Tf\n{:.3} {:.3} {:.3} rg\n{:.3} {:.3} Td\n({}) Tj\nET",
                MARKER_FONT_SIZE,
                MARKER_GREY,
                MARKER_GREY,
                MARKER_GREY,
                mm(g.margin_mm),
                mm(MARKER_BASELINE_MM),
                escape_pdf_string(PROTECTION_MARKER)
            );
        }
        stream
    }

    fn info_dict(info: &DocumentInfo) -> String {
        let mut dict = String::from("<< ");
        let _ = write!(dict, "/Title {} ", pdf_text_string(&info.title));
        let _ = write!(dict, "/Author {} ", pdf_text_string(&info.author));
        let _ = write!(dict, "/Creator {} ", pdf_text_string(&info.creator));
        let _ = write!(dict, "/Producer {} ", pdf_text_string(&info.producer));
        if let Some(p) = info.protection {
            let _ = write!(
                dict,
                "/Protection {} /Permissions {} ",
                pdf_text_string(PROTECTION_MARKER),
                pdf_text_string(&format!(
                    "printing={}; modifying={}; copying={}; annotating={}",
                    flag(p.printing),
                    flag(p.modifying),
                    flag(p.copying),
                    flag(p.annotating)
                ))
            );
        }
        dict.push_str(">>");
        dict
    }

    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> PageImage {
        PageImage {
            jpeg: b"\xFF\xD8\xFF\xE0fake-jpeg".to_vec(),
            width_px: 1588,
            height_px: 5000,
        }
    }

    fn info(protection: Option<Permissions>) -> DocumentInfo {
        DocumentInfo {
            title: "Ada Lovelace - Modern Professional".to_string(),
            author: "Ada Lovelace".to_string(),
            creator: "BuildFolio".to_string(),
            producer: "BuildFolio PDF Generator".to_string(),
            protection,
        }
    }

    fn contains(bytes: &[u8], needle: &str) -> bool {
        bytes.windows(needle.len()).any(|w| w == needle.as_bytes())
    }

    fn occurrences(bytes: &[u8], needle: &str) -> usize {
        bytes.windows(needle.len()).filter(|w| *w == needle.as_bytes()).count()
    }

    #[test]
    fn test_fixed_stride_page_count() {
        assert_eq!(fixed_stride_slices(600.0, 277.0).len(), 3);
        assert_eq!(fixed_stride_slices(277.0, 277.0).len(), 1);
        assert_eq!(fixed_stride_slices(0.0, 277.0).len(), 1);
        let offsets: Vec<f64> = fixed_stride_slices(600.0, 277.0)
            .iter()
            .map(|s| s.offset_mm)
            .collect();
        assert_eq!(offsets, vec![0.0, 277.0, 554.0]);
    }

    #[test]
    fn test_planned_slices_start_at_breaks() {
        let slices = planned_slices(400.0, 277.0, &[250.0], &[]);
        assert_eq!(
            slices,
            vec![
                PageSlice {
                    offset_mm: 0.0,
                    visible_mm: 250.0
                },
                PageSlice {
                    offset_mm: 250.0,
                    visible_mm: 277.0
                },
            ]
        );
    }

    #[test]
    fn test_planned_slices_fall_back_to_stride_in_tall_segment() {
        let tall = [Block { top: 0.0, height: 600.0 }];
        let offsets: Vec<f64> = planned_slices(600.0, 277.0, &[], &tall)
            .iter()
            .map(|s| s.offset_mm)
            .collect();
        assert_eq!(offsets, vec![0.0, 277.0, 554.0]);
    }

    fn spaced(count: usize, height: f64, gap: f64) -> Vec<Block> {
        (0..count)
            .map(|i| Block {
                top: i as f64 * (height + gap),
                height,
            })
            .collect()
    }

    #[test]
    fn test_overfull_segment_is_cut_at_block_edge() {
        // Heights alone fit on one page, the gaps push the last block over.
        let blocks = spaced(6, 40.0, 10.0);
        let doc = blocks[5].bottom();
        let slices = planned_slices(doc, 277.0, &[], &blocks);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].offset_mm, 0.0);
        assert_eq!(slices[0].visible_mm, 250.0);
        assert_eq!(slices[1].offset_mm, 250.0);
    }

    #[test]
    fn test_planned_slices_keep_blocks_whole() {
        let blocks = spaced(80, 23.0, 6.5);
        let doc = blocks[79].bottom();
        let breaks = crate::layout::page_break::plan_page_breaks(&blocks, 277.0);
        let slices = planned_slices(doc, 277.0, &breaks, &blocks);
        assert!(slices.len() >= (doc / 277.0).ceil() as usize);
        for (i, slice) in slices.iter().enumerate() {
            assert!(slice.visible_mm <= 277.0 + 1e-9);
            let page_end = slice.offset_mm + slice.visible_mm;
            for block in &blocks {
                assert!(!block.straddles(slice.offset_mm), "page {} starts inside {:?}", i, block);
                if i + 1 < slices.len() {
                    assert!(!block.straddles(page_end), "page {} ends inside {:?}", i, block);
                }
            }
        }
    }

    #[test]
    fn test_planned_slices_ignore_out_of_range_breaks() {
        let slices = planned_slices(100.0, 277.0, &[0.0, 150.0], &[]);
        assert_eq!(slices.len(), 1);
    }

    #[test]
    fn test_document_structure() {
        let writer = PdfWriter::new(PageGeometry::A4);
        let slices = fixed_stride_slices(writer.image_height_mm(&image()), 277.0);
        let bytes = writer.write(&image(), &slices, &info(None)).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(contains(&bytes, "xref"));
        assert!(contains(&bytes, "%%EOF"));
        assert!(contains(&bytes, &format!("/Count {}", slices.len())));
        // One shared image referenced from every page.
        assert_eq!(occurrences(&bytes, "/DCTDecode"), 1);
        assert_eq!(occurrences(&bytes, "/Im0 3 0 R"), slices.len());
        assert!(!contains(&bytes, "/Font"));
    }

    #[test]
    fn test_metadata_in_info() {
        let writer = PdfWriter::new(PageGeometry::A4);
        let bytes = writer
            .write(&image(), &fixed_stride_slices(10.0, 277.0), &info(None))
            .unwrap();
        assert!(contains(&bytes, "/Title (Ada Lovelace - Modern Professional)"));
        assert!(contains(&bytes, "/Author (Ada Lovelace)"));
        assert!(contains(&bytes, "/Creator (BuildFolio)"));
        assert!(contains(&bytes, "/Producer (BuildFolio PDF Generator)"));
        assert!(contains(&bytes, "/Info "));
    }

    #[test]
    fn test_protection_adds_font_and_permissions() {
        let writer = PdfWriter::new(PageGeometry::A4);
        let bytes = writer
            .write(
                &image(),
                &fixed_stride_slices(10.0, 277.0),
                &info(Some(Permissions::default())),
            )
            .unwrap();
        assert!(contains(&bytes, "/BaseFont /Helvetica"));
        assert!(contains(&bytes, "printing=allowed; modifying=denied"));
    }

    #[test]
    fn test_content_stream_shifts_and_clips() {
        let writer = PdfWriter::new(PageGeometry::A4);
        let slice = PageSlice {
            offset_mm: 277.0,
            visible_mm: 277.0,
        };
        let stream = writer.content_stream(&slice, 600.0, false);
        // Clip box: x=10mm, y=10mm, 190x277mm.
        assert!(stream.contains(&format!(
            "{:.3} {:.3} {:.3} {:.3} re W n",
            mm(10.0),
            mm(10.0),
            mm(190.0),
            mm(277.0)
        )));
        // Image bottom: 297 - (10 - 277) - 600 = -36 mm.
        assert!(stream.contains(&format!("{:.3} {:.3} cm", mm(10.0), mm(-36.0))));
        assert!(!stream.contains(PROTECTION_MARKER));
    }

    #[test]
    fn test_marker_stamped_near_bottom() {
        let writer = PdfWriter::new(PageGeometry::A4);
        let slice = PageSlice {
            offset_mm: 0.0,
            visible_mm: 277.0,
        };
        let stream = writer.content_stream(&slice, 100.0, true);
        assert!(stream.contains("(Password Protected) Tj"));
        assert!(stream.contains("/F1 7.0 Tf"));
        assert!(stream.contains(&format!("{:.3} {:.3} Td", mm(10.0), mm(3.0))));
    }

    #[test]
    fn test_text_strings() {
        assert_eq!(pdf_text_string("A (b)"), "(A \\(b\\))");
        assert_eq!(pdf_text_string("Zoë"), "<FEFF005A006F00EB>");
        assert_eq!(escape_pdf_string("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let writer = PdfWriter::new(PageGeometry::A4);
        assert!(writer.write(&image(), &[], &info(None)).is_err());
        let empty = PageImage {
            jpeg: vec![],
            width_px: 0,
            height_px: 0,
        };
        assert!(writer
            .write(&empty, &fixed_stride_slices(0.0, 277.0), &info(None))
            .is_err());
    }
}
