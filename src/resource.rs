//! # Resource Loading
//!
//! Font faces are the embedded resources of a capture. Each face is given as
//! an ordered list of candidate sources; the first that loads wins.
//!
//! Supported source formats:
//! - `data:...;base64,...` data URI
//! - file path (absolute, or starting with `./` or `../`)
//! - raw base64-encoded font data
//!
//! Loading is bounded by a timeout. A face that fails or runs out of time
//! is not an error: it comes back as `None`, a warning is logged, and text
//! set in that face is left blank.

use std::time::Duration;

use log::warn;
use rusttype::Font;
use serde::{Deserialize, Serialize};

/// Candidate sources for the two faces the rasterizer draws with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontSources {
    pub regular: Vec<String>,
    pub bold: Vec<String>,
}

impl Default for FontSources {
    fn default() -> Self {
        let owned = |paths: &[&str]| paths.iter().map(|p| p.to_string()).collect();
        Self {
            regular: owned(&[
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/TTF/DejaVuSans.ttf",
                "/usr/share/fonts/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
                "/System/Library/Fonts/Supplemental/Arial.ttf",
                "/Library/Fonts/Arial.ttf",
            ]),
            bold: owned(&[
                "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
                "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
                "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
                "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
                "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
                "/Library/Fonts/Arial Bold.ttf",
            ]),
        }
    }
}

/// Faces available to the rasterizer.
#[derive(Default)]
pub struct FontFaces {
    pub regular: Option<Font<'static>>,
    pub bold: Option<Font<'static>>,
}

impl FontFaces {
    /// The face for a weight. Bold text falls back to the regular face.
    pub fn face(&self, bold: bool) -> Option<&Font<'static>> {
        if bold {
            self.bold.as_ref().or(self.regular.as_ref())
        } else {
            self.regular.as_ref()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regular.is_none() && self.bold.is_none()
    }
}

/// Load a font from a source string.
pub fn load_font(src: &str) -> Result<Font<'static>, String> {
    let bytes = read_source_bytes(src)?;
    Font::try_from_vec(bytes).ok_or_else(|| format!("Not a usable TrueType/OpenType font: '{}'", preview(src)))
}

/// Try each candidate in order; the first that loads wins.
pub fn load_first(candidates: &[String]) -> Result<Font<'static>, String> {
    let mut errors = Vec::new();
    for src in candidates {
        match load_font(src) {
            Ok(font) => return Ok(font),
            Err(e) => errors.push(e),
        }
    }
    if errors.is_empty() {
        Err("no font sources configured".to_string())
    } else {
        Err(errors.join("; "))
    }
}

/// Load both faces, each bounded by `timeout`.
pub async fn load_faces(sources: &FontSources, timeout: Duration) -> FontFaces {
    let (regular, bold) = tokio::join!(
        load_with_timeout("regular", sources.regular.clone(), timeout),
        load_with_timeout("bold", sources.bold.clone(), timeout),
    );
    FontFaces { regular, bold }
}

async fn load_with_timeout(
    label: &'static str,
    candidates: Vec<String>,
    timeout: Duration,
) -> Option<Font<'static>> {
    let task = tokio::task::spawn_blocking(move || load_first(&candidates));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(font))) => Some(font),
        Ok(Ok(Err(e))) => {
            warn!("{} font unavailable, its text renders blank: {}", label, e);
            None
        }
        Ok(Err(e)) => {
            warn!("{} font loader panicked: {}", label, e);
            None
        }
        Err(_) => {
            warn!("{} font load timed out after {:?}", label, timeout);
            None
        }
    }
}

/// Resolve the source string to raw bytes.
fn read_source_bytes(src: &str) -> Result<Vec<u8>, String> {
    if src.starts_with("data:") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| "Invalid data URI: missing comma".to_string())?;
        return base64_decode(&src[comma_pos + 1..]);
    }

    // Only explicit path prefixes, so base64 containing '/' is not taken
    // for a path.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src).map_err(|e| format!("Failed to read font file '{}': {}", src, e));
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| format!("Base64 decode error: {}", e))
}

fn preview(src: &str) -> String {
    src.chars().take(48).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_font("/nonexistent/Font.ttf").err().unwrap_or_default();
        assert!(err.contains("/nonexistent/Font.ttf"));
    }

    #[test]
    fn test_invalid_base64() {
        let err = load_font("@@not base64@@").err().unwrap_or_default();
        assert!(err.starts_with("Base64 decode error"));
    }

    #[test]
    fn test_data_uri_without_font_data() {
        // "hello" is valid base64 payload but not a font.
        let err = load_font("data:font/ttf;base64,aGVsbG8=").err().unwrap_or_default();
        assert!(err.starts_with("Not a usable"));
    }

    #[test]
    fn test_data_uri_missing_comma() {
        let err = load_font("data:font/ttf;base64").err().unwrap_or_default();
        assert_eq!(err, "Invalid data URI: missing comma");
    }

    #[test]
    fn test_load_first_collects_errors() {
        let err = load_first(&["/nope/a.ttf".to_string(), "/nope/b.ttf".to_string()])
            .err()
            .unwrap_or_default();
        assert!(err.contains("a.ttf") && err.contains("b.ttf"));
        assert!(load_first(&[]).is_err());
    }

    #[tokio::test]
    async fn test_unloadable_faces_degrade_to_none() {
        let sources = FontSources {
            regular: vec!["/nope/regular.ttf".to_string()],
            bold: vec![],
        };
        let faces = load_faces(&sources, Duration::from_secs(5)).await;
        assert!(faces.is_empty());
        assert!(faces.face(true).is_none());
    }
}
