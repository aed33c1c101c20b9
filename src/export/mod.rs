//! # Export
//!
//! The outermost export calls. [`ExportSession`] owns the per-session state
//! around an export: the "is generating" gate, the progress channel and the
//! last error message. Preconditions are checked before anything is touched;
//! once the pipeline starts, any failure is reported as one generic
//! [`ExportError`] with the real cause logged.

pub mod pdf;
pub mod progress;
pub mod sink;

use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{ExportError, PipelineFailure};
use crate::html;
use crate::model::ResumeData;
use crate::resource::FontSources;
use crate::security::{self, PasswordConfig};
use crate::stage::{Stage, PREVIEW_ELEMENT_ID};
use crate::template::Template;

use self::progress::ProgressTicker;
pub use self::sink::{DirectorySink, MemorySink, SaveSink};

/// How the tall capture is cut into pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SliceStrategy {
    /// Page k shows the image from `k * 277mm`.
    #[default]
    FixedStride,
    /// Pages start at the planner's break offsets.
    PlannedBreaks,
}

/// Tunables for the PDF pipeline. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    /// Device pixels per layout pixel in the capture bitmap.
    pub scale: f64,
    pub jpeg_quality: u8,
    /// Wait after the print sheet is applied, before layout is read.
    pub settle_delay_ms: u64,
    /// Upper bound for loading each font face.
    pub resource_timeout_ms: u64,
    pub progress_interval_ms: u64,
    pub progress_step: u8,
    pub progress_cap: u8,
    pub slice_strategy: SliceStrategy,
    pub fonts: FontSources,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            jpeg_quality: 92,
            settle_delay_ms: 200,
            resource_timeout_ms: 10_000,
            progress_interval_ms: 200,
            progress_step: 10,
            progress_cap: 90,
            slice_strategy: SliceStrategy::FixedStride,
            fonts: FontSources::default(),
        }
    }
}

impl ExportConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn resource_timeout(&self) -> Duration {
        Duration::from_millis(self.resource_timeout_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

/// Make `s` safe for a file name: whitespace runs become `_`, anything
/// other than letters, digits, `-` and `_` is dropped. Falls back to
/// `fallback` when nothing is left.
pub fn sanitize_file_stem(s: &str, fallback: &str) -> String {
    let stem = s
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        fallback.to_string()
    } else {
        stem.to_string()
    }
}

/// `{Name}_{Template_Name}_{YYYY-MM-DD}[_Protected].pdf`
pub fn pdf_file_name(data: &ResumeData, template: &Template, date: NaiveDate, protected: bool) -> String {
    format!(
        "{}_{}_{}{}.pdf",
        sanitize_file_stem(&data.full_name, "Resume"),
        sanitize_file_stem(template.name, "Template"),
        date.format("%Y-%m-%d"),
        if protected { "_Protected" } else { "" }
    )
}

/// What a successful PDF export delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfExport {
    pub file_name: String,
    pub page_count: usize,
    pub size: usize,
}

/// Clears the generating flag when the export settles, on every path.
struct GeneratingGate<'a>(&'a Cell<bool>);

impl<'a> GeneratingGate<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Result<Self, ExportError> {
        if flag.replace(true) {
            return Err(ExportError::AlreadyGenerating);
        }
        Ok(Self(flag))
    }
}

impl Drop for GeneratingGate<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Export state for one open document.
pub struct ExportSession<S: SaveSink> {
    config: ExportConfig,
    sink: S,
    generating: Cell<bool>,
    progress: Arc<watch::Sender<u8>>,
    last_error: RefCell<Option<String>>,
    progress_reset: RefCell<Option<JoinHandle<()>>>,
    date: Option<NaiveDate>,
}

impl<S: SaveSink> ExportSession<S> {
    pub fn new(config: ExportConfig, sink: S) -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            config,
            sink,
            generating: Cell::new(false),
            progress: Arc::new(tx),
            last_error: RefCell::new(None),
            progress_reset: RefCell::new(None),
            date: None,
        }
    }

    /// Stamp file names with `date` instead of today's local date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_generating(&self) -> bool {
        self.generating.get()
    }

    /// Current progress, 0..=100.
    pub fn progress(&self) -> u8 {
        *self.progress.borrow()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    /// Message of the most recent failed export, if not yet cleared.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    pub fn clear_error(&self) {
        self.last_error.replace(None);
    }

    fn today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    fn record<T>(&self, result: Result<T, ExportError>) -> Result<T, ExportError> {
        match &result {
            Ok(_) => {
                self.last_error.replace(None);
            }
            Err(e) => {
                self.last_error.replace(Some(e.to_string()));
            }
        }
        result
    }

    /// Capture the mounted preview, paginate it into an A4 PDF and save it.
    ///
    /// Password protection is cosmetic: the pages carry a visible
    /// "Password Protected" marker and the Info dictionary lists the
    /// requested permissions. The file is not encrypted.
    pub async fn download_pdf(
        &self,
        stage: &Stage,
        data: &ResumeData,
        template: &Template,
        password: &PasswordConfig,
    ) -> Result<PdfExport, ExportError> {
        let result = self.try_download_pdf(stage, data, template, password).await;
        // A rejected overlapping call must not clobber the running export's state.
        if let Err(ExportError::AlreadyGenerating) = result {
            return result;
        }
        self.record(result)
    }

    async fn try_download_pdf(
        &self,
        stage: &Stage,
        data: &ResumeData,
        template: &Template,
        password: &PasswordConfig,
    ) -> Result<PdfExport, ExportError> {
        if self.is_generating() {
            return Err(ExportError::AlreadyGenerating);
        }
        if data.name().is_none() {
            return Err(ExportError::MissingField("full name"));
        }
        security::validate(password).map_err(ExportError::PasswordPolicy)?;
        if !stage.has_element(PREVIEW_ELEMENT_ID) {
            return Err(ExportError::MissingCaptureTarget(PREVIEW_ELEMENT_ID.to_string()));
        }

        let _gate = GeneratingGate::acquire(&self.generating)?;
        if let Some(reset) = self.progress_reset.take() {
            reset.abort();
        }
        let ticker = ProgressTicker::start(
            Arc::clone(&self.progress),
            self.config.progress_interval(),
            self.config.progress_step,
            self.config.progress_cap,
        );
        let protection = password.enabled.then_some(password.permissions);
        if protection.is_some() {
            warn!("password protection is a visible marker only; the PDF is not encrypted");
        }

        let outcome = async {
            let capture = pdf::capture(stage, PREVIEW_ELEMENT_ID, &self.config).await?;
            let doc = pdf::assemble(&capture, data, template, protection, &self.config, self.today())?;
            self.sink.save(&doc.file_name, &doc.bytes)?;
            Ok::<_, PipelineFailure>(doc)
        }
        .await;

        self.progress_reset.replace(ticker.finish(outcome.is_ok()));
        match outcome {
            Ok(doc) => {
                info!("saved {} ({} pages)", doc.file_name, doc.page_count);
                Ok(PdfExport {
                    size: doc.bytes.len(),
                    file_name: doc.file_name,
                    page_count: doc.page_count,
                })
            }
            Err(failure) => {
                error!("PDF generation failed: {}", failure);
                Err(ExportError::Generation(failure))
            }
        }
    }

    /// Serialize the snapshot as a standalone HTML page and save it.
    /// Returns the saved file name.
    pub fn publish_portfolio(&self, data: &ResumeData, template: &Template) -> Result<String, ExportError> {
        let result = self.try_publish_portfolio(data, template);
        self.record(result)
    }

    fn try_publish_portfolio(&self, data: &ResumeData, template: &Template) -> Result<String, ExportError> {
        if data.name().is_none() {
            return Err(ExportError::MissingField("full name"));
        }
        let page = html::portfolio_html(data, template);
        let file_name = html::portfolio_file_name(data);
        match self.sink.save(&file_name, page.as_bytes()) {
            Ok(()) => {
                info!("published {} ({} bytes)", file_name, page.len());
                Ok(file_name)
            }
            Err(e) => {
                let failure = PipelineFailure::from(e);
                error!("portfolio publish failed: {}", failure);
                Err(ExportError::Publish(failure))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Ada Lovelace", "Resume"), "Ada_Lovelace");
        assert_eq!(sanitize_file_stem("  Jean-Luc   O'Brien! ", "Resume"), "Jean-Luc_OBrien");
        assert_eq!(sanitize_file_stem("José Ñúñez", "Resume"), "José_Ñúñez");
        assert_eq!(sanitize_file_stem("../etc/passwd", "Resume"), "etcpasswd");
        assert_eq!(sanitize_file_stem("?!* ...", "Resume"), "Resume");
        assert_eq!(sanitize_file_stem("", "Portfolio"), "Portfolio");
    }

    #[test]
    fn test_pdf_file_name() {
        let data = ResumeData {
            full_name: "Ada Lovelace".to_string(),
            ..Default::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 12, 10).unwrap();
        let template = Template::default();
        assert_eq!(
            pdf_file_name(&data, &template, date, false),
            "Ada_Lovelace_Modern_Professional_2024-12-10.pdf"
        );
        assert_eq!(
            pdf_file_name(&ResumeData::default(), &template, date, true),
            "Resume_Modern_Professional_2024-12-10_Protected.pdf"
        );
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: ExportConfig =
            serde_json::from_str(r#"{"scale": 1.5, "sliceStrategy": "plannedBreaks"}"#).unwrap();
        assert_eq!(config.scale, 1.5);
        assert_eq!(config.slice_strategy, SliceStrategy::PlannedBreaks);
        assert_eq!(config.jpeg_quality, 92);
        assert_eq!(config.progress_interval(), Duration::from_millis(200));
        assert_eq!(config.progress_cap, 90);
    }

    #[test]
    fn test_gate_is_exclusive_and_released() {
        let flag = Cell::new(false);
        {
            let _gate = GeneratingGate::acquire(&flag).unwrap();
            assert!(flag.get());
            assert!(matches!(
                GeneratingGate::acquire(&flag),
                Err(ExportError::AlreadyGenerating)
            ));
        }
        assert!(!flag.get());
    }

    struct FailingSink;

    impl SaveSink for FailingSink {
        fn save(&self, _file_name: &str, _bytes: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn test_publish_failure_is_generic() {
        let session = ExportSession::new(ExportConfig::default(), FailingSink);
        let data = ResumeData {
            full_name: "Ada".to_string(),
            ..Default::default()
        };
        let err = session.publish_portfolio(&data, &Template::default()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to publish portfolio. Please try again.");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(session.last_error().as_deref(), Some("Failed to publish portfolio. Please try again."));
        session.clear_error();
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_publish_requires_name() {
        let session = ExportSession::new(ExportConfig::default(), MemorySink::new());
        let err = session
            .publish_portfolio(&ResumeData::default(), &Template::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::MissingField("full name")));
        assert!(session.sink().files().is_empty());
    }
}
