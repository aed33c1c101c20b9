//! # BuildFolio CLI
//!
//! Stands in for the editor page: reads a resume snapshot from JSON, mounts
//! its preview and runs an export into a directory.
//!
//! Usage:
//!   buildfolio pdf resume.json --template tech-developer -o out/
//!   buildfolio pdf resume.json --user-password read --owner-password edit
//!   buildfolio html resume.json -o out/
//!   buildfolio templates

use std::convert::Infallible;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::sync::watch;

use buildfolio::export::{DirectorySink, ExportConfig, ExportSession};
use buildfolio::model::ResumeData;
use buildfolio::security::PasswordConfig;
use buildfolio::stage::{Stage, PREVIEW_ELEMENT_ID};
use buildfolio::template::{self, Template};

#[derive(Parser)]
#[command(name = "buildfolio")]
#[command(version)]
#[command(about = "Export a resume snapshot as a paginated PDF or a standalone HTML portfolio", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the preview and write an A4 PDF
    Pdf {
        /// Resume snapshot JSON (stdin if not specified)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Template id
        #[arg(short, long, default_value = "modern-professional")]
        template: String,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        /// Export config JSON
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Request protection with this user password
        #[arg(long, requires = "owner_password")]
        user_password: Option<String>,

        /// Owner password, required with --user-password
        #[arg(long, requires = "user_password")]
        owner_password: Option<String>,
    },

    /// Write a standalone HTML portfolio page
    Html {
        /// Resume snapshot JSON (stdin if not specified)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Template id
        #[arg(short, long, default_value = "modern-professional")]
        template: String,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },

    /// List the available templates
    Templates,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Pdf {
            input,
            template,
            out_dir,
            config,
            user_password,
            owner_password,
        } => {
            cmd_pdf(
                input.as_deref(),
                &template,
                out_dir,
                config.as_deref(),
                user_password,
                owner_password,
            )
            .await
        }
        Commands::Html {
            input,
            template,
            out_dir,
        } => cmd_html(input.as_deref(), &template, out_dir),
        Commands::Templates => {
            cmd_templates();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}

async fn cmd_pdf(
    input: Option<&Path>,
    template_id: &str,
    out_dir: PathBuf,
    config: Option<&Path>,
    user_password: Option<String>,
    owner_password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_snapshot(input)?;
    let template = find_template(template_id)?;
    let config = match config {
        Some(path) => serde_json::from_str::<ExportConfig>(&fs::read_to_string(path)?)?,
        None => ExportConfig::default(),
    };
    let password = PasswordConfig {
        enabled: user_password.is_some() || owner_password.is_some(),
        user_password,
        owner_password,
        ..Default::default()
    };

    let stage = Stage::new();
    stage.mount(PREVIEW_ELEMENT_ID, buildfolio::render_preview(&data, template));

    let session = ExportSession::new(config, DirectorySink::new(out_dir));
    let progress = session.subscribe_progress();
    let export = session.download_pdf(&stage, &data, template, &password);
    let result = tokio::select! {
        result = export => result,
        never = report_progress(progress) => match never {},
    };

    match result {
        Ok(pdf) => {
            eprintln!(
                "✓ Written {} ({} pages, {} bytes) to {}",
                pdf.file_name,
                pdf.page_count,
                pdf.size,
                session.sink().dir().display()
            );
            Ok(())
        }
        Err(e) => {
            for violation in e.violations() {
                eprintln!("  - {}", violation);
            }
            Err(e.into())
        }
    }
}

/// Logs progress updates. Never completes.
async fn report_progress(mut rx: watch::Receiver<u8>) -> Infallible {
    while rx.changed().await.is_ok() {
        let value = *rx.borrow_and_update();
        log::debug!("export progress {}%", value);
    }
    std::future::pending().await
}

fn cmd_html(input: Option<&Path>, template_id: &str, out_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_snapshot(input)?;
    let template = find_template(template_id)?;
    let session = ExportSession::new(ExportConfig::default(), DirectorySink::new(out_dir));
    let file_name = session.publish_portfolio(&data, template)?;
    eprintln!("✓ Written {} to {}", file_name, session.sink().dir().display());
    Ok(())
}

fn cmd_templates() {
    for t in template::catalog() {
        println!("{:<22} {:<22} {}", t.id, t.name, t.description);
    }
}

fn read_snapshot(input: Option<&Path>) -> Result<ResumeData, Box<dyn std::error::Error>> {
    let json = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(buildfolio::parse_snapshot(&json)?)
}

fn find_template(id: &str) -> Result<&'static Template, Box<dyn std::error::Error>> {
    Template::by_id(id).ok_or_else(|| {
        let known: Vec<&str> = template::catalog().iter().map(|t| t.id).collect();
        format!("unknown template '{}' (expected one of: {})", id, known.join(", ")).into()
    })
}
