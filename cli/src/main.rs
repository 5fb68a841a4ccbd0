//! pbidoc CLI - Power BI model documentation tool
//!
//! Reads a .pbix/.pbit file (or an analyzer snapshot) and writes Word, PDF
//! and Excel documentation for it.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use pbidoc::render::{JsonFormat, PageSize, RenderOptions};
use pbidoc::{
    AutoBackend, Backend, CanonicalReport, CommandBackend, ExtractOptions, OutputFormat,
    SectionKind,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Power BI model documentation to Word, PDF, and Excel
#[derive(Parser)]
#[command(
    name = "pbidoc",
    author = "iyulab",
    version,
    about = "Generate documentation for Power BI files",
    long_about = "pbidoc - Power BI model documentation generator.\n\n\
                  Reads .pbix reports, .pbit templates, or analyzer snapshots and writes \
                  Word, PDF, and Excel documentation of their metadata, schema, \
                  relationships, Power Query code, M parameters, and DAX."
)]
struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write documentation files for a Power BI file
    Render {
        /// Input file path
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Output format (repeatable; default: all)
        #[arg(short, long = "format", value_enum)]
        formats: Vec<FormatArg>,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// PDF page size
        #[arg(long, value_enum, default_value = "letter")]
        page: PageArg,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show what the analyzer found in each section
    Info {
        /// Input file path
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Render the documentation as plain text
    Text {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Dump the extracted report as JSON
    Json {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show version information
    Version,
}

/// Options selecting what to extract and how.
#[derive(Args)]
struct SourceArgs {
    /// Section to extract (repeatable; default: all except DAX columns)
    #[arg(short, long = "section", value_enum)]
    sections: Vec<SectionArg>,

    /// External analyzer program; invoked as `PROGRAM [ARGS...] <file>`
    #[arg(long, value_name = "PROGRAM")]
    analyzer: Option<PathBuf>,

    /// Argument for the external analyzer (repeatable)
    #[arg(
        long = "analyzer-arg",
        value_name = "ARG",
        requires = "analyzer",
        allow_hyphen_values = true
    )]
    analyzer_args: Vec<String>,
}

impl SourceArgs {
    fn extract_options(&self) -> ExtractOptions {
        if self.sections.is_empty() {
            ExtractOptions::default()
        } else {
            let kinds: Vec<SectionKind> = self.sections.iter().map(|s| (*s).into()).collect();
            ExtractOptions::only(&kinds)
        }
    }

    fn backend(&self) -> Box<dyn Backend> {
        match &self.analyzer {
            Some(program) => Box::new(
                CommandBackend::new(program.as_os_str()).args(self.analyzer_args.iter()),
            ),
            None => Box::new(AutoBackend),
        }
    }

    fn extract(&self, input: &Path) -> Result<CanonicalReport, Box<dyn std::error::Error>> {
        let data = fs::read(input)?;
        let backend = self.backend();
        Ok(pbidoc::extract_with(
            backend.as_ref(),
            &data,
            &self.extract_options(),
        )?)
    }
}

/// Output format
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Word document
    Docx,
    /// PDF document
    Pdf,
    /// Excel workbook
    Xlsx,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Docx => OutputFormat::Docx,
            FormatArg::Pdf => OutputFormat::Pdf,
            FormatArg::Xlsx => OutputFormat::Xlsx,
        }
    }
}

/// PDF page size
#[derive(Clone, Copy, ValueEnum)]
enum PageArg {
    /// US Letter
    Letter,
    /// ISO A4
    A4,
}

impl From<PageArg> for PageSize {
    fn from(page: PageArg) -> Self {
        match page {
            PageArg::Letter => PageSize::Letter,
            PageArg::A4 => PageSize::A4,
        }
    }
}

/// Report section
#[derive(Clone, Copy, ValueEnum)]
enum SectionArg {
    Metadata,
    Schema,
    Relationships,
    PowerQuery,
    MParameters,
    DaxTables,
    DaxMeasures,
    DaxColumns,
}

impl From<SectionArg> for SectionKind {
    fn from(section: SectionArg) -> Self {
        match section {
            SectionArg::Metadata => SectionKind::Metadata,
            SectionArg::Schema => SectionKind::Schema,
            SectionArg::Relationships => SectionKind::Relationships,
            SectionArg::PowerQuery => SectionKind::PowerQuery,
            SectionArg::MParameters => SectionKind::MParameters,
            SectionArg::DaxTables => SectionKind::DaxTables,
            SectionArg::DaxMeasures => SectionKind::DaxMeasures,
            SectionArg::DaxColumns => SectionKind::DaxColumns,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn render_options(title: Option<String>) -> RenderOptions {
    match title {
        Some(title) => RenderOptions::new().with_title(title),
        None => RenderOptions::new(),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Render {
            input,
            output,
            formats,
            title,
            page,
            source,
        } => {
            tracing::info!(input = %input.display(), output = %output.display(), "rendering documentation");
            let pb = create_spinner("Analyzing file...");

            let report = source.extract(&input)?;
            pb.set_message("Rendering documents...");

            let formats: Vec<OutputFormat> = if formats.is_empty() {
                OutputFormat::ALL.to_vec()
            } else {
                formats.into_iter().map(Into::into).collect()
            };
            let options = render_options(title).with_page_size(page.into());
            let upload_name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let documents = pbidoc::render_all(&report, &formats, &options, &upload_name)?;

            fs::create_dir_all(&output)?;
            let mut written = Vec::with_capacity(documents.len());
            for doc in &documents {
                let path = output.join(&doc.file_name);
                fs::write(&path, &doc.data)?;
                written.push((doc.format, path, doc.len()));
            }

            pb.finish_and_clear();
            for (format, path, size) in written {
                println!(
                    "{} {} documentation: {} ({} bytes)",
                    "✓".green().bold(),
                    format.name(),
                    path.display(),
                    size
                );
            }
        }

        Commands::Info {
            input,
            json,
            source,
        } => {
            let pb = create_spinner("Analyzing file...");

            let data = fs::read(&input)?;
            let kind = pbidoc::detect_input(&data).ok();
            let report = pbidoc::extract_with(
                source.backend().as_ref(),
                &data,
                &source.extract_options(),
            )?;

            pb.finish_and_clear();

            if json {
                let sections: Vec<serde_json::Value> = report
                    .sections()
                    .iter()
                    .map(|s| {
                        serde_json::json!({
                            "name": s.name,
                            "title": s.title(),
                            "entries": s.content.as_ref().map(|c| c.len()).unwrap_or(0),
                            "unavailable": s.unavailable,
                        })
                    })
                    .collect();
                let summary = serde_json::json!({
                    "file": input.file_name().unwrap_or_default().to_string_lossy(),
                    "kind": kind.map(|k| k.name()),
                    "sections": sections,
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("{}", "File Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            if let Some(kind) = kind {
                println!("{}: {}", "Kind".bold(), kind);
            }
            println!("{}: {}", "Size".bold(), data.len());

            println!("\n{}", "Sections".cyan().bold());
            println!("{}", "─".repeat(40));
            for section in report.sections() {
                let status = match (&section.content, &section.unavailable) {
                    (Some(content), _) if !content.is_empty() => {
                        format!("{} {}", content.len(), content.variant_name())
                            .green()
                            .to_string()
                    }
                    (_, Some(reason)) => format!("unavailable ({})", reason).yellow().to_string(),
                    _ => "no data".dimmed().to_string(),
                };
                println!("{}: {}", section.title().bold(), status);
            }
        }

        Commands::Text {
            input,
            output,
            title,
            source,
        } => {
            let pb = create_spinner("Analyzing file...");

            let report = source.extract(&input)?;
            pb.set_message("Rendering to text...");

            let text = pbidoc::render::to_text(&report, &render_options(title));

            pb.finish_and_clear();
            write_output(output.as_ref(), &text)?;

            if let Some(path) = output {
                println!("{} Written as text: {}", "✓".green().bold(), path.display());
            }
        }

        Commands::Json {
            input,
            output,
            compact,
            source,
        } => {
            let pb = create_spinner("Analyzing file...");

            let report = source.extract(&input)?;
            pb.set_message("Rendering to JSON...");

            let format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            let json = pbidoc::render::to_json(&report, format)?;

            pb.finish_and_clear();
            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                println!("{} Written as JSON: {}", "✓".green().bold(), path.display());
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn print_version() {
    println!("{} {}", "pbidoc".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Power BI model documentation to Word, PDF, and Excel");
    println!();
    println!("Inputs: PBIX, PBIT, analyzer snapshots (JSON)");
    let formats: Vec<&str> = OutputFormat::ALL
        .iter()
        .filter(|f| f.is_enabled())
        .map(|f| f.name())
        .collect();
    println!("Outputs: {}", formats.join(", "));
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(
        style
            .clone()
            .template("{spinner:.blue} {msg}")
            .unwrap_or(style),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
