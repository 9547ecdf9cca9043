//! blockmatch CLI - span matching, style export and reflow planning

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use blockmatch::export::{read_json, write_json};
use blockmatch::{
    load_document, plan_reconstruction, AliasTable, Blockmatch, Document, ExportOptions,
    FormattingDocument, JsonFormat, PageInput, ReflowOptions, StyleRegistry,
    TranslationOverrides, TranslationRecord, ValidationMetadata,
};

#[derive(Parser)]
#[command(name = "blockmatch")]
#[command(version)]
#[command(about = "Match PDF spans to layout blocks and plan translated reflow", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Match spans to layout blocks
    Enrich {
        /// Page inputs (JSON array of pages)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output session file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Bbox containment tolerance (normalized units)
        #[arg(long)]
        tolerance: Option<f32>,

        /// Disable parallel page matching
        #[arg(long)]
        sequential: bool,

        /// Replay saved validation metadata
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,
    },

    /// Export translation and formatting records
    Export {
        /// Enriched session file
        #[arg(value_name = "SESSION")]
        session: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Earlier formatting export whose style ids are kept
        #[arg(long, value_name = "FORMATTING")]
        styles: Option<PathBuf>,

        /// Source text overrides (JSON object: id -> text)
        #[arg(long, value_name = "FILE")]
        overrides: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Lay translated records out into their blocks
    Layout {
        /// Formatting records
        #[arg(value_name = "FORMATTING")]
        formatting: PathBuf,

        /// Translation records
        #[arg(value_name = "TRANSLATION")]
        translation: PathBuf,

        /// Image alias table
        #[arg(long, value_name = "FILE")]
        aliases: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show session statistics
    Info {
        /// Enriched session file
        #[arg(value_name = "SESSION")]
        session: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Enrich {
            input,
            output,
            tolerance,
            sequential,
            metadata,
        }) => cmd_enrich(
            &input,
            output.as_deref(),
            tolerance,
            sequential,
            metadata.as_deref(),
        ),
        Some(Commands::Export {
            session,
            output,
            styles,
            overrides,
            compact,
        }) => cmd_export(
            &session,
            output.as_deref(),
            styles.as_deref(),
            overrides.as_deref(),
            compact,
        ),
        Some(Commands::Layout {
            formatting,
            translation,
            aliases,
            output,
        }) => cmd_layout(&formatting, &translation, aliases.as_deref(), output.as_deref()),
        Some(Commands::Info { session }) => cmd_info(&session),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: blockmatch <COMMAND>".yellow());
            println!("       blockmatch --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn progress(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

fn default_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}_{}", stem, suffix))
}

fn cmd_enrich(
    input: &Path,
    output: Option<&Path>,
    tolerance: Option<f32>,
    sequential: bool,
    metadata: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input, "session.json"));

    let pages: Vec<PageInput> = read_json(input)?;
    let pb = progress(pages.len() as u64);

    let mut builder = Blockmatch::new();
    if let Some(tolerance) = tolerance {
        builder = builder.with_tolerance(tolerance);
    }
    if sequential {
        builder = builder.sequential();
    }
    if let Some(path) = metadata {
        let saved: ValidationMetadata = read_json(path)?;
        println!(
            "{} {} manual corrections",
            "Replaying".cyan(),
            saved.manual_count()
        );
        builder = builder.with_metadata(saved);
    }

    // Pages are matched in one call; the bar marks them done together.
    pb.set_message("Matching spans...");
    let enriched = builder.enrich(pages)?;
    pb.inc(enriched.document().pages.len() as u64);

    enriched.save(&output)?;
    pb.finish_with_message("Done!");

    print_statistics(enriched.document());
    println!("\n{} {}", "Saved to".green(), output.display());
    Ok(())
}

fn cmd_export(
    session: &Path,
    output: Option<&Path>,
    styles: Option<&Path>,
    overrides: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(session, "export"));

    let doc = load_document(session)?;

    let mut options = ExportOptions::new();
    if compact {
        options = options.compact();
    }
    if let Some(path) = styles {
        let previous: FormattingDocument = read_json(path)?;
        options = options.with_seed_styles(previous.global_styles);
    }
    if let Some(path) = overrides {
        let overrides: TranslationOverrides = read_json(path)?;
        options = options.with_overrides(overrides);
    }

    let export = blockmatch::export_document(&doc, &options)?;
    fs::create_dir_all(&output_dir)?;
    export.write_to_dir(&output_dir, options.format)?;

    println!("{}", "Export".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Records".bold(), export.translations.len());
    println!("{}: {}", "Blocks".bold(), export.formatting.block_count());
    println!("{}: {}", "Styles".bold(), export.formatting.global_styles.len());

    println!("\n{}", "Output files:".green().bold());
    println!("  {} {}", "├─".dimmed(), blockmatch::export::TRANSLATION_FILE);
    println!("  {} {}", "└─".dimmed(), blockmatch::export::FORMATTING_FILE);
    Ok(())
}

fn cmd_layout(
    formatting: &Path,
    translation: &Path,
    aliases: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let formatting: FormattingDocument = read_json(formatting)?;
    let records: Vec<TranslationRecord> = read_json(translation)?;
    let aliases = match aliases {
        Some(path) => read_json(path)?,
        None => AliasTable::new(),
    };

    log::debug!(
        "Loaded {} records for {} blocks",
        records.len(),
        formatting.block_count()
    );

    let pb = progress(1);
    pb.set_message("Laying out blocks...");
    let plan = plan_reconstruction(&formatting, &records, &aliases, &ReflowOptions::default())?;
    pb.inc(1);
    pb.finish_and_clear();

    match output {
        Some(path) => {
            write_json(path, &plan, JsonFormat::Pretty)?;
            let overflow = plan.overflow_count();
            if overflow > 0 {
                eprintln!(
                    "{}: {} blocks overflow their line budget",
                    "Warning".yellow().bold(),
                    overflow
                );
            }
            eprintln!("{} {}", "Saved to".green(), path.display());
        }
        None => println!("{}", blockmatch::export::to_json(&plan, JsonFormat::Pretty)?),
    }
    Ok(())
}

fn cmd_info(session: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(session)?;

    println!("{}", "Session Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), session.display());
    print_statistics(&doc);

    let mut registry = StyleRegistry::new();
    blockmatch::export::register_styles(&doc, &mut registry);
    println!("{}: {}", "Styles".bold(), registry.len());
    Ok(())
}

fn print_statistics(doc: &Document) {
    let stats = doc.statistics();
    println!("{}: {}", "Pages".bold(), stats.page_count);
    println!("{}: {}", "Spans".bold(), stats.span_count);
    println!(
        "{}: {} ({} matched, {} manual, {} unmatched)",
        "Blocks".bold(),
        stats.block_count,
        stats.matched_blocks,
        stats.manual_blocks,
        stats.unmatched_blocks
    );
    println!(
        "{}: {} ({} excluded)",
        "Isolated".bold(),
        stats.isolated_blocks,
        stats.excluded_blocks
    );
    println!("{}: {}", "Merge groups".bold(), stats.merge_groups);
}

fn cmd_version() {
    println!("{} {}", "blockmatch".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Span matching, style export and reflow planning");
    println!();
    println!("License: MIT");
}
