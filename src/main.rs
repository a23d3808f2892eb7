use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use biopax_sbgn_rs::sbgnml;
use biopax_sbgn_rs::ubique::ListUbiqueDetector;
use biopax_sbgn_rs::{Converter, ConverterConfig, LayoutOutcome, Model};

#[derive(Parser)]
#[command(author, version, about = "Convert pathway models to SBGN-ML process description maps", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a JSON pathway model to SBGN-ML.
    Convert(ConvertArgs),
    /// Print glyph and arc class counts of an SBGN-ML file.
    Inspect {
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Args)]
struct ConvertArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "out.sbgn")]
    output: PathBuf,
    /// JSON converter config; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    layout: bool,
    #[arg(long)]
    single_glyph_reversible: bool,
    #[arg(long)]
    no_flatten: bool,
    #[arg(long)]
    max_nodes: Option<usize>,
    /// Ubiquitous molecules, one name or URI per line.
    #[arg(long)]
    ubiques: Option<PathBuf>,
    /// Treat common currency metabolites (ATP, water, ...) as ubiquitous.
    #[arg(long, conflicts_with = "ubiques")]
    common_ubiques: bool,
    /// Write the glyph id to source URI map as JSON.
    #[arg(long)]
    mapping: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Convert(args) => convert(args),
        Command::Inspect { input } => inspect(&input),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn converter_config(args: &ConvertArgs) -> Result<ConverterConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            ConverterConfig::from_json_str(&json)?
        }
        None => ConverterConfig::default(),
    };
    if args.layout {
        config.do_layout = true;
    }
    if args.single_glyph_reversible {
        config.two_glyphs_for_reversible = false;
    }
    if args.no_flatten {
        config.flatten_complex_content = false;
    }
    if let Some(max_nodes) = args.max_nodes {
        config.max_layout_nodes = max_nodes;
    }
    Ok(config)
}

fn convert(args: ConvertArgs) -> Result<()> {
    let json = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let model = Model::from_json_str(&json)
        .with_context(|| format!("Failed to load model from {}", args.input.display()))?;

    let mut converter = Converter::new(converter_config(&args)?);
    if let Some(path) = &args.ubiques {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open ubique list {}", path.display()))?;
        let detector = ListUbiqueDetector::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to read ubique list {}", path.display()))?;
        converter = converter.with_ubique_detector(detector);
    } else if args.common_ubiques {
        converter = converter.with_ubique_detector(ListUbiqueDetector::common());
    }

    let output = converter.convert(&model);
    if let LayoutOutcome::Skipped(reason) = &output.layout {
        eprintln!("Layout skipped: {reason}");
    }
    if !output.issues.is_empty() {
        eprintln!("{} part(s) of the model could not be drawn", output.issues.len());
    }

    let xml = sbgnml::write_sbgnml(&output.diagram)?;
    fs::write(&args.output, xml)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if let Some(path) = &args.mapping {
        let mapping = serde_json::to_string_pretty(&output.source_map)?;
        fs::write(path, mapping).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    println!(
        "Wrote {} ({} glyphs, {} arcs)",
        args.output.display(),
        output.diagram.glyph_count(),
        output.diagram.arc_count()
    );
    Ok(())
}

fn inspect(input: &Path) -> Result<()> {
    let xml = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let doc = sbgnml::read_sbgnml(&xml)
        .with_context(|| format!("Failed to parse SBGN file {}", input.display()))?;

    println!("language: {}", doc.language.as_deref().unwrap_or("unknown"));
    println!("glyphs: {}", doc.glyphs.len());
    for (class, count) in doc.glyph_class_counts() {
        println!("  {class}: {count}");
    }
    println!("arcs: {}", doc.arcs.len());
    for (class, count) in doc.arc_class_counts() {
        println!("  {class}: {count}");
    }
    Ok(())
}
