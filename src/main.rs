use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bio::alignment::distance::levenshtein;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use fragment_assembler::{
    prepare_graph, read_fragments, reverse_complement, AssemblyConfig, FragmentGenerator,
    GeneratorConfig, GreedyAssembler, LogObserver, OverlapConfig, SelectionMode, ValidationMode,
};

/// Greedy overlap assembler for exact-overlap DNA fragments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose/info output (default: quiet)
    #[arg(long, short = 'v', alias = "info", global = true)]
    verbose: bool,

    /// Debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Trace output
    #[arg(long, global = true)]
    trace: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a fragment file into a single sequence
    Assemble(AssembleArgs),
    /// Write a synthetic fragment set and its source sequence
    Simulate(SimulateArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OrientArg {
    /// Single-stranded input, keep fragments as read
    None,
    /// Sequential orientation in input order
    Local,
    /// Anchor-first orientation with reordering
    Global,
}

impl OrientArg {
    fn mode(self) -> Option<SelectionMode> {
        match self {
            Self::None => None,
            Self::Local => Some(SelectionMode::Local),
            Self::Global => Some(SelectionMode::Global),
        }
    }
}

#[derive(clap::Args, Debug)]
struct AssembleArgs {
    /// Fragment file: one sequence per line, FASTA or FASTQ (optionally gzipped)
    input: PathBuf,

    /// Orientation strategy for double-stranded input
    #[arg(long, value_enum, default_value_t = OrientArg::None)]
    orient: OrientArg,

    /// Reject fragments containing symbols other than A/C/G/T
    #[arg(long)]
    strict: bool,

    /// Shortest suffix/prefix match counted as an overlap
    #[arg(long, default_value_t = 1)]
    min_overlap: usize,

    /// Allow an overlap spanning the whole of the shorter fragment
    #[arg(long)]
    allow_containment: bool,

    /// Optional output FASTA path for the assembled sequence
    #[arg(long)]
    output_fasta: Option<PathBuf>,

    /// Wrap assembled FASTA lines to this width (0 = no-wrap)
    #[arg(long, default_value_t = 60)]
    fasta_line_width: usize,

    /// Optional output file for the overlap graph (JSON nodes and edges)
    #[arg(long)]
    export_graph_json: Option<PathBuf>,

    /// Optional reference used for post-assembly confirmation
    #[arg(long)]
    reference: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct SimulateArgs {
    /// Output fragment file (one sequence per line)
    output: PathBuf,

    /// Optional FASTA path for the generated source sequence
    #[arg(long)]
    source_fasta: Option<PathBuf>,

    /// Length of the random source sequence
    #[arg(long, default_value_t = 1000)]
    total_length: usize,

    /// Mean fragment length
    #[arg(long, default_value_t = 100)]
    avg_fragment_length: usize,

    /// Overlap between consecutive fragments
    #[arg(long, default_value_t = 20)]
    min_overlap: usize,

    /// Keep fragments in source order
    #[arg(long)]
    no_shuffle: bool,

    /// Fraction of fragments written reverse-complemented
    #[arg(long, default_value_t = 0.0)]
    reverse_ratio: f64,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() {
    let args = Args::parse();
    let log_level = if args.trace {
        "trace"
    } else if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "error"
    };
    env_logger::Builder::new().parse_filters(log_level).init();

    let outcome = match &args.command {
        Command::Assemble(assemble) => run_assemble(assemble).map(|assembled| {
            if assemble.output_fasta.is_none() {
                println!("{assembled}");
            }
        }),
        Command::Simulate(simulate) => run_simulate(simulate),
    };

    if let Err(error) = outcome {
        eprintln!("Assembly failed: {error:?}");
        std::process::exit(1);
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

fn write_fasta<W: Write>(
    out: &mut W,
    header: &str,
    sequence: &str,
    line_width: usize,
) -> Result<()> {
    writeln!(out, ">{header}")?;
    if line_width == 0 {
        writeln!(out, "{sequence}")?;
    } else {
        for chunk in sequence.as_bytes().chunks(line_width) {
            out.write_all(chunk)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn load_reference(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        bail!("Reference path {} does not exist", path.display());
    }
    let fragments = read_fragments(path, ValidationMode::Permissive)
        .with_context(|| format!("Failed to parse reference {}", path.display()))?;
    if fragments.is_empty() {
        return Ok(None);
    }
    Ok(Some(fragments.iter().map(|f| f.sequence()).collect()))
}

fn run_assemble(args: &AssembleArgs) -> Result<String> {
    let config = AssemblyConfig {
        validation: if args.strict {
            ValidationMode::Strict
        } else {
            ValidationMode::Permissive
        },
        overlap: OverlapConfig {
            min_overlap: args.min_overlap,
            allow_containment: args.allow_containment,
        },
    };

    let fragments = read_fragments(&args.input, config.validation)
        .with_context(|| format!("Failed to parse fragments from {}", args.input.display()))?;
    info!("{} fragments loaded", fragments.len());

    // The exported graph is the oriented one the assembler consumes.
    let graph = prepare_graph(&fragments, args.orient.mode(), config, &mut LogObserver)?;
    if let Some(graph_path) = &args.export_graph_json {
        ensure_parent(graph_path)?;
        let mut file = File::create(graph_path)
            .with_context(|| format!("Failed to create {}", graph_path.display()))?;
        writeln!(file, "{}", serde_json::to_string_pretty(&graph.export())?)?;
        info!("Overlap graph written to {}", graph_path.display());
    }

    let assembled = GreedyAssembler::new().assemble_observed(graph, &mut LogObserver)?;
    let sequence = assembled.sequence().to_string();

    let header = format!(
        "assembled_from_{}",
        args.input
            .file_name()
            .unwrap_or_else(|| "fragments".as_ref())
            .to_string_lossy()
    );
    if let Some(path) = &args.output_fasta {
        ensure_parent(path)?;
        let mut fh =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        write_fasta(&mut fh, &header, &sequence, args.fasta_line_width)?;
        info!("Assembled sequence written to {}", path.display());
    }

    if let Some(reference_path) = &args.reference {
        if let Some(reference) = load_reference(reference_path)? {
            check_against_reference(&sequence, &reference);
        }
    }

    Ok(sequence)
}

fn check_against_reference(assembled: &str, reference: &str) {
    const MAX_DISTANCE_LEN: usize = 20_000;
    if assembled == reference {
        info!(
            "Assembled contig matches the reference sequence exactly ({} bp).",
            assembled.len()
        );
    } else if assembled == reverse_complement(reference) {
        info!(
            "Assembled contig matches the reverse complement of the reference ({} bp).",
            assembled.len()
        );
    } else if assembled.len() <= MAX_DISTANCE_LEN && reference.len() <= MAX_DISTANCE_LEN {
        let distance = levenshtein(assembled.as_bytes(), reference.as_bytes());
        info!(
            "Edit distance to reference (len {} vs {}): {}",
            assembled.len(),
            reference.len(),
            distance
        );
    } else {
        info!(
            "Reference check skipped: assembled length {} or reference length {} exceeds {} bp threshold.",
            assembled.len(),
            reference.len(),
            MAX_DISTANCE_LEN
        );
    }
}

fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let config = GeneratorConfig {
        total_length: args.total_length,
        avg_fragment_length: args.avg_fragment_length,
        min_overlap: args.min_overlap,
        shuffle: !args.no_shuffle,
        reverse_ratio: args.reverse_ratio,
        seed: args.seed,
    };
    let run = FragmentGenerator::new(config)?.generate();

    ensure_parent(&args.output)?;
    let mut out = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    for fragment in &run.fragments {
        writeln!(out, "{}", fragment.sequence())?;
    }
    info!(
        "Wrote {} fragments to {}",
        run.fragments.len(),
        args.output.display()
    );

    if let Some(path) = &args.source_fasta {
        ensure_parent(path)?;
        let mut fh =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        write_fasta(&mut fh, &format!("source_seed_{}", args.seed), &run.source, 60)?;
    }
    Ok(())
}
