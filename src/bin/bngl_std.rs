use bngl_std::diagram::{DiagramConfig, StateTransitionDiagrams, build_state_transition_diagrams};
use bngl_std::model::{Model, MoleculeType, Rule};
use bngl_std::similarity::{compare_diagrams, evaluate_structure_similarity};
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(name = "bngl_std")]
#[command(about = "Build per-molecule state transition diagrams of a rule-based model")]
struct Args {
    /// Path to a JSON model description
    #[arg(value_name = "FILE")]
    file: String,

    /// Second JSON model; if given, both models are compared
    #[arg(long, value_name = "FILE", require_equals = true)]
    compare: Option<String>,

    /// Ignore the reverse direction of reversible rules
    #[arg(long)]
    exclude_reverse: bool,

    /// Treat both ends of a homotypic bond as the same atomic pattern
    #[arg(long)]
    no_differentiate_dimers: bool,

    /// Print merged (possibly bidirectional) edges instead of individual rule edges
    #[arg(long)]
    merge_edges: bool,

    /// Logging verbosity (use -v for info, or -v=LEVEL for specific level)
    #[arg(long, short = 'v', value_name = "LEVEL", num_args = 0..=1, default_missing_value = "info", require_equals = true)]
    verbose: Option<Option<LogLevel>>,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
        }
    }
}

/// On-disk model format: molecule declarations and rules are given as BNGL text.
#[derive(serde::Deserialize)]
struct ModelFile {
    molecules: Vec<String>,
    rules: Vec<RuleEntry>,
    #[serde(default)]
    parameters: BTreeMap<String, String>,
}

#[derive(serde::Deserialize)]
struct RuleEntry {
    label: Option<String>,
    rule: String,
    #[serde(default)]
    rates: Vec<String>,
}

fn load_model(path: &str) -> Model {
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path, e);
        std::process::exit(1);
    });
    let file: ModelFile = serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Invalid model file {}: {}", path, e);
        std::process::exit(1);
    });

    let mut molecules = Vec::new();
    for declaration in &file.molecules {
        match MoleculeType::parse(declaration) {
            Ok(molecule) => molecules.push(molecule),
            Err(e) => {
                eprintln!("Invalid molecule declaration in {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }

    let mut rules = Vec::new();
    for entry in &file.rules {
        let rates: Vec<&str> = entry.rates.iter().map(String::as_str).collect();
        match Rule::parse_reaction(entry.label.as_deref(), &entry.rule, &rates) {
            Ok(parsed) => rules.extend(parsed),
            // A broken rule only removes its own edges from the diagrams.
            Err(e) => eprintln!("Skipping rule `{}`: {}", entry.rule, e),
        }
    }

    Model {
        molecules,
        rules,
        parameters: file.parameters,
    }
}

fn build(model: &Model, args: &Args) -> StateTransitionDiagrams {
    let config = DiagramConfig::from(model)
        .with_exclude_reverse(args.exclude_reverse)
        .with_differentiate_dimers(!args.no_differentiate_dimers);
    build_state_transition_diagrams(model, &config).unwrap_or_else(|e| {
        eprintln!("Diagram construction was cancelled: {}", e);
        std::process::exit(1);
    })
}

fn print_diagrams(diagrams: &StateTransitionDiagrams, merge_edges: bool) {
    for (molecule, diagram) in &diagrams.diagrams {
        println!(
            "Molecule {}: {} nodes, {} edges",
            molecule,
            diagram.nodes.len(),
            diagram.edges.len()
        );
        for node in &diagram.nodes {
            println!("  node {}", node);
        }
        if merge_edges {
            for edge in diagram.merged_edges() {
                let arrow = if edge.bidirectional { "<->" } else { "->" };
                println!(
                    "  {} {} {} [{}]",
                    edge.source,
                    arrow,
                    edge.destination,
                    edge.labels.join(", ")
                );
            }
        } else {
            for edge in &diagram.edges {
                println!(
                    "  {} -> {} [{}; {}]",
                    edge.source, edge.destination, edge.label, edge.rate
                );
            }
        }
    }

    for failure in &diagrams.failures {
        println!("Failed rule #{} `{}`: {}", failure.rule_index, failure.label, failure.error);
    }
    for (wildcard, bonds) in &diagrams.wildcard_resolutions {
        let bonds: Vec<String> = bonds.iter().map(|b| b.to_string()).collect();
        println!("Wildcard {} binds {}", wildcard, bonds.join(", "));
    }
    if !diagrams.double_modification_rules.is_empty() {
        println!(
            "Rules modifying several sites: {}",
            diagrams.double_modification_rules.join(", ")
        );
    }
}

fn format_score(score: Option<f64>) -> String {
    score
        .map(|s| format!("{:.3}", s))
        .unwrap_or_else(|| "n/a".to_string())
}

fn main() {
    let args = Args::parse();

    let log_level = match args.verbose {
        None => LevelFilter::Off,
        Some(None) => LevelFilter::Info,
        Some(Some(ref level)) => level.clone().into(),
    };
    Builder::from_default_env().filter_level(log_level).init();

    let model = load_model(&args.file);
    println!(
        "Loaded model with {} molecule types and {} rules.",
        model.molecules.len(),
        model.rules.len()
    );
    let diagrams = build(&model, &args);
    print_diagrams(&diagrams, args.merge_edges);

    let Some(other_path) = args.compare.as_deref() else {
        return;
    };
    let other = load_model(other_path);
    let other_diagrams = build(&other, &args);

    let structure = evaluate_structure_similarity(&model.molecules, &other.molecules);
    println!(
        "Structure similarity: {}/{} ({})",
        structure.overlap,
        structure.total,
        format_score(structure.score())
    );

    let scores = compare_diagrams(
        (model.molecules.as_slice(), &diagrams),
        (other.molecules.as_slice(), &other_diagrams),
    );
    for (molecule, score) in &scores {
        println!(
            "Process similarity of {}: {} vs. {} of {} signatures, score {} / {}",
            molecule,
            score.file1,
            score.file2,
            score.total_space,
            format_score(score.score),
            format_score(score.score2)
        );
        for node in &score.only_in_first {
            println!("  only in {}: {}", args.file, node);
        }
        for node in &score.only_in_second {
            println!("  only in {}: {}", other_path, node);
        }
    }
}
