use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use genre_grouping::progress::{format_duration, run_phase};
use genre_grouping::safety::validate_output_path;
use genre_grouping::{
    parse_artists, Anomaly, Artist, ClassificationStats, GenreClassifier, GenreIndex,
    GroupingConfig, MergeStrategy,
};

#[derive(Parser)]
#[command(name = "genre-grouping")]
#[command(about = "Group followed artists into a small set of genre groups")]
struct Args {
    /// Artist list as JSON (array, or {"artists": {"items": [...]}})
    input: PathBuf,

    /// Output JSON path (stdout when omitted)
    output: Option<PathBuf>,

    /// Grouping config as JSON; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    similarity_threshold: Option<f64>,

    #[arg(long)]
    small_group_threshold: Option<usize>,

    /// Repeat the similarity merge until nothing changes
    #[arg(long)]
    fixed_point: bool,

    /// Write run statistics to this JSON file
    #[arg(long)]
    stats: Option<PathBuf>,

    #[arg(long, default_value = "0")]
    workers: usize,

    /// Hide spinners for tail-friendly output
    #[arg(long)]
    log_only: bool,

    /// Log every merge and rescue
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    artist_index: BTreeMap<&'a str, &'a Artist>,
    genres_index: &'a GenreIndex,
    stats: &'a ClassificationStats,
    anomalies: &'a [Anomaly],
}

fn load_config(args: &Args) -> Result<GroupingConfig> {
    let mut config = match &args.config {
        Some(path) => GroupingConfig::from_file(path)?,
        None => GroupingConfig::default(),
    };
    if let Some(threshold) = args.similarity_threshold {
        config.similarity_threshold = threshold;
    }
    if let Some(threshold) = args.small_group_threshold {
        config.small_group_threshold = threshold;
    }
    if args.fixed_point {
        config.merge_strategy = MergeStrategy::FixedPoint;
    }
    Ok(config)
}

fn read_artists(path: &Path) -> Result<Vec<Artist>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input {}", path.display()))?;
    parse_artists(&json).with_context(|| format!("Failed to parse artists from {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
    );
    clog.init();

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    if let Some(output) = &args.output {
        let mut sources: Vec<&Path> = vec![args.input.as_path()];
        sources.extend(args.config.as_deref());
        sources.extend(args.stats.as_deref());
        validate_output_path(output, &sources)?;
    }

    let config = load_config(&args)?;
    let classifier = GenreClassifier::new(config).context("Invalid grouping config")?;
    let config = classifier.config();
    log::info!(
        "Similarity threshold {}, small groups <= {}, {:?} merge",
        config.similarity_threshold,
        config.small_group_threshold,
        config.merge_strategy
    );
    log::debug!("Effective config: {:?}", config);

    let start = Instant::now();

    let artists = run_phase("Reading artists", args.log_only, || read_artists(&args.input))?;
    log::info!("Loaded {} artist records from {:?}", artists.len(), args.input);

    let result = run_phase("Grouping", args.log_only, || classifier.classify(&artists));
    result.stats.log_phase("grouping");

    let output = Output {
        artist_index: result
            .artist_index
            .iter()
            .map(|(name, artist)| (name.as_str(), artist))
            .collect(),
        genres_index: &result.genre_index,
        stats: &result.stats,
        anomalies: &result.anomalies,
    };
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize result")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write output {}", path.display()))?;
            log::info!("Wrote {} groups to {:?}", result.genre_index.len(), path);
        }
        None => println!("{}", json),
    }

    if let Some(path) = &args.stats {
        result.stats.write_to_file(path)?;
    }

    let stats = &result.stats;
    eprintln!("\n{:=<60}", "");
    eprintln!("Grouping complete!");
    eprintln!("  Artists: {} ({} records)", stats.total_artists, stats.raw_input_count);
    eprintln!("  Groups: {} (from {} raw genres)", stats.final_groups, stats.initial_groups);
    eprintln!("  Named: {:.1}% ({} in misc)", stats.named_rate(), stats.misc_artists);
    eprintln!("  Anomalies: {}", stats.anomalies);
    eprintln!("  Elapsed: {}", format_duration(start.elapsed()));
    eprintln!("{:=<60}", "");

    Ok(())
}
