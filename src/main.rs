//! stickgen CLI - random stick knot generation in spherical confinement.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stickgen::{
    batch, run, AmbiguousHomflySet, BatchConfig, CommandInvariantOracle, CommandPolygonSampler,
    CommandPrimaryClassifier, CommandSymbolicEngine, Config, Polygon, Resolution, Resolver,
    RunConfig, StickNumberTable,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "stickgen")]
#[command(version)]
#[command(about = "Sample random equilateral polygons in a sphere and census their knot types")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sampling chain and census the knots it produces
    Run {
        /// Radius of the confining sphere
        #[arg(short = 'r', long, default_value = "1.01")]
        confinement_radius: f64,

        /// Number of edges of the sampled polygons
        #[arg(short, long)]
        num_edges: u32,

        /// Number of polygons to classify, not counting burn-in
        #[arg(short, long)]
        max_iterations: u64,

        /// Wall-clock budget in seconds
        #[arg(long, default_value = "86400")]
        max_seconds: u64,

        /// Sample-log verbosity: 1 records only, 2 adds ties, 3 adds worse and composites
        #[arg(long, default_value = "2")]
        verbosity: u8,

        /// Seed for the sampler (random when absent)
        #[arg(long)]
        random_seed: Option<u64>,

        /// Interesting-sample log output path (JSON lines)
        #[arg(long)]
        log_out: Option<PathBuf>,

        /// Frequency table output path (JSON)
        #[arg(long)]
        counts_out: Option<PathBuf>,
    },

    /// Run many independent sampling chains as parallel processes
    Batch {
        /// Radius of the confining sphere
        #[arg(short = 'r', long, default_value = "1.01")]
        confinement_radius: f64,

        /// Number of edges of the sampled polygons
        #[arg(short, long)]
        num_edges: u32,

        /// Total number of polygons to generate across all jobs
        #[arg(short, long)]
        total_samples: u64,

        /// Number of polygons per job
        #[arg(short, long, default_value = "1000000")]
        batch_size: u64,

        /// Wall-clock budget per job in seconds
        #[arg(long, default_value = "86400")]
        batch_max_seconds: u64,

        /// Verbosity level passed to each job
        #[arg(long, default_value = "2")]
        verbosity: u8,

        /// Maximum number of concurrently running jobs
        #[arg(short = 'p', long, default_value = "4")]
        max_processes: usize,

        /// Directory for per-job sample logs
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,

        /// Directory for per-job frequency tables
        #[arg(long, default_value = "counts")]
        counts_dir: PathBuf,
    },

    /// Classify a single polygon from a vertex file
    Identify {
        /// File of whitespace-delimited vertex coordinate rows
        knot_file: PathBuf,

        /// Seed passed to the classifier's randomized projection
        #[arg(long, default_value = "0")]
        random_seed: u64,
    },

    /// Show example configuration
    Example,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

fn print_example_config() {
    let example = r#"# stickgen configuration file
#
# Every tool entry is optional; absent entries fall back to looking the
# program up on PATH under its default name.

[tools.sampler]
program = "plc-tsmcmc-sample"

[tools.classifier]
program = "plc-classify"

[tools.oracle]
program = "python"
args = ["identify_knot.py"]

[tools.symbolic]
program = "homfly-convert"
"#;
    println!("{example}");
}

/// Assemble the command-backed classification pipeline from the tools
/// config and run it over one polygon.
fn resolve_with_tools(config: &Config, seed: u64) -> impl Fn(&Polygon) -> Resolution {
    let primary = CommandPrimaryClassifier::new(config.tools.classifier.clone());
    let oracle = CommandInvariantOracle::new(config.tools.oracle.clone());
    let symbolic = CommandSymbolicEngine::new(config.tools.symbolic.clone());
    let ambiguous = AmbiguousHomflySet::default();
    move |polygon: &Polygon| {
        Resolver::new(&primary, &oracle, &symbolic, &ambiguous, seed).resolve(polygon)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Example => {
            print_example_config();
            return Ok(());
        }

        Commands::Run {
            confinement_radius,
            num_edges,
            max_iterations,
            max_seconds,
            verbosity,
            random_seed,
            log_out,
            counts_out,
        } => {
            let config = Config::load_or_default(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

            let run_config = RunConfig {
                confinement_radius,
                num_edges,
                max_iterations,
                max_seconds,
                verbosity,
                random_seed: random_seed.unwrap_or_else(rand::random),
                log_out,
                counts_out,
            };
            run_config.validate().context("Invalid run parameters")?;

            let sticks = StickNumberTable::default();
            let mut sampler = CommandPolygonSampler::new(config.tools.sampler.clone());
            let resolve = resolve_with_tools(&config, run_config.random_seed);

            let output = run::run(&run_config, &mut sampler, resolve, &sticks)?;

            if let Some(path) = &run_config.log_out {
                run::write_sample_log(path, &output.records)
                    .with_context(|| format!("Failed to write sample log {path:?}"))?;
                info!("Sample log written to {path:?}");
            }
            if let Some(path) = &run_config.counts_out {
                run::write_frequency_table(path, &output.frequencies)
                    .with_context(|| format!("Failed to write frequency table {path:?}"))?;
                info!("Frequency table written to {path:?}");
            }

            println!("\n=== Sampling Run Complete ===");
            println!("Edges:          {num_edges}");
            println!("Radius:         {confinement_radius}");
            println!("Seed:           {}", run_config.random_seed);
            println!("Iterations:     {}", output.summary.iterations);
            println!("Classified:     {}", output.summary.classified);
            println!("Unclassifiable: {}", output.summary.unclassifiable);
            println!("Throughput:     {:.0}/hr", output.summary.throughput_per_hour);
            println!("Runtime:        {:.1}s", output.summary.runtime_secs);

            let mut counts: Vec<_> = output.frequencies.iter().collect();
            counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            println!("\nKnot frequencies:");
            for (key, count) in counts {
                println!("  {:>10}  {}", count, key.label());
            }
        }

        Commands::Batch {
            confinement_radius,
            num_edges,
            total_samples,
            batch_size,
            batch_max_seconds,
            verbosity,
            max_processes,
            log_dir,
            counts_dir,
        } => {
            let batch_config = BatchConfig {
                confinement_radius,
                num_edges,
                total_samples,
                batch_size,
                batch_max_seconds,
                verbosity,
                max_processes,
                log_dir,
                counts_dir,
            };

            let exe = std::env::current_exe().context("Failed to locate own executable")?;
            batch::run_batch(&batch_config, &exe, &cli.config).await?;

            println!("\n=== Batch Complete ===");
            println!("Total samples: {total_samples}");
            println!("Logs:          {:?}", batch_config.log_dir);
            println!("Counts:        {:?}", batch_config.counts_dir);
        }

        Commands::Identify {
            knot_file,
            random_seed,
        } => {
            let config = Config::load_or_default(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

            let text = std::fs::read_to_string(&knot_file)
                .with_context(|| format!("Failed to read {knot_file:?}"))?;
            let polygon = Polygon::from_rows(&text).context("Failed to parse polygon")?;

            let resolve = resolve_with_tools(&config, random_seed);
            match resolve(&polygon) {
                Resolution::Resolved(identity) => println!("{}", identity.encode()),
                Resolution::Unclassifiable(candidates) => {
                    println!("Unclassifiable");
                    for candidate in &candidates.candidates {
                        println!("  candidate: {candidate}");
                    }
                }
            }
        }
    }

    Ok(())
}
