use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use plumbline::config::{CalculatorConfig, Config};
use plumbline::embedding::reader::{ConceptXReader, EmbeddingReader};
use plumbline::output::scatter::{self, ScatterPlot};
use plumbline::output::terminal;
use plumbline::scoring::BiasCalculator;
use plumbline::space::seeds::SubspaceSeeds;
use plumbline::space::Space;

/// Plumbline: subspace bias metrics for transformer embedding layers.
///
/// Measures how strongly a layer's token embeddings lean toward
/// seed-defined term groups (e.g. gendered word sets) and persists a
/// summary artifact per run.
#[derive(Parser)]
#[command(name = "plumbline", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute bias metrics for an embedding layer and save a summary
    Analyze {
        /// Path to the activation file (ConceptX JSON-lines)
        path: PathBuf,

        /// Seed group as `label=word,word,...` or a bare comma list;
        /// repeat per group (at least two)
        #[arg(long = "group", required = true)]
        groups: Vec<String>,

        /// Word to exclude from the neutral space (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Reduce embeddings to this many dimensions before scoring
        #[arg(long)]
        pca_dimension: Option<usize>,

        /// Display name for the layer (defaults to the file stem)
        #[arg(long)]
        model_name: Option<String>,

        /// Human-oriented output: progress bars and colored summary
        #[arg(long)]
        user_friendly: bool,

        /// Output directory (defaults to PLUMBLINE_OUT_DIR or ./output)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Project a token sample to 2-D and write a scatter artifact
    Visualize {
        /// Path to the activation file (ConceptX JSON-lines)
        path: PathBuf,

        /// How many tokens to sample
        #[arg(long, default_value = "3000")]
        sample: usize,

        /// Seed group to tag in the output (repeatable, optional)
        #[arg(long = "group")]
        groups: Vec<String>,

        /// RNG seed for the sample
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Display name for the layer (defaults to the file stem)
        #[arg(long)]
        model_name: Option<String>,

        /// Show progress while reading
        #[arg(long)]
        user_friendly: bool,

        /// Output directory (defaults to PLUMBLINE_OUT_DIR or ./output)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Load .env if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("plumbline=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            groups,
            exclude,
            pca_dimension,
            model_name,
            user_friendly,
            out,
        } => {
            let out_dir = out.unwrap_or_else(|| Config::load().out_dir);
            let subspace_seeds = parse_groups(&groups)?;

            let calculator_config = CalculatorConfig {
                path,
                subspace_seeds,
                exclude_words: exclude,
                user_friendly,
                pca_dimension,
                model_name,
            };

            info!(version = plumbline::version(), "Starting analysis");
            let mut calculator = BiasCalculator::from_config(&calculator_config)?;

            calculator.bias_sum_average();
            calculator.bias_asb_sum_average();
            calculator.norm_avg_bias();
            calculator.norm_avg_asb_bias();

            terminal::display_summary(&calculator.summary(), user_friendly);

            let summary_path = calculator.save_summary(&out_dir)?;
            if user_friendly {
                println!(
                    "{}",
                    format!("Summary saved to: {}", summary_path.display()).bold()
                );
            } else {
                println!("summary: {}", summary_path.display());
            }
        }

        Commands::Visualize {
            path,
            sample,
            groups,
            seed,
            model_name,
            user_friendly,
            out,
        } => {
            let out_dir = out.unwrap_or_else(|| Config::load().out_dir);
            let subspace_seeds = parse_groups(&groups)?;

            let model_name = model_name.unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "model".to_string())
            });

            let data = ConceptXReader::new().read(&path, user_friendly)?;
            let space = Space::new(&data, None)?;

            let points = scatter::project_sample(&space, sample, seed, &subspace_seeds)?;
            let plot = ScatterPlot {
                model_name,
                sample_size: points.len(),
                seed,
                points,
            };

            let scatter_path = scatter::write_scatter(&plot, &out_dir)?;
            if user_friendly {
                println!(
                    "{}",
                    format!(
                        "Scatter plot ({} points) saved to: {}",
                        plot.sample_size,
                        scatter_path.display()
                    )
                    .bold()
                );
            } else {
                println!("scatter: {}", scatter_path.display());
            }
        }
    }

    Ok(())
}

/// Parse every `--group` argument into a seed group.
fn parse_groups(args: &[String]) -> Result<Vec<SubspaceSeeds>> {
    args.iter()
        .map(|arg| SubspaceSeeds::parse_arg(arg).map_err(Into::into))
        .collect()
}
