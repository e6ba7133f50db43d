use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use feature_builder::{build_tagged_movies, loader};
use service::{Recommendation, RecommendationService};
use similarity::{EngineConfig, SimilarityEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// CineBlend - content-based movie recommendations
#[derive(Parser)]
#[command(name = "cineblend")]
#[command(about = "Recommend movies similar to one title or a blend of two", long_about = None)]
struct Cli {
    /// Path to the engine artifacts file
    #[arg(short, long, default_value = "data/cineblend.json")]
    artifacts: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the engine from the TMDB exports and write the artifacts
    Build {
        /// Path to tmdb_5000_movies.csv
        #[arg(long, default_value = "data/tmdb_5000_movies.csv")]
        movies: PathBuf,

        /// Path to tmdb_5000_credits.csv
        #[arg(long, default_value = "data/tmdb_5000_credits.csv")]
        credits: PathBuf,

        /// Vocabulary cap
        #[arg(long, default_value = "5000")]
        max_features: usize,
    },

    /// Movies similar to one title
    Recommend {
        /// Exact movie title
        #[arg(long)]
        title: String,
    },

    /// Movies similar to a blend of two titles
    Blend {
        /// First exact movie title
        #[arg(long)]
        first: String,

        /// Second exact movie title
        #[arg(long)]
        second: String,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            movies,
            credits,
            max_features,
        } => handle_build(&cli.artifacts, &movies, &credits, max_features)?,
        Commands::Recommend { title } => handle_recommend(load_service(&cli.artifacts)?, &title)?,
        Commands::Blend { first, second } => {
            handle_blend(load_service(&cli.artifacts)?, &first, &second)?
        }
        Commands::Search { title } => handle_search(load_service(&cli.artifacts)?, &title),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(load_service(&cli.artifacts)?, requests, concurrent).await?,
    }

    Ok(())
}

fn load_service(artifacts: &Path) -> Result<RecommendationService> {
    println!("Loading artifacts from {}...", artifacts.display());
    let start = Instant::now();
    let service = RecommendationService::shared(artifacts)?;
    println!("{} Loaded engine in {:?}", "✓".green(), start.elapsed());
    Ok(service)
}

/// Handle the 'build' command
fn handle_build(
    artifacts: &Path,
    movies: &Path,
    credits: &Path,
    max_features: usize,
) -> Result<()> {
    let start = Instant::now();

    info!("Loading TMDB exports from {} and {}", movies.display(), credits.display());
    let raws = loader::load_tmdb(movies, credits).context("Failed to load TMDB exports")?;
    println!("{} Loaded {} movies", "✓".green(), raws.len());

    let tagged = build_tagged_movies(&raws).context("Failed to build tag strings")?;
    println!("{} Built {} tag strings", "✓".green(), tagged.len());

    let config = EngineConfig::default().with_max_features(max_features);
    info!("Building engine with max_features={}", config.max_features);
    let engine = SimilarityEngine::build(&tagged, &config).context("Failed to build engine")?;
    println!(
        "{} Built engine: {} movies, {} vocabulary terms",
        "✓".green(),
        engine.movie_count(),
        engine.vocabulary_size()
    );

    engine
        .save(artifacts)
        .with_context(|| format!("Failed to write {}", artifacts.display()))?;
    println!(
        "{} Wrote {} in {:?}",
        "✓".green(),
        artifacts.display(),
        start.elapsed()
    );
    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(service: RecommendationService, title: &str) -> Result<()> {
    let recommendations = service.recommend(title)?;
    print_recommendations(&format!("Because you liked {title}:"), &recommendations);
    Ok(())
}

/// Handle the 'blend' command
fn handle_blend(service: RecommendationService, first: &str, second: &str) -> Result<()> {
    let recommendations = service.blend(first, second)?;
    print_recommendations(&format!("Blending {first} + {second}:"), &recommendations);
    Ok(())
}

/// Handle the 'search' command
fn handle_search(service: RecommendationService, title: &str) {
    let matches = service.engine().search(title, 20);

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  (no matches)");
    }
    for movie in matches {
        println!("{}: {}", movie.id, movie.title);
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    service: RecommendationService,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 || concurrent == 0 {
        bail!("requests and concurrent must both be positive");
    }
    let titles: Vec<String> = service.engine().titles().map(str::to_string).collect();
    if titles.is_empty() {
        bail!("engine has no movies to query");
    }

    // Pick random titles
    let picks: Vec<String> = (0..requests)
        .map(|_| titles[rand::random_range(0..titles.len())].clone())
        .collect();

    let limiter = Arc::new(Semaphore::new(concurrent));
    let wall = Instant::now();
    let mut handles = vec![];
    for title in picks {
        let service = service.clone();
        let permit = limiter.clone().acquire_owned().await?;
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let start = Instant::now();
            let ok = service.engine().recommend(&title).is_ok();
            (start.elapsed(), ok)
        });
        handles.push(handle);
    }

    let mut outcomes: Vec<(Duration, bool)> = vec![];
    for handle in handles {
        outcomes.push(handle.await?);
    }
    let total_time = wall.elapsed();
    let stats = BenchmarkStats::from_outcomes(outcomes);
    let throughput = requests as f32 / total_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", stats.avg);
    println!("P50 latency: {:?}", stats.p50);
    println!("P95 latency: {:?}", stats.p95);
    println!("P99 latency: {:?}", stats.p99);
    println!("Throughput: {:.2} requests/second", throughput);
    if stats.failures > 0 {
        println!(
            "{} {} of {} requests failed (ambiguous titles)",
            "!".yellow(),
            stats.failures,
            requests
        );
    }

    Ok(())
}

/// Latency summary over every request, successful or not
#[derive(Debug, PartialEq)]
struct BenchmarkStats {
    avg: Duration,
    p50: Duration,
    p95: Duration,
    p99: Duration,
    failures: usize,
}

impl BenchmarkStats {
    /// `outcomes` must not be empty
    fn from_outcomes(outcomes: Vec<(Duration, bool)>) -> Self {
        let failures = outcomes.iter().filter(|(_, ok)| !ok).count();
        let mut timings: Vec<Duration> = outcomes.into_iter().map(|(t, _)| t).collect();
        timings.sort();

        let busy: Duration = timings.iter().sum();
        let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
        Self {
            avg: busy / (timings.len() as u32),
            p50: timings[timings.len() / 2],
            p95: percentile(0.95),
            p99: percentile(0.99),
            failures,
        }
    }
}

/// Print ranked results with the score as a whole percentage
fn print_recommendations(header: &str, recommendations: &[Recommendation]) {
    println!("{}", header.bold().blue());
    if recommendations.is_empty() {
        println!("  (nothing similar found)");
    }
    for (rank, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} - {}% match",
            (rank + 1).to_string().green(),
            rec.title,
            (rec.score * 100.0).round()
        );
    }
}
