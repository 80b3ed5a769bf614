//! Macro Humanizer - recording analysis and humanization engine
//!
//! Mines recurring patterns across macro recordings, models command
//! transitions, and produces humanized variants.

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use macro_humanizer::app::cli::{Cli, Commands};
use macro_humanizer::app::config::Config;
use macro_humanizer::cache::{CacheHandle, MemoryCache};
use macro_humanizer::humanize::HumanizationSettings;
use macro_humanizer::synthesis::{synthesize_sequence, ClassifiedElement};
use macro_humanizer::Engine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    let cache = if config.cache.enabled {
        CacheHandle::new(Arc::new(MemoryCache::new()))
    } else {
        CacheHandle::disabled()
    };
    let engine = Engine::new(cache);

    // Execute command
    match cli.command {
        Commands::Mine {
            inputs,
            min_length,
            min_frequency,
            output,
        } => {
            run_mine(&engine, &inputs, min_length, min_frequency, output).await?;
        }
        Commands::Transitions { inputs, output } => {
            run_transitions(&engine, &inputs, output).await?;
        }
        Commands::Humanize {
            input,
            output,
            seed,
            strip_mouse,
        } => {
            run_humanize(&engine, &input, output, seed, strip_mouse).await?;
        }
        Commands::Synthesize {
            input,
            output,
            seed,
        } => {
            run_synthesize(&input, output, seed)?;
        }
    }

    Ok(())
}

async fn run_mine(
    engine: &Engine,
    inputs: &[PathBuf],
    min_length: usize,
    min_frequency: u64,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut files = Vec::with_capacity(inputs.len());
    for path in inputs {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        files.push((path.display().to_string(), bytes));
    }

    let patterns = engine
        .mine_recordings(&files, min_length, min_frequency)
        .await?;
    info!("mined {} patterns from {} recordings", patterns.len(), files.len());
    emit(&patterns, output.as_deref())
}

async fn run_transitions(
    engine: &Engine,
    inputs: &[PathBuf],
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut sequences = Vec::with_capacity(inputs.len());
    for path in inputs {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match engine.parse_recording(&bytes).await {
            Ok(sequence) => sequences.push(sequence),
            Err(e) => warn!("skipping unreadable recording {}: {e}", path.display()),
        }
    }

    let table = engine.analyze_transitions(&sequences);
    info!(
        "analyzed {} transitions across {} states",
        table.transition_count(),
        table.state_count()
    );
    emit(&table, output.as_deref())
}

async fn run_humanize(
    engine: &Engine,
    input: &Path,
    output: Option<PathBuf>,
    seed: Option<u64>,
    strip_mouse: bool,
) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let sequence = engine.parse_recording(&bytes).await?;

    let settings = HumanizationSettings {
        remove_mouse_on_upload: strip_mouse,
        ..HumanizationSettings::default()
    };
    let humanized = match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            engine.humanize_with_rng(&sequence, &settings, &mut rng)?
        }
        None => engine.humanize_with_settings(&sequence, &settings)?,
    };
    info!("humanized {} commands into {}", sequence.len(), humanized.len());
    emit(&humanized, output.as_deref())
}

fn run_synthesize(
    input: &Path,
    output: Option<PathBuf>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let elements: Vec<ClassifiedElement> = serde_json::from_slice(&bytes)
        .with_context(|| format!("invalid element file {}", input.display()))?;

    let sequence = match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            synthesize_sequence(&elements, &mut rng)
        }
        None => synthesize_sequence(&elements, &mut rand::thread_rng()),
    };
    info!("synthesized {} commands from {} elements", sequence.len(), elements.len());
    emit(&sequence, output.as_deref())
}

/// Write a result as pretty JSON to a file or stdout
fn emit<T: serde::Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
