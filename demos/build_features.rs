use std::{env, fs, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use time::macros::format_description;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use wattcast::prelude::*;

fn main() -> Result<()> {
    let _guard = init_tracing()?;

    let mut args = env::args().skip(1);
    let input = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/energydata_complete.csv"));
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/output"));
    fs::create_dir_all(&out_dir).context("Failed to create output directory")?;

    let cfg = PipelineConfig::default();
    let pipeline = FeaturePipeline::new(cfg.clone())?;

    let start = Instant::now();
    let set = pipeline
        .run_csv(&input)
        .with_context(|| format!("Failed to build features from {}", input.display()))?;
    let elapsed = start.elapsed();

    set.write_csv(out_dir.join("features.csv"))?;
    set.contract().save_json(out_dir.join("feature_names.json"))?;

    let report = VifReport::compute(set.features(), &cfg.vif())?;
    let (train, test) = time_based_split(&set, DEFAULT_TRAIN_FRACTION)?;

    println!("\n--- Feature Set ---");
    println!("Rows:          {}", set.height());
    println!("Train / test:  {} / {}", train.height(), test.height());
    println!("Fingerprint:   {}", set.contract().fingerprint());
    println!("Build time:    {elapsed:?}");

    println!("\n--- Removed (in order) ---");
    for step in set.steps().iter().filter(|s| s.removed.is_some()) {
        println!("{:>3}. {:<14} VIF {:.2}", step.iteration, step.max_feature, step.max_vif);
    }

    println!("\n--- Final VIF ---");
    for score in report.scores() {
        println!("{:<14} {:.2}", score.feature, score.vif);
    }

    drop(_guard);
    Ok(())
}

// ================================================================================================
// Tracing Configuration
// ================================================================================================

fn init_tracing() -> Result<Option<WorkerGuard>> {
    let app_name = "wattcast";

    let in_container =
        env::var("CONTAINER").is_ok() || std::path::Path::new("/.dockerenv").exists();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if in_container {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
            .init();

        info!("Logging to stdout (container mode)");
        return Ok(None);
    }

    let log_dir = dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
        .context("Failed to find a state or home directory")?
        .join(app_name)
        .join("logs");
    fs::create_dir_all(&log_dir)?;

    let timestamp = time::OffsetDateTime::now_utc()
        .format(&format_description!(
            "[year][month][day]-[hour][minute][second]"
        ))
        .context("Failed to format timestamp")?;
    let file_name = format!("{app_name}-{timestamp}.log");

    let file_appender = tracing_appender::rolling::never(&log_dir, &file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_current_span(true)
        .with_thread_ids(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(log_file = %log_dir.join(&file_name).display(), "Logging to file (local mode)");
    Ok(Some(guard))
}
