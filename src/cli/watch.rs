//! Watch and single-file commands.
//!
//! - `ocrflow watch` - Watch the input directory continuously
//! - `ocrflow watch --once` - Scan once and exit
//! - `ocrflow process <image>` - Run the pipeline on one image

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::ResolvedConfig;
use crate::ingest::IngestionLoop;

use super::{build_pipeline, ensure_output_dir};

/// Run the ingestion loop (or a single scan with `once`)
pub async fn execute_watch(config: &ResolvedConfig, once: bool) -> Result<()> {
    ensure_output_dir(config)?;

    let watcher_config = config.watcher_config();
    watcher_config.validate()?;

    let pipeline = build_pipeline(config)?;
    let mut ingestion = IngestionLoop::new(watcher_config, pipeline);

    if once {
        println!("📂 Scanning once: {}", config.input_dir.display());

        let result = ingestion.scan_once().await?;

        if result.dispatched > 0 {
            println!("✅ Processed {} new image(s)", result.dispatched);
        } else {
            println!("ℹ️  No images to process");
        }

        return Ok(());
    }

    println!("👁️  Watching: {}", config.input_dir.display());
    println!("    Writing to: {}", config.output_dir.display());
    println!("    Seen files are remembered only until exit; a restart reprocesses every image.");
    println!("    Press Ctrl+C to stop");
    println!();

    let summary = ingestion
        .run_until(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    println!();
    println!(
        "🛑 Stopped after {} scan(s), {} image(s) processed",
        summary.cycles, summary.dispatched
    );

    Ok(())
}

/// Run the pipeline on one image and report the artifact path
pub async fn execute_process(config: &ResolvedConfig, image: &Path) -> Result<()> {
    if !image.is_file() {
        anyhow::bail!("Image not found: {}", image.display());
    }

    ensure_output_dir(config)?;
    let pipeline = build_pipeline(config)?;

    let path = pipeline
        .execute(image)
        .await
        .with_context(|| format!("Failed to process {}", image.display()))?;

    println!("✅ Saved: {}", path.display());
    Ok(())
}
