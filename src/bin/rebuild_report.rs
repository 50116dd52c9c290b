use scree::{checkpoint::CheckpointFile, config::Config, report};
use std::{env, error::Error};

// Re-derives the report from whatever the checkpoint already holds, without
// touching the storage backend.
fn main() -> Result<(), Box<dyn Error>> {
    let config_path = env::args().nth(1).unwrap_or_else(|| "scree.json".into());
    let config = Config::load(&config_path)?;

    let checkpoint = CheckpointFile::new(&config.checkpoint);
    let summary = report::generate(&checkpoint, &config.report)?;

    println!(
        "Report written to {} ({} unique paths, {} bytes total)",
        config.report.display(),
        summary.unique_paths,
        summary.total_bytes
    );

    Ok(())
}
