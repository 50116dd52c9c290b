use scree::{
    checkpoint::CheckpointFile,
    config::{Config, Source},
    lister::{ContainerLister, TreeLister},
    report,
    scan::{self, ScanOutcome},
};
use std::{env, error::Error};

fn main() -> Result<(), Box<dyn Error>> {
    let config_path = env::args().nth(1).unwrap_or_else(|| "scree.json".into());
    println!("Loading configuration from {config_path}...");
    let config = Config::load(&config_path)?;

    let checkpoint = CheckpointFile::new(&config.checkpoint);
    let processed = checkpoint.processed_set()?;
    if !processed.is_empty() {
        println!(
            "Resuming: {} paths already recorded in {}",
            processed.len(),
            config.checkpoint.display()
        );
    }

    println!("Starting scan for prefix '{}'", config.prefix);
    let outcome = match &config.source {
        Source::Container { account, container } => {
            let lister = ContainerLister::connect(account, container, &config.prefix)?;
            scan::run(lister, &processed, &checkpoint, config.batch_size)
        }
        Source::Tree { root } => {
            let lister = TreeLister::new(root.clone(), config.prefix.clone());
            scan::run(lister, &processed, &checkpoint, config.batch_size)
        }
    };

    narrate_outcome(&outcome);

    if checkpoint.exists() {
        println!(
            "Aggregating {} into {}...",
            config.checkpoint.display(),
            config.report.display()
        );
        match report::generate(&checkpoint, &config.report) {
            Ok(summary) => println!(
                "Report written to {} ({} unique paths, {} bytes total)",
                config.report.display(),
                summary.unique_paths,
                summary.total_bytes
            ),
            Err(err) => eprintln!("No report generated: {err}"),
        }
    } else {
        println!("No objects were recorded and no checkpoint exists; skipping report.");
    }

    println!("Done.");
    Ok(())
}

fn narrate_outcome(outcome: &ScanOutcome) {
    println!(
        "Scan finished: {} listed, {} newly recorded, {} skipped as already processed",
        outcome.listed, outcome.newly_processed, outcome.skipped
    );

    if let Some(err) = &outcome.failure {
        if err.is_auth() {
            eprintln!("Listing aborted by an authorization failure: {err}");
            eprintln!("Check that the environment credentials grant read access to the container.");
        } else {
            eprintln!("Listing aborted early: {err}");
        }
    }
}
