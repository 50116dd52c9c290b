use crate::{
    checkpoint::{timestamp, CheckpointFile, Entry},
    error::ListError,
    lister::ListItem,
};
use std::collections::HashSet;

/// Counters describing one accumulator pass.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub listed: u64,
    pub newly_processed: u64,
    pub skipped: u64,
    /// Set when the listing failed mid-scan. Whatever was buffered up to that
    /// point has still been flushed.
    pub failure: Option<ListError>,
}

/// Drains the listing into the checkpoint in batches of `batch_size`.
///
/// Paths already in `processed` are skipped, so records durably written by an
/// interrupted run are not recorded twice. Records are consumed strictly in
/// listing order.
pub fn run<L>(
    objects: L,
    processed: &HashSet<String>,
    checkpoint: &CheckpointFile,
    batch_size: usize,
) -> ScanOutcome
where
    L: IntoIterator<Item = ListItem>,
{
    let mut outcome = ScanOutcome::default();
    let mut batch: Vec<Entry> = Vec::new();

    for object in objects {
        let record = match object {
            Ok(record) => record,
            Err(err) => {
                outcome.failure = Some(err);
                break;
            }
        };

        outcome.listed += 1;

        if processed.contains(&record.path) {
            outcome.skipped += 1;
            continue;
        }

        batch.push(Entry {
            path: record.path,
            size: record.size,
            timestamp: timestamp(),
        });
        outcome.newly_processed += 1;

        if batch.len() >= batch_size {
            flush(checkpoint, &mut batch, outcome.listed);
        }
    }

    if !batch.is_empty() {
        flush(checkpoint, &mut batch, outcome.listed);
    }

    outcome
}

// A failed flush drops the batch: its paths never reach the checkpoint, so the
// next run re-lists and re-records them.
fn flush(checkpoint: &CheckpointFile, batch: &mut Vec<Entry>, listed: u64) {
    match checkpoint.append_batch(batch) {
        Ok(()) => println!(
            "{} -- wrote batch of {} ({listed} objects listed so far)",
            timestamp(),
            batch.len()
        ),
        Err(err) => eprintln!(
            "{} -- dropping batch of {}: {err}",
            timestamp(),
            batch.len()
        ),
    }

    batch.clear();
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::{lister::ObjectRecord, report};
    use std::{io, path::Path};
    use tempfile::tempdir;

    const LISTING: &[(&str, u64)] = &[
        ("tables/a/part-0", 300),
        ("tables/b/part-0", 100),
        ("tables/b/part-1", 50),
        ("tables/c/part-0", 7),
    ];

    fn listing(records: &[(&str, u64)]) -> Vec<ListItem> {
        records
            .iter()
            .map(|&(path, size)| {
                Ok(ObjectRecord {
                    path: path.into(),
                    size,
                })
            })
            .collect()
    }

    fn report_rows(checkpoint: &CheckpointFile, report_path: &Path) -> Vec<(String, u64)> {
        report::generate(checkpoint, report_path).unwrap();

        let mut reader = csv::Reader::from_path(report_path).unwrap();
        reader
            .deserialize::<Entry>()
            .map(|row| {
                let row = row.unwrap();
                (row.path, row.size)
            })
            .collect()
    }

    #[test]
    fn add_nothing_on_a_second_pass() {
        let dir = tempdir().unwrap();
        let checkpoint = CheckpointFile::new(dir.path().join("checkpoint.csv"));

        let first = run(listing(LISTING), &HashSet::new(), &checkpoint, 2);
        assert_eq!(first.listed, 4);
        assert_eq!(first.newly_processed, 4);
        let rows_after_first = report_rows(&checkpoint, &dir.path().join("first.csv"));

        let processed = checkpoint.processed_set().unwrap();
        let second = run(listing(LISTING), &processed, &checkpoint, 2);
        assert_eq!(second.listed, 4);
        assert_eq!(second.newly_processed, 0);
        assert_eq!(second.skipped, 4);

        let rows_after_second = report_rows(&checkpoint, &dir.path().join("second.csv"));
        assert_eq!(rows_after_first, rows_after_second);
    }

    #[test]
    fn match_a_single_run_after_an_interruption() {
        let dir = tempdir().unwrap();

        // Simulated crash: only the first half of the listing made it to disk.
        let resumed = CheckpointFile::new(dir.path().join("resumed.csv"));
        run(listing(&LISTING[..2]), &HashSet::new(), &resumed, 100);
        let processed = resumed.processed_set().unwrap();
        run(listing(LISTING), &processed, &resumed, 100);

        let uninterrupted = CheckpointFile::new(dir.path().join("single.csv"));
        run(listing(LISTING), &HashSet::new(), &uninterrupted, 100);

        assert_eq!(
            report_rows(&resumed, &dir.path().join("resumed_report.csv")),
            report_rows(&uninterrupted, &dir.path().join("single_report.csv")),
        );
    }

    #[test]
    fn produce_the_same_report_for_any_batch_size() {
        let dir = tempdir().unwrap();
        let mut reports = Vec::new();

        for batch_size in [1, 7, 10_000] {
            let checkpoint =
                CheckpointFile::new(dir.path().join(format!("checkpoint_{batch_size}.csv")));
            let outcome = run(listing(LISTING), &HashSet::new(), &checkpoint, batch_size);
            assert!(outcome.failure.is_none());

            reports.push(report_rows(
                &checkpoint,
                &dir.path().join(format!("report_{batch_size}.csv")),
            ));
        }

        assert_eq!(reports[0], reports[1]);
        assert_eq!(reports[1], reports[2]);
    }

    #[test]
    fn sum_every_listed_size_exactly_once() {
        let dir = tempdir().unwrap();
        let checkpoint = CheckpointFile::new(dir.path().join("checkpoint.csv"));

        run(listing(LISTING), &HashSet::new(), &checkpoint, 3);

        let rows = report_rows(&checkpoint, &dir.path().join("report.csv"));
        let total: u64 = rows.iter().map(|(_, size)| size).sum();
        assert_eq!(total, 457);
    }

    #[test]
    fn flush_the_partial_batch_when_the_listing_fails() {
        let dir = tempdir().unwrap();
        let checkpoint = CheckpointFile::new(dir.path().join("checkpoint.csv"));

        let objects = vec![
            Ok(ObjectRecord {
                path: "tables/a".into(),
                size: 1,
            }),
            Ok(ObjectRecord {
                path: "tables/b".into(),
                size: 2,
            }),
            Err(ListError::Stat {
                path: "tables/c".into(),
                source: io::Error::new(io::ErrorKind::ConnectionReset, "lost"),
            }),
            Ok(ObjectRecord {
                path: "tables/d".into(),
                size: 4,
            }),
        ];

        let outcome = run(objects, &HashSet::new(), &checkpoint, 100);
        assert_eq!(outcome.listed, 2);
        assert_eq!(outcome.newly_processed, 2);
        assert!(outcome.failure.is_some());

        let processed = checkpoint.processed_set().unwrap();
        assert!(processed.contains("tables/a"));
        assert!(processed.contains("tables/b"));
        assert!(!processed.contains("tables/d"));
    }
}
