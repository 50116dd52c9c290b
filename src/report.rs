use crate::{
    checkpoint::{timestamp, CheckpointFile, Entry},
    error::ReportError,
};
use std::{collections::HashMap, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub unique_paths: usize,
    pub total_bytes: u64,
}

/// Collapses the checkpoint into one row per path, sorted by total size
/// descending, and rewrites the report file from scratch.
///
/// Duplicate checkpoint rows for a path (left behind by overlapping runs) sum
/// together, and the reduction is order-independent. Ties keep the order in
/// which paths first appeared in the checkpoint.
pub fn generate(
    checkpoint: &CheckpointFile,
    report_path: &Path,
) -> Result<ReportSummary, ReportError> {
    if !checkpoint.exists() {
        return Err(ReportError::NoData(checkpoint.path().to_owned()));
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut totals: Vec<(String, u64)> = Vec::new();

    for entry in checkpoint.entries()? {
        let entry = entry?;

        match index.get(&entry.path) {
            Some(&slot) => totals[slot].1 += entry.size,
            None => {
                index.insert(entry.path.clone(), totals.len());
                totals.push((entry.path, entry.size));
            }
        }
    }

    // Stable sort, so equal totals stay in first-seen order.
    totals.sort_by(|a, b| b.1.cmp(&a.1));

    let generated_at = timestamp();
    let mut writer = csv::Writer::from_path(report_path).map_err(|source| ReportError::Write {
        path: report_path.to_owned(),
        source,
    })?;

    let mut summary = ReportSummary {
        unique_paths: totals.len(),
        total_bytes: 0,
    };

    for (path, size) in totals {
        summary.total_bytes += size;
        writer
            .serialize(Entry {
                path,
                size,
                timestamp: generated_at.clone(),
            })
            .map_err(|source| ReportError::Write {
                path: report_path.to_owned(),
                source,
            })?;
    }

    writer.flush().map_err(|source| ReportError::Write {
        path: report_path.to_owned(),
        source: source.into(),
    })?;

    Ok(summary)
}
