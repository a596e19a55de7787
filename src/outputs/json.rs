//! JSON run reports.
//!
//! Each run leaves a machine-readable record of what it looked at and what
//! it published:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 091500.json
//!     └── 213000.json
//! ```

use crate::models::RunReport;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`RunReport`] to `{json_output_dir}/{date}/{HHMMSS}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_run_report(
    report: &RunReport,
    json_output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    let full_json_dir = json_output_dir.join(&report.local_date);
    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let stamp: String = report.local_time.chars().filter(|c| c.is_ascii_digit()).take(6).collect();
    let path = full_json_dir.join(format!("{stamp}.json"));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote run report");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_run_report_layout() {
        let dir = tempdir().unwrap();
        let report = RunReport {
            local_date: "2025-05-06".to_string(),
            local_time: "09:15:00.123".to_string(),
            forced: false,
            candidates: 12,
            statements: 3,
            fact_checks: Vec::new(),
        };

        let path = write_run_report(&report, dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("2025-05-06").join("091500.json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["candidates"], 12);
        assert_eq!(written["forced"], false);
    }
}
