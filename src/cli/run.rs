use crate::archive::{extract_with, ExtractError, ExtractedDir};
use crate::config::Config;
use crate::rebase::{rebase_with_clock, Clock, RebaseError, RebaseSummary};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("rebase failed: {0}")]
    Rebase(#[from] RebaseError),
}

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub extracted: ExtractedDir,
    pub rebase: RebaseSummary,
}

/// Extract the archive, then rebase its logs member.
///
/// Missing archive members only produce warnings; if the logs member is one
/// of them the rebase step fails with `NotFound`.
pub fn run_pipeline(
    archive: &Path,
    config: &Config,
    clock: &dyn Clock,
) -> Result<PipelineReport, PipelineError> {
    let extracted = extract_with(archive, &config.archive)?;

    if !extracted.is_complete() {
        warn!(
            missing = extracted.missing.len(),
            "Continuing with an incomplete archive"
        );
    }

    let logs_path = extracted.member_path(&config.rebase.logs_member);
    let output_path = extracted.member_path(&config.rebase.output_name);
    let rebase = rebase_with_clock(&logs_path, Some(&output_path), clock)?;

    Ok(PipelineReport { extracted, rebase })
}

/// Archive from the command line, else the configured one.
pub fn resolve_archive(explicit: Option<PathBuf>, config: &Config) -> PathBuf {
    explicit.unwrap_or_else(|| config.archive.path.clone())
}

/// Run the pipeline and report the outcome. Returns `true` on full success.
pub fn run(archive: Option<PathBuf>, config: &Config, clock: &dyn Clock) -> bool {
    let archive = resolve_archive(archive, config);
    info!(archive = %archive.display(), "Preparing sample");

    match run_pipeline(&archive, config, clock) {
        Ok(report) => {
            info!(
                output = %report.rebase.output_path.display(),
                entries = report.rebase.entries,
                records = report.rebase.records,
                "Sample ready"
            );
            true
        }
        Err(e) => {
            error!(error = %e, "Sample preparation failed");
            false
        }
    }
}
