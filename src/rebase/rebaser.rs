use crate::rebase::bundle::LogBundle;
use crate::rebase::timestamp::{
    human_readable, Clock, OffsetError, Offsets, SystemClock, TimestampField, UnixNanos,
};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_OUTPUT_NAME: &str = crate::config::types::DEFAULT_OUTPUT_NAME;

#[derive(Debug, Error)]
pub enum RebaseError {
    #[error("log file not found: {0}")]
    NotFound(PathBuf),

    #[error("malformed JSON on line {line}: {source}")]
    MalformedJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {field} on line {line}: {value}")]
    InvalidTimestamp {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("no valid {} found in logs", .missing.join(" or "))]
    NoTimestampsFound { missing: Vec<&'static str> },

    #[error("{field} shifted outside the representable range")]
    OffsetOverflow { field: &'static str },

    #[error("output path '{0}' refers to the input file")]
    OutputIsInput(PathBuf),

    #[error("failed to read log records: {0}")]
    Read(#[source] io::Error),

    #[error("io error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RebaseError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a rebase run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseSummary {
    pub output_path: PathBuf,
    pub entries: usize,
    pub records: usize,
    pub min_time: UnixNanos,
    pub min_observed_time: UnixNanos,
    pub now: UnixNanos,
    pub offsets: Offsets,
}

/// `updated_logs.json` in the input's directory.
pub fn default_output_path(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) => dir.join(DEFAULT_OUTPUT_NAME),
        None => PathBuf::from(DEFAULT_OUTPUT_NAME),
    }
}

/// Rebase `input` against the system clock.
pub fn rebase(input: &Path, output: Option<&Path>) -> Result<RebaseSummary, RebaseError> {
    rebase_with_clock(input, output, &SystemClock)
}

/// Shift every `timeUnixNano` and `observedTimeUnixNano` so the earliest of
/// each becomes `clock`'s "now", and write the result to `output`.
///
/// The clock is read once, after the discovery pass. Nothing is written
/// unless every entry was rewritten.
pub fn rebase_with_clock(
    input: &Path,
    output: Option<&Path>,
    clock: &dyn Clock,
) -> Result<RebaseSummary, RebaseError> {
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));

    info!(input = %input.display(), "Processing log file");

    let bundle = read_bundle(input)?;
    ensure_distinct(input, &output_path)?;

    let minima = bundle.scan_minima()?;
    let now = clock.now_unix_nanos();
    let offsets = Offsets::from_minima(now, &minima).map_err(|e| match e {
        OffsetError::MissingFields(fields) => RebaseError::NoTimestampsFound {
            missing: fields.into_iter().map(TimestampField::key).collect(),
        },
        OffsetError::Overflow(field) => RebaseError::OffsetOverflow { field: field.key() },
    })?;

    let min_time = now - offsets.time;
    let min_observed_time = now - offsets.observed_time;
    log_instant("Minimum timeUnixNano", min_time);
    log_instant("Minimum observedTimeUnixNano", min_observed_time);
    log_instant("Current time", now);
    debug!(
        time_offset = %offsets.time,
        observed_time_offset = %offsets.observed_time,
        "Computed offsets"
    );

    let rebased = bundle.rebased(&offsets)?;
    write_bundle(&rebased, &output_path)?;

    info!(
        output = %output_path.display(),
        entries = rebased.len(),
        "Updated log times"
    );

    Ok(RebaseSummary {
        output_path,
        entries: rebased.len(),
        records: rebased.record_count(),
        min_time,
        min_observed_time,
        now,
        offsets,
    })
}

fn read_bundle(input: &Path) -> Result<LogBundle, RebaseError> {
    let file = File::open(input).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RebaseError::NotFound(input.to_path_buf()),
        _ => RebaseError::io(input, e),
    })?;
    LogBundle::from_reader(BufReader::new(file)).map_err(|e| match e {
        RebaseError::Read(source) => RebaseError::io(input, source),
        other => other,
    })
}

fn ensure_distinct(input: &Path, output: &Path) -> Result<(), RebaseError> {
    // Only an existing output can alias the input.
    let Ok(output_canonical) = output.canonicalize() else {
        return Ok(());
    };
    let input_canonical = input.canonicalize().map_err(|e| RebaseError::io(input, e))?;

    if input_canonical == output_canonical {
        return Err(RebaseError::OutputIsInput(output.to_path_buf()));
    }
    Ok(())
}

/// Stage the output in a temp file beside the target and rename it into
/// place once fully written.
fn write_bundle(bundle: &LogBundle, output: &Path) -> Result<(), RebaseError> {
    let dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| RebaseError::io(dir, e))?;
    }

    let mut staged = NamedTempFile::new_in(dir).map_err(|e| RebaseError::io(dir, e))?;
    bundle
        .write_to(BufWriter::new(staged.as_file_mut()))
        .map_err(|e| RebaseError::io(output, e))?;
    staged
        .persist(output)
        .map_err(|e| RebaseError::io(output, e.error))?;
    Ok(())
}

fn log_instant(label: &str, nanos: UnixNanos) {
    match human_readable(nanos) {
        Some(readable) => info!("{}: {} ({})", label, nanos, readable),
        None => info!("{}: {}", label, nanos),
    }
}
