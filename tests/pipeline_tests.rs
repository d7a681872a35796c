use flate2::write::GzEncoder;
use flate2::Compression;
use sample_rebase::archive::ExtractError;
use sample_rebase::cli::run::{run, run_pipeline, PipelineError};
use sample_rebase::config::{parse::parse_config, Config};
use sample_rebase::rebase::{FixedClock, RebaseError};
use serde_json::Value;
use std::fs::{self, File};
use std::path::Path;
use tempfile::TempDir;

const LOGS: &str = concat!(
    r#"{"resourceLogs":[{"scopeLogs":[{"logRecords":[{"timeUnixNano":"1000000000","observedTimeUnixNano":"1000000500","body":{"stringValue":"cart viewed"}}]}]}]}"#,
    "\n",
    r#"{"resourceLogs":[{"scopeLogs":[{"logRecords":[{"timeUnixNano":"2000000000","observedTimeUnixNano":"2000000500","body":{"stringValue":"checkout"}}]}]}]}"#,
    "\n"
);

fn build_archive(path: &Path, members: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, content) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

fn times(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| {
            let v: Value = serde_json::from_str(line).unwrap();
            v["resourceLogs"][0]["scopeLogs"][0]["logRecords"][0]["timeUnixNano"]
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect()
}

#[test]
fn test_full_pipeline() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("sample.tar.gz");
    build_archive(
        &archive,
        &[("logs.json", LOGS), ("traces.json", "{}\n"), ("metrics.json", "{}\n")],
    );

    let report = run_pipeline(&archive, &Config::default(), &FixedClock(5_000_000_000)).unwrap();

    let output = dir.path().join("sample/updated_logs.json");
    assert_eq!(report.rebase.output_path, output);
    assert!(report.extracted.is_complete());
    assert_eq!(times(&output), vec!["5000000000", "6000000000"]);

    // The extracted input is left as it was.
    assert_eq!(fs::read_to_string(dir.path().join("sample/logs.json")).unwrap(), LOGS);
}

#[test]
fn test_missing_traces_still_rebases() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("sample.tar.gz");
    build_archive(&archive, &[("logs.json", LOGS), ("metrics.json", "{}\n")]);

    let report = run_pipeline(&archive, &Config::default(), &FixedClock(5_000_000_000)).unwrap();

    assert_eq!(report.extracted.missing, vec!["traces.json".to_string()]);
    assert_eq!(report.rebase.entries, 2);
    assert!(run(Some(archive), &Config::default(), &FixedClock(5_000_000_000)));
}

#[test]
fn test_missing_logs_fails_at_rebase() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("sample.tar.gz");
    build_archive(&archive, &[("traces.json", "{}\n"), ("metrics.json", "{}\n")]);

    let err = run_pipeline(&archive, &Config::default(), &FixedClock(1)).unwrap_err();
    assert!(matches!(err, PipelineError::Rebase(RebaseError::NotFound(_))));
    assert!(!run(Some(archive), &Config::default(), &FixedClock(1)));
}

#[test]
fn test_corrupt_archive_fails() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("sample.tar.gz");
    fs::write(&archive, "garbage").unwrap();

    let err = run_pipeline(&archive, &Config::default(), &FixedClock(1)).unwrap_err();
    assert!(matches!(err, PipelineError::Extract(ExtractError::CorruptArchive { .. })));
}

#[test]
fn test_rerun_overwrites_previous_output() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("sample.tar.gz");
    build_archive(
        &archive,
        &[("logs.json", LOGS), ("traces.json", "{}\n"), ("metrics.json", "{}\n")],
    );

    run_pipeline(&archive, &Config::default(), &FixedClock(5_000_000_000)).unwrap();
    run_pipeline(&archive, &Config::default(), &FixedClock(9_000_000_000)).unwrap();

    let output = dir.path().join("sample/updated_logs.json");
    assert_eq!(times(&output), vec!["9000000000", "10000000000"]);
}

#[test]
fn test_configured_names() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("capture.tar.gz");
    build_archive(&archive, &[("otel-logs.ndjson", LOGS)]);

    let config = parse_config(
        r#"
archive:
  extract_dir: fixtures
  expected_members: [otel-logs.ndjson]
rebase:
  logs_member: otel-logs.ndjson
  output_name: replay.ndjson
"#,
    )
    .unwrap();

    let report = run_pipeline(&archive, &config, &FixedClock(5_000_000_000)).unwrap();

    assert!(report.extracted.is_complete());
    assert_eq!(report.rebase.output_path, dir.path().join("fixtures/replay.ndjson"));
    assert_eq!(
        times(&dir.path().join("fixtures/replay.ndjson")),
        vec!["5000000000", "6000000000"]
    );
}
