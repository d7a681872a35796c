use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_ARCHIVE_PATH: &str = "sample.tar.gz";
pub const DEFAULT_EXTRACT_DIR: &str = "sample";
pub const DEFAULT_LOGS_MEMBER: &str = "logs.json";
pub const DEFAULT_TRACES_MEMBER: &str = "traces.json";
pub const DEFAULT_METRICS_MEMBER: &str = "metrics.json";
pub const DEFAULT_OUTPUT_NAME: &str = "updated_logs.json";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub archive: ArchiveSettings,
    #[serde(default)]
    pub rebase: RebaseSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// Archive used when none is given on the command line.
    #[serde(default = "default_archive_path")]
    pub path: PathBuf,
    /// Directory created next to the archive to hold its members.
    #[serde(default = "default_extract_dir")]
    pub extract_dir: String,
    /// Members whose absence is reported as a warning after extraction.
    #[serde(default = "default_expected_members")]
    pub expected_members: Vec<String>,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            path: default_archive_path(),
            extract_dir: default_extract_dir(),
            expected_members: default_expected_members(),
        }
    }
}

fn default_archive_path() -> PathBuf {
    PathBuf::from(DEFAULT_ARCHIVE_PATH)
}

fn default_extract_dir() -> String {
    DEFAULT_EXTRACT_DIR.to_string()
}

fn default_expected_members() -> Vec<String> {
    vec![
        DEFAULT_LOGS_MEMBER.to_string(),
        DEFAULT_TRACES_MEMBER.to_string(),
        DEFAULT_METRICS_MEMBER.to_string(),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseSettings {
    /// Extracted member holding the newline-delimited log records.
    #[serde(default = "default_logs_member")]
    pub logs_member: String,
    /// File name of the rebased output, written next to the logs member.
    #[serde(default = "default_output_name")]
    pub output_name: String,
}

impl Default for RebaseSettings {
    fn default() -> Self {
        Self {
            logs_member: default_logs_member(),
            output_name: default_output_name(),
        }
    }
}

fn default_logs_member() -> String {
    DEFAULT_LOGS_MEMBER.to_string()
}

fn default_output_name() -> String {
    DEFAULT_OUTPUT_NAME.to_string()
}
