pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# SAMPLE-REBASE CONFIGURATION
# =============================================================================
# Every key is optional; anything left out falls back to the value shown here.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/sample-rebase/config.yml
#   3. /etc/sample-rebase/config.yml
#
# Values may reference environment variables with the $env{...} syntax.

# =============================================================================
# ARCHIVE
# =============================================================================
archive:
  # Archive used when none is given on the command line
  path: sample.tar.gz
  # Directory created next to the archive to receive its members
  extract_dir: sample
  # Members checked after extraction; missing ones are reported as warnings
  expected_members:
    - logs.json
    - traces.json
    - metrics.json

# =============================================================================
# REBASE
# =============================================================================
rebase:
  # Extracted member holding newline-delimited log records
  logs_member: logs.json
  # Output file written next to the logs member
  output_name: updated_logs.json
"#
    .to_string()
}
