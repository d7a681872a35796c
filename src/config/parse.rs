use super::types::*;
use crate::config::{env_var_pattern, expand_env_vars, expand_tilde};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string)
}

/// Parse and validate a config document that has already been read into memory.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    // An empty document means "all defaults".
    let mut config: Config = if yaml_string.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&yaml_string)?
    };

    config.archive.path = expand_tilde(&config.archive.path);

    validate_config(&config)?;

    Ok(config)
}

fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let re = env_var_pattern();
    let mut unexpanded: Vec<String> = re
        .captures_iter(yaml_string)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect();

    if unexpanded.is_empty() {
        return Ok(());
    }

    unexpanded.sort();
    unexpanded.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}",
        unexpanded.join(", ")
    )))
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.archive.path.as_os_str().is_empty() {
        errors.push("archive.path cannot be empty".to_string());
    }

    check_file_name("archive.extract_dir", &config.archive.extract_dir, &mut errors);
    check_file_name("rebase.logs_member", &config.rebase.logs_member, &mut errors);
    check_file_name("rebase.output_name", &config.rebase.output_name, &mut errors);

    let mut seen = HashSet::new();
    for (i, member) in config.archive.expected_members.iter().enumerate() {
        if member.is_empty() {
            errors.push(format!("archive.expected_members[{}]: name cannot be empty", i));
        } else if !seen.insert(member) {
            errors.push(format!(
                "archive.expected_members[{}]: duplicate member '{}'",
                i, member
            ));
        }
    }

    if config.rebase.output_name == config.rebase.logs_member {
        errors.push(format!(
            "rebase.output_name '{}' would overwrite the logs member",
            config.rebase.output_name
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

/// A name must be exactly one normal path component so it stays inside the
/// directory it is joined onto.
fn check_file_name(field: &str, value: &str, errors: &mut Vec<String>) {
    if value.is_empty() {
        errors.push(format!("{} cannot be empty", field));
        return;
    }

    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => errors.push(format!(
            "{}: '{}' must be a plain file name without directories",
            field, value
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
archive:
  path: /srv/fixtures/demo.tar.gz
  extract_dir: unpacked
  expected_members: [logs.json, metrics.json]
rebase:
  logs_member: logs.json
  output_name: fresh_logs.json
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.archive.extract_dir, "unpacked");
        assert_eq!(config.archive.expected_members.len(), 2);
        assert_eq!(config.rebase.output_name, "fresh_logs.json");
    }

    #[test]
    fn test_nested_extract_dir_rejected() {
        let yaml = "archive:\n  extract_dir: ../elsewhere\n";
        let err = parse_config(yaml).unwrap_err();
        match err {
            ConfigError::ValidationList(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("archive.extract_dir"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collects_all_errors() {
        let yaml = r#"
archive:
  extract_dir: ""
  expected_members: [logs.json, logs.json, ""]
rebase:
  logs_member: logs.json
  output_name: logs.json
"#;
        let err = parse_config(yaml).unwrap_err();
        match err {
            ConfigError::ValidationList(errors) => {
                assert_eq!(errors.len(), 4, "{errors:?}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unexpanded_env_var_reported() {
        let yaml = "archive:\n  path: $env{SAMPLE_REBASE_NEVER_SET_VAR}/x.tar.gz\n";
        let err = parse_config(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("SAMPLE_REBASE_NEVER_SET_VAR")));
    }

    #[test]
    fn test_bad_yaml() {
        let err = parse_config("archive: [unterminated").unwrap_err();
        assert!(matches!(err, ConfigError::YamlParse(_)));
    }
}
