pub mod generate;
pub mod parse;
pub mod types;

use regex::Regex;
use std::path::{Path, PathBuf};

pub use parse::{load_config, ConfigError};
pub use types::{ArchiveSettings, Config, RebaseSettings};

/// Replaces each `$env{VAR}` with the variable's value. Unset variables are
/// left as written.
pub fn expand_env_vars(text: &str) -> String {
    env_var_pattern()
        .replace_all(text, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

pub(crate) fn env_var_pattern() -> Regex {
    Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is a valid regex")
}

/// `~` or `~/rest` under the home directory; any other path is returned as is.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// The explicit path if given, else the first existing default location.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(expand_tilde(path)),
        None => user_config_path()
            .into_iter()
            .chain([PathBuf::from(SYSTEM_CONFIG_PATH)])
            .find(|path| path.exists()),
    }
}

pub const SYSTEM_CONFIG_PATH: &str = "/etc/sample-rebase/config.yml";

pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/sample-rebase/config.yml"))
}

/// Loads the config at `path`, or the built-in defaults when no file was resolved.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(Config::default()),
    }
}
