use crate::config::generate::generate_starter_config;
use crate::config::user_config_path;
use std::fs;
use std::path::{Path, PathBuf};

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let content = generate_starter_config();

    if stdout {
        print!("{}", content);
        return Ok(());
    }

    let path = user_config_path()
        .unwrap_or_else(|| PathBuf::from(crate::config::SYSTEM_CONFIG_PATH));
    write_new_config(&path, &content)?;

    println!("Config file written to {}", path.display());
    Ok(())
}

/// Write `content` to `path`, refusing to replace an existing file.
pub fn write_new_config(path: &Path, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err(format!(
            "config file already exists at {}; remove it first or use --stdout",
            path.display()
        )
        .into());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, content)?;
    Ok(())
}

pub fn validate(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.ok_or("No config file found. Use --config to specify a path.")?;

    println!("Validating config file: {}", path.display());
    crate::config::load_config(&path)?;
    println!("✓ Config is valid");
    Ok(())
}
