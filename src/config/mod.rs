// Configuration management module
// TOML file in the base directory plus a couple of environment overrides

pub mod settings;

#[cfg(test)]
mod tests;

pub use settings::{ChatConfig, Config, ConfigError, OllamaConfig, ServerConfig, VectorStoreConfig};

use anyhow::{Context, Result};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}

/// Print the effective configuration
#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load_default()?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;

    println!("# {}", config.config_file_path().display());
    println!("{}", rendered);
    Ok(())
}

/// Write a default config file unless one already exists
#[inline]
pub fn init_config() -> Result<()> {
    let config = Config::load_default()?;
    let path = config.config_file_path();

    if path.exists() {
        println!("Configuration already present at {}", path.display());
        return Ok(());
    }

    config.save()?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
