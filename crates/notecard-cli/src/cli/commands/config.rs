//! `notecard config` subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use notecard_core::config::Config;

pub fn path(config_path: &Path) {
    println!("{}", config_path.display());
}

pub fn init(config_path: &Path) -> Result<()> {
    Config::init(config_path).with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn show(config_path: &Path) -> Result<()> {
    let config = Config::load_from(config_path)?;
    if !config_path.exists() {
        println!("# {} not found, showing defaults", config_path.display());
    }
    println!("# content documents: {}", config.content_dir().display());
    print!("{}", config.to_toml()?);
    Ok(())
}
