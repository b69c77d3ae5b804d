// Config command - show the effective configuration

use anyhow::Result;

use crate::config::{self, Config};

pub fn handle_config(config: &Config) -> Result<()> {
    match Config::locate() {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# No {} found, using defaults", config::CONFIG_FILE_NAME),
    }
    print!("{}", config.to_toml());
    Ok(())
}
