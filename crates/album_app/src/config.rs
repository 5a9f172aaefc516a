//! Pipeline settings for one invocation: RON file first, then command-line overrides.

use std::fs;
use std::path::Path;

use album_engine::PipelineConfig;
use anyhow::{Context, Result};

use crate::cli::Cli;

pub fn load(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => read_file(path)?,
        None => PipelineConfig::default(),
    };
    apply_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<PipelineConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    ron::from_str(&text).with_context(|| format!("cannot parse config file {}", path.display()))
}

fn apply_overrides(config: &mut PipelineConfig, cli: &Cli) {
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency_limit = concurrency;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.max_attempts = max_attempts;
    }
}
