//! Grove - a static site generator for a wiki-linked digital garden and blog.

mod build;
mod cli;
mod config;
mod garden;
mod generator;
mod logger;
mod render;
mod scheduler;
mod serve;
mod utils;
mod watch;

use anyhow::Result;
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::{GARDEN_ROOT_ENV, SiteConfig};
use serve::serve_site;
use std::path::Path;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static SiteConfig = Box::leak(Box::new(load_config(cli)?));

    match &cli.command {
        Commands::Build { .. } => build_site(config).map(|_| ()),
        Commands::Serve { .. } => {
            initial_build(config)?;
            serve_site(config, move || load_config(cli))
        }
    }
}

/// Build once before serving.
///
/// With the watcher on, a failed build is only logged; the next change
/// triggers another attempt.
fn initial_build(config: &SiteConfig) -> Result<()> {
    match build_site(config) {
        Ok(_) => Ok(()),
        Err(err) if config.serve.watch => {
            log!("error"; "initial build failed: {:#}", err);
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Load `grove.toml` (defaults when absent), apply CLI and environment, validate.
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);
    config.apply_garden_root(std::env::var(GARDEN_ROOT_ENV).ok())?;
    config.validate()?;

    Ok(config)
}
