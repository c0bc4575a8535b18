//! Site configuration management for `grove.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[base]`    | Site metadata (title, author, url, language)   |
//! | `[build]`   | Paths, garden, posts, sitemap, rss             |
//! | `[serve]`   | Development server (port, interface, watch)    |
//!
//! The garden root is never read from the file: it comes from the
//! [`GARDEN_ROOT_ENV`] environment variable and is validated eagerly in
//! [`SiteConfig::apply_garden_root`].
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "Notes"
//! url = "https://notes.example.com"
//!
//! [build]
//! content = "content"
//! output = "public"
//!
//! [build.rss]
//! enable = true
//!
//! [serve]
//! port = 5277
//! ```

mod base;
mod build;
pub mod defaults;
mod error;
mod serve;

pub use error::ConfigError;

use base::BaseConfig;
use build::BuildConfig;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Environment variable naming the garden root directory.
pub const GARDEN_ROOT_ENV: &str = "GARDEN_ROOT";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing grove.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf());
    }

    /// Directory pages are written to, including `path_prefix`.
    pub fn output_dir(&self) -> PathBuf {
        self.build.output.join(self.build.path_prefix.trim_matches('/'))
    }

    /// URL path prefix with a leading slash and no trailing slash (`""` or `/site`).
    pub fn url_prefix(&self) -> String {
        let prefix = self.build.path_prefix.trim_matches('/');
        if prefix.is_empty() {
            String::new()
        } else {
            format!("/{prefix}")
        }
    }

    /// Absolute URL for a site-relative URL path.
    pub fn full_url(&self, url_path: &str) -> String {
        let base = self.base.url.as_deref().unwrap_or_default().trim_end_matches('/');
        format!("{base}{url_path}")
    }

    /// Resolve and validate the garden root from the environment value.
    ///
    /// Relative paths are taken relative to the project root; `~` is expanded.
    pub fn apply_garden_root(&mut self, value: Option<String>) -> Result<(), ConfigError> {
        let value = value
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingEnv(GARDEN_ROOT_ENV))?;

        let expanded = PathBuf::from(shellexpand::tilde(value.trim()).into_owned());
        let path = if expanded.is_relative() {
            self.get_root().join(expanded)
        } else {
            expanded
        };
        let path = Self::normalize_path(&path);

        if !path.is_dir() {
            return Err(ConfigError::Validation(format!(
                "{GARDEN_ROOT_ENV} is not a directory: {}",
                path.display()
            )));
        }

        self.build.garden.root = path;
        Ok(())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        let root = Self::normalize_path(&root);
        self.set_root(&root);
        self.config_path = Self::normalize_path(&root.join(&cli.config));

        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));

        let args = match &cli.command {
            Commands::Build { build_args } | Commands::Serve { build_args, .. } => build_args,
        };
        Self::update_option(&mut self.build.minify, args.minify.as_ref());
        Self::update_option(&mut self.build.rss.enable, args.rss.as_ref());
        Self::update_option(&mut self.build.sitemap.enable, args.sitemap.as_ref());
        if args.clean {
            self.build.clean = true;
        }
        if let Some(base_url) = &args.base_url {
            self.base.url = Some(base_url.clone());
        }

        if let Commands::Serve {
            interface,
            port,
            watch,
            ..
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
            if args.base_url.is_none() {
                self.base.url = Some(format!(
                    "http://{}:{}",
                    self.serve.interface, self.serve.port
                ));
            }
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    pub fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration after CLI and environment have been applied.
    pub fn validate(&self) -> Result<()> {
        if self.build.rss.enable && self.base.url.is_none() {
            bail!("[base.url] is required for RSS generation");
        }

        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.build.garden.prefix.trim_matches('/').is_empty() {
            bail!(ConfigError::Validation(
                "[build.garden.prefix] must not be empty".into()
            ));
        }

        if self.build.garden.root.as_os_str().is_empty() {
            bail!(ConfigError::MissingEnv(GARDEN_ROOT_ENV));
        }

        if self.build.output.starts_with(&self.build.garden.root)
            || self.build.output.starts_with(&self.build.content)
        {
            bail!(ConfigError::Validation(
                "[build.output] must not be inside a source directory".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
