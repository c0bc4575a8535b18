//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── scan()                  markdown + assets from both roots
//!     ├── Loaded::load()          parallel read + front-matter
//!     ├── ContentGraph::build()   permalinks → resolve → backlinks, tree
//!     │
//!     ├── write pages ──┐
//!     │                 ├── rayon::join
//!     ├── copy assets ──┘
//!     │
//!     └── sitemap, rss
//! ```

use crate::{
    config::SiteConfig,
    garden::{self, ContentGraph, Loaded, Source, SourceFile},
    generator::{build_rss, build_sitemap},
    log,
    logger::ProgressBars,
    render::{self, Layout},
};
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

/// Counts reported after a successful build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Markdown files read from both roots.
    pub documents: usize,
    /// Documents that made it into the permalink index.
    pub published: usize,
    pub assets: usize,
    pub unresolved: usize,
}

/// Build the entire site from scratch.
///
/// If `config.build.clean` is true, clears the output directory first.
pub fn build_site(config: &SiteConfig) -> Result<BuildStats> {
    prepare_output(&config.build.output, config.build.clean)?;

    let sources = garden::scan(config).context("Failed to scan sources")?;

    let progress = ProgressBars::new(&[("load", sources.markdown.len())]);
    let loaded = Loaded::load(&sources.markdown, config, Some(&progress));
    progress.finish();
    let loaded = loaded.context("Failed to load documents")?;
    let documents = loaded.documents.len();

    let graph = ContentGraph::build(loaded, config);

    let progress = ProgressBars::new(&[
        ("render", graph.documents.len()),
        ("assets", sources.assets.len()),
    ]);
    let has_error = AtomicBool::new(false);

    let (pages_result, assets_result) = rayon::join(
        || {
            write_output(&graph, config, &progress).map_err(|e| {
                if !has_error.swap(true, Ordering::Relaxed) {
                    log!("error"; "render failed: {:#}", e);
                }
                anyhow!("Build failed")
            })
        },
        || {
            sources.assets.par_iter().try_for_each(|file| {
                if has_error.load(Ordering::Relaxed) {
                    return Err(anyhow!("Aborted"));
                }
                if let Err(e) = copy_asset(file, config) {
                    if !has_error.swap(true, Ordering::Relaxed) {
                        log!("error"; "{}: {:#}", file.path.display(), e);
                    }
                    return Err(anyhow!("Build failed"));
                }
                progress.inc_by_name("assets");
                Ok(())
            })
        },
    );
    progress.finish();
    pages_result?;
    assets_result?;
    log!("render"; "{} pages, {} assets", progress.count("render"), progress.count("assets"));

    let (sitemap_result, rss_result) =
        rayon::join(|| build_sitemap(config, &graph), || build_rss(config, &graph));
    sitemap_result?;
    rss_result?;

    let stats = BuildStats {
        documents,
        published: graph.documents.len(),
        assets: sources.assets.len(),
        unresolved: graph.unresolved_count(),
    };
    log_build_result(&stats);
    Ok(stats)
}

/// Remove the output directory when cleaning, then make sure it exists.
fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

fn write_output(graph: &ContentGraph, config: &SiteConfig, progress: &ProgressBars) -> Result<()> {
    render::write_pages(graph, config, &Layout, Some(progress))?;
    render::write_indexes(graph, config, &Layout)?;
    Ok(())
}

/// Where a static file lands: garden files go under the garden section.
fn asset_destination(file: &SourceFile, config: &SiteConfig) -> PathBuf {
    let output_dir = config.output_dir();
    let relative = file.relative(config);
    match file.source {
        Source::Garden => output_dir
            .join(config.build.garden.prefix.trim_matches('/'))
            .join(relative),
        Source::Content => output_dir.join(relative),
    }
}

fn copy_asset(file: &SourceFile, config: &SiteConfig) -> Result<()> {
    let dest = asset_destination(file, config);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&file.path, &dest)
        .with_context(|| format!("Failed to copy to {}", dest.display()))?;
    Ok(())
}

fn log_build_result(stats: &BuildStats) {
    if stats.unresolved > 0 {
        log!("build"; "{} unresolved links", stats.unresolved);
    }
    log!("build"; "done");
}
