//! Page rendering and output writing.
//!
//! The layout is behind [`PageRenderer`]; this module builds the views it
//! receives and writes the results under the output directory:
//!
//! ```text
//! public/
//! ├── index.html                 # content index.md, or the generated home page
//! ├── garden/
//! │   ├── index.html             # navigation tree
//! │   └── rust/ownership/
//! │       ├── index.html
//! │       └── index.md           # raw source
//! └── blog/2024-05-01-hello/index.html
//! ```

pub mod layout;

pub use layout::Layout;

use crate::{
    config::SiteConfig,
    garden::{ContentGraph, Document, GardenError, ResolvedPage, Tree},
    logger::ProgressBars,
    utils::minify::{Markup, minify},
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::{fs, path::Path, time::SystemTime};

/// Pages with at least this many headings get a table of contents.
const TOC_MIN_HEADINGS: usize = 3;

/// Number of posts listed on the generated home page.
const RECENT_POSTS: usize = 10;

/// Turns views into complete HTML documents.
pub trait PageRenderer: Sync {
    fn page(&self, view: &PageView<'_>) -> String;
    fn index(&self, view: &IndexView<'_>) -> String;
}

/// A link to another document, as shown in lists.
#[derive(Debug, Clone)]
pub struct LinkView<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub date: DateTime<Utc>,
    pub summary: Option<&'a str>,
}

impl<'a> LinkView<'a> {
    fn new(doc: &'a Document, page: &'a ResolvedPage) -> Self {
        Self {
            url: &doc.url,
            title: &page.title,
            date: doc.date,
            summary: page.summary.as_deref(),
        }
    }
}

/// Everything the layout needs for one document page.
#[derive(Debug)]
pub struct PageView<'a> {
    pub config: &'a SiteConfig,
    pub document: &'a Document,
    pub page: &'a ResolvedPage,
    /// "Referenced by" entries in processing order.
    pub backlinks: Vec<LinkView<'a>>,
    pub lastmod: SystemTime,
    pub show_toc: bool,
    pub is_post: bool,
    pub raw_url: Option<String>,
}

impl<'a> PageView<'a> {
    pub fn new(graph: &'a ContentGraph, i: usize, config: &'a SiteConfig) -> Self {
        let document = &graph.documents[i];
        let page = &graph.pages[i];
        let backlinks = graph
            .backlinks
            .get(&document.url)
            .iter()
            .map(|&source| LinkView::new(&graph.documents[source], &graph.pages[source]))
            .collect();
        let show_toc = document
            .metadata
            .toc
            .unwrap_or(page.toc.len() >= TOC_MIN_HEADINGS)
            && !page.toc.is_empty();
        let raw_url = document
            .publishes_raw(config)
            .then(|| format!("{}index.md", document.url));

        Self {
            config,
            document,
            page,
            backlinks,
            lastmod: graph.lastmod[i],
            show_toc,
            is_post: document.is_post(config),
            raw_url,
        }
    }
}

/// Listing page: the garden tree and, on the home page, recent posts.
#[derive(Debug)]
pub struct IndexView<'a> {
    pub config: &'a SiteConfig,
    pub title: String,
    pub url: String,
    pub tree: &'a Tree,
    pub posts: Vec<LinkView<'a>>,
}

// ============================================================================
// Writing
// ============================================================================

/// Render and write every document page. Returns the number of pages written.
pub fn write_pages(
    graph: &ContentGraph,
    config: &SiteConfig,
    renderer: &dyn PageRenderer,
    progress: Option<&ProgressBars>,
) -> Result<usize, GardenError> {
    let output_dir = config.output_dir();

    (0..graph.documents.len())
        .into_par_iter()
        .try_for_each(|i| {
            let view = PageView::new(graph, i, config);
            let dir = output_dir.join(&view.document.output);

            let html = renderer.page(&view);
            write_file(&dir.join("index.html"), &minify(Markup::Html, html.as_bytes(), config))?;
            if view.raw_url.is_some() {
                write_file(&dir.join("index.md"), view.document.raw.as_bytes())?;
            }

            if let Some(progress) = progress {
                progress.inc_by_name("render");
            }
            Ok(())
        })?;

    Ok(graph.documents.len())
}

/// Write the garden index and, when no document claims `/`, the home page.
pub fn write_indexes(
    graph: &ContentGraph,
    config: &SiteConfig,
    renderer: &dyn PageRenderer,
) -> Result<usize, GardenError> {
    let output_dir = config.output_dir();
    let prefix = config.url_prefix();
    let section = config.build.garden.prefix.trim_matches('/');
    let mut written = 0;

    let garden = IndexView {
        config,
        title: config.build.garden.title.clone(),
        url: format!("{prefix}/{section}/"),
        tree: &graph.tree,
        posts: Vec::new(),
    };
    if graph.find(&garden.url).is_none() {
        let html = renderer.index(&garden);
        write_file(
            &output_dir.join(section).join("index.html"),
            &minify(Markup::Html, html.as_bytes(), config),
        )?;
        written += 1;
    }

    let home_url = format!("{prefix}/");
    if graph.find(&home_url).is_none() {
        let posts = graph
            .posts(config)
            .into_iter()
            .take(RECENT_POSTS)
            .map(|i| LinkView::new(&graph.documents[i], &graph.pages[i]))
            .collect();
        let home = IndexView {
            config,
            title: config.base.title.clone(),
            url: home_url,
            tree: &graph.tree,
            posts,
        };
        let html = renderer.index(&home);
        write_file(
            &output_dir.join("index.html"),
            &minify(Markup::Html, html.as_bytes(), config),
        )?;
        written += 1;
    }

    Ok(written)
}

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, contents: &[u8]) -> Result<(), GardenError> {
    let write_error = |source| GardenError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, contents).map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::garden::{Loaded, Source, test_document};
    use tempfile::TempDir;

    fn graph(docs: Vec<Document>, config: &SiteConfig) -> ContentGraph {
        ContentGraph::build(Loaded { documents: docs }, config)
    }

    fn config(output: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.output = output.to_path_buf();
        config.build.minify = false;
        config
    }

    #[test]
    fn test_page_view_backlinks_and_toc() {
        let config = SiteConfig::default();
        let graph = graph(
            vec![
                test_document(Source::Garden, "A.md", "# Alpha\n\n[[B]]", true),
                test_document(Source::Garden, "B.md", "## one\n## two\n## three", true),
            ],
            &config,
        );
        let b = graph.find("/garden/b/").unwrap();
        let view = PageView::new(&graph, b, &config);

        assert_eq!(view.backlinks.len(), 1);
        assert_eq!(view.backlinks[0].title, "Alpha");
        assert_eq!(view.backlinks[0].url, "/garden/a/");
        assert!(view.show_toc);
        assert_eq!(view.raw_url.as_deref(), Some("/garden/b/index.md"));
    }

    #[test]
    fn test_toc_forced_off_and_on() {
        let config = SiteConfig::default();
        let mut off = test_document(Source::Garden, "Off.md", "## a\n## b\n## c", true);
        off.metadata.toc = Some(false);
        let mut on = test_document(Source::Garden, "On.md", "## only", true);
        on.metadata.toc = Some(true);
        let graph = graph(vec![off, on], &config);

        let off = PageView::new(&graph, graph.find("/garden/off/").unwrap(), &config);
        let on = PageView::new(&graph, graph.find("/garden/on/").unwrap(), &config);
        assert!(!off.show_toc);
        assert!(on.show_toc);
    }

    #[test]
    fn test_write_pages_and_raw_source() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir.path().join("public"));
        let graph = graph(
            vec![test_document(Source::Garden, "rust/Ownership.md", "Body text", true)],
            &config,
        );

        let count = write_pages(&graph, &config, &Layout, None).unwrap();
        let page = dir.path().join("public/garden/rust/ownership");

        assert_eq!(count, 1);
        let html = fs::read_to_string(page.join("index.html")).unwrap();
        assert!(html.contains("Body text"));
        assert_eq!(fs::read_to_string(page.join("index.md")).unwrap(), "Body text");
    }

    #[test]
    fn test_raw_source_disabled() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir.path().join("public"));
        config.build.garden.raw_source = false;
        let graph = graph(vec![test_document(Source::Garden, "A.md", "x", true)], &config);

        write_pages(&graph, &config, &Layout, None).unwrap();
        assert!(!dir.path().join("public/garden/a/index.md").exists());
    }

    #[test]
    fn test_write_indexes_home_and_garden() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir.path().join("public"));
        let graph = graph(vec![test_document(Source::Garden, "A.md", "x", true)], &config);

        let written = write_indexes(&graph, &config, &Layout).unwrap();
        assert_eq!(written, 2);

        let garden = fs::read_to_string(dir.path().join("public/garden/index.html")).unwrap();
        assert!(garden.contains(r#"href="/garden/a/""#));
        assert!(dir.path().join("public/index.html").exists());
    }

    #[test]
    fn test_content_index_replaces_home() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir.path().join("public"));
        let graph = graph(vec![test_document(Source::Content, "index.md", "Welcome", true)], &config);

        let written = write_indexes(&graph, &config, &Layout).unwrap();
        assert_eq!(written, 1);
    }
}
