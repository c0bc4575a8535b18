//! Content graph: documents, permalinks, resolved links, backlinks, tree.
//!
//! One build walks through typed stages. Each stage is only constructible
//! from the previous one, so the pass ordering is enforced by the types:
//!
//! ```text
//! scan ─▶ Loaded ─▶ PermalinkIndex::build ─▶ Indexed ─▶ resolve ─▶ Resolved
//!                                                                  │
//!                         ContentGraph ◀── BacklinkIndex, Tree ◀───┘
//! ```
//!
//! Loading and resolving run in parallel per document. Collecting a stage
//! into its `Vec` is the barrier: no document is resolved before every
//! title is indexed, and no backlink exists before every page is resolved.

pub mod backlinks;
pub mod document;
pub mod frontmatter;
pub mod permalink;
pub mod resolve;
pub mod tree;
pub mod typography;

pub use backlinks::BacklinkIndex;
pub use document::{Document, Source};
pub use permalink::{Indexed, PermalinkIndex};
pub use resolve::{ResolvedPage, TocEntry};
pub use tree::{Tree, TreeFile};

use crate::{config::SiteConfig, debug, log, logger::ProgressBars};
use rayon::prelude::*;
use std::{
    io,
    path::{Path, PathBuf},
    time::SystemTime,
};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised while reading the content graph.
#[derive(Debug, Error)]
pub enum GardenError {
    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{}` is not inside `{}`", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Source {
    /// Directory this source is read from.
    pub fn root(self, config: &SiteConfig) -> &Path {
        match self {
            Self::Garden => &config.build.garden.root,
            Self::Content => &config.build.content,
        }
    }
}

// ============================================================================
// Source Scan
// ============================================================================

/// A file found under one of the source roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: Source,
}

impl SourceFile {
    /// Path relative to its source root.
    pub fn relative<'a>(&'a self, config: &'a SiteConfig) -> &'a Path {
        self.path
            .strip_prefix(self.source.root(config))
            .unwrap_or(&self.path)
    }
}

/// Markdown documents and static files from both roots.
#[derive(Debug, Default)]
pub struct Sources {
    pub markdown: Vec<SourceFile>,
    pub assets: Vec<SourceFile>,
}

/// Enumerate both source roots, skipping hidden entries.
///
/// A missing content directory is fine (garden-only site); a missing garden
/// root was already rejected by configuration.
pub fn scan(config: &SiteConfig) -> Result<Sources, GardenError> {
    let mut sources = Sources::default();

    for source in [Source::Content, Source::Garden] {
        let root = source.root(config);
        if !root.is_dir() {
            continue;
        }
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = entry.map_err(|err| GardenError::Read {
                path: err.path().unwrap_or(root).to_path_buf(),
                source: err.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file = SourceFile {
                path: entry.into_path(),
                source,
            };
            if is_markdown(&file.path) {
                sources.markdown.push(file);
            } else {
                sources.assets.push(file);
            }
        }
    }

    Ok(sources)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
}

// ============================================================================
// Stages
// ============================================================================

/// Every markdown document, public or not, freshly read from disk.
#[derive(Debug)]
pub struct Loaded {
    pub documents: Vec<Document>,
}

impl Loaded {
    /// Load all files in parallel; the first read error fails the build.
    pub fn load(
        files: &[SourceFile],
        config: &SiteConfig,
        progress: Option<&ProgressBars>,
    ) -> Result<Self, GardenError> {
        let documents = files
            .par_iter()
            .map(|file| {
                let doc = Document::load(&file.path, file.source.root(config), file.source, config);
                if let Some(progress) = progress {
                    progress.inc_by_name("load");
                }
                doc
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { documents })
    }
}

/// Every public document with its rendered page, `pages[i]` ↔ `documents[i]`.
#[derive(Debug)]
pub struct Resolved {
    pub index: PermalinkIndex,
    pub documents: Vec<Document>,
    pub pages: Vec<ResolvedPage>,
    _sealed: (),
}

impl Indexed {
    /// Resolve every document against the now complete index.
    pub fn resolve(self, config: &SiteConfig) -> Resolved {
        let index = self.index;
        let pages = self
            .documents
            .par_iter()
            .map(|doc| resolve::resolve(doc, &index, config))
            .collect();

        Resolved {
            index,
            documents: self.documents,
            pages,
            _sealed: (),
        }
    }
}

// ============================================================================
// Content Graph
// ============================================================================

/// Result of one full pass over the sources.
#[derive(Debug)]
pub struct ContentGraph {
    pub index: PermalinkIndex,
    pub documents: Vec<Document>,
    pub pages: Vec<ResolvedPage>,
    pub backlinks: BacklinkIndex,
    /// Garden documents only; content pages are not part of the navigation.
    pub tree: Tree,
    /// Freshness per document, `lastmod[i]` ↔ `documents[i]`.
    pub lastmod: Vec<SystemTime>,
}

impl ContentGraph {
    /// Run both passes and derive backlinks, tree and freshness.
    pub fn build(loaded: Loaded, config: &SiteConfig) -> Self {
        let total = loaded.documents.len();
        let indexed = PermalinkIndex::build(loaded, config);
        log!("garden"; "{} of {} documents public, {} titles indexed, {} collisions",
            indexed.documents.len(), total, indexed.index.len(), indexed.index.collisions().len());
        if indexed.index.is_empty() {
            log!("warn"; "nothing published, check visibility tags or the public marker");
        }

        let resolved = indexed.resolve(config);
        let backlinks = BacklinkIndex::build(&resolved);
        debug!("garden"; "{} documents have backlinks", backlinks.len());
        let tree = Tree::build(
            resolved
                .documents
                .iter()
                .filter(|doc| doc.source == Source::Garden),
        );
        let lastmod = (0..resolved.documents.len())
            .map(|i| backlinks.lastmod(&resolved, i))
            .collect();

        let Resolved {
            index,
            documents,
            pages,
            ..
        } = resolved;

        Self {
            index,
            documents,
            pages,
            backlinks,
            tree,
            lastmod,
        }
    }

    /// Wiki-links that pointed at no indexed title, across all pages.
    pub fn unresolved_count(&self) -> usize {
        self.pages.iter().map(|page| page.unresolved.len()).sum()
    }

    /// Indices of posts, newest first.
    pub fn posts(&self, config: &SiteConfig) -> Vec<usize> {
        let mut posts: Vec<usize> = (0..self.documents.len())
            .filter(|&i| self.documents[i].is_post(config))
            .collect();
        posts.sort_by(|&a, &b| self.documents[b].date.cmp(&self.documents[a].date));
        posts
    }

    /// Index of the document with this URL.
    pub fn find(&self, url: &str) -> Option<usize> {
        self.documents.iter().position(|doc| doc.url == url)
    }
}

// ============================================================================
// Test Fixtures
// ============================================================================

/// In-memory document, titled after its file stem.
#[cfg(test)]
pub(crate) fn test_document(source: Source, path: &str, body: &str, public: bool) -> Document {
    let path = PathBuf::from(path);
    let dirs = path
        .parent()
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    Document {
        source,
        path,
        title,
        metadata: frontmatter::Metadata::default(),
        tags: Vec::new(),
        is_public: public,
        raw: body.to_owned(),
        body: body.to_owned(),
        mtime: SystemTime::UNIX_EPOCH,
        date: crate::utils::date::from_system_time(SystemTime::UNIX_EPOCH),
        dirs,
        url: String::new(),
        output: PathBuf::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{FileTime, set_file_mtime};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, text: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    fn garden_config(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.garden.root = root.to_path_buf();
        config.build.content = root.join("no-content-dir");
        config
    }

    fn graph(root: &Path) -> ContentGraph {
        let config = garden_config(root);
        let sources = scan(&config).unwrap();
        let loaded = Loaded::load(&sources.markdown, &config, None).unwrap();
        ContentGraph::build(loaded, &config)
    }

    #[test]
    fn test_scan_splits_markdown_and_assets() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "");
        write(dir.path(), "img/cat.png", "");
        write(dir.path(), ".obsidian/workspace.json", "");
        write(dir.path(), "notes/b.markdown", "");

        let sources = scan(&garden_config(dir.path())).unwrap();
        let names: Vec<_> = sources
            .markdown
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(names, vec![PathBuf::from("a.md"), PathBuf::from("notes/b.markdown")]);
        assert_eq!(sources.assets.len(), 1);
        assert!(sources.assets[0].path.ends_with("img/cat.png"));
    }

    #[test]
    fn test_scenario_public_private_and_backlinks() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "A.md", "---\ntags: [public]\n---\nSee [[B]].");
        write(dir.path(), "B.md", "---\ntags: [public]\n---\nNo links here.");
        write(dir.path(), "C.md", "Links to [[B]] but stays private.");

        let graph = graph(dir.path());

        assert_eq!(graph.index.len(), 2);
        assert!(graph.index.get("A").is_some());
        assert!(graph.index.get("B").is_some());
        assert!(graph.index.get("C").is_none());

        let a = graph.find("/garden/a/").unwrap();
        assert_eq!(graph.backlinks.get("/garden/b/"), &[a]);
        assert!(graph.pages[a].html.contains(r#"href="/garden/b/""#));

        let titles: Vec<_> = graph.tree.files.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert!(graph.documents.iter().all(|doc| doc.title != "C"));
    }

    #[test]
    fn test_backlink_only_for_rendered_links() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "A.md", "#public\n# About [[B]]\n\nbody");
        write(dir.path(), "B.md", "#public");

        let graph = graph(dir.path());
        let a = graph.find("/garden/a/").unwrap();

        assert!(graph.backlinks.get("/garden/b/").is_empty());
        assert!(!graph.pages[a].html.contains(r#"href="/garden/b/""#));
    }

    #[test]
    fn test_lastmod_follows_backlinks() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "A.md", "#public [[B]]");
        let b = write(dir.path(), "B.md", "#public");
        set_file_mtime(&a, FileTime::from_unix_time(2_000_000, 0)).unwrap();
        set_file_mtime(&b, FileTime::from_unix_time(1_000_000, 0)).unwrap();

        let graph = graph(dir.path());
        let a = graph.find("/garden/a/").unwrap();
        let b = graph.find("/garden/b/").unwrap();
        let at = |secs| SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(secs);

        assert_eq!(graph.lastmod[b], at(2_000_000));
        assert_eq!(graph.lastmod[a], at(2_000_000));
    }

    #[test]
    fn test_tree_mirrors_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "rust/async/Pin.md", "#public");
        write(dir.path(), "rust/Ownership.md", "#public");
        write(dir.path(), "rust/Private.md", "nothing");

        let graph = graph(dir.path());

        assert_eq!(graph.tree.subfolders.len(), 1);
        let rust = &graph.tree.subfolders[0];
        assert_eq!(rust.name.as_deref(), Some("rust"));
        assert_eq!(rust.files.len(), 1);
        assert_eq!(rust.subfolders[0].files[0].url, "/garden/rust/async/pin/");
    }

    #[test]
    fn test_unresolved_count() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "A.md", "#public [[Nowhere]] [[C]]");
        write(dir.path(), "C.md", "private");

        let graph = graph(dir.path());
        assert_eq!(graph.unresolved_count(), 2);
        assert_eq!(graph.backlinks.len(), 0);
    }

    #[test]
    fn test_posts_newest_first() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "old.md", "---\ncollection: post\ndate: 2023-01-01\n---\n");
        write(&content, "new.md", "---\ncollection: post\ndate: 2024-01-01\n---\n");
        write(&content, "about.md", "About");

        let mut config = garden_config(&dir.path().join("garden"));
        fs::create_dir_all(&config.build.garden.root).unwrap();
        config.build.content = content;

        let sources = scan(&config).unwrap();
        let loaded = Loaded::load(&sources.markdown, &config, None).unwrap();
        let graph = ContentGraph::build(loaded, &config);
        let posts: Vec<_> = graph
            .posts(&config)
            .into_iter()
            .map(|i| graph.documents[i].title.as_str())
            .collect();

        assert_eq!(posts, vec!["new", "old"]);
        assert!(graph.tree.is_empty());
    }
}
