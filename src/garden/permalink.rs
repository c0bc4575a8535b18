//! Permalink pass: assign canonical URLs and build the title index.
//!
//! Runs over every loaded document before any link is resolved. Only public
//! documents get a URL and an index entry.
//!
//! # URL scheme
//!
//! | Document                         | URL                              |
//! |----------------------------------|----------------------------------|
//! | garden `rust/Ownership.md`       | `/garden/rust/ownership/`        |
//! | content `about.md`               | `/about/`                        |
//! | content `index.md`               | `/`                              |
//! | post dated 2024-05-01, `Hello`   | `/blog/2024-05-01-hello/`        |
//! | same post with `lang: ru`        | `/ru/blog/2024-05-01-hello/`     |

use super::{Document, Loaded, Source};
use crate::{
    config::SiteConfig,
    log,
    utils::{date, slug::slugify_or},
};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};

/// Two public documents claimed the same title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub title: String,
    /// Path that lost the title.
    pub replaced: PathBuf,
    /// Path the title now points to.
    pub winner: PathBuf,
}

/// Title → canonical URL, fixed before link resolution starts.
#[derive(Debug, Default)]
pub struct PermalinkIndex {
    urls: FxHashMap<String, String>,
    collisions: Vec<Collision>,
}

/// Output of the permalink pass: the index plus public documents with URLs.
#[derive(Debug)]
pub struct Indexed {
    pub index: PermalinkIndex,
    pub documents: Vec<Document>,
}

impl PermalinkIndex {
    /// Keep public documents, assign their URLs, and index them by title.
    ///
    /// Documents are ordered by `(source, path)` first, so the winner of a
    /// title collision is the last one in that order on every platform.
    /// URL clashes are settled in the same order: the first document keeps
    /// the URL, later ones get a numeric suffix.
    pub fn build(loaded: Loaded, config: &SiteConfig) -> Indexed {
        let mut documents: Vec<Document> = loaded
            .documents
            .into_par_iter()
            .filter(|doc| doc.is_public)
            .map(|mut doc| {
                let (url, output) = permalink(&doc, config);
                doc.url = url;
                doc.output = output;
                doc
            })
            .collect();
        documents.sort_by(|a, b| (a.source, &a.path).cmp(&(b.source, &b.path)));
        separate_urls(&mut documents, config);

        let mut index = Self::default();
        let mut owners: FxHashMap<&str, &PathBuf> = FxHashMap::default();
        for doc in &documents {
            if let Some(previous) = owners.insert(doc.title.as_str(), &doc.path) {
                let collision = Collision {
                    title: doc.title.clone(),
                    replaced: previous.clone(),
                    winner: doc.path.clone(),
                };
                log!("warn"; "duplicate title \"{}\": {} replaces {}",
                    collision.title, collision.winner.display(), collision.replaced.display());
                index.collisions.push(collision);
            }
            index.urls.insert(doc.title.clone(), doc.url.clone());
        }

        Indexed { index, documents }
    }

    /// Canonical URL for a title.
    pub fn get(&self, title: &str) -> Option<&str> {
        self.urls.get(title).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }
}

/// Canonical URL and relative output directory for one document.
pub fn permalink(doc: &Document, config: &SiteConfig) -> (String, PathBuf) {
    let title_slug = slugify_or(&doc.title, "untitled");
    let slug = match doc.metadata.slug.as_deref() {
        Some(custom) => slugify_or(custom, &title_slug),
        None => title_slug,
    };

    let mut segments: Vec<String> = Vec::new();

    if doc.is_post(config) {
        let lang = doc.lang(config);
        if lang != config.base.language {
            segments.push(slugify_or(lang, "lang"));
        }
        push_section(&mut segments, &config.build.posts.prefix);
        segments.push(format!("{}-{slug}", date::to_ymd(doc.date)));
    } else {
        if doc.source == Source::Garden {
            push_section(&mut segments, &config.build.garden.prefix);
        }
        segments.extend(doc.dirs.iter().map(|dir| slugify_or(dir, "dir")));
        let is_index = doc.source == Source::Content
            && doc.metadata.slug.is_none()
            && doc.path.file_stem().is_some_and(|stem| stem == "index");
        if !is_index {
            segments.push(slug);
        }
    }

    let output: PathBuf = segments.iter().collect();
    (url_for(&output, config), output)
}

fn url_for(output: &Path, config: &SiteConfig) -> String {
    let segments: Vec<_> = output.iter().map(|s| s.to_string_lossy()).collect();
    if segments.is_empty() {
        format!("{}/", config.url_prefix())
    } else {
        format!("{}/{}/", config.url_prefix(), segments.join("/"))
    }
}

/// Suffix `-1`, `-2`, ... onto every URL already taken by an earlier document.
fn separate_urls(documents: &mut [Document], config: &SiteConfig) {
    let mut taken: FxHashSet<String> = FxHashSet::default();

    for doc in documents.iter_mut() {
        if taken.insert(doc.url.clone()) {
            continue;
        }
        let stem = doc
            .output
            .file_name()
            .map_or_else(|| "index".to_owned(), |name| name.to_string_lossy().into_owned());
        let parent = doc.output.parent().map(Path::to_path_buf).unwrap_or_default();

        for n in 1.. {
            let output = parent.join(format!("{stem}-{n}"));
            let url = url_for(&output, config);
            if taken.insert(url.clone()) {
                log!("warn"; "duplicate url {}: {} moved to {}", doc.url, doc.path.display(), url);
                doc.url = url;
                doc.output = output;
                break;
            }
        }
    }
}

fn push_section(segments: &mut Vec<String>, prefix: &str) {
    segments.extend(
        prefix
            .split('/')
            .filter(|part| !part.is_empty())
            .map(str::to_owned),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::garden::frontmatter::Metadata;
    use std::time::SystemTime;

    fn doc(source: Source, path: &str, title: &str, public: bool) -> Document {
        let path = PathBuf::from(path);
        let dirs = path
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        Document {
            source,
            path,
            title: title.to_owned(),
            metadata: Metadata::default(),
            tags: Vec::new(),
            is_public: public,
            raw: String::new(),
            body: String::new(),
            mtime: SystemTime::UNIX_EPOCH,
            date: date::from_system_time(SystemTime::UNIX_EPOCH),
            dirs,
            url: String::new(),
            output: PathBuf::new(),
        }
    }

    #[test]
    fn test_only_public_documents_indexed() {
        let loaded = Loaded {
            documents: vec![
                doc(Source::Garden, "A.md", "A", true),
                doc(Source::Garden, "B.md", "B", true),
                doc(Source::Garden, "C.md", "C", false),
            ],
        };
        let indexed = PermalinkIndex::build(loaded, &SiteConfig::default());

        assert_eq!(indexed.index.len(), 2);
        assert_eq!(indexed.index.get("A"), Some("/garden/a/"));
        assert_eq!(indexed.index.get("B"), Some("/garden/b/"));
        assert!(indexed.index.get("C").is_none());
        assert_eq!(indexed.documents.len(), 2);
    }

    #[test]
    fn test_collision_last_in_path_order_wins() {
        let mut first = doc(Source::Garden, "a/Note.md", "Note", true);
        first.metadata.slug = Some("note-a".into());
        let mut second = doc(Source::Garden, "b/Note.md", "Note", true);
        second.metadata.slug = Some("note-b".into());

        // enumeration order is reversed on purpose
        let loaded = Loaded {
            documents: vec![second, first],
        };
        let indexed = PermalinkIndex::build(loaded, &SiteConfig::default());

        assert_eq!(indexed.index.get("Note"), Some("/garden/b/note-b/"));
        assert_eq!(
            indexed.index.collisions(),
            &[Collision {
                title: "Note".into(),
                replaced: PathBuf::from("a/Note.md"),
                winner: PathBuf::from("b/Note.md"),
            }]
        );
    }

    #[test]
    fn test_garden_url_with_dirs() {
        let doc = doc(Source::Garden, "Rust Lang/Ownership Rules.md", "Ownership Rules", true);
        let (url, output) = permalink(&doc, &SiteConfig::default());

        assert_eq!(url, "/garden/rust-lang/ownership-rules/");
        assert_eq!(output, PathBuf::from("garden/rust-lang/ownership-rules"));
    }

    #[test]
    fn test_content_index_is_root() {
        let doc = doc(Source::Content, "index.md", "index", true);
        let (url, output) = permalink(&doc, &SiteConfig::default());

        assert_eq!(url, "/");
        assert_eq!(output, PathBuf::new());
    }

    #[test]
    fn test_nested_content_index() {
        let doc = doc(Source::Content, "projects/index.md", "index", true);
        let (url, _) = permalink(&doc, &SiteConfig::default());
        assert_eq!(url, "/projects/");
    }

    #[test]
    fn test_slug_override() {
        let mut doc = doc(Source::Garden, "x.md", "Some Title", true);
        doc.metadata.slug = Some("custom".into());
        let (url, _) = permalink(&doc, &SiteConfig::default());
        assert_eq!(url, "/garden/custom/");
    }

    #[test]
    fn test_slug_override_stays_one_segment() {
        let config = SiteConfig::default();
        let mut doc = doc(Source::Garden, "x.md", "Some Title", true);

        doc.metadata.slug = Some("../../escaped".into());
        let (url, output) = permalink(&doc, &config);
        assert_eq!(url, "/garden/escaped/");
        assert_eq!(output, PathBuf::from("garden/escaped"));

        doc.metadata.slug = Some("/etc/passwd".into());
        assert_eq!(permalink(&doc, &config).0, "/garden/etc-passwd/");

        doc.metadata.slug = Some("..".into());
        assert_eq!(permalink(&doc, &config).0, "/garden/some-title/");
    }

    #[test]
    fn test_same_url_gets_suffix() {
        let loaded = Loaded {
            documents: vec![
                doc(Source::Garden, "foo-bar.md", "foo-bar", true),
                doc(Source::Garden, "Foo Bar.md", "Foo Bar", true),
            ],
        };
        let indexed = PermalinkIndex::build(loaded, &SiteConfig::default());
        let urls: Vec<_> = indexed.documents.iter().map(|d| d.url.as_str()).collect();

        assert_eq!(urls, vec!["/garden/foo-bar/", "/garden/foo-bar-1/"]);
        assert_eq!(indexed.documents[1].output, PathBuf::from("garden/foo-bar-1"));
        assert_eq!(indexed.index.get("Foo Bar"), Some("/garden/foo-bar/"));
        assert_eq!(indexed.index.get("foo-bar"), Some("/garden/foo-bar-1/"));
    }

    #[test]
    fn test_suffix_skips_taken_urls() {
        let loaded = Loaded {
            documents: vec![
                doc(Source::Garden, "a.md", "note", true),
                doc(Source::Garden, "b.md", "Note", true),
                doc(Source::Garden, "c.md", "note 1", true),
            ],
        };
        let indexed = PermalinkIndex::build(loaded, &SiteConfig::default());
        let urls: Vec<_> = indexed.documents.iter().map(|d| d.url.as_str()).collect();

        assert_eq!(urls, vec!["/garden/note/", "/garden/note-1/", "/garden/note-1-1/"]);
    }

    #[test]
    fn test_post_url_is_date_prefixed() {
        let mut doc = doc(Source::Content, "posts/hello.md", "Hello World", true);
        doc.metadata.collection = vec!["post".into()];
        doc.date = date::parse("2024-05-01").unwrap();
        let (url, output) = permalink(&doc, &SiteConfig::default());

        assert_eq!(url, "/blog/2024-05-01-hello-world/");
        assert_eq!(output, PathBuf::from("blog/2024-05-01-hello-world"));
    }

    #[test]
    fn test_post_in_other_language() {
        let mut doc = doc(Source::Content, "posts/privet.md", "Привет", true);
        doc.metadata.collection = vec!["post".into()];
        doc.metadata.lang = Some("ru".into());
        doc.date = date::parse("2024-05-01").unwrap();
        let (url, _) = permalink(&doc, &SiteConfig::default());

        assert_eq!(url, "/ru/blog/2024-05-01-privet/");
    }

    #[test]
    fn test_path_prefix_applies() {
        let mut config = SiteConfig::default();
        config.build.path_prefix = "notes".into();
        let doc = doc(Source::Garden, "A.md", "A", true);
        let (url, output) = permalink(&doc, &config);

        assert_eq!(url, "/notes/garden/a/");
        assert_eq!(output, PathBuf::from("garden/a"));
    }
}
