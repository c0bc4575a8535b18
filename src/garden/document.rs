//! Document loading.
//!
//! A [`Document`] is one markdown file from either the garden root or the
//! content directory, read fresh on every build.

use super::{GardenError, frontmatter};
use crate::{config::SiteConfig, log, utils::date};
use chrono::{DateTime, Utc};
use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Which source root a document was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    Content,
    Garden,
}

/// One source markdown file.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: Source,
    /// Path relative to the source root.
    pub path: PathBuf,
    /// Title used as the permalink index key.
    pub title: String,
    pub metadata: frontmatter::Metadata,
    pub tags: Vec<String>,
    pub is_public: bool,
    /// File text up to the hidden marker, published as the raw source.
    pub raw: String,
    /// Markdown body with front-matter, hidden tail and visibility markers removed.
    pub body: String,
    pub mtime: SystemTime,
    /// Publication date: front-matter `date`, else `mtime`.
    pub date: DateTime<Utc>,
    /// Directory names between the source root and the file.
    pub dirs: Vec<String>,
    /// Canonical URL, assigned by the permalink pass.
    pub url: String,
    /// Output directory relative to the site output, assigned with `url`.
    pub output: PathBuf,
}

impl Document {
    /// Read and parse one file.
    ///
    /// Content documents are always public. Garden documents are public when
    /// they carry a visibility tag or contain the visibility marker.
    pub fn load(
        path: &Path,
        root: &Path,
        source: Source,
        config: &SiteConfig,
    ) -> Result<Self, GardenError> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| GardenError::OutsideRoot {
                path: path.to_path_buf(),
                root: root.to_path_buf(),
            })?
            .to_path_buf();

        let read_error = |source| GardenError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut raw = fs::read_to_string(path).map_err(read_error)?;
        let mtime = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(read_error)?;

        let split = frontmatter::split(&raw);
        if split.malformed {
            log!("warn"; "{}: unreadable front-matter, treating as body", relative.display());
        }

        let garden = &config.build.garden;
        let tags = frontmatter::normalize_tags(&split.metadata.tags);
        let is_public = match source {
            Source::Content => true,
            Source::Garden => {
                tags.iter().any(|tag| garden.visibility_tags.contains(tag))
                    || (!garden.visibility_marker.is_empty()
                        && raw.contains(&garden.visibility_marker))
            }
        };

        let hidden = split
            .body
            .find(&garden.hidden_marker)
            .filter(|_| !garden.hidden_marker.is_empty());
        let visible = hidden.map_or(split.body, |pos| &split.body[..pos]);
        // The body is a suffix of the file text.
        let published_len = raw.len() - split.body.len() + visible.len();
        let body = strip_marker(visible, &garden.visibility_marker);

        let title = split
            .metadata
            .title
            .clone()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| file_stem(&relative));
        let metadata = split.metadata;

        let date = metadata
            .date
            .as_deref()
            .and_then(date::parse)
            .unwrap_or_else(|| date::from_system_time(mtime));

        let dirs = relative
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        raw.truncate(published_len);

        Ok(Self {
            source,
            path: relative,
            title,
            tags,
            is_public,
            body,
            mtime,
            date,
            dirs,
            metadata,
            raw,
            url: String::new(),
            output: PathBuf::new(),
        })
    }

    pub fn is_post(&self, config: &SiteConfig) -> bool {
        self.metadata
            .collection
            .iter()
            .any(|c| *c == config.build.posts.collection)
    }

    /// Document language, falling back to the site language.
    pub fn lang<'a>(&'a self, config: &'a SiteConfig) -> &'a str {
        self.metadata
            .lang
            .as_deref()
            .filter(|lang| !lang.is_empty())
            .unwrap_or(&config.base.language)
    }

    /// Whether the raw source is published next to the page.
    pub fn publishes_raw(&self, config: &SiteConfig) -> bool {
        self.metadata.raw.unwrap_or(config.build.garden.raw_source)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Remove standalone occurrences of `marker` (not followed by a word character).
fn strip_marker(text: &str, marker: &str) -> String {
    if marker.is_empty() {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (pos, _) in text.match_indices(marker) {
        if pos < last {
            continue;
        }
        let end = pos + marker.len();
        let bounded = text[end..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_' || c == '-'));
        if bounded {
            out.push_str(&text[last..pos]);
            last = end;
        }
    }
    out.push_str(&text[last..]);
    out
}
