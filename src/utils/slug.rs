//! URL slugification.
//!
//! Titles and directory names are transliterated to ASCII with `deunicode`,
//! lowercased, and every run of non-alphanumeric characters collapses to a
//! single `-`.

use deunicode::deunicode;
use rustc_hash::FxHashMap;

// ============================================================================
// Slugification
// ============================================================================

/// Convert text to a URL-safe slug.
///
/// | Input            | Output         |
/// |------------------|----------------|
/// | `Hello, World!`  | `hello-world`  |
/// | `Über Gärten`    | `uber-garten`  |
/// | `Сад`            | `sad`          |
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Slugify, falling back to `fallback` when nothing alphanumeric survives.
pub fn slugify_or(text: &str, fallback: &str) -> String {
    let slug = slugify(text);
    if slug.is_empty() {
        fallback.to_owned()
    } else {
        slug
    }
}

// ============================================================================
// Anchor Ids
// ============================================================================

/// Hands out unique anchor ids within one page.
///
/// The first occurrence of an id is used as-is, later ones get `-1`, `-2`, ...
/// Explicit and derived ids share one namespace.
#[derive(Debug, Default)]
pub struct AnchorIds {
    seen: FxHashMap<String, usize>,
}

impl AnchorIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit `{#id}` attribute, suffixed if already taken.
    pub fn claim(&mut self, id: &str) -> String {
        self.unique(id.to_owned())
    }

    /// Unique id derived from heading text.
    pub fn next(&mut self, text: &str) -> String {
        self.unique(slugify_or(text, "section"))
    }

    fn unique(&mut self, base: String) -> String {
        if !self.seen.contains_key(&base) {
            self.seen.insert(base.clone(), 1);
            return base;
        }
        loop {
            let count = self.seen.entry(base.clone()).or_insert(1);
            let candidate = format!("{base}-{count}");
            *count += 1;
            if !self.seen.contains_key(&candidate) {
                self.seen.insert(candidate.clone(), 1);
                return candidate;
            }
        }
    }
}
