//! Backlink index and freshness.
//!
//! Inverts the outbound links of every resolved page. Needs the whole
//! [`Resolved`] set, so it can only be built after the resolve pass.

use super::Resolved;
use rustc_hash::FxHashMap;
use std::time::SystemTime;

/// Target URL → indices of the documents linking to it, in processing order.
#[derive(Debug, Default)]
pub struct BacklinkIndex {
    sources: FxHashMap<String, Vec<usize>>,
}

impl BacklinkIndex {
    /// Self-links are skipped; a source appears at most once per target.
    pub fn build(resolved: &Resolved) -> Self {
        let mut sources: FxHashMap<String, Vec<usize>> = FxHashMap::default();

        for (i, (doc, page)) in resolved.documents.iter().zip(&resolved.pages).enumerate() {
            for url in page.links.iter().filter(|url| **url != doc.url) {
                let entry = sources.entry(url.clone()).or_default();
                if entry.last() != Some(&i) {
                    entry.push(i);
                }
            }
        }

        Self { sources }
    }

    /// Documents linking to `url`.
    pub fn get(&self, url: &str) -> &[usize] {
        self.sources.get(url).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct link targets.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Newest mtime among the document and everything linking to it.
    ///
    /// A page renders its backlinks, so it changes whenever one of them does.
    pub fn lastmod(&self, resolved: &Resolved, i: usize) -> SystemTime {
        let doc = &resolved.documents[i];
        self.get(&doc.url)
            .iter()
            .map(|&source| resolved.documents[source].mtime)
            .fold(doc.mtime, SystemTime::max)
    }
}
