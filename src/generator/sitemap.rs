//! Sitemap generation.
//!
//! Lists every published document for search engine indexing:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/garden/rust/</loc>
//!     <lastmod>2025-01-01T00:00:00Z</lastmod>
//!     <changefreq>monthly</changefreq>
//!   </url>
//! </urlset>
//! ```
//!
//! `lastmod` is the document's freshness, which includes the pages linking
//! to it: a new backlink changes the rendered page.

use crate::{
    config::SiteConfig,
    garden::ContentGraph,
    log,
    render::write_file,
    utils::{
        date,
        minify::{Markup, minify},
    },
};
use anyhow::Result;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Build sitemap if enabled in config.
pub fn build_sitemap(config: &SiteConfig, graph: &ContentGraph) -> Result<()> {
    if config.build.sitemap.enable {
        Sitemap::from_graph(graph, config).write(config)?;
    }
    Ok(())
}

struct Sitemap {
    urls: Vec<UrlEntry>,
}

struct UrlEntry {
    loc: String,
    lastmod: String,
    changefreq: String,
}

impl Sitemap {
    fn from_graph(graph: &ContentGraph, config: &SiteConfig) -> Self {
        let urls = graph
            .documents
            .iter()
            .zip(&graph.lastmod)
            .map(|(doc, &lastmod)| UrlEntry {
                loc: config.full_url(&doc.url),
                lastmod: date::to_w3c(lastmod),
                changefreq: doc
                    .metadata
                    .changefreq
                    .clone()
                    .unwrap_or_else(|| config.build.sitemap.changefreq.clone()),
            })
            .collect();

        Self { urls }
    }

    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(128 * (self.urls.len() + 1));

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
            xml.push_str(&format!(
                "    <changefreq>{}</changefreq>\n",
                escape_xml(&entry.changefreq)
            ));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    fn write(self, config: &SiteConfig) -> Result<()> {
        let path = config.output_dir().join(&config.build.sitemap.path);
        let xml = self.into_xml();
        write_file(&path, &minify(Markup::Xml, xml.as_bytes(), config))?;

        log!("sitemap"; "{}", path.file_name().unwrap_or_default().to_string_lossy());
        Ok(())
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
