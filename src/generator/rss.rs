//! RSS feed of blog posts, newest first.

use crate::{
    config::SiteConfig,
    garden::{ContentGraph, Document, ResolvedPage},
    log,
    render::write_file,
    utils::{
        date,
        minify::{Markup, minify},
    },
};
use anyhow::{Result, anyhow};
use regex::Regex;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::sync::LazyLock;

/// Build rss feed if enabled in config.
pub fn build_rss(config: &SiteConfig, graph: &ContentGraph) -> Result<()> {
    if config.build.rss.enable {
        RssFeed::build(config, graph).write(config)?;
    }
    Ok(())
}

struct RssFeed<'a> {
    config: &'a SiteConfig,
    posts: Vec<(&'a Document, &'a ResolvedPage)>,
}

impl<'a> RssFeed<'a> {
    fn build(config: &'a SiteConfig, graph: &'a ContentGraph) -> Self {
        let posts = graph
            .posts(config)
            .into_iter()
            .map(|i| (&graph.documents[i], &graph.pages[i]))
            .collect();

        Self { config, posts }
    }

    fn into_xml(self) -> Result<String> {
        let items: Vec<_> = self
            .posts
            .iter()
            .map(|(doc, page)| post_to_rss_item(doc, page, self.config))
            .collect();

        let channel = ChannelBuilder::default()
            .title(&self.config.base.title)
            .link(self.config.full_url(&format!("{}/", self.config.url_prefix())))
            .description(&self.config.base.description)
            .language(self.config.base.language.clone())
            .generator(concat!("grove ", env!("CARGO_PKG_VERSION")).to_string())
            .items(items)
            .build();

        channel
            .validate()
            .map_err(|e| anyhow!("rss validation failed: {e}"))?;
        Ok(channel.to_string())
    }

    fn write(self, config: &SiteConfig) -> Result<()> {
        let xml = self.into_xml()?;
        let path = config.output_dir().join(&config.build.rss.path);
        write_file(&path, &minify(Markup::Xml, xml.as_bytes(), config))?;

        log!("rss"; "{}", path.file_name().unwrap_or_default().to_string_lossy());
        Ok(())
    }
}

fn post_to_rss_item(doc: &Document, page: &ResolvedPage, config: &SiteConfig) -> rss::Item {
    let link = config.full_url(&doc.url);
    let author = doc
        .metadata
        .extra
        .get("author")
        .and_then(serde_yaml::Value::as_str);

    ItemBuilder::default()
        .title(Some(page.title.clone()))
        .link(Some(link.clone()))
        .guid(GuidBuilder::default().permalink(true).value(link).build())
        .description(page.summary.clone())
        .pub_date(date::to_rfc2822(doc.date))
        .author(normalize_rss_author(author, config))
        .categories(
            doc.tags
                .iter()
                .map(|tag| rss::CategoryBuilder::default().name(tag.clone()).build())
                .collect::<Vec<_>>(),
        )
        .build()
}

/// Normalize author field to rss format: "email@example.com (Name)"
///
/// Priority:
/// 1. Post author if already in valid format
/// 2. Site config author if in valid format
/// 3. Combine site config email and author
fn normalize_rss_author(author: Option<&str>, config: &SiteConfig) -> Option<String> {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}[ \t]*\([^)]+\)$").unwrap()
    });

    let author = author?;
    if RE_VALID_AUTHOR.is_match(author) {
        return Some(author.to_owned());
    }

    let site_author = &config.base.author;
    if RE_VALID_AUTHOR.is_match(site_author) {
        return Some(site_author.clone());
    }

    Some(format!("{} ({})", config.base.email, site_author))
}
