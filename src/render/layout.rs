//! Built-in HTML layout.

use super::{IndexView, LinkView, PageRenderer, PageView};
use crate::{config::SiteConfig, garden::Tree, utils::date};
use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Default page layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Layout;

impl PageRenderer for Layout {
    fn page(&self, view: &PageView<'_>) -> String {
        let config = view.config;
        let doc = view.document;
        let page = view.page;
        let title = format!("{} · {}", page.title, config.base.title);

        let body = html! {
            article {
                header {
                    h1 id=[page.title_id.as_deref()] { (page.title) }
                    p.meta {
                        @if view.is_post {
                            time datetime=(doc.date.to_rfc3339()) { (date::to_ymd(doc.date)) }
                        } @else {
                            "Updated "
                            time datetime=(date::to_w3c(view.lastmod)) {
                                (date::to_ymd(date::from_system_time(view.lastmod)))
                            }
                        }
                        @if let Some(raw) = &view.raw_url {
                            " · "
                            a href=(raw) { "source" }
                        }
                    }
                    @if !doc.tags.is_empty() {
                        ul.tags {
                            @for tag in &doc.tags {
                                li { "#" (tag) }
                            }
                        }
                    }
                }

                @if view.show_toc {
                    nav.toc {
                        h2 { "Contents" }
                        ul {
                            @for entry in &page.toc {
                                li class={ "toc-h" (entry.depth) } {
                                    a href={ "#" (entry.id) } { (entry.text) }
                                }
                            }
                        }
                    }
                }

                div.content { (PreEscaped(&page.html)) }

                @if !view.backlinks.is_empty() {
                    section.backlinks {
                        h2 { "Referenced by" }
                        ul { @for link in &view.backlinks { (link_item(link)) } }
                    }
                }
            }
        };

        shell(
            config,
            doc.lang(config),
            &title,
            page.summary.as_deref(),
            &doc.url,
            page.has_code,
            body,
        )
    }

    fn index(&self, view: &IndexView<'_>) -> String {
        let config = view.config;
        let body = html! {
            h1 { (view.title) }
            @if !config.base.description.is_empty() && view.posts.is_empty() {
                p.description { (config.base.description) }
            }
            @if !view.posts.is_empty() {
                section.posts {
                    h2 { "Recent posts" }
                    ul { @for post in &view.posts { (link_item(post)) } }
                }
            }
            @if !view.tree.is_empty() {
                nav.tree { (tree(view.tree)) }
            }
        };

        shell(
            config,
            &config.base.language,
            &view.title,
            Some(config.base.description.as_str()).filter(|d| !d.is_empty()),
            &view.url,
            false,
            body,
        )
    }
}

/// Document skeleton shared by every page.
fn shell(
    config: &SiteConfig,
    lang: &str,
    title: &str,
    description: Option<&str>,
    url: &str,
    has_code: bool,
    body: Markup,
) -> String {
    let prefix = config.url_prefix();
    let feed = config
        .build
        .rss
        .enable
        .then(|| format!("{prefix}/{}", config.build.rss.path.display()));

    html! {
        (DOCTYPE)
        html lang=(lang) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                @if let Some(description) = description {
                    meta name="description" content=(description);
                }
                @if config.base.url.is_some() {
                    link rel="canonical" href=(config.full_url(url));
                }
                @if let Some(feed) = &feed {
                    link rel="alternate" type="application/rss+xml" title=(config.base.title) href=(feed);
                }
                @if has_code {
                    @for style in &config.build.highlight.styles {
                        link rel="stylesheet" href=(style);
                    }
                }
            }
            body {
                header.site {
                    a href={ (prefix) "/" } { (config.base.title) }
                    " "
                    a href={ (prefix) "/" (config.build.garden.prefix.trim_matches('/')) "/" } {
                        (config.build.garden.title)
                    }
                }
                main { (body) }
                @if !config.base.author.is_empty() {
                    footer { "© " (config.base.author) }
                }
                @if has_code {
                    @for script in &config.build.highlight.scripts {
                        script src=(script) {}
                    }
                }
            }
        }
    }
    .into_string()
}

fn link_item(link: &LinkView<'_>) -> Markup {
    html! {
        li {
            a href=(link.url) { (link.title) }
            " "
            time datetime=(link.date.to_rfc3339()) { (date::to_ymd(link.date)) }
        }
    }
}

/// Nested folder list; folders before files at every level.
fn tree(node: &Tree) -> Markup {
    html! {
        ul {
            @for folder in &node.subfolders {
                li.folder {
                    details open {
                        summary { (folder.name.as_deref().unwrap_or_default()) }
                        (tree(folder))
                    }
                }
            }
            @for file in &node.files {
                li { a href=(file.url) { (file.title) } }
            }
        }
    }
}
