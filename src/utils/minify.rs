//! Output minification.
//!
//! HTML goes through `minify_html`; XML (sitemap, feed) only loses the
//! indentation and blank lines between elements.

use crate::config::SiteConfig;
use std::borrow::Cow;

/// Kind of document being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Html,
    Xml,
}

/// Minify `content` when `[build] minify` is on, otherwise borrow it unchanged.
pub fn minify<'a>(markup: Markup, content: &'a [u8], config: &SiteConfig) -> Cow<'a, [u8]> {
    if !config.build.minify {
        return Cow::Borrowed(content);
    }
    match markup {
        Markup::Html => Cow::Owned(minify_html::minify(content, &html_cfg())),
        Markup::Xml => Cow::Owned(minify_xml(content)),
    }
}

fn html_cfg() -> minify_html::Cfg {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg
}

fn minify_xml(xml: &[u8]) -> Vec<u8> {
    String::from_utf8_lossy(xml)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<String>()
        .into_bytes()
}
