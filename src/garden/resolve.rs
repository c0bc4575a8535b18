//! Link resolution pass: markdown body → HTML, with wiki-links resolved.
//!
//! Runs per document once the [`PermalinkIndex`] is complete. Each heading
//! goes through the same steps in a fixed order:
//!
//! 1. collect its raw text
//! 2. assign its anchor id (explicit `{#id}`, else a unique slug of the raw text)
//! 3. record it (first level-1 heading becomes the title, others go to the TOC)
//! 4. typography is applied only to what is displayed
//!
//! so anchor ids never depend on typography or on title extraction.

use super::{Document, PermalinkIndex, typography::{self, Typography}};
use crate::{config::SiteConfig, debug, utils::slug::AnchorIds};
use pulldown_cmark::{
    CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream, html,
};
use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::LazyLock;

/// Separator between target and alias: `[[Target||||||Alias]]`.
pub const ALIAS_SEPARATOR: &str = "||||||";

const SUMMARY_LEN: usize = 200;

static WIKI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]\n]+?)\]\]").unwrap());

/// Table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub text: String,
    pub id: String,
    pub depth: u8,
}

/// Rendered body and everything discovered while rendering it.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPage {
    pub html: String,
    pub toc: Vec<TocEntry>,
    /// Outbound URLs in first-seen order, without duplicates.
    pub links: Vec<String>,
    /// Wiki-link targets missing from the index.
    pub unresolved: Vec<String>,
    pub has_code: bool,
    /// Display title: the first level-1 heading, else the document title.
    pub title: String,
    /// Anchor id of the promoted level-1 heading.
    pub title_id: Option<String>,
    pub summary: Option<String>,
}

/// A parsed `[[...]]` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WikiLink<'a> {
    pub target: &'a str,
    pub alias: Option<&'a str>,
}

impl<'a> WikiLink<'a> {
    /// Parse the text between the brackets.
    pub fn parse(inner: &'a str) -> Self {
        match inner.split_once(ALIAS_SEPARATOR) {
            Some((target, alias)) if !alias.trim().is_empty() => Self {
                target: target.trim(),
                alias: Some(alias.trim()),
            },
            Some((target, _)) => Self {
                target: target.trim(),
                alias: None,
            },
            None => Self {
                target: inner.trim(),
                alias: None,
            },
        }
    }

    /// Text shown for the link.
    pub fn display(&self) -> &'a str {
        self.alias.unwrap_or(self.target)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Link(WikiLink<'a>),
}

fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in WIKI_LINK.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push(Segment::Text(&text[last..whole.start()]));
        }
        out.push(Segment::Link(WikiLink::parse(inner.as_str())));
        last = whole.end();
    }
    if last < text.len() {
        out.push(Segment::Text(&text[last..]));
    }
    out
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Render one document against the completed index.
pub fn resolve(document: &Document, index: &PermalinkIndex, config: &SiteConfig) -> ResolvedPage {
    let lang = document.lang(config);
    let mut resolver = Resolver {
        index,
        lang,
        typography: Typography::new(lang),
        ids: AnchorIds::new(),
        page: ResolvedPage::default(),
        seen_links: FxHashSet::default(),
        paragraph: None,
        first_paragraph: None,
        in_code_block: false,
        link_depth: 0,
    };
    let html = resolver.render(&document.body);

    let mut page = resolver.page;
    page.html = html;
    if page.title.is_empty() {
        page.title = typography::apply(&document.title, lang);
    }
    page.summary = document
        .metadata
        .summary
        .as_deref()
        .map(|summary| typography::apply(summary.trim(), lang))
        .or_else(|| resolver.first_paragraph.as_deref().map(truncate_summary))
        .filter(|summary| !summary.is_empty());

    if !page.unresolved.is_empty() {
        debug!("garden"; "{}: unresolved {}", document.path.display(), page.unresolved.join(", "));
    }
    page
}

/// Heading events held back until its id is known.
struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    events: Vec<Event<'a>>,
    text: String,
    /// Outbound URLs, recorded only if the heading is rendered.
    links: Vec<String>,
}

struct Resolver<'i> {
    index: &'i PermalinkIndex,
    lang: &'i str,
    typography: Typography,
    ids: AnchorIds,
    page: ResolvedPage,
    seen_links: FxHashSet<String>,
    paragraph: Option<String>,
    first_paragraph: Option<String>,
    in_code_block: bool,
    link_depth: usize,
}

impl Resolver<'_> {
    fn render(&mut self, body: &str) -> String {
        let parser = TextMergeStream::new(Parser::new_ext(body, options()));
        let mut out: Vec<Event<'_>> = Vec::new();
        let mut heading: Option<PendingHeading<'_>> = None;

        for event in parser {
            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    self.typography.reset();
                    heading = Some(PendingHeading {
                        level,
                        id,
                        classes,
                        attrs,
                        events: Vec::new(),
                        text: String::new(),
                        links: Vec::new(),
                    });
                }
                Event::End(TagEnd::Heading(level)) => match heading.take() {
                    Some(pending) => self.finish_heading(pending, &mut out),
                    None => out.push(Event::End(TagEnd::Heading(level))),
                },
                Event::Start(Tag::CodeBlock(kind)) => {
                    self.page.has_code = true;
                    self.in_code_block = true;
                    sink(&mut out, &mut heading).push(Event::Start(Tag::CodeBlock(kind)));
                }
                Event::End(TagEnd::CodeBlock) => {
                    self.in_code_block = false;
                    sink(&mut out, &mut heading).push(Event::End(TagEnd::CodeBlock));
                }
                Event::Start(tag @ (Tag::Link { .. } | Tag::Image { .. })) => {
                    self.link_depth += 1;
                    sink(&mut out, &mut heading).push(Event::Start(tag));
                }
                Event::End(tag @ (TagEnd::Link | TagEnd::Image)) => {
                    self.link_depth = self.link_depth.saturating_sub(1);
                    sink(&mut out, &mut heading).push(Event::End(tag));
                }
                Event::Start(Tag::Paragraph) => {
                    self.typography.reset();
                    if self.first_paragraph.is_none() && heading.is_none() {
                        self.paragraph = Some(String::new());
                    }
                    out.push(Event::Start(Tag::Paragraph));
                }
                Event::End(TagEnd::Paragraph) => {
                    if let Some(text) = self.paragraph.take() {
                        self.first_paragraph = Some(text);
                    }
                    out.push(Event::End(TagEnd::Paragraph));
                }
                Event::Start(tag @ (Tag::Item | Tag::TableCell | Tag::BlockQuote(_))) => {
                    self.typography.reset();
                    sink(&mut out, &mut heading).push(Event::Start(tag));
                }
                Event::Text(text) if self.in_code_block => {
                    sink(&mut out, &mut heading).push(Event::Text(text));
                }
                Event::Text(text) => {
                    let events = self.text(&text, heading.as_mut());
                    sink(&mut out, &mut heading).extend(events);
                }
                Event::Code(code) => {
                    if let Some(pending) = heading.as_mut() {
                        pending.text.push_str(&code);
                    }
                    if let Some(paragraph) = self.paragraph.as_mut() {
                        paragraph.push_str(&code);
                    }
                    self.typography.follow(code.chars().last());
                    sink(&mut out, &mut heading).push(Event::Code(code));
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some(paragraph) = self.paragraph.as_mut() {
                        paragraph.push(' ');
                    }
                    self.typography.follow(Some(' '));
                    sink(&mut out, &mut heading).push(event);
                }
                other => sink(&mut out, &mut heading).push(other),
            }
        }

        let mut html = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut html, out.into_iter());
        html
    }

    /// Split text around wiki-links and emit typographed text and links.
    fn text<'a>(
        &mut self,
        text: &str,
        mut heading: Option<&mut PendingHeading<'_>>,
    ) -> Vec<Event<'a>> {
        let index = self.index;
        let mut events = Vec::new();

        for segment in segments(text) {
            let (raw, link) = match segment {
                Segment::Text(raw) => (raw, None),
                Segment::Link(link) => (link.display(), Some(link)),
            };
            if let Some(pending) = heading.as_deref_mut() {
                pending.text.push_str(raw);
            }
            let shown = self.typography.apply(raw);
            if let Some(paragraph) = self.paragraph.as_mut() {
                paragraph.push_str(&shown);
            }

            let url = match link {
                Some(link) => {
                    let url = index.get(link.target);
                    if url.is_none() {
                        self.page.unresolved.push(link.target.to_owned());
                    }
                    url
                }
                None => None,
            };

            match url {
                Some(url) if self.link_depth == 0 => {
                    match heading.as_deref_mut() {
                        Some(pending) => pending.links.push(url.to_owned()),
                        None => self.record_link(url),
                    }
                    events.push(Event::Start(Tag::Link {
                        link_type: LinkType::Inline,
                        dest_url: CowStr::from(url.to_owned()),
                        title: CowStr::Borrowed(""),
                        id: CowStr::Borrowed(""),
                    }));
                    events.push(Event::Text(CowStr::from(shown)));
                    events.push(Event::End(TagEnd::Link));
                }
                _ => events.push(Event::Text(CowStr::from(shown))),
            }
        }

        events
    }

    fn record_link(&mut self, url: &str) {
        if self.seen_links.insert(url.to_owned()) {
            self.page.links.push(url.to_owned());
        }
    }

    fn finish_heading<'a>(&mut self, pending: PendingHeading<'a>, out: &mut Vec<Event<'a>>) {
        let raw = pending.text.trim();
        let id = match pending.id.as_deref() {
            Some(explicit) if !explicit.is_empty() => self.ids.claim(explicit),
            _ => self.ids.next(raw),
        };
        let display = typography::apply(raw, self.lang);

        // The title is shown as plain text, so links inside it make no edge.
        if pending.level == HeadingLevel::H1 && self.page.title.is_empty() && !display.is_empty() {
            self.page.title = display;
            self.page.title_id = Some(id);
            return;
        }

        for url in &pending.links {
            self.record_link(url);
        }

        self.page.toc.push(TocEntry {
            text: display,
            id: id.clone(),
            depth: pending.level as u8,
        });
        out.push(Event::Start(Tag::Heading {
            level: pending.level,
            id: Some(CowStr::from(id)),
            classes: pending.classes,
            attrs: pending.attrs,
        }));
        out.extend(pending.events);
        out.push(Event::End(TagEnd::Heading(pending.level)));
    }
}

/// Where the next event goes: the pending heading, or the page.
fn sink<'v, 'a>(
    out: &'v mut Vec<Event<'a>>,
    heading: &'v mut Option<PendingHeading<'a>>,
) -> &'v mut Vec<Event<'a>> {
    match heading {
        Some(pending) => &mut pending.events,
        None => out,
    }
}

fn truncate_summary(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= SUMMARY_LEN {
        return text.to_owned();
    }
    let cut: String = text.chars().take(SUMMARY_LEN).collect();
    let cut = cut.rsplit_once(' ').map_or(cut.as_str(), |(head, _)| head);
    format!("{}…", cut.trim_end())
}
