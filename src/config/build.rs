//! `[build]` section configuration.
//!
//! Contains build settings: source and output paths, the garden and post
//! collections, sitemap and rss generation.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in grove.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"      # Pages and static assets
/// output = "public"        # Output directory
/// minify = true            # Minify HTML
///
/// [build.garden]
/// prefix = "notes"
/// visibility_tags = ["public", "published"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// URL path prefix for subdirectory deployment (e.g., "site" → `/site/...`).
    #[serde(default = "defaults::build::path_prefix")]
    #[educe(Default = defaults::build::path_prefix())]
    pub path_prefix: String,

    /// Content source directory (pages, posts, static assets).
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Minify HTML and XML output.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Remove the output directory before each build.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub clean: bool,

    /// Garden (wiki-linked knowledge base) settings.
    #[serde(default)]
    pub garden: GardenConfig,

    /// Blog post settings.
    #[serde(default)]
    pub posts: PostsConfig,

    /// Assets included on pages that contain code blocks.
    #[serde(default)]
    pub highlight: HighlightConfig,

    /// Sitemap generation settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// RSS feed generation settings.
    #[serde(default)]
    pub rss: RssConfig,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.garden]` section.
///
/// The garden root itself is not configurable here: it always comes from
/// the `GARDEN_ROOT` environment variable.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct GardenConfig {
    /// Absolute garden root, filled in from the environment.
    #[serde(skip)]
    pub root: PathBuf,

    /// URL section for garden documents (`/garden/...`).
    #[serde(default = "defaults::build::garden::prefix")]
    #[educe(Default = defaults::build::garden::prefix())]
    pub prefix: String,

    /// Heading of the garden index page.
    #[serde(default = "defaults::build::garden::title")]
    #[educe(Default = defaults::build::garden::title())]
    pub title: String,

    /// Tags that make a document public.
    #[serde(default = "defaults::build::garden::visibility_tags")]
    #[educe(Default = defaults::build::garden::visibility_tags())]
    pub visibility_tags: Vec<String>,

    /// In-body token that makes a document public.
    #[serde(default = "defaults::build::garden::visibility_marker")]
    #[educe(Default = defaults::build::garden::visibility_marker())]
    pub visibility_marker: String,

    /// Everything after this token is dropped before rendering.
    #[serde(default = "defaults::build::garden::hidden_marker")]
    #[educe(Default = defaults::build::garden::hidden_marker())]
    pub hidden_marker: String,

    /// Publish the source text next to each rendered page.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub raw_source: bool,
}

/// `[build.posts]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PostsConfig {
    /// URL section for posts (`/blog/2024-05-01-hello/`).
    #[serde(default = "defaults::build::posts::prefix")]
    #[educe(Default = defaults::build::posts::prefix())]
    pub prefix: String,

    /// Value of the `collection` field that marks a post.
    #[serde(default = "defaults::build::posts::collection")]
    #[educe(Default = defaults::build::posts::collection())]
    pub collection: String,
}

/// `[build.highlight]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct HighlightConfig {
    /// Stylesheet URLs.
    #[serde(default = "defaults::build::highlight::styles")]
    #[educe(Default = defaults::build::highlight::styles())]
    pub styles: Vec<String>,

    /// Script URLs.
    #[serde(default = "defaults::build::highlight::scripts")]
    #[educe(Default = defaults::build::highlight::scripts())]
    pub scripts: Vec<String>,
}

/// `[build.sitemap]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Output path, relative to the output directory.
    #[serde(default = "defaults::build::sitemap::path")]
    #[educe(Default = defaults::build::sitemap::path())]
    pub path: PathBuf,

    /// Fallback `changefreq` for documents without one.
    #[serde(default = "defaults::build::sitemap::changefreq")]
    #[educe(Default = defaults::build::sitemap::changefreq())]
    pub changefreq: String,
}

/// `[build.rss]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RssConfig {
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Output path, relative to the output directory.
    #[serde(default = "defaults::build::rss::path")]
    #[educe(Default = defaults::build::rss::path())]
    pub path: PathBuf,
}
