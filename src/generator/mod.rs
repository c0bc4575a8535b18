//! Site-wide feeds derived from the content graph.

pub mod rss;
pub mod sitemap;

pub use rss::build_rss;
pub use sitemap::build_sitemap;
