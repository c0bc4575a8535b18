//! Utility modules for the site generator.

pub mod category;
pub mod date;
pub mod minify;
pub mod slug;
