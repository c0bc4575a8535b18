//! File category classification for watch mode.
//!
//! Every watch event is mapped to the source root it belongs to. Any change
//! under a source root (or to the config file) triggers a full rebuild; the
//! pipeline has no incremental path.
//!
//! | Category | Triggers rebuild | Example Files            |
//! |----------|------------------|--------------------------|
//! | Config   | yes              | `grove.toml`             |
//! | Garden   | yes              | `$GARDEN_ROOT/**/*.md`   |
//! | Content  | yes              | `content/**`             |
//! | Output   | no               | `public/**`              |
//! | Unknown  | no               | editor temp files, other |

use crate::config::SiteConfig;
use std::path::{Path, PathBuf};

/// Category of a changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// Site configuration (grove.toml)
    Config,
    /// File under the garden root
    Garden,
    /// File under the content directory
    Content,
    /// File under the output directory (written by the build itself)
    Output,
    /// Temp file or file outside watched directories
    Unknown,
}

impl FileCategory {
    /// Short name for this category (used in logs)
    pub const fn name(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Garden => "garden",
            Self::Content => "content",
            Self::Output => "output",
            Self::Unknown => "unknown",
        }
    }

    pub const fn triggers_rebuild(self) -> bool {
        matches!(self, Self::Config | Self::Garden | Self::Content)
    }

    /// Watched path for this category, if any.
    pub fn path(self, config: &SiteConfig) -> Option<PathBuf> {
        match self {
            Self::Config => Some(config.config_path.clone()),
            Self::Garden => Some(config.build.garden.root.clone()),
            Self::Content => Some(config.build.content.clone()),
            Self::Output | Self::Unknown => None,
        }
    }

    /// Whether this category is watched recursively.
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Garden | Self::Content)
    }
}

/// Categorize a changed path.
///
/// The output directory is checked first: it may be nested inside the
/// project root next to the content directory.
pub fn categorize_path(path: &Path, config: &SiteConfig) -> FileCategory {
    if is_temp_file(path) {
        return FileCategory::Unknown;
    }

    let path = SiteConfig::normalize_path(path);
    let garden = &config.build.garden.root;

    if path.starts_with(&config.build.output) {
        FileCategory::Output
    } else if path == config.config_path {
        FileCategory::Config
    } else if !garden.as_os_str().is_empty() && path.starts_with(garden) {
        FileCategory::Garden
    } else if path.starts_with(&config.build.content) {
        FileCategory::Content
    } else {
        FileCategory::Unknown
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
        || name == "4913"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.config_path = PathBuf::from("/site/grove.toml");
        config.build.content = PathBuf::from("/site/content");
        config.build.output = PathBuf::from("/site/public");
        config.build.garden.root = PathBuf::from("/notes");
        config
    }

    #[test]
    fn test_category_name() {
        assert_eq!(FileCategory::Config.name(), "config");
        assert_eq!(FileCategory::Garden.name(), "garden");
        assert_eq!(FileCategory::Content.name(), "content");
        assert_eq!(FileCategory::Output.name(), "output");
        assert_eq!(FileCategory::Unknown.name(), "unknown");
    }

    #[test]
    fn test_categorize_path() {
        let config = config();
        assert_eq!(
            categorize_path(Path::new("/site/grove.toml"), &config),
            FileCategory::Config
        );
        assert_eq!(
            categorize_path(Path::new("/notes/rust/ownership.md"), &config),
            FileCategory::Garden
        );
        assert_eq!(
            categorize_path(Path::new("/site/content/index.md"), &config),
            FileCategory::Content
        );
        assert_eq!(
            categorize_path(Path::new("/site/public/garden/index.html"), &config),
            FileCategory::Output
        );
        assert_eq!(
            categorize_path(Path::new("/tmp/other.md"), &config),
            FileCategory::Unknown
        );
    }

    #[test]
    fn test_temp_files_never_trigger() {
        let config = config();
        for name in ["a.md~", "a.md.swp", ".#a.md", "4913", "draft.tmp"] {
            let path = PathBuf::from("/notes").join(name);
            assert_eq!(categorize_path(&path, &config), FileCategory::Unknown, "{name}");
        }
    }

    #[test]
    fn test_triggers_rebuild() {
        assert!(FileCategory::Garden.triggers_rebuild());
        assert!(FileCategory::Content.triggers_rebuild());
        assert!(FileCategory::Config.triggers_rebuild());
        assert!(!FileCategory::Output.triggers_rebuild());
        assert!(!FileCategory::Unknown.triggers_rebuild());
    }

    #[test]
    fn test_is_directory() {
        assert!(FileCategory::Garden.is_directory());
        assert!(FileCategory::Content.is_directory());
        assert!(!FileCategory::Config.is_directory());
    }
}
