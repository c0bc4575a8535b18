//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn email() -> String {
        "user@noreply.grove".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn path_prefix() -> String {
        String::new()
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub mod garden {
        pub fn prefix() -> String {
            "garden".into()
        }

        pub fn title() -> String {
            "Garden".into()
        }

        pub fn visibility_tags() -> Vec<String> {
            vec!["public".into()]
        }

        pub fn visibility_marker() -> String {
            "#public".into()
        }

        pub fn hidden_marker() -> String {
            "%%hidden%%".into()
        }
    }

    pub mod posts {
        pub fn prefix() -> String {
            "blog".into()
        }

        pub fn collection() -> String {
            "post".into()
        }
    }

    pub mod highlight {
        pub fn styles() -> Vec<String> {
            vec!["/static/highlight.css".into()]
        }

        pub fn scripts() -> Vec<String> {
            vec!["/static/highlight.js".into()]
        }
    }

    pub mod rss {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "feed.xml".into()
        }
    }

    pub mod sitemap {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "sitemap.xml".into()
        }

        pub fn changefreq() -> String {
            "monthly".into()
        }
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5277
    }
}
