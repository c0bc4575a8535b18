//! Locale-aware typographic normalization.
//!
//! Straight quotes become curly (or guillemets), `---`/`--` become dashes,
//! `...` becomes an ellipsis. Code never reaches this module.

/// Quote style for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Quotes {
    double_open: char,
    double_close: char,
    single_open: char,
    single_close: char,
}

const ENGLISH: Quotes = Quotes {
    double_open: '“',
    double_close: '”',
    single_open: '‘',
    single_close: '’',
};

const GERMAN: Quotes = Quotes {
    double_open: '„',
    double_close: '“',
    single_open: '‚',
    single_close: '‘',
};

const GUILLEMETS: Quotes = Quotes {
    double_open: '«',
    double_close: '»',
    single_open: '„',
    single_close: '“',
};

/// Stateful normalizer for one run of text.
///
/// Quote direction depends on the previous character, so one instance is
/// carried across the text events of a block and [`reset`](Self::reset) at
/// block boundaries.
#[derive(Debug, Clone)]
pub struct Typography {
    quotes: Quotes,
    /// Spaced hyphen becomes an em dash (`a - b` → `a — b`).
    spaced_em_dash: bool,
    prev: Option<char>,
}

impl Typography {
    /// Normalizer for a BCP 47 language tag (`en`, `ru-RU`, `de`).
    pub fn new(lang: &str) -> Self {
        let primary = lang
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let (quotes, spaced_em_dash) = match primary.as_str() {
            "ru" | "uk" | "be" => (GUILLEMETS, true),
            "fr" | "es" | "it" => (GUILLEMETS, false),
            "de" | "cs" => (GERMAN, false),
            _ => (ENGLISH, false),
        };
        Self {
            quotes,
            spaced_em_dash,
            prev: None,
        }
    }

    /// Forget the previous character (start of a new block).
    pub fn reset(&mut self) {
        self.prev = None;
    }

    /// Treat the next text as following `c` (e.g. after inline code).
    pub fn follow(&mut self, c: Option<char>) {
        self.prev = c;
    }

    /// Normalize `text`, continuing from the previous call.
    pub fn apply(&mut self, text: &str) -> String {
        let text = text.replace("...", "…").replace("---", "—").replace("--", "–");
        let text = if self.spaced_em_dash {
            text.replace(" - ", " — ")
        } else {
            text
        };

        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            let replaced = match c {
                '"' if self.opens() => self.quotes.double_open,
                '"' => self.quotes.double_close,
                '\'' if self.prev.is_some_and(char::is_alphanumeric) => '’',
                '\'' if self.opens() => self.quotes.single_open,
                '\'' => self.quotes.single_close,
                other => other,
            };
            out.push(replaced);
            self.prev = Some(replaced);
        }
        out
    }

    fn opens(&self) -> bool {
        self.prev.is_none_or(|c| {
            c.is_whitespace() || matches!(c, '(' | '[' | '{' | '—' | '–' | '-' | '/')
                || c == self.quotes.double_open
                || c == self.quotes.single_open
        })
    }
}

/// One-shot normalization of a standalone string (titles, summaries).
pub fn apply(text: &str, lang: &str) -> String {
    Typography::new(lang).apply(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_quotes() {
        assert_eq!(apply(r#"say "hello" to 'me'"#, "en"), "say “hello” to ‘me’");
    }

    #[test]
    fn test_apostrophe() {
        assert_eq!(apply("don't", "en"), "don’t");
    }

    #[test]
    fn test_dashes_and_ellipsis() {
        assert_eq!(apply("a -- b --- c...", "en"), "a – b — c…");
    }

    #[test]
    fn test_russian() {
        assert_eq!(apply(r#"он сказал "привет" - и ушёл"#, "ru-RU"), "он сказал «привет» — и ушёл");
    }

    #[test]
    fn test_german() {
        assert_eq!(apply(r#""Garten""#, "de"), "„Garten“");
    }

    #[test]
    fn test_state_carries_across_calls() {
        let mut typo = Typography::new("en");
        assert_eq!(typo.apply("see \""), "see “");
        assert_eq!(typo.apply("x\""), "x”");
        typo.reset();
        assert_eq!(typo.apply("\"y"), "“y");
    }

    #[test]
    fn test_follow_code() {
        let mut typo = Typography::new("en");
        typo.follow(Some('x'));
        assert_eq!(typo.apply("\" end"), "” end");
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(apply("Ownership rules", "en"), "Ownership rules");
    }
}
