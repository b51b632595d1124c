use regex::Regex;

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Heading alternatives that open a palette section. Matched case-insensitively
/// against a whole trimmed line, with an optional numbering prefix and colon.
pub const DEFAULT_PALETTE_HEADINGS: &[&str] = &[
    r"(?:paleta\s+de\s+)?cores?(?:\s+(?:prim[áa]rias?|secund[áa]rias?|terci[áa]rias?|neutras?|de\s+apoio|complementares|institucionais|da\s+marca))?",
    r"(?:paleta\s+)?(?:prim[áa]rias?|secund[áa]rias?|terci[áa]rias?|complementares?)",
    r"(?:brand\s+|primary\s+|secondary\s+|tertiary\s+|accent\s+|neutral\s+|supporting\s+)?colou?rs?(?:\s+palette)?",
    r"(?:primary|secondary|tertiary|accent|neutral|supporting)(?:\s+(?:colou?rs?|palette))?",
    r"colou?r\s+palette",
    r"paleta(?:\s+(?:de\s+cores|crom[áa]tica))?",
];

/// Heading alternatives that close a palette section. Matched at the start of a
/// trimmed line that carries no digits or `#` after the keyword.
pub const DEFAULT_SECTION_ENDS: &[&str] = &[
    r"tipografia",
    r"typography",
    r"fontes?",
    r"fonts?",
    r"typefaces?",
    r"logo(?:tipo|type|marca)?",
    r"marca\s+gr[áa]fica",
    r"tom\s+de\s+voz",
    r"tone\s+of\s+voice",
    r"voice(?:\s+(?:and|&)\s+tone)?",
    r"iconografia",
    r"iconography",
    r"[íi]cones",
    r"icons",
    r"imagens",
    r"imagery",
    r"fotografia",
    r"photography",
    r"grid",
    r"layout",
    r"aplica[çc][õo]es",
    r"applications",
    r"contato",
    r"contact",
    r"miss[ãa]o",
    r"mission",
    r"valores",
    r"values",
];

/// Default cap on how many words a line may have to be taken as a color name.
pub const DEFAULT_MAX_LABEL_WORDS: usize = 6;

const NUMBERING_PREFIX: &str = r"(?:\d+(?:\.\d+)*[.)]?\s+)?";

pub(crate) fn palette_heading_pattern(alternatives: &[String]) -> String {
    format!(
        r"(?i)^{}(?:{})\s*:?\s*$",
        NUMBERING_PREFIX,
        alternatives.join("|")
    )
}

pub(crate) fn section_end_pattern(alternatives: &[String]) -> String {
    format!(
        r"(?i)^{}(?:{})\b[^#\d]{{0,40}}$",
        NUMBERING_PREFIX,
        alternatives.join("|")
    )
}

pub(crate) fn defaults(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Configuration for palette detection and color resolution.
///
/// Regex fields are `Option<Regex>`; `None` means "use the built-in default".
/// Use [`ParsingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    /// Regex matching a line that opens a palette section.
    pub(crate) palette_heading_re: Option<Regex>,
    /// Regex matching a line that closes a palette section.
    pub(crate) section_end_re: Option<Regex>,
    /// Lines with more words than this are prose, not color names.
    pub(crate) max_label_words: usize,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            palette_heading_re: None,
            section_end_re: None,
            max_label_words: DEFAULT_MAX_LABEL_WORDS,
        }
    }
}

impl ParsingConfig {
    pub fn max_label_words(&self) -> usize {
        self.max_label_words
    }
}

/// Builder for [`ParsingConfig`].
///
/// Heading alternatives are regex fragments compiled in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any fragment is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    palette_headings: ListOverride<String>,
    section_ends: ListOverride<String>,
    max_label_words: Option<usize>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Palette headings ──

    pub fn set_palette_headings(mut self, headings: Vec<String>) -> Self {
        self.palette_headings = ListOverride::Replace(headings);
        self
    }

    pub fn add_palette_heading(mut self, heading: String) -> Self {
        match &mut self.palette_headings {
            ListOverride::Extend(v) | ListOverride::Replace(v) => v.push(heading),
            ListOverride::Default => self.palette_headings = ListOverride::Extend(vec![heading]),
        }
        self
    }

    // ── Section ends ──

    pub fn set_section_ends(mut self, ends: Vec<String>) -> Self {
        self.section_ends = ListOverride::Replace(ends);
        self
    }

    pub fn add_section_end(mut self, end: String) -> Self {
        match &mut self.section_ends {
            ListOverride::Extend(v) | ListOverride::Replace(v) => v.push(end),
            ListOverride::Default => self.section_ends = ListOverride::Extend(vec![end]),
        }
        self
    }

    // ── Scalars ──

    pub fn max_label_words(mut self, n: usize) -> Self {
        self.max_label_words = Some(n);
        self
    }

    /// Compile all heading lists into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let palette_heading_re = match self.palette_headings {
            ListOverride::Default => None,
            other => {
                let alternatives = other.resolve(&defaults(DEFAULT_PALETTE_HEADINGS));
                Some(Regex::new(&palette_heading_pattern(&alternatives))?)
            }
        };

        let section_end_re = match self.section_ends {
            ListOverride::Default => None,
            other => {
                let alternatives = other.resolve(&defaults(DEFAULT_SECTION_ENDS));
                Some(Regex::new(&section_end_pattern(&alternatives))?)
            }
        };

        Ok(ParsingConfig {
            palette_heading_re,
            section_end_re,
            max_label_words: self
                .max_label_words
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_LABEL_WORDS),
        })
    }
}
