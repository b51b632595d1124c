use brandscan_core::Finding;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;
use crate::section::{PALETTE_HEADING_RE, SECTION_END_RE};

/// Brand identity fields found anywhere in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub brand_name: Finding<String>,
    pub description: Finding<String>,
    pub urls: Finding<Vec<String>>,
    pub tone_of_voice: Finding<String>,
    pub fonts: Finding<Vec<String>>,
}

const BRAND_NAME_LABELS: &str = r"nome\s+da\s+marca|brand\s+name|marca|brand";
const DESCRIPTION_LABELS: &str = r"descri[çc][ãa]o(?:\s+da\s+marca)?|brand\s+description|description|sobre\s+a\s+marca|about\s+the\s+brand|quem\s+somos";
const TONE_LABELS: &str = r"tom\s+de\s+voz|tone\s+of\s+voice|voice\s+(?:and|&)\s+tone|brand\s+voice|voz\s+da\s+marca";
const FONT_LABELS: &str = r"fontes?(?:\s+(?:principal|secund[áa]ria|prim[áa]ria))?|fonts?|tipografia|typography|typefaces?|fam[íi]lias?\s+tipogr[áa]ficas?|font\s+family|(?:primary|secondary)\s+(?:font|typeface)";

fn labelled_re(labels: &str) -> Regex {
    Regex::new(&format!(
        r"(?im)^[ \t]*(?:{labels})[ \t]*[:\-–—][ \t]*(\S.*?)[ \t]*$"
    ))
    .unwrap()
}

fn heading_re(labels: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)^(?:\d+(?:\.\d+)*[.)]?\s+)?(?:{labels})\s*:?\s*$"
    ))
    .unwrap()
}

static BRAND_NAME_LABELLED: Lazy<Regex> = Lazy::new(|| labelled_re(BRAND_NAME_LABELS));
static DESCRIPTION_LABELLED: Lazy<Regex> = Lazy::new(|| labelled_re(DESCRIPTION_LABELS));
static TONE_LABELLED: Lazy<Regex> = Lazy::new(|| labelled_re(TONE_LABELS));
static FONT_LABELLED: Lazy<Regex> = Lazy::new(|| labelled_re(FONT_LABELS));

static BRAND_NAME_HEADING: Lazy<Regex> = Lazy::new(|| heading_re(BRAND_NAME_LABELS));
static DESCRIPTION_HEADING: Lazy<Regex> = Lazy::new(|| heading_re(DESCRIPTION_LABELS));
static TONE_HEADING: Lazy<Regex> = Lazy::new(|| heading_re(TONE_LABELS));
static FONT_HEADING: Lazy<Regex> = Lazy::new(|| heading_re(FONT_LABELS));

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"')\]]+"#).unwrap());

static FONT_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:,|/|;|&|\s+e\s+|\s+and\s+)\s*").unwrap());

const WEIGHT_WORDS: &[&str] = &[
    "regular", "bold", "light", "medium", "black", "italic", "semibold", "semi", "extrabold",
    "extra", "thin", "heavy", "book", "oblique",
];

/// First word of a typography-block line that names a usage, not a typeface.
const USAGE_WORDS: &[&str] = &[
    "títulos", "titulos", "subtítulos", "subtitulos", "texto", "textos", "corpo", "destaques",
    "headings", "heading", "titles", "title", "subtitles", "body", "text", "primária",
    "secundária", "primary", "secondary", "apoio", "uso", "usage", "exemplo", "example",
    "alfabeto", "alphabet", "números", "numbers",
];

/// Lines scanned under a typography heading before giving up.
const MAX_TYPOGRAPHY_LINES: usize = 20;

/// Extract brand metadata from the whole document text.
pub fn extract_metadata(text: &str) -> Metadata {
    extract_metadata_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`extract_metadata`].
pub(crate) fn extract_metadata_with_config(text: &str, config: &ParsingConfig) -> Metadata {
    let palette_re = config
        .palette_heading_re
        .as_ref()
        .unwrap_or(&PALETTE_HEADING_RE);
    let end_re = config.section_end_re.as_ref().unwrap_or(&SECTION_END_RE);
    let is_heading = |line: &str| {
        let line = line.trim();
        palette_re.is_match(line)
            || end_re.is_match(line)
            || [&*BRAND_NAME_HEADING, &*DESCRIPTION_HEADING, &*TONE_HEADING, &*FONT_HEADING]
                .iter()
                .any(|re| re.is_match(line))
    };

    let brand_name = labelled_value(text, &BRAND_NAME_LABELLED).or_else(|| {
        headed_block(text, &BRAND_NAME_HEADING, &is_heading)
            .into_iter()
            .next()
    });
    let description = labelled_value(text, &DESCRIPTION_LABELLED)
        .or_else(|| joined(headed_block(text, &DESCRIPTION_HEADING, &is_heading)));
    let tone_of_voice = labelled_value(text, &TONE_LABELLED)
        .or_else(|| joined(headed_block(text, &TONE_HEADING, &is_heading)));

    Metadata {
        brand_name: brand_name.into(),
        description: description.into(),
        urls: Finding::from_list(find_urls(text)),
        tone_of_voice: tone_of_voice.into(),
        fonts: Finding::from_list(find_fonts(text, &is_heading)),
    }
}

fn labelled_value(text: &str, re: &Regex) -> Option<String> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .find(|v| !v.is_empty())
}

/// Lines following the first line that matches `heading`, up to a blank line
/// or the next heading. Leading blank lines are skipped.
fn headed_block(text: &str, heading: &Regex, is_heading: &dyn Fn(&str) -> bool) -> Vec<String> {
    let mut lines = text.lines();
    if !lines.by_ref().any(|l| heading.is_match(l.trim())) {
        return Vec::new();
    }

    lines
        .map(str::trim)
        .skip_while(|l| l.is_empty())
        .take_while(|l| !l.is_empty() && !is_heading(*l))
        .map(str::to_string)
        .collect()
}

fn joined(lines: Vec<String>) -> Option<String> {
    (!lines.is_empty()).then(|| lines.join(" "))
}

/// Every `http://`, `https://` or `www.` address, deduplicated in order.
pub fn find_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for m in URL_RE.find_iter(text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':']);
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

fn find_fonts(text: &str, is_heading: &dyn Fn(&str) -> bool) -> Vec<String> {
    let mut fonts: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !fonts.iter().any(|f| f.eq_ignore_ascii_case(&name)) {
            fonts.push(name);
        }
    };

    for caps in FONT_LABELLED.captures_iter(text) {
        let Some(value) = caps.get(1) else { continue };
        for part in FONT_SPLIT_RE.split(value.as_str()) {
            if let Some(name) = font_name(part) {
                push(name);
            }
        }
    }

    let mut in_block = false;
    let mut scanned = 0;
    for line in text.lines().map(str::trim) {
        if FONT_HEADING.is_match(line) {
            in_block = true;
            scanned = 0;
            continue;
        }
        if !in_block || line.is_empty() {
            continue;
        }
        if is_heading(line) || scanned >= MAX_TYPOGRAPHY_LINES {
            in_block = false;
            continue;
        }
        scanned += 1;

        let candidate = line.rsplit_once(':').map_or(line, |(_, v)| v.trim());
        if let Some(name) = font_name(candidate).filter(|n| looks_like_typeface(n)) {
            push(name);
        }
    }

    fonts
}

/// Strip weight words and reject anything that cannot be a typeface name.
fn font_name(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw
        .split_whitespace()
        .filter(|w| !WEIGHT_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    if words.is_empty() || words.len() > 4 {
        return None;
    }
    if words.iter().any(|w| w.chars().count() > 20) {
        return None;
    }
    if words.iter().all(|w| w.chars().count() <= 2) {
        return None;
    }
    if raw.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(words.join(" "))
}

/// Title-case words of letters only, not a usage label.
fn looks_like_typeface(name: &str) -> bool {
    let first = name
        .split_whitespace()
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();
    if USAGE_WORDS.contains(&first.as_str()) {
        return false;
    }
    name.split_whitespace().all(|w| {
        w.chars().next().is_some_and(char::is_uppercase)
            && w.chars().all(|c| c.is_alphabetic() || c == '-' || c == '\'')
    })
}
