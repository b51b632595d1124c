use once_cell::sync::Lazy;
use regex::Regex;

/// A `#`-prefixed token exactly as it appears in the text, possibly malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexToken {
    pub raw: String,
}

impl HexToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Characters after the `#`.
    pub fn digits(&self) -> &str {
        self.raw.strip_prefix('#').unwrap_or(&self.raw)
    }

    /// `#` followed by exactly six hexadecimal characters.
    pub fn is_complete(&self) -> bool {
        let digits = self.digits();
        digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Lowercase `#rrggbb` for complete tokens; `None` for anything else.
    /// Incomplete tokens are never padded, truncated or otherwise repaired.
    pub fn normalized(&self) -> Option<String> {
        self.is_complete()
            .then(|| format!("#{}", self.digits().to_ascii_lowercase()))
    }
}

/// A text fragment describing CMYK percentages, kept raw until conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmykDescriptor {
    pub raw: String,
}

impl CmykDescriptor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn has_digits(&self) -> bool {
        self.raw.chars().any(|c| c.is_ascii_digit())
    }
}

/// A color-bearing substring found in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorToken {
    Hex(HexToken),
    Cmyk(CmykDescriptor),
}

/// One piece of a scanned line, in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Free text left over once color tokens and channel labels are removed.
    Text(String),
    Token(ColorToken),
}

static HEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#[0-9A-Za-z]*").unwrap());

/// `CMYK` keyword followed by numbers, optionally tagged with channel letters:
/// `CMYK 10 20 30 40`, `CMYK(10,20,30,40)`, `CMYK: C10 M20 Y30 K40`.
static CMYK_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bCMYK\b[ \t]*[:=\-]?[ \t]*\(?(?:[ \t,;/|%.]*(?:[CMYK][ \t]*[:=]?[ \t]*)?\d+)*[ \t]*%?[ \t]*\)?",
    )
    .unwrap()
});

/// Channel-letter form without the keyword: `C:0 M:100 Y:100 K:0`, `C0 M100 Y100 K0`.
static CMYK_LETTERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bC[ \t]*[:=]?[ \t]*\d{1,3}[ \t]*%?[ \t,;/|]*M[ \t]*[:=]?[ \t]*\d{1,3}[ \t]*%?[ \t,;/|]*Y[ \t]*[:=]?[ \t]*\d{1,3}[ \t]*%?[ \t,;/|]*K[ \t]*[:=]?[ \t]*\d{1,3}[ \t]*%?",
    )
    .unwrap()
});

/// Line made only of numbers and separators, e.g. the values under a bare `CMYK` label.
static NUMBERS_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*\d[\d \t,;/|%.]*$").unwrap());

/// Other color notations and their values, removed from label text.
static CHANNEL_LABEL_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bRGB[ \t]*[:=\-]?[ \t]*\(?(?:[ \t,;/|]*\d{1,3})*[ \t]*\)?",
        r"(?i)\bR[ \t]*[:=]?[ \t]*\d{1,3}[ \t,;/|]*G[ \t]*[:=]?[ \t]*\d{1,3}[ \t,;/|]*B[ \t]*[:=]?[ \t]*\d{1,3}",
        r"(?i)\b(?:pantone|pms)\b.*$",
        r"(?i)\bRAL\b[ \t]*\d*",
        r"(?i)\bhex(?:adecimal)?\b[ \t]*[:=\-]?",
        r"(?i)\bcmyk\b[ \t]*[:=\-]?",
        r"(?i)\b(?:web|print|impress[ãa]o|digital|c[óo]digo|code)\b[ \t]*[:=\-]?",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Split a line into free-text fragments and color tokens.
pub fn scan_line(line: &str) -> Vec<LineEvent> {
    let mut spans: Vec<(usize, usize, ColorToken)> = Vec::new();

    for m in CMYK_LETTERS_RE.find_iter(line) {
        spans.push((m.start(), m.end(), ColorToken::Cmyk(CmykDescriptor::new(m.as_str().trim()))));
    }
    for m in CMYK_KEYWORD_RE.find_iter(line) {
        spans.push((m.start(), m.end(), ColorToken::Cmyk(CmykDescriptor::new(m.as_str().trim()))));
    }
    for m in HEX_RE.find_iter(line) {
        spans.push((m.start(), m.end(), ColorToken::Hex(HexToken::new(m.as_str()))));
    }

    // Earliest start wins; on ties the longer match wins. Overlaps are dropped.
    spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    let mut kept: Vec<(usize, usize, ColorToken)> = Vec::new();
    for span in spans {
        if kept.last().is_some_and(|last| span.0 < last.1) {
            continue;
        }
        kept.push(span);
    }

    let mut events = Vec::new();
    let mut cursor = 0;
    for (start, end, token) in kept {
        push_text(&mut events, &line[cursor..start]);
        events.push(LineEvent::Token(token));
        cursor = end;
    }
    push_text(&mut events, &line[cursor..]);
    events
}

fn push_text(events: &mut Vec<LineEvent>, fragment: &str) {
    let cleaned = clean_label(fragment);
    if !cleaned.is_empty() {
        events.push(LineEvent::Text(cleaned));
    }
}

/// Strip channel notations and decoration; keep only text that has letters.
fn clean_label(fragment: &str) -> String {
    let mut text = fragment.to_string();
    for re in CHANNEL_LABEL_RES.iter() {
        text = re.replace_all(&text, " ").into_owned();
    }
    let text = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let text = text
        .trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '|' | '•' | '·' | '*' | ',' | ';' | '/' | '(' | ')')
        })
        .to_string();
    if text.chars().any(char::is_alphabetic) {
        text
    } else {
        String::new()
    }
}

/// Scan a block of lines, joining a bare `CMYK` label with the numbers-only
/// line that follows it. Digitless `CMYK` mentions are dropped.
pub fn scan_block(block: &str) -> Vec<LineEvent> {
    let lines: Vec<&str> = block.lines().collect();
    let mut events = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let mut line_events = scan_line(lines[i]);

        let bare_cmyk = line_events.iter().position(|e| {
            matches!(e, LineEvent::Token(ColorToken::Cmyk(d)) if !d.has_digits())
        });
        if let Some(pos) = bare_cmyk
            && pos == line_events.len() - 1
            && i + 1 < lines.len()
            && NUMBERS_ONLY_RE.is_match(lines[i + 1])
        {
            if let LineEvent::Token(ColorToken::Cmyk(d)) = &line_events[pos] {
                let joined = format!("{} {}", d.raw, lines[i + 1].trim());
                line_events[pos] = LineEvent::Token(ColorToken::Cmyk(CmykDescriptor::new(joined)));
            }
            i += 1;
        }

        // A `CMYK` mention with no numbers is prose, not a descriptor. The
        // text around it stays one fragment.
        let mut merged: Vec<LineEvent> = Vec::with_capacity(line_events.len());
        for event in line_events {
            match event {
                LineEvent::Token(ColorToken::Cmyk(d)) if !d.has_digits() => {}
                LineEvent::Text(text) => match merged.last_mut() {
                    Some(LineEvent::Text(prev)) => {
                        prev.push(' ');
                        prev.push_str(&text);
                    }
                    _ => merged.push(LineEvent::Text(text)),
                },
                token => merged.push(token),
            }
        }
        events.extend(merged);
        i += 1;
    }
    events
}
