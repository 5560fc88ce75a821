//! Post-extraction boilerplate cleanup.
//!
//! The cleaner is a pure string transform applied to whatever text the
//! extractor produced. It never fails: unusable patterns in the configuration
//! are skipped with a warning.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for boilerplate cleanup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Phrases that start trailing chrome; text is cut at the earliest one
    /// that begins a line
    pub markers: Vec<String>,
    /// Markers found before this character offset are ignored
    pub marker_min_offset: usize,
    /// Case-insensitive regexes; whole lines matching any of them are dropped
    pub junk_line_patterns: Vec<String>,
    /// Outlet names stripped when they appear as bare lines or wire datelines
    pub outlet_names: Vec<String>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            markers: [
                "Related Articles",
                "Related Stories",
                "Related Coverage",
                "Recommended for you",
                "Subscribe to our newsletter",
                "Sign up for our newsletter",
                "Sponsored Content",
                "Read more:",
                "Most Popular",
                "Trending Now",
                "You may also like",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            marker_min_offset: 200,
            junk_line_patterns: [
                r"^(skip )?advertisements?$",
                r"^sponsored$",
                r"^(ad|ads)$",
                r"^(share|share this( article| story)?|copy link)$",
                r"^(sign up|subscribe)\b.{0,80}\bnewsletters?\b.*$",
                r"^follow us on\b.*$",
                r"^(continue reading|read more|see more|show more)\.*$",
                r"^(image|photo) (credit|courtesy):.*$",
                r"^(story continues below|article continues below).*$",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            outlet_names: ["AP", "Associated Press", "Reuters", "AFP", "CNN", "UPI"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Compiled boilerplate cleaner.
///
/// # Example
///
/// ```rust
/// use echoscape_core::{CleanConfig, Cleaner};
///
/// let cleaner = Cleaner::new(&CleanConfig::default());
/// let text = cleaner.clean("Para one.\r\n\r\nAdvertisement\r\nPara two.");
/// assert_eq!(text, "Para one.\n\nPara two.");
/// ```
#[derive(Debug, Clone)]
pub struct Cleaner {
    markers: Option<Regex>,
    marker_min_offset: usize,
    junk_lines: Vec<Regex>,
    outlet_lines: Option<Regex>,
    outlet_datelines: Option<Regex>,
}

impl Cleaner {
    pub fn new(config: &CleanConfig) -> Self {
        let markers = alternation(&config.markers).and_then(|names| compile(&format!(r"(?m)^[ \t]*(?:{names})")));
        let junk_lines = config.junk_line_patterns.iter().filter_map(|p| compile(p)).collect();

        let outlets = alternation(&config.outlet_names);
        let outlet_lines = outlets
            .as_ref()
            .and_then(|names| compile(&format!(r"^[\s\-—–(]*(?:{names})[\s\-—–)]*$")));
        let outlet_datelines = outlets
            .as_ref()
            .and_then(|names| compile(&format!(r"\((?:{names})\)\s*[-—–]?\s*")));

        Self { markers, marker_min_offset: config.marker_min_offset, junk_lines, outlet_lines, outlet_datelines }
    }

    /// Clean extracted text.
    ///
    /// Steps, in order: normalize line endings and whitespace, truncate at the
    /// earliest boilerplate marker past the minimum offset, drop junk lines,
    /// strip outlet tokens, normalize again.
    pub fn clean(&self, text: &str) -> String {
        let mut processed = normalize_whitespace(text);
        processed = self.truncate_at_marker(&processed);
        processed = self.strip_junk_lines(&processed);
        processed = self.strip_outlet_tokens(&processed);
        normalize_whitespace(&processed)
    }

    /// Cut the text at the earliest marker that starts a line at or beyond
    /// the configured character offset. A marker phrase inside a sentence is
    /// prose, not chrome.
    pub fn truncate_at_marker(&self, text: &str) -> String {
        let Some(markers) = &self.markers else {
            return text.to_string();
        };

        let cut = markers
            .find_iter(text)
            .find(|m| text[..m.start()].chars().count() >= self.marker_min_offset);

        match cut {
            Some(m) => text[..m.start()].trim_end().to_string(),
            None => text.to_string(),
        }
    }

    fn strip_junk_lines(&self, text: &str) -> String {
        text.split('\n')
            .filter(|line| {
                let line = line.trim();
                line.is_empty() || !self.junk_lines.iter().any(|re| re.is_match(line))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn strip_outlet_tokens(&self, text: &str) -> String {
        let kept = match &self.outlet_lines {
            Some(re) => text
                .split('\n')
                .filter(|line| line.trim().is_empty() || !re.is_match(line.trim()))
                .collect::<Vec<_>>()
                .join("\n"),
            None => text.to_string(),
        };

        match &self.outlet_datelines {
            Some(re) => re.replace_all(&kept, "").into_owned(),
            None => kept,
        }
    }
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new(&CleanConfig::default())
    }
}

/// Clean text with a one-off cleaner built from `config`.
pub fn clean_text(text: &str, config: &CleanConfig) -> String {
    Cleaner::new(config).clean(text)
}

/// Normalize line endings and collapse whitespace.
///
/// Runs of spaces and tabs become one space, lines are trimmed, and any run of
/// blank lines becomes a single blank line separating paragraphs.
pub fn normalize_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in unified.split('\n') {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs.join("\n\n")
}

fn alternation(phrases: &[String]) -> Option<String> {
    let parts: Vec<String> = phrases
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(regex::escape)
        .collect();
    if parts.is_empty() { None } else { Some(parts.join("|")) }
}

fn compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern, error = %e, "skipping invalid cleanup pattern");
            None
        }
    }
}
