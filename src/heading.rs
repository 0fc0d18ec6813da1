use anyhow::{Context, Result};
use regex::Regex;

/// Section titles that mark front matter. Matched exactly (trimmed,
/// case-insensitive), never as substrings.
const FRONT_MATTER_TITLES: &[&str] = &[
    "preface",
    "foreword",
    "introduction",
    "acknowledgement",
    "acknowledgements",
    "acknowledgments",
    "contents",
    "table of contents",
    "toc",
    "prologue",
    "questions",
    "answers",
    "answers and explanations",
    "explanations",
];

const BACK_MATTER_TITLES: &[&str] = &[
    "index",
    "bibliography",
    "references",
    "appendix",
    "appendices",
    "about the author",
    "author bio",
    "author biography",
    "copyright",
    "disclaimer",
    "colophon",
    "glossary",
    "notes",
    "endnotes",
    "further reading",
];

/// Classifies and cleans raw heading strings.
///
/// Recognized numbering patterns, first match wins:
///
/// | rule            | number example      | cleaned title     |
/// |-----------------|---------------------|-------------------|
/// | `Chapter N ...` | "Chapter 5: Methods" -> 5 | "Methods"   |
/// | `Ch.? N ...`    | "Ch. 5 Methods" -> 5      | "Methods"   |
/// | `N. / N - / N: / N ...` | "5. Methods" -> 5 | "Methods"   |
#[derive(Debug)]
pub struct HeadingParser {
    chapter_number: Regex,
    leading_number: Regex,
    chapter_prefix: Regex,
    numbered_prefix: Regex,
}

impl HeadingParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            chapter_number: Regex::new(r"(?i)^(?:chapter|ch\.?)\s+(\d+)")
                .context("failed to compile chapter number regex")?,
            leading_number: Regex::new(r"^(\d+)[.\s\-:]")
                .context("failed to compile leading number regex")?,
            chapter_prefix: Regex::new(r"(?i)^(?:chapter|ch\.?)\s+\d+[:\s]+(.+)$")
                .context("failed to compile chapter prefix regex")?,
            numbered_prefix: Regex::new(r"^\d+[.\s\-:]+(.+)$")
                .context("failed to compile numbered prefix regex")?,
        })
    }

    pub fn is_front_matter(&self, title: &str) -> bool {
        let normalized = title.trim().to_lowercase();
        FRONT_MATTER_TITLES.contains(&normalized.as_str())
    }

    pub fn is_back_matter(&self, title: &str) -> bool {
        let normalized = title.trim().to_lowercase();
        BACK_MATTER_TITLES.contains(&normalized.as_str())
    }

    /// Extracts an explicit chapter number from a heading, or `None` when the
    /// heading carries no number. Numbers are never inferred.
    pub fn extract_chapter_number(&self, title: &str) -> Option<u32> {
        let trimmed = title.trim();

        if let Some(captures) = self.chapter_number.captures(trimmed) {
            return captures.get(1)?.as_str().parse().ok();
        }

        if let Some(captures) = self.leading_number.captures(trimmed) {
            return captures.get(1)?.as_str().parse().ok();
        }

        None
    }

    /// Strips a leading chapter identifier, returning the bare title. Applies
    /// at most one rule per call; cleaning is a no-op except when the
    /// stripped title itself begins with a number, which another pass would
    /// strip again.
    pub fn clean_title(&self, title: &str) -> String {
        let trimmed = title.trim();

        if let Some(captures) = self.chapter_prefix.captures(trimmed) {
            if let Some(rest) = captures.get(1) {
                return rest.as_str().trim().to_string();
            }
        }

        if let Some(captures) = self.numbered_prefix.captures(trimmed) {
            if let Some(rest) = captures.get(1) {
                return rest.as_str().trim().to_string();
            }
        }

        trimmed.to_string()
    }
}
