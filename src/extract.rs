use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::heading::HeadingParser;
use crate::model::{Candidate, Chapter};
use crate::pdf::{BookSource, OutlineNode};

const TOC_SCAN_PAGES: u32 = 15;
const TOC_SPILL_PAGES: u32 = 2;

// 0-indexed page where body header relocation begins; earlier pages are front
// matter and TOC listings that would shadow the real headers.
const BODY_SCAN_START: u32 = 10;

/// Extracts the chapter table for an opened book. Strategies cascade:
/// embedded outline, then printed table of contents, then the whole document
/// as a single chapter, so a readable PDF never yields an empty list.
pub fn extract_chapters(book: &dyn BookSource, heading: &HeadingParser) -> Result<Vec<Chapter>> {
    let toc = TocParser::new()?;

    let mut candidates = outline_candidates(book, heading);
    if !candidates.is_empty() {
        info!(count = candidates.len(), "found chapters in embedded outline");
    } else {
        candidates = toc.candidates(book, heading);
        if !candidates.is_empty() {
            info!(
                count = candidates.len(),
                "found chapters in printed table of contents"
            );
        }
    }

    if candidates.is_empty() {
        info!("no chapters found, treating entire document as one chapter");
        candidates = vec![single_chapter()];
    }

    Ok(assemble(book, heading, candidates))
}

/// Walks top-level outline entries into candidates. Nested child lists are
/// skipped outright: sub-sections and appendix sub-items carry numbers of
/// their own and must not be mistaken for chapters.
pub fn outline_candidates(book: &dyn BookSource, heading: &HeadingParser) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for node in book.outline() {
        let OutlineNode::Leaf { title, page } = node else {
            continue;
        };

        let title = title.trim();
        if title.is_empty() {
            continue;
        }
        if heading.is_front_matter(title) {
            debug!(title, "skipping front matter outline entry");
            continue;
        }
        if heading.is_back_matter(title) {
            debug!(title, "skipping back matter outline entry");
            continue;
        }

        let Some(page) = page else {
            debug!(title, "skipping outline entry with unresolvable destination");
            continue;
        };
        let Some(number) = heading.extract_chapter_number(title) else {
            continue;
        };
        // stray single-letter bookmark artifacts
        if title.chars().count() == 1 {
            continue;
        }

        candidates.push(Candidate {
            id: number,
            title: heading.clean_title(title),
            start_page: page,
        });
    }

    candidates
}

#[derive(Debug)]
pub struct TocParser {
    entry: Regex,
    page_prefix: Regex,
    chapter_header: Regex,
}

impl TocParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            entry: Regex::new(r"(?i)^(\d+)\s+chapter\s+(\d+)[:\s]+(.*?)\s*$")
                .context("failed to compile TOC entry regex")?,
            page_prefix: Regex::new(r"^\d+\s")
                .context("failed to compile TOC page prefix regex")?,
            chapter_header: Regex::new(r"(?im)^chapter\s+(\d+)")
                .context("failed to compile chapter header regex")?,
        })
    }

    pub fn candidates(&self, book: &dyn BookSource, heading: &HeadingParser) -> Vec<Candidate> {
        let Some(toc_text) = locate_toc_text(book) else {
            debug!("no printed table of contents in leading pages");
            return Vec::new();
        };

        let mut candidates = self.parse_entries(&toc_text, heading);
        if !candidates.is_empty() {
            self.relocate_starts(book, &mut candidates);
        }

        candidates
    }

    // `<printed_page> Chapter <n> <title>` lines, joining at most one
    // continuation line when a title runs on.
    fn parse_entries(&self, toc_text: &str, heading: &HeadingParser) -> Vec<Candidate> {
        let lines: Vec<&str> = toc_text.lines().collect();
        let mut candidates = Vec::new();
        let mut index = 0;

        while index < lines.len() {
            let line = lines[index].trim();

            if let Some(captures) = self.entry.captures(line) {
                let page = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
                let number = captures.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
                let mut title = captures
                    .get(3)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default();

                let next = lines.get(index + 1).map(|l| l.trim()).unwrap_or("");
                let looks_truncated =
                    title.is_empty() || !next.starts_with(|ch: char| ch.is_ascii_digit());
                if looks_truncated && !next.is_empty() && !self.page_prefix.is_match(next) {
                    if !title.is_empty() {
                        title.push(' ');
                    }
                    title.push_str(next);
                    index += 1;
                }

                let title = normalize_whitespace(&title);
                if let (Some(page), Some(number)) = (page, number) {
                    if !title.is_empty() {
                        debug!(chapter = number, page, title = %title, "parsed TOC entry");
                        candidates.push(Candidate {
                            id: number,
                            title: heading.clean_title(&title),
                            start_page: page,
                        });
                    }
                }
            }

            index += 1;
        }

        candidates
    }

    // Printed TOC page numbers drift from real PDF pages. Scan the body for
    // `CHAPTER N` headers at line start and take the first page each number
    // appears on; candidates without a located header keep the printed page.
    fn relocate_starts(&self, book: &dyn BookSource, candidates: &mut [Candidate]) {
        let mut headers: HashMap<u32, u32> = HashMap::new();

        for page_index in BODY_SCAN_START..book.page_count() {
            let text = book.page_text(page_index);
            if let Some(captures) = self.chapter_header.captures(&text) {
                if let Some(number) = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok())
                {
                    headers.entry(number).or_insert(page_index + 1);
                }
            }
        }

        for candidate in candidates.iter_mut() {
            if let Some(&page) = headers.get(&candidate.id) {
                debug!(
                    chapter = candidate.id,
                    printed_page = candidate.start_page,
                    body_page = page,
                    "relocated chapter start to body header"
                );
                candidate.start_page = page;
            }
        }
    }
}

fn locate_toc_text(book: &dyn BookSource) -> Option<String> {
    let page_count = book.page_count();

    for page_index in 0..TOC_SCAN_PAGES.min(page_count) {
        let text = book.page_text(page_index);
        if !text.to_lowercase().contains("contents") {
            continue;
        }

        let mut combined = text;
        let spill_end = (page_index + 1 + TOC_SPILL_PAGES).min(page_count);
        for next_index in page_index + 1..spill_end {
            combined.push('\n');
            combined.push_str(&book.page_text(next_index));
        }
        return Some(combined);
    }

    None
}

fn single_chapter() -> Candidate {
    Candidate {
        id: 1,
        title: "Full Document".to_string(),
        start_page: 1,
    }
}

/// Sorts candidates by start page and computes end pages: each chapter runs
/// to the page before the next one, the last to the back-matter boundary.
/// The sort is stable, so shared start pages keep discovery order.
pub fn assemble(
    book: &dyn BookSource,
    heading: &HeadingParser,
    mut candidates: Vec<Candidate>,
) -> Vec<Chapter> {
    candidates.sort_by_key(|candidate| candidate.start_page);

    let last_end = back_matter_boundary(book, heading);
    let next_starts: Vec<u32> = candidates
        .iter()
        .skip(1)
        .map(|candidate| candidate.start_page)
        .collect();

    candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| {
            let end_page = next_starts
                .get(index)
                .map(|start| start.saturating_sub(1))
                .unwrap_or(last_end);
            candidate.into_chapter(end_page)
        })
        .collect()
}

/// Page before the first top-level back-matter outline entry, clamped to at
/// least 1. Without an outline or back-matter entry the last chapter runs to
/// the end of the file.
pub fn back_matter_boundary(book: &dyn BookSource, heading: &HeadingParser) -> u32 {
    let total_pages = book.page_count();
    let mut first_back_matter_page = total_pages;

    for node in book.outline() {
        let OutlineNode::Leaf { title, page } = node else {
            continue;
        };
        if !heading.is_back_matter(title.trim()) {
            continue;
        }
        if let Some(page) = page {
            first_back_matter_page = first_back_matter_page.min(page);
        }
    }

    if first_back_matter_page == total_pages {
        total_pages
    } else {
        first_back_matter_page.saturating_sub(1).max(1)
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}
