use serde::{Deserialize, Serialize};

/// A chapter with its resolved page range. Pages are 1-indexed and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u32,
    pub title: String,
    pub start_page: u32,
    pub end_page: u32,
}

/// A chapter discovered by a strategy before end pages are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: u32,
    pub title: String,
    pub start_page: u32,
}

impl Candidate {
    pub fn into_chapter(self, end_page: u32) -> Chapter {
        Chapter {
            id: self.id,
            title: self.title,
            start_page: self.start_page,
            end_page,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterManifest {
    pub pdf_file: String,
    pub total_pages: u32,
    pub chapters: Vec<Chapter>,
}
