use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::info;

use crate::cli::Cli;
use crate::extract::extract_chapters;
use crate::heading::HeadingParser;
use crate::model::ChapterManifest;
use crate::pdf::{BookPdf, BookSource};
use crate::util::write_json_pretty;

pub fn run(cli: Cli) -> Result<()> {
    if !cli.pdf_file.exists() {
        bail!("PDF file not found: {}", cli.pdf_file.display());
    }

    let book = BookPdf::open(&cli.pdf_file)?;
    let total_pages = book.page_count();
    info!(path = %cli.pdf_file.display(), total_pages, "extracting chapters");

    let heading = HeadingParser::new()?;
    let chapters = extract_chapters(&book, &heading)?;
    info!(count = chapters.len(), "found chapters");

    let output_path = cli
        .output
        .unwrap_or_else(|| default_output_path(&cli.pdf_file));

    let manifest = ChapterManifest {
        pdf_file: cli.pdf_file.display().to_string(),
        total_pages,
        chapters,
    };
    write_json_pretty(&output_path, &manifest)?;
    info!(path = %output_path.display(), "exported chapter manifest");

    Ok(())
}

fn default_output_path(pdf_file: &Path) -> PathBuf {
    let stem = pdf_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    pdf_file.with_file_name(format!("{stem}_chapters.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Chapter;

    #[test]
    fn default_output_path_uses_pdf_stem() {
        assert_eq!(
            default_output_path(Path::new("/books/anatomy.pdf")),
            PathBuf::from("/books/anatomy_chapters.json")
        );
        assert_eq!(
            default_output_path(Path::new("notes.pdf")),
            PathBuf::from("notes_chapters.json")
        );
    }

    #[test]
    fn manifest_round_trips_through_json_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("book_chapters.json");

        let manifest = ChapterManifest {
            pdf_file: "book.pdf".to_string(),
            total_pages: 85,
            chapters: vec![Chapter {
                id: 1,
                title: "Intro".to_string(),
                start_page: 5,
                end_page: 29,
            }],
        };

        write_json_pretty(&path, &manifest).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with('\n'));

        let restored: ChapterManifest = serde_json::from_str(&raw).unwrap();
        assert_eq!(restored.pdf_file, "book.pdf");
        assert_eq!(restored.total_pages, 85);
        assert_eq!(restored.chapters, manifest.chapters);
    }
}
