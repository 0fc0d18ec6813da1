use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Outline tree node. `Group` holds an entry's nested children; chapter
/// discovery only ever reads top-level `Leaf` nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineNode {
    Leaf { title: String, page: Option<u32> },
    Group(Vec<OutlineNode>),
}

/// Narrow view of an opened PDF book; fakes implement this in tests.
/// `page_text` takes a 0-indexed page and degrades to an empty string on
/// extraction failure. `outline` returns leaf pages resolved to 1-indexed
/// numbers and is empty when the outline root is missing or unreadable.
pub trait BookSource {
    fn page_count(&self) -> u32;

    fn page_text(&self, page_index: u32) -> String;

    fn outline(&self) -> Vec<OutlineNode>;
}

const MAX_OUTLINE_DEPTH: usize = 32;

pub struct BookPdf {
    doc: Document,
    page_numbers: HashMap<ObjectId, u32>,
    page_count: u32,
}

impl BookPdf {
    pub fn open(path: &Path) -> Result<Self> {
        let doc = Document::load(path)
            .with_context(|| format!("failed to open PDF: {}", path.display()))?;

        if doc.is_encrypted() {
            bail!("PDF is encrypted: {}", path.display());
        }

        let pages: BTreeMap<u32, ObjectId> = doc.get_pages();
        if pages.is_empty() {
            bail!("PDF has no pages: {}", path.display());
        }

        let page_count = pages.len() as u32;
        let page_numbers = pages.into_iter().map(|(number, id)| (id, number)).collect();

        Ok(Self {
            doc,
            page_numbers,
            page_count,
        })
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            _ => Some(object),
        }
    }

    fn resolve_dict<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(object)?.as_dict().ok()
    }

    fn string_value(&self, object: &Object) -> Option<String> {
        match self.resolve(object)? {
            Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
            Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    // Direct /Dest arrays and /A -> /D GoTo actions only; named destinations
    // resolve to None and the entry is skipped.
    fn destination_page(&self, entry: &Dictionary) -> Option<u32> {
        let dest = if let Ok(dest) = entry.get(b"Dest") {
            self.resolve(dest)?
        } else {
            let action = self.resolve_dict(entry.get(b"A").ok()?)?;
            self.resolve(action.get(b"D").ok()?)?
        };

        let Object::Array(parts) = dest else {
            return None;
        };
        let page_id = parts.first()?.as_reference().ok()?;
        self.page_numbers.get(&page_id).copied()
    }

    fn outline_nodes(&self) -> Option<Vec<OutlineNode>> {
        let catalog = self.doc.catalog().ok()?;
        let outlines = self.resolve_dict(catalog.get(b"Outlines").ok()?)?;
        let first = outlines.get(b"First").ok()?.as_reference().ok()?;

        let mut visited = HashSet::new();
        Some(self.walk_siblings(first, &mut visited, 0))
    }

    fn walk_siblings(
        &self,
        first: ObjectId,
        visited: &mut HashSet<ObjectId>,
        depth: usize,
    ) -> Vec<OutlineNode> {
        let mut nodes = Vec::new();
        if depth >= MAX_OUTLINE_DEPTH {
            return nodes;
        }

        let mut current = Some(first);
        while let Some(id) = current {
            // malformed outlines can loop through /Next chains
            if !visited.insert(id) {
                break;
            }

            let Ok(entry) = self.doc.get_dictionary(id) else {
                break;
            };

            let title = entry
                .get(b"Title")
                .ok()
                .and_then(|object| self.string_value(object))
                .unwrap_or_default();
            let page = self.destination_page(entry);
            nodes.push(OutlineNode::Leaf { title, page });

            if let Some(child) = entry
                .get(b"First")
                .ok()
                .and_then(|object| object.as_reference().ok())
            {
                let children = self.walk_siblings(child, visited, depth + 1);
                if !children.is_empty() {
                    nodes.push(OutlineNode::Group(children));
                }
            }

            current = entry
                .get(b"Next")
                .ok()
                .and_then(|object| object.as_reference().ok());
        }

        nodes
    }
}

impl BookSource for BookPdf {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn page_text(&self, page_index: u32) -> String {
        if page_index >= self.page_count {
            return String::new();
        }
        self.doc.extract_text(&[page_index + 1]).unwrap_or_default()
    }

    fn outline(&self) -> Vec<OutlineNode> {
        self.outline_nodes().unwrap_or_default()
    }
}

// UTF-16BE with BOM, then UTF-8, then byte-per-char fallback; control
// characters are dropped either way.
fn decode_pdf_string(bytes: &[u8]) -> String {
    let decoded = if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => bytes.iter().map(|&byte| byte as char).collect(),
        }
    };

    decoded
        .chars()
        .filter(|ch| !ch.is_control() || *ch == ' ')
        .collect()
}
