//! File import: turns dropped or command-line files into stored books and
//! loads their renderable content.
//!
//! EPUBs are walked spine item by spine item; each item's `<body>` markup
//! becomes one section. Plain text and standalone HTML files become a
//! single-section book.

use crate::book::{Book, BookContent, Section};
use crate::dom::escape_text;
use crate::rendition::NavItem;
use crate::store::{BookStore, book_id_for_path};
use anyhow::{Context, Result, bail};
use epub::doc::{EpubDoc, NavPoint};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("valid body selector"));

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedBook {
    pub book: Book,
    pub content: BookContent,
}

pub trait Importer: Send + Sync {
    /// Import every readable file; unreadable ones are logged and skipped.
    fn import(&self, files: &[PathBuf]) -> Result<Vec<ImportedBook>>;
    fn load(&self, book: &Book) -> Result<BookContent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Epub,
    Html,
    Text,
}

fn source_kind(path: &Path) -> Option<SourceKind> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())?;
    match ext.as_str() {
        "epub" => Some(SourceKind::Epub),
        "html" | "htm" | "xhtml" => Some(SourceKind::Html),
        "txt" => Some(SourceKind::Text),
        _ => None,
    }
}

pub struct EpubImporter {
    store: Arc<dyn BookStore>,
}

impl EpubImporter {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    fn import_one(&self, path: &Path) -> Result<ImportedBook> {
        let path = fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        let content = load_content(&path)?;
        let id = book_id_for_path(&path);
        let book = match self.store.get(&id)? {
            Some(existing) => {
                debug!(id = %id, "Book already in library");
                existing
            }
            None => {
                let name = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| id.clone());
                let book = Book::new(id, name, path.to_string_lossy());
                self.store.put(&book)?;
                info!(id = %book.id, name = %book.name, "Added book to library");
                book
            }
        };
        Ok(ImportedBook { book, content })
    }
}

impl Importer for EpubImporter {
    fn import(&self, files: &[PathBuf]) -> Result<Vec<ImportedBook>> {
        let mut imported = Vec::with_capacity(files.len());
        for file in files {
            match self.import_one(file) {
                Ok(book) => imported.push(book),
                Err(err) => warn!(path = %file.display(), "Skipping file: {err:#}"),
            }
        }
        if imported.is_empty() && !files.is_empty() {
            bail!("none of the {} file(s) could be imported", files.len());
        }
        Ok(imported)
    }

    fn load(&self, book: &Book) -> Result<BookContent> {
        load_content(Path::new(&book.content_ref))
    }
}

pub fn load_content(path: &Path) -> Result<BookContent> {
    match source_kind(path) {
        Some(SourceKind::Epub) => load_epub(path),
        Some(SourceKind::Html) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(single_section(path, body_markup(&data)))
        }
        Some(SourceKind::Text) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(single_section(path, text_to_markup(&data)))
        }
        None => bail!("unsupported file type: {}", path.display()),
    }
}

fn load_epub(path: &Path) -> Result<BookContent> {
    info!(path = %path.display(), "Loading EPUB content");
    let mut doc =
        EpubDoc::new(path).with_context(|| format!("Failed to open EPUB at {}", path.display()))?;

    let mut sections = Vec::new();
    loop {
        if let Some((chapter, _mime)) = doc.get_current_str() {
            let href = doc
                .get_current_path()
                .map(|path| path.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("section-{}", sections.len()));
            sections.push(Section {
                href,
                html: body_markup(&chapter),
            });
        }
        if !doc.go_next() {
            break;
        }
    }
    if sections.is_empty() {
        bail!("EPUB at {} has no readable spine items", path.display());
    }

    let mut counter = 0;
    let toc = convert_nav(&doc.toc, &mut counter);
    info!(sections = sections.len(), toc_entries = counter, "Finished loading EPUB content");
    Ok(BookContent { sections, toc })
}

fn convert_nav(points: &[NavPoint], counter: &mut usize) -> Vec<NavItem> {
    points
        .iter()
        .map(|point| {
            *counter += 1;
            let id = format!("nav-{counter}");
            NavItem {
                id,
                href: point.content.to_string_lossy().into_owned(),
                label: point.label.trim().to_string(),
                subitems: convert_nav(&point.children, counter),
                expanded: false,
            }
        })
        .collect()
}

fn single_section(path: &Path, html: String) -> BookContent {
    let href = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index.html".to_string());
    let label = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| href.clone());
    BookContent {
        toc: vec![NavItem {
            id: "nav-1".to_string(),
            href: href.clone(),
            label,
            subitems: Vec::new(),
            expanded: false,
        }],
        sections: vec![Section { href, html }],
    }
}

/// Inner markup of `<body>`, or the whole input when it is already a fragment.
pub fn body_markup(document: &str) -> String {
    let parsed = Html::parse_document(document);
    parsed
        .select(&BODY_SELECTOR)
        .next()
        .map(|body| body.inner_html())
        .unwrap_or_else(|| document.to_string())
}

/// Blank-line separated blocks become paragraphs.
pub fn text_to_markup(text: &str) -> String {
    let mut markup = String::new();
    let mut block: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush_paragraph(&mut block, &mut markup);
        } else {
            block.push(line);
        }
    }
    flush_paragraph(&mut block, &mut markup);
    markup
}

fn flush_paragraph(block: &mut Vec<&str>, markup: &mut String) {
    if block.is_empty() {
        return;
    }
    markup.push_str("<p>");
    markup.push_str(&escape_text(&block.join(" ")));
    markup.push_str("</p>");
    block.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBookStore;

    #[test]
    fn text_blocks_become_escaped_paragraphs() {
        assert_eq!(
            text_to_markup("one\ntwo\n\n\nthree & <four>\n"),
            "<p>one two</p><p>three &amp; &lt;four&gt;</p>"
        );
    }

    #[test]
    fn body_markup_extracts_the_body() {
        let markup = body_markup(
            "<html><head><title>t</title></head><body><p>a</p><p>b</p></body></html>",
        );
        assert_eq!(markup, "<p>a</p><p>b</p>");
    }

    #[test]
    fn import_reuses_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "hello\n\nworld").unwrap();
        let store = Arc::new(MemoryBookStore::new());
        let importer = EpubImporter::new(store.clone());

        let first = importer.import(&[file.clone()]).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].book.name, "notes");
        assert_eq!(first[0].content.sections[0].html, "<p>hello</p><p>world</p>");

        let mut stored = store.get(&first[0].book.id).unwrap().unwrap();
        stored.definitions.push("hello".to_string());
        store.put(&stored).unwrap();

        let second = importer.import(&[file]).unwrap();
        assert_eq!(second[0].book.definitions, vec!["hello".to_string()]);
    }

    #[test]
    fn import_skips_unreadable_files_but_fails_when_nothing_loads() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        fs::write(&good, "text").unwrap();
        let importer = EpubImporter::new(Arc::new(MemoryBookStore::new()));

        let imported = importer
            .import(&[good, dir.path().join("missing.txt"), dir.path().join("x.pdf")])
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert!(importer.import(&[dir.path().join("missing.epub")]).is_err());
    }
}
