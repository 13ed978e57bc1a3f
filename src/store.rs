//! Book persistence.
//!
//! Books are stored one JSON file per record under the library directory,
//! named by the book id. Ids are derived from a hash of the source path so
//! re-importing the same file finds the existing record.

use crate::book::Book;
use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub trait BookStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<Book>>;
    fn put(&self, book: &Book) -> Result<()>;
    fn list(&self) -> Result<Vec<Book>>;
}

pub fn book_id_for_path(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_os_str().to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub struct FileBookStore {
    root: PathBuf,
}

impl FileBookStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

impl BookStore for FileBookStore {
    fn get(&self, id: &str) -> Result<Option<Book>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read book record {}", path.display()))?;
        let book = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse book record {}", path.display()))?;
        Ok(Some(book))
    }

    fn put(&self, book: &Book) -> Result<()> {
        if !is_valid_id(&book.id) {
            bail!("invalid book id `{}`", book.id);
        }
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create library dir {}", self.root.display()))?;
        let path = self.record_path(&book.id);
        let contents = serde_json::to_vec_pretty(book).context("Failed to serialize book")?;
        // each write stages in its own file; persist renames atomically
        let mut staging = tempfile::NamedTempFile::new_in(&self.root)
            .with_context(|| format!("Failed to stage record in {}", self.root.display()))?;
        staging
            .write_all(&contents)
            .with_context(|| format!("Failed to write {}", staging.path().display()))?;
        staging
            .persist(&path)
            .map_err(|err| err.error)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        debug!(id = %book.id, path = %path.display(), "Saved book record");
        Ok(())
    }

    fn list(&self) -> Result<Vec<Book>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut books = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Failed to list {}", self.root.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|data| serde_json::from_str::<Book>(&data).map_err(Into::into));
            match parsed {
                Ok(book) => books.push(book),
                Err(err) => warn!(path = %path.display(), "Skipping unreadable book record: {err}"),
            }
        }
        books.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(books)
    }
}

#[derive(Default)]
pub struct MemoryBookStore {
    books: Mutex<BTreeMap<String, Book>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookStore for MemoryBookStore {
    fn get(&self, id: &str) -> Result<Option<Book>> {
        let books = self
            .books
            .lock()
            .map_err(|_| anyhow::anyhow!("book store lock poisoned"))?;
        Ok(books.get(id).cloned())
    }

    fn put(&self, book: &Book) -> Result<()> {
        let mut books = self
            .books
            .lock()
            .map_err(|_| anyhow::anyhow!("book store lock poisoned"))?;
        books.insert(book.id.clone(), book.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Book>> {
        let books = self
            .books
            .lock()
            .map_err(|_| anyhow::anyhow!("book store lock poisoned"))?;
        Ok(books.values().cloned().collect())
    }
}
