//! Catalog library - the store of catalog metadata
//!
//! The viewer treats catalog storage as a black box that lists entries
//! (name, document location, page count, optional thumbnail). This
//! implementation scans a directory tree for PDF documents and merges
//! optional JSON sidecar metadata written next to each document
//! (`<stem>.catalog.json`). Entries are ordered newest-first, matching how
//! the catalogs were published.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{info, warn};
use serde::Deserialize;
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("cannot read catalog directory {path:?}: {source}")]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One catalog as known to the store.
#[derive(Clone, Debug)]
pub struct CatalogEntry {
    pub name: String,
    pub path: PathBuf,
    pub total_pages: Option<u32>,
    pub thumbnail: Option<PathBuf>,
    /// Publication timestamp used for newest-first ordering.
    pub added: Option<SystemTime>,
}

impl CatalogEntry {
    /// List line: name plus page count when the store knows it.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.total_pages {
            Some(pages) => format!("{name}  ({pages} pages)", name = self.name),
            None => self.name.clone(),
        }
    }
}

/// Sidecar metadata written next to a document.
#[derive(Debug, Default, Deserialize)]
struct SidecarMeta {
    name: Option<String>,
    total_pages: Option<u32>,
    thumbnail: Option<PathBuf>,
}

pub struct CatalogLibrary {
    root: PathBuf,
}

impl CatalogLibrary {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all catalogs under the library root, newest first.
    pub fn entries(&self) -> Result<Vec<CatalogEntry>, LibraryError> {
        if !self.root.is_dir() {
            return Err(LibraryError::Scan {
                path: self.root.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "not a directory",
                ),
            });
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let is_pdf = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
            if !is_pdf {
                continue;
            }

            let meta = load_sidecar(path);
            let name = meta.name.unwrap_or_else(|| display_name(path));
            let added = entry.metadata().ok().and_then(|m| m.modified().ok());

            entries.push(CatalogEntry {
                name,
                path: path.to_path_buf(),
                total_pages: meta.total_pages,
                thumbnail: meta.thumbnail,
                added,
            });
        }

        order_newest_first(&mut entries);
        info!(
            "library scan of {root:?} found {count} catalogs",
            root = self.root,
            count = entries.len()
        );
        Ok(entries)
    }
}

/// Newest first; ties (and unknown timestamps) fall back to name order.
pub fn order_newest_first(entries: &mut [CatalogEntry]) {
    entries.sort_by(|a, b| {
        b.added
            .cmp(&a.added)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

fn sidecar_path(doc: &Path) -> PathBuf {
    doc.with_extension("catalog.json")
}

fn load_sidecar(doc: &Path) -> SidecarMeta {
    let path = sidecar_path(doc);
    let Ok(raw) = std::fs::read_to_string(&path) else {
        return SidecarMeta::default();
    };
    match serde_json::from_str(&raw) {
        Ok(meta) => meta,
        Err(e) => {
            warn!("ignoring malformed sidecar {path:?}: {e}");
            SidecarMeta::default()
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn scans_pdfs_recursively_and_skips_other_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("spring.pdf"), b"%PDF-").unwrap();
        fs::create_dir_all(dir.path().join("archive")).unwrap();
        fs::write(dir.path().join("archive/winter.PDF"), b"%PDF-").unwrap();
        fs::write(dir.path().join("notes.txt"), b"nope").unwrap();

        let library = CatalogLibrary::new(dir.path());
        let entries = library.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.name == "spring"));
        assert!(entries.iter().any(|e| e.name == "winter"));
    }

    #[test]
    fn sidecar_metadata_overrides_derived_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cat-2024.pdf"), b"%PDF-").unwrap();
        fs::write(
            dir.path().join("cat-2024.catalog.json"),
            r#"{"name": "Spring Collection", "total_pages": 24, "thumbnail": "cover.png"}"#,
        )
        .unwrap();

        let entries = CatalogLibrary::new(dir.path()).entries().unwrap();
        assert_eq!(entries[0].name, "Spring Collection");
        assert_eq!(entries[0].total_pages, Some(24));
        assert_eq!(entries[0].thumbnail, Some(PathBuf::from("cover.png")));
        assert_eq!(entries[0].summary(), "Spring Collection  (24 pages)");
    }

    #[test]
    fn malformed_sidecar_falls_back_to_file_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cat.pdf"), b"%PDF-").unwrap();
        fs::write(dir.path().join("cat.catalog.json"), b"{not json").unwrap();

        let entries = CatalogLibrary::new(dir.path()).entries().unwrap();
        assert_eq!(entries[0].name, "cat");
        assert_eq!(entries[0].total_pages, None);
    }

    #[test]
    fn missing_directory_is_a_scan_error() {
        let library = CatalogLibrary::new("/definitely/not/here");
        assert!(matches!(
            library.entries(),
            Err(LibraryError::Scan { .. })
        ));
    }

    #[test]
    fn ordering_is_newest_first_with_name_tiebreak() {
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let t1 = SystemTime::UNIX_EPOCH + Duration::from_secs(2_000);
        let entry = |name: &str, added: Option<SystemTime>| CatalogEntry {
            name: name.to_string(),
            path: PathBuf::from(format!("{name}.pdf")),
            total_pages: None,
            thumbnail: None,
            added,
        };

        let mut entries = vec![
            entry("beta", Some(t0)),
            entry("alpha", Some(t0)),
            entry("newest", Some(t1)),
            entry("unknown", None),
        ];
        order_newest_first(&mut entries);

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["newest", "alpha", "beta", "unknown"]);
    }
}
