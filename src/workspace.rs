//! Document stores on disk
//!
//! The permanent store holds curated reference documents and is only ever
//! read. The transient store is a folder inside it that receives uploads and
//! is emptied whenever a fresh session starts.

use crate::chunk::compute_content_hash;
use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};
use crate::parse::{parse_bytes, should_skip_file};
use blake3::Hasher;
use ignore::WalkBuilder;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info, warn};

/// A document read from the permanent store
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the permanent store, `/`-separated
    pub relative_path: String,

    /// Extracted title, if any
    pub title: Option<String>,

    /// Extracted text
    pub text: String,

    /// Blake3 hash of the raw file bytes
    pub hash: String,
}

/// Outcome of emptying the transient store
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: Vec<String>,
}

/// A file written to the transient store
#[derive(Debug, Clone, Serialize)]
pub struct SavedUpload {
    pub file_name: String,
    pub bytes: usize,
    #[serde(skip)]
    pub path: PathBuf,
}

/// Identity of the document set: paths, sizes and modification times
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub digest: String,
    pub file_count: usize,
}

#[derive(Debug, Clone)]
pub struct Workspace {
    permanent: PathBuf,
    transient: PathBuf,
    allowed_extensions: Vec<String>,
}

impl Workspace {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            permanent: config.data_dir.clone(),
            transient: config.uploads_dir(),
            allowed_extensions: config
                .allowed_upload_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn permanent_dir(&self) -> &Path {
        &self.permanent
    }

    pub fn transient_dir(&self) -> &Path {
        &self.transient
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Create both stores if they are missing
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.permanent)?;
        std::fs::create_dir_all(&self.transient)?;
        Ok(())
    }

    /// Delete every regular file directly inside the transient store.
    ///
    /// Subdirectories and the permanent store are left alone. Files that cannot
    /// be removed are logged and reported, never fatal.
    pub fn clear_transient(&self) -> CleanupReport {
        self.clear_transient_with(|path| std::fs::remove_file(path))
    }

    fn clear_transient_with<F>(&self, remove: F) -> CleanupReport
    where
        F: Fn(&Path) -> std::io::Result<()>,
    {
        let mut report = CleanupReport::default();

        let entries = match std::fs::read_dir(&self.transient) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Transient store {:?} not readable: {}", self.transient, e);
                return report;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match remove(&path) {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    warn!("Error deleting {}: {}", path.display(), e);
                    report.failed.push(path.display().to_string());
                }
            }
        }

        if report.removed > 0 {
            info!("Cleared {} transient upload(s)", report.removed);
        }
        report
    }

    /// Write an upload into the transient store, replacing any file of the same name
    pub fn save_upload(&self, original_name: &str, bytes: &[u8]) -> Result<SavedUpload> {
        let file_name = sanitize_file_name(original_name)?;

        let extension = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !self.allowed_extensions.contains(&extension) {
            return Err(Error::UnsupportedUpload(format!(
                "'{}' is not one of: {}",
                file_name,
                self.allowed_extensions.join(", ")
            )));
        }

        std::fs::create_dir_all(&self.transient)?;
        let path = self.transient.join(&file_name);
        std::fs::write(&path, bytes)?;
        info!("Saved upload {} ({} bytes)", file_name, bytes.len());

        Ok(SavedUpload {
            file_name,
            bytes: bytes.len(),
            path,
        })
    }

    /// All candidate document files under the permanent store, sorted.
    ///
    /// The walk is recursive, so the transient store is included. Hidden
    /// files and known binary formats are skipped.
    pub fn list_documents(&self) -> Vec<PathBuf> {
        if !self.permanent.is_dir() {
            return Vec::new();
        }

        let walker = WalkBuilder::new(&self.permanent)
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .build();

        let mut files: Vec<PathBuf> = walker
            .filter_map(|entry| match entry {
                Ok(e) if e.file_type().map(|t| t.is_file()).unwrap_or(false) => {
                    Some(e.into_path())
                }
                Ok(_) => None,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|path| !should_skip_file(path))
            .collect();

        files.sort();
        files
    }

    /// Fingerprint of the current document set, `None` when it is empty
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        let files = self.list_documents();
        if files.is_empty() {
            return None;
        }

        let mut hasher = Hasher::new();
        for path in &files {
            hasher.update(self.relative_path(path).as_bytes());
            hasher.update(&[0]);
            if let Ok(meta) = std::fs::metadata(path) {
                hasher.update(&meta.len().to_le_bytes());
                let modified = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_nanos())
                    .unwrap_or_default();
                hasher.update(&modified.to_le_bytes());
            }
        }

        Some(Fingerprint {
            digest: hasher.finalize().to_hex().to_string(),
            file_count: files.len(),
        })
    }

    /// Read and parse every document. Files that fail are logged and skipped.
    pub fn load_documents(&self) -> Vec<Document> {
        let mut documents = Vec::new();

        for path in self.list_documents() {
            match self.load_document(&path) {
                Ok(Some(doc)) => documents.push(doc),
                Ok(None) => debug!("No indexable text in {}", path.display()),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        info!("Loaded {} document(s) from {:?}", documents.len(), self.permanent);
        documents
    }

    fn load_document(&self, path: &Path) -> Result<Option<Document>> {
        let data = std::fs::read(path)?;
        let Some(parsed) = parse_bytes(path, &data)? else {
            return Ok(None);
        };
        if parsed.text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(Document {
            relative_path: self.relative_path(path),
            title: parsed.title,
            text: parsed.text,
            hash: compute_content_hash(&data),
        }))
    }

    fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.permanent).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Reduce a client-supplied name to a bare, visible file name
fn sanitize_file_name(original: &str) -> Result<String> {
    let name = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." || name.starts_with('.') {
        return Err(Error::InvalidPath(format!(
            "Invalid upload file name '{}'",
            original
        )));
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(tmp: &TempDir) -> Workspace {
        let config = WorkspaceConfig {
            data_dir: tmp.path().join("data"),
            ..WorkspaceConfig::default()
        };
        let ws = Workspace::new(&config);
        ws.ensure_dirs().unwrap();
        ws
    }

    #[test]
    fn test_clear_transient_empties_uploads_only() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);

        std::fs::write(ws.permanent_dir().join("schemes.txt"), "SISFS").unwrap();
        for i in 0..3 {
            std::fs::write(ws.transient_dir().join(format!("deck{}.txt", i)), "x").unwrap();
        }
        std::fs::create_dir(ws.transient_dir().join("nested")).unwrap();

        let report = ws.clear_transient();

        assert_eq!(report.removed, 3);
        assert!(report.failed.is_empty());
        let remaining_files = std::fs::read_dir(ws.transient_dir())
            .unwrap()
            .flatten()
            .filter(|e| e.path().is_file())
            .count();
        assert_eq!(remaining_files, 0);
        assert!(ws.transient_dir().join("nested").is_dir());
        assert!(ws.permanent_dir().join("schemes.txt").exists());
    }

    #[test]
    fn test_clear_transient_reports_undeletable_files() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        std::fs::write(ws.transient_dir().join("locked.pdf"), "x").unwrap();
        std::fs::write(ws.transient_dir().join("deck.txt"), "y").unwrap();

        let report = ws.clear_transient_with(|path| {
            if path.ends_with("locked.pdf") {
                Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "in use"))
            } else {
                std::fs::remove_file(path)
            }
        });

        assert_eq!(report.removed, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].ends_with("locked.pdf"));
        assert!(ws.transient_dir().join("locked.pdf").exists());
        assert!(!ws.transient_dir().join("deck.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_clear_transient_survives_read_only_store() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        std::fs::write(ws.transient_dir().join("deck.txt"), "x").unwrap();
        std::fs::set_permissions(ws.transient_dir(), std::fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users ignore directory permissions
        let writable = std::fs::write(ws.transient_dir().join("check.txt"), "").is_ok();
        let report = ws.clear_transient();
        std::fs::set_permissions(ws.transient_dir(), std::fs::Permissions::from_mode(0o755)).unwrap();

        if !writable {
            assert_eq!(report.removed, 0);
            assert_eq!(report.failed.len(), 1);
            assert!(ws.transient_dir().join("deck.txt").exists());
        }
    }

    #[test]
    fn test_clear_transient_missing_dir_is_noop() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(&WorkspaceConfig {
            data_dir: tmp.path().join("absent"),
            ..WorkspaceConfig::default()
        });
        assert_eq!(ws.clear_transient().removed, 0);
    }

    #[test]
    fn test_save_upload_overwrites_same_name() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);

        ws.save_upload("report.pdf", b"first").unwrap();
        let saved = ws.save_upload("report.pdf", b"second version").unwrap();

        let files: Vec<_> = std::fs::read_dir(ws.transient_dir())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(files, vec!["report.pdf".to_string()]);
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"second version");
        assert_eq!(saved.bytes, 14);
    }

    #[test]
    fn test_save_upload_rejects_other_extensions() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);

        assert!(matches!(
            ws.save_upload("deck.pptx", b"x"),
            Err(Error::UnsupportedUpload(_))
        ));
        assert!(ws.save_upload("Notes.TXT", b"x").is_ok());
    }

    #[test]
    fn test_save_upload_strips_directories() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);

        let saved = ws.save_upload("../../etc/evil.txt", b"x").unwrap();
        assert_eq!(saved.file_name, "evil.txt");
        assert!(ws.transient_dir().join("evil.txt").exists());

        let saved = ws.save_upload("C:\\Users\\me\\deck.csv", b"a,b").unwrap();
        assert_eq!(saved.file_name, "deck.csv");

        assert!(ws.save_upload("..", b"x").is_err());
        assert!(ws.save_upload(".hidden.txt", b"x").is_err());
    }

    #[test]
    fn test_list_documents_is_recursive_and_skips_hidden() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);

        std::fs::write(ws.permanent_dir().join("b.txt"), "b").unwrap();
        std::fs::write(ws.permanent_dir().join("a.csv"), "a").unwrap();
        std::fs::write(ws.permanent_dir().join(".secret.txt"), "s").unwrap();
        std::fs::write(ws.permanent_dir().join("logo.png"), "p").unwrap();
        ws.save_upload("deck.txt", b"d").unwrap();

        let names: Vec<String> = ws
            .list_documents()
            .iter()
            .map(|p| ws.relative_path(p))
            .collect();

        assert_eq!(names, vec!["a.csv", "b.txt", "uploads/deck.txt"]);
    }

    #[test]
    fn test_fingerprint_tracks_document_set() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);
        assert!(ws.fingerprint().is_none());

        std::fs::write(ws.permanent_dir().join("a.txt"), "alpha").unwrap();
        let first = ws.fingerprint().unwrap();
        assert_eq!(first, ws.fingerprint().unwrap());
        assert_eq!(first.file_count, 1);

        std::fs::write(ws.permanent_dir().join("b.txt"), "beta").unwrap();
        let second = ws.fingerprint().unwrap();
        assert_ne!(first.digest, second.digest);
        assert_eq!(second.file_count, 2);
    }

    #[test]
    fn test_load_documents_skips_empty_files() {
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp);

        std::fs::write(ws.permanent_dir().join("schemes.txt"), "Seed Fund\n\nDetails").unwrap();
        std::fs::write(ws.permanent_dir().join("empty.txt"), "   ").unwrap();

        let docs = ws.load_documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].relative_path, "schemes.txt");
        assert_eq!(docs[0].title.as_deref(), Some("Seed Fund"));
    }
}
