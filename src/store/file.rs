//! Filesystem-backed document store
//!
//! Provides a `FileStore` that keeps each document as a JSON file under an
//! XDG-compliant directory, mirroring the document path as nested folders.

use async_trait::async_trait;
use directories::ProjectDirs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;

use super::{Document, DocumentPath, DocumentStore, DocumentWrite, StoreError};
use crate::clock::{Clock, SystemClock};

/// Stores documents as JSON files on disk
///
/// The store lives in `~/.cache/castcall/documents/` on Linux (or the
/// platform equivalent). A document at `a/b/c` is written to `a/b/c.json`.
#[derive(Clone)]
pub struct FileStore {
    /// Directory under which documents are stored
    root: PathBuf,
    /// Time source for server-assigned timestamps
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore").field("root", &self.root).finish()
    }
}

impl FileStore {
    /// Creates a FileStore in the XDG-compliant cache directory
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "castcall")?;
        let root = project_dirs.cache_dir().join("documents");
        Some(Self::with_dir(root))
    }

    /// Creates a FileStore rooted at a custom directory
    pub fn with_dir(root: PathBuf) -> Self {
        Self {
            root,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for server-assigned timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Directory under which documents are stored
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Returns the file path for a document
    fn file_path(&self, path: &DocumentPath) -> PathBuf {
        let mut file = self.root.clone();
        let segments = path.segments();
        if let Some((last, parents)) = segments.split_last() {
            for segment in parents {
                file.push(encode_segment(segment));
            }
            file.push(format!("{}.json", encode_segment(last)));
        }
        file
    }
}

/// Distinguishes temp files of concurrent writes within this process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Sibling path a write is staged in before being renamed over `file`
///
/// Encoded segments never start with `.`, so staging files cannot collide
/// with documents.
fn staging_path(file: &Path) -> PathBuf {
    let name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    file.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), n))
}

/// Makes a path segment safe to use as a file name
///
/// ASCII letters, digits, `-` and `_` pass through; every other byte becomes
/// `%XX`, so distinct segments always map to distinct names.
fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let content = match fs::read_to_string(self.file_path(path)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let document: Document = serde_json::from_str(&content)?;
        Ok(Some(document))
    }

    async fn set(&self, path: &DocumentPath, write: DocumentWrite) -> Result<(), StoreError> {
        let file = self.file_path(path);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await?;
        }

        let document = write.resolve(self.clock.now());
        let json = serde_json::to_string_pretty(&document)?;

        // Readers see either the old or the new document, never a mix
        let staging = staging_path(&file);
        fs::write(&staging, json).await?;
        if let Err(e) = fs::rename(&staging, &file).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::with_dir(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    fn fee_fields(fee: i64, popularity: &str) -> Document {
        let mut doc = Document::new();
        doc.insert("fee".to_string(), json!(fee));
        doc.insert("popularity".to_string(), json!(popularity));
        doc
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("actorCache"), "actorCache");
        assert_eq!(encode_segment("tom hanks"), "tom%20hanks");
        assert_eq!(encode_segment("ac/dc"), "ac%2Fdc");
        assert_eq!(encode_segment(".."), "%2E%2E");
        assert_eq!(encode_segment("zoë"), "zo%C3%AB");
    }

    #[tokio::test]
    async fn test_set_creates_nested_file() {
        let (store, temp_dir) = create_test_store();
        let path = DocumentPath::new(["artifacts", "app", "actorCache", "tom hanks"]);

        store
            .set(&path, DocumentWrite::new(fee_fields(1, "A-List")))
            .await
            .expect("Write should succeed");

        let expected = temp_dir
            .path()
            .join("artifacts")
            .join("app")
            .join("actorCache")
            .join("tom%20hanks.json");
        assert!(expected.exists(), "Document file should exist");

        let content = std::fs::read_to_string(&expected).expect("Should read file");
        assert!(content.contains("\"popularity\""));
        assert!(content.contains("A-List"));
    }

    #[tokio::test]
    async fn test_get_returns_none_for_missing_document() {
        let (store, _temp_dir) = create_test_store();
        let path = DocumentPath::new(["nothing", "here"]);

        let result = store.get(&path).await.expect("Read should succeed");

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_get_returns_written_document_with_timestamp() {
        let (store, _temp_dir) = create_test_store();
        let start = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        let store = store.with_clock(Arc::new(ManualClock::new(start)));
        let path = DocumentPath::new(["actorCache", "meryl streep"]);

        store
            .set(
                &path,
                DocumentWrite::new(fee_fields(15_000_000, "A-List")).server_timestamp("cachedAt"),
            )
            .await
            .expect("Write should succeed");

        let doc = store.get(&path).await.unwrap().expect("Document should exist");
        assert_eq!(doc["fee"], 15_000_000);
        assert_eq!(doc["popularity"], "A-List");
        assert_eq!(doc["cachedAt"], json!(start.timestamp()));
    }

    #[tokio::test]
    async fn test_overwrite_existing_document() {
        let (store, _temp_dir) = create_test_store();
        let path = DocumentPath::new(["actorCache", "x"]);

        store.set(&path, DocumentWrite::new(fee_fields(1, "first"))).await.unwrap();
        store.set(&path, DocumentWrite::new(fee_fields(2, "second"))).await.unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc["popularity"], "second", "Store should contain latest data");
    }

    #[tokio::test]
    async fn test_concurrent_writes_leave_one_whole_document() {
        let (store, temp_dir) = create_test_store();
        let path = DocumentPath::new(["actorCache", "tom hanks"]);

        let writes = (0..16).map(|i| {
            let store = store.clone();
            let path = path.clone();
            // Bodies of very different lengths
            let popularity = "x".repeat(1 + i * 997);
            tokio::spawn(async move {
                store
                    .set(&path, DocumentWrite::new(fee_fields(i as i64, &popularity)))
                    .await
            })
        });
        for result in futures::future::join_all(writes).await {
            result.expect("Task should not panic").expect("Write should succeed");
        }

        let doc = store
            .get(&path)
            .await
            .expect("Document should parse")
            .expect("Document should exist");
        let fee = doc["fee"].as_i64().expect("fee should be an integer") as usize;
        assert_eq!(doc["popularity"], json!("x".repeat(1 + fee * 997)));

        let dir = temp_dir.path().join("actorCache");
        let leftovers: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "Staging files should be renamed away");
    }

    #[test]
    fn test_staging_path_is_hidden_sibling() {
        let file = PathBuf::from("/data/actorCache/tom%20hanks.json");

        let first = staging_path(&file);
        let second = staging_path(&file);

        assert_eq!(first.parent(), file.parent());
        assert!(first.file_name().unwrap().to_string_lossy().starts_with(".tom%20hanks.json."));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let (store, temp_dir) = create_test_store();
        std::fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();

        let result = store.get(&DocumentPath::new(["broken"])).await;

        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(store) = FileStore::new() {
            let path_str = store.root().to_string_lossy();
            assert!(path_str.contains("castcall"), "Store path should contain project name");
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }
}
