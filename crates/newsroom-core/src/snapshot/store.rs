use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use super::models::CurationSnapshot;
use crate::feed::CuratedArticle;
use crate::{Error, Result};

/// Write a snapshot to `path` in one piece.
///
/// The JSON goes to a sibling temp file first and is renamed over the target,
/// so readers of the file never see a half-written snapshot.
pub fn persist_snapshot(path: &Path, snapshot: &CurationSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_vec_pretty(snapshot)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("snapshot.json");
    let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    std::fs::write(&tmp_path, json)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::Persistence(format!(
            "failed to move snapshot into {}: {}",
            path.display(),
            e
        )));
    }

    Ok(())
}

/// Read a snapshot previously written by [`persist_snapshot`]
pub fn load_snapshot(path: &Path) -> Result<CurationSnapshot> {
    let content = std::fs::read(path).map_err(|e| {
        Error::Persistence(format!("cannot read {}: {}", path.display(), e))
    })?;

    serde_json::from_slice(&content).map_err(|e| {
        Error::Persistence(format!("cannot parse {}: {}", path.display(), e))
    })
}

/// Holder of the published snapshot.
///
/// Readers clone an `Arc` and never wait on a refresh; the lock only guards
/// the pointer itself. A published snapshot is never mutated, only replaced.
pub struct SnapshotStore {
    current: RwLock<Arc<CurationSnapshot>>,
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>, initial: CurationSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The last published snapshot
    pub fn current(&self) -> Arc<CurationSnapshot> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&*guard)
    }

    /// Publish a complete new snapshot, returning the one it replaced
    pub fn replace(&self, snapshot: CurationSnapshot) -> Arc<CurationSnapshot> {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, next)
    }

    /// Articles of one category from the current snapshot
    pub fn category(&self, name: &str) -> Result<Vec<CuratedArticle>> {
        self.current()
            .get(name)
            .map(<[CuratedArticle]>::to_vec)
            .ok_or_else(|| Error::CategoryNotFound(name.to_string()))
    }

    /// Search the current snapshot
    pub fn search(&self, query: &str) -> Vec<CuratedArticle> {
        self.current().search(query)
    }

    /// Write the current snapshot to the store's file
    pub fn persist(&self) -> Result<()> {
        let snapshot = self.current();
        persist_snapshot(&self.path, &snapshot)?;
        self.log_saved(&snapshot);
        Ok(())
    }

    /// [`persist`](Self::persist) on the blocking pool, for use inside the runtime
    pub async fn persist_async(&self) -> Result<()> {
        let snapshot = self.current();
        let path = self.path.clone();
        let written = Arc::clone(&snapshot);

        tokio::task::spawn_blocking(move || persist_snapshot(&path, &written))
            .await
            .map_err(|e| Error::Persistence(format!("snapshot write task failed: {}", e)))??;

        self.log_saved(&snapshot);
        Ok(())
    }

    /// Read the store's file and publish its contents
    pub fn load(&self) -> Result<Arc<CurationSnapshot>> {
        let snapshot = load_snapshot(&self.path)?;
        Ok(self.publish_loaded(snapshot))
    }

    /// [`load`](Self::load) on the blocking pool, for use inside the runtime
    pub async fn load_async(&self) -> Result<Arc<CurationSnapshot>> {
        let path = self.path.clone();
        let snapshot = tokio::task::spawn_blocking(move || load_snapshot(&path))
            .await
            .map_err(|e| Error::Persistence(format!("snapshot read task failed: {}", e)))??;
        Ok(self.publish_loaded(snapshot))
    }

    fn publish_loaded(&self, snapshot: CurationSnapshot) -> Arc<CurationSnapshot> {
        tracing::info!(
            "Snapshot loaded from {} ({} articles)",
            self.path.display(),
            snapshot.article_count()
        );
        self.replace(snapshot);
        self.current()
    }

    fn log_saved(&self, snapshot: &CurationSnapshot) {
        tracing::info!(
            "Snapshot saved to {} ({} articles)",
            self.path.display(),
            snapshot.article_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("newsroom-test-{}", uuid::Uuid::new_v4()))
            .join("curated_news.json")
    }

    fn generation(tag: usize, categories: &[&str], per_category: usize) -> CurationSnapshot {
        let mut snapshot = CurationSnapshot::default();
        for category in categories {
            let articles = (0..per_category)
                .map(|i| CuratedArticle {
                    title: format!("gen-{} {} #{}", tag, category, i),
                    description: format!("<ul><li>generation {}</li></ul>", tag),
                    link: format!("https://news.test/{}/{}/{}", tag, category, i),
                })
                .collect();
            snapshot.insert(*category, articles);
        }
        snapshot
    }

    #[test]
    fn test_replace_is_visible_to_current() {
        let store = SnapshotStore::new(temp_path(), CurationSnapshot::empty(["general"]));
        assert_eq!(store.current().article_count(), 0);

        let old = store.replace(generation(1, &["general"], 2));
        assert_eq!(old.article_count(), 0);
        assert_eq!(store.current().article_count(), 2);
    }

    #[test]
    fn test_category_lookup() {
        let store = SnapshotStore::new(temp_path(), generation(3, &["finance", "general"], 1));
        assert_eq!(store.category("finance").unwrap().len(), 1);
        assert!(matches!(store.category("weather"), Err(Error::CategoryNotFound(_))));
        assert_eq!(store.search("gen-3 GENERAL").len(), 1);
    }

    #[test]
    fn test_persist_then_load_round_trip() {
        let path = temp_path();
        let mut original = generation(7, &["finance", "general", "technology"], 3);
        original.insert("health", Vec::new());
        original.insert(
            "sports",
            vec![CuratedArticle {
                title: "Ünïcode & \"quotes\"".to_string(),
                description: "<ul><li>a &amp; b</li></ul>".to_string(),
                link: String::new(),
            }],
        );

        let store = SnapshotStore::new(&path, original.clone());
        store.persist().unwrap();

        let reader = SnapshotStore::new(&path, CurationSnapshot::default());
        let loaded = reader.load().unwrap();
        assert_eq!(*loaded, original);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_async_persist_then_load() {
        let path = temp_path();
        let store = SnapshotStore::new(&path, generation(4, &["general", "finance"], 2));
        store.persist_async().await.unwrap();
        assert!(path.exists());

        let reader = SnapshotStore::new(&path, CurationSnapshot::default());
        let loaded = reader.load_async().await.unwrap();
        assert_eq!(*loaded, *store.current());
        assert_eq!(loaded.category_names(), vec!["general", "finance"]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_async_load_missing_file() {
        let store = SnapshotStore::new(temp_path(), CurationSnapshot::empty(["general"]));
        assert!(matches!(store.load_async().await, Err(Error::Persistence(_))));
        assert!(store.current().contains("general"));
    }

    #[test]
    fn test_load_missing_or_corrupt_file() {
        let path = temp_path();
        let store = SnapshotStore::new(&path, CurationSnapshot::empty(["general"]));
        assert!(matches!(store.load(), Err(Error::Persistence(_))));

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(store.load(), Err(Error::Persistence(_))));

        // failed loads leave the published snapshot alone
        assert!(store.current().contains("general"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_readers_never_see_mixed_generations() {
        let categories = ["entertainment", "finance", "general", "health", "sports", "technology"];
        let store = Arc::new(SnapshotStore::new(temp_path(), generation(0, &categories, 8)));

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for tag in 1..=200 {
                    store.replace(generation(tag, &categories, 8));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let snapshot = store.current();
                        let first = snapshot.categories().next().unwrap().1[0].description.clone();
                        for (_, articles) in snapshot.categories() {
                            assert_eq!(articles.len(), 8);
                            assert!(articles.iter().all(|a| a.description == first));
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.current().search("gen-200").len(), 48);
    }
}
