pub mod backend;
pub mod bookmarks;
pub mod record;

use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tracing::{error, warn};

pub use backend::{FileBackend, MemoryBackend, ProgressBackend};
pub use bookmarks::{BookmarkList, BookmarkedVideo, bookmarked_videos};
pub use record::{CourseProgress, LastWatched, course_id_from_key, storage_key};

use crate::utils::now_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Bookmarks,
    Completion,
    LastWatched,
    /// Whole record replaced through [`ProgressStore::set`]
    Record,
}

/// Delivered to every subscriber after a record is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressChange {
    pub course_id: String,
    pub kind: ChangeKind,
}

type Listener = Arc<dyn Fn(&ProgressChange) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener)>>,
}

impl Listeners {
    fn remove(&self, id: u64) {
        self.entries.lock().retain(|(i, _)| *i != id);
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish()
    }
}

/// Per-course progress records over a swappable backend.
///
/// Every mutation reads the current record, applies the change and writes the
/// whole record back; the last writer wins.
pub struct ProgressStore {
    backend: Box<dyn ProgressBackend>,
    listeners: Arc<Listeners>,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("listeners", &self.listeners.entries.lock().len())
            .finish_non_exhaustive()
    }
}

impl ProgressStore {
    pub fn new(backend: impl ProgressBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            listeners: Arc::new(Listeners::default()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Missing or unreadable records come back as the empty default.
    pub fn get(&self, course_id: &str) -> CourseProgress {
        let key = storage_key(course_id);
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return CourseProgress::default(),
            Err(e) => {
                error!("read progress for course {} failed: {}", course_id, e);
                return CourseProgress::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Error parsing course progress for {}: {}", course_id, e);
            CourseProgress::default()
        })
    }

    pub fn set(&self, course_id: &str, progress: &CourseProgress) -> anyhow::Result<()> {
        self.write(course_id, progress, ChangeKind::Record)
    }

    /// Returns whether the video is bookmarked afterwards.
    pub fn toggle_bookmark(&self, course_id: &str, video_id: &str) -> anyhow::Result<bool> {
        let mut progress = self.get(course_id);
        let bookmarked = progress.toggle_bookmark(video_id);
        self.write(course_id, &progress, ChangeKind::Bookmarks)?;
        Ok(bookmarked)
    }

    pub fn remove_bookmark(&self, course_id: &str, video_id: &str) -> anyhow::Result<()> {
        let mut progress = self.get(course_id);
        if progress.remove_bookmark(video_id) {
            self.write(course_id, &progress, ChangeKind::Bookmarks)?;
        }
        Ok(())
    }

    /// Returns whether the video is completed afterwards.
    pub fn toggle_complete(&self, course_id: &str, video_id: &str) -> anyhow::Result<bool> {
        let mut progress = self.get(course_id);
        let completed = progress.toggle_complete(video_id);
        self.write(course_id, &progress, ChangeKind::Completion)?;
        Ok(completed)
    }

    pub fn mark_complete(&self, course_id: &str, video_id: &str) -> anyhow::Result<()> {
        let mut progress = self.get(course_id);
        if progress.mark_complete(video_id) {
            self.write(course_id, &progress, ChangeKind::Completion)?;
        }
        Ok(())
    }

    pub fn set_last_watched(&self, course_id: &str, video_id: &str) -> anyhow::Result<()> {
        let mut progress = self.get(course_id);
        progress.last_watched = Some(LastWatched {
            video_id: video_id.to_string(),
            timestamp: now_millis(),
        });
        self.write(course_id, &progress, ChangeKind::LastWatched)
    }

    /// Courses that have a stored record
    pub fn course_ids(&self) -> anyhow::Result<Vec<String>> {
        Ok(self
            .backend
            .keys()?
            .iter()
            .filter_map(|key| course_id_from_key(key))
            .map(str::to_string)
            .collect())
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&ProgressChange) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.entries.lock().push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    fn write(
        &self,
        course_id: &str,
        progress: &CourseProgress,
        kind: ChangeKind,
    ) -> anyhow::Result<()> {
        let json = serde_json::to_string(progress)?;
        self.backend.set(&storage_key(course_id), &json)?;
        self.notify(ProgressChange {
            course_id: course_id.to_string(),
            kind,
        });
        Ok(())
    }

    fn notify(&self, change: ProgressChange) {
        // listeners may read the store, so call them outside the lock
        let listeners = self
            .listeners
            .entries
            .lock()
            .iter()
            .map(|(_, l)| l.clone())
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(&change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_record_reads_as_default() {
        let backend = MemoryBackend::new();
        backend.set(&storage_key("abc"), "{not json").unwrap();
        let store = ProgressStore::new(backend);
        assert_eq!(store.get("abc"), CourseProgress::default());
        assert_eq!(store.get("never-written"), CourseProgress::default());
    }

    #[test]
    fn mutations_overwrite_whole_record() {
        let store = ProgressStore::in_memory();
        assert!(store.toggle_bookmark("c", "01").unwrap());
        store.mark_complete("c", "01").unwrap();
        store.mark_complete("c", "01").unwrap();
        assert!(store.toggle_complete("c", "02").unwrap());
        assert!(!store.toggle_complete("c", "02").unwrap());
        store.set_last_watched("c", "01").unwrap();

        let progress = store.get("c");
        assert_eq!(progress.completed_videos, vec!["01".to_string()]);
        assert_eq!(progress.bookmarked_videos, vec!["01".to_string()]);
        assert_eq!(progress.last_watched.unwrap().video_id, "01");

        store.set("c", &CourseProgress::default()).unwrap();
        assert_eq!(store.get("c"), CourseProgress::default());
        assert_eq!(store.course_ids().unwrap(), vec!["c".to_string()]);
    }

    #[test]
    fn subscribers_hear_changes_until_dropped() {
        let store = ProgressStore::in_memory();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = store.subscribe(move |change| sink.lock().push(change.clone()));

        store.toggle_bookmark("c", "01").unwrap();
        store.mark_complete("c", "01").unwrap();
        // already complete, nothing written
        store.mark_complete("c", "01").unwrap();
        store.remove_bookmark("c", "missing").unwrap();
        assert_eq!(
            *seen.lock(),
            vec![
                ProgressChange {
                    course_id: "c".into(),
                    kind: ChangeKind::Bookmarks,
                },
                ProgressChange {
                    course_id: "c".into(),
                    kind: ChangeKind::Completion,
                },
            ]
        );

        drop(subscription);
        store.toggle_bookmark("c", "02").unwrap();
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = ProgressStore::new(FileBackend::new(dir.path()).unwrap());
            store.toggle_bookmark("rust-basics", "02").unwrap();
        }
        let store = ProgressStore::new(FileBackend::new(dir.path()).unwrap());
        assert!(store.get("rust-basics").is_bookmarked("02"));
        assert_eq!(store.course_ids().unwrap(), vec!["rust-basics".to_string()]);
    }
}
