use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::error;

use super::{ChangeKind, ProgressStore, Subscription};
use crate::catalog::Catalog;

/// A bookmark joined with catalog titles. Derived at read time, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkedVideo {
    pub course_id: String,
    pub video_id: String,
    pub title: String,
    pub course_name: String,
}

/// Join every stored record against the catalog. Records for unknown courses
/// and ids no longer in a course are skipped.
pub fn bookmarked_videos(
    catalog: &Catalog,
    store: &ProgressStore,
) -> anyhow::Result<Vec<BookmarkedVideo>> {
    let mut items = Vec::new();
    for course_id in store.course_ids()? {
        let Some(course) = catalog.course(&course_id) else {
            continue;
        };
        for video_id in store.get(&course_id).bookmarked_videos {
            if let Some(video) = course.find_video(&video_id) {
                items.push(BookmarkedVideo {
                    course_id: course_id.clone(),
                    title: video.title.clone(),
                    course_name: course.title.clone(),
                    video_id,
                });
            }
        }
    }
    Ok(items)
}

/// The bookmark drawer: a derived list that reloads whenever the store
/// reports a bookmark change.
#[derive(Debug)]
pub struct BookmarkList {
    items: Arc<RwLock<Vec<BookmarkedVideo>>>,
    store: Arc<ProgressStore>,
    _subscription: Subscription,
}

impl BookmarkList {
    pub fn new(catalog: Arc<Catalog>, store: Arc<ProgressStore>) -> Self {
        let items = Arc::new(RwLock::new(Vec::new()));
        reload(&catalog, &store, &items);
        let weak_store: Weak<ProgressStore> = Arc::downgrade(&store);
        let weak_items = Arc::downgrade(&items);
        let subscription = store.subscribe(move |change| {
            if change.kind != ChangeKind::Bookmarks && change.kind != ChangeKind::Record {
                return;
            }
            if let (Some(store), Some(items)) = (weak_store.upgrade(), weak_items.upgrade()) {
                reload(&catalog, &store, &items);
            }
        });
        Self {
            items,
            store,
            _subscription: subscription,
        }
    }

    pub fn items(&self) -> Vec<BookmarkedVideo> {
        self.items.read().clone()
    }

    pub fn remove(&self, course_id: &str, video_id: &str) -> anyhow::Result<()> {
        self.store.remove_bookmark(course_id, video_id)
    }
}

fn reload(catalog: &Catalog, store: &ProgressStore, items: &RwLock<Vec<BookmarkedVideo>>) {
    match bookmarked_videos(catalog, store) {
        Ok(list) => *items.write() = list,
        Err(e) => error!("Error loading bookmarked videos: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::tests::sample,
        progress::{MemoryBackend, ProgressBackend, storage_key},
    };

    #[test]
    fn joins_records_against_catalog() {
        let backend = MemoryBackend::new();
        let known = r#"{"completedVideos":[],"bookmarkedVideos":["02","gone"]}"#;
        let unknown = r#"{"bookmarkedVideos":["01"]}"#;
        backend.set(&storage_key("rust-basics"), known).unwrap();
        backend.set(&storage_key("retired"), unknown).unwrap();
        backend.set(&storage_key("empty"), "corrupt").unwrap();
        let store = ProgressStore::new(backend);

        let items = bookmarked_videos(&sample(), &store).unwrap();
        assert_eq!(
            items,
            vec![BookmarkedVideo {
                course_id: "rust-basics".into(),
                video_id: "02".into(),
                title: "Setup".into(),
                course_name: "Rust Basics".into(),
            }]
        );
    }

    #[test]
    fn list_refreshes_on_bookmark_changes() {
        let store = Arc::new(ProgressStore::in_memory());
        let list = BookmarkList::new(Arc::new(sample()), store.clone());
        assert!(list.items().is_empty());

        store.toggle_bookmark("rust-basics", "03").unwrap();
        store.toggle_bookmark("rust-basics", "01").unwrap();
        let ids = list.items().into_iter().map(|b| b.video_id);
        let ids = ids.collect::<Vec<_>>();
        assert_eq!(ids, vec!["03".to_string(), "01".to_string()]);

        list.remove("rust-basics", "03").unwrap();
        assert_eq!(list.items().len(), 1);
        assert!(!store.get("rust-basics").is_bookmarked("03"));
    }
}
