use serde::{Deserialize, Serialize};

const KEY_PREFIX: &str = "course-progress-";

/// Key a course's progress record is stored under
pub fn storage_key(course_id: &str) -> String {
    format!("{KEY_PREFIX}{course_id}")
}

/// Inverse of [`storage_key`], `None` for keys that don't hold progress.
pub fn course_id_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(KEY_PREFIX).filter(|id| !id.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastWatched {
    pub video_id: String,
    /// unix milliseconds
    pub timestamp: i64,
}

/// Per-course progress. An absent record is the default empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    #[serde(default)]
    pub completed_videos: Vec<String>,
    #[serde(default)]
    pub bookmarked_videos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watched: Option<LastWatched>,
}

impl CourseProgress {
    pub fn is_completed(&self, video_id: &str) -> bool {
        self.completed_videos.iter().any(|id| id == video_id)
    }

    pub fn is_bookmarked(&self, video_id: &str) -> bool {
        self.bookmarked_videos.iter().any(|id| id == video_id)
    }

    /// Returns whether the video is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, video_id: &str) -> bool {
        toggle(&mut self.bookmarked_videos, video_id)
    }

    /// Returns whether the video is completed afterwards.
    pub fn toggle_complete(&mut self, video_id: &str) -> bool {
        toggle(&mut self.completed_videos, video_id)
    }

    /// Returns whether anything changed.
    pub fn mark_complete(&mut self, video_id: &str) -> bool {
        if self.is_completed(video_id) {
            return false;
        }
        self.completed_videos.push(video_id.to_string());
        true
    }

    /// Returns whether anything changed.
    pub fn remove_bookmark(&mut self, video_id: &str) -> bool {
        let len = self.bookmarked_videos.len();
        self.bookmarked_videos.retain(|id| id != video_id);
        len != self.bookmarked_videos.len()
    }
}

fn toggle(ids: &mut Vec<String>, video_id: &str) -> bool {
    if ids.iter().any(|id| id == video_id) {
        ids.retain(|id| id != video_id);
        false
    } else {
        ids.push(video_id.to_string());
        true
    }
}
