use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::duration::ClockDuration;

/// What kind of resource an item plays, each with its own completion rule:
/// videos complete from playback progress, documents only when marked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Video,
    #[serde(alias = "pdf")]
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Pdf,
    Link,
    Code,
    Video,
}

/// Supplementary material attached to an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Unique within the course, taken from the numeric file name prefix
    pub id: String,
    pub title: String,
    /// `M:SS`, empty when the file name carried no duration hint
    #[serde(default)]
    pub duration: String,
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

impl Video {
    pub fn clock_duration(&self) -> ClockDuration {
        ClockDuration::parse_or_zero(&self.duration)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Chapter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Chapter title
    pub chapter: String,
    #[serde(default)]
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail_url: String,
    pub course_content: Vec<Chapter>,
    /// Aggregate duration as written by the sync step; [`Course::total_duration`] is authoritative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_videos: Option<usize>,
}

impl Course {
    pub fn videos(&self) -> impl Iterator<Item = &Video> {
        self.course_content.iter().flat_map(|ch| ch.videos.iter())
    }

    pub fn total_duration(&self) -> ClockDuration {
        self.videos().map(Video::clock_duration).sum()
    }

    pub fn video_count(&self) -> usize {
        self.videos().count()
    }

    pub fn first_video(&self) -> Option<&Video> {
        self.videos().next()
    }

    pub fn find_video(&self, video_id: &str) -> Option<&Video> {
        self.videos().find(|v| v.id == video_id)
    }
}
