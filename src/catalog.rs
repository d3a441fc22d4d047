pub mod course;
pub mod duration;

use std::{collections::BTreeSet, path::Path};

use serde::Serialize;
use tracing::{error, info, warn};

pub use course::{Chapter, Course, MediaKind, Resource, ResourceKind, Video};
pub use duration::{ClockDuration, format_clock};

/// The full ordered list of courses, immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    courses: Vec<Course>,
}

/// Outcome of the one-time catalog fetch. A failure is terminal for the page.
#[derive(Debug, Clone)]
pub enum CatalogState {
    Ready(Catalog),
    Failed(String),
}

/// One row of the course listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub total_duration: ClockDuration,
    pub total_videos: usize,
    pub first_video_id: Option<String>,
    /// First chapter title, shown as a preview of the course
    pub preview: Option<String>,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id.clone(),
            title: course.title.clone(),
            thumbnail_url: course.thumbnail_url.clone(),
            total_duration: course.total_duration(),
            total_videos: course.video_count(),
            first_video_id: course.first_video().map(|v| v.id.clone()),
            preview: course.course_content.first().map(|ch| ch.chapter.clone()),
        }
    }
}

impl Catalog {
    pub fn new(courses: Vec<Course>) -> Self {
        Self { courses }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let courses = serde_json::from_str::<Vec<Course>>(json)?;
        let catalog = Self { courses };
        for problem in catalog.validate() {
            warn!("catalog: {}", problem);
        }
        Ok(catalog)
    }

    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        info!("Loading catalog from {}", path.display());
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    /// Load the catalog once; failures are logged and never retried.
    pub async fn fetch(path: impl AsRef<Path>) -> CatalogState {
        match Self::load(&path).await {
            Ok(catalog) => CatalogState::Ready(catalog),
            Err(e) => {
                error!("load catalog {} failed: {}", path.as_ref().display(), e);
                CatalogState::Failed(e.to_string())
            }
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.courses)?)
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn summaries(&self) -> Vec<CourseSummary> {
        self.courses.iter().map(CourseSummary::from).collect()
    }

    /// Report identity and shape problems without rejecting the catalog.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut course_ids = BTreeSet::new();
        for course in &self.courses {
            if !course_ids.insert(course.id.as_str()) {
                problems.push(format!("duplicate course id {:?}", course.id));
            }
            if course.first_video().is_none() {
                problems.push(format!("course {:?} has no content", course.id));
            }
            let mut video_ids = BTreeSet::new();
            for video in course.videos() {
                if !video_ids.insert(video.id.as_str()) {
                    problems.push(format!(
                        "duplicate video id {:?} in course {:?}",
                        video.id, course.id
                    ));
                }
            }
        }
        problems
    }
}
