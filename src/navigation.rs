use std::{fmt, str::FromStr};

use tracing::info;

use crate::{
    catalog::{Catalog, Course, Video},
    error::{Error, Result},
};

/// Position of an item inside a course: (chapter index, index within the chapter)
pub type Position = (usize, usize);

/// Linear scan across chapters in order, first match wins.
pub fn locate(course: &Course, video_id: &str) -> Option<Position> {
    course
        .course_content
        .iter()
        .enumerate()
        .find_map(|(ci, ch)| {
            let vi = ch.videos.iter().position(|v| v.id == video_id)?;
            Some((ci, vi))
        })
}

pub fn find_video<'a>(course: &'a Course, video_id: &str) -> Option<&'a Video> {
    let (ci, vi) = locate(course, video_id)?;
    course.course_content[ci].videos.get(vi)
}

/// The item after `video_id`: its chapter successor, otherwise the first item
/// of the next chapter that has one. `None` at the end of the course or for
/// an unknown id.
pub fn next_video<'a>(course: &'a Course, video_id: &str) -> Option<&'a Video> {
    let (ci, vi) = locate(course, video_id)?;
    if let Some(v) = course.course_content[ci].videos.get(vi + 1) {
        return Some(v);
    }
    let rest = &course.course_content[ci + 1..];
    rest.iter().find_map(|ch| ch.videos.first())
}

pub fn previous_video<'a>(course: &'a Course, video_id: &str) -> Option<&'a Video> {
    let (ci, vi) = locate(course, video_id)?;
    if vi > 0 {
        return course.course_content[ci].videos.get(vi - 1);
    }
    let earlier = &course.course_content[..ci];
    earlier.iter().rev().find_map(|ch| ch.videos.last())
}

/// `/course/{course_id}/video/{video_id}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub course_id: String,
    pub video_id: Option<String>,
}

impl Route {
    pub fn new(course_id: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            video_id: Some(video_id.into()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/course/{}", self.course_id)?;
        if let Some(video_id) = &self.video_id {
            write!(f, "/video/{}", video_id)?;
        }
        Ok(())
    }
}

impl FromStr for Route {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRoute(s.to_string());
        let parts = s.trim_matches('/').split('/').collect::<Vec<_>>();
        match parts.as_slice() {
            ["course", course_id] if !course_id.is_empty() => Ok(Self {
                course_id: course_id.to_string(),
                video_id: None,
            }),
            ["course", course_id, "video", video_id]
                if !course_id.is_empty() && !video_id.is_empty() =>
            {
                Ok(Self::new(*course_id, *video_id))
            }
            _ => Err(invalid()),
        }
    }
}

/// Where a route actually lands.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub course: &'a Course,
    pub video: &'a Video,
    /// Set when the requested video was missing or unknown and the route had
    /// to be rewritten to the course's first item.
    pub corrected: Option<Route>,
}

/// Resolve a course/video selection, falling back to the first chapter's first
/// item when the video id is absent or not part of the course.
pub fn resolve<'a>(
    catalog: &'a Catalog,
    course_id: &str,
    video_id: Option<&str>,
) -> Result<Resolved<'a>> {
    let course = catalog
        .course(course_id)
        .ok_or_else(|| Error::CourseNotFound(course_id.to_string()))?;
    if let Some(video) = video_id.and_then(|id| find_video(course, id)) {
        return Ok(Resolved {
            course,
            video,
            corrected: None,
        });
    }
    let first = course
        .first_video()
        .ok_or_else(|| Error::EmptyCourse(course_id.to_string()))?;
    let corrected = Route::new(&course.id, &first.id);
    info!("route for course {} corrected to {}", course_id, corrected);
    Ok(Resolved {
        course,
        video: first,
        corrected: Some(corrected),
    })
}

pub fn resolve_route<'a>(catalog: &'a Catalog, route: &Route) -> Result<Resolved<'a>> {
    resolve(catalog, &route.course_id, route.video_id.as_deref())
}
