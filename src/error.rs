#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Course not found: {0}")]
    CourseNotFound(String),
    #[error("Video not found: {video_id} in course {course_id}")]
    VideoNotFound { course_id: String, video_id: String },
    #[error("Course has no playable content: {0}")]
    EmptyCourse(String),
    #[error("Base courses folder not found: {0}")]
    BaseFolderMissing(String),
    #[error("Invalid duration: {0:?}")]
    InvalidDuration(String),
    #[error("Invalid route: {0:?}")]
    InvalidRoute(String),
    #[error("Cannot seek before the media duration is known")]
    SeekUnavailable,
    #[error("Unsupported playback rate: {0}")]
    UnsupportedRate(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
