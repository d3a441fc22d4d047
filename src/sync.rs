pub mod filename;

use std::{
    cmp::Ordering,
    collections::BTreeSet,
    io::Write,
    path::{Path, PathBuf},
};

use tracing::{error, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{
    catalog::{Catalog, Chapter, ClockDuration, Course, Video},
    config::SyncConfig,
    error::Error,
    utils::natural_cmp,
};

use filename::{media_kind, parse_duration, parse_id, parse_title, slugify};

const DESCRIPTION_FILE: &str = "description.txt";

fn by_name(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a = a.file_name().to_string_lossy();
    let b = b.file_name().to_string_lossy();
    natural_cmp(&a, &b)
}

/// Immediate children of `dir`, in natural name order.
fn children(dir: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by(by_name)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                error!("walkdir error: {}", e);
                None
            }
        })
}

fn url_join(parts: &[&str]) -> String {
    let mut url = parts[0].trim_end_matches('/').to_string();
    for part in &parts[1..] {
        url.push('/');
        url.push_str(part.trim_matches('/'));
    }
    url
}

fn scan_chapter(course_title: &str, chapter_dir: &Path, config: &SyncConfig) -> Vec<Video> {
    let chapter_name = chapter_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    children(chapter_dir)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let file_name = entry.file_name().to_string_lossy().to_string();
            let kind = Path::new(&file_name)
                .extension()
                .and_then(|ext| media_kind(&ext.to_string_lossy()))?;
            Some(Video {
                id: parse_id(&file_name),
                title: parse_title(&file_name),
                duration: parse_duration(&file_name),
                path: url_join(&[
                    config.media_prefix.as_str(),
                    course_title,
                    chapter_name.as_str(),
                    file_name.as_str(),
                ]),
                kind,
                description: None,
                resources: vec![],
            })
        })
        .collect()
}

/// Build one course from its folder. `None` when the folder holds no media.
pub fn scan_course(course_dir: &Path, config: &SyncConfig) -> anyhow::Result<Option<Course>> {
    let Some(name) = course_dir.file_name() else {
        anyhow::bail!("invalid course dir: {}", course_dir.display());
    };
    let title = name.to_string_lossy().to_string();
    let id = slugify(&title);
    info!("Scanning course {} from {}", id, course_dir.display());

    let mut course_content = Vec::new();
    for entry in children(course_dir).filter(|e| e.file_type().is_dir()) {
        let chapter = entry.file_name().to_string_lossy().to_string();
        let videos = scan_chapter(&title, entry.path(), config);
        if videos.is_empty() {
            warn!("skip chapter without media: {}", entry.path().display());
            continue;
        }
        course_content.push(Chapter {
            id: Some(slugify(&chapter)),
            chapter,
            videos,
        });
    }
    if course_content.is_empty() {
        warn!("skip course without media: {}", course_dir.display());
        return Ok(None);
    }

    let mut seen = BTreeSet::new();
    for video in course_content.iter().flat_map(|ch| &ch.videos) {
        if video.id.is_empty() {
            warn!("{}: no numeric id prefix in {}", id, video.path);
        } else if !seen.insert(video.id.clone()) {
            warn!("{}: duplicate video id {}", id, video.id);
        }
    }

    let description = match std::fs::read_to_string(course_dir.join(DESCRIPTION_FILE)) {
        Ok(s) => s.trim().to_string(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let total: ClockDuration = course_content
        .iter()
        .flat_map(|ch| &ch.videos)
        .map(Video::clock_duration)
        .sum();
    let total_videos = course_content.iter().map(|ch| ch.videos.len()).sum();
    let thumbnail_prefix = config.thumbnail_prefix.as_str();
    let thumbnail_url = url_join(&[thumbnail_prefix, title.as_str(), "thumbnail.jpg"]);

    Ok(Some(Course {
        thumbnail_url,
        id,
        title,
        description,
        course_content,
        duration: Some(total.to_string()),
        total_videos: Some(total_videos),
    }))
}

/// Scan every course folder under `base`. Fails before touching anything if
/// `base` is not a directory.
pub fn scan(base: &Path, config: &SyncConfig) -> anyhow::Result<Catalog> {
    if !base.is_dir() {
        return Err(Error::BaseFolderMissing(base.display().to_string()).into());
    }
    let mut courses = Vec::new();
    for entry in children(base).filter(|e| e.file_type().is_dir()) {
        if let Some(course) = scan_course(entry.path(), config)? {
            courses.push(course);
        }
    }
    let catalog = Catalog::new(courses);
    for problem in catalog.validate() {
        warn!("catalog: {}", problem);
    }
    Ok(catalog)
}

/// Replace `output` with the catalog document in one rename, so readers see
/// either the old or the new document.
pub fn write_catalog(catalog: &Catalog, output: &Path) -> anyhow::Result<()> {
    let dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(catalog.to_json()?.as_bytes())?;
    tmp.persist(output)?;
    Ok(())
}

/// Scan `base` and write the catalog to `output`.
pub fn sync(base: &Path, output: &Path, config: &SyncConfig) -> anyhow::Result<Catalog> {
    let catalog = scan(base, config)?;
    write_catalog(&catalog, output)?;
    info!(
        "Saved {} with {} courses",
        output.display(),
        catalog.courses().len()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::catalog::MediaKind;

    fn touch(path: PathBuf) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let course = dir.path().join("Rust Basics");
        touch(course.join("1. Intro").join("01. Welcome (1_30).mp4"));
        touch(course.join("1. Intro").join("02. Setup (0_45).mp4"));
        touch(course.join("1. Intro").join("notes.txt"));
        touch(course.join("10. Wrap up").join("05. Next steps (2_0).mp4"));
        touch(course.join("2. Ownership").join("04. Cheat sheet.pdf"));
        touch(course.join("2. Ownership").join("03. Moves (10_00).mp4"));
        touch(course.join("thumbnail.jpg"));
        fs::create_dir_all(course.join("3. Empty")).unwrap();
        fs::write(course.join(DESCRIPTION_FILE), "From zero to cargo\n").unwrap();
        fs::create_dir_all(dir.path().join("Nothing Here").join("Chapter")).unwrap();
        dir
    }

    #[test]
    fn scans_course_tree() {
        let dir = fixture();
        let catalog = scan(dir.path(), &SyncConfig::default()).unwrap();
        assert_eq!(catalog.courses().len(), 1);
        let course = &catalog.courses()[0];
        assert_eq!(course.id, "rust-basics");
        assert_eq!(course.description, "From zero to cargo");
        assert_eq!(course.thumbnail_url, "/courses/Rust Basics/thumbnail.jpg");
        let chapters = course.course_content.iter().map(|c| c.chapter.as_str());
        let chapters = chapters.collect::<Vec<_>>();
        assert_eq!(chapters, vec!["1. Intro", "2. Ownership", "10. Wrap up"]);

        let ids = course.videos().map(|v| v.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["01", "02", "03", "04", "05"]);
        let welcome = course.find_video("01").unwrap();
        assert_eq!(welcome.title, "Welcome");
        assert_eq!(welcome.duration, "1:30");
        assert_eq!(
            welcome.path,
            "/public/courses/Rust Basics/1. Intro/01. Welcome (1_30).mp4"
        );
        let sheet = course.find_video("04").unwrap();
        assert_eq!(sheet.kind, MediaKind::Document);
        assert_eq!(sheet.duration, "");
        assert_eq!(course.find_video("05").unwrap().duration, "2:00");

        assert_eq!(course.duration.as_deref(), Some("14:15"));
        assert_eq!(course.total_videos, Some(5));
    }

    #[test]
    fn sync_writes_document_the_player_reads() {
        let dir = fixture();
        let output = dir.path().join("out").join("allCourses.json");
        let config = SyncConfig {
            media_prefix: "/media/".to_string(),
            ..Default::default()
        };
        let written = sync(dir.path(), &output, &config).unwrap();
        let json = fs::read_to_string(&output).unwrap();
        let read = Catalog::from_json(&json).unwrap();
        assert_eq!(read, written);
        let mut paths = read.courses()[0].videos().map(|v| v.path.as_str());
        assert!(paths.all(|p| p.starts_with("/media/Rust Basics/")));
    }

    #[test]
    fn missing_base_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("allCourses.json");
        let missing = dir.path().join("missing");
        let config = SyncConfig::default();
        let err = sync(&missing, &output, &config).unwrap_err();
        let err = err.downcast_ref::<Error>();
        assert!(matches!(err, Some(Error::BaseFolderMissing(_))));
        assert!(!output.exists());
    }
}
