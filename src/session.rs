use std::sync::Arc;

use tracing::{error, info};

use crate::{
    catalog::{Catalog, Course, MediaKind, Video},
    config::PlayerConfig,
    error::Error,
    navigation::{self, Position, Route},
    player::{MediaHost, PlaybackController, ProgressTick},
    progress::{CourseProgress, ProgressStore},
};

/// The course viewing page: one course, one selected item, the player and
/// the course's progress record.
#[derive(Debug)]
pub struct CourseSession<H: MediaHost> {
    catalog: Arc<Catalog>,
    store: Arc<ProgressStore>,
    course_id: String,
    course_index: usize,
    position: Position,
    corrected: Option<Route>,
    auto_advance: bool,
    player: PlaybackController<H>,
}

impl<H: MediaHost> CourseSession<H> {
    /// Open a course at a video, falling back to the first item when the
    /// video is missing or unknown. See [`CourseSession::corrected_route`].
    pub fn open(
        catalog: Arc<Catalog>,
        store: Arc<ProgressStore>,
        host: H,
        config: PlayerConfig,
        course_id: &str,
        video_id: Option<&str>,
    ) -> anyhow::Result<Self> {
        let resolved = navigation::resolve(&catalog, course_id, video_id)?;
        let video_id = resolved.video.id.clone();
        let corrected = resolved.corrected.clone();
        let course_index = catalog
            .courses()
            .iter()
            .position(|c| c.id == course_id)
            .ok_or_else(|| Error::CourseNotFound(course_id.to_string()))?;
        let auto_advance = config.auto_advance;
        let mut session = Self {
            course_id: course_id.to_string(),
            course_index,
            position: (0, 0),
            corrected,
            auto_advance,
            player: PlaybackController::new(host, config),
            catalog,
            store,
        };
        session.select(&video_id)?;
        Ok(session)
    }

    pub fn course(&self) -> &Course {
        &self.catalog.courses()[self.course_index]
    }

    pub fn current(&self) -> &Video {
        let (ci, vi) = self.position;
        &self.course().course_content[ci].videos[vi]
    }

    pub fn route(&self) -> Route {
        Route::new(&self.course_id, &self.current().id)
    }

    /// The route the page should be redirected to, if the requested one had
    /// to be corrected.
    pub fn corrected_route(&self) -> Option<&Route> {
        self.corrected.as_ref()
    }

    pub fn player(&self) -> &PlaybackController<H> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlaybackController<H> {
        &mut self.player
    }

    pub fn progress(&self) -> CourseProgress {
        self.store.get(&self.course_id)
    }

    pub fn is_completed(&self, video_id: &str) -> bool {
        self.progress().is_completed(video_id)
    }

    pub fn is_bookmarked(&self, video_id: &str) -> bool {
        self.progress().is_bookmarked(video_id)
    }

    pub fn select(&mut self, video_id: &str) -> anyhow::Result<()> {
        let course = self.course();
        let position = navigation::locate(course, video_id).ok_or_else(|| Error::VideoNotFound {
            course_id: self.course_id.clone(),
            video_id: video_id.to_string(),
        })?;
        let video = &course.course_content[position.0].videos[position.1];
        let (kind, path) = (video.kind, video.path.clone());
        match kind {
            MediaKind::Video => self.player.load(path),
            MediaKind::Document => self.player.unload(),
        }
        self.position = position;
        self.store.set_last_watched(&self.course_id, video_id)?;
        Ok(())
    }

    /// Forward a position report for the current item. Documents have no
    /// playback and ignore it. Returns whether the item just completed.
    pub fn on_progress(&mut self, tick: ProgressTick) -> anyhow::Result<bool> {
        if self.current().kind != MediaKind::Video {
            return Ok(false);
        }
        if self.player.on_progress(tick) {
            self.complete_current()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn on_ended(&mut self) -> anyhow::Result<bool> {
        if self.current().kind != MediaKind::Video {
            return Ok(false);
        }
        if self.player.on_ended() {
            self.complete_current()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Explicit "mark as complete", the only completion path for documents.
    pub fn mark_current_complete(&mut self) -> anyhow::Result<()> {
        self.complete_current()
    }

    fn complete_current(&mut self) -> anyhow::Result<()> {
        let video_id = self.current().id.clone();
        if let Err(e) = self.store.mark_complete(&self.course_id, &video_id) {
            error!("Error recording completion of {}: {}", self.route(), e);
            // let the next position report cross the threshold again
            self.player.clear_completed();
            return Err(e);
        }
        info!("completed {}", self.route());
        if self.auto_advance {
            self.advance()?;
        }
        Ok(())
    }

    /// The "next" affordance; `None` at the end of the course.
    pub fn next(&self) -> Option<&Video> {
        navigation::next_video(self.course(), &self.current().id)
    }

    pub fn previous(&self) -> Option<&Video> {
        navigation::previous_video(self.course(), &self.current().id)
    }

    /// Select the next item, returning its route.
    pub fn advance(&mut self) -> anyhow::Result<Option<Route>> {
        let Some(next_id) = self.next().map(|v| v.id.clone()) else {
            return Ok(None);
        };
        self.select(&next_id)?;
        Ok(Some(self.route()))
    }

    pub fn toggle_bookmark(&self, video_id: &str) -> anyhow::Result<bool> {
        self.store.toggle_bookmark(&self.course_id, video_id)
    }

    pub fn toggle_complete(&self, video_id: &str) -> anyhow::Result<bool> {
        self.store.toggle_complete(&self.course_id, video_id)
    }

    /// Leave the page, cancelling the player's timers.
    pub fn close(self) -> H {
        self.player.teardown()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::{
        catalog::tests::sample,
        player::tests::MockHost,
        progress::{MemoryBackend, ProgressBackend},
    };

    /// Memory storage whose writes fail while `failing` is set.
    struct FlakyBackend {
        inner: MemoryBackend,
        failing: Arc<AtomicBool>,
    }

    impl ProgressBackend for FlakyBackend {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("disk full");
            }
            self.inner.set(key, value)
        }

        fn keys(&self) -> anyhow::Result<Vec<String>> {
            self.inner.keys()
        }
    }

    fn open(
        video_id: Option<&str>,
        config: PlayerConfig,
    ) -> (CourseSession<MockHost>, Arc<ProgressStore>) {
        let store = Arc::new(ProgressStore::in_memory());
        let session = CourseSession::open(
            Arc::new(sample()),
            store.clone(),
            MockHost::default(),
            config,
            "rust-basics",
            video_id,
        )
        .unwrap();
        (session, store)
    }

    fn tick(played: f64) -> ProgressTick {
        ProgressTick {
            played,
            played_seconds: played * 90.0,
        }
    }

    #[test]
    fn completing_and_advancing() {
        let one_chapter = r#"[{"id":"c","title":"C","courseContent":[{"chapter":"Intro","videos":[
            {"id":"01","title":"One","duration":"1:30","path":"/c/01.mp4"},
            {"id":"02","title":"Two","duration":"0:45","path":"/c/02.mp4"}]}]}]"#;
        let catalog = Arc::new(Catalog::from_json(one_chapter).unwrap());
        assert_eq!(catalog.summaries()[0].total_duration.to_string(), "2:15");

        let store = Arc::new(ProgressStore::in_memory());
        let mut session = CourseSession::open(
            catalog,
            store.clone(),
            MockHost::default(),
            PlayerConfig::default(),
            "c",
            Some("01"),
        )
        .unwrap();
        session.player_mut().set_duration(90.0);
        assert!(!session.on_progress(tick(0.5)).unwrap());
        assert!(session.on_progress(tick(0.95)).unwrap());
        assert!(store.get("c").is_completed("01"));
        assert_eq!(session.current().id, "01");

        assert_eq!(session.advance().unwrap(), Some(Route::new("c", "02")));
        assert_eq!(session.player().url(), Some("/c/02.mp4"));
        assert_eq!(store.get("c").last_watched.unwrap().video_id, "02");
        assert_eq!(session.advance().unwrap(), None);
        assert_eq!(session.current().id, "02");
    }

    #[test]
    fn missing_video_is_corrected() {
        let (session, _) = open(None, PlayerConfig::default());
        assert_eq!(session.current().id, "01");
        assert_eq!(
            session.corrected_route(),
            Some(&Route::new("rust-basics", "01"))
        );
        let (session, _) = open(Some("03"), PlayerConfig::default());
        assert_eq!(session.corrected_route(), None);
        assert_eq!(session.route().to_string(), "/course/rust-basics/video/03");
    }

    #[test]
    fn auto_advance_follows_completion() {
        let config = PlayerConfig {
            auto_advance: true,
            ..Default::default()
        };
        let (mut session, store) = open(Some("02"), config);
        session.player_mut().set_duration(45.0);
        assert!(session.on_ended().unwrap());
        assert!(store.get("rust-basics").is_completed("02"));
        assert_eq!(session.current().id, "03");
    }

    #[test]
    fn documents_complete_only_when_marked() {
        let (mut session, store) = open(Some("04"), PlayerConfig::default());
        assert_eq!(session.current().kind, MediaKind::Document);
        assert!(!session.on_progress(tick(1.0)).unwrap());
        assert!(!session.is_completed("04"));
        session.mark_current_complete().unwrap();
        session.mark_current_complete().unwrap();
        let completed = store.get("rust-basics").completed_videos;
        assert_eq!(completed, vec!["04".to_string()]);
        assert_eq!(session.next().unwrap().id, "05");
        assert_eq!(session.previous().unwrap().id, "03");
    }

    #[test]
    fn selecting_a_document_unloads_the_player() {
        let (mut session, _) = open(Some("03"), PlayerConfig::default());
        session.player_mut().set_duration(600.0);
        assert!(session.on_progress(tick(0.95)).unwrap());
        session.select("04").unwrap();
        assert_eq!(session.player().url(), None);
        assert!(!session.player().is_completed());
        assert_eq!(session.player().duration(), None);
        session.select("05").unwrap();
        assert_eq!(session.player().url(), Some("/p/05.mp4"));
    }

    #[test]
    fn failed_completion_write_is_retried() {
        let failing = Arc::new(AtomicBool::new(false));
        let store = Arc::new(ProgressStore::new(FlakyBackend {
            inner: MemoryBackend::new(),
            failing: failing.clone(),
        }));
        let mut session = CourseSession::open(
            Arc::new(sample()),
            store.clone(),
            MockHost::default(),
            PlayerConfig::default(),
            "rust-basics",
            Some("01"),
        )
        .unwrap();
        session.player_mut().set_duration(90.0);

        failing.store(true, Ordering::SeqCst);
        assert!(session.on_progress(tick(0.95)).is_err());
        assert!(!session.player().is_completed());

        failing.store(false, Ordering::SeqCst);
        assert!(session.on_progress(tick(0.96)).unwrap());
        assert!(store.get("rust-basics").is_completed("01"));
    }

    #[test]
    fn toggles_go_through_the_store() {
        let (mut session, store) = open(Some("01"), PlayerConfig::default());
        assert!(session.toggle_bookmark("01").unwrap());
        assert!(session.is_bookmarked("01"));
        assert!(session.toggle_complete("02").unwrap());
        assert!(!session.toggle_complete("02").unwrap());
        assert!(!store.get("rust-basics").is_completed("02"));
        assert!(session.select("99").is_err());
        assert_eq!(session.current().id, "01");
        let host = session.close();
        assert!(host.seeks.is_empty());
    }
}
