pub mod controls;
pub mod shortcuts;

use std::time::Instant;

use tracing::{debug, error, warn};

pub use controls::ControlsTimer;
pub use shortcuts::{FocusContext, Shortcut};

use crate::{
    config::PlayerConfig,
    error::{Error, Result},
};

/// Playback rates offered by the rate menu
pub const PLAYBACK_RATES: [f64; 7] = [0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Fraction treated as "reached the end of the stream"
pub const END_OF_STREAM: f64 = 0.999;

/// The playback element the controller drives.
pub trait MediaHost {
    /// Move the playhead to a fraction of the duration.
    fn seek_to(&mut self, fraction: f64);
    fn request_fullscreen(&mut self) -> anyhow::Result<()>;
    fn exit_fullscreen(&mut self) -> anyhow::Result<()>;
    /// Give keyboard focus back to the player surface.
    fn focus_surface(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// When an item counts as watched
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionRule {
    Threshold(f64),
    EndOfStream,
}

impl CompletionRule {
    pub fn from_threshold(threshold: f64) -> Self {
        if threshold >= END_OF_STREAM {
            Self::EndOfStream
        } else {
            Self::Threshold(threshold.max(0.0))
        }
    }

    pub fn reached(&self, fraction: f64) -> bool {
        match self {
            Self::Threshold(t) => fraction >= *t,
            Self::EndOfStream => fraction >= END_OF_STREAM,
        }
    }
}

/// Periodic position report from the playback element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressTick {
    /// Watched fraction in `[0, 1]`
    pub played: f64,
    pub played_seconds: f64,
}

type CompletionCallback = Box<dyn FnMut() + Send>;

/// Transport state machine wrapped around a [`MediaHost`].
///
/// `Idle → Playing ⇄ Paused`, with orthogonal seeking, completed and
/// controls-visible flags. Completion is edge-triggered: the callback fires
/// when the watched fraction crosses the [`CompletionRule`], and again only
/// after the playhead has gone back below it.
pub struct PlaybackController<H: MediaHost> {
    host: H,
    config: PlayerConfig,
    rule: CompletionRule,
    url: Option<String>,
    state: PlaybackState,
    seeking: bool,
    completed: bool,
    played: f64,
    current_time: f64,
    duration: Option<f64>,
    volume: f64,
    muted: bool,
    fullscreen: bool,
    rate: f64,
    rate_menu_open: bool,
    controls: ControlsTimer,
    on_complete: Option<CompletionCallback>,
}

impl<H: MediaHost> std::fmt::Debug for PlaybackController<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("url", &self.url)
            .field("state", &self.state)
            .field("seeking", &self.seeking)
            .field("completed", &self.completed)
            .field("played", &self.played)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

impl<H: MediaHost> PlaybackController<H> {
    pub fn new(host: H, config: PlayerConfig) -> Self {
        Self {
            host,
            rule: CompletionRule::from_threshold(config.completion_threshold),
            url: None,
            state: PlaybackState::Idle,
            seeking: false,
            completed: false,
            played: 0.0,
            current_time: 0.0,
            duration: None,
            volume: config.initial_volume.clamp(0.0, 1.0),
            muted: config.initial_muted,
            fullscreen: false,
            rate: 1.0,
            rate_menu_open: false,
            controls: ControlsTimer::new(config.hide_controls_after()),
            on_complete: None,
            config,
        }
    }

    pub fn on_complete(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn played(&self) -> f64 {
        self.played
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    pub fn is_rate_menu_open(&self) -> bool {
        self.rate_menu_open
    }

    pub fn controls_visible(&self) -> bool {
        self.controls.is_visible()
    }

    /// When the controls hide next, for hosts that schedule a real timer.
    pub fn controls_deadline(&self) -> Option<Instant> {
        self.controls.deadline()
    }

    /// `elapsed / total` as shown under the seek bar.
    pub fn time_label(&self) -> String {
        format!(
            "{} / {}",
            crate::catalog::format_clock(self.current_time),
            crate::catalog::format_clock(self.duration.unwrap_or(f64::NAN))
        )
    }

    /// Start a new item; position, duration and completion start over.
    pub fn load(&mut self, url: impl Into<String>) {
        let url = url.into();
        debug!("load media {}", url);
        self.reset();
        self.url = Some(url);
        self.state = if self.config.autoplay {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        };
    }

    /// Drop the current item, e.g. while a document is shown instead.
    pub fn unload(&mut self) {
        if let Some(url) = &self.url {
            debug!("unload media {}", url);
        }
        self.reset();
        self.url = None;
        self.state = PlaybackState::Idle;
    }

    fn reset(&mut self) {
        if self.seeking {
            // a drag cut short by a new item never reaches seek_end
            self.controls.cancel();
        }
        self.played = 0.0;
        self.current_time = 0.0;
        self.duration = None;
        self.seeking = false;
        self.completed = false;
    }

    pub fn set_duration(&mut self, secs: f64) {
        self.duration = (secs.is_finite() && secs > 0.0).then_some(secs);
    }

    /// `Playing ⇄ Paused`; `Idle` starts playing. Ignored while seeking.
    pub fn toggle_play(&mut self) -> PlaybackState {
        if self.seeking {
            return self.state;
        }
        self.state = match self.state {
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Idle | PlaybackState::Paused => PlaybackState::Playing,
        };
        self.state
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn seek_start(&mut self) -> Result<()> {
        if self.duration.is_none() {
            return Err(Error::SeekUnavailable);
        }
        self.seeking = true;
        self.controls.suspend();
        Ok(())
    }

    /// Scrub preview; the playhead itself is not moved until [`Self::seek_end`].
    pub fn seek_change(&mut self, fraction: f64) {
        if !self.seeking {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        self.played = fraction;
        self.current_time = fraction * self.duration.unwrap_or(0.0);
    }

    /// Commit the scrub with one authoritative seek. Returns whether the
    /// completion callback fired.
    pub fn seek_end(&mut self, fraction: f64, now: Instant) -> Result<bool> {
        self.seeking = false;
        let Some(duration) = self.duration else {
            return Err(Error::SeekUnavailable);
        };
        let fraction = fraction.clamp(0.0, 1.0);
        self.host.seek_to(fraction);
        self.played = fraction;
        self.current_time = fraction * duration;
        self.controls.show(now);
        self.host.focus_surface();
        Ok(self.observe(fraction))
    }

    /// Relative seek in seconds, clamped to the media bounds. Ignored while
    /// a scrub is in progress.
    pub fn seek_by(&mut self, delta_secs: f64) -> Result<bool> {
        if self.seeking {
            return Ok(false);
        }
        let duration = self.duration.ok_or(Error::SeekUnavailable)?;
        let target = (self.current_time + delta_secs).clamp(0.0, duration);
        let fraction = target / duration;
        self.host.seek_to(fraction);
        self.played = fraction;
        self.current_time = target;
        Ok(self.observe(fraction))
    }

    /// Position report. Dropped while seeking so the scrub handle doesn't
    /// jitter. Returns whether the completion callback fired.
    pub fn on_progress(&mut self, tick: ProgressTick) -> bool {
        if self.seeking {
            return false;
        }
        self.played = tick.played.clamp(0.0, 1.0);
        self.current_time = tick.played_seconds.max(0.0);
        self.observe(self.played)
    }

    /// The stream ran out. Dropped while seeking; `seek_end` decides.
    pub fn on_ended(&mut self) -> bool {
        if self.seeking {
            return false;
        }
        self.state = PlaybackState::Paused;
        self.played = 1.0;
        if let Some(duration) = self.duration {
            self.current_time = duration;
        }
        self.observe(1.0)
    }

    /// Forget the last completion edge so the next crossing fires again.
    pub fn clear_completed(&mut self) {
        self.completed = false;
    }

    fn observe(&mut self, fraction: f64) -> bool {
        if !self.rule.reached(fraction) {
            if self.completed {
                debug!("playhead moved back below completion at {:.3}", fraction);
                self.completed = false;
            }
            return false;
        }
        if self.completed {
            return false;
        }
        self.completed = true;
        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
        true
    }

    /// Values above zero unmute, exactly zero mutes.
    pub fn set_volume(&mut self, volume: f64) {
        let volume = (volume.clamp(0.0, 1.0) * 100.0).round() / 100.0;
        self.volume = volume;
        self.muted = volume == 0.0;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        if !self.muted && self.volume == 0.0 {
            self.volume = self.config.initial_volume.clamp(0.0, 1.0);
        }
    }

    pub fn volume_up(&mut self) {
        self.set_volume(self.volume + self.config.volume_step);
    }

    pub fn volume_down(&mut self) {
        self.set_volume(self.volume - self.config.volume_step);
    }

    /// A refused fullscreen request is logged and leaves the player windowed.
    pub fn toggle_fullscreen(&mut self) -> bool {
        if self.fullscreen {
            if let Err(e) = self.host.exit_fullscreen() {
                warn!("Error attempting to exit fullscreen: {}", e);
            }
            self.fullscreen = false;
        } else {
            match self.host.request_fullscreen() {
                Ok(()) => self.fullscreen = true,
                Err(e) => {
                    error!("Error attempting to enable fullscreen: {}", e);
                    self.fullscreen = false;
                }
            }
        }
        self.fullscreen
    }

    /// The host left or entered fullscreen on its own (e.g. Escape).
    pub fn fullscreen_changed(&mut self, active: bool) {
        self.fullscreen = active;
    }

    pub fn toggle_rate_menu(&mut self) {
        self.rate_menu_open = !self.rate_menu_open;
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        let rate = PLAYBACK_RATES
            .iter()
            .copied()
            .find(|r| (r - rate).abs() < 1e-9)
            .ok_or(Error::UnsupportedRate(rate))?;
        self.rate = rate;
        self.rate_menu_open = false;
        Ok(())
    }

    /// Keyboard shortcut dispatch. Returns whether the key was consumed.
    pub fn handle_key(&mut self, code: &str, focus: FocusContext, now: Instant) -> bool {
        if !focus.allows_shortcuts() {
            return false;
        }
        let Some(shortcut) = Shortcut::from_code(code) else {
            return false;
        };
        let step = self.config.seek_step_secs;
        match shortcut {
            Shortcut::TogglePlay => {
                self.toggle_play();
            }
            Shortcut::SeekBackward | Shortcut::SeekForward => {
                let delta = match shortcut {
                    Shortcut::SeekBackward => -step,
                    _ => step,
                };
                if let Err(e) = self.seek_by(delta) {
                    debug!("seek shortcut ignored: {}", e);
                }
            }
            Shortcut::VolumeUp => self.volume_up(),
            Shortcut::VolumeDown => self.volume_down(),
            Shortcut::ToggleMute => self.toggle_mute(),
            Shortcut::ToggleFullscreen => {
                self.toggle_fullscreen();
            }
        }
        self.controls.show(now);
        true
    }

    pub fn pointer_moved(&mut self, now: Instant) {
        self.controls.show(now);
    }

    /// Drive the controls hide timer. Returns whether controls are visible.
    pub fn tick_timers(&mut self, now: Instant) -> bool {
        self.controls.poll(now, self.seeking)
    }

    /// Cancel the pending hide timer and hand the host back.
    pub fn teardown(mut self) -> H {
        self.release();
        self.host
    }

    fn release(&mut self) {
        self.controls.cancel();
        self.on_complete = None;
    }
}
