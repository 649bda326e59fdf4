use tokio::sync::{mpsc, oneshot, watch};

use super::cursor::{clamp_rate, PlaybackState, PlaylistCursor};
use super::media::{MediaElement, MediaEvent, MediaListener, TaggedEvent};
use super::sequencer::{Sequencer, Tick};
use super::timer::Debounce;
use super::PlayerConfig;
use crate::model::{Course, ProgressPatch, UserId, VideoId};
use crate::progress::{ProgressIndex, ProgressWriter, SaveRequest};

#[derive(Debug)]
pub(super) enum Command {
    Select(VideoId),
    TogglePlayPause,
    Seek(f64),
    SetPlaybackRate(f64),
    ToggleMute,
    ToggleFullscreen,
    CancelCountdown,
    PlayNext,
    Restart,
    Snapshot(oneshot::Sender<PlaylistCursor>),
}

/// Where durable writes go. Absent when nobody is signed in.
#[derive(Debug)]
pub(super) struct Tracking {
    pub user: UserId,
    pub writer: ProgressWriter,
}

/// The player task. Owns the media element, the cursor and both timers;
/// everything reaches it as a message.
pub(super) struct Controller<M> {
    course: Course,
    media: M,
    index: ProgressIndex,
    tracking: Option<Tracking>,

    cursor: PlaylistCursor,
    published: watch::Sender<PlaylistCursor>,

    generation: u64,
    events_tx: mpsc::UnboundedSender<TaggedEvent>,
    events: mpsc::UnboundedReceiver<TaggedEvent>,
    commands: mpsc::UnboundedReceiver<Command>,

    debounce: Debounce,
    sequencer: Sequencer,
}

impl<M: MediaElement> Controller<M> {
    pub fn new(
        course: Course,
        media: M,
        index: ProgressIndex,
        tracking: Option<Tracking>,
        config: &PlayerConfig,
        commands: mpsc::UnboundedReceiver<Command>,
        published: watch::Sender<PlaylistCursor>,
    ) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();

        Self {
            course,
            media,
            index,
            tracking,
            cursor: PlaylistCursor::default(),
            published,
            generation: 0,
            events_tx,
            events,
            commands,
            debounce: Debounce::new(config.debounce, config.max_wait),
            sequencer: Sequencer::new(config.countdown_ticks, config.countdown_tick),
        }
    }

    /// Runs until every command sender is gone, then flushes and tears down.
    pub async fn run(mut self) {
        tracing::debug!(course.id = %self.course.id, "player started");

        loop {
            tokio::select! {
                biased;

                Some(tagged) = self.events.recv() => self.on_media_event(tagged),
                _ = self.debounce.fired() => self.save_now(),
                tick = self.sequencer.next_tick() => self.on_countdown(tick),
                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }

            self.publish();
        }

        self.teardown();
        self.publish();

        if let Some(Tracking { writer, .. }) = self.tracking.take() {
            writer.close().await;
        }

        tracing::debug!(course.id = %self.course.id, "player stopped");
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Select(video) => self.select_video(video),
            Command::TogglePlayPause => self.toggle_play_pause(),
            Command::Seek(delta) => self.seek(delta),
            Command::SetPlaybackRate(rate) => self.set_playback_rate(rate),
            Command::ToggleMute => {
                self.cursor.is_muted = !self.cursor.is_muted;
                self.media.set_muted(self.cursor.is_muted);
            }
            Command::ToggleFullscreen => {
                self.cursor.is_fullscreen = !self.cursor.is_fullscreen;
                self.media.set_fullscreen(self.cursor.is_fullscreen);
            }
            Command::CancelCountdown => self.cancel_countdown(),
            Command::PlayNext => self.play_next(),
            Command::Restart => self.restart(),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.cursor.clone());
            }
        }
    }

    fn select_video(&mut self, video: VideoId) {
        let Some(lecture) = self.course.lecture(&video).cloned() else {
            tracing::warn!(course.id = %self.course.id, video.id = %video, "not a lecture of this course");
            return;
        };

        // a manual pick always wins over a running countdown
        self.cancel_countdown();
        self.teardown();

        self.generation += 1;
        let listener = MediaListener::new(video.clone(), self.generation, self.events_tx.clone());

        self.cursor.reset_for(video);
        self.media.load(&lecture.media_url, listener);
        self.media.set_muted(self.cursor.is_muted);
        self.media.set_playback_rate(self.cursor.playback_rate);
        self.media.set_fullscreen(self.cursor.is_fullscreen);

        tracing::info!(video.id = %lecture.id, url = %lecture.media_url, "loading lecture");
    }

    /// Releases the active resource, flushing its progress first.
    fn teardown(&mut self) {
        self.sequencer.cancel();
        self.cursor.set_countdown(None);

        if self.cursor.selected_video_id.is_none() {
            return;
        }

        let unsaved = self.debounce.cancel();
        if self.cursor.state == PlaybackState::Playing || (unsaved && self.cursor.state.is_loaded()) {
            self.refresh_time();
            self.save_now();
        }

        self.media.unload();
    }

    fn toggle_play_pause(&mut self) {
        match self.cursor.state {
            PlaybackState::Paused | PlaybackState::Ended => self.play(),
            PlaybackState::Playing => {
                self.media.pause();
                self.refresh_time();
                self.cursor.set_state(PlaybackState::Paused);
                self.save_now();
            }
            PlaybackState::Idle | PlaybackState::Loading => {
                tracing::debug!(state = ?self.cursor.state, "nothing to play yet");
            }
        }
    }

    fn play(&mut self) {
        self.cancel_countdown();

        match self.media.play() {
            Ok(()) => self.cursor.set_state(PlaybackState::Playing),
            Err(blocked) => {
                tracing::warn!(video.id = ?self.cursor.selected_video_id, %blocked, "play was rejected");
            }
        }
    }

    fn seek(&mut self, delta: f64) {
        if !self.cursor.state.is_loaded() || !delta.is_finite() {
            return;
        }

        let mut target = (self.media.current_time() + delta).max(0.0);
        if let Some(duration) = self.cursor.duration {
            target = target.min(duration);
        }

        self.cancel_countdown();
        self.media.seek(target);
        self.cursor.current_time = target;

        if self.cursor.state == PlaybackState::Ended {
            self.cursor.set_state(PlaybackState::Paused);
        }

        self.debounce.schedule();
    }

    fn set_playback_rate(&mut self, rate: f64) {
        let Some(rate) = clamp_rate(rate) else {
            tracing::debug!(rate, "ignoring playback rate");
            return;
        };

        self.cancel_countdown();
        self.cursor.playback_rate = rate;
        self.media.set_playback_rate(rate);
    }

    fn restart(&mut self) {
        if !self.cursor.state.is_loaded() {
            return;
        }

        self.media.seek(0.0);
        self.cursor.current_time = 0.0;
        self.play();
        self.debounce.schedule();
    }

    fn cancel_countdown(&mut self) {
        if self.sequencer.cancel() {
            tracing::debug!(video.id = ?self.cursor.selected_video_id, "autoplay cancelled");
        }
        self.cursor.set_countdown(None);
    }

    fn play_next(&mut self) {
        if !self.sequencer.is_active() {
            tracing::debug!("no countdown to skip");
            return;
        }

        self.cancel_countdown();
        self.advance();
    }

    fn on_countdown(&mut self, tick: Tick) {
        match tick {
            Tick::Remaining(remaining) => self.cursor.set_countdown(Some(remaining)),
            Tick::Expired => {
                self.cursor.set_countdown(None);
                self.advance();
            }
        }
    }

    fn advance(&mut self) {
        let Some(current) = self.cursor.selected_video_id.as_ref() else {
            return;
        };

        match self.course.next_after(current) {
            Some(next) => {
                tracing::info!(from = %current, to = %next.id, "autoplay advancing");
                let next = next.id.clone();
                self.select_video(next);
            }
            None => tracing::info!(course.id = %self.course.id, "reached the end of the course"),
        }
    }

    fn on_media_event(&mut self, tagged: TaggedEvent) {
        let TaggedEvent {
            video,
            generation,
            event,
        } = tagged;

        if generation != self.generation {
            tracing::debug!(video.id = %video, ?event, "dropping event from a released resource");
            return;
        }

        match (event, self.cursor.state) {
            (MediaEvent::LoadedMetadata { duration }, state) => self.on_metadata(&video, duration, state),
            (_, PlaybackState::Idle | PlaybackState::Loading) => {}

            (MediaEvent::TimeUpdate { current_time }, _) => {
                if current_time.is_finite() {
                    self.cursor.current_time = current_time.max(0.0);
                    self.debounce.schedule();
                }
            }

            (MediaEvent::Play, PlaybackState::Paused | PlaybackState::Ended) => {
                self.cancel_countdown();
                self.cursor.set_state(PlaybackState::Playing);
            }
            (MediaEvent::Pause, PlaybackState::Playing) => {
                self.refresh_time();
                self.cursor.set_state(PlaybackState::Paused);
                self.save_now();
            }
            (MediaEvent::Ended, PlaybackState::Playing) => self.on_ended(&video),

            (event, state) => tracing::trace!(?event, ?state, "event does not change state"),
        }
    }

    fn on_metadata(&mut self, video: &VideoId, reported: f64, state: PlaybackState) {
        let duration = self.index.learn_duration(video, reported);
        self.cursor.duration = duration;

        if state != PlaybackState::Loading {
            return;
        }

        let stored = self
            .index
            .get(video)
            .map(|state| state.current_time)
            .unwrap_or_default();

        if stored > 0.0 && duration.map_or(true, |duration| stored < duration) {
            tracing::debug!(video.id = %video, at = stored, "resuming");
            self.media.seek(stored);
            self.cursor.current_time = stored;
        }

        self.cursor.set_state(PlaybackState::Paused);
    }

    fn on_ended(&mut self, video: &VideoId) {
        self.cursor.current_time = self
            .cursor
            .duration
            .unwrap_or_else(|| self.media.current_time());
        self.cursor.set_state(PlaybackState::Ended);
        self.save_now();

        tracing::info!(video.id = %video, "lecture finished");

        match self.sequencer.start() {
            Tick::Remaining(remaining) => self.cursor.set_countdown(Some(remaining)),
            Tick::Expired => self.advance(),
        }
    }

    fn refresh_time(&mut self) {
        if self.cursor.state.is_loaded() {
            let time = self.media.current_time();
            if time.is_finite() {
                self.cursor.current_time = time;
            }
        }
    }

    /// Records the current position locally and queues the durable write.
    fn save_now(&mut self) {
        self.debounce.cancel();

        let Some(video) = self.cursor.selected_video_id.clone() else {
            return;
        };
        if !self.cursor.state.is_loaded() {
            return;
        }

        let patch = ProgressPatch::snapshot(
            self.cursor.current_time,
            self.index.duration(&video).or(self.cursor.duration),
            self.cursor.state == PlaybackState::Ended,
        );
        self.index.record(&video, &patch);

        if let Some(Tracking { user, writer }) = &self.tracking {
            writer.submit(SaveRequest::new(user.clone(), video, patch));
        }
    }

    fn publish(&self) {
        self.published.send_if_modified(|published| {
            let changed = *published != self.cursor;
            if changed {
                *published = self.cursor.clone();
            }
            changed
        });
    }
}
