//! The lecture player: one media resource, driven by a single task.
//!
//! [PlayerHandle::spawn] starts the task; the handle sends it commands and
//! exposes the [PlaylistCursor] through a `watch` channel. Media events
//! reach the task through the [MediaListener] attached to the resource that
//! is currently loaded, so nothing needs a lock.

use std::time::Duration;

use snafu::Snafu;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::model::{Course, UserId, VideoId};
use crate::progress::{ProgressIndex, ProgressStore, ProgressWriter};

use controller::{Command, Controller, Tracking};

mod controller;
mod cursor;
mod media;
mod sequencer;
mod timer;

#[cfg(test)]
pub(crate) mod testing;


pub use cursor::{clamp_rate, PlaybackState, PlaylistCursor, MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE};
pub use media::{MediaElement, MediaEvent, MediaListener, PlaybackBlocked};
pub use sequencer::{Countdown, Sequencer, Tick};
pub use timer::{Debounce, Ticker};

pub type Result<T, E = PlayerError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum PlayerError {
    /// The player task has already stopped.
    #[snafu(display("player is closed"))]
    Closed,
}

/// Timing knobs of a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Quiet period before a burst of time updates is written.
    pub debounce: Duration,
    /// Longest a continuous burst can hold a write back.
    pub max_wait: Duration,
    pub countdown_ticks: u32,
    pub countdown_tick: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(3),
            max_wait: Duration::from_secs(15),
            countdown_ticks: 10,
            countdown_tick: Duration::from_secs(1),
        }
    }
}

/// Owner of a running player.
///
/// Dropping the handle stops the player as well; [PlayerHandle::shutdown]
/// additionally waits until the final progress write was attempted.
#[derive(Debug)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<Command>,
    cursor: watch::Receiver<PlaylistCursor>,
    index: ProgressIndex,
    task: JoinHandle<()>,
}

impl PlayerHandle {
    /// Starts a player for `course` with nothing selected.
    ///
    /// Without a `user` the player still plays and keeps `index` current,
    /// but nothing is written to `store`.
    pub fn spawn<M, S>(
        course: Course,
        user: Option<UserId>,
        store: S,
        media: M,
        index: ProgressIndex,
        config: &PlayerConfig,
    ) -> Self
    where
        M: MediaElement,
        S: ProgressStore,
    {
        let (commands, rx) = mpsc::unbounded_channel();
        let (published, cursor) = watch::channel(PlaylistCursor::default());

        let tracking = match user {
            Some(user) => Some(Tracking {
                user,
                writer: ProgressWriter::spawn(store),
            }),
            None => {
                tracing::info!(course.id = %course.id, "no user, progress tracking disabled");
                None
            }
        };

        let controller = Controller::new(course, media, index.clone(), tracking, config, rx, published);
        let task = tokio::spawn(controller.run());

        Self {
            commands,
            cursor,
            index,
            task,
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| PlayerError::Closed)
    }

    pub fn select_video(&self, video: VideoId) -> Result<()> {
        self.send(Command::Select(video))
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(Command::TogglePlayPause)
    }

    /// Moves the position by `delta` seconds, clamped to the media.
    pub fn seek(&self, delta: f64) -> Result<()> {
        self.send(Command::Seek(delta))
    }

    pub fn set_playback_rate(&self, rate: f64) -> Result<()> {
        self.send(Command::SetPlaybackRate(rate))
    }

    pub fn toggle_mute(&self) -> Result<()> {
        self.send(Command::ToggleMute)
    }

    pub fn toggle_fullscreen(&self) -> Result<()> {
        self.send(Command::ToggleFullscreen)
    }

    pub fn cancel_countdown(&self) -> Result<()> {
        self.send(Command::CancelCountdown)
    }

    /// Skips the rest of a running countdown. Ignored when none is running.
    pub fn play_next(&self) -> Result<()> {
        self.send(Command::PlayNext)
    }

    /// Re-watch from the start.
    pub fn restart(&self) -> Result<()> {
        self.send(Command::Restart)
    }

    /// The cursor once every command sent before this call has been handled.
    pub async fn snapshot(&self) -> Result<PlaylistCursor> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;

        rx.await.map_err(|_| PlayerError::Closed)
    }

    pub fn cursor(&self) -> watch::Receiver<PlaylistCursor> {
        self.cursor.clone()
    }

    pub fn index(&self) -> &ProgressIndex {
        &self.index
    }

    /// Flushes the active video, clears both timers and waits for the writes to land.
    pub async fn shutdown(self) {
        let Self { commands, task, .. } = self;
        drop(commands);

        if let Err(error) = task.await {
            tracing::error!(%error, "player task failed");
        }
    }
}
