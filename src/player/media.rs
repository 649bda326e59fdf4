use snafu::Snafu;
use tokio::sync::mpsc;
use url::Url;

use crate::model::VideoId;

/// Native media notifications the player reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    Play,
    Pause,
    /// End of media. Bindings report it while still playing, without a `Pause` in front of it.
    Ended,
    TimeUpdate { current_time: f64 },
    LoadedMetadata { duration: f64 },
}

/// The host refused to start playback, usually an autoplay policy.
#[derive(Debug, Clone, Snafu)]
#[snafu(display("playback was blocked: {reason}"))]
pub struct PlaybackBlocked {
    pub reason: String,
}

/// The single media resource a player drives.
///
/// Implementations bind the host's native playback facility. Commands are
/// fire-and-forget; state changes come back through the [MediaListener]
/// handed to [MediaElement::load].
pub trait MediaElement: Send + 'static {
    /// Attaches `url` and starts delivering its events to `listener`.
    fn load(&mut self, url: &Url, listener: MediaListener);

    /// Releases the current resource and drops its listener.
    fn unload(&mut self);

    fn play(&mut self) -> Result<(), PlaybackBlocked>;

    fn pause(&mut self);

    fn current_time(&self) -> f64;

    fn seek(&mut self, seconds: f64);

    fn set_playback_rate(&mut self, rate: f64);

    fn set_muted(&mut self, muted: bool);

    fn set_fullscreen(&mut self, fullscreen: bool);
}

#[derive(Debug)]
pub(super) struct TaggedEvent {
    pub video: VideoId,
    pub generation: u64,
    pub event: MediaEvent,
}

/// Event sink attached to exactly one loaded resource.
///
/// Every event carries the video and load generation it was created for,
/// so callbacks from a resource that has since been replaced are recognised
/// and dropped by the player.
#[derive(Debug, Clone)]
pub struct MediaListener {
    video: VideoId,
    generation: u64,
    tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl MediaListener {
    pub(super) fn new(video: VideoId, generation: u64, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self { video, generation, tx }
    }

    /// Returns `false` once the player is gone.
    pub fn emit(&self, event: MediaEvent) -> bool {
        self.tx
            .send(TaggedEvent {
                video: self.video.clone(),
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}
