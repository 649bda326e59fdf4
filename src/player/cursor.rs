use serde::Serialize;

use crate::model::VideoId;

pub const MIN_PLAYBACK_RATE: f64 = 0.5;
pub const MAX_PLAYBACK_RATE: f64 = 2.0;

/// `Idle → Loading → Paused ⇄ Playing → Ended`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Paused,
    Playing,
    Ended,
}

impl PlaybackState {
    /// Metadata has arrived for the selected video.
    pub fn is_loaded(self) -> bool {
        matches!(self, Self::Paused | Self::Playing | Self::Ended)
    }
}

/// Ephemeral per-session view of the player. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCursor {
    pub selected_video_id: Option<VideoId>,
    pub state: PlaybackState,
    pub is_playing: bool,
    pub is_muted: bool,
    pub is_fullscreen: bool,
    pub playback_rate: f64,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub countdown_active: bool,
    pub countdown_remaining: u32,
}

impl Default for PlaylistCursor {
    fn default() -> Self {
        Self {
            selected_video_id: None,
            state: PlaybackState::Idle,
            is_playing: false,
            is_muted: false,
            is_fullscreen: false,
            playback_rate: 1.0,
            current_time: 0.0,
            duration: None,
            countdown_active: false,
            countdown_remaining: 0,
        }
    }
}

impl PlaylistCursor {
    /// Points the cursor at a freshly selected video. Playback fields start
    /// over; mute, rate and fullscreen are user preferences and carry over.
    pub fn reset_for(&mut self, video: VideoId) {
        *self = Self {
            selected_video_id: Some(video),
            state: PlaybackState::Loading,
            is_muted: self.is_muted,
            is_fullscreen: self.is_fullscreen,
            playback_rate: self.playback_rate,
            ..Self::default()
        };
    }

    pub fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
        self.is_playing = state == PlaybackState::Playing;
    }

    pub fn set_countdown(&mut self, remaining: Option<u32>) {
        self.countdown_active = remaining.is_some();
        self.countdown_remaining = remaining.unwrap_or_default();
    }
}

/// `None` for rates that are not numbers at all.
pub fn clamp_rate(rate: f64) -> Option<f64> {
    rate.is_finite()
        .then(|| rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE))
}
