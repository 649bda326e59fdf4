use std::sync::Arc;

use dashmap::DashMap;

use super::{ProgressMap, ProgressStore};
use crate::model::{known_duration, now, ProgressPatch, UserId, VideoId, VideoPlaybackState};

/// Process-local cache of one user's progress, loaded once per session.
///
/// Local writes land here before the durable write completes, so readers
/// (the aggregator, the UI) never wait on the store. It is never treated as
/// authoritative across sessions. Cloning shares the same map.
#[derive(Debug, Clone, Default)]
pub struct ProgressIndex {
    states: Arc<DashMap<VideoId, VideoPlaybackState>>,
}

impl ProgressIndex {
    pub fn new(states: ProgressMap) -> Self {
        let states = states
            .into_iter()
            .map(|(video, state)| (video, state.clamped()))
            .collect();

        Self {
            states: Arc::new(states),
        }
    }

    /// Loads the index for `user`. A failed load is logged and yields an
    /// empty index: the session continues without prior progress.
    pub async fn load<S: ProgressStore>(store: &S, user: &UserId) -> Self {
        match store.load_all(user).await {
            Ok(states) => {
                tracing::info!(user.id = %user, count = states.len(), "loaded progress index");
                Self::new(states)
            }
            Err(error) => {
                tracing::warn!(user.id = %user, %error, "could not load progress, starting empty");
                Self::default()
            }
        }
    }

    pub fn get(&self, video: &VideoId) -> Option<VideoPlaybackState> {
        self.states.get(video).map(|state| state.clone())
    }

    pub fn is_completed(&self, video: &VideoId) -> bool {
        self.states
            .get(video)
            .map_or(false, |state| state.completed)
    }

    /// The stored duration of `video` if it is usable.
    pub fn duration(&self, video: &VideoId) -> Option<f64> {
        self.states.get(video).and_then(|state| state.duration())
    }

    /// Records a duration reported by media metadata. A usable stored duration
    /// is kept; only an absent or stale (NaN / zero) one is replaced.
    ///
    /// Returns the duration the index now holds for `video`.
    pub fn learn_duration(&self, video: &VideoId, reported: f64) -> Option<f64> {
        let mut state = self.states.entry(video.clone()).or_default();

        if state.duration().is_none() {
            if let Some(reported) = known_duration(reported) {
                state.duration = Some(reported);
            }
        }

        state.duration()
    }

    /// Applies a local write ahead of its durable counterpart.
    pub fn record(&self, video: &VideoId, patch: &ProgressPatch) {
        self.states
            .entry(video.clone())
            .or_default()
            .apply(patch, now());
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// A point-in-time copy of the whole index.
    pub fn snapshot(&self) -> ProgressMap {
        self.states
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
