use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use super::{ProgressMap, ProgressStore, Result, SaveRequest, StoreError};
use crate::model::{now, ProgressPatch, UserId, VideoId, VideoPlaybackState};

#[derive(Debug, Default)]
struct Recorded {
    saves: Vec<SaveRequest>,
    states: HashMap<(UserId, VideoId), VideoPlaybackState>,
    failures: usize,
}

/// In-memory [ProgressStore] that remembers every successful write.
#[derive(Debug, Clone)]
pub struct RecordingStore {
    recorded: Arc<Mutex<Recorded>>,
    count: Arc<watch::Sender<usize>>,
}

impl Default for RecordingStore {
    fn default() -> Self {
        let (count, _) = watch::channel(0);

        Self {
            recorded: Arc::default(),
            count: Arc::new(count),
        }
    }
}

impl RecordingStore {
    pub fn with_state(self, user: &str, video: &str, state: VideoPlaybackState) -> Self {
        self.recorded
            .lock()
            .unwrap()
            .states
            .insert((UserId::from(user), VideoId::from(video)), state);
        self
    }

    /// The next `count` saves fail with [StoreError::offline].
    pub fn fail_next(&self, count: usize) {
        self.recorded.lock().unwrap().failures = count;
    }

    pub fn saves(&self) -> Vec<SaveRequest> {
        self.recorded.lock().unwrap().saves.clone()
    }

    pub fn saves_for(&self, video: &str) -> Vec<ProgressPatch> {
        let video = VideoId::from(video);

        self.saves()
            .into_iter()
            .filter(|save| save.video == video)
            .map(|save| save.patch)
            .collect()
    }

    pub fn state(&self, user: &UserId, video: &VideoId) -> Option<VideoPlaybackState> {
        self.recorded
            .lock()
            .unwrap()
            .states
            .get(&(user.clone(), video.clone()))
            .cloned()
    }

    pub async fn wait_for_saves(&self, count: usize) {
        let mut rx = self.count.subscribe();
        rx.wait_for(|saved| *saved >= count).await.unwrap();
    }
}

impl ProgressStore for RecordingStore {
    async fn save(&self, user: &UserId, video: &VideoId, patch: ProgressPatch) -> Result<()> {
        let saved = {
            let mut recorded = self.recorded.lock().unwrap();

            if recorded.failures > 0 {
                recorded.failures -= 1;
                return Err(StoreError::offline());
            }

            recorded
                .states
                .entry((user.clone(), video.clone()))
                .or_default()
                .apply(&patch, now());
            recorded
                .saves
                .push(SaveRequest::new(user.clone(), video.clone(), patch));
            recorded.saves.len()
        };

        self.count.send_replace(saved);
        Ok(())
    }

    async fn load_all(&self, user: &UserId) -> Result<ProgressMap> {
        let recorded = self.recorded.lock().unwrap();

        Ok(recorded
            .states
            .iter()
            .filter(|((owner, _), _)| owner == user)
            .map(|((_, video), state)| (video.clone(), state.clone()))
            .collect())
    }
}
