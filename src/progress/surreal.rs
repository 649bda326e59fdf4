use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use derive_new::new;
use serde::Deserialize;
use snafu::ResultExt;
use tokio::sync::Mutex;
use tracing::instrument;

use super::{ensure_key, ProgressMap, ProgressStore, QuerySnafu, Result};
use crate::database::Database;
use crate::model::{now, ProgressPatch, Timestamp, UserId, VideoId};

/// The database clock and the user's stored videos, read before every write.
const READ: &str = "RETURN <string> time::now(); \
    SELECT videos FROM type::thing('progress', $user);";

/// `MERGE` is a deep merge: only the leaves present under `videos.<id>` change,
/// sibling videos and their fields stay as they are.
const SAVE: &str = "UPDATE type::thing('progress', $user) \
    MERGE { videos: $videos, lastUpdatedOverall: $at } \
    RETURN NONE";

const LOAD: &str = "SELECT videos FROM type::thing('progress', $user)";

/// Writes are read-modify-write so the stored entry keeps its invariants.
/// Writes of one user are serialized within the process.
#[derive(Debug, Clone, new)]
pub struct SurrealProgressStore {
    database: Database,
    #[new(default)]
    locks: Arc<DashMap<UserId, Arc<Mutex<()>>>>,
}

#[derive(Debug, Default, Deserialize)]
struct ProgressRow {
    #[serde(default)]
    videos: ProgressMap,
}

impl SurrealProgressStore {
    fn user_lock(&self, user: &UserId) -> Arc<Mutex<()>> {
        self.locks.entry(user.clone()).or_default().clone()
    }
}

impl ProgressStore for SurrealProgressStore {
    #[instrument(skip(self))]
    async fn save(&self, user: &UserId, video: &VideoId, patch: ProgressPatch) -> Result<()> {
        ensure_key(user.as_str(), "user")?;
        ensure_key(video.as_str(), "video")?;

        let lock = self.user_lock(user);
        let _guard = lock.lock().await;

        let (at, row): (Option<Timestamp>, Option<ProgressRow>) = self
            .database
            .sql(READ)
            .bind(("user", user.as_str()))
            .fetch_pair()
            .await
            .context(QuerySnafu)?;
        let at = at.unwrap_or_else(now);

        let mut state = row
            .unwrap_or_default()
            .videos
            .remove(video)
            .unwrap_or_default();
        state.apply(&patch.sanitized(), at);

        let videos = HashMap::from([(video.as_str(), &state)]);

        self.database
            .sql(SAVE)
            .bind(("user", user.as_str()))
            .bind(("videos", videos))
            .bind(("at", at))
            .execute()
            .await
            .context(QuerySnafu)?;

        tracing::debug!(user.id = %user, video.id = %video, current_time = state.current_time, "saved video progress");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_all(&self, user: &UserId) -> Result<ProgressMap> {
        ensure_key(user.as_str(), "user")?;

        let row: Option<ProgressRow> = self
            .database
            .sql(LOAD)
            .bind(("user", user.as_str()))
            .fetch_first()
            .await
            .context(QuerySnafu)?;

        let videos = row.unwrap_or_default().videos;
        tracing::debug!(user.id = %user, count = videos.len(), "loaded video progress");

        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::StoreError;

    async fn store() -> SurrealProgressStore {
        SurrealProgressStore::new(Database::in_memory().await.unwrap())
    }

    fn patch(current_time: f64, duration: Option<f64>, completed: Option<bool>) -> ProgressPatch {
        ProgressPatch::new(Some(current_time), duration, completed)
    }

    #[tokio::test]
    async fn save_creates_the_record() {
        let store = store().await;
        let user = UserId::from("ada");
        let video = VideoId::from("v1");

        store.save(&user, &video, patch(42.0, Some(120.0), None)).await.unwrap();

        let videos = store.load_all(&user).await.unwrap();
        let state = &videos[&video];
        assert_eq!(state.current_time, 42.0);
        assert_eq!(state.duration, Some(120.0));
        assert!(!state.completed);
        assert!(state.last_updated.is_some());
    }

    #[tokio::test]
    async fn writes_to_different_videos_do_not_clobber() {
        let store = store().await;
        let user = UserId::from("ada");
        let first = VideoId::from("v1");
        let second = VideoId::from("v2");

        store.save(&user, &first, patch(10.0, Some(100.0), Some(true))).await.unwrap();
        store.save(&user, &second, patch(5.0, Some(50.0), None)).await.unwrap();
        store.save(&user, &second, patch(7.0, None, None)).await.unwrap();

        let videos = store.load_all(&user).await.unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[&first].current_time, 10.0);
        assert!(videos[&first].completed);
        assert_eq!(videos[&second].current_time, 7.0);
        assert_eq!(videos[&second].duration, Some(50.0), "duration kept by partial write");
    }

    #[tokio::test]
    async fn repeated_save_is_idempotent_apart_from_timestamp() {
        let store = store().await;
        let user = UserId::from("ada");
        let video = VideoId::from("v1");
        let write = patch(30.0, Some(60.0), Some(true));

        store.save(&user, &video, write).await.unwrap();
        let mut once = store.load_all(&user).await.unwrap().remove(&video).unwrap();

        store.save(&user, &video, write).await.unwrap();
        let mut twice = store.load_all(&user).await.unwrap().remove(&video).unwrap();

        once.last_updated = None;
        twice.last_updated = None;
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn position_never_passes_the_stored_duration() {
        let store = store().await;
        let user = UserId::from("ada");
        let video = VideoId::from("v1");

        store.save(&user, &video, patch(10.0, Some(60.0), None)).await.unwrap();
        store.save(&user, &video, ProgressPatch::new(Some(500.0), None, None)).await.unwrap();

        let state = &store.load_all(&user).await.unwrap()[&video];
        assert_eq!(state.current_time, 60.0);

        let fresh = VideoId::from("v2");
        store.save(&user, &fresh, patch(500.0, Some(60.0), None)).await.unwrap();

        let state = &store.load_all(&user).await.unwrap()[&fresh];
        assert_eq!(state.current_time, 60.0);
    }

    #[tokio::test]
    async fn duration_is_learned_once() {
        let store = store().await;
        let user = UserId::from("ada");
        let video = VideoId::from("v1");

        store.save(&user, &video, patch(10.0, None, None)).await.unwrap();
        store.save(&user, &video, patch(20.0, Some(60.0), None)).await.unwrap();
        store.save(&user, &video, patch(30.0, Some(999.0), None)).await.unwrap();

        let state = &store.load_all(&user).await.unwrap()[&video];
        assert_eq!(state.duration, Some(60.0));
        assert_eq!(state.current_time, 30.0);
    }

    #[tokio::test]
    async fn timestamps_come_from_one_clock() {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Stamped {
            last_updated_overall: Timestamp,
        }

        let store = store().await;
        let user = UserId::from("ada");
        let video = VideoId::from("v1");

        store.save(&user, &video, patch(1.0, None, None)).await.unwrap();

        let stamped: Option<Stamped> = store
            .database
            .sql("SELECT lastUpdatedOverall FROM type::thing('progress', $user)")
            .bind(("user", "ada"))
            .fetch_first()
            .await
            .unwrap();

        let state = &store.load_all(&user).await.unwrap()[&video];
        assert_eq!(state.last_updated, Some(stamped.unwrap().last_updated_overall));
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let store = store().await;
        let video = VideoId::from("v1");

        store.save(&UserId::from("ada"), &video, patch(1.0, None, None)).await.unwrap();

        let other = store.load_all(&UserId::from("grace")).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn empty_ids_are_rejected() {
        let store = store().await;
        let user: UserId = serde_json::from_str("\"\"").unwrap();

        let result = store.save(&user, &VideoId::from("v1"), ProgressPatch::default()).await;
        assert!(matches!(result, Err(StoreError::MissingKey { what: "user" })));
    }
}
