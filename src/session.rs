//! Opening a player for one course page.

use snafu::{ResultExt, Snafu};

use crate::catalog::{Catalog, CatalogError};
use crate::model::{CourseId, UserId};
use crate::player::{MediaElement, PlayerConfig, PlayerError, PlayerHandle};
use crate::progress::{ProgressIndex, ProgressStore};

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum SessionError {
    /// The course could not be resolved; no player is constructed.
    #[snafu(display("cannot open course: {source}"))]
    Course { source: CatalogError },

    #[snafu(display("player stopped before the first lecture was selected: {source}"))]
    Player { source: PlayerError },
}

/// Resolves `course`, loads the user's progress once and starts a player
/// with the first lecture selected but not playing.
#[tracing::instrument(skip(catalog, store, media, config))]
pub async fn open_player<M, S>(
    catalog: &Catalog,
    store: S,
    course: &CourseId,
    user: Option<UserId>,
    media: M,
    config: &PlayerConfig,
) -> Result<PlayerHandle>
where
    M: MediaElement,
    S: ProgressStore,
{
    let course = catalog.find_course(course).await.context(CourseSnafu)?;

    let index = match &user {
        Some(user) => ProgressIndex::load(&store, user).await,
        None => ProgressIndex::default(),
    };

    let first = course.first_lecture().map(|lecture| lecture.id.clone());
    let player = PlayerHandle::spawn(course, user, store, media, index, config);

    if let Some(first) = first {
        player.select_video(first).context(PlayerSnafu)?;
    }

    Ok(player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::model::{fixtures, VideoId, VideoPlaybackState};
    use crate::player::testing::FakeMedia;
    use crate::player::PlaybackState;
    use crate::progress::testing::RecordingStore;

    async fn catalog() -> Catalog {
        let catalog = Catalog::new(Database::in_memory().await.unwrap());
        catalog
            .seed_if_empty(&[fixtures::course("rust", &["v1", "v2"]), fixtures::course("empty", &[])])
            .await
            .unwrap();
        catalog
    }

    #[tokio::test]
    async fn first_lecture_is_selected_without_playing() {
        let catalog = catalog().await;
        let media = FakeMedia::default();

        let player = open_player(
            &catalog,
            RecordingStore::default(),
            &CourseId::from("rust"),
            Some(UserId::from("ada")),
            media.clone(),
            &PlayerConfig::default(),
        )
        .await
        .unwrap();

        let cursor = player.snapshot().await.unwrap();
        assert_eq!(cursor.selected_video_id, Some(VideoId::from("v1")));
        assert_eq!(cursor.state, PlaybackState::Loading);
        assert!(!media.is_playing());
    }

    #[tokio::test]
    async fn stored_progress_is_loaded_for_the_user() {
        let catalog = catalog().await;
        let store = RecordingStore::default().with_state(
            "ada",
            "v2",
            VideoPlaybackState {
                current_time: 10.0,
                duration: Some(20.0),
                completed: true,
                last_updated: None,
            },
        );

        let player = open_player(
            &catalog,
            store,
            &CourseId::from("rust"),
            Some(UserId::from("ada")),
            FakeMedia::default(),
            &PlayerConfig::default(),
        )
        .await
        .unwrap();

        assert!(player.index().is_completed(&VideoId::from("v2")));
    }

    #[tokio::test]
    async fn unknown_course_builds_no_player() {
        let catalog = catalog().await;

        let result = open_player(
            &catalog,
            RecordingStore::default(),
            &CourseId::from("missing"),
            None,
            FakeMedia::default(),
            &PlayerConfig::default(),
        )
        .await;

        assert!(matches!(
            result,
            Err(SessionError::Course {
                source: CatalogError::CourseNotFound { .. }
            })
        ));
    }

    #[tokio::test]
    async fn course_without_lectures_stays_idle() {
        let catalog = catalog().await;

        let player = open_player(
            &catalog,
            RecordingStore::default(),
            &CourseId::from("empty"),
            None,
            FakeMedia::default(),
            &PlayerConfig::default(),
        )
        .await
        .unwrap();

        let cursor = player.snapshot().await.unwrap();
        assert_eq!(cursor.state, PlaybackState::Idle);
        assert_eq!(cursor.selected_video_id, None);
    }
}
