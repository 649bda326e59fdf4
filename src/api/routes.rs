use snafu::ResultExt;

use super::{InvalidIdSnafu, Result};

fn parse<T>(text: &str) -> Result<T>
where
    T: std::str::FromStr<Err = crate::model::ParseId>,
{
    text.parse().context(InvalidIdSnafu)
}

pub mod courses {
    use axum::extract::{Path, State};
    use axum::Json;
    use snafu::ResultExt;
    use tracing::instrument;

    use super::parse;
    use crate::api::{App, CatalogSnafu, Result};
    use crate::model::Course;

    #[instrument(skip(app))]
    pub async fn list(State(app): State<App>) -> Result<Json<Vec<Course>>> {
        let courses = app.list_courses().await.context(CatalogSnafu)?;
        Ok(Json(courses))
    }

    #[instrument(skip(app))]
    pub async fn find(State(app): State<App>, Path(course_id): Path<String>) -> Result<Json<Course>> {
        let course = app.find_course(&parse(&course_id)?).await.context(CatalogSnafu)?;
        Ok(Json(course))
    }
}

pub mod progress {
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::Json;
    use snafu::ResultExt;
    use tracing::instrument;

    use super::parse;
    use crate::api::{App, CatalogSnafu, ProgressSnafu, Result};
    use crate::model::{CourseId, ProgressPatch, UserId, VideoId};
    use crate::progress::{CourseProgress, ProgressIndex, ProgressMap, ProgressStore};

    #[instrument(skip(app))]
    pub async fn all(State(app): State<App>, Path(user_id): Path<String>) -> Result<Json<ProgressMap>> {
        let user: UserId = parse(&user_id)?;
        let videos = app.progress.load_all(&user).await.context(ProgressSnafu)?;

        Ok(Json(videos))
    }

    /// Only a `true` completion is accepted; clearing it is not something a progress write can do.
    #[instrument(skip(app))]
    pub async fn save(
        State(app): State<App>,
        Path((user_id, video_id)): Path<(String, String)>,
        Json(patch): Json<ProgressPatch>,
    ) -> Result<StatusCode> {
        let user: UserId = parse(&user_id)?;
        let video: VideoId = parse(&video_id)?;

        let patch = ProgressPatch {
            completed: patch.completed.filter(|completed| *completed),
            ..patch.sanitized()
        };

        app.progress
            .save(&user, &video, patch)
            .await
            .context(ProgressSnafu)?;

        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(app))]
    pub async fn course(
        State(app): State<App>,
        Path((user_id, course_id)): Path<(String, String)>,
    ) -> Result<Json<CourseProgress>> {
        let user: UserId = parse(&user_id)?;
        let course: CourseId = parse(&course_id)?;

        let course = app.find_course(&course).await.context(CatalogSnafu)?;
        let videos = app.progress.load_all(&user).await.context(ProgressSnafu)?;

        let index = ProgressIndex::new(videos);
        Ok(Json(CourseProgress::compute(&course, &index)))
    }
}

pub mod enrollments {
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::Json;
    use snafu::ResultExt;
    use tracing::instrument;

    use super::parse;
    use crate::api::{App, CatalogSnafu, EnrollmentSnafu, Result};
    use crate::model::{CourseId, UserId};

    #[instrument(skip(app))]
    pub async fn list(State(app): State<App>, Path(user_id): Path<String>) -> Result<Json<Vec<CourseId>>> {
        let user: UserId = parse(&user_id)?;
        let courses = app.enrollments.enrolled(&user).await.context(EnrollmentSnafu)?;

        Ok(Json(courses))
    }

    #[instrument(skip(app))]
    pub async fn enroll(
        State(app): State<App>,
        Path((user_id, course_id)): Path<(String, String)>,
    ) -> Result<StatusCode> {
        let user: UserId = parse(&user_id)?;
        let course: CourseId = parse(&course_id)?;

        app.find_course(&course).await.context(CatalogSnafu)?;
        app.enrollments
            .enroll(&user, &course)
            .await
            .context(EnrollmentSnafu)?;

        Ok(StatusCode::NO_CONTENT)
    }

    #[instrument(skip(app))]
    pub async fn unenroll(
        State(app): State<App>,
        Path((user_id, course_id)): Path<(String, String)>,
    ) -> Result<StatusCode> {
        let user: UserId = parse(&user_id)?;
        let course: CourseId = parse(&course_id)?;

        app.enrollments
            .unenroll(&user, &course)
            .await
            .context(EnrollmentSnafu)?;

        Ok(StatusCode::NO_CONTENT)
    }
}
