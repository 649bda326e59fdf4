//! The set of courses each user is enrolled in, one `enrollments:<user>` record per user.

use derive_new::new;
use serde::Deserialize;
use snafu::{Location, ResultExt, Snafu};
use tracing::instrument;

use crate::database::{Database, QueryError};
use crate::model::{CourseId, UserId};

pub type Result<T, E = EnrollmentError> = std::result::Result<T, E>;

const ENROLL: &str = "UPDATE type::thing('enrollments', $user) \
    SET courseIds = array::union(courseIds OR [], [$course]) \
    RETURN NONE";

const UNENROLL: &str = "UPDATE type::thing('enrollments', $user) \
    SET courseIds = array::complement(courseIds OR [], [$course]) \
    RETURN NONE";

const ENROLLED: &str = "SELECT courseIds FROM type::thing('enrollments', $user)";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EnrollmentError {
    #[snafu(display("enrollment needs a signed in user"))]
    MissingUser,

    #[snafu(display("enrollment query failed: {source}"))]
    Query {
        source: QueryError,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnrollmentRow {
    #[serde(default)]
    course_ids: Vec<CourseId>,
}

#[derive(Debug, Clone, new)]
pub struct Enrollments {
    database: Database,
}

impl Enrollments {
    /// Adds `course` to the user's set. Enrolling twice is a no-op.
    #[instrument(skip(self))]
    pub async fn enroll(&self, user: &UserId, course: &CourseId) -> Result<()> {
        self.update(ENROLL, user, course).await?;
        tracing::info!(user.id = %user, course.id = %course, "enrolled");
        Ok(())
    }

    /// Removes `course` from the user's set, if it is there.
    #[instrument(skip(self))]
    pub async fn unenroll(&self, user: &UserId, course: &CourseId) -> Result<()> {
        self.update(UNENROLL, user, course).await?;
        tracing::info!(user.id = %user, course.id = %course, "unenrolled");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn enrolled(&self, user: &UserId) -> Result<Vec<CourseId>> {
        ensure_user(user)?;

        let row: Option<EnrollmentRow> = self
            .database
            .sql(ENROLLED)
            .bind(("user", user.as_str()))
            .fetch_first()
            .await
            .context(QuerySnafu)?;

        Ok(row.unwrap_or_default().course_ids)
    }

    async fn update(&self, query: &str, user: &UserId, course: &CourseId) -> Result<()> {
        ensure_user(user)?;

        self.database
            .sql(query)
            .bind(("user", user.as_str()))
            .bind(("course", course.as_str()))
            .execute()
            .await
            .context(QuerySnafu)?;

        Ok(())
    }
}

fn ensure_user(user: &UserId) -> Result<()> {
    match user.as_str().is_empty() {
        true => MissingUserSnafu.fail(),
        false => Ok(()),
    }
}
