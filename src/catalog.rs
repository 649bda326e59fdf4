//! Read-only course catalog backed by the `courses` table.

use derive_new::new;
use serde::{Deserialize, Serialize};
use snafu::{Location, ResultExt, Snafu};
use tracing::instrument;
use url::Url;

use crate::database::{Database, QueryError};
use crate::model::{Course, CourseId, Level, VideoLecture};

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

const BUNDLED: &str = include_str!("../data/courses.json");

const COUNT: &str = "SELECT count() AS total FROM courses GROUP ALL";
const INSERT: &str = "INSERT INTO courses $courses RETURN NONE";
const LIST: &str = "SELECT courseId, title, description, category, level, imageUrl, duration, videoLectures \
    FROM courses";
const FIND: &str = "SELECT courseId, title, description, category, level, imageUrl, duration, videoLectures \
    FROM courses WHERE courseId = $course LIMIT 1";

/// Stored for courses seeded without an image.
const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x400.png?text=Image+Not+Found";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CatalogError {
    #[snafu(display("course `{course}` does not exist"))]
    CourseNotFound { course: CourseId },

    #[snafu(display("failed to load the catalog: {source}"))]
    Query {
        source: QueryError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("bundled course data is invalid: {source}"))]
    SeedData {
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// A course as stored. The record id is left to the database; `courseId` carries the catalog id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseRecord {
    course_id: CourseId,
    title: String,
    #[serde(default)]
    description: String,
    category: String,
    level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<String>,
    #[serde(default)]
    video_lectures: Vec<VideoLecture>,
}

impl From<Course> for CourseRecord {
    fn from(course: Course) -> Self {
        Self {
            course_id: course.id,
            title: course.title,
            description: course.description,
            category: course.category,
            level: course.level,
            image_url: course.image_url.or_else(|| Url::parse(PLACEHOLDER_IMAGE).ok()),
            duration: course.duration,
            video_lectures: course.video_lectures,
        }
    }
}

impl From<CourseRecord> for Course {
    fn from(record: CourseRecord) -> Self {
        Self {
            id: record.course_id,
            title: record.title,
            description: record.description,
            category: record.category,
            level: record.level,
            image_url: record.image_url,
            duration: record.duration,
            video_lectures: record.video_lectures,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CountRow {
    total: usize,
}

/// The catalog that ships with the binary.
pub fn bundled_courses() -> Result<Vec<Course>> {
    serde_json::from_str(BUNDLED).context(SeedDataSnafu)
}

#[derive(Debug, Clone, new)]
pub struct Catalog {
    database: Database,
}

impl Catalog {
    pub async fn count(&self) -> Result<usize> {
        let row: Option<CountRow> = self.database.sql(COUNT).fetch_first().await.context(QuerySnafu)?;
        Ok(row.map_or(0, |row| row.total))
    }

    /// Inserts `courses` when the catalog is empty. Returns whether anything was written.
    #[instrument(skip_all, fields(courses = courses.len()))]
    pub async fn seed_if_empty(&self, courses: &[Course]) -> Result<bool> {
        if courses.is_empty() {
            return Ok(false);
        }

        let existing = self.count().await?;
        if existing > 0 {
            tracing::info!(existing, "catalog already populated, not seeding");
            return Ok(false);
        }

        let records: Vec<CourseRecord> = courses.iter().cloned().map(CourseRecord::from).collect();

        self.database
            .sql(INSERT)
            .bind(("courses", records))
            .execute()
            .await
            .context(QuerySnafu)?;

        tracing::info!(count = courses.len(), "seeded course catalog");
        Ok(true)
    }

    /// Every course, ordered by title ignoring case.
    #[instrument(skip(self))]
    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        let records: Vec<CourseRecord> = self.database.sql(LIST).fetch_first().await.context(QuerySnafu)?;

        let mut courses: Vec<Course> = records.into_iter().map(Course::from).collect();
        courses.sort_by_cached_key(|course| course.title.to_lowercase());

        tracing::debug!(count = courses.len(), "listed courses");
        Ok(courses)
    }

    #[instrument(skip(self))]
    pub async fn find_course(&self, course: &CourseId) -> Result<Course> {
        let record: Option<CourseRecord> = self
            .database
            .sql(FIND)
            .bind(("course", course.as_str()))
            .fetch_first()
            .await
            .context(QuerySnafu)?;

        match record {
            Some(record) => Ok(record.into()),
            None => CourseNotFoundSnafu { course: course.clone() }.fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;

    async fn catalog() -> Catalog {
        Catalog::new(Database::in_memory().await.unwrap())
    }

    fn titled(id: &str, title: &str, lectures: &[&str]) -> Course {
        Course {
            title: title.to_string(),
            ..fixtures::course(id, lectures)
        }
    }

    #[test]
    fn bundled_catalog_parses() {
        let courses = bundled_courses().unwrap();

        assert!(!courses.is_empty());
        assert!(courses.iter().all(|course| !course.video_lectures.is_empty()));
        assert!(courses.iter().all(|course| course.duration.is_some()));
    }

    #[tokio::test]
    async fn seeding_only_happens_once() {
        let catalog = catalog().await;

        assert!(catalog.seed_if_empty(&[fixtures::course("a", &["v1"])]).await.unwrap());
        assert!(!catalog.seed_if_empty(&[fixtures::course("b", &["v2"])]).await.unwrap());

        assert_eq!(catalog.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn courses_are_listed_by_title() {
        let catalog = catalog().await;
        let courses = [
            titled("ml", "Machine Learning", &["m1"]),
            titled("db", "Databases", &["d1", "d2"]),
            titled("web", "Web Basics", &[]),
        ];
        catalog.seed_if_empty(&courses).await.unwrap();

        let listed = catalog.list_courses().await.unwrap();

        let titles: Vec<_> = listed.iter().map(|course| course.title.as_str()).collect();
        assert_eq!(titles, vec!["Databases", "Machine Learning", "Web Basics"]);
        assert_eq!(listed[0], courses[1], "lectures keep their order");
    }

    #[tokio::test]
    async fn title_order_ignores_case() {
        let catalog = catalog().await;
        catalog
            .seed_if_empty(&[
                titled("rust", "Rust", &["r1"]),
                titled("api", "api design", &["a1"]),
                titled("bash", "Bash Scripting", &["b1"]),
            ])
            .await
            .unwrap();

        let listed = catalog.list_courses().await.unwrap();

        let titles: Vec<_> = listed.iter().map(|course| course.title.as_str()).collect();
        assert_eq!(titles, vec!["api design", "Bash Scripting", "Rust"]);
    }

    #[tokio::test]
    async fn missing_image_gets_a_placeholder() {
        let catalog = catalog().await;
        let course = Course {
            image_url: None,
            duration: None,
            ..fixtures::course("rust", &["v1"])
        };
        catalog.seed_if_empty(&[course]).await.unwrap();

        let found = catalog.find_course(&CourseId::from("rust")).await.unwrap();

        assert_eq!(found.image_url.map(String::from), Some(PLACEHOLDER_IMAGE.to_string()));
        assert_eq!(found.duration, None);
    }

    #[tokio::test]
    async fn find_course_by_id() {
        let catalog = catalog().await;
        let course = fixtures::course("rust", &["v1", "v2"]);
        catalog.seed_if_empty(&[course.clone()]).await.unwrap();

        assert_eq!(catalog.find_course(&CourseId::from("rust")).await.unwrap(), course);

        let missing = catalog.find_course(&CourseId::from("go")).await;
        assert!(matches!(missing, Err(CatalogError::CourseNotFound { .. })));
    }
}
