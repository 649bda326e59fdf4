//! Durable per-video playback progress and everything derived from it.
//!
//! * [ProgressStore] is the data-access contract, [SurrealProgressStore] its SurrealDB implementation.
//! * [ProgressIndex] is the in-memory map a session loads once and then updates optimistically.
//! * [ProgressWriter] applies a player's writes in issue order on a background task.
//! * [aggregate] turns the index into display percentages.

use std::collections::HashMap;
use std::future::Future;

use snafu::{Location, Snafu};

use crate::database::QueryError;
use crate::model::{ProgressPatch, UserId, VideoId, VideoPlaybackState};

pub mod aggregate;

mod index;
mod surreal;
mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::CourseProgress;
pub use index::ProgressIndex;
pub use surreal::SurrealProgressStore;
pub use writer::{ProgressWriter, SaveRequest};

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Everything the store knows about one user, keyed by video.
pub type ProgressMap = HashMap<VideoId, VideoPlaybackState>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    /// Progress is keyed by (user, video); both parts must be present.
    #[snafu(display("cannot address progress without a {what} id"))]
    MissingKey { what: &'static str },

    #[snafu(display("progress query failed: {source}"))]
    Query {
        source: QueryError,
        #[snafu(implicit)]
        location: Location,
    },
}

#[cfg(test)]
impl StoreError {
    /// The error a store reports when its database is unreachable.
    pub(crate) fn offline() -> Self {
        use snafu::IntoError;

        QuerySnafu.into_error(QueryError::thrown("database offline"))
    }
}

/// Durable key-value persistence of [VideoPlaybackState] keyed by (user, video).
pub trait ProgressStore: Send + Sync + 'static {
    /// Merges the fields present in `patch` into the stored state of `video`,
    /// creating the record when absent and stamping `lastUpdated`.
    ///
    /// A usable stored duration is never replaced and the stored position never
    /// exceeds a known duration.
    ///
    /// Entries of other videos of the same user are never touched.
    fn save(
        &self, user: &UserId, video: &VideoId, patch: ProgressPatch,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Every stored video state of `user` as of call time.
    fn load_all(&self, user: &UserId) -> impl Future<Output = Result<ProgressMap>> + Send;
}

fn ensure_key(id: &str, what: &'static str) -> Result<()> {
    match id.is_empty() {
        true => MissingKeySnafu { what }.fail(),
        false => Ok(()),
    }
}
