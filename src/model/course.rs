use serde::{Deserialize, Serialize};
use url::Url;

use super::{CourseId, VideoId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoLecture {
    pub id: VideoId,
    pub title: String,
    #[serde(alias = "videoUrl")]
    pub media_url: Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

/// A course as the catalog hands it out. Lecture order is playback order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Url>,
    /// Free-form length label such as "8 Weeks".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub video_lectures: Vec<VideoLecture>,
}

impl Course {
    pub fn lecture(&self, id: &VideoId) -> Option<&VideoLecture> {
        self.video_lectures.iter().find(|lecture| &lecture.id == id)
    }

    pub fn position(&self, id: &VideoId) -> Option<usize> {
        self.video_lectures
            .iter()
            .position(|lecture| &lecture.id == id)
    }

    /// The lecture that follows `id`, or `None` when `id` is last or unknown.
    /// The playlist never wraps around.
    pub fn next_after(&self, id: &VideoId) -> Option<&VideoLecture> {
        let position = self.position(id)?;
        self.video_lectures.get(position + 1)
    }

    pub fn first_lecture(&self) -> Option<&VideoLecture> {
        self.video_lectures.first()
    }
}
