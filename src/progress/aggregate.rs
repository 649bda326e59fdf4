//! Display percentages derived from a [ProgressIndex].
//!
//! Videos whose duration was never learned are excluded from course totals
//! rather than counted as unwatched, so a course is not understated because
//! some of its lectures were never opened.

use serde::Serialize;

use super::ProgressIndex;
use crate::model::{Course, CourseId, VideoId, VideoPlaybackState};

pub fn per_video_percent(state: Option<&VideoPlaybackState>) -> f64 {
    let Some(state) = state else {
        return 0.0;
    };
    let Some(duration) = state.duration() else {
        return 0.0;
    };

    match state.completed {
        true => 100.0,
        false => (state.current_time / duration * 100.0).clamp(0.0, 100.0),
    }
}

pub fn overall_course_percent<'a>(
    states: impl IntoIterator<Item = Option<&'a VideoPlaybackState>>,
) -> f64 {
    let (watched, total) = states
        .into_iter()
        .flatten()
        .filter_map(|state| Some((state.watched_seconds()?, state.duration()?)))
        .fold((0.0, 0.0), |(watched, total), (seconds, duration)| {
            (watched + seconds, total + duration)
        });

    match total > 0.0 {
        true => (watched / total * 100.0).clamp(0.0, 100.0),
        false => 0.0,
    }
}

impl ProgressIndex {
    pub fn per_video_percent(&self, video: &VideoId) -> f64 {
        per_video_percent(self.get(video).as_ref())
    }

    pub fn overall_course_percent(&self, course: &Course) -> f64 {
        let states: Vec<_> = course
            .video_lectures
            .iter()
            .map(|lecture| self.get(&lecture.id))
            .collect();

        overall_course_percent(states.iter().map(Option::as_ref))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoProgress {
    pub video_id: VideoId,
    pub percent: f64,
    pub completed: bool,
}

/// Progress report of one course, in lecture order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub course_id: CourseId,
    pub videos: Vec<VideoProgress>,
    pub overall_percent: f64,
}

impl CourseProgress {
    pub fn compute(course: &Course, index: &ProgressIndex) -> Self {
        let videos = course
            .video_lectures
            .iter()
            .map(|lecture| VideoProgress {
                video_id: lecture.id.clone(),
                percent: index.per_video_percent(&lecture.id),
                completed: index.is_completed(&lecture.id),
            })
            .collect();

        Self {
            course_id: course.id.clone(),
            videos,
            overall_percent: index.overall_course_percent(course),
        }
    }
}
