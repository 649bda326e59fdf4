use derive_new::new;
use serde::{Deserialize, Serialize};

use super::Timestamp;

/// A duration reported by media metadata is only usable when it is a finite,
/// positive number of seconds. `NaN`, infinity (live streams) and zero all
/// count as unknown.
pub fn known_duration(seconds: f64) -> Option<f64> {
    (seconds.is_finite() && seconds > 0.0).then_some(seconds)
}

/// Stored playback state of one video for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPlaybackState {
    #[serde(default)]
    pub current_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

impl VideoPlaybackState {
    pub fn duration(&self) -> Option<f64> {
        self.duration.and_then(known_duration)
    }

    /// Field-level merge: only the fields present in `patch` change.
    ///
    /// A usable duration is learned once. The patch only replaces an absent or
    /// stale (NaN / zero) one, and the position never ends up past it.
    pub fn apply(&mut self, patch: &ProgressPatch, at: Timestamp) {
        if self.duration().is_none() {
            if let Some(duration) = patch.duration.and_then(known_duration) {
                self.duration = Some(duration);
            }
        }
        if let Some(current_time) = patch.current_time {
            self.current_time = current_time;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }

        self.current_time = clamp_time(self.current_time, self.duration());
        self.last_updated = Some(at);
    }

    /// The same state with the position pulled back inside `[0, duration]`.
    pub fn clamped(mut self) -> Self {
        self.current_time = clamp_time(self.current_time, self.duration());
        self
    }

    /// Seconds that count towards course progress, `None` while the duration is unknown.
    pub fn watched_seconds(&self) -> Option<f64> {
        let duration = self.duration()?;

        match self.completed {
            true => Some(duration),
            false => Some(self.current_time.min(duration)),
        }
    }
}

/// The subset of [VideoPlaybackState] fields carried by one write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ProgressPatch {
    /// Builds the patch a player writes for its current position.
    ///
    /// `completed` is only ever written as `true`; a position update for an
    /// unfinished video leaves the stored flag alone, so an automatic write can
    /// never flip a completed video back.
    pub fn snapshot(current_time: f64, duration: Option<f64>, completed: bool) -> Self {
        let duration = duration.and_then(known_duration);

        Self {
            current_time: Some(clamp_time(current_time, duration)),
            duration,
            completed: completed.then_some(true),
        }
    }

    /// Drops values that cannot be stored: non-finite times and unusable durations.
    pub fn sanitized(self) -> Self {
        Self {
            current_time: self
                .current_time
                .filter(|time| time.is_finite())
                .map(|time| time.max(0.0)),
            duration: self.duration.and_then(known_duration),
            completed: self.completed,
        }
    }
}

fn clamp_time(time: f64, duration: Option<f64>) -> f64 {
    let time = if time.is_finite() { time.max(0.0) } else { 0.0 };

    match duration {
        Some(duration) => time.min(duration),
        None => time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::now;

    #[test]
    fn unusable_durations_are_unknown() {
        assert_eq!(known_duration(f64::NAN), None);
        assert_eq!(known_duration(0.0), None);
        assert_eq!(known_duration(f64::INFINITY), None);
        assert_eq!(known_duration(12.5), Some(12.5));
    }

    #[test]
    fn apply_merges_only_given_fields() {
        let mut state = VideoPlaybackState {
            current_time: 10.0,
            duration: Some(100.0),
            completed: true,
            last_updated: None,
        };

        state.apply(&ProgressPatch::new(Some(20.0), None, None), now());

        assert_eq!(state.current_time, 20.0);
        assert_eq!(state.duration, Some(100.0));
        assert!(state.completed, "completed must survive a time-only patch");
        assert!(state.last_updated.is_some());
    }

    #[test]
    fn apply_clamps_time_to_known_duration() {
        let mut state = VideoPlaybackState::default();
        state.apply(&ProgressPatch::new(Some(130.0), Some(120.0), None), now());

        assert_eq!(state.current_time, 120.0);
    }

    #[test]
    fn apply_keeps_a_known_duration() {
        let mut state = VideoPlaybackState::default();

        state.apply(&ProgressPatch::new(Some(10.0), Some(60.0), None), now());
        state.apply(&ProgressPatch::new(Some(500.0), Some(999.0), None), now());

        assert_eq!(state.duration, Some(60.0));
        assert_eq!(state.current_time, 60.0);
    }

    #[test]
    fn apply_replaces_a_stale_duration() {
        let mut state = VideoPlaybackState {
            current_time: 5.0,
            duration: Some(0.0),
            ..Default::default()
        };

        state.apply(&ProgressPatch::new(None, Some(f64::NAN), None), now());
        assert_eq!(state.duration, Some(0.0));

        state.apply(&ProgressPatch::new(None, Some(90.0), None), now());
        assert_eq!(state.duration, Some(90.0));
        assert_eq!(state.current_time, 5.0);
    }

    #[test]
    fn clamped_pulls_position_inside_duration() {
        let state = VideoPlaybackState {
            current_time: 75.0,
            duration: Some(60.0),
            ..Default::default()
        };
        assert_eq!(state.clamped().current_time, 60.0);

        let unknown = VideoPlaybackState {
            current_time: -2.0,
            ..Default::default()
        };
        assert_eq!(unknown.clamped().current_time, 0.0);
    }

    #[test]
    fn snapshot_never_writes_incomplete() {
        let patch = ProgressPatch::snapshot(42.0, Some(120.0), false);
        assert_eq!(patch.completed, None);

        let patch = ProgressPatch::snapshot(120.0, Some(120.0), true);
        assert_eq!(patch.completed, Some(true));
    }

    #[test]
    fn snapshot_drops_unknown_duration() {
        let patch = ProgressPatch::snapshot(-3.0, Some(f64::NAN), false);

        assert_eq!(patch.current_time, Some(0.0));
        assert_eq!(patch.duration, None);
    }

    #[test]
    fn watched_seconds_counts_completed_as_full() {
        let state = VideoPlaybackState {
            current_time: 10.0,
            duration: Some(60.0),
            completed: true,
            last_updated: None,
        };
        assert_eq!(state.watched_seconds(), Some(60.0));

        let unknown = VideoPlaybackState {
            current_time: 10.0,
            duration: None,
            completed: true,
            last_updated: None,
        };
        assert_eq!(unknown.watched_seconds(), None);
    }

    #[test]
    fn wire_format_uses_camel_case() {
        let patch = ProgressPatch::new(Some(4.0), None, Some(true));
        let json = serde_json::to_value(patch).unwrap();

        assert_eq!(json, serde_json::json!({ "currentTime": 4.0, "completed": true }));
    }
}
