use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::models::{Checkpoint, CheckpointId};

/// Checkpoints answered correctly during this session. Only ever grows.
#[derive(Debug, Clone, Default)]
struct AnsweredSet {
    ids: HashSet<CheckpointId>,
}

impl AnsweredSet {
    /// Returns `true` if the id was not yet answered.
    fn insert(&mut self, id: CheckpointId) -> bool {
        self.ids.insert(id)
    }

    fn contains(&self, id: &CheckpointId) -> bool {
        self.ids.contains(id)
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Progress-bar marker for one checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: CheckpointId,
    pub time: f64,
    pub answered: bool,
}

/// Decides which checkpoint fires on a tick and how far the learner may seek.
#[derive(Debug, Clone)]
pub struct CheckpointScheduler {
    /// Ascending by trigger time, unique ids and times.
    checkpoints: Vec<Checkpoint>,
    answered: AnsweredSet,
}

impl CheckpointScheduler {
    /// Validate and sort the served checkpoints. Defective entries are
    /// skipped with a warning.
    ///
    /// With `require_answer_key` unset, checkpoints without a correct option
    /// are accepted since the answer endpoint decides correctness.
    pub fn new(checkpoints: Vec<Checkpoint>, require_answer_key: bool) -> Self {
        let mut valid: Vec<Checkpoint> = Vec::with_capacity(checkpoints.len());

        for checkpoint in checkpoints {
            let verdict = if require_answer_key {
                checkpoint.validate()
            } else {
                checkpoint.validate_structure()
            };
            if let Err(defect) = verdict {
                warn!("Skipping checkpoint {}: {}", checkpoint.id, defect);
                continue;
            }
            if valid.iter().any(|c| c.id == checkpoint.id) {
                warn!("Skipping checkpoint {}: duplicate id", checkpoint.id);
                continue;
            }
            valid.push(checkpoint);
        }

        // stable, so equal timestamps keep served order
        valid.sort_by(|a, b| a.trigger_time.total_cmp(&b.trigger_time));
        valid.dedup_by(|later, earlier| {
            let duplicate = later.trigger_time == earlier.trigger_time;
            if duplicate {
                warn!(
                    "Skipping checkpoint {}: same trigger time as {} ({:.1}s)",
                    later.id, earlier.id, later.trigger_time
                );
            }
            duplicate
        });

        debug!("Scheduling {} checkpoint(s)", valid.len());
        Self {
            checkpoints: valid,
            answered: AnsweredSet::default(),
        }
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Unknown ids are ignored.
    pub fn mark_answered(&mut self, id: &CheckpointId) {
        let known = self.checkpoints.iter().any(|c| &c.id == id);
        if known && self.answered.insert(id.clone()) {
            debug!(
                "Checkpoint {} answered ({}/{})",
                id,
                self.answered.len(),
                self.checkpoints.len()
            );
        }
    }

    fn unanswered(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints
            .iter()
            .filter(|c| !self.answered.contains(&c.id))
    }

    /// Earliest unanswered checkpoint whose window `|time - trigger| < tolerance`
    /// contains `time`.
    pub fn due(&self, time: f64, tolerance: f64) -> Option<&Checkpoint> {
        self.unanswered()
            .find(|c| (time - c.trigger_time).abs() < tolerance)
    }

    fn first_unanswered(&self) -> Option<&Checkpoint> {
        self.unanswered().next()
    }

    /// `min(first unanswered trigger, duration)`; `duration` once everything is
    /// answered. An unknown (zero) duration does not cap the ceiling.
    pub fn seek_ceiling(&self, duration: f64) -> f64 {
        match self.first_unanswered() {
            Some(checkpoint) if duration > 0.0 => checkpoint.trigger_time.min(duration),
            Some(checkpoint) => checkpoint.trigger_time,
            None => duration,
        }
    }

    /// Trigger time of the checkpoint preceding `id`, or 0 for the first one.
    pub fn rewind_target(&self, id: &CheckpointId) -> f64 {
        let index = self
            .checkpoints
            .iter()
            .position(|c| &c.id == id)
            .unwrap_or(0);
        match index.checked_sub(1) {
            Some(previous) => self.checkpoints[previous].trigger_time,
            None => 0.0,
        }
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.checkpoints
            .iter()
            .map(|c| Marker {
                id: c.id.clone(),
                time: c.trigger_time,
                answered: self.answered.contains(&c.id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::checkpoint;

    fn scheduler() -> CheckpointScheduler {
        CheckpointScheduler::new(
            vec![
                checkpoint("q300", 300.0, "opt-c"),
                checkpoint("q120", 120.0, "opt-a"),
            ],
            true,
        )
    }

    #[test]
    fn test_sorted_ascending() {
        let scheduler = scheduler();
        let times: Vec<f64> = scheduler.checkpoints().iter().map(|c| c.trigger_time).collect();
        assert_eq!(times, vec![120.0, 300.0]);
    }

    #[test]
    fn test_due_within_tolerance() {
        let scheduler = scheduler();
        assert!(scheduler.due(119.4, 0.5).is_none());
        assert_eq!(scheduler.due(119.6, 0.5).unwrap().id.as_str(), "q120");
        assert_eq!(scheduler.due(120.4, 0.5).unwrap().id.as_str(), "q120");
        assert!(scheduler.due(120.5, 0.5).is_none());
        // polled tolerance is wider
        assert_eq!(scheduler.due(119.2, 1.0).unwrap().id.as_str(), "q120");
    }

    #[test]
    fn test_answered_checkpoint_never_fires_again() {
        let mut scheduler = scheduler();
        scheduler.mark_answered(&CheckpointId::from("q120"));
        assert!(scheduler.due(120.0, 0.5).is_none());
        assert!(scheduler.due(120.0, 1.0).is_none());
        assert_eq!(scheduler.due(300.2, 0.5).unwrap().id.as_str(), "q300");
    }

    #[test]
    fn test_overlapping_windows_pick_earliest() {
        let scheduler = CheckpointScheduler::new(
            vec![checkpoint("b", 10.6, "opt-a"), checkpoint("a", 10.0, "opt-a")],
            true,
        );
        assert_eq!(scheduler.due(10.3, 1.0).unwrap().id.as_str(), "a");
    }

    #[test]
    fn test_seek_ceiling() {
        let mut scheduler = scheduler();
        assert_eq!(scheduler.seek_ceiling(600.0), 120.0);
        assert_eq!(scheduler.seek_ceiling(0.0), 120.0);
        assert_eq!(scheduler.seek_ceiling(100.0), 100.0);

        scheduler.mark_answered(&CheckpointId::from("q120"));
        assert_eq!(scheduler.seek_ceiling(600.0), 300.0);

        scheduler.mark_answered(&CheckpointId::from("q300"));
        assert_eq!(scheduler.seek_ceiling(600.0), 600.0);
    }

    #[test]
    fn test_rewind_target() {
        let scheduler = scheduler();
        assert_eq!(scheduler.rewind_target(&CheckpointId::from("q120")), 0.0);
        assert_eq!(scheduler.rewind_target(&CheckpointId::from("q300")), 120.0);
    }

    #[test]
    fn test_malformed_and_duplicates_skipped() {
        let mut lonely = checkpoint("lonely", 50.0, "opt-a");
        lonely.options.truncate(1);
        let negative = checkpoint("negative", -3.0, "opt-a");
        let duplicate_id = checkpoint("q120", 200.0, "opt-a");
        let same_time = checkpoint("twin", 120.0, "opt-a");

        let scheduler = CheckpointScheduler::new(
            vec![
                checkpoint("q120", 120.0, "opt-a"),
                lonely,
                negative,
                duplicate_id,
                same_time,
            ],
            true,
        );
        let ids: Vec<&str> = scheduler.checkpoints().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["q120"]);
    }

    #[test]
    fn test_server_validation_accepts_unflagged_options() {
        let mut unflagged = checkpoint("q", 30.0, "opt-a");
        for option in &mut unflagged.options {
            option.is_correct = false;
        }
        assert_eq!(
            CheckpointScheduler::new(vec![unflagged.clone()], false)
                .checkpoints()
                .len(),
            1
        );
        assert!(CheckpointScheduler::new(vec![unflagged], true)
            .checkpoints()
            .is_empty());
    }

    #[test]
    fn test_unknown_or_repeated_answers_are_ignored() {
        let mut scheduler = scheduler();
        scheduler.mark_answered(&CheckpointId::from("nope"));
        assert_eq!(scheduler.seek_ceiling(600.0), 120.0);

        scheduler.mark_answered(&CheckpointId::from("q120"));
        scheduler.mark_answered(&CheckpointId::from("q120"));
        assert_eq!(scheduler.seek_ceiling(600.0), 300.0);
        assert_eq!(scheduler.answered.len(), 1);
    }

    #[test]
    fn test_markers_track_answers() {
        let mut scheduler = scheduler();
        scheduler.mark_answered(&CheckpointId::from("q120"));
        let markers = scheduler.markers();
        assert_eq!(markers.len(), 2);
        assert!(markers[0].answered);
        assert!(!markers[1].answered);
        assert_eq!(markers[1].time, 300.0);
    }

    #[test]
    fn test_empty_schedule() {
        let scheduler = CheckpointScheduler::new(Vec::new(), true);
        assert!(scheduler.due(0.0, 1.0).is_none());
        assert_eq!(scheduler.seek_ceiling(600.0), 600.0);
    }
}
