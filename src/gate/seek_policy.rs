use tracing::debug;

/// Outcome of a learner seek request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekDecision {
    pub requested: f64,
    pub target: f64,
    /// The request was truncated to the gate limit.
    pub clamped: bool,
}

/// Forward-seek gate: the learner may never move past what they have
/// watched, nor past the first unanswered checkpoint.
#[derive(Debug, Clone, Default)]
pub struct GatedSeekPolicy {
    max_watched: f64,
    unlocked: bool,
}

impl GatedSeekPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// High-water mark of the playback position.
    pub fn max_watched(&self) -> f64 {
        self.max_watched
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Record an observed playback position.
    pub fn observe(&mut self, time: f64) {
        if time.is_finite() && time > self.max_watched {
            self.max_watched = time;
        }
    }

    /// Lift the gate for the rest of the session.
    pub fn unlock(&mut self) {
        if !self.unlocked {
            debug!("Seek gate unlocked");
            self.unlocked = true;
        }
    }

    /// `min(ceiling, max_watched)` while locked.
    pub fn limit(&self, ceiling: f64) -> f64 {
        ceiling.min(self.max_watched)
    }

    pub fn clamp(&self, requested: f64, ceiling: f64, duration: f64) -> SeekDecision {
        let mut target = if requested.is_finite() { requested.max(0.0) } else { 0.0 };
        if duration > 0.0 {
            target = target.min(duration);
        }

        let mut clamped = false;
        if !self.unlocked {
            let limit = self.limit(ceiling);
            if target > limit {
                target = limit;
                clamped = true;
            }
        }

        SeekDecision {
            requested,
            target,
            clamped,
        }
    }
}
