use serde::{Deserialize, Serialize};

/// Transient playback state owned by the session.
///
/// Mirrors backend events; `volume`, `is_muted` and `is_fullscreen` are
/// tracked locally since the embedded backend does not report them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub current_time: f64,
    pub duration: f64,
    pub is_playing: bool,
    /// 0.0 to 1.0
    pub volume: f64,
    pub is_muted: bool,
    pub is_fullscreen: bool,
}

impl PlaybackState {
    pub fn new(volume: f64) -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            is_playing: false,
            volume: volume.clamp(0.0, 1.0),
            is_muted: false,
            is_fullscreen: false,
        }
    }

    pub fn progress_fraction(&self) -> f64 {
        fraction(self.current_time, self.duration)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// `value / duration` clamped to 0..=1, 0 while the duration is unknown.
pub fn fraction(value: f64, duration: f64) -> f64 {
    if duration <= 0.0 || !duration.is_finite() {
        return 0.0;
    }
    (value / duration).clamp(0.0, 1.0)
}
