mod checkpoint;
mod identifiers;
mod lesson;
mod playback;

pub use checkpoint::{Checkpoint, CheckpointDefect, MIN_OPTIONS, QuizOption};
pub use identifiers::{CheckpointId, OptionId, VideoId};
pub use lesson::{EMBEDDED_VIDEO_TYPE, Lesson, MediaSource, ResumePoint, extract_embedded_id};
pub use playback::{PlaybackState, fraction};
