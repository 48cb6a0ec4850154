//! One lesson's playback session: a single task owning the backend, the
//! checkpoint gate and the quiz overlay, driven through [`SessionHandle`].

pub mod controller;
pub mod shell;

pub use controller::{
    LessonSession, SessionCommand, SessionError, SessionHandle, SessionSetup, open,
};
pub use shell::{FullscreenControl, HeadlessFullscreen, Overlay, ShellView, controls_visible};
