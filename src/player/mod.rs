pub mod direct;
pub mod embedded;
pub mod factory;
pub mod simulated;
pub mod traits;

pub use direct::{DirectSource, ElementEvent, MediaElement};
pub use embedded::{EmbeddedEvent, EmbeddedPlayerApi, EmbeddedSource, EmbeddedState};
pub use factory::{BackendFactory, SimulatedBackendFactory, create_source};
pub use simulated::{Playhead, SimulatedEmbeddedPlayer, SimulatedMedia, SimulatedMediaElement};
pub use traits::{SourceEvent, SourceKind, TickMode, TimeSource};
