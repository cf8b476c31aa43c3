// State machine module for the content pipeline
//
// Pure, side-effect-free status definitions and the data-driven transition
// table. Nothing here touches entity state or storage; callers validate a
// transition before mutating the aggregate.

pub mod status;

pub use status::{ContentStatus, PublicationStatus, TransitionError};
