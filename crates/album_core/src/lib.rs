//! Album core: pure domain types and the discovery state machine.
mod album;
mod effect;
mod msg;
mod outcome;
mod resolution;
mod resource;
mod state;
mod update;

pub use album::{AlbumRef, AlbumRefError};
pub use effect::DiscoveryEffect;
pub use msg::DiscoveryMsg;
pub use outcome::{DownloadOutcome, RunStatus, RunSummary};
pub use resolution::{select_highest_resolution, SizeKey};
pub use resource::ResourceUrl;
pub use state::{DiscoveryConfig, DiscoveryEnd, DiscoveryPhase, DiscoveryState};
pub use update::update;
