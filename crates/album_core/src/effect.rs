use crate::{DiscoveryEnd, ResourceUrl};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEffect {
    RequestPage { offset: u64 },
    Checkpoint { urls: Vec<ResourceUrl> },
    /// Politeness delay between two successful pages.
    Throttle,
    Finished(DiscoveryEnd),
}
