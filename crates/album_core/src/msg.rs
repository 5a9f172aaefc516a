use crate::ResourceUrl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryMsg {
    /// Discovery begins; `preloaded` is the content of the checkpoint file.
    Started { preloaded: Vec<ResourceUrl> },
    /// The listing page at the current offset was fetched and parsed.
    PageLoaded { candidates: Vec<ResourceUrl> },
    /// The listing page could not be fetched or parsed after all retries.
    PageFailed { reason: String },
    /// New URLs of the current page are durable in the checkpoint file.
    CheckpointWritten,
    /// Appending to the checkpoint file failed.
    CheckpointFailed { reason: String },
    /// Shutdown was requested from outside.
    Interrupted,
}
