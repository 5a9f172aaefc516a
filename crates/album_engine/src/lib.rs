//! Album engine: discovery and download IO around the pure core.
mod checkpoint;
mod config;
mod decode;
mod fetch;
mod filename;
mod ledger;
mod listing;
mod paginator;
mod persist;
mod pipeline;
mod retry;
mod scheduler;
mod shutdown;
mod types;

pub use checkpoint::{CheckpointError, CheckpointStore, CHECKPOINT_FILENAME};
pub use config::{ConfigError, DelayRange, FetchSettings, PipelineConfig};
pub use decode::{decode_payload, DecodeError, DecodedText};
pub use fetch::{FetchRequest, Fetcher, ProgressSink, RequestMethod, ReqwestFetcher};
pub use filename::{assign_filenames, file_extension, indexed_filename, NamedResource};
pub use ledger::{FailureLedger, LEDGER_FILENAME};
pub use listing::{ListingPage, ListingParser, PhotoListingParser};
pub use paginator::{DiscoveryReport, Paginator};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use pipeline::{Pipeline, PipelineError, PipelineReport};
pub use retry::{fetch_with_retry, RetryPolicy};
pub use scheduler::{DownloadScheduler, ScheduledDownload, SchedulerReport};
pub use shutdown::ShutdownToken;
pub use types::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput};
