pub mod attachments;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod jql;
pub mod models;
pub mod progress;
pub mod rate_limit;
pub mod service;
pub mod sink;

pub use client::{Credentials, JiraClient};
pub use error::Error;
pub use models::*;

// Config re-exports
pub use config::{ExportConfig, ExportTarget};

// Pipeline re-exports
pub use attachments::AttachmentCollector;
pub use fetcher::{IssueFetcher, PAGE_SIZE};
pub use service::{ExportService, ExportSummary, sink_for_target};

// Progress re-exports
pub use progress::{LogProgress, NullProgress, ProgressSink, ProgressSnapshot};

// Rate limit re-exports
pub use rate_limit::{DEFAULT_COOLDOWN_SECONDS, RateLimitGuard, RateLimitState};

// Export assembly re-exports
pub use export::{ArchiveBuilder, AttachmentRef, ExportRecord, to_csv, to_records};

// Sink re-exports
pub use sink::{ExportBundle, ExportSink, GitHubSink, LocalSink, parse_repo_url};
