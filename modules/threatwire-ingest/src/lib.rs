//! Ingestion pipeline: fetch raw records from the upstream provider, prune
//! anything stale or already stored, apply the victim category filter,
//! generate summaries, and persist what survives.

pub mod filter;
pub mod pipeline;
pub mod provider;
pub mod summary;
pub mod window;

pub use pipeline::{CycleReport, Ingestor, LaneReport};
pub use provider::{RansomwareLiveClient, ThreatFeedProvider};
pub use summary::{LlmBackend, Summarizer, SummaryBackend};
