//! BWPROF runner library.
//!
//! Loads monitor profiles, applies them against the simulated firmware and
//! encodes single commands. The `bwprof` binary is a thin CLI over this
//! crate.

pub mod apply;
pub mod encode;
pub mod error;
pub mod metrics_export;
pub mod profile;

pub use apply::{apply_profile, run_profile, ApplyReport, TransactionRecord, TransferCounts};
pub use encode::{parse_version_word, EncodeCommand, EncodedCommand};
pub use error::RunnerError;
pub use metrics_export::{MetricSample, MetricValue, MetricsExport};
pub use profile::{BwprofProfile, SamplingProfile};
