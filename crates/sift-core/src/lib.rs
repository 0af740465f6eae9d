#![forbid(unsafe_code)]
//! sift-core library.
//!
//! Shared vocabulary for the sift workspace: candidates and ranked lists,
//! corpus records, error codes, and project/user configuration. Ranking and
//! fusion logic lives in `sift-search`.
//!
//! # Conventions
//!
//! - **Errors**: Typed [`error::SiftError`] for structural precondition
//!   violations; `anyhow::Result` for I/O and configuration loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod model;

pub use error::{ErrorCode, SiftError};
pub use model::{Candidate, CorpusRecord, Folder, RankedList, ScoredRecord};
