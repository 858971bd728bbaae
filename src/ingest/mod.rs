//! # Ingestion
//!
//! Turns a source document into task records in the store.
//!
//! ## Components
//!
//! - [`TagResolver`] - tag titles to ids, creating tags on first use
//! - [`TopicResolver`] - topic lookup (with a [`TopicChooser`] for
//!   ambiguity) or paragraph lookup-or-create
//! - [`CodeAllocator`] - next sequential code for a topic scope
//! - [`DedupFilter`] - statements already stored under a topic
//! - [`Ingestor`] - runs the whole sequence and returns an [`IngestReport`]
//!
//! Every component borrows the store explicitly; none of them keeps
//! session state beyond the current run.

mod codes;
mod dedup;
mod pipeline;
mod tags;
mod topics;

use thiserror::Error;

use crate::domain::{CodeError, MetadataError};
use crate::parser::ParseError;
use crate::storage::StoreError;

pub use codes::CodeAllocator;
pub use dedup::DedupFilter;
pub use pipeline::{
    AddedTask, FailedTask, IngestReport, Ingestor, PreparedDocument, TopicMode,
};
pub use tags::TagResolver;
pub use topics::{resolve_topic, ChoiceReason, NonInteractive, TopicChooser, TopicResolver};

/// Fatal ingestion errors. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Topic resolution failed: {0}")]
    Resolution(String),

    #[error("Store request failed: {0}")]
    Transport(#[from] StoreError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Code allocation failed: {0}")]
    Code(#[from] CodeError),
}

impl From<MetadataError> for IngestError {
    fn from(err: MetadataError) -> Self {
        IngestError::Configuration(err.to_string())
    }
}
