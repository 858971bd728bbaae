//! Domain models for ege-ingest
//!
//! Contains the core rules without any I/O concerns.

mod code;
mod metadata;
mod tag;
mod task;
mod topic;

pub use code::{next_code, CodeError, CodeScope, TaskCode};
pub use metadata::{DocumentMeta, MetadataError, SourceDocument};
pub use tag::{parse_tag_list, random_color, Tag, TAG_PALETTE};
pub use task::{normalize_letter, Ordinal, ParsedTask, Subtask, TaskRecord, TaskUnit};
pub use topic::{match_topic, paragraph_scope_key, Topic, TopicMatch};
