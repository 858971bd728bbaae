//! ege-ingest - exam-problem documents to task records
//!
//! Reads Markdown documents (a YAML metadata block plus a task body in one
//! of three dialects), turns them into task records, and writes them to a
//! PocketBase store with topic-scoped sequential codes and statement-text
//! deduplication.

pub mod cli;
pub mod domain;
pub mod ingest;
pub mod parser;
pub mod storage;

pub use domain::{ParsedTask, Subtask, TaskRecord, Topic};
pub use ingest::{IngestError, IngestReport, Ingestor, TopicMode};
pub use storage::{Config, MemoryStore, PocketBaseClient, RecordStore};
