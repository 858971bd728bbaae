//! # Command-Line Interface
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `ingest <DOCUMENT>` | Ingest a document into an existing topic |
//! | `paragraph <N>` | Ingest a textbook paragraph, creating its topic |
//! | `parse <DOCUMENT>` | Offline preview of the parsed tasks |
//! | `next-code <TOPIC_ID>` | Next free code for a topic |
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! Logs go to stderr. `--verbose` turns on debug logs; `RUST_LOG`
//! overrides both:
//! ```bash
//! RUST_LOG=ege_ingest=debug ege-ingest parse 16-2
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod ingest_cmd;
mod output;
mod prompt;

pub use app::{run, Cli, Commands};
pub use ingest_cmd::{resolve_document, resolve_paragraph};
pub use output::{Output, OutputFormat};
pub use prompt::PromptChooser;
