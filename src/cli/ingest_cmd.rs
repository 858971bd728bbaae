//! Ingestion commands (ingest, paragraph, parse, next-code)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use super::output::Output;
use super::prompt::PromptChooser;
use crate::domain::{CodeScope, SourceDocument, Topic};
use crate::ingest::{
    CodeAllocator, IngestReport, Ingestor, NonInteractive, PreparedDocument, TopicChooser,
    TopicMode,
};
use crate::storage::{Collection, Config, PocketBaseClient, RecordStore};

/// Finds a source document.
///
/// An argument that looks like a path (it has a separator or ends in `.md`)
/// and exists as given is used directly. Otherwise `.md` is appended when
/// missing and the name is looked up in `dir`.
pub fn resolve_document(dir: &Path, name: &str) -> Result<PathBuf> {
    resolve_in(dir, name, |_| true)
}

/// Finds a paragraph document (`14` -> `{dir}/14.md`)
pub fn resolve_paragraph(dir: &Path, number: &str) -> Result<PathBuf> {
    resolve_in(dir, number, is_paragraph_file)
}

fn resolve_in(dir: &Path, name: &str, listed: fn(&str) -> bool) -> Result<PathBuf> {
    let given = Path::new(name);
    if looks_like_path(name) && given.is_file() {
        return Ok(given.to_path_buf());
    }

    let file_name = if name.ends_with(".md") {
        name.to_string()
    } else {
        format!("{}.md", name)
    };
    let path = dir.join(&file_name);
    if path.is_file() {
        return Ok(path);
    }

    let available = available_documents(dir, listed);
    if available.is_empty() {
        bail!(
            "Document not found: {} (no .md files in {})",
            path.display(),
            dir.display()
        );
    }
    bail!(
        "Document not found: {}\nAvailable documents in {}:\n  {}",
        path.display(),
        dir.display(),
        available.join("\n  ")
    )
}

fn looks_like_path(name: &str) -> bool {
    name.ends_with(".md") || name.contains(std::path::MAIN_SEPARATOR) || name.contains('/')
}

/// `14.md`, `14.1.md`
fn is_paragraph_file(name: &str) -> bool {
    let stem = name.trim_end_matches(".md");
    stem.chars().any(|c| c.is_ascii_digit())
        && stem.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Sorted `.md` file names in a directory
fn available_documents(dir: &Path, listed: fn(&str) -> bool) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".md") && listed(name))
        .collect();
    names.sort();
    names
}

fn connect(config: &Config) -> Result<PocketBaseClient> {
    let credentials = config.store.credentials()?;
    PocketBaseClient::authenticate(&config.store.url, &credentials, config.store.page_size)
        .with_context(|| format!("Failed to connect to {}", config.store.url))
}

fn chooser(non_interactive: bool) -> Box<dyn TopicChooser> {
    if non_interactive {
        Box::new(NonInteractive)
    } else {
        Box::new(PromptChooser::stdin())
    }
}

/// Ingest a document, matching its topic against existing topics
pub fn ingest(output: &Output, config: &Config, document: &str, non_interactive: bool) -> Result<()> {
    let path = resolve_document(&config.sources.dir, document)?;
    run(output, config, &path, TopicMode::Lookup, non_interactive)
}

/// Ingest a textbook paragraph, creating its topic when needed
pub fn paragraph(
    output: &Output,
    config: &Config,
    number: &str,
    non_interactive: bool,
) -> Result<()> {
    let path = resolve_paragraph(&config.sources.paragraph_dir, number)?;
    let mode = TopicMode::Paragraph(number.to_string());
    run(output, config, &path, mode, non_interactive)
}

fn run(
    output: &Output,
    config: &Config,
    path: &Path,
    mode: TopicMode,
    non_interactive: bool,
) -> Result<()> {
    let doc = SourceDocument::read(path)?;
    tracing::info!(path = %path.display(), "Reading document");

    let store = connect(config)?;
    let mut chooser = chooser(non_interactive);
    let report = Ingestor::new(&store, config.defaults.clone())
        .run(&doc, &mode, chooser.as_mut())
        .with_context(|| format!("Failed to ingest {}", path.display()))?;

    print_report(output, &report);
    Ok(())
}

fn print_report(output: &Output, report: &IngestReport) {
    if output.is_json() {
        output.data(report);
        return;
    }

    println!("Topic: {} ({})", report.topic.title, report.topic.id);
    for added in &report.added {
        println!("  added    {:<10} {}", added.label, added.code);
    }
    for label in &report.skipped {
        println!("  skipped  {:<10} duplicate", label);
    }
    for failed in &report.errors {
        println!("  error    {:<10} {}", failed.label, failed.message);
    }
    println!();
    println!(
        "Added: {}, skipped: {}, errors: {}, total: {}",
        report.added.len(),
        report.skipped.len(),
        report.errors.len(),
        report.total()
    );
}

/// Parse a document offline and show what would be written
pub fn parse(output: &Output, config: &Config, document: &str) -> Result<()> {
    let path = resolve_document(&config.sources.dir, document)?;
    let doc = SourceDocument::read(&path)?;
    let prepared = PreparedDocument::from_source(&doc)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if output.is_json() {
        output.data(&prepared);
        return Ok(());
    }

    let meta = &prepared.meta;
    println!("Topic: {}", meta.topic);
    println!("Format: {}", prepared.parsed.format);
    if !meta.tags.is_empty() {
        println!("Tags: {}", meta.tags.join(", "));
    }
    println!();

    let units = prepared.units();
    for unit in &units {
        let difficulty = unit
            .difficulty
            .map(|d| format!(" [{}]", d))
            .unwrap_or_default();
        println!("{}.{} {}", unit.label, difficulty, unit.statement.replace('\n', " "));
        if !unit.answer.is_empty() {
            println!("    answer: {}", unit.answer);
        }
        if !unit.tags.is_empty() {
            println!("    tags: {}", unit.tags.join(", "));
        }
    }

    for warning in &prepared.parsed.warnings {
        println!("warning: {}", warning);
    }
    output.line(&format!("\n{} task(s)", units.len()));
    Ok(())
}

/// Print the next free code for a topic
pub fn next_code(
    output: &Output,
    config: &Config,
    topic_id: &str,
    prefix: Option<&str>,
) -> Result<()> {
    let store = connect(config)?;
    let topic = Topic::from(&store.get(Collection::Topics, topic_id)?);

    let scope = match prefix {
        Some(prefix) => CodeScope::Prefixed(prefix.trim_end_matches('-').to_string()),
        None => match topic.scope_key() {
            Some(key) => CodeScope::Topic(key.to_string()),
            None => bail!("Topic '{}' has no ege_number; pass --prefix", topic.title),
        },
    };

    let code = CodeAllocator::new(&store).allocate(&topic.id, &scope)?;
    if output.is_json() {
        output.data(&serde_json::json!({
            "topic": topic.id,
            "code": code.to_string(),
        }));
    } else {
        output.success(&code.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_appends_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("16-2.md"), "x").unwrap();

        let path = resolve_document(dir.path(), "16-2").unwrap();
        assert_eq!(path, dir.path().join("16-2.md"));

        let path = resolve_document(dir.path(), "16-2.md").unwrap();
        assert_eq!(path, dir.path().join("16-2.md"));
    }

    #[test]
    fn resolve_accepts_existing_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("elsewhere.md");
        fs::write(&file, "x").unwrap();

        let other = TempDir::new().unwrap();
        let path = resolve_document(other.path(), file.to_str().unwrap()).unwrap();
        assert_eq!(path, file);
    }

    #[test]
    fn missing_document_lists_available() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.md"), "x").unwrap();
        fs::write(dir.path().join("a.md"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let err = resolve_document(dir.path(), "c").unwrap_err().to_string();
        assert!(err.contains("c.md"));
        assert!(err.contains("a.md\n  b.md"));
        assert!(!err.contains("notes.txt"));
    }

    #[test]
    fn bare_name_is_looked_up_in_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Cargo.toml.md"), "x").unwrap();

        // A bare name never resolves against the working directory
        let path = resolve_document(dir.path(), "Cargo.toml").unwrap();
        assert_eq!(path, dir.path().join("Cargo.toml.md"));
    }

    #[test]
    fn paragraph_listing_shows_numbered_files_only() {
        let dir = TempDir::new().unwrap();
        for name in ["14.md", "15.1.md", "intro.md", "..md"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let err = resolve_paragraph(dir.path(), "16").unwrap_err().to_string();
        assert!(err.contains("16.md"));
        assert!(err.contains("14.md\n  15.1.md"));
        assert!(!err.contains("intro.md"));
        assert!(!err.contains("..md"));
    }

    #[test]
    fn paragraph_file_names() {
        assert!(is_paragraph_file("14.md"));
        assert!(is_paragraph_file("14.1.md"));
        assert!(!is_paragraph_file("notes.md"));
        assert!(!is_paragraph_file(".md"));
    }
}
