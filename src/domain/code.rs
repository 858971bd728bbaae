//! Topic-scoped task codes
//!
//! Code format: `{scope}-{sequence}` with the sequence zero-padded to three
//! digits (e.g. `7-001`, `M14-012`). The sequence is never stored on its own;
//! the next value is recomputed from the codes already present in the store.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CodeError {
    #[error("Invalid task code: expected '{{scope}}-{{number}}', got '{0}'")]
    InvalidCode(String),

    #[error("No codes left after '{0}'")]
    SequenceExhausted(String),
}

/// A parsed task code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskCode {
    /// Everything before the last `-`
    scope: String,
    sequence: u32,
}

impl TaskCode {
    pub fn new(scope: impl Into<String>, sequence: u32) -> Self {
        Self {
            scope: scope.into(),
            sequence,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for TaskCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:03}", self.scope, self.sequence)
    }
}

impl FromStr for TaskCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (scope, number) = s
            .rsplit_once('-')
            .ok_or_else(|| CodeError::InvalidCode(s.to_string()))?;

        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(CodeError::InvalidCode(s.to_string()));
        }

        let sequence = number
            .parse()
            .map_err(|_| CodeError::InvalidCode(s.to_string()))?;

        Ok(Self {
            scope: scope.to_string(),
            sequence,
        })
    }
}

/// Where a code sequence lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeScope {
    /// Every code of the topic counts; new codes use the topic's scope key
    Topic(String),

    /// Only codes starting with `{prefix}-` count (paragraph ingestion)
    Prefixed(String),
}

impl CodeScope {
    /// The literal text placed before the sequence, including the `-`
    pub fn prefix(&self) -> String {
        match self {
            CodeScope::Topic(key) | CodeScope::Prefixed(key) => format!("{}-", key),
        }
    }

    fn key(&self) -> &str {
        match self {
            CodeScope::Topic(key) | CodeScope::Prefixed(key) => key,
        }
    }

    /// Returns true if an existing code takes part in this scope's sequence
    pub fn includes(&self, code: &str) -> bool {
        match self {
            CodeScope::Topic(_) => true,
            CodeScope::Prefixed(_) => code.trim().starts_with(&self.prefix()),
        }
    }
}

/// Computes the next code for a scope from the codes already allocated.
///
/// Malformed codes are ignored. Gaps are never backfilled: the result is
/// always one past the highest sequence seen, or an error when that would
/// overflow.
pub fn next_code<'a, I>(scope: &CodeScope, existing: I) -> Result<TaskCode, CodeError>
where
    I: IntoIterator<Item = &'a str>,
{
    let highest = existing
        .into_iter()
        .filter(|code| scope.includes(code))
        .filter_map(|code| code.parse::<TaskCode>().ok())
        .map(|code| code.sequence)
        .max()
        .unwrap_or(0);

    let sequence = highest.checked_add(1).ok_or_else(|| {
        CodeError::SequenceExhausted(TaskCode::new(scope.key(), highest).to_string())
    })?;

    Ok(TaskCode::new(scope.key(), sequence))
}
