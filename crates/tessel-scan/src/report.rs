//! Scan results.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use tessel_syntax::{CapturedValue, DetachedMatch, MatchResult, Node, Range, Root, SupportedLanguage};

use crate::error::FileError;

/// The matches found in one file, together with the tree they point into.
#[derive(Debug, Clone)]
pub struct FileMatches {
    path: PathBuf,
    root: Arc<Root>,
    matches: Vec<DetachedMatch>,
}

impl FileMatches {
    pub(crate) fn new(path: PathBuf, root: Root, matches: Vec<DetachedMatch>) -> Self {
        Self {
            path,
            root: Arc::new(root),
            matches,
        }
    }

    /// Returns the scanned file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the parsed tree.
    #[must_use]
    pub fn root(&self) -> &Arc<Root> {
        &self.root
    }

    /// Returns the number of matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns whether the file had no matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Iterates over the matches in document order.
    pub fn iter(&self) -> impl Iterator<Item = MatchResult<'_>> {
        self.matches
            .iter()
            .filter_map(|detached| detached.attach(&self.root))
    }

    /// Returns serializable snapshots of every match.
    #[must_use]
    pub fn records(&self) -> Vec<MatchRecord> {
        let file = self.path.to_string_lossy();
        self.iter()
            .map(|found| MatchRecord::new(&file, &found))
            .collect()
    }
}

/// A node captured by a metavariable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureRecord {
    /// Source text of the node.
    pub text: String,
    /// Location of the node.
    pub range: Range,
}

impl CaptureRecord {
    fn from_node(node: Node<'_>) -> Self {
        Self {
            text: node.text().to_owned(),
            range: node.range(),
        }
    }
}

/// A self-contained, serializable snapshot of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// The file the match was found in.
    pub file: String,
    /// Language the file was parsed as.
    pub language: SupportedLanguage,
    /// Grammar kind of the matched node.
    pub kind: String,
    /// Source text of the matched node.
    pub text: String,
    /// Location of the matched node.
    pub range: Range,
    /// Single metavariable bindings.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub single: BTreeMap<String, CaptureRecord>,
    /// Variadic metavariable bindings, one entry per named node of the run.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub multi: BTreeMap<String, Vec<CaptureRecord>>,
}

impl MatchRecord {
    fn new(file: &str, found: &MatchResult<'_>) -> Self {
        let node = found.node();
        let mut single = BTreeMap::new();
        let mut multi = BTreeMap::new();
        for (name, value) in found.captures().iter() {
            match value {
                CapturedValue::Single(captured) => {
                    single.insert(name.to_owned(), CaptureRecord::from_node(*captured));
                }
                CapturedValue::Multiple(run) => {
                    let nodes = run.nodes().iter().copied().map(CaptureRecord::from_node);
                    multi.insert(name.to_owned(), nodes.collect());
                }
            }
        }

        Self {
            file: file.to_owned(),
            language: node.language(),
            kind: node.kind().to_owned(),
            text: node.text().to_owned(),
            range: node.range(),
            single,
            multi,
        }
    }
}

/// What happened to one input file.
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was parsed and searched. It may have no matches.
    Matched(FileMatches),
    /// The file could not be processed.
    Failed(FileError),
    /// The scan was cancelled before the file started.
    Cancelled {
        /// The file that was skipped.
        path: PathBuf,
    },
}

/// The result of a batch scan: one outcome per input path, in input order.
#[derive(Debug, Default)]
pub struct ScanReport {
    outcomes: Vec<FileOutcome>,
}

impl ScanReport {
    pub(crate) const fn new(outcomes: Vec<FileOutcome>) -> Self {
        Self { outcomes }
    }

    /// Returns every outcome in input order.
    #[must_use]
    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    /// Consumes the report, returning the outcomes.
    #[must_use]
    pub fn into_outcomes(self) -> Vec<FileOutcome> {
        self.outcomes
    }

    /// Iterates over the files that were searched.
    pub fn matched(&self) -> impl Iterator<Item = &FileMatches> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FileOutcome::Matched(file) => Some(file),
            FileOutcome::Failed(_) | FileOutcome::Cancelled { .. } => None,
        })
    }

    /// Iterates over the per-file failures.
    pub fn failures(&self) -> impl Iterator<Item = &FileError> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FileOutcome::Failed(err) => Some(err),
            FileOutcome::Matched(_) | FileOutcome::Cancelled { .. } => None,
        })
    }

    /// Returns the number of files that were searched.
    #[must_use]
    pub fn files_processed(&self) -> usize {
        self.matched().count()
    }

    /// Returns the number of files that failed.
    #[must_use]
    pub fn files_failed(&self) -> usize {
        self.failures().count()
    }

    /// Returns the number of files skipped by cancellation.
    #[must_use]
    pub fn files_cancelled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, FileOutcome::Cancelled { .. }))
            .count()
    }

    /// Returns the total number of matches across all files.
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.matched().map(FileMatches::len).sum()
    }

    /// Returns serializable snapshots of every match, file by file.
    #[must_use]
    pub fn records(&self) -> Vec<MatchRecord> {
        self.matched().flat_map(FileMatches::records).collect()
    }
}
