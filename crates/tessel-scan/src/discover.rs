//! File discovery for directory scans.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

use tessel_syntax::SupportedLanguage;

use crate::error::ScanError;

const DISCOVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::discover");

/// Collects the files under `roots` that can be scanned.
///
/// Directories are walked recursively, honouring `.gitignore`, `.ignore`
/// and hidden-file conventions. A walked file is kept when its extension
/// maps to a supported language, or to `language` when one is forced. Roots
/// that name a file directly are always kept. The result is sorted and free
/// of duplicates.
///
/// # Errors
///
/// Returns [`ScanError::Discovery`] when a root cannot be walked.
pub fn discover_files<P: AsRef<Path>>(
    roots: &[P],
    language: Option<SupportedLanguage>,
) -> Result<Vec<PathBuf>, ScanError> {
    let Some((first, rest)) = roots.split_first() else {
        return Ok(Vec::new());
    };

    let mut builder = WalkBuilder::new(first);
    for root in rest {
        builder.add(root);
    }
    builder.require_git(false);

    let mut files = Vec::new();
    for walked in builder.build() {
        let entry = walked?;
        if !entry.file_type().is_some_and(|kind| kind.is_file()) {
            continue;
        }
        let explicit = entry.depth() == 0;
        if explicit || is_scannable(entry.path(), language) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    files.dedup();
    debug!(target: DISCOVER_TARGET, roots = roots.len(), files = files.len(), "discovered files");
    Ok(files)
}

fn is_scannable(path: &Path, language: Option<SupportedLanguage>) -> bool {
    let inferred = SupportedLanguage::from_path(path);
    match language {
        Some(forced) => inferred == Some(forced),
        None => inferred.is_some(),
    }
}
