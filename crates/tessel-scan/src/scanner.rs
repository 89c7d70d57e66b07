//! The batch scanner.
//!
//! A [`Scanner`] owns one compiled matcher and runs it over many files on a
//! rayon pool. Each worker reads, parses and searches a whole file on its
//! own; results are collected back in input order, so the report does not
//! depend on which worker finished first.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use tessel_rule::{GlobalRules, RuleConfig, RuleCore, RuleError};
use tessel_syntax::{DetachedMatch, MatchResult, Matcher, Parser, Root, SupportedLanguage};

use crate::cancel::CancellationToken;
use crate::config::ScanConfig;
use crate::error::{FileError, ScanError};
use crate::report::{FileMatches, FileOutcome, ScanReport};

const SCAN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::scan");

/// Per-file result before it is turned into a public outcome.
enum Step<T> {
    Done(T),
    Failed(FileError),
    Skipped(PathBuf),
}

/// Runs one matcher over a batch of files.
#[derive(Debug)]
pub struct Scanner<M> {
    matcher: Arc<M>,
    config: ScanConfig,
}

impl<M> Scanner<M> {
    /// Creates a scanner for `matcher`.
    #[must_use]
    pub fn new(matcher: M, config: ScanConfig) -> Self {
        Self::from_shared(Arc::new(matcher), config)
    }

    /// Creates a scanner for a matcher that is already shared.
    #[must_use]
    pub const fn from_shared(matcher: Arc<M>, config: ScanConfig) -> Self {
        Self { matcher, config }
    }

    /// Returns the scan configuration.
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Returns the matcher.
    #[must_use]
    pub fn matcher(&self) -> &M {
        &self.matcher
    }
}

impl Scanner<RuleCore> {
    /// Compiles `rule` against `globals` and creates a scanner for it.
    ///
    /// `globals` is the rule context shared by every rule of a batch.
    ///
    /// # Errors
    ///
    /// Returns the [`RuleError`] from compilation. No file is touched before
    /// the rule compiles.
    pub fn from_rule(
        rule: &RuleConfig,
        globals: &GlobalRules,
        config: ScanConfig,
    ) -> Result<Self, RuleError> {
        Ok(Self::new(RuleCore::try_new(rule, globals)?, config))
    }
}

impl<M: Matcher + Send + Sync> Scanner<M> {
    /// Scans `paths`, producing one outcome per path in input order.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::ThreadPool`] when the worker pool cannot be
    /// built, [`ScanError::ParserSetup`] when a grammar cannot be loaded, and
    /// [`ScanError::FileFailed`] for the first failing file in fail-fast
    /// mode. Other per-file failures are recorded in the report.
    pub fn scan<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Result<ScanReport, ScanError> {
        self.scan_until(paths, &CancellationToken::new())
    }

    /// Scans `paths` until `cancel` is triggered. Files that had not started
    /// by then are reported as cancelled.
    ///
    /// # Errors
    ///
    /// As for [`Scanner::scan`].
    pub fn scan_until<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
        cancel: &CancellationToken,
    ) -> Result<ScanReport, ScanError> {
        let steps = self.run(paths, cancel, |path, root| self.search(path, root))?;
        let outcomes = steps
            .into_iter()
            .map(|step| match step {
                Step::Done(file) => FileOutcome::Matched(file),
                Step::Failed(err) => FileOutcome::Failed(err),
                Step::Skipped(path) => FileOutcome::Cancelled { path },
            })
            .collect();
        let report = ScanReport::new(outcomes);

        info!(
            target: SCAN_TARGET,
            files = paths.len(),
            processed = report.files_processed(),
            failed = report.files_failed(),
            cancelled = report.files_cancelled(),
            matches = report.match_count(),
            "scan finished"
        );
        Ok(report)
    }

    /// Scans `paths` and hands each searched file to `callback` in input
    /// order. Returns the number of files searched.
    ///
    /// # Errors
    ///
    /// As for [`Scanner::scan`].
    pub fn scan_with_callback<P, F>(&self, paths: &[P], mut callback: F) -> Result<usize, ScanError>
    where
        P: AsRef<Path> + Sync,
        F: FnMut(FileMatches),
    {
        let mut processed = 0;
        for outcome in self.scan(paths)?.into_outcomes() {
            if let FileOutcome::Matched(file) = outcome {
                callback(file);
                processed += 1;
            }
        }
        Ok(processed)
    }

    /// Parses `paths` without searching them and hands each tree to
    /// `callback` in input order. Returns the number of files parsed.
    ///
    /// Files that fail to load are logged and skipped.
    ///
    /// # Errors
    ///
    /// As for [`Scanner::scan`].
    pub fn parse_files<P, F>(&self, paths: &[P], mut callback: F) -> Result<usize, ScanError>
    where
        P: AsRef<Path> + Sync,
        F: FnMut(Root),
    {
        let steps = self.run(paths, &CancellationToken::new(), |_, root| root)?;
        let mut parsed = 0;
        for step in steps {
            if let Step::Done(root) = step {
                callback(root);
                parsed += 1;
            }
        }
        Ok(parsed)
    }

    fn run<P, T, W>(
        &self,
        paths: &[P],
        cancel: &CancellationToken,
        work: W,
    ) -> Result<Vec<Step<T>>, ScanError>
    where
        P: AsRef<Path> + Sync,
        T: Send,
        W: Fn(&Path, Root) -> T + Sync,
    {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count())
            .thread_name(|index| format!("tessel-scan-{index}"))
            .build()?;

        // Lowest index of a file that stops the batch; files after it are
        // not started.
        let stop_at = AtomicUsize::new(usize::MAX);
        let mut steps: Vec<Step<T>> = pool.install(|| {
            paths
                .par_iter()
                .enumerate()
                .map(|(index, input)| {
                    let path = input.as_ref();
                    if cancel.is_cancelled() || index > stop_at.load(Ordering::Acquire) {
                        return Step::Skipped(path.to_path_buf());
                    }
                    match self.load(path) {
                        Ok(root) => Step::Done(work(path, root)),
                        Err(err) => {
                            warn!(
                                target: SCAN_TARGET,
                                path = %path.display(),
                                error = %err,
                                "file failed"
                            );
                            if self.config.fail_fast || err.is_setup_failure() {
                                stop_at.fetch_min(index, Ordering::AcqRel);
                            }
                            Step::Failed(err)
                        }
                    }
                })
                .collect()
        });

        if let Some((_, err)) = take_failure(&mut steps, FileError::is_setup_failure) {
            return Err(ScanError::ParserSetup {
                source: Box::new(err),
            });
        }
        if self.config.fail_fast {
            if let Some((index, err)) = take_failure(&mut steps, |_| true) {
                return Err(ScanError::FileFailed {
                    index,
                    source: Box::new(err),
                });
            }
        }
        Ok(steps)
    }

    fn load(&self, path: &Path) -> Result<Root, FileError> {
        let language = self
            .config
            .language
            .or_else(|| SupportedLanguage::from_path(path))
            .ok_or_else(|| FileError::UnknownLanguage {
                path: path.to_path_buf(),
            })?;

        let read_error = |source| FileError::Read {
            path: path.to_path_buf(),
            source,
        };
        let size = fs::metadata(path).map_err(read_error)?.len();
        if size > self.config.max_file_bytes {
            return Err(FileError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.config.max_file_bytes,
            });
        }
        let source = fs::read_to_string(path).map_err(read_error)?;

        let root = Parser::new(language)
            .and_then(|mut parser| parser.parse_file(&source, &path.to_string_lossy()))
            .map_err(|source| FileError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            target: SCAN_TARGET,
            path = %path.display(),
            language = %language,
            bytes = source.len(),
            syntax_errors = root.has_errors(),
            "parsed file"
        );
        Ok(root)
    }

    fn search(&self, path: &Path, root: Root) -> FileMatches {
        let matches: Vec<DetachedMatch> = root
            .root()
            .find_all_with(self.matcher.as_ref(), self.config.overlap)
            .iter()
            .map(MatchResult::detach)
            .collect();
        debug!(
            target: SCAN_TARGET,
            path = %path.display(),
            matches = matches.len(),
            "searched file"
        );
        FileMatches::new(path.to_path_buf(), root, matches)
    }
}

impl<M: Matcher + Send + Sync + 'static> Scanner<M> {
    /// Runs the scan on a background thread.
    ///
    /// The returned handle can cancel the scan and wait for its report.
    #[must_use]
    pub fn spawn(&self, paths: Vec<PathBuf>) -> ScanHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let scanner = Self::from_shared(Arc::clone(&self.matcher), self.config.clone());
        let thread = thread::spawn(move || scanner.scan_until(&paths, &token));
        ScanHandle { cancel, thread }
    }
}

/// Removes the first failure accepted by `accept`, returning it with its
/// input index.
fn take_failure<T>(
    steps: &mut Vec<Step<T>>,
    accept: impl Fn(&FileError) -> bool,
) -> Option<(usize, FileError)> {
    let index = steps
        .iter()
        .position(|step| matches!(step, Step::Failed(err) if accept(err)))?;
    match steps.swap_remove(index) {
        Step::Failed(err) => Some((index, err)),
        Step::Done(_) | Step::Skipped(_) => None,
    }
}

/// A scan running on a background thread.
#[derive(Debug)]
pub struct ScanHandle {
    cancel: CancellationToken,
    thread: JoinHandle<Result<ScanReport, ScanError>>,
}

impl ScanHandle {
    /// Asks the scan to stop. Files already in flight complete.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns the token controlling this scan.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns whether the scan has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the scan and returns its report.
    ///
    /// # Errors
    ///
    /// Returns the scan's own error, or [`ScanError::WorkerPanicked`] if the
    /// background thread panicked.
    pub fn join(self) -> Result<ScanReport, ScanError> {
        self.thread
            .join()
            .map_err(|_| ScanError::WorkerPanicked)?
    }
}
