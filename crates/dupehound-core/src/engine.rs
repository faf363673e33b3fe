use glob::Pattern;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::cancel::CancelToken;
use crate::config::{HashComponents, ScanOptions};
use crate::detect::{self, GroupStream};
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::scanner::{self, ScanTotals};
use crate::store::{Index, CONFIG_HASH_COMPONENTS};

/// Generations retained by the post-run sweep: the current run and the one
/// before it.
const KEEP_GENERATIONS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    /// The consumer stopped the group stream early.
    Quit,
}

/// What the group consumer reports back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractOutcome {
    Finished,
    Quit,
}

#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub totals: ScanTotals,
    /// Duplicate-hash group count reported before streaming began.
    pub groups: u64,
}

/// Sequences one full run: scan, optional content-hash confirmation,
/// detection, consumer hand-off, sweep.
pub struct ScanEngine {
    options: ScanOptions,
}

impl ScanEngine {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Run the pipeline and hand the lazy group stream to `consume`.
    ///
    /// `consume` receives the count-only group total and the stream; it is
    /// free to stop early (returning [`InteractOutcome::Quit`]), which still
    /// sweeps. Cancellation and errors return before the sweep, leaving the
    /// index in its last consistent state.
    pub fn run<F>(
        &self,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
        consume: F,
    ) -> Result<RunSummary, Error>
    where
        F: FnOnce(u64, GroupStream<'_>) -> Result<InteractOutcome, Error>,
    {
        if !self.options.root.is_dir() {
            return Err(Error::RootNotFound(self.options.root.clone()));
        }
        let root = std::fs::canonicalize(&self.options.root)?;

        let index = Index::open(&self.options.db_path)?;
        let mask = self.options.components;
        let incremental = !self.options.full_scan && !self.mask_changed(&index, mask)?;
        index.set_config(CONFIG_HASH_COMPONENTS, &mask.bits().to_string())?;

        let ignore_patterns = compile_patterns(&self.options.ignore_patterns);

        // Scan phase
        info!("scanning {}", root.display());
        reporter.on_scan_start();
        let scan_start = Instant::now();
        let totals = scanner::run_scan_phase(
            &index,
            &root,
            mask,
            self.options.workers,
            incremental,
            &ignore_patterns,
            reporter,
            cancel,
        )?;
        reporter.on_scan_complete(totals.scanned, scan_start.elapsed().as_secs_f64());
        debug!(
            "scan done in {:.2}s — {} scanned, {} updated, {} skipped, {} errors",
            scan_start.elapsed().as_secs_f64(),
            totals.scanned,
            totals.updated,
            totals.skipped,
            totals.errors,
        );
        if cancel.is_cancelled() {
            return Ok(RunSummary {
                outcome: RunOutcome::Cancelled,
                totals,
                groups: 0,
            });
        }

        // Content-hash phase
        if mask.contains(HashComponents::CONTENT) {
            info!("confirming duplicate-size candidates by content");
            let hash_start = Instant::now();
            let hashed = scanner::run_content_hash_phase(
                &index,
                mask,
                self.options.workers,
                reporter,
                cancel,
            )?;
            reporter.on_hash_complete(hashed, hash_start.elapsed().as_secs_f64());
            debug!(
                "content phase done in {:.2}s — {} files hashed",
                hash_start.elapsed().as_secs_f64(),
                hashed,
            );
            if cancel.is_cancelled() {
                return Ok(RunSummary {
                    outcome: RunOutcome::Cancelled,
                    totals,
                    groups: 0,
                });
            }
        }

        // Detection + consumer hand-off. Metadata-only composites are written
        // during the scan phase, so both configurations group by hash here;
        // the size-only stream stays available for diagnostics.
        let groups = detect::count_by_hash(&index)?;
        info!("{groups} duplicate groups");
        let outcome = consume(groups, detect::by_hash(&index))?;

        let removed = index.sweep(KEEP_GENERATIONS)?;
        reporter.on_sweep_complete(removed);

        Ok(RunSummary {
            outcome: match outcome {
                InteractOutcome::Finished => RunOutcome::Completed,
                InteractOutcome::Quit => RunOutcome::Quit,
            },
            totals,
            groups,
        })
    }

    /// A persisted component mask that differs from the current one forces a
    /// full rescan; the scan rewrites records as it goes, nothing is erased.
    fn mask_changed(&self, index: &Index, mask: HashComponents) -> Result<bool, Error> {
        match index.config(CONFIG_HASH_COMPONENTS)? {
            Some(value) => {
                let stored = value
                    .parse::<u32>()
                    .map(HashComponents::from_bits)
                    .unwrap_or_else(|_| {
                        error!("unreadable hash_components config {value:?}; forcing full rescan");
                        HashComponents::empty()
                    });
                if stored != mask {
                    debug!(
                        "hash components changed ({} -> {}), full rescan",
                        stored.bits(),
                        mask.bits()
                    );
                }
                Ok(stored != mask)
            }
            None => Ok(false),
        }
    }
}

fn compile_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}
