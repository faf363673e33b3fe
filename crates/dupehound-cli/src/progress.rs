use dupehound_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::Path;
use std::sync::Mutex;

/// Terminal progress: spinner for the scan phase (total unknown upfront),
/// bar for the content-hash phase (candidate count known).
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message("Scanning...");
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_scan_progress(&self, scanned: u64, updated: u64, skipped: u64) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(format!(
                "Scanning... {scanned} files ({updated} updated, {skipped} cached)"
            ));
        }
    }

    fn on_scan_complete(&self, scanned: u64, duration_secs: f64) {
        self.finish_bar();
        eprintln!("  \x1b[32m✓\x1b[0m Scan complete: {scanned} files in {duration_secs:.2}s");
    }

    fn on_hash_start(&self, total_files: u64) {
        let pb = ProgressBar::new(total_files);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Hashing [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
            )
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_hash_progress(&self, hashed: u64, _total_files: u64) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_position(hashed);
        }
    }

    fn on_hash_complete(&self, hashed: u64, duration_secs: f64) {
        self.finish_bar();
        eprintln!("  \x1b[32m✓\x1b[0m Content check: {hashed} files hashed in {duration_secs:.2}s");
    }

    fn on_path_error(&self, path: &Path, error: &io::Error) {
        let guard = self.bar.lock().unwrap();
        match guard.as_ref() {
            Some(pb) => pb.println(format!("  skipped {}: {}", path.display(), error)),
            None => eprintln!("  skipped {}: {}", path.display(), error),
        }
    }

    fn on_sweep_complete(&self, removed: usize) {
        if removed > 0 {
            eprintln!("  pruned {removed} stale index entries");
        }
    }
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}
