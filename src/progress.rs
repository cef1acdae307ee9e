//! Progress reporting for archive writing.
//!
//! The container writer and the page archiver report each entry as it is
//! added. Reporters are plain trait objects so callers can plug in a UI,
//! collect statistics, or ignore progress entirely.
//!
//! # Example
//!
//! ```rust
//! use pagezip::progress::{ProgressReporter, StatisticsProgress};
//!
//! let mut progress = StatisticsProgress::new();
//! progress.on_entry_start("index.html", 120);
//! progress.on_entry_complete("index.html", true);
//! assert_eq!(progress.state().entries_processed, 1);
//! ```

use std::time::{Duration, Instant};

const BYTES_KB: f64 = 1024.0;
const BYTES_MB: f64 = BYTES_KB * 1024.0;
const BYTES_GB: f64 = BYTES_MB * 1024.0;

/// Progress reporting trait for archive operations.
///
/// Every method has a no-op default.
pub trait ProgressReporter: Send {
    /// Called once with the number of entries about to be written.
    fn on_total(&mut self, total_entries: usize) {
        let _ = total_entries;
    }

    /// Called when starting to add a new entry.
    fn on_entry_start(&mut self, entry_name: &str, size: u64) {
        let _ = (entry_name, size);
    }

    /// Called after an entry's payload has been encoded.
    fn on_ratio(&mut self, input_bytes: u64, output_bytes: u64) {
        let _ = (input_bytes, output_bytes);
    }

    /// Called when an entry completes, successfully or not.
    fn on_entry_complete(&mut self, entry_name: &str, success: bool) {
        let _ = (entry_name, success);
    }

    /// Called on any warning during processing.
    fn on_warning(&mut self, message: &str) {
        let _ = message;
    }
}

/// Progress state with timing.
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// Number of entries expected, when announced.
    pub entries_total: usize,
    /// Number of entries completed successfully.
    pub entries_processed: usize,
    /// Number of entries that failed.
    pub entries_failed: usize,
    /// Uncompressed bytes of completed entries.
    pub processed_bytes: u64,
    /// Stored bytes of completed entries.
    pub packed_bytes: u64,
    /// Entry currently being processed.
    pub current_entry: Option<String>,
    /// Processing start time.
    pub start_time: Instant,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            entries_total: 0,
            entries_processed: 0,
            entries_failed: 0,
            processed_bytes: 0,
            packed_bytes: 0,
            current_entry: None,
            start_time: Instant::now(),
        }
    }
}

impl ProgressState {
    /// Creates a new progress state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the completion percentage by entry count (0.0 - 100.0).
    pub fn percentage(&self) -> f64 {
        if self.entries_total == 0 {
            0.0
        } else {
            (self.entries_processed as f64 / self.entries_total as f64) * 100.0
        }
    }

    /// Returns the compression ratio (packed / unpacked).
    pub fn compression_ratio(&self) -> f64 {
        if self.processed_bytes == 0 {
            1.0
        } else {
            self.packed_bytes as f64 / self.processed_bytes as f64
        }
    }

    /// Returns elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// A progress reporter that does nothing.
#[derive(Debug, Default, Clone)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// A progress reporter that collects statistics.
#[derive(Debug, Default, Clone)]
pub struct StatisticsProgress {
    /// The progress state.
    pub state: ProgressState,
    /// Warnings collected.
    pub warnings: Vec<String>,
    pending_size: u64,
}

impl StatisticsProgress {
    /// Creates a new statistics progress reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected state.
    pub fn state(&self) -> &ProgressState {
        &self.state
    }
}

impl ProgressReporter for StatisticsProgress {
    fn on_total(&mut self, total_entries: usize) {
        self.state.entries_total = total_entries;
    }

    fn on_entry_start(&mut self, entry_name: &str, size: u64) {
        self.state.current_entry = Some(entry_name.to_string());
        self.pending_size = size;
    }

    fn on_ratio(&mut self, _input_bytes: u64, output_bytes: u64) {
        self.state.packed_bytes += output_bytes;
    }

    fn on_entry_complete(&mut self, _entry_name: &str, success: bool) {
        if success {
            self.state.entries_processed += 1;
            self.state.processed_bytes += self.pending_size;
        } else {
            self.state.entries_failed += 1;
        }
        self.pending_size = 0;
        self.state.current_entry = None;
    }

    fn on_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}

/// A progress reporter that calls a closure for each completed entry.
pub struct ClosureProgress<F> {
    callback: F,
}

impl<F> ClosureProgress<F>
where
    F: FnMut(&str, bool) + Send,
{
    /// Creates a progress reporter from a closure.
    ///
    /// The closure receives the entry name and whether it succeeded.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgress<F>
where
    F: FnMut(&str, bool) + Send,
{
    fn on_entry_complete(&mut self, entry_name: &str, success: bool) {
        (self.callback)(entry_name, success)
    }
}

/// Creates a closure-based progress reporter.
pub fn progress_fn<F>(f: F) -> ClosureProgress<F>
where
    F: FnMut(&str, bool) + Send,
{
    ClosureProgress::new(f)
}

/// Formats bytes as a human-readable string using IEC units (KiB, MiB, GiB).
///
/// # Examples
///
/// ```rust
/// use pagezip::progress::format_bytes_iec;
///
/// assert_eq!(format_bytes_iec(512), "512 B");
/// assert_eq!(format_bytes_iec(1536), "1.5 KiB");
/// assert_eq!(format_bytes_iec(1048576), "1.0 MiB");
/// ```
pub fn format_bytes_iec(bytes: u64) -> String {
    let bytes_f64 = bytes as f64;
    if bytes_f64 < BYTES_KB {
        format!("{} B", bytes)
    } else if bytes_f64 < BYTES_MB {
        format!("{:.1} KiB", bytes_f64 / BYTES_KB)
    } else if bytes_f64 < BYTES_GB {
        format!("{:.1} MiB", bytes_f64 / BYTES_MB)
    } else {
        format!("{:.1} GiB", bytes_f64 / BYTES_GB)
    }
}
