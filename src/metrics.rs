// Bridge metrics module
//
// Lightweight counters describing how the background task bridge is being used

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Bridge-wide usage counters
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Workers and the UI thread both record into the process-wide instance
/// returned by [`global()`]; the summary is logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Runs that got a worker thread
    pub runs_started: AtomicU64,

    /// Run requests ignored because a run was active or a result was pending
    pub runs_ignored: AtomicU64,

    /// Active runs cancelled and abandoned by a restart
    pub runs_superseded: AtomicU64,

    /// Items handed to the consumer
    pub items_delivered: AtomicU64,

    /// Queue entries dropped because their run had been superseded
    pub stale_dropped: AtomicU64,

    /// Errors stored for the consumer
    pub errors_reported: AtomicU64,

    /// Producers that panicked on their worker thread
    pub producer_panics: AtomicU64,

    /// Frames ticked by the UI loop
    pub frames: AtomicU64,

    /// Application start time
    start_time: Instant,
}

static GLOBAL: OnceLock<Metrics> = OnceLock::new();

/// The process-wide metrics instance.
pub fn global() -> &'static Metrics {
    GLOBAL.get_or_init(Metrics::new)
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            runs_started: AtomicU64::new(0),
            runs_ignored: AtomicU64::new(0),
            runs_superseded: AtomicU64::new(0),
            items_delivered: AtomicU64::new(0),
            stale_dropped: AtomicU64::new(0),
            errors_reported: AtomicU64::new(0),
            producer_panics: AtomicU64::new(0),
            frames: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_run_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_ignored(&self) {
        self.runs_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_superseded(&self) {
        self.runs_superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_item_delivered(&self) {
        self.items_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_dropped(&self, count: usize) {
        self.stale_dropped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_reported.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_producer_panic(&self) {
        self.producer_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average UI frames per second since start
    pub fn avg_frame_rate(&self) -> f64 {
        let secs = self.uptime().as_secs_f64();
        if secs > 0.0 {
            self.frames.load(Ordering::Relaxed) as f64 / secs
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Task Bridge Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Runs: {} started, {} ignored, {} superseded",
            self.runs_started.load(Ordering::Relaxed),
            self.runs_ignored.load(Ordering::Relaxed),
            self.runs_superseded.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Items: {} delivered, {} stale dropped",
            self.items_delivered.load(Ordering::Relaxed),
            self.stale_dropped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Errors: {} reported, {} producer panics",
            self.errors_reported.load(Ordering::Relaxed),
            self.producer_panics.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Frames: {} ({:.1} fps average)",
            self.frames.load(Ordering::Relaxed),
            self.avg_frame_rate()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
