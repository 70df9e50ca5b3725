//! Load progress reporting.
//!
//! Overall progress across `N` files is
//! `completed / N + (received / total_bytes) / N`. A file whose size is not
//! declared contributes nothing until it completes, at which point progress
//! jumps straight to the file's end fraction.
//!
//! Progress reaches observers two ways: the [`LoadStatus`] watch channel
//! owned by the loader, and an optional [`ProgressCallback`] for rendering
//! backends such as `indicatif` progress bars.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Trait for reporting load progress to a rendering backend.
///
/// Implementations must be `Send + Sync` to support use across spawned
/// tokio tasks and `Arc`-based sharing.
pub trait ProgressCallback: Send + Sync {
    /// Set overall progress as a fraction in `[0, 1]`.
    fn set_fraction(&self, fraction: f64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark the load as successfully complete.
    fn finish(&self, msg: String);

    /// Mark the load as failed. Progress has already been reset to zero.
    fn fail(&self, msg: String);
}

/// A no-op implementation of [`ProgressCallback`] that silently ignores
/// all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_fraction(&self, _fraction: f64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn fail(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Observable state of a dataset load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    /// Not started yet.
    Idle,
    /// Fetching and decoding files.
    Loading {
        /// Overall progress (0.0 - 1.0).
        progress: f64,
    },
    /// Every file loaded and decoded.
    Ready,
    /// A file failed; nothing was loaded.
    Failed {
        /// Human-readable failure description.
        message: String,
    },
}

impl LoadStatus {
    /// Progress fraction implied by this status. Failed loads report zero.
    #[must_use]
    pub const fn progress(&self) -> f64 {
        match self {
            Self::Idle | Self::Failed { .. } => 0.0,
            Self::Loading { progress } => *progress,
            Self::Ready => 1.0,
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether the load has reached `Ready` or `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed { .. })
    }
}

/// Computes overall progress across a fixed number of files.
///
/// Reported fractions never decrease until [`ProgressTracker::reset`].
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_files: usize,
    completed: usize,
    current: f64,
}

impl ProgressTracker {
    #[must_use]
    pub const fn new(total_files: usize) -> Self {
        Self {
            total_files,
            completed: 0,
            current: 0.0,
        }
    }

    /// The most recently reported fraction.
    #[must_use]
    pub const fn fraction(&self) -> f64 {
        self.current
    }

    #[allow(clippy::cast_precision_loss)]
    fn file_share(&self) -> f64 {
        if self.total_files == 0 {
            1.0
        } else {
            1.0 / self.total_files as f64
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn start_fraction(&self) -> f64 {
        self.completed as f64 * self.file_share()
    }

    /// Records that `received` bytes of the current file have arrived.
    ///
    /// Returns the new overall fraction, or `None` when the file has no
    /// declared length and therefore no intermediate progress.
    #[allow(clippy::cast_precision_loss)]
    pub fn on_chunk(&mut self, received: u64, total_bytes: Option<u64>) -> Option<f64> {
        let total = total_bytes.filter(|&t| t > 0)?;
        let within = received.min(total) as f64 / total as f64;
        Some(self.advance(within.mul_add(self.file_share(), self.start_fraction())))
    }

    /// Marks the current file complete and returns the new fraction.
    ///
    /// Completing the last file yields exactly `1.0`.
    pub fn complete_file(&mut self) -> f64 {
        self.completed = (self.completed + 1).min(self.total_files);
        if self.completed >= self.total_files {
            self.current = 1.0;
            return self.current;
        }
        self.advance(self.start_fraction())
    }

    /// Returns to zero after a failure.
    pub const fn reset(&mut self) {
        self.completed = 0;
        self.current = 0.0;
    }

    fn advance(&mut self, fraction: f64) -> f64 {
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction > self.current {
            self.current = fraction;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_within_file_progress() {
        let mut tracker = ProgressTracker::new(4);

        let f = tracker.on_chunk(50, Some(100)).unwrap();
        assert!((f - 0.125).abs() < 1e-12);

        let f = tracker.complete_file();
        assert!((f - 0.25).abs() < 1e-12);

        let f = tracker.on_chunk(25, Some(100)).unwrap();
        assert!((f - 0.3125).abs() < 1e-12);
    }

    #[test]
    fn unknown_length_jumps_to_end_fraction() {
        let mut tracker = ProgressTracker::new(2);

        assert_eq!(tracker.on_chunk(1_000, None), None);
        assert_eq!(tracker.on_chunk(2_000, Some(0)), None);
        assert!(tracker.fraction().abs() < f64::EPSILON);

        let f = tracker.complete_file();
        assert!((f - 0.5).abs() < 1e-12);
    }

    #[test]
    fn last_file_reaches_exactly_one() {
        let mut tracker = ProgressTracker::new(3);
        for _ in 0..3 {
            tracker.on_chunk(7, Some(9));
            tracker.complete_file();
        }
        assert_eq!(tracker.fraction().to_bits(), 1.0_f64.to_bits());
    }

    #[test]
    fn never_decreases() {
        let mut tracker = ProgressTracker::new(2);
        let mut last = 0.0;

        for received in [10, 5, 80, 200, 60] {
            let f = tracker.on_chunk(received, Some(100)).unwrap();
            assert!(f >= last, "{f} < {last}");
            last = f;
        }
        // Overrun is clamped to the file's end fraction.
        assert!((last - 0.5).abs() < 1e-12);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut tracker = ProgressTracker::new(2);
        tracker.complete_file();
        tracker.reset();
        assert!(tracker.fraction().abs() < f64::EPSILON);
        let f = tracker.on_chunk(1, Some(2)).unwrap();
        assert!((f - 0.25).abs() < 1e-12);
    }

    #[test]
    fn status_progress() {
        assert!((LoadStatus::Loading { progress: 0.4 }.progress() - 0.4).abs() < f64::EPSILON);
        assert!((LoadStatus::Ready.progress() - 1.0).abs() < f64::EPSILON);
        let failed = LoadStatus::Failed {
            message: "boom".to_string(),
        };
        assert!(failed.progress().abs() < f64::EPSILON);
        assert!(failed.is_terminal());
        assert!(!LoadStatus::Idle.is_terminal());
    }
}
