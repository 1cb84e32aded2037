//! Progress reporting hooks for assembly.

/// Receives per-entry progress while the manifest is assembled.
///
/// # Examples
///
/// ```
/// use stubpack_core::ProgressCallback;
///
/// struct Printer;
///
/// impl ProgressCallback for Printer {
///     fn on_entry_start(&mut self, path: &str, total: usize, current: usize) {
///         println!("[{current}/{total}] {path}");
///     }
///
///     fn on_entry_complete(&mut self, _path: &str) {}
///
///     fn on_complete(&mut self) {
///         println!("done");
///     }
/// }
/// ```
pub trait ProgressCallback {
    /// Called before an entry is added or copied. `current` is 1-based.
    fn on_entry_start(&mut self, path: &str, total: usize, current: usize);

    /// Called after an entry was added or copied.
    fn on_entry_complete(&mut self, path: &str);

    /// Called once after the last entry.
    fn on_complete(&mut self);
}

/// Progress sink that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry_start(&mut self, _path: &str, _total: usize, _current: usize) {}

    fn on_entry_complete(&mut self, _path: &str) {}

    fn on_complete(&mut self) {}
}

/// Counts entries and forwards lifecycle events to a callback.
pub struct ProgressTracker<'a> {
    progress: &'a mut dyn ProgressCallback,
    current_entry: usize,
    total_entries: usize,
}

impl<'a> ProgressTracker<'a> {
    /// Creates a tracker for `total_entries` entries.
    #[must_use]
    pub fn new(progress: &'a mut dyn ProgressCallback, total_entries: usize) -> Self {
        Self {
            progress,
            current_entry: 0,
            total_entries,
        }
    }

    /// Reports the start of the next entry.
    pub fn on_entry_start(&mut self, path: &str) {
        self.current_entry += 1;
        self.progress
            .on_entry_start(path, self.total_entries, self.current_entry);
    }

    /// Reports completion of the current entry.
    pub fn on_entry_complete(&mut self, path: &str) {
        self.progress.on_entry_complete(path);
    }

    /// Reports completion of the whole operation.
    pub fn on_complete(&mut self) {
        self.progress.on_complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        started: Vec<(String, usize, usize)>,
        completed: usize,
        finished: bool,
    }

    impl ProgressCallback for Recorder {
        fn on_entry_start(&mut self, path: &str, total: usize, current: usize) {
            self.started.push((path.to_string(), total, current));
        }

        fn on_entry_complete(&mut self, _path: &str) {
            self.completed += 1;
        }

        fn on_complete(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn test_tracker_counts_entries() {
        let mut recorder = Recorder::default();
        {
            let mut tracker = ProgressTracker::new(&mut recorder, 2);
            tracker.on_entry_start("a.php");
            tracker.on_entry_complete("a.php");
            tracker.on_entry_start("b.php");
            tracker.on_entry_complete("b.php");
            tracker.on_complete();
        }

        assert_eq!(
            recorder.started,
            vec![("a.php".to_string(), 2, 1), ("b.php".to_string(), 2, 2)]
        );
        assert_eq!(recorder.completed, 2);
        assert!(recorder.finished);
    }

    #[test]
    fn test_noop_progress() {
        let mut noop = NoopProgress;
        let mut tracker = ProgressTracker::new(&mut noop, 1);
        tracker.on_entry_start("x");
        tracker.on_entry_complete("x");
        tracker.on_complete();
    }
}
