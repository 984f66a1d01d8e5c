/// Aggregate loading progress across every declared asset.
///
/// Failed loads count as finished, otherwise a single broken file would
/// keep the loading indicator up forever.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadingProgress {
    total: usize,
    finished: usize,
    failed: usize,
    failed_sources: Vec<String>,
    completion_reported: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressUpdate {
    Advanced { fraction: f32 },
    /// Emitted exactly once, when the last asset finishes.
    Completed,
}

impl LoadingProgress {
    pub fn new(total: usize) -> Self {
        Self { total, finished: 0, failed: 0, failed_sources: Vec::new(), completion_reported: false }
    }

    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.finished as f32 / self.total as f32
        }
    }

    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.finished >= self.total
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Names of the assets that failed, in the order they were reported.
    pub fn failed_sources(&self) -> &[String] {
        &self.failed_sources
    }

    /// Records a failed load under a name the overlay can show.
    pub fn record_failure(&mut self, source: impl Into<String>) -> Vec<ProgressUpdate> {
        let updates = self.record(false);
        if !updates.is_empty() {
            self.failed_sources.push(source.into());
        }
        updates
    }

    /// Records one finished load. Returns what the indicator should show.
    /// Extra reports past the declared total are ignored.
    pub fn record(&mut self, success: bool) -> Vec<ProgressUpdate> {
        if self.finished >= self.total {
            return Vec::new();
        }
        self.finished += 1;
        if !success {
            self.failed += 1;
        }
        let mut updates = vec![ProgressUpdate::Advanced { fraction: self.fraction() }];
        if self.is_complete() && !self.completion_reported {
            self.completion_reported = true;
            updates.push(ProgressUpdate::Completed);
        }
        updates
    }
}
