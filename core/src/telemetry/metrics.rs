use std::sync::Mutex;

/// Counts comparison requests over a session.
pub struct SubmissionMetrics {
    inner: Mutex<Counts>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Requests whose answer was dropped because a slot changed meanwhile.
    pub superseded: usize,
}

impl SubmissionMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Counts::default()),
        }
    }

    pub fn record_submitted(&self) {
        if let Ok(mut counts) = self.inner.lock() {
            counts.submitted += 1;
        }
    }

    pub fn record_succeeded(&self) {
        if let Ok(mut counts) = self.inner.lock() {
            counts.succeeded += 1;
        }
    }

    pub fn record_failed(&self) {
        if let Ok(mut counts) = self.inner.lock() {
            counts.failed += 1;
        }
    }

    pub fn record_superseded(&self) {
        if let Ok(mut counts) = self.inner.lock() {
            counts.superseded += 1;
        }
    }

    pub fn snapshot(&self) -> Counts {
        self.inner
            .lock()
            .map(|counts| *counts)
            .unwrap_or_default()
    }
}

impl Default for SubmissionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubmissionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionMetrics")
            .field("counts", &self.snapshot())
            .finish()
    }
}
