use log::info;
use std::collections::VecDeque;

const HISTORY_LIMIT: usize = 20;

/// Bounded record of workflow events, mirrored to the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<String>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        if self.entries.len() == HISTORY_LIMIT {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    /// Oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_recent_entries() {
        let mut log = ActivityLog::new();
        for i in 0..25 {
            log.record(format!("event {i}"));
        }
        assert_eq!(log.len(), HISTORY_LIMIT);
        assert_eq!(log.entries().next(), Some("event 5"));
        assert_eq!(log.entries().next_back(), Some("event 24"));
    }
}
