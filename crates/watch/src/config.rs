//! Coordinator configuration.

use std::time::Duration;

/// Configuration for the task watch coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Time between two polls of the running tasks
    pub poll_interval: Duration,
    /// Ids requested per `list_tasks` call
    pub page_size: usize,
    /// Upper bound on rows of the completed list
    pub completed_limit: usize,
    /// Deadline of one `get_task_info` call
    pub poll_timeout: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            page_size: 50,
            completed_limit: 100,
            poll_timeout: Duration::from_secs(10),
        }
    }
}

impl WatchConfig {
    /// Set the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the page size; zero is raised to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the per-poll deadline.
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    /// Set the completed list bound.
    pub fn with_completed_limit(mut self, completed_limit: usize) -> Self {
        self.completed_limit = completed_limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WatchConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert!(config.page_size > 0);
        assert!(config.poll_timeout > config.poll_interval);
    }

    #[test]
    fn test_zero_page_size_is_raised() {
        assert_eq!(WatchConfig::default().with_page_size(0).page_size, 1);
    }
}
