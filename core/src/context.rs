use std::collections::HashMap;
use std::time::{Duration, Instant};

/// The ambient context of a call: an optional deadline and string metadata.
///
/// Supplied when a stream is created and exposed read-only afterwards. The stream itself
/// never watches the deadline, transports may honor it.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    metadata: HashMap<String, String>,
}

impl CallContext {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { deadline: Some(Instant::now() + timeout), metadata: HashMap::new() }
    }

    #[inline]
    pub fn set_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[inline]
    pub fn set_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    #[inline(always)]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[inline]
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    /// Time left before the deadline, `None` if there's no deadline.
    ///
    /// Returns zero once the deadline has passed.
    #[inline]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.remaining() == Some(Duration::ZERO)
    }
}
