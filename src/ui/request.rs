use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic request tags; only the newest request may apply its result
#[derive(Debug, Default)]
pub struct RequestGenerations {
    current: AtomicU64,
}

impl RequestGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding every earlier one
    pub fn next(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }

    /// Make every in-flight request stale
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_wins() {
        let generations = RequestGenerations::new();
        let first = generations.next();
        let second = generations.next();
        assert!(!generations.is_current(first));
        assert!(generations.is_current(second));

        generations.invalidate();
        assert!(!generations.is_current(second));
    }
}
