use std::collections::HashMap;

/// Key/value store for best scores, supplied by the host.
///
/// The engine reads a key once when a session starts and writes it whenever
/// the running score beats the stored value. How values are persisted is up
/// to the implementation.
pub trait ScoreStore {
    fn get(&self, key: &str) -> Option<u32>;
    fn set(&mut self, key: &str, score: u32);
}

impl<S> ScoreStore for &mut S
where
    S: ScoreStore + ?Sized,
{
    fn get(&self, key: &str) -> Option<u32> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, score: u32) {
        (**self).set(key, score);
    }
}

/// In-memory store; values are lost when it is dropped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryScoreStore {
    scores: HashMap<String, u32>,
}

impl MemoryScoreStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get(&self, key: &str) -> Option<u32> {
        self.scores.get(key).copied()
    }

    fn set(&mut self, key: &str, score: u32) {
        self.scores.insert(key.to_owned(), score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryScoreStore::new();
        assert_eq!(store.get("classic.best_score"), None);
        store.set("classic.best_score", 120);
        store.set("classic.best_score", 340);
        assert_eq!(store.get("classic.best_score"), Some(340));
        assert_eq!(store.get("zen.best_score"), None);
    }

    #[test]
    fn test_store_through_mutable_reference() {
        let mut store = MemoryScoreStore::new();
        {
            let mut borrowed = &mut store;
            ScoreStore::set(&mut borrowed, "blitz.best_score", 9);
            assert_eq!(ScoreStore::get(&borrowed, "blitz.best_score"), Some(9));
        }
        assert_eq!(store.get("blitz.best_score"), Some(9));
    }
}
