//! Score leaderboard
//!
//! Mirrors the backend `scores` ordering locally: score descending, then
//! oldest first. Persisted to LocalStorage on wasm32.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::persistence::scores::{ScoreRecord, ScoreStore, leaderboard_order};

/// Rows shown on the leaderboard
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub limit: usize,
    entries: Vec<ScoreRecord>,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl Leaderboard {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "jelly_runner_scores";

    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: Vec::new(),
        }
    }

    /// Sorted and truncated copy of arbitrary rows
    pub fn from_records(limit: usize, mut records: Vec<ScoreRecord>) -> Self {
        records.sort_by(leaderboard_order);
        records.truncate(limit);
        Self { limit, entries: records }
    }

    pub fn entries(&self) -> &[ScoreRecord] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// A new score has to beat the last row once the board is full.
    /// Zero never makes it.
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 || self.limit == 0 {
            return false;
        }
        if self.entries.len() < self.limit {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// 1-indexed rank a new score would take; ties rank after older rows
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let pos = self.entries.iter().position(|e| score > e.score);
        Some(pos.unwrap_or(self.entries.len()) + 1)
    }

    /// Place a row; returns its rank, or `None` if it fell off the board
    pub fn insert(&mut self, record: ScoreRecord) -> Option<usize> {
        if record.score == 0 {
            return None;
        }
        let pos = self
            .entries
            .iter()
            .position(|e| leaderboard_order(&record, e) == Ordering::Less)
            .unwrap_or(self.entries.len());
        if pos >= self.limit {
            return None;
        }
        self.entries.insert(pos, record);
        self.entries.truncate(self.limit);
        Some(pos + 1)
    }

    /// Replace the rows with the store's current top
    pub fn refresh<S: ScoreStore + ?Sized>(&mut self, store: &S) -> Result<(), BackendError> {
        let rows = store.top(self.limit)?;
        *self = Self::from_records(self.limit, rows);
        Ok(())
    }

    /// Load the leaderboard from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(json) = storage.and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten()) {
            if let Ok(board) = serde_json::from_str::<Leaderboard>(&json) {
                log::info!("Loaded {} scores", board.entries.len());
                return Self::from_records(board.limit, board.entries);
            }
        }

        log::info!("No saved scores, starting fresh");
        Self::default()
    }

    /// Save the leaderboard to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match serde_json::to_string(self) {
                Ok(json) => {
                    if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                        log::warn!("Failed to save scores");
                    } else {
                        log::info!("Scores saved ({} entries)", self.entries.len());
                    }
                }
                Err(err) => log::warn!("Failed to encode scores: {}", err),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::scores::{MemoryScoreStore, NewScore};
    use proptest::prelude::*;

    fn row(id: u64, score: u64, created_at: u64) -> ScoreRecord {
        ScoreRecord {
            id,
            name: format!("p{}", id),
            score,
            thumb_data: None,
            created_at,
        }
    }

    #[test]
    fn test_empty_board() {
        let board = Leaderboard::new(3);
        assert!(board.is_empty());
        assert_eq!(board.top_score(), None);
        assert!(!board.qualifies(0));
        assert_eq!(board.potential_rank(5), Some(1));
    }

    #[test]
    fn test_ties_rank_after_older() {
        let mut board = Leaderboard::new(3);
        assert_eq!(board.insert(row(1, 50, 10)), Some(1));
        assert_eq!(board.insert(row(2, 50, 20)), Some(2));
        assert_eq!(board.insert(row(3, 80, 30)), Some(1));
        let ids: Vec<u64> = board.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, [3, 1, 2]);

        // Full: a tie with the last row does not qualify
        assert!(!board.qualifies(50));
        assert_eq!(board.insert(row(4, 50, 40)), None);
        assert_eq!(board.potential_rank(60), Some(2));
        assert_eq!(board.insert(row(5, 60, 50)), Some(2));
        assert_eq!(board.entries().len(), 3);
        assert_eq!(board.top_score(), Some(80));
    }

    #[test]
    fn test_refresh_from_store() {
        let mut store = MemoryScoreStore::new(0);
        for score in [5.0, 40.0, 12.0, 40.0] {
            store.submit(NewScore::sanitized("x", score, None)).unwrap();
        }
        let mut board = Leaderboard::new(2);
        board.refresh(&store).unwrap();
        let scores: Vec<u64> = board.entries().iter().map(|e| e.score).collect();
        assert_eq!(scores, [40, 40]);
        assert!(board.entries()[0].created_at < board.entries()[1].created_at);
    }

    #[test]
    fn test_native_load_is_empty() {
        let board = Leaderboard::load();
        assert!(board.is_empty());
        assert_eq!(board.limit, DEFAULT_LIMIT);
        board.save();
    }

    proptest! {
        #[test]
        fn prop_insert_keeps_order_and_limit(
            scores in proptest::collection::vec(0u64..60, 0..50),
            limit in 1usize..12,
        ) {
            let mut board = Leaderboard::new(limit);
            for (i, s) in scores.iter().enumerate() {
                board.insert(row(i as u64 + 1, *s, i as u64));
            }
            prop_assert!(board.entries().len() <= limit);
            for pair in board.entries().windows(2) {
                prop_assert_ne!(leaderboard_order(&pair[0], &pair[1]), Ordering::Greater);
            }

            let all: Vec<ScoreRecord> = scores
                .iter()
                .enumerate()
                .filter(|(_, s)| **s > 0)
                .map(|(i, s)| row(i as u64 + 1, *s, i as u64))
                .collect();
            prop_assert_eq!(board, Leaderboard::from_records(limit, all));
        }
    }
}
