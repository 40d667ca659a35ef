//! Leaderboard rows and the score store

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Name used when the player leaves the field empty
pub const DEFAULT_PLAYER_NAME: &str = "Player";
/// Longest stored name, in characters
pub const MAX_NAME_CHARS: usize = 40;
/// Long side of the score thumbnail in pixels
pub const THUMB_SIZE: u32 = 96;

/// A row of the `scores` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: u64,
    pub name: String,
    pub score: u64,
    /// PNG data URL of the player's skin, if one was captured
    pub thumb_data: Option<String>,
    /// Milliseconds since the Unix epoch
    pub created_at: u64,
}

/// Score desc, then oldest first
pub fn leaderboard_order(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(a.created_at.cmp(&b.created_at))
        .then(a.id.cmp(&b.id))
}

/// A score ready to insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScore {
    pub name: String,
    pub score: u64,
    pub thumb_data: Option<String>,
}

impl NewScore {
    /// Clean up raw form input: default and truncate the name, floor the
    /// score at zero, drop an empty thumbnail
    pub fn sanitized(name: &str, score: f64, thumb_data: Option<String>) -> Self {
        let score = if score.is_finite() { score.floor().max(0.0) as u64 } else { 0 };
        Self {
            name: sanitize_name(name),
            score,
            thumb_data: thumb_data.filter(|t| !t.is_empty()),
        }
    }
}

pub fn sanitize_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return DEFAULT_PLAYER_NAME.to_string();
    }
    name.chars().take(MAX_NAME_CHARS).collect()
}

/// Thumbnail dimensions: the long side becomes `THUMB_SIZE`, aspect kept
pub fn thumbnail_size(width: u32, height: u32) -> Option<(u32, u32)> {
    let long = width.max(height);
    if width == 0 || height == 0 {
        return None;
    }
    let s = THUMB_SIZE as f64 / long as f64;
    let scaled = |v: u32| ((v as f64 * s).round() as u32).max(1);
    Some((scaled(width), scaled(height)))
}

/// Backend table of scores
pub trait ScoreStore {
    fn submit(&mut self, score: NewScore) -> Result<ScoreRecord, BackendError>;

    /// Best scores in leaderboard order
    fn top(&self, limit: usize) -> Result<Vec<ScoreRecord>, BackendError>;
}

/// In-process score table
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    rows: Vec<ScoreRecord>,
    next_id: u64,
    /// Timestamp given to the next row; advances by one per insert
    clock_ms: u64,
}

impl MemoryScoreStore {
    pub fn new(start_ms: u64) -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
            clock_ms: start_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn submit(&mut self, score: NewScore) -> Result<ScoreRecord, BackendError> {
        if score.name.is_empty() {
            return Err(BackendError::MissingField("name"));
        }
        let record = ScoreRecord {
            id: self.next_id.max(1),
            name: score.name,
            score: score.score,
            thumb_data: score.thumb_data,
            created_at: self.clock_ms,
        };
        self.next_id = record.id + 1;
        self.clock_ms += 1;
        self.rows.push(record.clone());
        log::info!("Score submitted: {} by {}", record.score, record.name);
        Ok(record)
    }

    fn top(&self, limit: usize) -> Result<Vec<ScoreRecord>, BackendError> {
        let mut rows = self.rows.clone();
        rows.sort_by(leaderboard_order);
        rows.truncate(limit);
        Ok(rows)
    }
}
