//! High score leaderboard
//!
//! Tracks the top 10 finished sessions. The table itself is plain data; the
//! native build can persist it to a JSON file.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Where finished sessions report their score
pub trait ScoreSink {
    /// Offer a finished session; returns the rank achieved (1-indexed)
    fn record(&mut self, score: u64, ticks: u64) -> Option<usize>;
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player's score
    pub score: u64,
    /// Ticks the session lasted
    pub ticks: u64,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Errors from loading or saving the table
#[derive(Debug, thiserror::Error)]
pub enum HighScoreError {
    #[error("high score file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("high score file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// High score leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, score: u64, ticks: u64, timestamp: f64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            ticks,
            timestamp,
        };

        // Sorted descending; ties keep the earlier entry ahead
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load from a JSON file; a missing file is an empty table
    pub fn load(path: &Path) -> Result<Self, HighScoreError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No high scores at {}, starting fresh", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };
        let mut scores: HighScores = serde_json::from_str(&json)?;
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(MAX_HIGH_SCORES);
        log::info!("Loaded {} high scores", scores.entries.len());
        Ok(scores)
    }

    /// Save to a JSON file (written to a temp file, then renamed over)
    pub fn save(&self, path: &Path) -> Result<(), HighScoreError> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

impl ScoreSink for HighScores {
    fn record(&mut self, score: u64, ticks: u64) -> Option<usize> {
        let rank = self.add_score(score, ticks, now_ms());
        if let Some(rank) = rank {
            log::info!("New high score {score} at rank {rank}");
        }
        rank
    }
}

/// A high score table that writes itself back to disk after every record
#[derive(Debug)]
pub struct FileScores {
    pub scores: HighScores,
    path: std::path::PathBuf,
}

impl FileScores {
    pub fn open(path: impl Into<std::path::PathBuf>) -> Result<Self, HighScoreError> {
        let path = path.into();
        let scores = HighScores::load(&path)?;
        Ok(Self { scores, path })
    }
}

impl ScoreSink for FileScores {
    fn record(&mut self, score: u64, ticks: u64) -> Option<usize> {
        let rank = self.scores.record(score, ticks);
        if rank.is_some() {
            if let Err(e) = self.scores.save(&self.path) {
                log::warn!("could not save high scores: {e}");
            }
        }
        rank
    }
}

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
