//! Player profile and the local best-runs list.
//!
//! The run controller only talks to the [`ProfileStore`] trait; the JSON
//! store keeps both files under ~/.poop-runner/.

use crate::leaderboard::LeaderboardEntry;
use crate::utils::persistence::{data_dir, load_json_or_default, save_json};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PROFILE_FILE: &str = "profile.json";
pub const BEST_RUNS_FILE: &str = "best_runs.json";
pub const DEFAULT_PLAYER_NAME: &str = "Player";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile storage failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub country: String,
}

impl Profile {
    pub fn new(name: &str, country: &str) -> Self {
        Self {
            name: name.to_string(),
            country: country.to_string(),
        }
    }

    /// `name#country`, or just the name without a country. A blank name
    /// shows as "Player".
    pub fn display_name(&self) -> String {
        let name = match self.name.trim() {
            "" => DEFAULT_PLAYER_NAME,
            name => name,
        };
        match self.country.trim() {
            "" => name.to_string(),
            country => format!("{}#{}", name, country),
        }
    }
}

/// One finished run in the local best list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub score: u32,
    pub rank: String,
    pub label: String,
    pub name: String,
}

impl RunRecord {
    /// Shown in place of the global ranking when it cannot be fetched.
    pub fn to_entry(&self) -> LeaderboardEntry {
        LeaderboardEntry {
            name: self.name.clone(),
            score: f64::from(self.score),
            rank: self.rank.clone(),
            label: self.label.clone(),
            avatar_data_url: None,
            created_at: 0,
        }
    }
}

/// Insert `record`, keep the list sorted best first (earlier runs win
/// ties) and cut it to `limit`.
pub fn merge_best(runs: &mut Vec<RunRecord>, record: RunRecord, limit: usize) {
    runs.push(record);
    runs.sort_by(|a, b| b.score.cmp(&a.score));
    runs.truncate(limit);
}

pub trait ProfileStore: Send {
    fn profile(&self) -> Profile;

    fn save_profile(&mut self, profile: &Profile) -> Result<(), ProfileError>;

    /// Best local runs, best first.
    fn best_runs(&self) -> Vec<RunRecord>;

    /// Add a run to the best list; returns the updated list.
    fn record_local_best(&mut self, record: RunRecord) -> Result<Vec<RunRecord>, ProfileError>;
}

/// Profile and best runs as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    dir: PathBuf,
    limit: usize,
}

impl JsonProfileStore {
    /// Store under ~/.poop-runner/.
    pub fn open(limit: usize) -> Result<Self, ProfileError> {
        Ok(Self::in_dir(&data_dir()?, limit))
    }

    pub fn in_dir(dir: &Path, limit: usize) -> Self {
        Self {
            dir: dir.to_path_buf(),
            limit,
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

impl ProfileStore for JsonProfileStore {
    fn profile(&self) -> Profile {
        load_json_or_default(&self.path(PROFILE_FILE))
    }

    fn save_profile(&mut self, profile: &Profile) -> Result<(), ProfileError> {
        save_json(&self.path(PROFILE_FILE), profile)?;
        Ok(())
    }

    fn best_runs(&self) -> Vec<RunRecord> {
        load_json_or_default(&self.path(BEST_RUNS_FILE))
    }

    fn record_local_best(&mut self, record: RunRecord) -> Result<Vec<RunRecord>, ProfileError> {
        let mut runs = self.best_runs();
        merge_best(&mut runs, record, self.limit);
        save_json(&self.path(BEST_RUNS_FILE), &runs)?;
        Ok(runs)
    }
}

/// A store that never touches the disk.
#[derive(Debug, Clone)]
pub struct MemoryProfileStore {
    profile: Profile,
    runs: Vec<RunRecord>,
    limit: usize,
}

impl Default for MemoryProfileStore {
    fn default() -> Self {
        Self::new(Profile::default(), 10)
    }
}

impl MemoryProfileStore {
    pub fn new(profile: Profile, limit: usize) -> Self {
        Self {
            profile,
            runs: Vec::new(),
            limit,
        }
    }
}

impl ProfileStore for MemoryProfileStore {
    fn profile(&self) -> Profile {
        self.profile.clone()
    }

    fn save_profile(&mut self, profile: &Profile) -> Result<(), ProfileError> {
        self.profile = profile.clone();
        Ok(())
    }

    fn best_runs(&self) -> Vec<RunRecord> {
        self.runs.clone()
    }

    fn record_local_best(&mut self, record: RunRecord) -> Result<Vec<RunRecord>, ProfileError> {
        merge_best(&mut self.runs, record, self.limit);
        Ok(self.runs.clone())
    }
}
