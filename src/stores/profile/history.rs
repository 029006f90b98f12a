//! Recently viewed profiles

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{UserProfile, UserStats};

pub const HISTORY_CAPACITY: usize = 10;

/// Most-recently-viewed profiles, newest first, with their last known stats
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileHistory {
    pub profiles: Vec<UserProfile>,
    pub stats: HashMap<String, UserStats>,
}

impl ProfileHistory {
    /// Move `profile` to the front, evicting the oldest entry past capacity
    ///
    /// Returns whether the history changed.
    pub fn add_profile(&mut self, profile: UserProfile) -> bool {
        match self.profiles.iter().position(|p| p.pubkey == profile.pubkey) {
            Some(0) => return false,
            Some(index) => {
                self.profiles.remove(index);
                self.profiles.insert(0, profile);
                return true;
            }
            None => self.profiles.insert(0, profile),
        }

        if self.profiles.len() > HISTORY_CAPACITY {
            if let Some(evicted) = self.profiles.pop() {
                self.stats.remove(&evicted.pubkey);
            }
        }
        true
    }

    pub fn add_stats(&mut self, stats: UserStats) -> bool {
        if self.stats.get(&stats.pubkey) == Some(&stats) {
            return false;
        }
        self.stats.insert(stats.pubkey.clone(), stats);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
