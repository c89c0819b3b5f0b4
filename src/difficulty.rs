use serde::{Deserialize, Serialize};

/// Time budget, wrong-answer penalty and score multiplier for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub name: String,
    pub time_budget_secs: u32,
    pub wrong_penalty_secs: u32,
    pub score_multiplier: f64,
}

impl DifficultyProfile {
    pub fn new(
        name: impl Into<String>,
        time_budget_secs: u32,
        wrong_penalty_secs: u32,
        score_multiplier: f64,
    ) -> Self {
        Self {
            name: name.into(),
            time_budget_secs,
            wrong_penalty_secs,
            score_multiplier,
        }
    }

    /// Score shown to the player: `floor(raw * multiplier)`
    pub fn display_score(&self, raw_score: u64) -> u64 {
        (raw_score as f64 * self.score_multiplier).floor() as u64
    }
}

/// Named profiles the engine can be configured with
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyTable {
    profiles: Vec<DifficultyProfile>,
    default_index: usize,
}

impl DifficultyTable {
    /// `default_name` falls back to the first profile when it is not in the table.
    /// Returns `None` for an empty profile list.
    pub fn new(profiles: Vec<DifficultyProfile>, default_name: &str) -> Option<Self> {
        if profiles.is_empty() {
            return None;
        }
        let default_index = profiles
            .iter()
            .position(|p| p.name == default_name)
            .unwrap_or(0);
        Some(Self {
            profiles,
            default_index,
        })
    }

    pub fn get(&self, name: &str) -> Option<&DifficultyProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn default_profile(&self) -> &DifficultyProfile {
        &self.profiles[self.default_index]
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn profiles(&self) -> &[DifficultyProfile] {
        &self.profiles
    }
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            profiles: vec![
                DifficultyProfile::new("easy", 240, 10, 1.0),
                DifficultyProfile::new("medium", 180, 20, 1.5),
                DifficultyProfile::new("hard", 120, 30, 2.0),
            ],
            default_index: 1,
        }
    }
}
