use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Achievement {
    FirstGame,
    PerfectGame,
    SpeedRunner,
    Marathoner,
    SharpEye,
}

impl Achievement {
    pub const ALL: [Achievement; 5] = [
        Achievement::FirstGame,
        Achievement::PerfectGame,
        Achievement::SpeedRunner,
        Achievement::Marathoner,
        Achievement::SharpEye,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Achievement::FirstGame => "First Steps",
            Achievement::PerfectGame => "Perfect Eye",
            Achievement::SpeedRunner => "Speed Reader",
            Achievement::Marathoner => "Marathoner",
            Achievement::SharpEye => "Sharp Eye",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::FirstGame => "Complete your first game",
            Achievement::PerfectGame => "Complete a game without any mistakes",
            Achievement::SpeedRunner => "Complete a game with over 50% time remaining",
            Achievement::Marathoner => "Score over 100 points in a single game",
            Achievement::SharpEye => "Achieve a streak of more than 10 correct identifications",
        }
    }
}

/// Figures of a finished session the end-of-session predicates look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub raw_score: u64,
    pub final_streak: u32,
    pub time_remaining_secs: u32,
    pub time_budget_secs: u32,
    pub correct_selections: u32,
    pub wrong_selections: u32,
}

type Predicate = fn(&SessionSummary) -> bool;

fn marathoner(s: &SessionSummary) -> bool {
    s.raw_score > 100
}

fn sharp_eye(s: &SessionSummary) -> bool {
    s.final_streak > 10
}

fn speed_runner(s: &SessionSummary) -> bool {
    s.time_remaining_secs > s.time_budget_secs / 2
}

fn perfect_game(s: &SessionSummary) -> bool {
    s.wrong_selections == 0 && s.correct_selections > 0
}

/// `FirstGame` is unlocked when a session starts, not here
const END_OF_SESSION: [(Achievement, Predicate); 4] = [
    (Achievement::Marathoner, marathoner),
    (Achievement::SharpEye, sharp_eye),
    (Achievement::SpeedRunner, speed_runner),
    (Achievement::PerfectGame, perfect_game),
];

/// Achievements a finished session qualifies for, in table order
pub fn qualifying(summary: &SessionSummary) -> Vec<Achievement> {
    END_OF_SESSION
        .iter()
        .filter(|(_, predicate)| predicate(summary))
        .map(|(achievement, _)| *achievement)
        .collect()
}
