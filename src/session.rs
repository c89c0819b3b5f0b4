use std::collections::BTreeMap;

use crate::achievements::Achievement;
use crate::annotation::{Span, SpanId};
use crate::store::DurableProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum SessionStatus {
    #[default]
    Idle,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum EndReason {
    /// Every false claim of the last level was caught
    Completed,
    TimeExpired,
    /// The player quit mid-session
    Abandoned,
}

/// How a span should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanMark {
    Unselected,
    Correct,
    Incorrect,
}

/// Notifications for the presentation layer, drained after each call
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Correct {
        span: SpanId,
    },
    /// Transient cue for a wrong selection; carries no engine state
    WrongSelection {
        span: SpanId,
        penalty_secs: u32,
    },
    LevelAdvanced {
        level: usize,
    },
    AchievementUnlocked(Achievement),
    SessionEnded {
        reason: EndReason,
        display_score: u64,
        new_high_score: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub status: SessionStatus,
    pub current_level: usize,
    pub spans: Vec<Span>,
    /// Current level only: `true` for a caught false claim, `false` for a mistake
    pub selections: BTreeMap<SpanId, bool>,
    pub raw_score: u64,
    pub time_remaining_secs: u32,
    pub current_streak: u32,
    // Whole-session tallies
    pub levels_completed: usize,
    pub correct_selections: u32,
    pub wrong_selections: u32,
    // Frozen when the session ends
    pub end_reason: Option<EndReason>,
    pub display_score: Option<u64>,
    pub progress: DurableProgress,
}

impl SessionState {
    pub fn with_progress(progress: DurableProgress) -> Self {
        Self {
            progress,
            ..Default::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn mark(&self, id: SpanId) -> SpanMark {
        match self.selections.get(&id) {
            Some(true) => SpanMark::Correct,
            Some(false) => SpanMark::Incorrect,
            None => SpanMark::Unselected,
        }
    }

    pub fn span(&self, id: SpanId) -> Option<&Span> {
        self.spans.iter().find(|s| s.id == Some(id))
    }

    /// Selectable spans of the current level, in reading order
    pub fn selectable_ids(&self) -> Vec<SpanId> {
        self.spans.iter().filter_map(|s| s.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::decode;

    #[test]
    fn default_state_is_idle_and_empty() {
        let state = SessionState::default();
        assert_eq!(state.status, SessionStatus::Idle);
        assert!(!state.is_active());
        assert!(state.spans.is_empty());
        assert_eq!(state.raw_score, 0);
        assert_eq!(state.end_reason, None);
    }

    #[test]
    fn marks_follow_selections() {
        let mut state = SessionState {
            spans: decode("[a] (b) [c]"),
            ..Default::default()
        };
        state.selections.insert(SpanId(0), true);
        state.selections.insert(SpanId(1), false);

        assert_eq!(state.mark(SpanId(0)), SpanMark::Correct);
        assert_eq!(state.mark(SpanId(1)), SpanMark::Incorrect);
        assert_eq!(state.mark(SpanId(2)), SpanMark::Unselected);
        assert_eq!(state.selectable_ids(), vec![SpanId(0), SpanId(1), SpanId(2)]);
        assert_eq!(state.span(SpanId(2)).map(|s| s.text.as_str()), Some("c"));
        assert!(state.span(SpanId(9)).is_none());
    }
}
