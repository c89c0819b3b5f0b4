use tracing::{debug, info, warn};

use crate::achievements::{self, Achievement, SessionSummary};
use crate::annotation::{SpanId, SpanKind};
use crate::article::Article;
use crate::difficulty::{DifficultyProfile, DifficultyTable};
use crate::session::{EndReason, EngineEvent, SessionState, SessionStatus, SpanMark};
use crate::store::{DurableProgress, ProgressStore};
use crate::util::format_clock;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("a session needs at least one level")]
    NoLevels,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("difficulty can only be changed before a session starts")]
    NotIdle,
}

/// Owns the game state and applies every transition to it.
///
/// The engine is synchronous and untimed: an external driver calls
/// [`SessionEngine::tick`] once per elapsed second while a session is active.
/// Calls that make no sense in the current state are ignored.
pub struct SessionEngine {
    levels: Vec<Article>,
    difficulties: DifficultyTable,
    profile: DifficultyProfile,
    state: SessionState,
    store: Box<dyn ProgressStore>,
    events: Vec<EngineEvent>,
}

impl SessionEngine {
    pub fn new(
        levels: Vec<Article>,
        difficulties: DifficultyTable,
        store: Box<dyn ProgressStore>,
    ) -> Result<Self, EngineError> {
        if levels.is_empty() {
            return Err(EngineError::NoLevels);
        }

        let progress = match store.load() {
            Ok(progress) => progress,
            Err(e) => {
                warn!(error = %e, "failed to load progress, starting from defaults");
                DurableProgress::default()
            }
        };
        let profile = difficulties.default_profile().clone();
        let state = idle_state(&levels[0], &profile, progress);

        Ok(Self {
            levels,
            difficulties,
            profile,
            state,
            store,
            events: Vec::new(),
        })
    }

    /// Leave a finished session for Idle so the difficulty can change again.
    /// Durable progress stays as it is in memory; nothing is reloaded.
    pub fn reset(&mut self) {
        if self.state.status != SessionStatus::Ended {
            return;
        }
        let progress = std::mem::take(&mut self.state.progress);
        self.state = idle_state(&self.levels[0], &self.profile, progress);
        debug!("back to idle");
    }

    /// Pick the difficulty for the next session
    pub fn configure(&mut self, difficulty: &str) -> Result<(), EngineError> {
        if self.state.status != SessionStatus::Idle {
            return Err(EngineError::NotIdle);
        }
        let profile = self
            .difficulties
            .get(difficulty)
            .ok_or_else(|| EngineError::UnknownDifficulty(difficulty.to_string()))?;

        debug!(difficulty, "configured");
        self.profile = profile.clone();
        self.state.time_remaining_secs = self.profile.time_budget_secs;
        Ok(())
    }

    /// Begin a fresh session, discarding any previous one
    pub fn start(&mut self) {
        let progress = std::mem::take(&mut self.state.progress);
        self.state = SessionState {
            status: SessionStatus::Active,
            spans: self.levels[0].spans(),
            time_remaining_secs: self.profile.time_budget_secs,
            progress,
            ..Default::default()
        };

        self.state.progress.games_played += 1;
        self.unlock(Achievement::FirstGame);
        self.persist();

        info!(
            difficulty = %self.profile.name,
            levels = self.levels.len(),
            games_played = self.state.progress.games_played,
            "session started"
        );
    }

    pub fn select_span(&mut self, id: SpanId) {
        if !self.state.is_active() || self.state.selections.contains_key(&id) {
            return;
        }
        let Some(kind) = self.state.span(id).map(|span| span.kind) else {
            debug!(span_id = id.0, "ignoring selection of unknown span");
            return;
        };

        match kind {
            SpanKind::FalseClaim => {
                self.state.raw_score += 1;
                self.state.current_streak += 1;
                self.state.correct_selections += 1;
                self.state.selections.insert(id, true);
                self.events.push(EngineEvent::Correct { span: id });

                if self.state.current_streak > self.state.progress.best_streak_ever {
                    self.state.progress.best_streak_ever = self.state.current_streak;
                    self.persist();
                }
            }
            SpanKind::SurprisingTruth => {
                let penalty = self.profile.wrong_penalty_secs;
                self.state.raw_score = self.state.raw_score.saturating_sub(1);
                self.state.current_streak = 0;
                self.state.wrong_selections += 1;
                self.state.time_remaining_secs =
                    self.state.time_remaining_secs.saturating_sub(penalty);
                self.state.selections.insert(id, false);
                self.events.push(EngineEvent::WrongSelection {
                    span: id,
                    penalty_secs: penalty,
                });

                if self.state.time_remaining_secs == 0 {
                    self.finish(EndReason::TimeExpired);
                    return;
                }
            }
            SpanKind::Plain => return,
        }

        if self.level_cleared() {
            self.advance_level();
        }
    }

    /// One second of wall-clock time has passed
    pub fn tick(&mut self) {
        if !self.state.is_active() || self.state.time_remaining_secs == 0 {
            return;
        }
        self.state.time_remaining_secs -= 1;
        if self.state.time_remaining_secs == 0 {
            self.finish(EndReason::TimeExpired);
        }
    }

    /// The player gives up on the running session
    pub fn end(&mut self) {
        if self.state.is_active() {
            self.finish(EndReason::Abandoned);
        }
    }

    fn level_cleared(&self) -> bool {
        self.state
            .spans
            .iter()
            .filter(|span| span.kind == SpanKind::FalseClaim)
            .all(|span| {
                span.id
                    .and_then(|id| self.state.selections.get(&id))
                    .copied()
                    .unwrap_or(false)
            })
    }

    fn advance_level(&mut self) {
        self.state.levels_completed += 1;

        if self.state.current_level + 1 >= self.levels.len() {
            self.finish(EndReason::Completed);
            return;
        }

        self.state.current_level += 1;
        self.state.spans = self.levels[self.state.current_level].spans();
        self.state.selections.clear();
        self.events.push(EngineEvent::LevelAdvanced {
            level: self.state.current_level,
        });
        debug!(level = self.state.current_level, "level advanced");
    }

    /// End-of-session bookkeeping. Does nothing unless a session is active,
    /// so a second call cannot count or unlock anything twice.
    fn finish(&mut self, reason: EndReason) {
        if !self.state.is_active() {
            return;
        }
        self.state.status = SessionStatus::Ended;
        self.state.end_reason = Some(reason);

        let display_score = self.profile.display_score(self.state.raw_score);
        self.state.display_score = Some(display_score);
        let new_high_score = self
            .state
            .progress
            .record_score(&self.profile.name, display_score);

        if reason != EndReason::Abandoned {
            for achievement in achievements::qualifying(&self.summary()) {
                self.unlock(achievement);
            }
        }
        self.persist();

        self.events.push(EngineEvent::SessionEnded {
            reason,
            display_score,
            new_high_score,
        });
        info!(
            %reason,
            raw_score = self.state.raw_score,
            display_score,
            new_high_score,
            "session ended"
        );
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            raw_score: self.state.raw_score,
            final_streak: self.state.current_streak,
            time_remaining_secs: self.state.time_remaining_secs,
            time_budget_secs: self.profile.time_budget_secs,
            correct_selections: self.state.correct_selections,
            wrong_selections: self.state.wrong_selections,
        }
    }

    fn unlock(&mut self, achievement: Achievement) {
        if self.state.progress.unlock(achievement) {
            info!(%achievement, "achievement unlocked");
            self.events.push(EngineEvent::AchievementUnlocked(achievement));
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.state.progress) {
            warn!(error = %e, "failed to save progress");
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn difficulties(&self) -> &DifficultyTable {
        &self.difficulties
    }

    pub fn levels(&self) -> &[Article] {
        &self.levels
    }

    pub fn current_article(&self) -> &Article {
        &self.levels[self.state.current_level]
    }

    pub fn mark(&self, id: SpanId) -> SpanMark {
        self.state.mark(id)
    }

    pub fn countdown(&self) -> String {
        format_clock(self.state.time_remaining_secs)
    }

    pub fn level_label(&self) -> String {
        format!(
            "Level {}/{} · {}",
            self.state.current_level + 1,
            self.levels.len(),
            self.current_article().category
        )
    }

    /// Score as shown while playing
    pub fn live_display_score(&self) -> u64 {
        self.state
            .display_score
            .unwrap_or_else(|| self.profile.display_score(self.state.raw_score))
    }

    /// Events produced since the last call
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

}

/// Idle shows the first level and the full clock
fn idle_state(
    first: &Article,
    profile: &DifficultyProfile,
    progress: DurableProgress,
) -> SessionState {
    let mut state = SessionState::with_progress(progress);
    state.spans = first.spans();
    state.time_remaining_secs = profile.time_budget_secs;
    state
}
