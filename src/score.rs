use crate::constants::{
    DOT_SCORE_BASE, FRUIT_SCORE, GHOST_EATEN_SCORE, SCORE_DECAY_PER_SEC, TIME_BONUS_FLOOR_SECS,
    TIME_BONUS_MULTIPLIER,
};
use crate::notify::EventSink;
use crate::types::GameEvent;

/// Running score with time-decay pressure. Faster pickup chains earn a
/// larger bonus; idle time bleeds points away down to zero.
pub struct ScoreBoard {
    total: i32,
    decay_accumulator: f32,
    time_since_pickup: f32,
    last_event: Option<GameEvent>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        ScoreBoard {
            total: 0,
            decay_accumulator: 0.0,
            time_since_pickup: 0.0,
            last_event: None,
        }
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    pub fn last_event(&self) -> Option<&GameEvent> {
        self.last_event.as_ref()
    }

    /// Applies decay for one update. Fractional decay carries over between
    /// updates so small time steps still drain points at the same rate.
    pub fn tick(&mut self, dt: f32) {
        self.time_since_pickup += dt;
        self.decay_accumulator += SCORE_DECAY_PER_SEC * dt;
        let whole = self.decay_accumulator.floor();
        if whole >= 1.0 {
            self.decay_accumulator -= whole;
            self.total = (self.total - whole as i32).max(0);
        }
    }

    fn award_pickup(&mut self) {
        let gap = self.time_since_pickup.max(TIME_BONUS_FLOOR_SECS);
        let bonus = 1.0 + TIME_BONUS_MULTIPLIER / gap;
        self.total += (DOT_SCORE_BASE as f32 * bonus) as i32;
        self.time_since_pickup = 0.0;
    }
}

impl Default for ScoreBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ScoreBoard {
    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::PickupCollected { .. } => self.award_pickup(),
            GameEvent::FruitCollected { .. } => self.total += FRUIT_SCORE,
            GameEvent::GhostEaten { .. } => self.total += GHOST_EATEN_SCORE,
            GameEvent::PlayerDied { .. } | GameEvent::LevelCleared { .. } => {}
        }
        self.last_event = Some(event.clone());
    }
}
