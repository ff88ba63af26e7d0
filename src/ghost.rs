use crate::constants::{
    spawn_delay_secs, ACTOR_SIZE_FACTOR, EATEN_SPEED_FACTOR, FEAR_DURATION_SECS,
    FEAR_SPEED_FACTOR, GHOST_BASE_SPEED, RESPAWN_FLICKER_COUNT, RESPAWN_FLICKER_PERIOD_SECS,
};
use crate::geometry::{cell_center, grid_index, squared_distance, Rect};
use crate::notify::ObserverList;
use crate::rng::Rng;
use crate::types::{Direction, GhostKind, GhostPhase, GhostView};

/// How many cells ahead of the target's facing the predictive kinds aim.
const LEAD_CELLS: f32 = 4.0;

pub struct Ghost {
    pub rect: Rect,
    pub kind: GhostKind,
    pub phase: GhostPhase,
    pub dir: Direction,
    /// Latches once the ghost first crosses a door outward. Never cleared.
    pub exited: bool,
    pub return_x: f32,
    pub return_y: f32,
    /// Remaining updates during which direction decisions stay suppressed
    /// after a door crossing, so the ghost clears the doorway.
    pub exit_steps: i32,
    spawn_delay: f32,
    spawn_timer: f32,
    fear_timer: f32,
    flicker_timer: f32,
    flicker_count: i32,
    cell_min: f32,
    observers: ObserverList<GhostView>,
}

impl Ghost {
    pub fn new(kind: GhostKind, x: f32, y: f32, exited: bool, cell_w: f32, cell_h: f32) -> Self {
        let cell_min = cell_w.min(cell_h);
        let size = ACTOR_SIZE_FACTOR * cell_min;
        Ghost {
            rect: Rect::new(x, y, size, size),
            kind,
            phase: GhostPhase::Spawning,
            dir: Direction::None,
            exited,
            return_x: x,
            return_y: y,
            exit_steps: 0,
            spawn_delay: spawn_delay_secs(kind),
            spawn_timer: 0.0,
            fear_timer: 0.0,
            flicker_timer: 0.0,
            flicker_count: 0,
            cell_min,
            observers: ObserverList::new(),
        }
    }

    pub fn speed(&self) -> f32 {
        let factor = match self.phase {
            GhostPhase::Fear => FEAR_SPEED_FACTOR,
            GhostPhase::Eaten => EATEN_SPEED_FACTOR,
            _ => 1.0,
        };
        GHOST_BASE_SPEED * factor
    }

    /// Waits out the per-kind spawn delay. Returns true on the update the
    /// ghost becomes active.
    pub fn advance_spawn(&mut self, dt: f32) -> bool {
        self.spawn_timer += dt;
        if self.spawn_timer >= self.spawn_delay {
            self.phase = GhostPhase::Chasing;
            return true;
        }
        false
    }

    /// Frightens the ghost. Only a chasing ghost reacts; every other phase
    /// ignores the trigger, including a ghost already in fear.
    pub fn enter_fear(&mut self) -> bool {
        if self.phase != GhostPhase::Chasing {
            return false;
        }
        self.phase = GhostPhase::Fear;
        self.fear_timer = 0.0;
        self.dir = self.dir.opposite();
        true
    }

    pub fn advance_fear(&mut self, dt: f32) -> bool {
        self.fear_timer += dt;
        if self.fear_timer >= FEAR_DURATION_SECS {
            self.phase = GhostPhase::Chasing;
            self.fear_timer = 0.0;
            return true;
        }
        false
    }

    /// Marks a feared ghost as eaten; it then races back to its return
    /// target at double speed.
    pub fn enter_eaten(&mut self) -> bool {
        if self.phase != GhostPhase::Fear {
            return false;
        }
        self.phase = GhostPhase::Eaten;
        self.fear_timer = 0.0;
        true
    }

    pub fn set_return_target(&mut self, x: f32, y: f32) {
        self.return_x = x;
        self.return_y = y;
    }

    pub fn at_return_target(&self) -> bool {
        let tolerance = self.cell_min / 4.0;
        squared_distance(self.rect.cx, self.rect.cy, self.return_x, self.return_y)
            <= tolerance * tolerance
    }

    /// Repositions for a fresh round after the player loses a life.
    pub fn reset_to_return_target(&mut self) {
        self.rect.cx = self.return_x;
        self.rect.cy = self.return_y;
        self.phase = GhostPhase::Chasing;
        self.dir = Direction::None;
        self.fear_timer = 0.0;
        self.exit_steps = 0;
    }

    pub fn begin_respawn(&mut self) {
        self.phase = GhostPhase::Respawning;
        self.rect.cx = self.return_x;
        self.rect.cy = self.return_y;
        self.dir = Direction::None;
        self.flicker_timer = 0.0;
        self.flicker_count = 0;
    }

    /// Counts flicker periods while respawning. Returns true once the
    /// flicker budget is spent and the ghost resumes chasing.
    pub fn advance_respawn(&mut self, dt: f32) -> bool {
        self.flicker_timer += dt;
        while self.flicker_timer >= RESPAWN_FLICKER_PERIOD_SECS {
            self.flicker_timer -= RESPAWN_FLICKER_PERIOD_SECS;
            self.flicker_count += 1;
        }
        if self.flicker_count >= RESPAWN_FLICKER_COUNT {
            self.phase = GhostPhase::Chasing;
            return true;
        }
        false
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            kind: self.kind,
            phase: self.phase,
            x: self.rect.cx,
            y: self.rect.cy,
            dir: self.dir,
            exited: self.exited,
        }
    }

    pub fn attach_observer(&mut self, observer: crate::notify::Observer<GhostView>) {
        self.observers.attach(observer);
    }

    pub fn detach_observers(&mut self) {
        self.observers.detach_all();
    }

    pub fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let view = self.view();
        self.observers.notify(&view);
    }
}

/// What the ghost steers relative to. For most phases this is the player;
/// an eaten ghost substitutes its own return target.
#[derive(Clone, Copy, Debug)]
pub struct DecisionContext {
    pub target_x: f32,
    pub target_y: f32,
    pub target_facing: Direction,
}

/// A ghost re-decides when a real choice exists after discounting the
/// reverse of its current direction, or when it can no longer continue
/// straight. In a plain corridor neither holds and it keeps going.
pub fn needs_direction_decision(current: Direction, viable: &[Direction]) -> bool {
    let reverse = current.opposite();
    let non_reverse = viable.iter().filter(|dir| **dir != reverse).count();
    non_reverse >= 2 || !viable.contains(&current)
}

/// Picks a direction among the viable ones. Reversal is excluded unless it
/// is the only option. Scoring kinds rank candidates by squared distance
/// from the next cell center to their objective; ties break uniformly.
pub fn choose_direction(
    ghost: &Ghost,
    viable: &[Direction],
    ctx: &DecisionContext,
    cell_w: f32,
    cell_h: f32,
    rng: &mut Rng,
) -> Direction {
    let reverse = ghost.dir.opposite();
    let mut candidates: Vec<Direction> =
        viable.iter().copied().filter(|dir| *dir != reverse).collect();
    if candidates.is_empty() {
        candidates = viable.to_vec();
    }
    if candidates.is_empty() {
        return Direction::None;
    }

    if ghost.phase == GhostPhase::Chasing && ghost.kind == GhostKind::Random {
        if candidates.contains(&ghost.dir) && rng.bool(0.5) {
            return ghost.dir;
        }
        return candidates[rng.pick_index(candidates.len())];
    }

    let (goal_x, goal_y, flee) = match ghost.phase {
        GhostPhase::Fear => (ctx.target_x, ctx.target_y, true),
        GhostPhase::Eaten => (ghost.return_x, ghost.return_y, false),
        _ => match ghost.kind {
            GhostKind::Chaser => (ctx.target_x, ctx.target_y, false),
            _ => {
                let (fx, fy) = ctx.target_facing.grid_offset();
                (
                    ctx.target_x + LEAD_CELLS * fx as f32 * cell_w,
                    ctx.target_y + LEAD_CELLS * fy as f32 * cell_h,
                    false,
                )
            }
        },
    };

    let col = grid_index(ghost.rect.cx, cell_w);
    let row = grid_index(ghost.rect.cy, cell_h);
    let scores: Vec<f32> = candidates
        .iter()
        .map(|dir| {
            let (dx, dy) = dir.grid_offset();
            let next_x = cell_center(col + dx, cell_w);
            let next_y = cell_center(row + dy, cell_h);
            squared_distance(next_x, next_y, goal_x, goal_y)
        })
        .collect();

    let mut best = scores[0];
    for score in &scores[1..] {
        if (flee && *score > best) || (!flee && *score < best) {
            best = *score;
        }
    }
    let tied: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, score)| (**score - best).abs() <= 1e-6)
        .map(|(index, _)| index)
        .collect();
    candidates[tied[rng.pick_index(tied.len())]]
}
