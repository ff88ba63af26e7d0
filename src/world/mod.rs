use log::{debug, info};

use crate::constants::{DOOR_COMMIT_STEPS, DOT_SIZE_FACTOR, FRUIT_SIZE_FACTOR, WORLD_MAX};
use crate::geometry::Rect;
use crate::ghost::{choose_direction, needs_direction_decision, DecisionContext, Ghost};
use crate::level::{parse_level, LevelError};
use crate::notify::{EventHub, EventSink, ObserverList, ViewFactory};
use crate::player::Player;
use crate::rng::Rng;
use crate::score::ScoreBoard;
use crate::types::{
    Direction, EntityKind, GameEvent, GhostKind, GhostPhase, GhostView, ObstacleView,
    PickupFlavor, PickupView, PlayerView, Snapshot,
};

mod ghost_control;
mod movement;

use self::movement::{
    advance_rect, apply_wraparound, direction_viable, door_crossing, ghost_rules, overlaps_any,
    viable_directions, PLAYER_RULES,
};

/// Static cell-sized geometry. Walls stop every mover; doors stop the
/// player always and ghosts that have already left their enclosure.
pub struct Obstacle {
    pub rect: Rect,
    kind: EntityKind,
    observers: ObserverList<ObstacleView>,
}

impl Obstacle {
    pub(crate) fn new(kind: EntityKind, cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Obstacle {
            rect: Rect::new(cx, cy, width, height),
            kind,
            observers: ObserverList::new(),
        }
    }

    pub fn view(&self) -> ObstacleView {
        ObstacleView {
            kind: self.kind,
            x: self.rect.cx,
            y: self.rect.cy,
            width: self.rect.width(),
            height: self.rect.height(),
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let view = self.view();
        self.observers.notify(&view);
    }
}

pub struct Pickup {
    pub rect: Rect,
    pub flavor: PickupFlavor,
    pub collected: bool,
    observers: ObserverList<PickupView>,
}

impl Pickup {
    fn new(flavor: PickupFlavor, cx: f32, cy: f32, size: f32) -> Self {
        Pickup {
            rect: Rect::new(cx, cy, size, size),
            flavor,
            collected: false,
            observers: ObserverList::new(),
        }
    }

    pub fn view(&self) -> PickupView {
        PickupView {
            flavor: self.flavor,
            x: self.rect.cx,
            y: self.rect.cy,
            collected: self.collected,
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let view = self.view();
        self.observers.notify(&view);
    }
}

/// The whole simulation: level geometry, movers, score, and the event
/// plumbing. Deterministic for a given seed, level, and input script.
pub struct World {
    rng: Rng,
    score: ScoreBoard,
    hub: EventHub,
    events: Vec<GameEvent>,
    frame: u64,
    elapsed: f32,
    cell_w: f32,
    cell_h: f32,
    player: Option<Player>,
    ghosts: Vec<Ghost>,
    walls: Vec<Obstacle>,
    doors: Vec<Obstacle>,
    pickups: Vec<Pickup>,
    cleared: bool,
    game_over: bool,
}

impl World {
    pub fn new(seed: u32) -> Self {
        World {
            rng: Rng::new(seed),
            score: ScoreBoard::new(),
            hub: EventHub::new(),
            events: Vec::new(),
            frame: 0,
            elapsed: 0.0,
            cell_w: 0.0,
            cell_h: 0.0,
            player: None,
            ghosts: Vec::new(),
            walls: Vec::new(),
            doors: Vec::new(),
            pickups: Vec::new(),
            cleared: false,
            game_over: false,
        }
    }

    /// Replaces the current level with a freshly parsed one and resets all
    /// play state. A parse failure leaves the world untouched.
    pub fn load_level(
        &mut self,
        rows: &[&str],
        mut factory: Option<&mut dyn ViewFactory>,
    ) -> Result<(), LevelError> {
        let layout = parse_level(rows)?;
        self.clear_level();

        self.cell_w = layout.cell_w;
        self.cell_h = layout.cell_h;
        let cell_min = layout.cell_w.min(layout.cell_h);

        for (x, y) in &layout.walls {
            self.walls.push(Obstacle::new(
                EntityKind::Wall,
                *x,
                *y,
                layout.cell_w,
                layout.cell_h,
            ));
        }
        for (x, y) in &layout.doors {
            self.doors.push(Obstacle::new(
                EntityKind::Door,
                *x,
                *y,
                layout.cell_w,
                layout.cell_h,
            ));
        }
        for (x, y) in &layout.dots {
            self.pickups.push(Pickup::new(
                PickupFlavor::Dot,
                *x,
                *y,
                DOT_SIZE_FACTOR * cell_min,
            ));
        }
        for (x, y) in &layout.fruits {
            self.pickups.push(Pickup::new(
                PickupFlavor::Fruit,
                *x,
                *y,
                FRUIT_SIZE_FACTOR * cell_min,
            ));
        }
        self.player = layout
            .player_start
            .map(|(x, y)| Player::new(x, y, layout.cell_w, layout.cell_h));
        for start in &layout.ghost_starts {
            self.ghosts.push(Ghost::new(
                start.kind,
                start.x,
                start.y,
                start.exited,
                layout.cell_w,
                layout.cell_h,
            ));
        }

        self.score = ScoreBoard::new();
        self.events.clear();
        self.frame = 0;
        self.elapsed = 0.0;
        self.cleared = false;
        self.game_over = false;

        if let Some(factory) = factory.as_deref_mut() {
            if let Some(player) = &mut self.player {
                if let Some(observer) = factory.player_view() {
                    player.attach_observer(observer);
                }
            }
            for ghost in &mut self.ghosts {
                if let Some(observer) = factory.ghost_view(ghost.kind) {
                    ghost.attach_observer(observer);
                }
            }
            for pickup in &mut self.pickups {
                if let Some(observer) = factory.pickup_view(pickup.flavor) {
                    pickup.observers.attach(observer);
                }
            }
            for obstacle in self.walls.iter_mut().chain(self.doors.iter_mut()) {
                if let Some(observer) = factory.obstacle_view(obstacle.kind) {
                    obstacle.observers.attach(observer);
                }
            }
        }

        // Everything reports its initial state once, including geometry
        // that will never notify again.
        for obstacle in self.walls.iter_mut().chain(self.doors.iter_mut()) {
            obstacle.notify();
        }
        for pickup in &mut self.pickups {
            pickup.notify();
        }
        for ghost in &mut self.ghosts {
            ghost.notify();
        }
        if let Some(player) = &mut self.player {
            player.notify();
        }

        info!(
            "loaded {}x{} level: {} dots, {} fruits, {} ghosts",
            layout.cols,
            layout.rows,
            layout.dots.len(),
            layout.fruits.len(),
            layout.ghost_starts.len()
        );
        Ok(())
    }

    fn clear_level(&mut self) {
        if let Some(player) = &mut self.player {
            player.detach_observers();
        }
        for ghost in &mut self.ghosts {
            ghost.detach_observers();
        }
        for pickup in &mut self.pickups {
            pickup.observers.detach_all();
        }
        for obstacle in self.walls.iter_mut().chain(self.doors.iter_mut()) {
            obstacle.observers.detach_all();
        }
        self.player = None;
        self.ghosts.clear();
        self.walls.clear();
        self.doors.clear();
        self.pickups.clear();
    }

    /// Advances the simulation by `dt` seconds. Does nothing once the game
    /// has ended.
    pub fn step(&mut self, dt: f32) {
        if self.is_ended() {
            return;
        }
        self.frame += 1;
        self.elapsed += dt;

        let mut pending = Vec::new();
        self.update_player(dt, &mut pending);
        if pending
            .iter()
            .any(|event| matches!(event, GameEvent::FruitCollected { .. }))
        {
            self.trigger_fear();
        }
        let dying = self.player.as_ref().is_some_and(|player| player.dying);
        if !dying {
            self.update_ghosts(dt);
            self.resolve_captures(&mut pending);
        }
        self.score.tick(dt);
        self.check_progress(&mut pending);
        for event in pending {
            self.emit(event);
        }
    }

    fn update_player(&mut self, dt: f32, pending: &mut Vec<GameEvent>) {
        let Some(mut player) = self.player.take() else {
            return;
        };

        if player.dying {
            if player.advance_death(dt) {
                if player.lives > 0 {
                    player.respawn();
                    self.reset_ghosts_after_death();
                    debug!("player respawned, {} lives left", player.lives);
                } else {
                    self.game_over = true;
                    info!("game over after {:.1}s", self.elapsed);
                }
            }
            player.notify();
            self.player = Some(player);
            return;
        }

        if player.buffered_dir != Direction::None
            && direction_viable(
                &self.walls,
                &self.doors,
                &player.rect,
                player.buffered_dir,
                self.cell_w,
                self.cell_h,
                PLAYER_RULES,
            )
        {
            player.dir = player.buffered_dir;
            player.buffered_dir = Direction::None;
        }

        if player.dir != Direction::None {
            let before = player.rect;
            advance_rect(
                &mut player.rect,
                player.dir,
                player.speed * dt,
                self.cell_w,
                self.cell_h,
            );
            apply_wraparound(&mut player.rect);
            if overlaps_any(&self.walls, &player.rect) || overlaps_any(&self.doors, &player.rect)
            {
                player.rect = before;
                player.dir = Direction::None;
            }
        }

        for pickup in &mut self.pickups {
            if pickup.collected || !pickup.rect.overlaps(&player.rect) {
                continue;
            }
            pickup.collected = true;
            player.pickups_collected += 1;
            pickup.notify();
            let (x, y) = (pickup.rect.cx, pickup.rect.cy);
            match pickup.flavor {
                PickupFlavor::Dot => pending.push(GameEvent::PickupCollected { x, y }),
                PickupFlavor::Fruit => pending.push(GameEvent::FruitCollected { x, y }),
            }
        }

        player.notify();
        self.player = Some(player);
    }

    fn resolve_captures(&mut self, pending: &mut Vec<GameEvent>) {
        let Some(mut player) = self.player.take() else {
            return;
        };
        if player.dying {
            self.player = Some(player);
            return;
        }

        for ghost in &mut self.ghosts {
            if !ghost.rect.overlaps(&player.rect) {
                continue;
            }
            match ghost.phase {
                GhostPhase::Fear => {
                    if ghost.enter_eaten() {
                        pending.push(GameEvent::GhostEaten {
                            kind: ghost.kind,
                            x: ghost.rect.cx,
                            y: ghost.rect.cy,
                        });
                        ghost.notify();
                    }
                }
                GhostPhase::Chasing => {
                    player.begin_death();
                    pending.push(GameEvent::PlayerDied {
                        lives_left: player.lives,
                    });
                    player.notify();
                    break;
                }
                _ => {}
            }
        }

        self.player = Some(player);
    }

    fn check_progress(&mut self, pending: &mut Vec<GameEvent>) {
        if self.cleared || self.game_over {
            return;
        }
        let had_dots = self
            .pickups
            .iter()
            .any(|pickup| pickup.flavor == PickupFlavor::Dot);
        if had_dots && self.dots_remaining() == 0 {
            self.cleared = true;
            let collected = self
                .player
                .as_ref()
                .map_or(0, |player| player.pickups_collected);
            pending.push(GameEvent::LevelCleared {
                pickups_collected: collected,
            });
            info!("level cleared after {:.1}s", self.elapsed);
        }
    }

    fn emit(&mut self, event: GameEvent) {
        self.score.on_event(&event);
        self.hub.publish(&event);
        self.events.push(event);
    }

    /// Serializable view of the whole world. With `include_events` the
    /// buffered events are handed over and cleared, so each event reaches
    /// exactly one draining snapshot.
    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            frame: self.frame,
            elapsed_secs: self.elapsed,
            score: self.score.total(),
            lives: self.lives(),
            dots_remaining: self.dots_remaining(),
            player: self.player.as_ref().map(|player| player.view()),
            ghosts: self.ghosts.iter().map(|ghost| ghost.view()).collect(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn buffer_player_direction(&mut self, dir: Direction) {
        if let Some(player) = &mut self.player {
            player.buffer_direction(dir);
        }
    }

    pub fn add_event_sink(&mut self, sink: Box<dyn EventSink>) {
        self.hub.add_sink(sink);
    }

    pub fn player(&self) -> Option<PlayerView> {
        self.player.as_ref().map(|player| player.view())
    }

    pub fn ghosts(&self) -> Vec<GhostView> {
        self.ghosts.iter().map(|ghost| ghost.view()).collect()
    }

    pub fn pickups(&self) -> Vec<PickupView> {
        self.pickups.iter().map(|pickup| pickup.view()).collect()
    }

    pub fn obstacles(&self) -> Vec<ObstacleView> {
        self.walls
            .iter()
            .chain(self.doors.iter())
            .map(|obstacle| obstacle.view())
            .collect()
    }

    pub fn player_viable_directions(&self) -> Vec<Direction> {
        match &self.player {
            Some(player) => viable_directions(
                &self.walls,
                &self.doors,
                &player.rect,
                self.cell_w,
                self.cell_h,
                PLAYER_RULES,
            ),
            None => Vec::new(),
        }
    }

    pub fn score(&self) -> i32 {
        self.score.total()
    }

    pub fn lives(&self) -> i32 {
        self.player.as_ref().map_or(0, |player| player.lives)
    }

    pub fn dots_remaining(&self) -> usize {
        self.pickups
            .iter()
            .filter(|pickup| pickup.flavor == PickupFlavor::Dot && !pickup.collected)
            .count()
    }

    pub fn last_event(&self) -> Option<&GameEvent> {
        self.score.last_event()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed
    }

    pub fn cell_size(&self) -> (f32, f32) {
        (self.cell_w, self.cell_h)
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_ended(&self) -> bool {
        self.cleared || self.game_over
    }

    /// Sanity scan used by the headless harness: no resting mover may
    /// overlap solid geometry.
    pub fn find_overlap_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if let Some(player) = &self.player {
            for obstacle in self.walls.iter().chain(self.doors.iter()) {
                if obstacle.rect.overlaps(&player.rect) {
                    violations.push(format!(
                        "player overlaps {:?} at ({:.3}, {:.3})",
                        obstacle.kind, obstacle.rect.cx, obstacle.rect.cy
                    ));
                }
            }
        }
        for ghost in &self.ghosts {
            if !matches!(
                ghost.phase,
                GhostPhase::Chasing | GhostPhase::Fear | GhostPhase::Eaten
            ) {
                continue;
            }
            for wall in &self.walls {
                if wall.rect.overlaps(&ghost.rect) {
                    violations.push(format!(
                        "{:?} ghost overlaps wall at ({:.3}, {:.3})",
                        ghost.kind, wall.rect.cx, wall.rect.cy
                    ));
                }
            }
        }
        violations
    }
}
