use crate::constants::{ACTOR_SIZE_FACTOR, DEATH_ANIMATION_SECS, PLAYER_BASE_SPEED, PLAYER_LIVES};
use crate::geometry::Rect;
use crate::notify::ObserverList;
use crate::types::{Direction, PlayerView};

/// The player avatar. Movement itself lives in the world stepper; this type
/// owns the state the stepper mutates and the per-entity observer list.
pub struct Player {
    pub rect: Rect,
    pub dir: Direction,
    pub buffered_dir: Direction,
    pub speed: f32,
    pub lives: i32,
    pub dying: bool,
    pub death_timer: f32,
    pub pickups_collected: i32,
    start_x: f32,
    start_y: f32,
    observers: ObserverList<PlayerView>,
}

impl Player {
    pub fn new(x: f32, y: f32, cell_w: f32, cell_h: f32) -> Self {
        let size = ACTOR_SIZE_FACTOR * cell_w.min(cell_h);
        Player {
            rect: Rect::new(x, y, size, size),
            dir: Direction::None,
            buffered_dir: Direction::None,
            speed: PLAYER_BASE_SPEED,
            lives: PLAYER_LIVES,
            dying: false,
            death_timer: 0.0,
            pickups_collected: 0,
            start_x: x,
            start_y: y,
            observers: ObserverList::new(),
        }
    }

    /// Records the most recent input. It is applied on the next update where
    /// the requested direction has open floor ahead.
    pub fn buffer_direction(&mut self, dir: Direction) {
        self.buffered_dir = dir;
    }

    pub fn begin_death(&mut self) {
        self.lives -= 1;
        self.dying = true;
        self.death_timer = 0.0;
        self.dir = Direction::None;
        self.buffered_dir = Direction::None;
    }

    /// Advances the death animation. Returns true once it has run its course.
    pub fn advance_death(&mut self, dt: f32) -> bool {
        self.death_timer += dt;
        self.death_timer >= DEATH_ANIMATION_SECS
    }

    pub fn respawn(&mut self) {
        self.rect.cx = self.start_x;
        self.rect.cy = self.start_y;
        self.dir = Direction::None;
        self.buffered_dir = Direction::None;
        self.dying = false;
        self.death_timer = 0.0;
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.rect.cx,
            y: self.rect.cy,
            dir: self.dir,
            lives: self.lives,
            dying: self.dying,
            pickups_collected: self.pickups_collected,
        }
    }

    pub fn attach_observer(&mut self, observer: crate::notify::Observer<PlayerView>) {
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
