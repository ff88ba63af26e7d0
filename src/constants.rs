use crate::types::GhostKind;

pub const FRAME_RATE: u32 = 60;
pub const FRAME_DT: f32 = 1.0 / FRAME_RATE as f32;

pub const WORLD_MIN: f32 = -1.0;
pub const WORLD_MAX: f32 = 1.0;
pub const TUNNEL_TOLERANCE: f32 = 0.05;

pub const PLAYER_BASE_SPEED: f32 = 0.42;
pub const GHOST_BASE_SPEED: f32 = 0.36;
pub const FEAR_SPEED_FACTOR: f32 = 0.5;
pub const EATEN_SPEED_FACTOR: f32 = 2.0;

// Movers are smaller than a cell so grid-snapped entities in adjacent open
// cells do not register edge contact under the inclusive overlap test.
pub const ACTOR_SIZE_FACTOR: f32 = 0.8;
pub const DOT_SIZE_FACTOR: f32 = 0.3;
pub const FRUIT_SIZE_FACTOR: f32 = 0.5;
pub const PROBE_DISTANCE_FACTOR: f32 = 0.5;

pub const PLAYER_LIVES: i32 = 3;
pub const DEATH_ANIMATION_SECS: f32 = 1.5;

pub const FEAR_DURATION_SECS: f32 = 6.0;
pub const RESPAWN_FLICKER_PERIOD_SECS: f32 = 0.15;
pub const RESPAWN_FLICKER_COUNT: i32 = 6;
pub const DOOR_COMMIT_STEPS: i32 = 10;

pub const DOT_SCORE_BASE: i32 = 10;
pub const TIME_BONUS_MULTIPLIER: f32 = 0.5;
pub const TIME_BONUS_FLOOR_SECS: f32 = 0.1;
pub const SCORE_DECAY_PER_SEC: f32 = 1.0;
pub const GHOST_EATEN_SCORE: i32 = 120;
pub const FRUIT_SCORE: i32 = 50;

pub fn spawn_delay_secs(kind: GhostKind) -> f32 {
    match kind {
        GhostKind::Chaser => 0.5,
        GhostKind::Random => 2.0,
        GhostKind::Ambusher => 4.0,
        GhostKind::Flanker => 6.0,
    }
}

pub const DEFAULT_LEVEL: &[&str] = &[
    "###################",
    "#%.......#.......%#",
    "#.##.###.#.###.##.#",
    "#.................#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "####.###.#.###.####",
    "####.#...D...#.####",
    "####.#.##=##.#.####",
    "     #.#ABC#.#     ",
    "####.#.#####.#.####",
    "#....#.......#....#",
    "#.##.#.#####.#.##.#",
    "#........P........#",
    "#.##.###.#.###.##.#",
    "#%...............%#",
    "###################",
];
