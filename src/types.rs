use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }

    pub fn unit(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
            Direction::None => (0.0, 0.0),
        }
    }

    pub fn grid_offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostKind {
    Random,
    Ambusher,
    Flanker,
    Chaser,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostPhase {
    Spawning,
    Chasing,
    Fear,
    Eaten,
    Respawning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupFlavor {
    Dot,
    Fruit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Wall,
    Door,
    Pickup,
    Player,
    Ghost,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PickupCollected {
        x: f32,
        y: f32,
    },
    FruitCollected {
        x: f32,
        y: f32,
    },
    GhostEaten {
        kind: GhostKind,
        x: f32,
        y: f32,
    },
    PlayerDied {
        #[serde(rename = "livesLeft")]
        lives_left: i32,
    },
    LevelCleared {
        #[serde(rename = "pickupsCollected")]
        pickups_collected: i32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub lives: i32,
    pub dying: bool,
    #[serde(rename = "pickupsCollected")]
    pub pickups_collected: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    #[serde(rename = "type")]
    pub kind: GhostKind,
    pub phase: GhostPhase,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub exited: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct PickupView {
    pub flavor: PickupFlavor,
    pub x: f32,
    pub y: f32,
    pub collected: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ObstacleView {
    pub kind: EntityKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub frame: u64,
    #[serde(rename = "elapsedSecs")]
    pub elapsed_secs: f32,
    pub score: i32,
    pub lives: i32,
    #[serde(rename = "dotsRemaining")]
    pub dots_remaining: usize,
    pub player: Option<PlayerView>,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<GameEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involutive_for_cardinals() {
        for dir in Direction::CARDINALS {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
        assert_eq!(Direction::None.opposite(), Direction::None);
    }

    #[test]
    fn grid_offset_matches_unit_sign() {
        for dir in Direction::CARDINALS {
            let (ux, uy) = dir.unit();
            let (gx, gy) = dir.grid_offset();
            assert_eq!(gx as f32, ux);
            assert_eq!(gy as f32, uy);
        }
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = GameEvent::GhostEaten {
            kind: GhostKind::Chaser,
            x: 0.5,
            y: -0.5,
        };
        let json = serde_json::to_value(&event).expect("event should serialize");
        assert_eq!(json["type"], "ghost_eaten");
        assert_eq!(json["kind"], "chaser");
    }

    #[test]
    fn snapshot_serializes_camel_case_fields() {
        let snapshot = Snapshot {
            frame: 3,
            elapsed_secs: 0.05,
            score: 40,
            lives: 3,
            dots_remaining: 12,
            player: None,
            ghosts: Vec::new(),
            events: Vec::new(),
        };
        let json = serde_json::to_value(&snapshot).expect("snapshot should serialize");
        assert!(json.get("dotsRemaining").is_some());
        assert!(json.get("elapsedSecs").is_some());
    }
}
