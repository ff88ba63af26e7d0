use crate::constants::{PROBE_DISTANCE_FACTOR, TUNNEL_TOLERANCE, WORLD_MAX, WORLD_MIN};
use crate::geometry::{snap_to_cell, Rect};
use crate::types::Direction;

use super::Obstacle;

/// Which obstacles stop a mover. Doors stop the player always and exited
/// ghosts on re-entry; confinement keeps ghosts out of the tunnel apron.
#[derive(Clone, Copy, Debug)]
pub(super) struct MoveRules {
    pub doors_block: bool,
    pub confined: bool,
}

pub(super) const PLAYER_RULES: MoveRules = MoveRules {
    doors_block: true,
    confined: false,
};

pub(super) fn ghost_rules(exited: bool) -> MoveRules {
    MoveRules {
        doors_block: exited,
        confined: true,
    }
}

/// Displaces the rect along `dir` and recenters the cross axis onto the
/// grid, so corridor travel cannot drift sideways.
pub(super) fn advance_rect(rect: &mut Rect, dir: Direction, distance: f32, cell_w: f32, cell_h: f32) {
    let (ux, uy) = dir.unit();
    rect.cx += ux * distance;
    rect.cy += uy * distance;
    if dir == Direction::None {
        return;
    }
    if dir.is_horizontal() {
        rect.cy = snap_to_cell(rect.cy, cell_h);
    } else {
        rect.cx = snap_to_cell(rect.cx, cell_w);
    }
}

/// Horizontal tunnel teleport. Runs before obstacle checks so a mover deep
/// enough past the edge reappears on the far side.
pub(super) fn apply_wraparound(rect: &mut Rect) {
    let limit = WORLD_MAX + TUNNEL_TOLERANCE;
    if rect.cx > limit {
        rect.cx = WORLD_MIN - TUNNEL_TOLERANCE;
    } else if rect.cx < -limit {
        rect.cx = WORLD_MAX + TUNNEL_TOLERANCE;
    }
}

pub(super) fn overlaps_any(obstacles: &[Obstacle], rect: &Rect) -> bool {
    obstacles.iter().any(|obstacle| obstacle.rect.overlaps(rect))
}

/// Detects the onset of a door crossing: clear of the door before the move
/// and overlapping it after. A mover already inside the door reports none.
pub(super) fn door_crossing(doors: &[Obstacle], before: &Rect, after: &Rect) -> Option<usize> {
    doors
        .iter()
        .position(|door| !door.rect.overlaps(before) && door.rect.overlaps(after))
}

/// Previews a short move in `dir` with the same displacement and snapping
/// as real movement and reports whether it would stand.
pub(super) fn direction_viable(
    walls: &[Obstacle],
    doors: &[Obstacle],
    rect: &Rect,
    dir: Direction,
    cell_w: f32,
    cell_h: f32,
    rules: MoveRules,
) -> bool {
    if dir == Direction::None {
        return false;
    }
    let mut probe = *rect;
    let distance = PROBE_DISTANCE_FACTOR * cell_w.min(cell_h);
    advance_rect(&mut probe, dir, distance, cell_w, cell_h);
    if rules.confined && (probe.cx.abs() > WORLD_MAX || probe.cy.abs() > WORLD_MAX) {
        return false;
    }
    if overlaps_any(walls, &probe) {
        return false;
    }
    if rules.doors_block && overlaps_any(doors, &probe) {
        return false;
    }
    true
}

pub(super) fn viable_directions(
    walls: &[Obstacle],
    doors: &[Obstacle],
    rect: &Rect,
    cell_w: f32,
    cell_h: f32,
    rules: MoveRules,
) -> Vec<Direction> {
    Direction::CARDINALS
        .iter()
        .copied()
        .filter(|dir| direction_viable(walls, doors, rect, *dir, cell_w, cell_h, rules))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;

    const CELL: f32 = 0.1;

    fn wall(cx: f32, cy: f32) -> Obstacle {
        Obstacle::new(EntityKind::Wall, cx, cy, CELL, CELL)
    }

    fn door(cx: f32, cy: f32) -> Obstacle {
        Obstacle::new(EntityKind::Door, cx, cy, CELL, CELL)
    }

    fn mover(cx: f32, cy: f32) -> Rect {
        Rect::new(cx, cy, 0.08, 0.08)
    }

    #[test]
    fn advance_snaps_the_cross_axis() {
        let mut rect = mover(0.05, 0.061);
        advance_rect(&mut rect, Direction::Right, 0.02, CELL, CELL);
        assert!((rect.cx - 0.07).abs() < 1e-6);
        // The drifted y recenters onto its row.
        assert!((rect.cy - 0.05).abs() < 1e-6);

        let mut rect = mover(0.043, 0.05);
        advance_rect(&mut rect, Direction::Up, 0.02, CELL, CELL);
        assert!((rect.cy - 0.03).abs() < 1e-6);
        assert!((rect.cx - 0.05).abs() < 1e-6);
    }

    #[test]
    fn wraparound_teleports_only_past_the_apron() {
        let mut rect = mover(1.06, 0.0);
        apply_wraparound(&mut rect);
        assert!((rect.cx + 1.05).abs() < 1e-6);

        let mut rect = mover(-1.06, 0.0);
        apply_wraparound(&mut rect);
        assert!((rect.cx - 1.05).abs() < 1e-6);

        let mut rect = mover(1.04, 0.0);
        apply_wraparound(&mut rect);
        assert!((rect.cx - 1.04).abs() < 1e-6);
    }

    #[test]
    fn door_crossing_reports_onset_only() {
        let doors = vec![door(0.15, 0.05)];
        let outside = mover(-0.05, 0.05);
        let entering = mover(0.08, 0.05);
        let inside = mover(0.15, 0.05);
        assert_eq!(door_crossing(&doors, &outside, &entering), Some(0));
        assert_eq!(door_crossing(&doors, &entering, &inside), None);
        assert_eq!(door_crossing(&doors, &outside, &outside), None);
    }

    #[test]
    fn viability_respects_walls_doors_and_confinement() {
        let walls = vec![wall(0.15, 0.05)];
        let doors = vec![door(-0.05, 0.05)];
        let rect = mover(0.05, 0.05);

        assert!(!direction_viable(&walls, &doors, &rect, Direction::Right, CELL, CELL, PLAYER_RULES));
        assert!(!direction_viable(&walls, &doors, &rect, Direction::Left, CELL, CELL, PLAYER_RULES));
        assert!(direction_viable(&walls, &doors, &rect, Direction::Up, CELL, CELL, PLAYER_RULES));

        // An unexited ghost may pass the door; an exited one may not.
        assert!(direction_viable(&walls, &doors, &rect, Direction::Left, CELL, CELL, ghost_rules(false)));
        assert!(!direction_viable(&walls, &doors, &rect, Direction::Left, CELL, CELL, ghost_rules(true)));

        // Confinement blocks probes past the world edge where a player
        // would be free to run for the tunnel.
        let edge = mover(0.97, 0.05);
        assert!(!direction_viable(&[], &[], &edge, Direction::Right, CELL, CELL, ghost_rules(true)));
        assert!(direction_viable(&[], &[], &edge, Direction::Right, CELL, CELL, PLAYER_RULES));
    }

    #[test]
    fn viable_directions_scans_all_cardinals() {
        let walls = vec![wall(0.15, 0.05), wall(0.05, 0.15)];
        let rect = mover(0.05, 0.05);
        let viable = viable_directions(&walls, &[], &rect, CELL, CELL, PLAYER_RULES);
        assert_eq!(viable, vec![Direction::Up, Direction::Left]);
    }
}
