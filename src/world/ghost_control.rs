use super::*;

impl World {
    pub(super) fn update_ghosts(&mut self, dt: f32) {
        let ctx = match &self.player {
            Some(player) if !player.dying => DecisionContext {
                target_x: player.rect.cx,
                target_y: player.rect.cy,
                target_facing: player.dir,
            },
            _ => DecisionContext {
                target_x: 0.0,
                target_y: 0.0,
                target_facing: Direction::None,
            },
        };

        for idx in 0..self.ghosts.len() {
            match self.ghosts[idx].phase {
                GhostPhase::Spawning => {
                    self.ghosts[idx].advance_spawn(dt);
                    self.ghosts[idx].notify();
                    continue;
                }
                GhostPhase::Respawning => {
                    self.ghosts[idx].advance_respawn(dt);
                    self.ghosts[idx].notify();
                    continue;
                }
                GhostPhase::Fear => {
                    self.ghosts[idx].advance_fear(dt);
                }
                _ => {}
            }

            let rules = ghost_rules(self.ghosts[idx].exited);
            let viable = viable_directions(
                &self.walls,
                &self.doors,
                &self.ghosts[idx].rect,
                self.cell_w,
                self.cell_h,
                rules,
            );

            // Mid-doorway and freshly committed crossings keep their course.
            let decision_allowed = self.ghosts[idx].exit_steps == 0
                && !overlaps_any(&self.doors, &self.ghosts[idx].rect);
            if self.ghosts[idx].exit_steps > 0 {
                self.ghosts[idx].exit_steps -= 1;
            }

            if self.ghosts[idx].dir == Direction::None {
                self.ghosts[idx].dir = match self.ghosts[idx].kind {
                    GhostKind::Chaser => Direction::Left,
                    _ => viable.first().copied().unwrap_or(Direction::None),
                };
            } else if decision_allowed
                && needs_direction_decision(self.ghosts[idx].dir, &viable)
            {
                let chosen = choose_direction(
                    &self.ghosts[idx],
                    &viable,
                    &ctx,
                    self.cell_w,
                    self.cell_h,
                    &mut self.rng,
                );
                self.ghosts[idx].dir = chosen;
            }

            let dir = self.ghosts[idx].dir;
            if dir == Direction::None {
                self.ghosts[idx].notify();
                continue;
            }

            let before = self.ghosts[idx].rect;
            let mut after = before;
            advance_rect(
                &mut after,
                dir,
                self.ghosts[idx].speed() * dt,
                self.cell_w,
                self.cell_h,
            );

            let mut blocked = after.cx.abs() > WORLD_MAX
                || after.cy.abs() > WORLD_MAX
                || overlaps_any(&self.walls, &after);
            if !blocked {
                if let Some(door_idx) = door_crossing(&self.doors, &before, &after) {
                    if self.ghosts[idx].exited {
                        blocked = true;
                    } else {
                        let door_rect = self.doors[door_idx].rect;
                        let (mouth_x, mouth_y) =
                            door_mouth(&door_rect, dir, self.cell_w, self.cell_h);
                        let ghost = &mut self.ghosts[idx];
                        ghost.exited = true;
                        ghost.set_return_target(mouth_x, mouth_y);
                        ghost.exit_steps = DOOR_COMMIT_STEPS;
                        debug!("{:?} ghost exited its enclosure", ghost.kind);
                    }
                }
            }

            if blocked {
                self.ghosts[idx].dir = Direction::None;
                let chosen = choose_direction(
                    &self.ghosts[idx],
                    &viable,
                    &ctx,
                    self.cell_w,
                    self.cell_h,
                    &mut self.rng,
                );
                self.ghosts[idx].dir = chosen;
            } else {
                self.ghosts[idx].rect = after;
            }

            if self.ghosts[idx].phase == GhostPhase::Eaten && self.ghosts[idx].at_return_target() {
                self.ghosts[idx].begin_respawn();
            }
            self.ghosts[idx].notify();
        }
    }

    /// Frightens every chasing ghost. Fruit pickups route through here and
    /// embedders may call it directly.
    pub fn trigger_fear(&mut self) {
        for ghost in &mut self.ghosts {
            if ghost.enter_fear() {
                ghost.notify();
            }
        }
    }

    pub(super) fn reset_ghosts_after_death(&mut self) {
        for ghost in &mut self.ghosts {
            match ghost.phase {
                GhostPhase::Spawning | GhostPhase::Respawning => {}
                _ => {
                    ghost.reset_to_return_target();
                    ghost.notify();
                }
            }
        }
    }
}

/// The open cell just past the door in the crossing direction. Eaten ghosts
/// navigate back to this point rather than into the enclosure.
pub(super) fn door_mouth(door: &Rect, dir: Direction, cell_w: f32, cell_h: f32) -> (f32, f32) {
    let (gx, gy) = dir.grid_offset();
    (
        door.cx + gx as f32 * cell_w,
        door.cy + gy as f32 * cell_h,
    )
}
