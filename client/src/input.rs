//! Input packaging and the automated pilot that stands in for a human player

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Action, MoveDir, Packet, Vector2};

/// Controls held during one frame
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Controls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub shoot_at: Option<Vector2>,
}

impl Controls {
    /// Translates held controls into protocol actions, moves first.
    pub fn actions(&self) -> Vec<Action> {
        let held = [
            (self.up, MoveDir::Up),
            (self.down, MoveDir::Down),
            (self.left, MoveDir::Left),
            (self.right, MoveDir::Right),
        ];

        let mut actions: Vec<Action> = held
            .iter()
            .filter(|(pressed, _)| *pressed)
            .map(|(_, dir)| Action::Move { dir: *dir })
            .collect();

        if let Some(target) = self.shoot_at {
            actions.push(Action::Shoot { target });
        }

        actions
    }

    pub fn into_packet(self, player_id: u32) -> Packet {
        Packet::PlayerInput {
            player_id,
            actions: self.actions(),
        }
    }
}

/// Generates plausible controls: wanders in a held direction and fires at the
/// nearest enemy with a fixed probability per frame.
pub struct InputManager {
    rng: StdRng,
    fire_chance: f64,
    held: Controls,
    frames_left: u32,
}

impl InputManager {
    pub fn new(fire_chance: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng,
            fire_chance: fire_chance.clamp(0.0, 1.0),
            held: Controls::default(),
            frames_left: 0,
        }
    }

    /// Produces the controls for the next frame.
    pub fn update(&mut self, own: Option<Vector2>, enemies: &[Vector2]) -> Controls {
        if self.frames_left == 0 {
            self.held = Controls {
                up: self.rng.gen_bool(0.5),
                down: self.rng.gen_bool(0.5),
                left: self.rng.gen_bool(0.5),
                right: self.rng.gen_bool(0.5),
                shoot_at: None,
            };
            self.frames_left = self.rng.gen_range(15..90);
        }
        self.frames_left -= 1;

        let mut controls = self.held;
        if self.rng.gen_bool(self.fire_chance) {
            controls.shoot_at = own.and_then(|own| nearest(own, enemies));
        }
        controls
    }
}

fn nearest(from: Vector2, candidates: &[Vector2]) -> Option<Vector2> {
    candidates
        .iter()
        .copied()
        .min_by(|a, b| from.dist_to(a).total_cmp(&from.dist_to(b)))
}
