//! Hit-box sizing. Players and their bullets shrink as the player loses health.

use crate::GameConfig;

/// Collision radius of a player at the given health.
pub fn player_radius(config: &GameConfig, health: f32) -> f32 {
    config.initial_player_size - (config.initial_player_health - health) * config.player_shrink_step
}

/// Collision radius of a bullet, driven by a player's health rather than the bullet's age.
pub fn bullet_radius(config: &GameConfig, health: f32) -> f32 {
    config.initial_bullet_size - (config.initial_player_health - health) * config.bullet_shrink_step
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_full_health_sizes() {
        let config = GameConfig::default();
        assert_approx_eq!(
            player_radius(&config, config.initial_player_health),
            config.initial_player_size
        );
        assert_approx_eq!(
            bullet_radius(&config, config.initial_player_health),
            config.initial_bullet_size
        );
    }

    #[test]
    fn test_radius_shrinks_with_damage() {
        let config = GameConfig::default();
        let full = config.initial_player_health;

        assert_approx_eq!(player_radius(&config, full - 5.0), 48.0 - 5.0);
        assert_approx_eq!(bullet_radius(&config, full - 5.0), 20.0 - 2.5);
        assert!(player_radius(&config, 1.0) < player_radius(&config, full));
    }
}
