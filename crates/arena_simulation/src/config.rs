//! Gameplay конфиг (RON)
//!
//! Все значения по умолчанию совпадают с балансом арены:
//! 100 HP, respawn через 5 сек, сфера 100 → 500 за 1 сек, cooldown 5 сек, 50 урона.
//!
//! ```ron
//! (
//!     max_health: 150.0,
//!     respawn_policy: Reinstance,
//!     sphere: (damage: 75.0),
//! )
//! ```

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Как сервер возвращает погибшего игрока в бой
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum RespawnPolicy {
    /// Тот же entity телепортируется в случайную navigation точку
    #[default]
    Relocate,
    /// Controller отсоединяется, entity удаляется, спавнится новый экземпляр
    Reinstance,
}

/// Статические параметры sphere attack
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct SphereAttackConfig {
    pub initial_radius: f32,
    pub max_radius: f32,
    /// Скорость роста радиуса (units/sec)
    pub growth_rate: f32,
    /// Длительность cooldown после release (секунды)
    pub cooldown: f32,
    pub damage: f32,
}

impl Default for SphereAttackConfig {
    fn default() -> Self {
        Self {
            initial_radius: 100.0,
            max_radius: 500.0,
            growth_rate: 400.0,
            cooldown: 5.0,
            damage: 50.0,
        }
    }
}

/// Прямоугольник на плоскости XZ где navigation выбирает точки respawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct NavBoundsConfig {
    pub min: [f32; 2],
    pub max: [f32; 2],
    /// Высота пола
    pub floor: f32,
}

impl Default for NavBoundsConfig {
    fn default() -> Self {
        Self {
            min: [-2000.0, -2000.0],
            max: [2000.0, 2000.0],
            floor: 0.0,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct GameplayConfig {
    pub max_health: f32,
    /// Задержка respawn (секунды)
    pub respawn_delay: f32,
    pub respawn_policy: RespawnPolicy,
    pub sphere: SphereAttackConfig,
    pub navigation: NavBoundsConfig,
    /// Seed для DeterministicRng
    pub seed: u64,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            respawn_delay: 5.0,
            respawn_policy: RespawnPolicy::Relocate,
            sphere: SphereAttackConfig::default(),
            navigation: NavBoundsConfig::default(),
            seed: 42,
        }
    }
}

impl GameplayConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Все float поля конечны; NaN/inf отвергаются
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sphere = &self.sphere;

        if !(self.max_health > 0.0 && self.max_health.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "max_health must be finite and > 0 (got {})",
                self.max_health
            )));
        }
        if !(sphere.initial_radius > 0.0
            && sphere.initial_radius <= sphere.max_radius
            && sphere.max_radius.is_finite())
        {
            return Err(ConfigError::Invalid(format!(
                "sphere radii must satisfy 0 < initial <= max < inf (got {} / {})",
                sphere.initial_radius, sphere.max_radius
            )));
        }
        for (name, value) in [
            ("sphere.growth_rate", sphere.growth_rate),
            ("sphere.cooldown", sphere.cooldown),
            ("sphere.damage", sphere.damage),
            ("respawn_delay", self.respawn_delay),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be finite and >= 0 (got {})",
                    name, value
                )));
            }
        }

        let nav = &self.navigation;
        let nav_values = [nav.min[0], nav.min[1], nav.max[0], nav.max[1], nav.floor];
        if !nav_values.iter().all(|value| value.is_finite()) {
            return Err(ConfigError::Invalid("navigation bounds must be finite".to_string()));
        }
        if !(nav.min[0] <= nav.max[0] && nav.min[1] <= nav.max[1]) {
            return Err(ConfigError::Invalid("navigation min must be <= max".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameplayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_health, 100.0);
        assert_eq!(config.respawn_delay, 5.0);
        assert_eq!(config.respawn_policy, RespawnPolicy::Relocate);
        assert_eq!(config.sphere.max_radius, 500.0);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = GameplayConfig::from_ron_str(
            "(max_health: 150.0, respawn_policy: Reinstance, sphere: (damage: 75.0))",
        )
        .unwrap();

        assert_eq!(config.max_health, 150.0);
        assert_eq!(config.respawn_policy, RespawnPolicy::Reinstance);
        assert_eq!(config.sphere.damage, 75.0);
        // Остальное — defaults
        assert_eq!(config.sphere.initial_radius, 100.0);
        assert_eq!(config.respawn_delay, 5.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = GameplayConfig::from_ron_str("(max_health: 0.0)");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = GameplayConfig::from_ron_str("(sphere: (initial_radius: 600.0))");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_finite_config_rejected() {
        for text in [
            "(sphere: (cooldown: NaN))",
            "(sphere: (growth_rate: NaN))",
            "(sphere: (damage: inf))",
            "(sphere: (max_radius: inf))",
            "(respawn_delay: inf)",
            "(respawn_delay: NaN)",
            "(max_health: inf)",
            "(navigation: (min: [NaN, 0.0]))",
            "(navigation: (floor: inf))",
        ] {
            let result = GameplayConfig::from_ron_str(text);
            assert!(matches!(result, Err(ConfigError::Invalid(_))), "{} accepted", text);
        }
    }

    #[test]
    fn test_malformed_ron_rejected() {
        let result = GameplayConfig::from_ron_str("(max_health: ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
