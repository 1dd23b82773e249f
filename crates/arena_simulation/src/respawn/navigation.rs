//! Navigation collaborator: "случайная достижимая точка мира"
//!
//! Настоящий navmesh у host; по умолчанию — прямоугольник на плоскости пола.

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::NavBoundsConfig;

pub trait NavigationQuery: Send + Sync {
    /// None — точку найти не удалось
    fn random_reachable_point(&self, rng: &mut ChaCha8Rng) -> Option<Vec3>;
}

/// Прямоугольная область XZ на высоте `floor`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavBounds {
    pub min: Vec2,
    pub max: Vec2,
    pub floor: f32,
}

impl From<NavBoundsConfig> for NavBounds {
    fn from(config: NavBoundsConfig) -> Self {
        Self {
            min: Vec2::from_array(config.min),
            max: Vec2::from_array(config.max),
            floor: config.floor,
        }
    }
}

impl NavigationQuery for NavBounds {
    fn random_reachable_point(&self, rng: &mut ChaCha8Rng) -> Option<Vec3> {
        if self.min.x > self.max.x || self.min.y > self.max.y {
            return None;
        }

        Some(Vec3::new(
            rng.gen_range(self.min.x..=self.max.x),
            self.floor,
            rng.gen_range(self.min.y..=self.max.y),
        ))
    }
}

/// Активный navigation collaborator процесса
#[derive(Resource)]
pub struct Navigation(Box<dyn NavigationQuery>);

impl Navigation {
    pub fn new(query: impl NavigationQuery + 'static) -> Self {
        Self(Box::new(query))
    }

    pub fn random_reachable_point(&self, rng: &mut ChaCha8Rng) -> Option<Vec3> {
        self.0.random_reachable_point(rng)
    }
}
