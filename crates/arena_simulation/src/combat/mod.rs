//! Combat module: damage router, sphere attack, projectile hits
//!
//! ECS ответственность:
//! - Game state: Health, SphereAttack
//! - Combat rules: радиус/cooldown, damage sweep, clamp здоровья
//! - Events: DamageReceived, HealthUpdated, SphereReleased
//!
//! Host ответственность: physics снарядов, рендер debug сферы, ввод.

use bevy::prelude::*;

use crate::net::{is_authority, is_observer};
use crate::GameplaySet;

pub mod damage;
pub mod projectile;
pub mod spatial;
pub mod sphere;


// Re-export основных типов
pub use damage::{apply_health_mutation, route_damage, DamageKind, DamageReceived, HealthUpdated};
pub use projectile::{ProjectileHit, PROJECTILE_BASE_DAMAGE};
pub use spatial::{point_in_sphere, QueryCategory, SpatialHit, SpatialQuery};
pub use sphere::{SphereCommand, SphereDebugDraw, SphereInputIntent, SphereReleased};

/// Combat Plugin
///
/// Порядок выполнения (authority):
/// 1. Intents: local_sphere_intents — ввод listen-server игрока
/// 2. Simulate: execute_sphere_commands → tick_sphere_attacks → sweep_released_spheres
/// 3. Damage: process_projectile_hits → route_damage
///
/// Observer: observe_sphere_overlaps в фазе Present.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<DamageReceived>()
            .add_event::<HealthUpdated>()
            .add_event::<SphereInputIntent>()
            .add_event::<SphereCommand>()
            .add_event::<SphereReleased>()
            .add_event::<SphereDebugDraw>()
            .add_event::<ProjectileHit>();

        app.add_systems(
            Update,
            (
                sphere::local_sphere_intents.in_set(GameplaySet::Intents),
                (
                    sphere::execute_sphere_commands,
                    sphere::tick_sphere_attacks,
                    sphere::sweep_released_spheres,
                )
                    .chain()
                    .in_set(GameplaySet::Simulate),
                (projectile::process_projectile_hits, damage::route_damage)
                    .chain()
                    .in_set(GameplaySet::Damage),
            )
                .run_if(is_authority),
        );

        app.add_systems(
            Update,
            sphere::observe_sphere_overlaps
                .in_set(GameplaySet::Present)
                .run_if(is_observer),
        );
    }
}
