//! ECS Components игрока
//!
//! - actor: PlayerCharacter, Health, DeathFlag, Controller, ввод
//! - sphere: SphereAttack (charge-up AoE)

pub mod actor;
pub mod sphere;

pub use actor::*;
pub use sphere::*;
