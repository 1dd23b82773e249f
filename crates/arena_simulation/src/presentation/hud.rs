//! HUD readout локального игрока
//!
//! Виджет host'а рисует эти значения; пересчёт только когда пришёл hook.

use bevy::prelude::*;

use crate::components::{DeathFlag, Health, LocallyControlled, SphereAttack};
use crate::presentation::PresentationHook;

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct HudReadout {
    pub health_fraction: f32,
    pub sphere_fraction: f32,
    pub cooldown_fraction: f32,
    pub cooldown_remaining: f32,
    pub enemies_in_range: u32,
    pub dead: bool,
}

impl Default for HudReadout {
    fn default() -> Self {
        Self {
            health_fraction: 1.0,
            sphere_fraction: 0.0,
            cooldown_fraction: 0.0,
            cooldown_remaining: 0.0,
            enemies_in_range: 0,
            dead: false,
        }
    }
}

impl HudReadout {
    pub fn capture(health: &Health, sphere: &SphereAttack, death: &DeathFlag) -> Self {
        Self {
            health_fraction: health.normalized(),
            sphere_fraction: sphere.normalized_radius(),
            cooldown_fraction: sphere.normalized_cooldown(),
            cooldown_remaining: sphere.current_cooldown(),
            enemies_in_range: sphere.observed_targets(),
            dead: death.is_dead(),
        }
    }
}

pub fn update_hud_readout(
    mut hooks: EventReader<PresentationHook>,
    local_players: Query<(&Health, &SphereAttack, &DeathFlag), With<LocallyControlled>>,
    mut hud: ResMut<HudReadout>,
) {
    // Несколько hooks за кадр → один пересчёт
    let Some(hook) = hooks.read().filter(|hook| local_players.contains(hook.entity)).last() else {
        return;
    };

    if let Ok((health, sphere, death)) = local_players.get(hook.entity) {
        *hud = HudReadout::capture(health, sphere, death);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::NetRole;

    #[test]
    fn test_hud_capture_fractions() {
        let mut health = Health::new(100.0);
        health.damage(NetRole::Authority, 25.0).unwrap();

        let mut sphere = SphereAttack::default();
        sphere.activate(NetRole::Authority).unwrap();
        sphere.deactivate(NetRole::Authority).unwrap();

        let hud = HudReadout::capture(&health, &sphere, &DeathFlag::default());

        assert_eq!(hud.health_fraction, 0.75);
        assert_eq!(hud.sphere_fraction, 0.0);
        assert_eq!(hud.cooldown_fraction, 1.0);
        assert_eq!(hud.cooldown_remaining, 5.0);
        assert!(!hud.dead);
    }
}
